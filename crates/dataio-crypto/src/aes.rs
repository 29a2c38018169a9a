//! AES cipher provider with modern/legacy backend selection
//!
//! The backend is chosen once from a [`Capabilities`] value. The modern backend
//! is preferred; the legacy Rijndael-256 backend is used when it is the only
//! one left, or for encryption when legacy preference is switched on.

use crate::config::CryptoConfig;
use crate::derivation::{CipherKeyMaterial, KeyDerivation};
use crate::error::{CryptoError, Result};
use crate::legacy::{self, LegacyCipher, LEGACY_CIPHER};
use crate::modern::ModernCipher;
use dataio_codec::{base64url_decode, base64url_encode, ensure_utf8, Capabilities, CodecError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Which cipher engine an [`Aes`] instance is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CipherBackend {
    /// No engine could be probed
    Unavailable,
    /// RustCrypto AES (CBC/ECB)
    Modern,
    /// Rijndael-256 CBC, mcrypt compatible
    Legacy,
}

/// Symmetric cipher provider.
#[derive(Debug, Clone)]
pub struct Aes {
    backend: CipherBackend,
    legacy_usable: bool,
    prefer_legacy: bool,
    default_derivation: KeyDerivation,
    cipher: String,
    material: CipherKeyMaterial,
}

impl Aes {
    /// Probe `caps` and select a backend.
    ///
    /// Fails with [`CryptoError::LibraryUnavailable`] when neither backend is
    /// usable, or when legacy preference is configured but the legacy backend
    /// is absent or retired. Fails with [`CryptoError::CipherUnavailable`] when
    /// the configured default cipher is not supported by the modern backend.
    pub fn new(caps: Capabilities, config: CryptoConfig) -> Result<Self> {
        let legacy_usable = caps.legacy_cipher_usable();
        if config.prefer_legacy && !legacy_usable {
            return Err(CryptoError::LibraryUnavailable {
                reason: "legacy cipher requested but not usable on this build".to_string(),
            });
        }

        let mut aes = Self {
            backend: CipherBackend::Unavailable,
            legacy_usable,
            prefer_legacy: config.prefer_legacy,
            default_derivation: config.derivation,
            cipher: String::new(),
            material: CipherKeyMaterial::default(),
        };

        if caps.has_modern_cipher {
            aes.backend = CipherBackend::Modern;
            aes.set_cipher(&config.default_cipher)?;
        } else if legacy_usable {
            aes.backend = CipherBackend::Legacy;
            aes.cipher = LEGACY_CIPHER.to_string();
        } else {
            let reason = if caps.has_legacy_cipher {
                "only the legacy cipher is present and it has been retired"
            } else {
                "no cipher backend present"
            };
            return Err(CryptoError::LibraryUnavailable {
                reason: reason.to_string(),
            });
        }

        info!(
            backend = ?aes.backend,
            cipher = %aes.cipher,
            legacy_usable,
            "cipher backend selected"
        );
        Ok(aes)
    }

    /// Construct with probed capabilities and default configuration.
    pub fn probe() -> Result<Self> {
        Self::new(Capabilities::probe(), CryptoConfig::default())
    }

    /// The active backend.
    pub fn backend(&self) -> CipherBackend {
        self.backend
    }

    /// True once any backend has been selected.
    pub fn can_crypto(&self) -> bool {
        self.backend != CipherBackend::Unavailable
    }

    /// Whether the legacy backend could be used, independent of the active one.
    pub fn legacy_usable(&self) -> bool {
        self.legacy_usable
    }

    /// Whether encryption is routed through the legacy backend.
    pub fn prefer_legacy(&self) -> bool {
        self.prefer_legacy
    }

    /// Switch legacy preference. Takes effect for the next `set_keys` and
    /// every following encryption.
    pub fn set_prefer_legacy(&mut self, prefer: bool) -> Result<()> {
        if prefer && !self.legacy_usable {
            return Err(CryptoError::LibraryUnavailable {
                reason: "legacy cipher requested but not usable on this build".to_string(),
            });
        }
        self.prefer_legacy = prefer;
        Ok(())
    }

    /// Derivation configured for callers that do not choose one.
    pub fn default_derivation(&self) -> KeyDerivation {
        self.default_derivation
    }

    fn effective_derivation(&self, requested: KeyDerivation) -> KeyDerivation {
        if requested == KeyDerivation::Strong
            && (self.prefer_legacy || self.backend != CipherBackend::Modern)
        {
            KeyDerivation::Weak
        } else {
            requested
        }
    }

    /// Derive and store key and IV material.
    ///
    /// Strong derivation is downgraded to weak when legacy preference is on or
    /// the modern backend is not active, so that legacy ciphertext stays
    /// readable by mcrypt-era peers.
    pub fn set_keys(&mut self, key: &str, iv: &str, derivation: KeyDerivation) {
        let effective = self.effective_derivation(derivation);
        if effective != derivation {
            warn!(
                requested = ?derivation,
                "strong key derivation downgraded to weak for legacy compatibility"
            );
        }
        self.material = CipherKeyMaterial::derive(key.as_bytes(), iv.as_bytes(), effective);
        debug!(derivation = ?effective, "cipher keys set");
    }

    /// Current cipher name.
    pub fn cipher(&self) -> &str {
        &self.cipher
    }

    /// Select a cipher by name, case-insensitively.
    pub fn set_cipher(&mut self, name: &str) -> Result<()> {
        let supported = match self.backend {
            CipherBackend::Modern => ModernCipher.supports(name),
            CipherBackend::Legacy => LegacyCipher.supports(name),
            CipherBackend::Unavailable => false,
        };
        if !supported {
            return Err(CryptoError::CipherUnavailable {
                name: name.to_string(),
            });
        }
        self.cipher = name.to_ascii_lowercase();
        debug!(cipher = %self.cipher, "cipher selected");
        Ok(())
    }

    /// Names the active backend can encrypt with.
    pub fn supported_ciphers(&self) -> &'static [&'static str] {
        match self.backend {
            CipherBackend::Modern => ModernCipher.supported_ciphers(),
            CipherBackend::Legacy => LegacyCipher.supported_ciphers(),
            CipherBackend::Unavailable => &[],
        }
    }

    /// IV length required by the current cipher.
    pub fn iv_length(&self) -> usize {
        match self.backend {
            CipherBackend::Modern => ModernCipher.iv_length(&self.cipher).unwrap_or(0),
            CipherBackend::Legacy => LegacyCipher.iv_length(),
            CipherBackend::Unavailable => 0,
        }
    }

    /// Derived key material.
    pub fn key(&self) -> &[u8] {
        self.material.key()
    }

    /// Derived IV, truncated to [`Self::iv_length`] when `adjust` is set.
    /// Never padded.
    pub fn iv(&self, adjust: bool) -> &[u8] {
        if adjust {
            self.material.iv_truncated(self.iv_length())
        } else {
            self.material.iv()
        }
    }

    fn uses_legacy_for_encrypt(&self) -> bool {
        self.legacy_usable && (self.prefer_legacy || self.backend == CipherBackend::Legacy)
    }

    fn require_keys(&self) -> Result<()> {
        if self.material.is_complete() {
            Ok(())
        } else {
            Err(CryptoError::NoKeys)
        }
    }

    /// Encrypt a string and return base64url text.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let out = self.encrypt_with(plaintext.as_bytes(), true, true)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Encrypt bytes. With `as_base64` the result is base64url text as bytes;
    /// with `force_utf8` non-UTF-8 input is transcoded from Latin-1 first.
    #[instrument(skip_all, fields(cipher = %self.cipher, input_bytes = plaintext.len()))]
    pub fn encrypt_with(&self, plaintext: &[u8], as_base64: bool, force_utf8: bool) -> Result<Vec<u8>> {
        self.require_keys()?;
        let owned;
        let data = if force_utf8 {
            owned = ensure_utf8(plaintext);
            owned.as_bytes()
        } else {
            plaintext
        };

        let raw = if self.uses_legacy_for_encrypt() {
            debug!("encrypting with legacy backend");
            LegacyCipher.encrypt(self.material.key(), self.material.iv(), data)
        } else {
            ModernCipher.encrypt(&self.cipher, self.material.key(), self.iv(true), data)?
        };

        Ok(if as_base64 {
            base64url_encode(&raw).into_bytes()
        } else {
            raw
        })
    }

    /// Decrypt base64url text into a string.
    pub fn decrypt(&self, ciphertext: &str) -> Result<String> {
        let out = self.decrypt_with(ciphertext.as_bytes(), true)?;
        Ok(ensure_utf8(&out))
    }

    /// Decrypt bytes with the modern backend.
    ///
    /// Legacy preference does not apply here: ciphertext produced while legacy
    /// preference was on must go through [`Self::decrypt_legacy`]. Only an
    /// instance whose active backend is Legacy decrypts legacy data here.
    #[instrument(skip_all, fields(cipher = %self.cipher, input_bytes = ciphertext.len()))]
    pub fn decrypt_with(&self, ciphertext: &[u8], as_base64: bool) -> Result<Vec<u8>> {
        if self.backend == CipherBackend::Legacy {
            return self.decrypt_legacy(ciphertext, as_base64);
        }
        self.require_keys()?;
        let raw = unframe(ciphertext, as_base64)?;
        ModernCipher.decrypt(&self.cipher, self.material.key(), self.iv(true), &raw)
    }

    /// Decrypt legacy ciphertext and strip its zero padding.
    pub fn decrypt_legacy(&self, ciphertext: &[u8], as_base64: bool) -> Result<Vec<u8>> {
        if !self.legacy_usable {
            return Err(CryptoError::LibraryUnavailable {
                reason: "legacy cipher is not usable on this build".to_string(),
            });
        }
        self.require_keys()?;
        let raw = unframe(ciphertext, as_base64)?;
        let mut out = LegacyCipher.decrypt(self.material.key(), self.material.iv(), &raw)?;
        legacy::strip_zero_padding(&mut out);
        Ok(out)
    }

    /// Find which supported cipher turns `known_plaintext` into `ciphertext`
    /// under the current keys. Returns `None` when nothing matches or the
    /// active backend is not Modern. The selected cipher is left unchanged.
    pub fn discover_cipher_name(
        &self,
        ciphertext: &str,
        known_plaintext: &str,
    ) -> Result<Option<String>> {
        if self.backend != CipherBackend::Modern {
            return Ok(None);
        }
        self.require_keys()?;
        let Ok(target) = base64url_decode(ciphertext) else {
            return Ok(None);
        };
        let data = ensure_utf8(known_plaintext.as_bytes());

        for name in ModernCipher.supported_ciphers() {
            let iv_len = ModernCipher.iv_length(name).unwrap_or(0);
            let iv = self.material.iv_truncated(iv_len);
            match ModernCipher.encrypt(name, self.material.key(), iv, data.as_bytes()) {
                Ok(candidate) if candidate == target => {
                    debug!(cipher = name, "cipher discovered");
                    return Ok(Some((*name).to_string()));
                }
                Ok(_) => {}
                Err(e) => debug!(cipher = name, error = %e, "candidate cipher failed"),
            }
        }
        Ok(None)
    }
}

fn unframe(ciphertext: &[u8], as_base64: bool) -> Result<Vec<u8>> {
    if !as_base64 {
        return Ok(ciphertext.to_vec());
    }
    let text =
        std::str::from_utf8(ciphertext).map_err(|e| CodecError::DecodingFailed(e.to_string()))?;
    Ok(base64url_decode(text)?)
}
