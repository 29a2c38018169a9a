//! Combined crypto facade: one cipher provider plus one password generator

use crate::aes::Aes;
use crate::config::CryptoConfig;
use crate::error::Result;
use crate::password::{CharacterClasses, PasswordGenerator, PasswordPolicy, DEFAULT_LENGTH};
use dataio_codec::Capabilities;

/// Owns an [`Aes`] provider and a [`PasswordGenerator`] and forwards a fixed
/// set of calls to them.
#[derive(Debug, Clone)]
pub struct Crypto {
    aes: Aes,
    passwords: PasswordGenerator,
}

impl Crypto {
    /// Build the underlying provider from `caps` and `config`.
    pub fn new(caps: Capabilities, config: CryptoConfig) -> Result<Self> {
        Ok(Self {
            aes: Aes::new(caps, config)?,
            passwords: PasswordGenerator,
        })
    }

    /// The owned cipher provider.
    pub fn aes(&self) -> &Aes {
        &self.aes
    }

    /// Mutable access to the owned cipher provider.
    pub fn aes_mut(&mut self) -> &mut Aes {
        &mut self.aes
    }

    /// Set keys with the configured default derivation.
    pub fn set_keys(&mut self, key: &str, iv: &str) {
        let derivation = self.aes.default_derivation();
        self.aes.set_keys(key, iv, derivation);
    }

    /// Select the cipher by name, e.g. `aes-256-cbc`.
    pub fn set_cipher(&mut self, name: &str) -> Result<()> {
        self.aes.set_cipher(name)
    }

    /// Encrypt with the current keys and cipher.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        self.aes.encrypt(plaintext)
    }

    /// Decrypt text produced by [`Crypto::encrypt`].
    pub fn decrypt(&self, ciphertext: &str) -> Result<String> {
        self.aes.decrypt(ciphertext)
    }

    /// Find the cipher that decrypts `ciphertext` to `known_plaintext`.
    pub fn discover_cipher_name(
        &self,
        ciphertext: &str,
        known_plaintext: &str,
    ) -> Result<Option<String>> {
        self.aes.discover_cipher_name(ciphertext, known_plaintext)
    }

    /// Whether any cipher backend is available.
    pub fn can_crypto(&self) -> bool {
        self.aes.can_crypto()
    }

    /// Whether the legacy backend could be used on this build.
    pub fn legacy_usable(&self) -> bool {
        self.aes.legacy_usable()
    }

    /// Prefer the legacy backend when both are available.
    pub fn set_prefer_legacy(&mut self, prefer: bool) -> Result<()> {
        self.aes.set_prefer_legacy(prefer)
    }

    /// Generate a password. `None` arguments take the policy defaults.
    pub fn mkpass(
        &self,
        classes: Option<CharacterClasses>,
        length: Option<usize>,
        avoid_ambiguous: bool,
        avoid_adjacent_duplicates: bool,
    ) -> Result<String> {
        let policy = PasswordPolicy::new(classes.unwrap_or_default())
            .with_length(length.unwrap_or(DEFAULT_LENGTH))
            .avoid_ambiguous(avoid_ambiguous)
            .avoid_adjacent_duplicates(avoid_adjacent_duplicates);
        self.passwords.generate(&policy)
    }

    /// Generate a password for an explicit policy.
    pub fn generate(&self, policy: &PasswordPolicy) -> Result<String> {
        self.passwords.generate(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crypto() -> Crypto {
        Crypto::new(
            Capabilities::none().with_modern_cipher(true),
            CryptoConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_forwarded_roundtrip() {
        let mut c = crypto();
        c.set_keys("MyKey", "MyIV");
        let ct = c.encrypt("EncryptME").unwrap();
        assert_eq!(ct, "U5Te2R-G-sxgBIC-FXkdXA");
        assert_eq!(c.decrypt(&ct).unwrap(), "EncryptME");
        assert_eq!(
            c.discover_cipher_name(&ct, "EncryptME").unwrap().as_deref(),
            Some("aes-256-cbc")
        );
    }

    #[test]
    fn test_mkpass_upper_only() {
        let pw = crypto()
            .mkpass(Some(CharacterClasses::UPPER), None, false, true)
            .unwrap();
        assert_eq!(pw.len(), 16);
        assert_eq!(pw, pw.to_uppercase());
    }

    #[test]
    fn test_mkpass_defaults() {
        let pw = crypto().mkpass(None, Some(20), false, false).unwrap();
        assert_eq!(pw.len(), 20);
        assert!(pw.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_flags_forwarded() {
        let mut c = crypto();
        assert!(c.can_crypto());
        assert!(!c.legacy_usable());
        assert!(c.set_prefer_legacy(true).is_err());
        assert!(c.set_cipher("nope").is_err());
        c.aes_mut().set_cipher("aes-128-ecb").unwrap();
        assert_eq!(c.aes().cipher(), "aes-128-ecb");
    }
}
