//! Modern cipher backend: AES-128/192/256 in CBC and ECB modes with PKCS#7 padding

use crate::derivation::fit;
use crate::error::{CryptoError, Result};
use aes::cipher::{
    block_padding::Pkcs7, BlockCipher, BlockDecryptMut, BlockEncryptMut, KeyInit, KeyIvInit,
};
use aes::{Aes128, Aes192, Aes256};

/// Cipher names supported by the modern backend, in enumeration order.
pub const SUPPORTED_CIPHERS: &[&str] = &[
    "aes-128-cbc",
    "aes-128-ecb",
    "aes-192-cbc",
    "aes-192-ecb",
    "aes-256-cbc",
    "aes-256-ecb",
];

/// Default cipher selected at construction.
pub const DEFAULT_CIPHER: &str = "aes-256-cbc";

const AES_BLOCK: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Cbc,
    Ecb,
}

/// A parsed modern cipher name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipherSpec {
    key_bits: usize,
    mode: Mode,
}

impl CipherSpec {
    /// Parse a cipher name case-insensitively. Returns None for names the
    /// backend does not support.
    pub fn parse(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if !SUPPORTED_CIPHERS.contains(&lower.as_str()) {
            return None;
        }
        let mut parts = lower.split('-').skip(1);
        let key_bits = parts.next()?.parse().ok()?;
        let mode = match parts.next()? {
            "cbc" => Mode::Cbc,
            "ecb" => Mode::Ecb,
            _ => return None,
        };
        Some(Self { key_bits, mode })
    }

    /// Key length in bytes.
    pub fn key_len(&self) -> usize {
        self.key_bits / 8
    }

    /// Required IV length in bytes (0 for ECB).
    pub fn iv_len(&self) -> usize {
        match self.mode {
            Mode::Cbc => AES_BLOCK,
            Mode::Ecb => 0,
        }
    }
}

fn spec_for(name: &str) -> Result<CipherSpec> {
    CipherSpec::parse(name).ok_or_else(|| CryptoError::CipherUnavailable {
        name: name.to_string(),
    })
}

/// The modern backend. Stateless; key and IV are supplied per call and fitted
/// to the cipher (truncated or zero-padded).
#[derive(Debug, Clone, Copy, Default)]
pub struct ModernCipher;

impl ModernCipher {
    /// Supported cipher names.
    pub fn supported_ciphers(&self) -> &'static [&'static str] {
        SUPPORTED_CIPHERS
    }

    /// Case-insensitive membership test against [`SUPPORTED_CIPHERS`].
    pub fn supports(&self, name: &str) -> bool {
        CipherSpec::parse(name).is_some()
    }

    /// Required IV length for `name`.
    pub fn iv_length(&self, name: &str) -> Option<usize> {
        CipherSpec::parse(name).map(|s| s.iv_len())
    }

    /// Encrypt `data` with PKCS#7 padding.
    pub fn encrypt(&self, name: &str, key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        let spec = spec_for(name)?;
        let key = fit(key, spec.key_len());
        let iv = fit(iv, spec.iv_len());
        match (spec.key_bits, spec.mode) {
            (128, Mode::Cbc) => cbc_encrypt::<Aes128>(&key, &iv, data),
            (192, Mode::Cbc) => cbc_encrypt::<Aes192>(&key, &iv, data),
            (256, Mode::Cbc) => cbc_encrypt::<Aes256>(&key, &iv, data),
            (128, Mode::Ecb) => ecb_encrypt::<Aes128>(&key, data),
            (192, Mode::Ecb) => ecb_encrypt::<Aes192>(&key, data),
            (256, Mode::Ecb) => ecb_encrypt::<Aes256>(&key, data),
            _ => Err(CryptoError::CipherUnavailable {
                name: name.to_string(),
            }),
        }
    }

    /// Decrypt and strip PKCS#7 padding.
    pub fn decrypt(&self, name: &str, key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        let spec = spec_for(name)?;
        let key = fit(key, spec.key_len());
        let iv = fit(iv, spec.iv_len());
        match (spec.key_bits, spec.mode) {
            (128, Mode::Cbc) => cbc_decrypt::<Aes128>(&key, &iv, data),
            (192, Mode::Cbc) => cbc_decrypt::<Aes192>(&key, &iv, data),
            (256, Mode::Cbc) => cbc_decrypt::<Aes256>(&key, &iv, data),
            (128, Mode::Ecb) => ecb_decrypt::<Aes128>(&key, data),
            (192, Mode::Ecb) => ecb_decrypt::<Aes192>(&key, data),
            (256, Mode::Ecb) => ecb_decrypt::<Aes256>(&key, data),
            _ => Err(CryptoError::CipherUnavailable {
                name: name.to_string(),
            }),
        }
    }
}

fn cbc_encrypt<C>(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>>
where
    C: BlockEncryptMut + BlockCipher + KeyInit,
{
    let cipher = cbc::Encryptor::<C>::new_from_slices(key, iv)
        .map_err(|e| CryptoError::LibraryUnavailable {
            reason: e.to_string(),
        })?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(data))
}

fn cbc_decrypt<C>(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>>
where
    C: BlockDecryptMut + BlockCipher + KeyInit,
{
    let cipher = cbc::Decryptor::<C>::new_from_slices(key, iv)
        .map_err(|e| CryptoError::LibraryUnavailable {
            reason: e.to_string(),
        })?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(data)
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}

fn ecb_encrypt<C>(key: &[u8], data: &[u8]) -> Result<Vec<u8>>
where
    C: BlockEncryptMut + BlockCipher + KeyInit,
{
    let cipher =
        ecb::Encryptor::<C>::new_from_slice(key).map_err(|e| CryptoError::LibraryUnavailable {
            reason: e.to_string(),
        })?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(data))
}

fn ecb_decrypt<C>(key: &[u8], data: &[u8]) -> Result<Vec<u8>>
where
    C: BlockDecryptMut + BlockCipher + KeyInit,
{
    let cipher =
        ecb::Decryptor::<C>::new_from_slice(key).map_err(|e| CryptoError::LibraryUnavailable {
            reason: e.to_string(),
        })?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(data)
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))
}
