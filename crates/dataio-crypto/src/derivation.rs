//! Key/IV derivation: SHA-1 (strong), MD5 (weak) or raw material

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// How caller-supplied key and IV strings are turned into cipher material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum KeyDerivation {
    /// Lowercase hex of the 160-bit SHA-1 digest
    #[default]
    Strong,
    /// Lowercase hex of the 128-bit MD5 digest (legacy-compatible)
    Weak,
    /// Used verbatim
    Raw,
}

impl KeyDerivation {
    /// Derive material from `input`.
    pub fn derive(&self, input: &[u8]) -> Vec<u8> {
        match self {
            KeyDerivation::Strong => hex::encode(Sha1::digest(input)).into_bytes(),
            KeyDerivation::Weak => hex::encode(Md5::digest(input)).into_bytes(),
            KeyDerivation::Raw => input.to_vec(),
        }
    }
}

/// Derived key and IV. The IV is stored unadjusted; truncation to a cipher's
/// IV length happens when it is read.
#[derive(Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct CipherKeyMaterial {
    key: Vec<u8>,
    iv: Vec<u8>,
}

impl std::fmt::Debug for CipherKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CipherKeyMaterial {{ key: [REDACTED; {}], iv: [REDACTED; {}] }}",
            self.key.len(),
            self.iv.len()
        )
    }
}

impl CipherKeyMaterial {
    /// Derive key and IV independently with the same derivation.
    pub fn derive(key: &[u8], iv: &[u8], derivation: KeyDerivation) -> Self {
        Self {
            key: derivation.derive(key),
            iv: derivation.derive(iv),
        }
    }

    /// Derived key bytes.
    pub fn key(&self) -> &[u8] {
        &self.key
    }

    /// Derived IV bytes, unadjusted.
    pub fn iv(&self) -> &[u8] {
        &self.iv
    }

    /// IV truncated to `len` bytes. Never pads.
    pub fn iv_truncated(&self, len: usize) -> &[u8] {
        &self.iv[..len.min(self.iv.len())]
    }

    /// Encryption requires both halves.
    pub fn is_complete(&self) -> bool {
        !self.key.is_empty() && !self.iv.is_empty()
    }
}

/// Truncate or zero-pad `material` to exactly `len` bytes.
pub(crate) fn fit(material: &[u8], len: usize) -> Vec<u8> {
    let mut out = material[..len.min(material.len())].to_vec();
    out.resize(len, 0);
    out
}
