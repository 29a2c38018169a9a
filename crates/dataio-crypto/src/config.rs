//! Cipher provider configuration

use crate::derivation::KeyDerivation;
use crate::modern::DEFAULT_CIPHER;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Construction-time settings for [`crate::aes::Aes`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Cipher selected on the modern backend at construction
    pub default_cipher: String,
    /// Route encryption through the legacy backend and force weak derivation
    pub prefer_legacy: bool,
    /// Derivation used by callers that do not name one explicitly
    pub derivation: KeyDerivation,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            default_cipher: DEFAULT_CIPHER.to_string(),
            prefer_legacy: false,
            derivation: KeyDerivation::Strong,
        }
    }
}

impl CryptoConfig {
    /// Load from a `.toml` or `.json` file. Missing fields take defaults.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        dataio_codec::load_config(path)
    }
}
