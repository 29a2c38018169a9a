//! Error types for the dataio-crypto subsystem

use dataio_codec::error::{
    CodecError, ERR_CIPHER_NO_KEYS, ERR_CIPHER_UNAVAILABLE, ERR_DECRYPTION_FAILED,
    ERR_LIBRARY_UNAVAILABLE, ERR_POLICY_UNSATISFIABLE,
};

/// All errors that can occur in the cipher provider and password generator
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// No usable cipher backend, or a backend was requested that cannot be used
    #[error("Cipher library unavailable: {reason}")]
    LibraryUnavailable {
        /// Why no backend could be selected
        reason: String,
    },
    /// Cipher name is not in the active backend's supported list
    #[error("Cipher does not exist in the active backend: {name}")]
    CipherUnavailable {
        /// The rejected cipher name
        name: String,
    },
    /// Encrypt or decrypt was called before key and IV material was set
    #[error("Missing cipher keys: key and IV must be set before encrypting or decrypting")]
    NoKeys,
    /// Ciphertext did not decrypt (wrong key, bad padding, truncated input)
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),
    /// A password policy has no way to produce output
    #[error("Password policy unsatisfiable: {0}")]
    PolicyUnsatisfiable(String),
    /// Error from the string codec (base64url framing)
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl CryptoError {
    /// Stable numeric code for programmatic matching.
    pub fn code(&self) -> u32 {
        match self {
            CryptoError::LibraryUnavailable { .. } => ERR_LIBRARY_UNAVAILABLE,
            CryptoError::CipherUnavailable { .. } => ERR_CIPHER_UNAVAILABLE,
            CryptoError::NoKeys => ERR_CIPHER_NO_KEYS,
            CryptoError::DecryptionFailed(_) => ERR_DECRYPTION_FAILED,
            CryptoError::PolicyUnsatisfiable(_) => ERR_POLICY_UNSATISFIABLE,
            CryptoError::Codec(e) => e.code(),
        }
    }
}

/// Result type alias using CryptoError as the error type.
pub type Result<T> = std::result::Result<T, CryptoError>;
