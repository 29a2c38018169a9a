//! Error types and stable error codes shared by the dataio crates

use thiserror::Error;

/// A requested format, codec or backend is not available in this build
pub const ERR_FEATURE_UNAVAILABLE: u32 = 404;
/// No usable cipher library remains (or a legacy preference cannot be honored)
pub const ERR_LIBRARY_UNAVAILABLE: u32 = 1001;
/// The requested cipher name is not supported by the active backend
pub const ERR_CIPHER_UNAVAILABLE: u32 = 1002;
/// Key or IV material is empty at encrypt/decrypt time
pub const ERR_CIPHER_NO_KEYS: u32 = 1003;
/// Ciphertext could not be decrypted (bad padding, bad length)
pub const ERR_DECRYPTION_FAILED: u32 = 1004;
/// A password policy cannot produce a password
pub const ERR_POLICY_UNSATISFIABLE: u32 = 1005;
/// Compression failed
pub const ERR_COMPRESSION_FAILED: u32 = 1010;
/// Decompression failed
pub const ERR_DECOMPRESSION_FAILED: u32 = 1011;
/// Encoding into an output format failed
pub const ERR_ENCODING_FAILED: u32 = 1020;
/// Decoding from an input format failed
pub const ERR_DECODING_FAILED: u32 = 1021;
/// I/O error
pub const ERR_IO: u32 = 1030;
/// Configuration could not be loaded
pub const ERR_CONFIG: u32 = 1040;

/// Errors raised by the string codec and the compression adapter.
#[derive(Error, Debug)]
pub enum CodecError {
    /// An optional codec was not compiled in or was disabled by capability
    #[error("Feature unavailable: {feature}")]
    FeatureUnavailable {
        /// The missing feature name
        feature: String,
    },
    /// Compression operation failed
    #[error("Compression failed: {0}")]
    CompressionFailed(String),
    /// Decompression operation failed
    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),
    /// Input could not be decoded (base64, text)
    #[error("Decoding failed: {0}")]
    DecodingFailed(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    /// Shorthand for a missing feature.
    pub fn unavailable(feature: impl Into<String>) -> Self {
        CodecError::FeatureUnavailable {
            feature: feature.into(),
        }
    }

    /// Stable numeric code for programmatic matching.
    pub fn code(&self) -> u32 {
        match self {
            CodecError::FeatureUnavailable { .. } => ERR_FEATURE_UNAVAILABLE,
            CodecError::CompressionFailed(_) => ERR_COMPRESSION_FAILED,
            CodecError::DecompressionFailed(_) => ERR_DECOMPRESSION_FAILED,
            CodecError::DecodingFailed(_) => ERR_DECODING_FAILED,
            CodecError::Io(_) => ERR_IO,
        }
    }
}

/// Result type alias using CodecError as the error type.
pub type Result<T> = std::result::Result<T, CodecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_unavailable_error() {
        let err = CodecError::unavailable("bzip2");
        assert_eq!(err.to_string(), "Feature unavailable: bzip2");
        assert_eq!(err.code(), ERR_FEATURE_UNAVAILABLE);
    }

    #[test]
    fn test_compression_failed_error() {
        let err = CodecError::CompressionFailed("boom".to_string());
        assert_eq!(err.to_string(), "Compression failed: boom");
        assert_eq!(err.code(), ERR_COMPRESSION_FAILED);
    }

    #[test]
    fn test_io_error_code() {
        let err: CodecError = std::io::Error::new(std::io::ErrorKind::Other, "x").into();
        assert_eq!(err.code(), ERR_IO);
    }
}
