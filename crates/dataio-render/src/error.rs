//! Error types for the dataio-render subsystem

use dataio_codec::error::{CodecError, ERR_ENCODING_FAILED, ERR_IO};

/// Errors raised by the renderer. Parsers never raise; they return `None`.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Error from the codec layer; also carries missing-feature conditions
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// A format encoder rejected the graph
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
    /// The terminal writer failed while emitting output
    #[error("Output failed: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    /// Stable numeric code for programmatic matching.
    pub fn code(&self) -> u32 {
        match self {
            RenderError::Codec(e) => e.code(),
            RenderError::EncodingFailed(_) => ERR_ENCODING_FAILED,
            RenderError::Io(_) => ERR_IO,
        }
    }

    /// Missing optional format or codec.
    pub fn unavailable(feature: impl Into<String>) -> Self {
        RenderError::Codec(CodecError::unavailable(feature))
    }
}

impl From<serde_json::Error> for RenderError {
    fn from(e: serde_json::Error) -> Self {
        RenderError::EncodingFailed(e.to_string())
    }
}

/// Result type alias using RenderError as the error type.
pub type Result<T> = std::result::Result<T, RenderError>;
