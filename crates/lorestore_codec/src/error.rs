//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Failed to encode a value to JSON.
    #[error("encoding failed: {message}")]
    EncodingFailed {
        /// Description of the encoding error.
        message: String,
    },

    /// Failed to decode JSON bytes.
    #[error("decoding failed at line {line}, column {column}: {message}")]
    DecodingFailed {
        /// Description of the decoding error.
        message: String,
        /// One-based line of the failure (0 if unknown).
        line: usize,
        /// One-based column of the failure (0 if unknown).
        column: usize,
    },

    /// The input contained no bytes (or only whitespace).
    #[error("empty input")]
    EmptyInput,
}

impl CodecError {
    /// Create an encoding failed error.
    pub fn encoding_failed(message: impl Into<String>) -> Self {
        Self::EncodingFailed {
            message: message.into(),
        }
    }

    /// Create a decoding failed error from a `serde_json` error.
    pub fn from_json(err: &serde_json::Error) -> Self {
        Self::DecodingFailed {
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
        }
    }

    /// Returns true if this error came from malformed input rather than an
    /// unserializable value.
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::DecodingFailed { .. } | Self::EmptyInput)
    }
}
