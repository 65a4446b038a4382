//! JSON encoding.
//!
//! Output is compact UTF-8 JSON. Non-ASCII text is written verbatim rather
//! than `\u`-escaped, so documents full of CJK field keys stay readable on
//! disk and roughly half the size.

use crate::error::{CodecError, CodecResult};
use serde::Serialize;

/// Encodes a value to compact JSON bytes.
///
/// # Errors
///
/// Returns [`CodecError::EncodingFailed`] if the value cannot be represented
/// as JSON (for example a map with non-string keys or a non-finite float).
pub fn to_json_bytes<T: Serialize + ?Sized>(value: &T) -> CodecResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| CodecError::encoding_failed(e.to_string()))
}

/// Encodes a value to indented JSON bytes, for human inspection.
///
/// # Errors
///
/// Same as [`to_json_bytes`].
pub fn to_json_pretty<T: Serialize + ?Sized>(value: &T) -> CodecResult<Vec<u8>> {
    serde_json::to_vec_pretty(value).map_err(|e| CodecError::encoding_failed(e.to_string()))
}
