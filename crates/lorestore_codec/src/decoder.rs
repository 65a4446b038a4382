//! JSON decoding with a fast path and a lenient fallback.
//!
//! The fast path deserializes straight from the byte slice. When that fails,
//! the fallback decodes the bytes as (lossy) UTF-8, drops a leading byte-order
//! mark and surrounding whitespace, and parses again. Only if both fail is the
//! input reported as malformed; callers then decide whether to salvage.

use crate::error::{CodecError, CodecResult};
use serde::de::DeserializeOwned;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Which decoding path produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePath {
    /// Direct slice deserialization.
    Fast,
    /// Lossy UTF-8, BOM-stripped, trimmed text deserialization.
    Fallback,
}

/// Decodes JSON bytes into `T`.
///
/// # Errors
///
/// Returns [`CodecError::EmptyInput`] for empty or whitespace-only input, and
/// [`CodecError::DecodingFailed`] (carrying the fallback parser's position)
/// when neither path succeeds.
pub fn from_json_bytes<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
    decode_with_path(bytes).map(|(value, _)| value)
}

/// Decodes JSON bytes into `T`, also reporting which path succeeded.
///
/// # Errors
///
/// Same as [`from_json_bytes`].
pub fn decode_with_path<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<(T, DecodePath)> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(CodecError::EmptyInput);
    }

    if let Ok(value) = serde_json::from_slice::<T>(bytes) {
        return Ok((value, DecodePath::Fast));
    }

    let stripped = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let text = String::from_utf8_lossy(stripped);
    let text = text.trim();
    if text.is_empty() {
        return Err(CodecError::EmptyInput);
    }

    serde_json::from_str::<T>(text)
        .map(|value| (value, DecodePath::Fallback))
        .map_err(|e| CodecError::from_json(&e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn fast_path_for_clean_input() {
        let (value, path) = decode_with_path::<Value>(br#"{"a":[1,2]}"#).unwrap();
        assert_eq!(value, json!({"a": [1, 2]}));
        assert_eq!(path, DecodePath::Fast);
    }

    #[test]
    fn fallback_strips_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(br#"{"nodes":[]}"#);
        let (value, path) = decode_with_path::<Value>(&bytes).unwrap();
        assert_eq!(value, json!({"nodes": []}));
        assert_eq!(path, DecodePath::Fallback);
    }

    #[test]
    fn fallback_tolerates_invalid_utf8_inside_strings() {
        let bytes = b"{\"k\":\"a\xFFb\"}";
        let (value, path) = decode_with_path::<Value>(bytes).unwrap();
        assert_eq!(path, DecodePath::Fallback);
        assert_eq!(value["k"], Value::String("a\u{FFFD}b".to_string()));
    }

    #[test]
    fn empty_input_is_reported() {
        assert_eq!(
            from_json_bytes::<Value>(b"").unwrap_err(),
            CodecError::EmptyInput
        );
        assert_eq!(
            from_json_bytes::<Value>(b"  \n ").unwrap_err(),
            CodecError::EmptyInput
        );
    }

    #[test]
    fn trailing_garbage_is_malformed() {
        let err = from_json_bytes::<Value>(br#"{"a":1}xyz"#).unwrap_err();
        assert!(matches!(err, CodecError::DecodingFailed { .. }));
    }
}
