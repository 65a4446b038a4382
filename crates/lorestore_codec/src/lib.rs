//! # LoreStore Codec
//!
//! JSON encoding/decoding for LoreStore documents.
//!
//! This crate turns documents into bytes and back. It knows nothing about
//! files, backups or salvage; those live in `lorestore_storage`.
//!
//! ## Decoding Paths
//!
//! - **Fast**: deserialize directly from the byte slice
//! - **Fallback**: lossy UTF-8, strip a byte-order mark, trim, then parse
//!
//! A value that neither path accepts is reported as
//! [`CodecError::DecodingFailed`], which callers treat as corruption.
//!
//! ## Usage
//!
//! ```
//! use lorestore_codec::{from_json_bytes, to_json_bytes};
//!
//! let bytes = to_json_bytes(&vec!["名称", "标签"]).unwrap();
//! let decoded: Vec<String> = from_json_bytes(&bytes).unwrap();
//! assert_eq!(decoded, vec!["名称", "标签"]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;

pub use decoder::{decode_with_path, from_json_bytes, DecodePath};
pub use encoder::{to_json_bytes, to_json_pretty};
pub use error::{CodecError, CodecResult};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Trait for types that can be encoded to JSON bytes.
pub trait Encode {
    /// Encode this value to compact JSON bytes.
    fn encode(&self) -> CodecResult<Vec<u8>>;
}

/// Trait for types that can be decoded from JSON bytes.
pub trait Decode: Sized {
    /// Decode this value from JSON bytes.
    fn decode(bytes: &[u8]) -> CodecResult<Self>;
}

impl<T: Serialize> Encode for T {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        to_json_bytes(self)
    }
}

impl<T: DeserializeOwned> Decode for T {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        from_json_bytes(bytes)
    }
}
