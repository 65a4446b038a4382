//! # LoreStore Testkit
//!
//! Test utilities for LoreStore.
//!
//! This crate provides:
//! - Temporary stores on disk or in memory
//! - Sample world documents
//! - Property-based generators for documents using proptest
//! - Helpers that damage files the way an interrupted writer would
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lorestore_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_store() {
//!     with_temp_store(|store| {
//!         store.import_document(sample_world()).unwrap();
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod crash;
pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::crash::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use crash::*;
pub use fixtures::*;
pub use generators::*;
