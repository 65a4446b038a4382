//! # LoreStore Storage
//!
//! Durable whole-file persistence for LoreStore documents.
//!
//! This crate owns everything between an in-memory value and the bytes on
//! disk: atomic replace, bounded retry on sharing locks, corruption salvage
//! and timestamped backups. It does not cache, debounce or interpret the
//! documents it stores.
//!
//! ## On-disk layout for one document
//!
//! ```text
//! data.json                          # canonical file
//! data.json.tmp                      # present only during a save
//! data.json.corrupt-<ts>.bak         # bytes that failed to parse
//! data.json.permerr-<ts>.bak         # last good copy before a failed save
//! ```
//!
//! ## Available Backends
//!
//! - [`FileBackend`] - OS files, fsync + atomic rename
//! - [`InMemoryBackend`] - For testing, with fault injection
//!
//! ## Example
//!
//! ```rust
//! use lorestore_storage::{DurableWriter, InMemoryBackend, RetryPolicy};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let writer = DurableWriter::new(Arc::new(InMemoryBackend::new()), RetryPolicy::default());
//! writer.save(Path::new("data.json"), &vec!["hello"]).unwrap();
//! let loaded = writer.load(Path::new("data.json"), Vec::<String>::new()).unwrap();
//! assert_eq!(loaded.value, vec!["hello"]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod backup;
mod error;
mod file;
mod memory;
mod retry;
mod salvage;
mod writer;

pub use backend::StorageBackend;
pub use backup::{backup_path, list_backups, write_backup, BackupKind};
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use memory::InMemoryBackend;
pub use retry::RetryPolicy;
pub use salvage::salvage_prefix;
pub use writer::{DurableWriter, Loaded, Probe, Recovery};
