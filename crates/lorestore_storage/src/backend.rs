//! Storage backend trait definition.

use crate::error::StorageResult;
use std::io;
use std::path::Path;

/// A low-level, path-addressed storage backend for LoreStore.
///
/// Backends are **opaque byte stores** keyed by path. They do not interpret
/// the bytes, pick temp-file names or decide when to retry; the
/// [`DurableWriter`](crate::DurableWriter) owns all of that.
///
/// # Invariants
///
/// - `write_synced` returns only after the bytes are durable
/// - `rename` replaces `to` atomically: readers see the old or the new
///   content, never a mix
/// - Backends must be `Send + Sync`; every method takes `&self`
///
/// # Implementors
///
/// - [`super::FileBackend`] - OS files
/// - [`super::InMemoryBackend`] - For testing, with fault injection
pub trait StorageBackend: Send + Sync {
    /// Reads the full contents at `path`.
    ///
    /// Returns `Ok(None)` if nothing exists at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    fn read(&self, path: &Path) -> StorageResult<Option<Vec<u8>>>;

    /// Creates or truncates `path`, writes `data`, flushes and fsyncs it.
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails.
    fn write_synced(&self, path: &Path, data: &[u8]) -> StorageResult<()>;

    /// Atomically renames `from` over `to`.
    ///
    /// The raw [`io::Error`] is returned so the caller can tell a transient
    /// sharing lock apart from a hard failure.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the rename fails.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Removes `path`. Removing a missing path is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` exists but cannot be removed.
    fn remove(&self, path: &Path) -> StorageResult<()>;

    /// Returns true if something exists at `path`.
    fn exists(&self, path: &Path) -> bool;
}
