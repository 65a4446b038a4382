//! In-memory storage backend for testing.

use crate::backend::StorageBackend;
use crate::error::StorageResult;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// An in-memory storage backend.
///
/// Stores every path's bytes in a map. Besides plain unit testing it can
/// inject faults so retry and backup paths can be exercised without a real
/// sharing lock:
///
/// - [`fail_next_renames`](Self::fail_next_renames) makes the next `n`
///   renames fail with a given error kind
/// - [`fail_writes_to`](Self::fail_writes_to) makes writes to one path fail
///
/// # Example
///
/// ```rust
/// use lorestore_storage::{InMemoryBackend, StorageBackend};
/// use std::path::Path;
///
/// let backend = InMemoryBackend::new();
/// backend.write_synced(Path::new("a.tmp"), b"{}").unwrap();
/// backend.rename(Path::new("a.tmp"), Path::new("a.json")).unwrap();
/// assert_eq!(backend.get(Path::new("a.json")).unwrap(), b"{}");
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    files: RwLock<BTreeMap<PathBuf, Vec<u8>>>,
    failing_renames: AtomicU32,
    rename_error: RwLock<Option<io::ErrorKind>>,
    failing_write_path: RwLock<Option<(PathBuf, io::ErrorKind)>>,
    renames: AtomicU64,
}

impl InMemoryBackend {
    /// Creates a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend holding `data` at `path`.
    ///
    /// Useful for testing recovery of pre-existing (possibly corrupt) files.
    #[must_use]
    pub fn with_file(path: impl Into<PathBuf>, data: Vec<u8>) -> Self {
        let backend = Self::new();
        backend.files.write().insert(path.into(), data);
        backend
    }

    /// Returns a copy of the bytes at `path`.
    #[must_use]
    pub fn get(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.read().get(path).cloned()
    }

    /// Returns every stored path, in sorted order.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.read().keys().cloned().collect()
    }

    /// Returns the number of successful renames so far.
    #[must_use]
    pub fn rename_count(&self) -> u64 {
        self.renames.load(Ordering::SeqCst)
    }

    /// Makes the next `count` renames fail with `kind`.
    pub fn fail_next_renames(&self, count: u32, kind: io::ErrorKind) {
        *self.rename_error.write() = Some(kind);
        self.failing_renames.store(count, Ordering::SeqCst);
    }

    /// Makes every write to `path` fail with `kind` until cleared.
    pub fn fail_writes_to(&self, path: impl Into<PathBuf>, kind: io::ErrorKind) {
        *self.failing_write_path.write() = Some((path.into(), kind));
    }

    /// Clears all injected faults.
    pub fn clear_faults(&self) {
        self.failing_renames.store(0, Ordering::SeqCst);
        *self.rename_error.write() = None;
        *self.failing_write_path.write() = None;
    }

    fn take_rename_fault(&self) -> Option<io::ErrorKind> {
        let consumed = self
            .failing_renames
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if consumed {
            *self.rename_error.read()
        } else {
            None
        }
    }
}

impl StorageBackend for InMemoryBackend {
    fn read(&self, path: &Path) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.get(path))
    }

    fn write_synced(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        if let Some((failing, kind)) = self.failing_write_path.read().as_ref() {
            if failing == path {
                return Err(io::Error::new(*kind, "injected write failure").into());
            }
        }
        self.files.write().insert(path.to_path_buf(), data.to_vec());
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        if let Some(kind) = self.take_rename_fault() {
            return Err(io::Error::new(kind, "injected rename failure"));
        }
        let mut files = self.files.write();
        let data = files
            .remove(from)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "rename source missing"))?;
        files.insert(to.to_path_buf(), data);
        self.renames.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self, path: &Path) -> StorageResult<()> {
        self.files.write().remove(path);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.read().contains_key(path)
    }
}
