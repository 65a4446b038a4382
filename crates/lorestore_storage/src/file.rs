//! File-based storage backend.

use crate::backend::StorageBackend;
use crate::error::StorageResult;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// A storage backend over OS files.
///
/// # Durability
///
/// - `write_synced()` flushes and calls `File::sync_all()`
/// - `rename()` fsyncs the parent directory on Unix so the new directory
///   entry survives a power loss
///
/// # Example
///
/// ```no_run
/// use lorestore_storage::{FileBackend, StorageBackend};
/// use std::path::Path;
///
/// let backend = FileBackend::new();
/// backend.write_synced(Path::new("data.json.tmp"), b"{}").unwrap();
/// backend.rename(Path::new("data.json.tmp"), Path::new("data.json")).unwrap();
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct FileBackend;

impl FileBackend {
    /// Creates a new file backend.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[cfg(unix)]
    fn sync_parent(path: &Path) -> io::Result<()> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        File::open(parent)?.sync_all()
    }

    #[cfg(not(unix))]
    fn sync_parent(_path: &Path) -> io::Result<()> {
        // NTFS journals metadata; directory handles cannot be fsynced here.
        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn read(&self, path: &Path) -> StorageResult<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write_synced(&self, path: &Path, data: &[u8]) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut file = File::create(path)?;
        file.write_all(data)?;
        file.flush()?;
        file.sync_all()?;
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)?;
        Self::sync_parent(to)
    }

    fn remove(&self, path: &Path) -> StorageResult<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}
