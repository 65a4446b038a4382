//! Data directory management.
//!
//! ```text
//! <data_dir>/
//! ├─ LOCK              # Advisory lock, one open store per directory
//! ├─ data.json         # The document
//! └─ templates.json    # Node templates
//! ```
//!
//! The lock only stops a second store in another process (or this one) from
//! opening the same directory. It does not coordinate writers.

use crate::error::{CoreError, CoreResult};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "LOCK";

/// An opened data directory, optionally holding its `LOCK`.
#[derive(Debug)]
pub struct StoreDir {
    path: PathBuf,
    /// Held for exclusive access; released on drop.
    lock_file: Option<File>,
}

impl StoreDir {
    /// Opens or creates the directory at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `path` exists but is not a directory
    /// - `lock` is true and another store holds the lock (`StoreLocked`)
    /// - I/O errors occur
    pub fn open(path: &Path, lock: bool) -> CoreResult<Self> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        if !path.is_dir() {
            return Err(CoreError::invalid_operation(format!(
                "path is not a directory: {}",
                path.display()
            )));
        }

        let lock_file = if lock {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(path.join(LOCK_FILE))?;
            if file.try_lock_exclusive().is_err() {
                return Err(CoreError::StoreLocked);
            }
            Some(file)
        } else {
            None
        };

        Ok(Self {
            path: path.to_path_buf(),
            lock_file,
        })
    }

    /// Returns the directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if this handle holds the lock.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lock_file.is_some()
    }
}
