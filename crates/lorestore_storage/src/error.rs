//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The atomic rename kept failing on a sharing lock.
    #[error(
        "{} still locked after {attempts} rename attempts{}",
        path.display(),
        backup_note(backup)
    )]
    TransientLock {
        /// The target path that could not be replaced.
        path: PathBuf,
        /// How many rename attempts were made.
        attempts: u32,
        /// Backup of the last-known-good file, if one was written.
        backup: Option<PathBuf>,
    },

    /// Access to the target (or its temp file) was denied.
    #[error("access denied: {}{}", path.display(), backup_note(backup))]
    PermissionDenied {
        /// The path that could not be written.
        path: PathBuf,
        /// Backup of the last-known-good file, if one was written.
        backup: Option<PathBuf>,
    },

    /// Encoding or decoding failed.
    #[error("codec error: {0}")]
    Codec(#[from] lorestore_codec::CodecError),
}

fn backup_note(backup: &Option<PathBuf>) -> String {
    match backup {
        Some(path) => format!("; last good copy backed up to {}", path.display()),
        None => String::new(),
    }
}

impl StorageError {
    /// Returns true if the underlying failure is a sharing/permission lock
    /// that may clear up if retried.
    #[must_use]
    pub fn is_transient_lock(&self) -> bool {
        match self {
            Self::Io(err) => is_transient_lock(err),
            _ => false,
        }
    }

    /// Returns the backup of the previous file written before this error was
    /// raised, if any.
    #[must_use]
    pub fn backup(&self) -> Option<&PathBuf> {
        match self {
            Self::TransientLock { backup, .. } | Self::PermissionDenied { backup, .. } => {
                backup.as_ref()
            }
            _ => None,
        }
    }
}

/// Classifies an I/O error as a transient lock held by another process.
///
/// On Windows a file open in another program surfaces either as access denied
/// or as a sharing/lock violation (OS errors 32 and 33).
pub(crate) fn is_transient_lock(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::PermissionDenied {
        return true;
    }
    cfg!(windows) && matches!(err.raw_os_error(), Some(32 | 33))
}
