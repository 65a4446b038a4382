//! Timestamped sibling backups.
//!
//! Backups sit next to the file they protect:
//!
//! ```text
//! data.json
//! data.json.corrupt-20240501-142233.bak   # bytes that failed to parse
//! data.json.permerr-20240501-142301.bak   # last good copy before a failed save
//! ```
//!
//! Two backups of the same kind within one second get a numeric suffix
//! (`...-142233-1.bak`) instead of overwriting each other.

use crate::backend::StorageBackend;
use crate::error::StorageResult;
use chrono::Local;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Why a backup was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupKind {
    /// The file could not be decoded.
    Corrupt,
    /// A save failed with a permission or lock error.
    PermissionError,
}

impl BackupKind {
    fn tag(self) -> &'static str {
        match self {
            Self::Corrupt => "corrupt",
            Self::PermissionError => "permerr",
        }
    }
}

/// Builds `<path>.<kind>-<timestamp>[-n].bak`.
#[must_use]
pub fn backup_path(path: &Path, kind: BackupKind, timestamp: &str, suffix: u32) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".{}-{timestamp}", kind.tag()));
    if suffix > 0 {
        name.push(format!("-{suffix}"));
    }
    name.push(".bak");
    PathBuf::from(name)
}

/// Writes `data` to a fresh timestamped backup next to `path`.
///
/// Returns the backup path.
///
/// # Errors
///
/// Returns an error if the backup cannot be written.
pub fn write_backup(
    backend: &dyn StorageBackend,
    path: &Path,
    kind: BackupKind,
    data: &[u8],
) -> StorageResult<PathBuf> {
    let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
    let mut suffix = 0;
    let mut target = backup_path(path, kind, &timestamp, suffix);
    while backend.exists(&target) {
        suffix += 1;
        target = backup_path(path, kind, &timestamp, suffix);
    }
    backend.write_synced(&target, data)?;
    Ok(target)
}

/// Lists existing backups of `kind` for `path`, sorted by name.
///
/// Only meaningful for directory-backed paths; the scan reads the parent
/// directory directly.
#[must_use]
pub fn list_backups(path: &Path, kind: BackupKind) -> Vec<PathBuf> {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
        return Vec::new();
    };
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let prefix = format!("{file_name}.{}-", kind.tag());

    let Ok(entries) = std::fs::read_dir(parent) else {
        return Vec::new();
    };
    let mut found: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(".bak"))
        })
        .collect();
    found.sort();
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileBackend, InMemoryBackend};
    use tempfile::tempdir;

    #[test]
    fn path_format() {
        let path = backup_path(
            Path::new("dir/data.json"),
            BackupKind::Corrupt,
            "20240501-142233",
            0,
        );
        assert_eq!(path, PathBuf::from("dir/data.json.corrupt-20240501-142233.bak"));

        let path = backup_path(
            Path::new("data.json"),
            BackupKind::PermissionError,
            "20240501-142233",
            2,
        );
        assert_eq!(path, PathBuf::from("data.json.permerr-20240501-142233-2.bak"));
    }

    #[test]
    fn same_second_backups_do_not_collide() {
        let backend = InMemoryBackend::new();
        let first = write_backup(&backend, Path::new("data.json"), BackupKind::Corrupt, b"1").unwrap();
        let second =
            write_backup(&backend, Path::new("data.json"), BackupKind::Corrupt, b"2").unwrap();

        assert_ne!(first, second);
        assert_eq!(backend.get(&first).unwrap(), b"1");
        assert_eq!(backend.get(&second).unwrap(), b"2");
    }

    #[test]
    fn list_finds_only_matching_kind() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        let backend = FileBackend::new();

        write_backup(&backend, &path, BackupKind::Corrupt, b"x").unwrap();
        write_backup(&backend, &path, BackupKind::PermissionError, b"y").unwrap();

        assert_eq!(list_backups(&path, BackupKind::Corrupt).len(), 1);
        assert_eq!(list_backups(&path, BackupKind::PermissionError).len(), 1);
        assert!(list_backups(&dir.path().join("templates.json"), BackupKind::Corrupt).is_empty());
    }
}
