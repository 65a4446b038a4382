//! Atomic saves and self-healing loads.
//!
//! ## Save
//!
//! 1. Encode the value
//! 2. Remove any stale `<path>.tmp`
//! 3. Write, flush and fsync `<path>.tmp`
//! 4. Rename `<path>.tmp` over `<path>`, retrying transient locks
//!
//! If the rename is still locked after the last attempt, or the temp file
//! cannot be written for lack of permission, the current `<path>` is copied to
//! a `.permerr-*.bak` before the error is returned.
//!
//! ## Load
//!
//! A missing file is created from the default. Undecodable bytes are backed
//! up to `.corrupt-*.bak` and replaced by either the salvaged leading value or
//! the default. The store therefore always opens, and corrupt bytes are never
//! discarded.

use crate::backend::StorageBackend;
use crate::backup::{write_backup, BackupKind};
use crate::error::{is_transient_lock, StorageError, StorageResult};
use crate::retry::RetryPolicy;
use crate::salvage::salvage_prefix;
use lorestore_codec::{from_json_bytes, to_json_bytes, CodecError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// How a [`DurableWriter::load`] obtained its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recovery {
    /// The file decoded cleanly.
    Clean,
    /// The file was missing and has been created from the default.
    Created,
    /// The file was empty; the default was returned and nothing written.
    Empty,
    /// A leading value was salvaged and re-persisted.
    Salvaged {
        /// Where the corrupt bytes were preserved.
        backup: PathBuf,
    },
    /// Nothing was salvageable; the default was persisted.
    Reset {
        /// Where the corrupt bytes were preserved.
        backup: PathBuf,
    },
}

impl Recovery {
    /// Returns true if the on-disk bytes were corrupt.
    #[must_use]
    pub fn was_corrupt(&self) -> bool {
        matches!(self, Self::Salvaged { .. } | Self::Reset { .. })
    }
}

/// A loaded value plus how it was obtained.
#[derive(Debug, Clone)]
pub struct Loaded<T> {
    /// The decoded (or salvaged, or default) value.
    pub value: T,
    /// What happened on the way.
    pub recovery: Recovery,
}

/// Read-only diagnosis of a persisted file, see [`DurableWriter::probe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// Nothing exists at the path.
    Missing,
    /// The file exists but is empty.
    Empty,
    /// The file decodes cleanly.
    Healthy {
        /// File size in bytes.
        size: usize,
    },
    /// The file is corrupt but a leading value can be salvaged.
    Salvageable {
        /// File size in bytes.
        size: usize,
        /// Length of the salvageable prefix region (from its first bracket).
        salvaged_len: usize,
        /// Why the full decode failed.
        reason: String,
    },
    /// The file is corrupt and nothing can be salvaged.
    Unrecoverable {
        /// File size in bytes.
        size: usize,
        /// Why the full decode failed.
        reason: String,
    },
}

/// Writes and reads whole JSON documents crash-safely.
///
/// The writer is cheap to clone and safe to share; it holds no lock of its
/// own. Callers that need mutual exclusion between saves of the same path
/// must provide it.
#[derive(Clone)]
pub struct DurableWriter {
    backend: Arc<dyn StorageBackend>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for DurableWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DurableWriter")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl DurableWriter {
    /// Creates a writer over `backend` using `retry` for the final rename.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>, retry: RetryPolicy) -> Self {
        Self { backend, retry }
    }

    /// Returns the underlying backend.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// Returns the sibling temp path used while saving `path`.
    #[must_use]
    pub fn temp_path(path: &Path) -> PathBuf {
        let mut name = OsString::from(path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Atomically replaces the file at `path` with `value` encoded as JSON.
    ///
    /// # Errors
    ///
    /// - [`StorageError::Codec`] if `value` cannot be encoded
    /// - [`StorageError::PermissionDenied`] if the temp file cannot be written
    /// - [`StorageError::TransientLock`] if the rename is still locked after
    ///   every retry
    /// - [`StorageError::Io`] for any other I/O failure
    pub fn save<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> StorageResult<()> {
        let payload = to_json_bytes(value)?;
        self.save_bytes(path, &payload)
    }

    /// Same as [`save`](Self::save) for already-encoded bytes.
    ///
    /// # Errors
    ///
    /// See [`save`](Self::save).
    pub fn save_bytes(&self, path: &Path, payload: &[u8]) -> StorageResult<()> {
        let tmp = Self::temp_path(path);

        if let Err(err) = self.backend.remove(&tmp) {
            debug!(path = %tmp.display(), error = %err, "could not remove stale temp file");
        }

        if let Err(err) = self.backend.write_synced(&tmp, payload) {
            if err.is_transient_lock() {
                let backup = self.backup_last_good(path);
                return Err(StorageError::PermissionDenied {
                    path: tmp,
                    backup,
                });
            }
            return Err(err);
        }

        let attempts = self.retry.attempts();
        for attempt in 1..=attempts {
            match self.backend.rename(&tmp, path) {
                Ok(()) => {
                    debug!(path = %path.display(), bytes = payload.len(), attempt, "saved");
                    return Ok(());
                }
                Err(err) if is_transient_lock(&err) => {
                    warn!(
                        path = %path.display(),
                        attempt,
                        max_attempts = attempts,
                        error = %err,
                        "rename blocked by a lock"
                    );
                    if attempt < attempts {
                        std::thread::sleep(self.retry.delay_after(attempt));
                    }
                }
                Err(err) => return Err(StorageError::Io(err)),
            }
        }

        let backup = self.backup_last_good(path);
        error!(
            path = %path.display(),
            attempts,
            backup = ?backup,
            "giving up on locked rename"
        );
        Err(StorageError::TransientLock {
            path: path.to_path_buf(),
            attempts,
            backup,
        })
    }

    /// Loads the JSON document at `path`, repairing it if needed.
    ///
    /// - Missing file: `default` is saved and returned
    /// - Empty file: `default` is returned, nothing is written
    /// - Corrupt file: the bytes are backed up, then the salvaged leading
    ///   value (or `default`) is saved and returned
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, or if a backup or repair
    /// save fails. Corruption alone is never an error.
    pub fn load<T>(&self, path: &Path, default: T) -> StorageResult<Loaded<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        let Some(raw) = self.backend.read(path)? else {
            self.save(path, &default)?;
            info!(path = %path.display(), "created new document");
            return Ok(Loaded {
                value: default,
                recovery: Recovery::Created,
            });
        };

        let err = match from_json_bytes::<T>(&raw) {
            Ok(value) => {
                debug!(path = %path.display(), bytes = raw.len(), "loaded");
                return Ok(Loaded {
                    value,
                    recovery: Recovery::Clean,
                });
            }
            Err(CodecError::EmptyInput) => {
                return Ok(Loaded {
                    value: default,
                    recovery: Recovery::Empty,
                });
            }
            Err(err) => err,
        };

        warn!(path = %path.display(), error = %err, "document is corrupt, attempting salvage");
        let backup = write_backup(self.backend.as_ref(), path, BackupKind::Corrupt, &raw)?;

        if let Some(value) = salvage_prefix(&raw).and_then(|p| from_json_bytes::<T>(p).ok()) {
            self.save(path, &value)?;
            warn!(path = %path.display(), backup = %backup.display(), "salvaged leading document");
            return Ok(Loaded {
                value,
                recovery: Recovery::Salvaged { backup },
            });
        }

        self.save(path, &default)?;
        warn!(path = %path.display(), backup = %backup.display(), "nothing salvageable, reset to default");
        Ok(Loaded {
            value: default,
            recovery: Recovery::Reset { backup },
        })
    }

    /// Diagnoses the file at `path` as a `T` without modifying anything.
    ///
    /// # Errors
    ///
    /// Returns an error only if the file cannot be read.
    pub fn probe<T: DeserializeOwned>(&self, path: &Path) -> StorageResult<Probe> {
        let Some(raw) = self.backend.read(path)? else {
            return Ok(Probe::Missing);
        };
        let size = raw.len();
        match from_json_bytes::<T>(&raw) {
            Ok(_) => Ok(Probe::Healthy { size }),
            Err(CodecError::EmptyInput) => Ok(Probe::Empty),
            Err(err) => {
                let reason = err.to_string();
                match salvage_prefix(&raw).filter(|p| from_json_bytes::<T>(p).is_ok()) {
                    Some(prefix) => Ok(Probe::Salvageable {
                        size,
                        salvaged_len: prefix.len(),
                        reason,
                    }),
                    None => Ok(Probe::Unrecoverable { size, reason }),
                }
            }
        }
    }

    /// Copies the current file to a `.permerr` backup, best effort.
    fn backup_last_good(&self, path: &Path) -> Option<PathBuf> {
        let data = match self.backend.read(path) {
            Ok(Some(data)) => data,
            Ok(None) => return None,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot read file to back up");
                return None;
            }
        };
        match write_backup(self.backend.as_ref(), path, BackupKind::PermissionError, &data) {
            Ok(backup) => Some(backup),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot write permission-error backup");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileBackend, InMemoryBackend};
    use proptest::prelude::*;
    use serde::Deserialize;
    use std::io;
    use std::time::Duration;
    use tempfile::tempdir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
    struct Doc {
        #[serde(default)]
        nodes: Vec<String>,
    }

    fn doc(names: &[&str]) -> Doc {
        Doc {
            nodes: names.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::default().with_backoff_step(Duration::ZERO)
    }

    fn memory_writer() -> (Arc<InMemoryBackend>, DurableWriter) {
        let backend = Arc::new(InMemoryBackend::new());
        let writer = DurableWriter::new(backend.clone(), fast_retry());
        (backend, writer)
    }

    #[test]
    fn save_then_load_roundtrip_on_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        let writer = DurableWriter::new(Arc::new(FileBackend::new()), fast_retry());

        writer.save(&path, &doc(&["a", "名称"])).unwrap();
        let loaded = writer.load(&path, Doc::default()).unwrap();

        assert_eq!(loaded.value, doc(&["a", "名称"]));
        assert_eq!(loaded.recovery, Recovery::Clean);
        assert!(!DurableWriter::temp_path(&path).exists());
    }

    #[test]
    fn load_missing_creates_default() {
        let (backend, writer) = memory_writer();
        let path = Path::new("data.json");

        let loaded = writer.load(path, doc(&["seed"])).unwrap();

        assert_eq!(loaded.recovery, Recovery::Created);
        assert_eq!(loaded.value, doc(&["seed"]));
        assert_eq!(backend.get(path).unwrap(), br#"{"nodes":["seed"]}"#);
    }

    #[test]
    fn load_empty_returns_default_without_writing() {
        let backend = Arc::new(InMemoryBackend::with_file("data.json", Vec::new()));
        let writer = DurableWriter::new(backend.clone(), fast_retry());

        let loaded = writer.load(Path::new("data.json"), Doc::default()).unwrap();

        assert_eq!(loaded.recovery, Recovery::Empty);
        assert_eq!(backend.paths().len(), 1);
    }

    #[test]
    fn load_salvages_valid_prefix_and_backs_up_once() {
        let raw = br#"{"nodes":["kept"]}{"nodes":["#.to_vec();
        let backend = Arc::new(InMemoryBackend::with_file("data.json", raw.clone()));
        let writer = DurableWriter::new(backend.clone(), fast_retry());

        let loaded = writer.load(Path::new("data.json"), Doc::default()).unwrap();

        assert_eq!(loaded.value, doc(&["kept"]));
        let Recovery::Salvaged { backup } = &loaded.recovery else {
            panic!("expected salvage, got {:?}", loaded.recovery);
        };
        assert_eq!(backend.get(backup).unwrap(), raw);

        let backups: Vec<_> = backend
            .paths()
            .into_iter()
            .filter(|p| p.to_string_lossy().contains(".corrupt-"))
            .collect();
        assert_eq!(backups.len(), 1);
        assert_eq!(
            backend.get(Path::new("data.json")).unwrap(),
            br#"{"nodes":["kept"]}"#
        );
    }

    proptest! {
        #[test]
        fn load_recovers_any_document_followed_by_garbage(
            names in prop::collection::vec("\\PC{0,8}", 0..6),
            garbage in prop::collection::vec(any::<u8>(), 0..32),
        ) {
            let original = Doc { nodes: names };
            let mut raw = to_json_bytes(&original).unwrap();
            raw.push(b'x');
            raw.extend_from_slice(&garbage);
            let backend = Arc::new(InMemoryBackend::with_file("data.json", raw));
            let writer = DurableWriter::new(backend.clone(), fast_retry());

            let loaded = writer.load(Path::new("data.json"), Doc::default()).unwrap();

            prop_assert!(matches!(loaded.recovery, Recovery::Salvaged { .. }), "expected salvaged recovery");
            prop_assert_eq!(&loaded.value, &original);
            let backups = backend
                .paths()
                .into_iter()
                .filter(|p| p.to_string_lossy().contains(".corrupt-"))
                .count();
            prop_assert_eq!(backups, 1);
        }
    }

    #[test]
    fn load_resets_when_nothing_salvageable() {
        let backend = Arc::new(InMemoryBackend::with_file(
            "data.json",
            b"not json at all".to_vec(),
        ));
        let writer = DurableWriter::new(backend.clone(), fast_retry());

        let loaded = writer.load(Path::new("data.json"), doc(&["d"])).unwrap();

        assert_eq!(loaded.value, doc(&["d"]));
        let Recovery::Reset { backup } = &loaded.recovery else {
            panic!("expected reset, got {:?}", loaded.recovery);
        };
        assert_eq!(backend.get(backup).unwrap(), b"not json at all");
        assert_eq!(backend.get(Path::new("data.json")).unwrap(), br#"{"nodes":["d"]}"#);
    }

    #[test]
    fn load_resets_when_prefix_has_wrong_shape() {
        let backend = Arc::new(InMemoryBackend::with_file(
            "data.json",
            b"[1,2,3] trailing".to_vec(),
        ));
        let writer = DurableWriter::new(backend, fast_retry());

        let loaded = writer.load(Path::new("data.json"), Doc::default()).unwrap();
        assert!(matches!(loaded.recovery, Recovery::Reset { .. }));
    }

    #[test]
    fn rename_retries_transient_locks() {
        let (backend, writer) = memory_writer();
        backend.fail_next_renames(4, io::ErrorKind::PermissionDenied);

        writer.save(Path::new("data.json"), &doc(&["x"])).unwrap();

        assert_eq!(backend.rename_count(), 1);
        assert_eq!(backend.get(Path::new("data.json")).unwrap(), br#"{"nodes":["x"]}"#);
    }

    #[test]
    fn rename_gives_up_after_max_attempts_and_backs_up() {
        let backend = Arc::new(InMemoryBackend::with_file(
            "data.json",
            br#"{"nodes":["old"]}"#.to_vec(),
        ));
        let writer = DurableWriter::new(backend.clone(), fast_retry());
        backend.fail_next_renames(5, io::ErrorKind::PermissionDenied);

        let err = writer.save(Path::new("data.json"), &doc(&["new"])).unwrap_err();

        let StorageError::TransientLock { attempts, backup, .. } = &err else {
            panic!("expected transient lock, got {err:?}");
        };
        assert_eq!(*attempts, 5);
        let backup = backup.as_ref().unwrap();
        assert!(backup.to_string_lossy().contains(".permerr-"));
        assert_eq!(backend.get(backup).unwrap(), br#"{"nodes":["old"]}"#);
        assert_eq!(
            backend.get(Path::new("data.json")).unwrap(),
            br#"{"nodes":["old"]}"#
        );
    }

    #[test]
    fn hard_rename_failure_is_not_retried() {
        let (backend, writer) = memory_writer();
        backend.fail_next_renames(1, io::ErrorKind::Other);

        let err = writer.save(Path::new("data.json"), &doc(&[])).unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
    }

    #[test]
    fn temp_write_permission_error_backs_up_original() {
        let backend = Arc::new(InMemoryBackend::with_file(
            "data.json",
            br#"{"nodes":["old"]}"#.to_vec(),
        ));
        backend.fail_writes_to("data.json.tmp", io::ErrorKind::PermissionDenied);
        let writer = DurableWriter::new(backend.clone(), fast_retry());

        let err = writer.save(Path::new("data.json"), &doc(&["new"])).unwrap_err();

        let StorageError::PermissionDenied { backup, .. } = &err else {
            panic!("expected permission denied, got {err:?}");
        };
        assert!(backup.is_some());
    }

    #[test]
    fn stale_temp_file_is_replaced() {
        let backend = Arc::new(InMemoryBackend::with_file(
            "data.json.tmp",
            b"half-written".to_vec(),
        ));
        let writer = DurableWriter::new(backend.clone(), fast_retry());

        writer.save(Path::new("data.json"), &doc(&["a"])).unwrap();

        assert!(!backend.exists(Path::new("data.json.tmp")));
        assert_eq!(backend.get(Path::new("data.json")).unwrap(), br#"{"nodes":["a"]}"#);
    }

    #[test]
    fn probe_classifies_without_writing() {
        let backend = Arc::new(InMemoryBackend::new());
        let writer = DurableWriter::new(backend.clone(), fast_retry());
        let path = Path::new("data.json");

        assert_eq!(writer.probe::<Doc>(path).unwrap(), Probe::Missing);

        backend.write_synced(path, br#"{"nodes":[]}"#).unwrap();
        assert_eq!(writer.probe::<Doc>(path).unwrap(), Probe::Healthy { size: 12 });

        backend.write_synced(path, br#"{"nodes":[]}xx"#).unwrap();
        assert!(matches!(
            writer.probe::<Doc>(path).unwrap(),
            Probe::Salvageable { salvaged_len: 12, .. }
        ));

        backend.write_synced(path, b"garbage").unwrap();
        assert!(matches!(
            writer.probe::<Doc>(path).unwrap(),
            Probe::Unrecoverable { .. }
        ));
        assert_eq!(backend.paths().len(), 1);
    }
}
