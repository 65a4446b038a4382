//! The in-memory document cache and its debounced persistence.
//!
//! Reads and writes exchange whole [`Document`] copies with the cache under
//! a single lock that is never held across disk I/O. Writes mark the cache
//! dirty and (re)start the [`FlushScheduler`]; the scheduler later takes a
//! snapshot under the same lock, clears the dirty flag and saves outside the
//! lock.
//!
//! A hard crash inside the debounce window loses every write since the last
//! flush. A clean [`shutdown`](SnapshotStore::shutdown) never does.

use crate::error::CoreResult;
use crate::flush::{Flush, FlushOutcome, FlushScheduler};
use crate::model::Document;
use crate::stats::StoreStats;
use lorestore_storage::{DurableWriter, Recovery};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct CacheState {
    doc: Option<Document>,
    dirty: bool,
    recovery: Option<Recovery>,
}

/// Cache shared between foreground callers and the flush worker.
#[derive(Debug)]
struct Cache {
    state: Mutex<CacheState>,
    /// Serializes first-time loads so the file is read once.
    loading: Mutex<()>,
    /// Serializes saves so snapshots reach disk in the order they were taken.
    saving: Mutex<()>,
    writer: DurableWriter,
    path: PathBuf,
    stats: Arc<StoreStats>,
}

impl Cache {
    fn read(&self) -> CoreResult<Document> {
        if let Some(doc) = self.state.lock().doc.as_ref() {
            return Ok(doc.clone());
        }

        let _loading = self.loading.lock();
        if let Some(doc) = self.state.lock().doc.as_ref() {
            return Ok(doc.clone());
        }

        let loaded = self.writer.load(&self.path, Document::default())?;
        if loaded.recovery.was_corrupt() {
            self.stats.record_recovery();
        }
        debug!(path = %self.path.display(), recovery = ?loaded.recovery, "document cached");

        let mut state = self.state.lock();
        state.recovery = Some(loaded.recovery);
        // A write that raced the load wins.
        let doc = state.doc.get_or_insert(loaded.value);
        Ok(doc.clone())
    }

    fn install(&self, doc: Document) {
        let mut state = self.state.lock();
        state.doc = Some(doc);
        state.dirty = true;
        self.stats.record_write();
    }
}

impl Flush for Cache {
    fn flush(&self) -> CoreResult<FlushOutcome> {
        let _saving = self.saving.lock();

        let snapshot = {
            let mut state = self.state.lock();
            if !state.dirty {
                None
            } else {
                state.dirty = false;
                state.doc.clone()
            }
        };

        let Some(doc) = snapshot else {
            self.stats.record_skipped_flush();
            return Ok(FlushOutcome::Clean);
        };

        match self.writer.save(&self.path, &doc) {
            Ok(()) => {
                self.stats.record_flush();
                debug!(path = %self.path.display(), nodes = doc.nodes.len(), "flushed");
                Ok(FlushOutcome::Written)
            }
            Err(err) => {
                self.state.lock().dirty = true;
                self.stats.record_flush_failure();
                warn!(path = %self.path.display(), error = %err, "flush failed, cache left dirty");
                Err(err.into())
            }
        }
    }
}

/// Cached document with debounced durable writes.
#[derive(Debug)]
pub struct SnapshotStore {
    cache: Arc<Cache>,
    scheduler: FlushScheduler,
}

impl SnapshotStore {
    /// Creates a store for the document at `path`, flushing `delay` after
    /// the last write.
    ///
    /// Nothing is read until the first [`read`](Self::read).
    ///
    /// # Errors
    ///
    /// Returns an error if the flush worker cannot be started.
    pub fn new(
        writer: DurableWriter,
        path: impl Into<PathBuf>,
        delay: Duration,
        stats: Arc<StoreStats>,
    ) -> CoreResult<Self> {
        let cache = Arc::new(Cache {
            state: Mutex::new(CacheState::default()),
            loading: Mutex::new(()),
            saving: Mutex::new(()),
            writer,
            path: path.into(),
            stats,
        });
        let scheduler = FlushScheduler::start(cache.clone(), delay)?;
        Ok(Self { cache, scheduler })
    }

    /// Returns an independent copy of the current document, loading it from
    /// disk on first access.
    ///
    /// # Errors
    ///
    /// Returns an error only if the first load fails for a reason other than
    /// corruption.
    pub fn read(&self) -> CoreResult<Document> {
        self.cache.read()
    }

    /// Replaces the cached document, marks it dirty and restarts the flush
    /// timer. Never touches disk.
    pub fn write(&self, doc: Document) {
        self.cache.install(doc);
        self.scheduler.schedule();
    }

    /// Returns true if the cache holds changes not yet on disk.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.cache.state.lock().dirty
    }

    /// Returns true if a debounced flush is waiting to fire.
    #[must_use]
    pub fn flush_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// Cancels the timer and flushes synchronously.
    ///
    /// # Errors
    ///
    /// Returns the save error; the cache stays dirty.
    pub fn flush_now(&self) -> CoreResult<FlushOutcome> {
        self.scheduler.cancel();
        self.cache.flush()
    }

    /// Stops the flush worker and performs the final flush.
    ///
    /// Later writes still reach the cache but are no longer flushed in the
    /// background.
    ///
    /// # Errors
    ///
    /// Returns the save error of the final flush.
    pub fn shutdown(&self) -> CoreResult<FlushOutcome> {
        self.scheduler.stop();
        self.cache.flush()
    }

    /// How the document was obtained on first load, if loaded.
    #[must_use]
    pub fn last_recovery(&self) -> Option<Recovery> {
        self.cache.state.lock().recovery.clone()
    }

    /// Path of the document file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.cache.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Field, Node};
    use lorestore_storage::{InMemoryBackend, RetryPolicy, StorageBackend};
    use std::io;
    use std::thread;

    const PATH: &str = "data.json";

    fn store(delay: Duration) -> (Arc<InMemoryBackend>, Arc<StoreStats>, SnapshotStore) {
        let backend = Arc::new(InMemoryBackend::new());
        let writer = DurableWriter::new(backend.clone(), RetryPolicy::no_retry());
        let stats = Arc::new(StoreStats::new());
        let store = SnapshotStore::new(writer, PATH, delay, stats.clone()).unwrap();
        (backend, stats, store)
    }

    fn doc_with(name: &str) -> Document {
        let mut doc = Document::new();
        doc.nodes
            .push(Node::new(name, vec![Field::text("名称", name)]));
        doc
    }

    fn on_disk(backend: &InMemoryBackend) -> Option<Document> {
        backend
            .get(Path::new(PATH))
            .map(|bytes| serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn first_read_creates_default_file() {
        let (backend, _, store) = store(Duration::from_secs(60));
        assert_eq!(store.read().unwrap(), Document::default());
        assert_eq!(store.last_recovery(), Some(Recovery::Created));
        assert_eq!(on_disk(&backend), Some(Document::default()));
        assert!(!store.is_dirty());
    }

    #[test]
    fn reads_are_independent_copies() {
        let (_, _, store) = store(Duration::from_secs(60));
        store.write(doc_with("a"));
        let mut copy = store.read().unwrap();
        copy.nodes.clear();
        assert_eq!(store.read().unwrap(), doc_with("a"));
    }

    #[test]
    fn write_only_touches_memory() {
        let (backend, _, store) = store(Duration::from_secs(60));
        store.read().unwrap();
        store.write(doc_with("a"));
        assert!(store.is_dirty());
        assert!(store.flush_pending());
        assert_eq!(on_disk(&backend), Some(Document::default()));
    }

    #[test]
    fn flush_now_persists_and_cleans() {
        let (backend, stats, store) = store(Duration::from_secs(60));
        store.write(doc_with("a"));
        assert_eq!(store.flush_now().unwrap(), FlushOutcome::Written);
        assert!(!store.is_dirty());
        assert!(!store.flush_pending());
        assert_eq!(on_disk(&backend), Some(doc_with("a")));
        assert_eq!(store.flush_now().unwrap(), FlushOutcome::Clean);
        let snap = stats.snapshot();
        assert_eq!(snap.flushes, 1);
        assert_eq!(snap.skipped_flushes, 1);
    }

    #[test]
    fn debounce_writes_final_document_once() {
        let (backend, stats, store) = store(Duration::from_millis(100));
        for i in 0..10 {
            store.write(doc_with(&format!("n{i}")));
        }
        thread::sleep(Duration::from_millis(600));
        assert_eq!(stats.snapshot().flushes, 1);
        assert_eq!(backend.rename_count(), 1);
        assert_eq!(on_disk(&backend), Some(doc_with("n9")));
    }

    #[test]
    fn failed_flush_restores_dirty() {
        let (backend, stats, store) = store(Duration::from_secs(60));
        store.write(doc_with("a"));
        backend.fail_next_renames(1, io::ErrorKind::Other);
        assert!(store.flush_now().is_err());
        assert!(store.is_dirty());
        assert_eq!(stats.snapshot().flush_failures, 1);

        assert_eq!(store.flush_now().unwrap(), FlushOutcome::Written);
        assert_eq!(on_disk(&backend), Some(doc_with("a")));
    }

    #[test]
    fn shutdown_flushes_pending_write() {
        let (backend, _, store) = store(Duration::from_secs(60));
        store.write(doc_with("a"));
        assert_eq!(store.shutdown().unwrap(), FlushOutcome::Written);
        assert_eq!(on_disk(&backend), Some(doc_with("a")));

        store.write(doc_with("b"));
        assert!(!store.flush_pending());
    }

    #[test]
    fn corrupt_file_is_salvaged_on_first_read() {
        let backend = Arc::new(InMemoryBackend::with_file(
            PATH,
            br#"{"nodes":[{"id":"x","fields":[]}]}garbage"#.to_vec(),
        ));
        let writer = DurableWriter::new(backend.clone(), RetryPolicy::no_retry());
        let stats = Arc::new(StoreStats::new());
        let store =
            SnapshotStore::new(writer, PATH, Duration::from_secs(60), stats.clone()).unwrap();

        let doc = store.read().unwrap();
        assert_eq!(doc.nodes[0].id, "x");
        assert!(store.last_recovery().unwrap().was_corrupt());
        assert_eq!(stats.snapshot().recoveries, 1);
        assert!(backend.exists(Path::new(PATH)));
    }
}
