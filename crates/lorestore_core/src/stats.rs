//! Store statistics.
//!
//! All counters are atomic and can be read while the store is in use.
//!
//! ```rust,ignore
//! let stats = store.stats();
//! println!("writes: {} flushes: {}", stats.writes, stats.flushes);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared by the store, its cache and its flush worker.
#[derive(Debug, Default)]
pub struct StoreStats {
    /// Documents installed into the cache.
    writes: AtomicU64,
    /// Flushes that reached disk.
    flushes: AtomicU64,
    /// Flushes skipped because the cache was clean.
    skipped_flushes: AtomicU64,
    /// Flushes that failed and left the cache dirty.
    flush_failures: AtomicU64,
    undos: AtomicU64,
    redos: AtomicU64,
    /// Loads that found corrupt bytes.
    recoveries: AtomicU64,
}

impl StoreStats {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_flush(&self) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_skipped_flush(&self) {
        self.skipped_flushes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_flush_failure(&self) {
        self.flush_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_undo(&self) {
        self.undos.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_redo(&self) {
        self.redos.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_recovery(&self) {
        self.recoveries.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time copy of every counter.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            writes: self.writes.load(Ordering::Relaxed),
            flushes: self.flushes.load(Ordering::Relaxed),
            skipped_flushes: self.skipped_flushes.load(Ordering::Relaxed),
            flush_failures: self.flush_failures.load(Ordering::Relaxed),
            undos: self.undos.load(Ordering::Relaxed),
            redos: self.redos.load(Ordering::Relaxed),
            recoveries: self.recoveries.load(Ordering::Relaxed),
        }
    }
}

/// Plain copy of [`StoreStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Documents installed into the cache.
    pub writes: u64,
    /// Flushes that reached disk.
    pub flushes: u64,
    /// Flushes skipped because the cache was clean.
    pub skipped_flushes: u64,
    /// Flushes that failed.
    pub flush_failures: u64,
    /// Successful undos.
    pub undos: u64,
    /// Successful redos.
    pub redos: u64,
    /// Loads that found corrupt bytes.
    pub recoveries: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let stats = StoreStats::new();
        stats.record_write();
        stats.record_write();
        stats.record_flush();
        stats.record_skipped_flush();
        stats.record_flush_failure();
        stats.record_undo();
        stats.record_redo();
        stats.record_recovery();
        assert_eq!(
            stats.snapshot(),
            StatsSnapshot {
                writes: 2,
                flushes: 1,
                skipped_flushes: 1,
                flush_failures: 1,
                undos: 1,
                redos: 1,
                recoveries: 1,
            }
        );
    }
}
