//! Per-function counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of one memoized function's activity.
///
/// Counters are observational; nothing in the call path reads them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoStats {
    /// Calls answered by the first lookup
    pub hits: u64,
    /// Calls that found no usable entry on the first lookup
    pub misses: u64,
    /// Times the wrapped function ran
    pub computations: u64,
    /// Entries written
    pub stores: u64,
    /// Store operations that failed and were degraded
    pub store_errors: u64,
    /// Locks this function acquired
    pub lock_acquired: u64,
    /// Waits that ran out of budget without the lock
    pub lock_timeouts: u64,
}

impl MemoStats {
    /// Fraction of calls answered from the store.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct AtomicStats {
    pub(crate) hits: AtomicU64,
    pub(crate) misses: AtomicU64,
    pub(crate) computations: AtomicU64,
    pub(crate) stores: AtomicU64,
    pub(crate) store_errors: AtomicU64,
    pub(crate) lock_acquired: AtomicU64,
    pub(crate) lock_timeouts: AtomicU64,
}

impl AtomicStats {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> MemoStats {
        MemoStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            computations: self.computations.load(Ordering::Relaxed),
            stores: self.stores.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
            lock_acquired: self.lock_acquired.load(Ordering::Relaxed),
            lock_timeouts: self.lock_timeouts.load(Ordering::Relaxed),
        }
    }
}
