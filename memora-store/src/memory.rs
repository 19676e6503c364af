//! In-memory cache store.
//!
//! Fast, thread-safe storage suitable for development, testing,
//! and single-process deployments.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, instrument};

use memora_core::error::{MemoraError, Result};
use memora_core::traits::CacheStore;
use memora_core::types::{Expiry, KeyTtl};

use crate::glob::glob_match;

/// Stored value with optional deadline.
#[derive(Clone, Debug)]
struct StoredValue {
    data: Vec<u8>,
    expires_at: Option<Instant>,
}

impl StoredValue {
    fn new(data: &[u8], expiry: Option<Expiry>) -> Self {
        Self {
            data: data.to_vec(),
            // Lifetimes past what `Instant` can represent never expire.
            expires_at: expiry.and_then(|e| Instant::now().checked_add(e.as_duration())),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at
            .map(|deadline| Instant::now() >= deadline)
            .unwrap_or(false)
    }

    fn remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }
}

/// Operation counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// GET calls
    pub gets: u64,
    /// GET calls that found a live key
    pub hits: u64,
    /// SET calls
    pub sets: u64,
    /// SET-IF-ABSENT calls that created the key
    pub conditional_sets_won: u64,
    /// SET-IF-ABSENT calls that found the key held
    pub conditional_sets_lost: u64,
    /// Keys removed by DELETE
    pub deleted: u64,
    /// Expired keys dropped
    pub expired: u64,
}

/// In-memory implementation of [`CacheStore`].
///
/// Expiry is enforced lazily: expired keys read as absent and are dropped on
/// the next access, or in bulk by [`MemoryStore::purge_expired`].
///
/// # Thread Safety
///
/// All operations are thread-safe. `set_if_absent` holds the shard lock for
/// the key while it decides, so concurrent callers see exactly one winner.
#[derive(Debug)]
pub struct MemoryStore {
    /// key → value
    entries: DashMap<String, StoredValue>,
    /// When false, every operation fails as if the server were down
    available: AtomicBool,
    /// Operation statistics
    stats: RwLock<StoreStats>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            available: AtomicBool::new(true),
            stats: RwLock::new(StoreStats::default()),
        }
    }

    /// Simulates the store going down (`false`) or coming back (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Returns the current statistics.
    pub fn stats(&self) -> StoreStats {
        self.stats.read().clone()
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| !e.value().is_expired()).count()
    }

    /// Returns true if no live keys remain.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every key.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Drops expired keys, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, v| !v.is_expired());
        let purged = before.saturating_sub(self.entries.len());
        self.stats.write().expired += purged as u64;
        purged
    }

    /// Live keys, unordered.
    pub fn keys(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| !e.value().is_expired())
            .map(|e| e.key().clone())
            .collect()
    }

    fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(MemoraError::StoreUnavailable(
                "memory store marked unavailable".into(),
            ))
        }
    }

    /// Removes `key` if it has expired. Returns true if it did.
    fn evict_if_expired(&self, key: &str) -> bool {
        let evicted = self.entries.remove_if(key, |_, v| v.is_expired()).is_some();
        if evicted {
            self.stats.write().expired += 1;
        }
        evicted
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.check_available()?;
        self.evict_if_expired(key);

        let value = self.entries.get(key).map(|e| e.data.clone());
        let mut stats = self.stats.write();
        stats.gets += 1;
        if value.is_some() {
            stats.hits += 1;
        }
        Ok(value)
    }

    #[instrument(skip(self, value), fields(len = value.len()))]
    async fn set(&self, key: &str, value: &[u8], expiry: Option<Expiry>) -> Result<()> {
        self.check_available()?;
        self.entries
            .insert(key.to_string(), StoredValue::new(value, expiry));
        self.stats.write().sets += 1;
        Ok(())
    }

    #[instrument(skip(self, value))]
    async fn set_if_absent(&self, key: &str, value: &[u8], expiry: Expiry) -> Result<bool> {
        self.check_available()?;

        let won = match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut held) => {
                if held.get().is_expired() {
                    held.insert(StoredValue::new(value, Some(expiry)));
                    true
                } else {
                    false
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(StoredValue::new(value, Some(expiry)));
                true
            }
        };

        let mut stats = self.stats.write();
        if won {
            stats.conditional_sets_won += 1;
        } else {
            stats.conditional_sets_lost += 1;
        }
        debug!(key, won, "Conditional set");
        Ok(won)
    }

    #[instrument(skip(self), fields(count = keys.len()))]
    async fn delete(&self, keys: &[String]) -> Result<u64> {
        self.check_available()?;

        let mut removed = 0u64;
        for key in keys {
            if let Some((_, value)) = self.entries.remove(key) {
                if !value.is_expired() {
                    removed += 1;
                }
            }
        }
        self.stats.write().deleted += removed;
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn ttl(&self, key: &str) -> Result<KeyTtl> {
        self.check_available()?;
        self.evict_if_expired(key);

        Ok(match self.entries.get(key) {
            None => KeyTtl::Missing,
            Some(entry) => match entry.remaining() {
                None => KeyTtl::Persistent,
                Some(left) => KeyTtl::Expires(left),
            },
        })
    }

    #[instrument(skip(self))]
    async fn scan(&self, pattern: &str) -> Result<Vec<String>> {
        self.check_available()?;

        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|e| !e.value().is_expired() && glob_match(pattern, e.key()))
            .map(|e| e.key().clone())
            .collect();

        debug!(pattern, count = keys.len(), "Scanned keys");
        Ok(keys)
    }

    async fn ping(&self) -> Result<()> {
        self.check_available()
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
