//! One namespace's view of the store.
//!
//! [`CacheHandle`] owns everything a memoized function needs except the
//! function itself: key layout, entry lookup and validation, the single-flight
//! lock loop, and entry writes. It also implements [`CacheControl`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, warn};

use memora_core::constants::MAX_LOCK_TTL_SECONDS;
use memora_core::error::{MemoraError, Result};
use memora_core::traits::CacheStore;
use memora_core::types::{CacheEntry, CallArgs, Expiry};
use memora_keys::{in_namespace, lock_key, namespace_pattern, storage_key};

use crate::config::MemoConfig;
use crate::control::CacheControl;
use crate::lock::LockGuard;
use crate::stats::{AtomicStats, MemoStats};

/// Outcome of waiting for the single-flight lock.
pub(crate) enum Flight<T> {
    /// Another caller stored a usable value meanwhile.
    Cached(T),
    /// This caller holds the lock and must compute.
    Leader(LockGuard),
    /// The wait budget ran out; compute without the lock.
    Unlocked,
}

/// Store access for one namespace under one configuration.
pub struct CacheHandle<T> {
    store: Arc<dyn CacheStore>,
    prefix: Arc<str>,
    namespace: String,
    config: MemoConfig<T>,
    stats: Arc<AtomicStats>,
}

impl<T> CacheHandle<T> {
    pub(crate) fn new(
        store: Arc<dyn CacheStore>,
        prefix: Arc<str>,
        namespace: String,
        config: MemoConfig<T>,
    ) -> Self {
        Self {
            store,
            prefix,
            namespace,
            config,
            stats: Arc::new(AtomicStats::default()),
        }
    }

    /// The configuration this handle was built with.
    pub fn config(&self) -> &MemoConfig<T> {
        &self.config
    }

    /// Counters for calls made through this handle and its clones.
    pub fn stats(&self) -> MemoStats {
        self.stats.snapshot()
    }

    pub(crate) fn counters(&self) -> &AtomicStats {
        &self.stats
    }

    /// Arguments with ignored positions and keywords removed.
    pub(crate) fn key_args(&self, call: &CallArgs) -> CallArgs {
        call.filtered(&self.config.ignore_positionals, &self.config.ignore_kw)
    }

    /// Storage key for already-filtered arguments.
    pub(crate) fn key_for_filtered(&self, key_args: &CallArgs) -> String {
        let fingerprint = (self.config.key_deriver)(&key_args.args, &key_args.kwargs);
        storage_key(&self.prefix, &self.namespace, &fingerprint)
    }

    /// Runs the validator, applying the error policy.
    fn is_valid(&self, call: &CallArgs, entry: &CacheEntry<T>) -> Result<bool> {
        let Some(validator) = &self.config.validator else {
            return Ok(true);
        };
        match validator(call, entry) {
            Ok(valid) => Ok(valid),
            Err(e) if self.config.ignore_validation_error => {
                debug!(
                    namespace = %self.namespace,
                    error = %e,
                    "Validator failed, treating entry as invalid"
                );
                Ok(false)
            }
            Err(e) => Err(MemoraError::Validation(e)),
        }
    }

    /// Reads and decodes an entry.
    ///
    /// Store failures read as absent. Decode failures read as absent unless
    /// validation errors are configured to propagate.
    async fn read_entry(&self, key: &str) -> Result<Option<CacheEntry<T>>> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(None),
            Err(e) => {
                AtomicStats::bump(&self.stats.store_errors);
                warn!(key, error = %e, "Cache read failed, treating as miss");
                return Ok(None);
            }
        };

        match self.config.codec.decode(&raw) {
            Ok(entry) => Ok(Some(entry)),
            Err(e) if self.config.ignore_validation_error => {
                debug!(
                    key,
                    codec = self.config.codec.name(),
                    error = %e,
                    "Undecodable entry, treating as miss"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Returns the cached value if it exists, decodes, and passes validation.
    pub(crate) async fn lookup(&self, key: &str, call: &CallArgs) -> Result<Option<T>> {
        let Some(entry) = self.read_entry(key).await? else {
            return Ok(None);
        };
        if self.is_valid(call, &entry)? {
            Ok(Some(entry.value))
        } else {
            debug!(key, "Cached entry rejected by validator");
            Ok(None)
        }
    }

    /// Waits for the lock guarding `key`, re-checking the entry between attempts.
    pub(crate) async fn single_flight(&self, key: &str, call: &CallArgs) -> Result<Flight<T>> {
        let lock = lock_key(key);
        let max_wait = self
            .config
            .max_wait
            .min(Duration::from_secs(MAX_LOCK_TTL_SECONDS));
        let expiry = Expiry::for_lock(max_wait);
        let deadline = Instant::now() + max_wait;

        loop {
            if let Some(value) = self.lookup(key, call).await? {
                return Ok(Flight::Cached(value));
            }

            if let Some(guard) = LockGuard::try_acquire(&self.store, &lock, expiry).await {
                // The previous holder may have stored and released between our
                // lookup and the lock attempt.
                return match self.lookup(key, call).await {
                    Ok(Some(value)) => {
                        guard.release().await;
                        Ok(Flight::Cached(value))
                    }
                    Ok(None) => {
                        AtomicStats::bump(&self.stats.lock_acquired);
                        Ok(Flight::Leader(guard))
                    }
                    Err(e) => {
                        guard.release().await;
                        Err(e)
                    }
                };
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }
            tokio::time::sleep(self.config.check_interval.min(deadline - now)).await;
        }

        if let Some(value) = self.lookup(key, call).await? {
            return Ok(Flight::Cached(value));
        }

        AtomicStats::bump(&self.stats.lock_timeouts);
        let waited_ms = u64::try_from(max_wait.as_millis()).unwrap_or(u64::MAX);
        if self.config.strict_single_flight {
            return Err(MemoraError::LockTimeout {
                key: lock,
                waited_ms,
            });
        }

        warn!(key, waited_ms, "Lock wait budget exhausted, computing without lock");
        Ok(Flight::Unlocked)
    }

    /// Writes a freshly computed value and hands it back.
    ///
    /// A zero TTL skips the write. Encode failures skip the write unless
    /// validation errors are configured to propagate. Store failures are logged.
    pub(crate) async fn store_entry(&self, key: &str, value: T, key_args: CallArgs) -> Result<T> {
        if self.config.skips_storage() {
            debug!(key, "Zero TTL, not persisting");
            return Ok(value);
        }

        let entry = CacheEntry::new(value, key_args);
        let bytes = match self.config.codec.encode(&entry) {
            Ok(bytes) => bytes,
            Err(e) if self.config.ignore_validation_error => {
                warn!(
                    key,
                    codec = self.config.codec.name(),
                    error = %e,
                    "Encode failed, skipping storage"
                );
                return Ok(entry.value);
            }
            Err(e) => return Err(e),
        };

        let expiry = self.config.ttl.and_then(Expiry::from_duration);
        match self.store.set(key, &bytes, expiry).await {
            Ok(()) => {
                AtomicStats::bump(&self.stats.stores);
                debug!(key, ?expiry, size = bytes.len(), "Stored entry");
            }
            Err(e) => {
                AtomicStats::bump(&self.stats.store_errors);
                warn!(key, error = %e, "Cache write failed");
            }
        }
        Ok(entry.value)
    }
}

impl<T> Clone for CacheHandle<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            prefix: self.prefix.clone(),
            namespace: self.namespace.clone(),
            config: self.config.clone(),
            stats: self.stats.clone(),
        }
    }
}

impl<T> fmt::Debug for CacheHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheHandle")
            .field("store", &self.store.name())
            .field("prefix", &self.prefix)
            .field("namespace", &self.namespace)
            .field("config", &self.config)
            .finish()
    }
}

#[async_trait]
impl<T> CacheControl for CacheHandle<T>
where
    T: Send + Sync + 'static,
{
    async fn is_cached(&self, args: &CallArgs) -> bool {
        let key = self.cache_key_for(args);
        match self.store.ttl(&key).await {
            Ok(ttl) => ttl.exists(),
            Err(e) => {
                AtomicStats::bump(&self.stats.store_errors);
                warn!(key = %key, error = %e, "TTL query failed");
                false
            }
        }
    }

    async fn has_valid_value(&self, args: &CallArgs) -> Result<bool> {
        let key = self.cache_key_for(args);
        Ok(self.lookup(&key, args).await?.is_some())
    }

    async fn get_cached_timestamp(&self, args: &CallArgs) -> Option<f64> {
        let key = self.cache_key_for(args);
        match self.read_entry(&key).await {
            Ok(entry) => entry.map(|e| e.timestamp),
            Err(_) => None,
        }
    }

    async fn invalidate(&self, args: &CallArgs) -> u64 {
        let key = self.cache_key_for(args);
        match self.store.delete(&[key.clone()]).await {
            Ok(removed) => removed,
            Err(e) => {
                AtomicStats::bump(&self.stats.store_errors);
                warn!(key = %key, error = %e, "Invalidate failed");
                0
            }
        }
    }

    async fn invalidate_all(&self) -> u64 {
        let pattern = namespace_pattern(&self.prefix, &self.namespace);
        let keys: Vec<String> = match self.store.scan(&pattern).await {
            Ok(keys) => keys
                .into_iter()
                .filter(|k| in_namespace(k, &self.prefix, &self.namespace))
                .collect(),
            Err(e) => {
                AtomicStats::bump(&self.stats.store_errors);
                warn!(pattern = %pattern, error = %e, "Namespace scan failed");
                return 0;
            }
        };
        if keys.is_empty() {
            return 0;
        }

        match self.store.delete(&keys).await {
            Ok(removed) => {
                debug!(namespace = %self.namespace, removed, "Invalidated namespace");
                removed
            }
            Err(e) => {
                AtomicStats::bump(&self.stats.store_errors);
                warn!(pattern = %pattern, error = %e, "Namespace delete failed");
                0
            }
        }
    }

    fn cache_key_for(&self, args: &CallArgs) -> String {
        self.key_for_filtered(&self.key_args(args))
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }
}
