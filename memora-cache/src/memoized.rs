//! The memoized function.

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use tracing::debug;

use memora_core::error::{MemoraError, Result};
use memora_core::traits::CacheArgs;

use crate::control::CacheControl;
use crate::handle::{CacheHandle, Flight};
use crate::lock::release;
use crate::stats::{AtomicStats, MemoStats};

/// A function wrapped with caching, created by [`MemoCache::memoize`](crate::MemoCache::memoize).
///
/// `F` is any `Fn(A) -> Future<Output = Result<T, E>>`. The function's own
/// errors are returned unchanged and never cached. `E: From<MemoraError>`
/// receives the errors a call can raise itself: validator and codec failures
/// when `ignore_validation_error` is off, and `LockTimeout` in strict
/// single-flight mode.
pub struct Memoized<A, T, F> {
    handle: CacheHandle<T>,
    func: F,
    _args: PhantomData<fn(A)>,
}

impl<A, T, F> Memoized<A, T, F> {
    pub(crate) fn new(handle: CacheHandle<T>, func: F) -> Self {
        Self {
            handle,
            func,
            _args: PhantomData,
        }
    }

    /// The management handle for this function's namespace.
    pub fn handle(&self) -> &CacheHandle<T> {
        &self.handle
    }

    /// Call counters.
    pub fn stats(&self) -> MemoStats {
        self.handle.stats()
    }
}

impl<A, T, F> Memoized<A, T, F>
where
    A: CacheArgs,
    T: Send + Sync + 'static,
{
    /// Calls through the cache.
    pub async fn call<Fut, E>(&self, args: A) -> std::result::Result<T, E>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: From<MemoraError>,
    {
        let call = args.to_call_args();
        let key_args = self.handle.key_args(&call);
        let key = self.handle.key_for_filtered(&key_args);
        let counters = self.handle.counters();

        if let Some(value) = self.handle.lookup(&key, &call).await? {
            AtomicStats::bump(&counters.hits);
            debug!(key, "Cache hit");
            return Ok(value);
        }
        AtomicStats::bump(&counters.misses);
        debug!(key, "Cache miss");

        let lock = if self.handle.config().single_flight_enabled() {
            match self.handle.single_flight(&key, &call).await? {
                Flight::Cached(value) => {
                    debug!(key, "Served value computed by another caller");
                    return Ok(value);
                }
                Flight::Leader(guard) => Some(guard),
                Flight::Unlocked => None,
            }
        } else {
            None
        };

        AtomicStats::bump(&counters.computations);
        let value = match (self.func)(args).await {
            Ok(value) => value,
            Err(e) => {
                release(lock).await;
                return Err(e);
            }
        };

        let stored = self.handle.store_entry(&key, value, key_args).await;
        release(lock).await;
        stored.map_err(E::from)
    }

    /// Returns true if an entry exists for these arguments.
    pub async fn is_cached(&self, args: &A) -> bool {
        self.handle.is_cached(&args.to_call_args()).await
    }

    /// Returns true if a usable entry exists for these arguments.
    pub async fn has_valid_value(&self, args: &A) -> Result<bool> {
        self.handle.has_valid_value(&args.to_call_args()).await
    }

    /// Production time of the cached entry, seconds since the Unix epoch.
    pub async fn get_cached_timestamp(&self, args: &A) -> Option<f64> {
        self.handle.get_cached_timestamp(&args.to_call_args()).await
    }

    /// Deletes the entry for these arguments.
    pub async fn invalidate(&self, args: &A) -> u64 {
        self.handle.invalidate(&args.to_call_args()).await
    }

    /// Deletes every entry in this function's namespace.
    pub async fn invalidate_all(&self) -> u64 {
        self.handle.invalidate_all().await
    }

    /// The storage key a call with these arguments uses.
    pub fn cache_key_for(&self, args: &A) -> String {
        self.handle.cache_key_for(&args.to_call_args())
    }

    /// This function's namespace segment.
    pub fn namespace(&self) -> &str {
        self.handle.namespace()
    }

    /// The process-wide key prefix.
    pub fn prefix(&self) -> &str {
        self.handle.prefix()
    }
}

impl<A, T, F> fmt::Debug for Memoized<A, T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memoized")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}
