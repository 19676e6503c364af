//! The store adapter instance shared by every memoized function.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info};

use memora_core::constants::DEFAULT_PREFIX;
use memora_core::error::{MemoraError, Result};
use memora_core::traits::{CacheArgs, CacheStore};
use memora_keys::default_namespace;

use crate::config::MemoConfig;
use crate::handle::CacheHandle;
use crate::memoized::Memoized;

/// Entry point: a store plus the process-wide key prefix.
///
/// Construct one at start-up and pass it (or clones of it) to whatever
/// memoizes functions. Clones share the store.
#[derive(Clone)]
pub struct MemoCache {
    store: Arc<dyn CacheStore>,
    prefix: Arc<str>,
}

impl MemoCache {
    /// Creates a cache with the default prefix.
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self::with_prefix(store, DEFAULT_PREFIX)
    }

    /// Creates a cache with a custom prefix.
    pub fn with_prefix(store: Arc<dyn CacheStore>, prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        info!(store = store.name(), prefix = %prefix, "Cache initialized");
        Self {
            store,
            prefix: Arc::from(prefix),
        }
    }

    /// The process-wide key prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Checks that the store is reachable.
    pub async fn ping(&self) -> Result<()> {
        self.store.ping().await
    }

    /// Wraps `func` with caching.
    ///
    /// Without an explicit namespace, the namespace is derived from `F`'s type
    /// path. Closures defined in the same function share that path, so give
    /// each of them a namespace.
    pub fn memoize<A, T, F, Fut, E>(&self, config: MemoConfig<T>, func: F) -> Memoized<A, T, F>
    where
        A: CacheArgs,
        F: Fn(A) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let namespace = config
            .namespace
            .clone()
            .unwrap_or_else(default_namespace::<F>);
        debug!(namespace = %namespace, codec = config.codec.name(), "Memoizing function");
        Memoized::new(self.handle_for(namespace, config), func)
    }

    /// A management-only handle for an existing namespace.
    ///
    /// Fails if `config` carries no namespace.
    pub fn handle<T>(&self, config: MemoConfig<T>) -> Result<CacheHandle<T>> {
        let namespace = config.namespace.clone().ok_or_else(|| {
            MemoraError::ConfigError("a management handle needs an explicit namespace".into())
        })?;
        Ok(self.handle_for(namespace, config))
    }

    fn handle_for<T>(&self, namespace: String, config: MemoConfig<T>) -> CacheHandle<T> {
        CacheHandle::new(self.store.clone(), self.prefix.clone(), namespace, config)
    }
}

impl fmt::Debug for MemoCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoCache")
            .field("store", &self.store.name())
            .field("prefix", &self.prefix)
            .finish()
    }
}
