//! # Memora Cache
//!
//! Distributed memoization over a [`CacheStore`](memora_core::CacheStore).
//!
//! A memoized function caches its result under
//! `{prefix}:{namespace}:{fingerprint}`, where the fingerprint is derived from
//! its (filtered) arguments. Concurrent callers with the same arguments can be
//! coalesced behind a store-side lock so the computation runs once, across
//! processes.
//!
//! Failure policy: store errors never reach the caller (reads become misses,
//! writes and deletes are skipped). Validator and codec errors degrade to
//! "recompute" unless `ignore_validation_error` is turned off. The wrapped
//! function's own errors always pass through unchanged and are never cached.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use memora_cache::{MemoCache, MemoConfig, MemoraError};
//! use memora_store::MemoryStore;
//!
//! # tokio_test::block_on(async {
//! let cache = MemoCache::new(Arc::new(MemoryStore::new()));
//!
//! let add = cache.memoize(
//!     MemoConfig::new()
//!         .with_namespace("math.add")
//!         .with_ttl(Duration::from_secs(60)),
//!     |(a, b): (i64, i64)| async move { Ok::<_, MemoraError>(a + b) },
//! );
//!
//! assert_eq!(add.call((1, 2)).await?, 3);
//! assert!(add.is_cached(&(1, 2)).await);
//! assert!(add.cache_key_for(&(1, 2)).starts_with("memora:math.add:"));
//! # Ok::<(), MemoraError>(())
//! # }).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod client;
mod codec;
mod config;
mod control;
mod handle;
mod lock;
mod memoized;
mod settings;
mod stats;


pub use client::MemoCache;
pub use codec::{BincodeCodec, JsonCodec};
pub use config::{MemoConfig, Validator};
pub use control::CacheControl;
pub use handle::CacheHandle;
pub use memoized::Memoized;
pub use settings::{CacheSettings, DEFAULT_REDIS_URL};
pub use stats::MemoStats;

// Re-export the types callers touch most
pub use memora_core::{Arg, BoxError, CacheArgs, CacheEntry, CallArgs, MemoraError};
