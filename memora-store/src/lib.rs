//! # Memora Store
//!
//! Key-value store adapters implementing [`CacheStore`].
//!
//! This crate provides multiple storage backends:
//!
//! - **Memory**: concurrent in-process storage with lazy expiry, for
//!   development, testing, and single-process deployments
//! - **Redis** (feature `redis`): shared storage for multi-process and
//!   multi-instance deployments
//!
//! ## Example
//!
//! ```rust
//! use memora_core::{CacheStore, Expiry};
//! use memora_store::MemoryStore;
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new();
//! store.set("memora:ns:k", b"v", Some(Expiry::Seconds(60))).await?;
//! assert!(store.set_if_absent("memora:ns:k:lock", b"1", Expiry::Seconds(1)).await?);
//! assert!(!store.set_if_absent("memora:ns:k:lock", b"1", Expiry::Seconds(1)).await?);
//! # Ok::<(), memora_core::MemoraError>(())
//! # }).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod glob;
mod memory;
#[cfg(feature = "redis")]
mod redis_store;

pub use glob::glob_match;
pub use memory::{MemoryStore, StoreStats};
#[cfg(feature = "redis")]
pub use redis_store::{RedisStore, RedisStoreConfig};

// Re-export the trait from core
pub use memora_core::traits::CacheStore as Store;
pub use memora_core::CacheStore;
