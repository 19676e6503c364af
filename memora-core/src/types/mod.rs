//! Domain types for Memora.
//!
//! - [`Arg`] / [`CallArgs`]: the argument value model used for key derivation
//! - [`CacheEntry`]: the payload stored for each memoized result
//! - [`Expiry`] / [`KeyTtl`]: lifetimes exchanged with the store

mod arg;
mod entry;
mod expiry;

pub use arg::*;
pub use entry::*;
pub use expiry::*;
