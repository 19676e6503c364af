//! # Memora Core
//!
//! Core types, errors, and traits for the Memora distributed memoization layer.
//!
//! This crate provides the foundational building blocks used by all other Memora crates:
//!
//! - **Types**: the argument value model ([`Arg`], [`CallArgs`]), stored [`CacheEntry`] payloads,
//!   and store-facing expiry values ([`Expiry`], [`KeyTtl`])
//! - **Errors**: a single error taxonomy, [`MemoraError`]
//! - **Constants**: default prefix, lock marker, polling defaults
//! - **Traits**: the store capability interface and the codec/argument seams
//!
//! ## Example
//!
//! ```rust
//! use memora_core::{Arg, CallArgs};
//!
//! let call = CallArgs::new()
//!     .arg(1)
//!     .arg("two")
//!     .kwarg("flag", true);
//! assert_eq!(call.args.len(), 2);
//! assert_eq!(call.kwargs[0].1, Arg::Bool(true));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{BoxError, MemoraError, Result};
pub use traits::*;
pub use types::*;
