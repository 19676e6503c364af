//! # Memora Keys
//!
//! Deterministic cache-key derivation for the Memora memoization layer.
//!
//! This crate provides:
//!
//! - **Normalize**: a pure transform that re-sorts every unordered mapping
//! - **Fingerprint**: SHA-256 over the canonical form of the normalized arguments
//! - **Layout**: `{prefix}:{namespace}:{fingerprint}` storage keys, lock keys,
//!   and namespace scan patterns
//!
//! ## Properties
//!
//! - The same arguments always produce the same fingerprint
//! - Key insertion order inside a `Map` never affects the fingerprint
//! - Element order inside a `List` or `Tuple` always does
//!
//! ## Example
//!
//! ```rust
//! use memora_core::Arg;
//! use memora_keys::{derive_key, storage_key};
//!
//! let a = derive_key(&[Arg::map([("x", 1), ("y", 2)])], &[]);
//! let b = derive_key(&[Arg::map([("y", 2), ("x", 1)])], &[]);
//! assert_eq!(a, b);
//!
//! let key = storage_key("memora", "billing.quote", &a);
//! assert!(key.starts_with("memora:billing.quote:"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod fingerprint;
pub mod layout;
pub mod normalize;

// Re-export main functions at crate root
pub use fingerprint::{
    canonical_form, default_deriver, derive_call_key, derive_key, sha256_hex, KeyDeriver,
};
pub use layout::{
    default_namespace, escape_glob, in_namespace, lock_key, namespace_pattern,
    storage_key,
};
pub use normalize::{normalize, normalize_args, normalize_kwargs, sort_key};
