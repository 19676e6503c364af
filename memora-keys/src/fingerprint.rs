//! Argument fingerprints.
//!
//! The fingerprint is the hex SHA-256 of the canonical form
//! `"{normalized_args}, {normalized_kwargs}"`:
//!
//! ```text
//! fingerprint = hex(SHA256(repr(Tuple(args)) || ", " || repr(Map(kwargs))))
//! ```

use std::sync::Arc;

use sha2::{Digest, Sha256};

use memora_core::{Arg, CallArgs};

use crate::normalize::{normalize_args, normalize_kwargs};

/// Pluggable fingerprint function. Receives the filtered arguments.
pub type KeyDeriver = Arc<dyn Fn(&[Arg], &[(String, Arg)]) -> String + Send + Sync>;

/// Lowercase hex SHA-256 of `input`.
pub fn sha256_hex(input: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    hex::encode(hasher.finalize())
}

/// The string that gets hashed: normalized args and kwargs, comma-joined.
pub fn canonical_form(args: &[Arg], kwargs: &[(String, Arg)]) -> String {
    format!(
        "{}, {}",
        normalize_args(args).repr(),
        normalize_kwargs(kwargs).repr()
    )
}

/// Derives the argument fingerprint.
///
/// # Example
///
/// ```rust
/// use memora_core::Arg;
/// use memora_keys::derive_key;
///
/// let key = derive_key(&[Arg::Int(1), Arg::Int(2)], &[]);
/// assert_eq!(key.len(), 64);
/// ```
pub fn derive_key(args: &[Arg], kwargs: &[(String, Arg)]) -> String {
    sha256_hex(canonical_form(args, kwargs).as_bytes())
}

/// Derives the fingerprint of a whole [`CallArgs`].
pub fn derive_call_key(call: &CallArgs) -> String {
    derive_key(&call.args, &call.kwargs)
}

/// The default [`KeyDeriver`], backed by [`derive_key`].
pub fn default_deriver() -> KeyDeriver {
    Arc::new(|args: &[Arg], kwargs: &[(String, Arg)]| derive_key(args, kwargs))
}
