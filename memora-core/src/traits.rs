//! Common traits for Memora.
//!
//! These traits define the seams between the memoizing wrapper and the things
//! it does not own: the backing key-value store, the payload codec, and the
//! wrapped function's argument type.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Arg, CacheEntry, CallArgs, Expiry, KeyTtl};

// ═══════════════════════════════════════════════════════════════════════════════
// STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Capability interface over a key-value store with expiry support.
///
/// Implementations might use:
/// - In-memory storage (for testing/development)
/// - Redis or any server with atomic conditional-set and expiry
///
/// Implementations report connection and protocol failures as
/// [`MemoraError::StoreUnavailable`](crate::MemoraError::StoreUnavailable);
/// callers decide whether that is fatal.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Reads a key. Expired keys read as absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Writes a key, replacing any previous value. `None` means no expiry.
    async fn set(&self, key: &str, value: &[u8], expiry: Option<Expiry>) -> Result<()>;

    /// Atomically writes a key only if it is absent.
    ///
    /// Returns true if this call created the key.
    async fn set_if_absent(&self, key: &str, value: &[u8], expiry: Expiry) -> Result<bool>;

    /// Deletes keys, returning how many existed.
    async fn delete(&self, keys: &[String]) -> Result<u64>;

    /// Remaining lifetime of a key.
    async fn ttl(&self, key: &str) -> Result<KeyTtl>;

    /// Lists keys matching a glob pattern (`*`, `?`, `[...]`, `\` escapes).
    async fn scan(&self, pattern: &str) -> Result<Vec<String>>;

    /// Checks that the store is reachable.
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    /// Backend name, for logs.
    fn name(&self) -> &'static str;
}

// ═══════════════════════════════════════════════════════════════════════════════
// CODEC TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Serializer/deserializer pair for stored entries.
///
/// Encoding failures should be reported as
/// [`MemoraError::Serialization`](crate::MemoraError::Serialization) and decoding
/// failures as [`MemoraError::Deserialization`](crate::MemoraError::Deserialization).
pub trait Codec<T>: Send + Sync {
    /// Encodes an entry to bytes.
    fn encode(&self, entry: &CacheEntry<T>) -> Result<Vec<u8>>;

    /// Decodes bytes read from the store.
    fn decode(&self, bytes: &[u8]) -> Result<CacheEntry<T>>;

    /// Codec name, for logs.
    fn name(&self) -> &'static str {
        "custom"
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ARGUMENT TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Converts a wrapped function's input into [`CallArgs`] for key derivation.
///
/// Implemented for `CallArgs` itself, `()`, common scalars, and tuples of up to
/// eight elements. Types with named fields can implement it to expose keyword
/// arguments.
pub trait CacheArgs {
    /// The positional and keyword view of these arguments.
    fn to_call_args(&self) -> CallArgs;
}

impl CacheArgs for CallArgs {
    fn to_call_args(&self) -> CallArgs {
        self.clone()
    }
}

impl CacheArgs for () {
    fn to_call_args(&self) -> CallArgs {
        CallArgs::new()
    }
}

macro_rules! impl_cache_args_for_scalar {
    ($($t:ty),*) => {
        $(
            impl CacheArgs for $t {
                fn to_call_args(&self) -> CallArgs {
                    CallArgs::positional(vec![Arg::from(self.clone())])
                }
            }
        )*
    };
}

impl_cache_args_for_scalar!(bool, i32, i64, u32, f64, String, Arg);

impl CacheArgs for &str {
    fn to_call_args(&self) -> CallArgs {
        CallArgs::positional(vec![Arg::from(*self)])
    }
}

macro_rules! impl_cache_args_for_tuple {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name),+> CacheArgs for ($($name,)+)
        where
            $($name: Clone + Into<Arg>),+
        {
            fn to_call_args(&self) -> CallArgs {
                CallArgs::positional(vec![$(self.$idx.clone().into()),+])
            }
        }
    };
}

impl_cache_args_for_tuple!(A: 0);
impl_cache_args_for_tuple!(A: 0, B: 1);
impl_cache_args_for_tuple!(A: 0, B: 1, C: 2);
impl_cache_args_for_tuple!(A: 0, B: 1, C: 2, D: 3);
impl_cache_args_for_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4);
impl_cache_args_for_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
impl_cache_args_for_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
impl_cache_args_for_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);
