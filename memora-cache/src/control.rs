//! Management interface attached to every memoized function.

use async_trait::async_trait;

use memora_core::error::Result;
use memora_core::types::CallArgs;

/// Inspect and invalidate one function's cached entries.
///
/// Arguments are given exactly as a call would receive them; ignored
/// parameters are filtered out the same way, so each method addresses the
/// entry that call would use.
///
/// Store failures degrade: `is_cached` reads as `false`, timestamps as `None`,
/// deletions as `0`.
#[async_trait]
pub trait CacheControl: Send + Sync {
    /// Returns true if an entry exists for these arguments.
    async fn is_cached(&self, args: &CallArgs) -> bool;

    /// Returns true if a decodable entry exists and passes the validator.
    ///
    /// Validator and decode failures follow the function's
    /// `ignore_validation_error` policy.
    async fn has_valid_value(&self, args: &CallArgs) -> Result<bool>;

    /// Production time of the cached entry, seconds since the Unix epoch.
    async fn get_cached_timestamp(&self, args: &CallArgs) -> Option<f64>;

    /// Deletes the entry for these arguments. Returns the number of keys removed.
    async fn invalidate(&self, args: &CallArgs) -> u64;

    /// Deletes every entry in this function's namespace. In-flight locks are kept.
    async fn invalidate_all(&self) -> u64;

    /// The exact storage key a call with these arguments reads and writes.
    fn cache_key_for(&self, args: &CallArgs) -> String;

    /// This function's namespace segment.
    fn namespace(&self) -> &str;

    /// The process-wide key prefix.
    fn prefix(&self) -> &str;
}
