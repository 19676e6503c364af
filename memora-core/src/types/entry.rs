//! Stored cache payloads.

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::arg::CallArgs;

/// The payload written under a storage key.
///
/// An entry is only usable when it decodes cleanly into this shape; anything
/// else read from the store counts as a miss.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// Wall-clock production time, seconds since the Unix epoch.
    pub timestamp: f64,
    /// The computation's result.
    pub value: T,
    /// Filtered arguments the value was produced from.
    pub parameters: CallArgs,
}

impl<T> CacheEntry<T> {
    /// Creates an entry stamped with the current time.
    pub fn new(value: T, parameters: CallArgs) -> Self {
        Self {
            timestamp: Self::current_timestamp(),
            value,
            parameters,
        }
    }

    /// Current Unix time with sub-second precision.
    pub fn current_timestamp() -> f64 {
        Utc::now().timestamp_micros() as f64 / 1_000_000.0
    }

    /// Time elapsed since the entry was produced. Clock skew reads as zero.
    pub fn age(&self) -> Duration {
        let elapsed = Self::current_timestamp() - self.timestamp;
        if elapsed.is_finite() && elapsed > 0.0 {
            Duration::from_secs_f64(elapsed)
        } else {
            Duration::ZERO
        }
    }

    /// Returns true if the entry is younger than `max_age`.
    pub fn is_fresher_than(&self, max_age: Duration) -> bool {
        self.age() < max_age
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Arg;

    #[test]
    fn test_new_entry_is_stamped_now() {
        let before = CacheEntry::<()>::current_timestamp();
        let entry = CacheEntry::new(3, CallArgs::new().arg(1).arg(2));
        let after = CacheEntry::<()>::current_timestamp();

        assert!(entry.timestamp >= before && entry.timestamp <= after);
        assert_eq!(entry.parameters.args, vec![Arg::Int(1), Arg::Int(2)]);
    }

    #[test]
    fn test_age_and_freshness() {
        let mut entry = CacheEntry::new("v", CallArgs::new());
        entry.timestamp -= 10.0;

        assert!(entry.age() >= Duration::from_secs(9));
        assert!(!entry.is_fresher_than(Duration::from_secs(5)));
        assert!(entry.is_fresher_than(Duration::from_secs(60)));
    }

    #[test]
    fn test_future_timestamp_has_zero_age() {
        let mut entry = CacheEntry::new(1u8, CallArgs::new());
        entry.timestamp += 100.0;
        assert_eq!(entry.age(), Duration::ZERO);
    }

    #[test]
    fn test_entry_without_value_field_is_rejected() {
        let raw = r#"{"timestamp": 1.5, "parameters": {"args": [], "kwargs": []}}"#;
        let decoded: Result<CacheEntry<i64>, _> = serde_json::from_str(raw);
        assert!(decoded.is_err());
    }

    #[test]
    fn test_entry_survives_binary_encoding() {
        let entry = CacheEntry::new(
            vec!["a".to_string()],
            CallArgs::new().arg(Arg::map([("k", Arg::bytes(vec![1, 2]))])),
        );
        let bytes = bincode::serialize(&entry).unwrap();
        let back: CacheEntry<Vec<String>> = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, entry);
    }
}
