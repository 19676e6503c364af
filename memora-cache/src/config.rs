//! Per-function memoization settings.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use memora_core::constants::DEFAULT_CHECK_INTERVAL;
use memora_core::error::BoxError;
use memora_core::traits::Codec;
use memora_core::types::{Arg, CacheEntry, CallArgs};
use memora_keys::{default_deriver, KeyDeriver};

use crate::codec::JsonCodec;

/// Freshness predicate: receives the call's unfiltered arguments and the
/// cached entry, returns whether the entry may be served.
pub type Validator<T> =
    Arc<dyn Fn(&CallArgs, &CacheEntry<T>) -> Result<bool, BoxError> + Send + Sync>;

/// Configuration for one memoized function.
///
/// Built with `MemoConfig::new()` (or `default()`) and the `with_*` methods.
pub struct MemoConfig<T> {
    /// Positional indices excluded from the key
    pub ignore_positionals: Vec<usize>,
    /// Keyword names excluded from the key
    pub ignore_kw: Vec<String>,
    /// Optional freshness predicate
    pub validator: Option<Validator<T>>,
    /// Entry lifetime. `None` stores without expiry; zero disables storage.
    pub ttl: Option<Duration>,
    /// Entry codec
    pub codec: Arc<dyn Codec<T>>,
    /// Argument fingerprint function
    pub key_deriver: KeyDeriver,
    /// Namespace override
    pub namespace: Option<String>,
    /// Swallow validator and codec failures (recompute / skip storage)
    pub ignore_validation_error: bool,
    /// How long a caller waits for another caller's computation. Zero disables single-flight.
    pub max_wait: Duration,
    /// Pause between lock attempts
    pub check_interval: Duration,
    /// Fail with `LockTimeout` instead of computing without the lock
    pub strict_single_flight: bool,
}

impl<T> MemoConfig<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Default settings with the JSON codec.
    pub fn new() -> Self {
        Self::with_codec_arc(Arc::new(JsonCodec))
    }
}

impl<T> Default for MemoConfig<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> MemoConfig<T> {
    /// Default settings around an explicit codec. Needs no serde bounds on `T`.
    pub fn with_codec_arc(codec: Arc<dyn Codec<T>>) -> Self {
        Self {
            ignore_positionals: Vec::new(),
            ignore_kw: Vec::new(),
            validator: None,
            ttl: None,
            codec,
            key_deriver: default_deriver(),
            namespace: None,
            ignore_validation_error: true,
            max_wait: Duration::ZERO,
            check_interval: DEFAULT_CHECK_INTERVAL,
            strict_single_flight: false,
        }
    }

    /// Excludes positional arguments from the key.
    pub fn with_ignore_positionals(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.ignore_positionals.extend(indices);
        self
    }

    /// Excludes keyword arguments from the key.
    pub fn with_ignore_kw<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_kw.extend(names.into_iter().map(Into::into));
        self
    }

    /// Sets the freshness predicate.
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&CallArgs, &CacheEntry<T>) -> Result<bool, BoxError> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Sets the entry lifetime. `Duration::ZERO` means "do not persist".
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Sets the entry lifetime in (fractional) seconds. Non-positive values disable storage.
    pub fn with_ttl_secs(self, secs: f64) -> Self {
        let ttl = if secs > 0.0 {
            Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        };
        self.with_ttl(ttl)
    }

    /// Replaces the codec.
    pub fn with_codec<C>(mut self, codec: C) -> Self
    where
        C: Codec<T> + 'static,
    {
        self.codec = Arc::new(codec);
        self
    }

    /// Replaces the argument fingerprint function. It receives the filtered arguments.
    pub fn with_key_deriver<F>(mut self, deriver: F) -> Self
    where
        F: Fn(&[Arg], &[(String, Arg)]) -> String + Send + Sync + 'static,
    {
        self.key_deriver = Arc::new(deriver);
        self
    }

    /// Overrides the namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Controls whether validator and codec failures are swallowed (`true`) or returned.
    pub fn with_ignore_validation_error(mut self, ignore: bool) -> Self {
        self.ignore_validation_error = ignore;
        self
    }

    /// Enables single-flight with the given wait budget.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Sets the pause between lock attempts.
    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    /// Returns `LockTimeout` when the wait budget runs out instead of computing unlocked.
    pub fn with_strict_single_flight(mut self) -> Self {
        self.strict_single_flight = true;
        self
    }

    /// Returns true when calls coordinate through a lock.
    pub fn single_flight_enabled(&self) -> bool {
        !self.max_wait.is_zero()
    }

    /// Returns true when computed values should not be written.
    pub(crate) fn skips_storage(&self) -> bool {
        matches!(self.ttl, Some(ttl) if ttl.is_zero())
    }
}

impl<T> Clone for MemoConfig<T> {
    fn clone(&self) -> Self {
        Self {
            ignore_positionals: self.ignore_positionals.clone(),
            ignore_kw: self.ignore_kw.clone(),
            validator: self.validator.clone(),
            ttl: self.ttl,
            codec: self.codec.clone(),
            key_deriver: self.key_deriver.clone(),
            namespace: self.namespace.clone(),
            ignore_validation_error: self.ignore_validation_error,
            max_wait: self.max_wait,
            check_interval: self.check_interval,
            strict_single_flight: self.strict_single_flight,
        }
    }
}

impl<T> fmt::Debug for MemoConfig<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoConfig")
            .field("ignore_positionals", &self.ignore_positionals)
            .field("ignore_kw", &self.ignore_kw)
            .field("validator", &self.validator.is_some())
            .field("ttl", &self.ttl)
            .field("codec", &self.codec.name())
            .field("namespace", &self.namespace)
            .field("ignore_validation_error", &self.ignore_validation_error)
            .field("max_wait", &self.max_wait)
            .field("check_interval", &self.check_interval)
            .field("strict_single_flight", &self.strict_single_flight)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_defaults() {
        let config = MemoConfig::<i64>::new();
        assert!(config.ignore_validation_error);
        assert!(!config.single_flight_enabled());
        assert!(!config.strict_single_flight);
        assert_eq!(config.check_interval, Duration::from_millis(50));
        assert_eq!(config.ttl, None);
        assert_eq!(config.codec.name(), "json");
        assert!(!config.skips_storage());
    }

    #[test_case(1.5 => Some(Duration::from_millis(1500)) ; "fractional")]
    #[test_case(0.0 => Some(Duration::ZERO) ; "zero")]
    #[test_case(-3.0 => Some(Duration::ZERO) ; "negative")]
    fn test_ttl_secs(secs: f64) -> Option<Duration> {
        MemoConfig::<i64>::new().with_ttl_secs(secs).ttl
    }

    #[test]
    fn test_builder_chain() {
        let config = MemoConfig::<String>::new()
            .with_ignore_positionals([0])
            .with_ignore_kw(["debug"])
            .with_namespace("users")
            .with_max_wait(Duration::from_secs(2))
            .with_strict_single_flight()
            .with_ttl(Duration::ZERO);

        assert_eq!(config.ignore_positionals, vec![0]);
        assert_eq!(config.ignore_kw, vec!["debug".to_string()]);
        assert_eq!(config.namespace.as_deref(), Some("users"));
        assert!(config.single_flight_enabled());
        assert!(config.skips_storage());

        let debug = format!("{:?}", config.clone());
        assert!(debug.contains("users"));
    }
}
