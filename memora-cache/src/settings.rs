//! Environment settings.

use std::time::Duration;

use memora_core::constants::DEFAULT_PREFIX;
use memora_core::error::{MemoraError, Result};

use crate::config::MemoConfig;

/// Default store URL.
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/";

/// Process-wide cache settings.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheSettings {
    /// Store URL (`REDIS_URL`)
    pub redis_url: String,
    /// Key prefix (`CACHE_PREFIX`)
    pub prefix: String,
    /// TTL applied to functions that set none (`CACHE_DEFAULT_TTL_SECONDS`)
    pub default_ttl: Option<Duration>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            redis_url: DEFAULT_REDIS_URL.into(),
            prefix: DEFAULT_PREFIX.into(),
            default_ttl: None,
        }
    }
}

impl CacheSettings {
    /// Reads settings from the environment, loading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads settings through `lookup`. Unset or empty variables take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let default_ttl = match var("CACHE_DEFAULT_TTL_SECONDS") {
            Some(raw) => Some(parse_ttl(&raw)?),
            None => None,
        };

        Ok(Self {
            redis_url: var("REDIS_URL").unwrap_or_else(|| DEFAULT_REDIS_URL.into()),
            prefix: var("CACHE_PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.into()),
            default_ttl,
        })
    }

    /// Fills in the default TTL if `config` has none.
    pub fn apply<T>(&self, mut config: MemoConfig<T>) -> MemoConfig<T> {
        if config.ttl.is_none() {
            config.ttl = self.default_ttl;
        }
        config
    }
}

fn parse_ttl(raw: &str) -> Result<Duration> {
    let secs: f64 = raw.trim().parse().map_err(|_| {
        MemoraError::ConfigError(format!("CACHE_DEFAULT_TTL_SECONDS is not a number: {raw:?}"))
    })?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(MemoraError::ConfigError(format!(
            "CACHE_DEFAULT_TTL_SECONDS must be a non-negative number, got {raw:?}"
        )));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| MemoraError::ConfigError(format!("CACHE_DEFAULT_TTL_SECONDS: {e}")))
}
