//! Expiry values exchanged with the store.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_LOCK_TTL_SECONDS, MIN_LOCK_TTL_SECONDS};

/// Expiry attached to a write.
///
/// Whole-second lifetimes use second granularity; anything with a sub-second
/// part is written at millisecond granularity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expiry {
    /// Expire after this many seconds.
    Seconds(u64),
    /// Expire after this many milliseconds.
    Millis(u64),
}

impl Expiry {
    /// Maps a lifetime to a store expiry. Zero maps to `None` ("do not persist").
    pub fn from_duration(ttl: Duration) -> Option<Self> {
        if ttl.is_zero() {
            return None;
        }
        if ttl.subsec_nanos() == 0 {
            Some(Expiry::Seconds(ttl.as_secs()))
        } else {
            // Round up so a sub-millisecond lifetime never becomes zero.
            let millis = (ttl.as_nanos() + 999_999) / 1_000_000;
            Some(Expiry::Millis(u64::try_from(millis).unwrap_or(u64::MAX)))
        }
    }

    /// Lock lifetime bounded by the caller's wait budget: `ceil(max_wait)`, at least
    /// one second and at most [`MAX_LOCK_TTL_SECONDS`].
    pub fn for_lock(max_wait: Duration) -> Self {
        let mut secs = max_wait.as_secs();
        if max_wait.subsec_nanos() > 0 {
            secs = secs.saturating_add(1);
        }
        Expiry::Seconds(secs.clamp(MIN_LOCK_TTL_SECONDS, MAX_LOCK_TTL_SECONDS))
    }

    /// The lifetime as a `Duration`.
    pub fn as_duration(&self) -> Duration {
        match *self {
            Expiry::Seconds(s) => Duration::from_secs(s),
            Expiry::Millis(ms) => Duration::from_millis(ms),
        }
    }
}

/// Remaining lifetime of a stored key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyTtl {
    /// The key does not exist (or already expired).
    Missing,
    /// The key exists without an expiry.
    Persistent,
    /// The key expires after the given duration.
    Expires(Duration),
}

impl KeyTtl {
    /// Interprets a Redis-style `PTTL` reply: `-2` missing, `-1` persistent.
    pub fn from_pttl(reply: i64) -> Self {
        match reply {
            r if r >= 0 => KeyTtl::Expires(Duration::from_millis(r as u64)),
            -1 => KeyTtl::Persistent,
            _ => KeyTtl::Missing,
        }
    }

    /// Returns true unless the key is missing.
    pub fn exists(&self) -> bool {
        !matches!(self, KeyTtl::Missing)
    }

    /// Remaining lifetime, if the key expires.
    pub fn remaining(&self) -> Option<Duration> {
        match self {
            KeyTtl::Expires(d) => Some(*d),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(Duration::ZERO => None ; "zero does not persist")]
    #[test_case(Duration::from_secs(60) => Some(Expiry::Seconds(60)) ; "whole seconds")]
    #[test_case(Duration::from_secs_f64(1.5) => Some(Expiry::Millis(1500)) ; "fractional seconds")]
    #[test_case(Duration::from_micros(1) => Some(Expiry::Millis(1)) ; "rounds up")]
    fn test_from_duration(ttl: Duration) -> Option<Expiry> {
        Expiry::from_duration(ttl)
    }

    #[test_case(Duration::ZERO => Expiry::Seconds(1) ; "minimum one second")]
    #[test_case(Duration::from_millis(200) => Expiry::Seconds(1) ; "sub second")]
    #[test_case(Duration::from_secs(2) => Expiry::Seconds(2) ; "exact")]
    #[test_case(Duration::from_millis(2001) => Expiry::Seconds(3) ; "ceil")]
    #[test_case(Duration::MAX => Expiry::Seconds(MAX_LOCK_TTL_SECONDS) ; "capped")]
    fn test_for_lock(max_wait: Duration) -> Expiry {
        Expiry::for_lock(max_wait)
    }

    #[test]
    fn test_from_pttl() {
        assert_eq!(KeyTtl::from_pttl(-2), KeyTtl::Missing);
        assert_eq!(KeyTtl::from_pttl(-1), KeyTtl::Persistent);
        assert_eq!(
            KeyTtl::from_pttl(250).remaining(),
            Some(Duration::from_millis(250))
        );
        assert!(!KeyTtl::Missing.exists());
        assert!(KeyTtl::Persistent.exists());
    }
}
