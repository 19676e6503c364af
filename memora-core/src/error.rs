//! Error types for Memora.
//!
//! This module provides the error hierarchy using `thiserror`. The memoizing
//! wrapper swallows most of these on its degraded paths; the ones that reach a
//! caller are the strict-mode validation, codec, and lock-timeout variants.

use thiserror::Error;

/// Result type alias using `MemoraError`.
pub type Result<T> = std::result::Result<T, MemoraError>;

/// Boxed error produced by caller-supplied callbacks (validators, codecs).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for all Memora operations.
#[derive(Debug, Error)]
pub enum MemoraError {
    // ═══════════════════════════════════════════════════════════════════════════
    // STORE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The backing store could not be reached or rejected the command.
    #[error("Cache store unavailable: {0}")]
    StoreUnavailable(String),

    /// The backing store answered with something the adapter cannot interpret.
    #[error("Unexpected store reply for '{key}': {reason}")]
    UnexpectedReply { key: String, reason: String },

    // ═══════════════════════════════════════════════════════════════════════════
    // PAYLOAD ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Encoding a cache entry failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Decoding a stored payload failed (corrupt or incompatible entry).
    #[error("Deserialization failed: {0}")]
    Deserialization(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ═══════════════════════════════════════════════════════════════════════════
    // MEMOIZATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// The freshness validator raised instead of answering.
    #[error("Cache validation failed: {0}")]
    Validation(BoxError),

    /// Strict single-flight gave up waiting for another caller's computation.
    #[error("Timed out after {waited_ms}ms waiting for lock on '{key}'")]
    LockTimeout { key: String, waited_ms: u64 },

    /// An argument could not be lifted into the key-derivation value model.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl MemoraError {
    /// Returns true if this error is recoverable (can retry).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MemoraError::StoreUnavailable(_) | MemoraError::LockTimeout { .. }
        )
    }

    /// Returns true if the error originated in the backing store.
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            MemoraError::StoreUnavailable(_) | MemoraError::UnexpectedReply { .. }
        )
    }

    /// Returns true if this is a payload encode/decode error.
    pub fn is_codec_error(&self) -> bool {
        matches!(
            self,
            MemoraError::Serialization(_)
                | MemoraError::Deserialization(_)
                | MemoraError::JsonError(_)
        )
    }

    /// Wraps any displayable store failure.
    pub fn store(err: impl std::fmt::Display) -> Self {
        MemoraError::StoreUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MemoraError::LockTimeout {
            key: "memora:ns:abc".into(),
            waited_ms: 1500,
        };
        assert!(err.to_string().contains("1500"));
        assert!(err.to_string().contains("memora:ns:abc"));
    }

    #[test]
    fn test_error_classification() {
        assert!(MemoraError::StoreUnavailable("down".into()).is_recoverable());
        assert!(MemoraError::StoreUnavailable("down".into()).is_store_error());
        assert!(!MemoraError::Serialization("bad".into()).is_recoverable());

        assert!(MemoraError::Deserialization("bad".into()).is_codec_error());
        assert!(!MemoraError::ConfigError("bad".into()).is_codec_error());
    }

    #[test]
    fn test_validation_wraps_callback_error() {
        let inner: BoxError = "stale upstream".into();
        let err = MemoraError::Validation(inner);
        assert_eq!(err.to_string(), "Cache validation failed: stale upstream");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_result: std::result::Result<serde_json::Value, _> =
            serde_json::from_str("invalid");
        let memora_result: Result<serde_json::Value> = json_result.map_err(MemoraError::from);
        assert!(matches!(memora_result, Err(MemoraError::JsonError(_))));
    }
}
