//! Constants shared across Memora crates.

use std::time::Duration;

// ═══════════════════════════════════════════════════════════════════════════════
// KEY LAYOUT
// ═══════════════════════════════════════════════════════════════════════════════

/// Default process-wide key prefix.
pub const DEFAULT_PREFIX: &str = "memora";

/// Separator between key path segments: `{prefix}:{namespace}:{fingerprint}`.
pub const KEY_SEPARATOR: char = ':';

/// Suffix appended to a storage key to form its lock key.
pub const LOCK_SUFFIX: &str = ":lock";

/// Value written under a lock key. Only presence matters.
pub const LOCK_VALUE: &[u8] = b"1";

// ═══════════════════════════════════════════════════════════════════════════════
// SINGLE-FLIGHT
// ═══════════════════════════════════════════════════════════════════════════════

/// Default pause between lock attempts while another caller computes.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_millis(50);

/// Lower bound on a lock's lifetime, in seconds.
pub const MIN_LOCK_TTL_SECONDS: u64 = 1;

/// Upper bound on a lock's lifetime, and on how long a caller waits for one.
pub const MAX_LOCK_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;

// ═══════════════════════════════════════════════════════════════════════════════
// STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// `COUNT` hint used for cursor-based key scans.
pub const DEFAULT_SCAN_COUNT: usize = 100;
