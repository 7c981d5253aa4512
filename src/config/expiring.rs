//! Configuration for the expiring (TTL) cache.
//!
//! # Choosing a Sweep Interval
//!
//! Expired entries are physically removed by a background sweep. With the
//! default settings a plain `get` keeps returning an entry after its TTL has
//! run out until the next sweep removes it, so the effective lifetime of an
//! entry is somewhere in `[ttl, ttl + sweep_interval)`.
//!
//! ```text
//! insert          ttl elapses         next sweep
//!   │──────────────────│──────────────────│
//!   │   fresh reads    │   stale reads    │ NotFound
//! ```
//!
//! - **Short intervals** tighten that window at the cost of more frequent
//!   scans of the whole map.
//! - **`check_expiry_on_read`** closes the window entirely: reads treat an
//!   entry past its deadline as missing even before the sweep removes it.
//! - **`sweep_interval: None`** starts no background thread at all; call
//!   [`ExpiringCache::purge_expired`](crate::ExpiringCache::purge_expired)
//!   yourself.

use core::fmt;
use std::time::Duration;

/// Default time-to-live applied by `insert` when no TTL is given.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Default background sweep interval (1 Hz).
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration for an [`ExpiringCache`](crate::ExpiringCache).
///
/// # Fields
///
/// - `default_ttl`: TTL used by calls that don't pass their own.
/// - `sweep_interval`: Period of the background sweep. `None` disables it.
/// - `capacity`: Initial capacity of the backing map.
/// - `check_expiry_on_read`: Whether reads also reject logically expired
///   entries that the sweep has not removed yet.
///
/// # Examples
///
/// ```
/// use threaded_collections::config::ExpiringCacheConfig;
/// use std::time::Duration;
///
/// let config = ExpiringCacheConfig {
///     default_ttl: Duration::from_secs(5),
///     sweep_interval: None,
///     capacity: 1024,
///     check_expiry_on_read: true,
/// };
/// assert_eq!(config.capacity, 1024);
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ExpiringCacheConfig {
    /// TTL applied when the caller doesn't supply one.
    pub default_ttl: Duration,
    /// How often the background sweep runs; `None` means never.
    pub sweep_interval: Option<Duration>,
    /// Initial capacity of the backing map.
    pub capacity: usize,
    /// Reject logically expired entries on read instead of waiting for the sweep.
    pub check_expiry_on_read: bool,
}

impl Default for ExpiringCacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            sweep_interval: Some(DEFAULT_SWEEP_INTERVAL),
            capacity: 0,
            check_expiry_on_read: false,
        }
    }
}

impl fmt::Debug for ExpiringCacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringCacheConfig")
            .field("default_ttl", &self.default_ttl)
            .field("sweep_interval", &self.sweep_interval)
            .field("capacity", &self.capacity)
            .field("check_expiry_on_read", &self.check_expiry_on_read)
            .finish()
    }
}
