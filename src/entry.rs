//! Expiring Cache Entry
//!
//! A [`CacheEntry`] pairs a cached value with the instant at which it stops
//! being valid. Entries live exclusively inside an
//! [`ExpiringCache`](crate::ExpiringCache), each behind its own small lock so
//! that renewing one key's TTL never needs the container-wide exclusive lock.
//!
//! # Memory Layout
//!
//! - `value: V` - User's value type
//! - `expires_at: Instant` - 12-16 bytes depending on platform
//! - `created_at: Instant` - 12-16 bytes depending on platform
//!
//! Callers never see an entry by reference; the cache hands out clones of the
//! value only.

use core::fmt;
use std::time::{Duration, Instant};

/// A cached value together with its expiry deadline.
///
/// The expiry is always set to `now + ttl` when the entry is created or
/// renewed.
///
/// # Examples
///
/// ```
/// use threaded_collections::entry::CacheEntry;
/// use std::time::Duration;
///
/// let entry = CacheEntry::new("session", Duration::from_secs(30));
/// assert_eq!(entry.value, "session");
/// assert!(!entry.is_expired());
/// ```
pub struct CacheEntry<V> {
    /// The cached value.
    pub value: V,

    /// Instant after which the entry is logically expired.
    expires_at: Instant,

    /// Instant the entry was first inserted. Renewals keep it.
    created_at: Instant,
}

impl<V> CacheEntry<V> {
    /// Creates an entry expiring `ttl` from now.
    #[inline]
    pub fn new(value: V, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            value,
            expires_at: deadline(now, ttl),
            created_at: now,
        }
    }

    /// Replaces the value and pushes the deadline to `now + ttl`.
    #[inline]
    pub fn renew(&mut self, value: V, ttl: Duration) {
        self.value = value;
        self.expires_at = deadline(Instant::now(), ttl);
    }

    /// Returns the instant after which the entry is logically expired.
    #[inline]
    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// Returns the instant the entry was created.
    #[inline]
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Returns `true` if the deadline lies strictly before `now`.
    ///
    /// The sweep captures `now` once per run and evaluates every entry
    /// against that single snapshot.
    #[inline]
    pub fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at < now
    }

    /// Returns `true` if the entry is expired right now.
    #[inline]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Time left until expiry, zero once expired.
    #[inline]
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

/// `now + ttl`, saturating far in the future when the addition overflows.
fn deadline(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl)
        // ~30 years is effectively "never" for an in-memory cache
        .or_else(|| now.checked_add(Duration::from_secs(60 * 60 * 24 * 365 * 30)))
        .unwrap_or(now)
}

impl<V: Clone> Clone for CacheEntry<V> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            expires_at: self.expires_at,
            created_at: self.created_at,
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for CacheEntry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("value", &self.value)
            .field("expires_at", &self.expires_at)
            .field("created_at", &self.created_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_new_entry() {
        let entry = CacheEntry::new(42, Duration::from_secs(10));
        assert_eq!(entry.value, 42);
        assert!(!entry.is_expired());
        assert!(entry.remaining() > Duration::from_secs(9));
        assert!(entry.expires_at() > entry.created_at());
    }

    #[test]
    fn test_zero_ttl_expires_strictly_after_deadline() {
        let entry = CacheEntry::new("v", Duration::ZERO);
        // Deadline equal to now is not yet expired.
        assert!(!entry.is_expired_at(entry.expires_at()));
        assert!(entry.is_expired_at(entry.expires_at() + Duration::from_nanos(1)));
    }

    #[test]
    fn test_renew_extends_deadline() {
        let mut entry = CacheEntry::new(1, Duration::from_millis(5));
        let first_deadline = entry.expires_at();
        let created = entry.created_at();
        thread::sleep(Duration::from_millis(10));
        assert!(entry.is_expired());

        entry.renew(2, Duration::from_secs(10));
        assert_eq!(entry.value, 2);
        assert!(entry.expires_at() > first_deadline);
        assert_eq!(entry.created_at(), created);
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_huge_ttl_does_not_overflow() {
        let entry = CacheEntry::new((), Duration::MAX);
        assert!(!entry.is_expired());
        assert!(entry.remaining() > Duration::from_secs(60 * 60 * 24 * 365));
    }

    #[test]
    fn test_debug_impl() {
        let entry = CacheEntry::new(7, Duration::from_secs(1));
        let debug_str = format!("{:?}", entry);
        assert!(debug_str.contains("CacheEntry"));
        assert!(debug_str.contains('7'));
    }
}
