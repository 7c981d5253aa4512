//! Upgradable Reader/Writer Lock
//!
//! The cache, the dual-key map and the list all follow the same discipline:
//! look at the data under a shared lock and, only if a mutation turns out to
//! be necessary, promote that lock to exclusive *in place*, mutate, and drop
//! back to shared before releasing.
//!
//! ```text
//!   upgradable()          upgrade()            downgrade()
//!  ─────────────▶ [shared+intent] ─────────▶ [exclusive] ─────────▶ [shared+intent] ──▶ drop
//!                   readers: yes              readers: no             readers: yes
//!                   writers: no               writers: no             writers: no
//!                   upgraders: no             upgraders: no           upgraders: no
//! ```
//!
//! The "intent" part is what makes the promotion atomic: only one thread may
//! hold the upgradable state at a time, so no other upgrader or writer can
//! slip in between "discovered absent" and "inserted". Plain readers keep
//! running until the actual upgrade, which waits for them to drain.
//!
//! `parking_lot` provides the primitive state transitions; this module wraps
//! them into owned guard types so that the shared → exclusive → shared cycle
//! reads as a small state machine at the call sites.
//!
//! # Lock Ordering
//!
//! Containers that layer a per-entry lock inside the container lock (the
//! expiring cache) always take the container lock first. Never acquire a
//! container lock while holding one of its entry locks.

use core::fmt;
use core::ops::{Deref, DerefMut};
use parking_lot::{RwLock, RwLockReadGuard, RwLockUpgradableReadGuard, RwLockWriteGuard};

/// A reader/writer lock with atomic shared → exclusive promotion.
pub struct UpgradableRwLock<T> {
    inner: RwLock<T>,
}

impl<T> UpgradableRwLock<T> {
    /// Creates a new lock protecting `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: RwLock::new(value),
        }
    }

    /// Acquires a shared lock. Any number of readers may hold one at once,
    /// alongside at most one upgradable holder.
    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.read()
    }

    /// Attempts a shared lock without blocking.
    #[inline]
    pub fn try_read(&self) -> Option<RwLockReadGuard<'_, T>> {
        self.inner.try_read()
    }

    /// Acquires the exclusive lock.
    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.inner.write()
    }

    /// Attempts the exclusive lock without blocking.
    #[inline]
    pub fn try_write(&self) -> Option<RwLockWriteGuard<'_, T>> {
        self.inner.try_write()
    }

    /// Acquires a shared lock that carries the right to upgrade.
    ///
    /// Blocks while another thread holds the exclusive lock or the upgrade
    /// intent. Plain readers are not blocked.
    #[inline]
    pub fn upgradable(&self) -> UpgradableGuard<'_, T> {
        UpgradableGuard {
            guard: self.inner.upgradable_read(),
        }
    }

    /// Attempts to acquire the upgrade intent without blocking.
    #[inline]
    pub fn try_upgradable(&self) -> Option<UpgradableGuard<'_, T>> {
        self.inner
            .try_upgradable_read()
            .map(|guard| UpgradableGuard { guard })
    }

    /// Returns a mutable reference to the protected data. No locking is
    /// needed since `&mut self` proves exclusive access.
    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }

    /// Consumes the lock and returns the protected data.
    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

impl<T: Default> Default for UpgradableRwLock<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for UpgradableRwLock<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpgradableRwLock")
            .field("inner", &self.inner)
            .finish()
    }
}

/// Shared access plus the exclusive right to upgrade.
///
/// Produced by [`UpgradableRwLock::upgradable`].
#[must_use = "if unused the lock is released immediately"]
pub struct UpgradableGuard<'a, T> {
    guard: RwLockUpgradableReadGuard<'a, T>,
}

impl<'a, T> UpgradableGuard<'a, T> {
    /// Promotes to exclusive access without releasing the lock.
    ///
    /// Waits for current plain readers to leave. No other writer or upgrader
    /// can run between this guard's creation and the returned guard.
    pub fn upgrade(self) -> UpgradedGuard<'a, T> {
        UpgradedGuard {
            guard: RwLockUpgradableReadGuard::upgrade(self.guard),
        }
    }

    /// Upgrades, runs `f` with exclusive access, then downgrades back.
    ///
    /// If `f` panics the exclusive lock is released during unwinding.
    pub fn upgrade_with<R, F>(self, f: F) -> (Self, R)
    where
        F: FnOnce(&mut T) -> R,
    {
        let mut upgraded = self.upgrade();
        let out = f(&mut upgraded);
        (upgraded.downgrade(), out)
    }
}

impl<T> Deref for UpgradableGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T: fmt::Debug> fmt::Debug for UpgradableGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UpgradableGuard").field(&*self.guard).finish()
    }
}

/// Exclusive access obtained by upgrading an [`UpgradableGuard`].
#[must_use = "if unused the lock is released immediately"]
pub struct UpgradedGuard<'a, T> {
    guard: RwLockWriteGuard<'a, T>,
}

impl<'a, T> UpgradedGuard<'a, T> {
    /// Drops back to shared access while keeping the upgrade intent, so the
    /// state cannot be changed by another writer before the guard is released.
    pub fn downgrade(self) -> UpgradableGuard<'a, T> {
        UpgradableGuard {
            guard: RwLockWriteGuard::downgrade_to_upgradable(self.guard),
        }
    }
}

impl<T> Deref for UpgradedGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for UpgradedGuard<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T: fmt::Debug> fmt::Debug for UpgradedGuard<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UpgradedGuard").field(&*self.guard).finish()
    }
}
