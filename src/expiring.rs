//! Expiring Cache Implementation
//!
//! A key/value store where every entry carries its own expiry deadline and a
//! background sweep evicts entries whose deadline has passed.
//!
//! # How It Works
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                          ExpiringCache                               │
//! │                                                                      │
//! │  UpgradableRwLock<HashMap<K, Mutex<CacheEntry<V>>>>                  │
//! │        │                                                             │
//! │        ├── read ───────▶ get / contains_key / update (TTL touch)     │
//! │        │                   └─▶ entry Mutex for value + expiry        │
//! │        │                                                             │
//! │        ├── upgradable ─▶ insert / fill store / sweep scan            │
//! │        │                   └─▶ upgrade ─▶ insert/remove ─▶ downgrade │
//! │        │                                                             │
//! │        └── write ──────▶ remove / clear                              │
//! │                                                                      │
//! │  Mutex<HashMap<K, Arc<Flight<V>>>> ── fills in progress, by key      │
//! │  Sweeper thread ── every interval ──▶ purge_expired()                │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Two-Level Locking
//!
//! Each entry sits behind its own small `Mutex`. Replacing an existing
//! entry's value and TTL only needs the container's *shared* lock plus that
//! entry's mutex, so renewing different keys never contends on the
//! container lock. The container lock is always taken before an entry lock.
//!
//! ## Insert Without a Race Window
//!
//! A lookup that misses under the plain read lock retries under the
//! upgradable lock. Only one thread can hold the upgradable lock, so the
//! second lookup and the subsequent in-place upgrade happen with no other
//! inserter in between. Plain readers keep running until the upgrade itself.
//!
//! ## Single-Flight Fill
//!
//! [`ExpiringCache::get_or_insert_with`] registers an in-flight slot for a
//! missing key, then runs its producer with no container lock held. Other
//! fillers of the same key wait on that slot and receive the produced value,
//! so a missing key is produced once. Fills of different keys run in
//! parallel, and a producer may itself read or write the cache, including
//! filling other keys.
//!
//! The value is stored before the slot is released, and a caller checks the
//! cache while holding the slot table, so no caller can miss both. If a
//! fallible producer fails or panics, its caller alone sees the error and
//! nothing is inserted; the waiters wake up and one of them runs its own
//! producer.
//!
//! A producer that fills its own key waits on itself forever.
//!
//! ## Expiry Semantics
//!
//! By default expiry is enforced by the sweep: a read that happens after an
//! entry's deadline but before the next sweep still returns the value. Set
//! [`ExpiringCacheConfig::check_expiry_on_read`] to reject such reads.
//!
//! # Example
//!
//! ```rust
//! use threaded_collections::config::ExpiringCacheConfig;
//! use threaded_collections::{Error, ExpiringCache};
//! use std::time::Duration;
//!
//! let cache = ExpiringCache::init(ExpiringCacheConfig {
//!     default_ttl: Duration::from_secs(30),
//!     ..ExpiringCacheConfig::default()
//! });
//!
//! cache.insert("session-1".to_string(), 7u64);
//! assert_eq!(cache.get("session-1"), Ok(7));
//! assert_eq!(cache.get("session-2"), Err(Error::NotFound));
//!
//! let value = cache.get_or_insert_with("session-2".to_string(), Duration::from_secs(5), || 9);
//! assert_eq!(value, 9);
//! ```

mod flight;
mod sweeper;

use crate::config::ExpiringCacheConfig;
use crate::entry::CacheEntry;
use crate::error::{Error, Result};
use crate::lock::UpgradableRwLock;
use crate::metrics::{ContainerMetrics, ExpiringCacheMetrics};
use core::borrow::Borrow;
use core::convert::Infallible;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use self::flight::{Flight, FlightMap, Landing};
use self::sweeper::Sweeper;

#[cfg(feature = "hashbrown")]
use hashbrown::{DefaultHashBuilder, HashMap};

#[cfg(not(feature = "hashbrown"))]
use std::collections::{hash_map::RandomState as DefaultHashBuilder, HashMap};

type EntryMap<K, V, S> = HashMap<K, Mutex<CacheEntry<V>>, S>;

/// State shared between the cache handle and its sweep thread.
struct Shared<K, V, S> {
    map: UpgradableRwLock<EntryMap<K, V, S>>,
    sweeping: Mutex<()>,
    in_flight: Mutex<FlightMap<K, V>>,
    metrics: ExpiringCacheMetrics,
    /// Runs between the sweep's scan and its upgrade.
    #[cfg(test)]
    after_scan: Mutex<Option<fn(&EntryMap<K, V, S>)>>,
}

/// What a filler does after consulting the in-flight table.
enum Role<V> {
    Hit(V),
    Follow(Arc<Flight<V>>),
    Lead(Arc<Flight<V>>),
}

impl<K, V, S> Shared<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher,
{
    /// Runs one sweep. Returns `None` if another sweep holds the sweep lock.
    fn purge_expired(&self) -> Option<usize> {
        let Some(_sweeping) = self.sweeping.try_lock() else {
            self.metrics.skipped_sweeps.incr();
            tracing::trace!("sweep already in progress, skipping");
            return None;
        };

        let guard = self.map.upgradable();
        let now = Instant::now();
        let candidates: Vec<K> = guard
            .iter()
            .filter(|(_, entry)| entry.lock().is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        if candidates.is_empty() {
            self.metrics.sweeps.incr();
            tracing::trace!(len = guard.len(), "sweep found nothing to expire");
            return Some(0);
        }

        #[cfg(test)]
        {
            if let Some(hook) = *self.after_scan.lock() {
                hook(&*guard);
            }
        }

        let (guard, removed) = guard.upgrade_with(|map| {
            let mut removed = 0;
            for key in &candidates {
                // A renewal may have landed between the scan and the upgrade.
                let still_expired = map
                    .get_mut(key)
                    .map_or(false, |entry| entry.get_mut().is_expired_at(now));
                if still_expired {
                    map.remove(key);
                    removed += 1;
                }
            }
            removed
        });

        self.metrics.sweeps.incr();
        self.metrics.expirations.add(removed as u64);
        tracing::debug!(
            removed,
            renewed = candidates.len() - removed,
            remaining = guard.len(),
            "expired cache entries swept"
        );
        Some(removed)
    }
}

/// A thread-safe key/value cache with per-entry time-to-live.
///
/// # Type Parameters
///
/// - `K`: Key type. Must implement `Hash + Eq + Clone`.
/// - `V`: Value type. Reads return clones, so most operations need `V: Clone`.
/// - `S`: Hash builder type. Defaults to `DefaultHashBuilder`.
///
/// Dropping the cache stops and joins its sweep thread.
pub struct ExpiringCache<K, V, S = DefaultHashBuilder> {
    shared: Arc<Shared<K, V, S>>,
    default_ttl: Duration,
    check_expiry_on_read: bool,
    sweeper: Option<Sweeper>,
}

impl<K, V> ExpiringCache<K, V, DefaultHashBuilder>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Creates a cache with the given default TTL and a 1 Hz sweep.
    ///
    /// # Panics
    ///
    /// Panics if the sweep thread cannot be spawned. Use
    /// [`try_init`](Self::try_init) to handle that case.
    pub fn new(default_ttl: Duration) -> Self {
        Self::init(ExpiringCacheConfig {
            default_ttl,
            ..ExpiringCacheConfig::default()
        })
    }

    /// Creates a cache from a configuration.
    ///
    /// This is the **recommended** way to create an expiring cache.
    ///
    /// # Panics
    ///
    /// Panics if the sweep thread cannot be spawned.
    pub fn init(config: ExpiringCacheConfig) -> Self {
        Self::init_with_hasher(config, DefaultHashBuilder::default())
    }

    /// Creates a cache from a configuration, reporting a failure to spawn the
    /// sweep thread instead of panicking.
    pub fn try_init(config: ExpiringCacheConfig) -> io::Result<Self> {
        Self::try_init_with_hasher(config, DefaultHashBuilder::default())
    }
}

impl<K, V, S> ExpiringCache<K, V, S>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
    S: BuildHasher + Send + Sync + 'static,
{
    /// Creates a cache with a custom hash builder.
    ///
    /// # Panics
    ///
    /// Panics if the sweep thread cannot be spawned.
    pub fn init_with_hasher(config: ExpiringCacheConfig, hash_builder: S) -> Self {
        Self::try_init_with_hasher(config, hash_builder)
            .unwrap_or_else(|err| panic!("failed to spawn cache sweep thread: {err}"))
    }

    /// Creates a cache with a custom hash builder, reporting a failure to
    /// spawn the sweep thread.
    pub fn try_init_with_hasher(config: ExpiringCacheConfig, hash_builder: S) -> io::Result<Self> {
        let shared = Arc::new(Shared {
            map: UpgradableRwLock::new(HashMap::with_capacity_and_hasher(
                config.capacity,
                hash_builder,
            )),
            sweeping: Mutex::new(()),
            in_flight: Mutex::new(HashMap::new()),
            metrics: ExpiringCacheMetrics::default(),
            #[cfg(test)]
            after_scan: Mutex::new(None),
        });

        let sweeper = match config.sweep_interval {
            Some(interval) => {
                let sweep_shared = Arc::clone(&shared);
                Some(Sweeper::spawn(interval, move || {
                    sweep_shared.purge_expired();
                })?)
            }
            None => None,
        };

        Ok(Self {
            shared,
            default_ttl: config.default_ttl,
            check_expiry_on_read: config.check_expiry_on_read,
            sweeper,
        })
    }
}

impl<K, V, S> ExpiringCache<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher,
{
    /// Returns the TTL used by [`insert`](Self::insert).
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Returns the background sweep interval, if a sweep thread is running.
    pub fn sweep_interval(&self) -> Option<Duration> {
        self.sweeper.as_ref().map(Sweeper::interval)
    }

    /// Returns a clone of the entry's value unless the entry must be treated
    /// as missing.
    fn live_value(&self, entry: &Mutex<CacheEntry<V>>) -> Option<V>
    where
        V: Clone,
    {
        let entry = entry.lock();
        if self.check_expiry_on_read && entry.is_expired() {
            None
        } else {
            Some(entry.value.clone())
        }
    }

    /// Looks `key` up without touching the hit and miss counters.
    fn lookup(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let map = self.shared.map.read();
        map.get(key).and_then(|entry| self.live_value(entry))
    }

    fn record_lookup<T>(&self, found: Option<T>) -> Option<T> {
        if found.is_some() {
            self.shared.metrics.hits.incr();
        } else {
            self.shared.metrics.misses.incr();
        }
        found
    }

    /// Returns a clone of the value stored under `key`.
    ///
    /// Fails with [`Error::NotFound`] if the key is absent. An entry past its
    /// deadline that the sweep has not removed yet is still returned unless
    /// `check_expiry_on_read` is set.
    pub fn get<Q>(&self, key: &Q) -> Result<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        self.try_get(key).ok_or(Error::NotFound)
    }

    /// Like [`get`](Self::get) but returns `None` when absent.
    pub fn try_get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
        V: Clone,
    {
        let map = self.shared.map.read();
        let found = map.get(key).and_then(|entry| self.live_value(entry));
        self.record_lookup(found)
    }

    /// Inserts or overwrites `key` with the default TTL.
    pub fn insert(&self, key: K, value: V) {
        self.insert_with_ttl(key, value, self.default_ttl);
    }

    /// Inserts or overwrites `key`, setting its expiry to `now + ttl`.
    pub fn insert_with_ttl(&self, key: K, value: V, ttl: Duration) {
        {
            let map = self.shared.map.read();
            if let Some(entry) = map.get(&key) {
                entry.lock().renew(value, ttl);
                self.shared.metrics.renewals.incr();
                return;
            }
        }

        let guard = self.shared.map.upgradable();
        if let Some(entry) = guard.get(&key) {
            entry.lock().renew(value, ttl);
            self.shared.metrics.renewals.incr();
            return;
        }
        let (_guard, ()) = guard.upgrade_with(|map| {
            map.insert(key, Mutex::new(CacheEntry::new(value, ttl)));
        });
        self.shared.metrics.insertions.incr();
    }

    /// Replaces the value and TTL of an existing entry.
    ///
    /// Does nothing if `key` is absent; unlike [`insert`](Self::insert) this
    /// never creates an entry. Returns whether an entry was updated. Only the
    /// shared container lock and the entry's own lock are taken.
    pub fn update<Q>(&self, key: &Q, value: V, ttl: Duration) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let map = self.shared.map.read();
        match map.get(key) {
            Some(entry) => {
                entry.lock().renew(value, ttl);
                self.shared.metrics.renewals.incr();
                true
            }
            None => false,
        }
    }

    /// Returns the value under `key`, producing and storing it with `ttl` if
    /// it is missing.
    ///
    /// Concurrent calls for the same missing key invoke a producer once; the
    /// others wait and receive the produced value. No lock is held while
    /// `producer` runs, so it may use this cache for other keys. If `producer`
    /// panics nothing is inserted and a waiting caller takes over.
    pub fn get_or_insert_with<F>(&self, key: K, ttl: Duration, producer: F) -> V
    where
        V: Clone,
        F: FnOnce() -> V,
    {
        match self.try_get_or_insert_with(key, ttl, || Ok::<V, Infallible>(producer())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Fallible form of [`get_or_insert_with`](Self::get_or_insert_with).
    ///
    /// A producer error is returned unchanged and nothing is inserted.
    /// Callers that were waiting on the failed producer retry with their own.
    pub fn try_get_or_insert_with<F, E>(
        &self,
        key: K,
        ttl: Duration,
        producer: F,
    ) -> core::result::Result<V, E>
    where
        V: Clone,
        F: FnOnce() -> core::result::Result<V, E>,
    {
        if let Some(value) = self.lookup(&key) {
            self.shared.metrics.hits.incr();
            return Ok(value);
        }

        let flight = loop {
            match self.join_flight(&key) {
                Role::Hit(value) => {
                    self.shared.metrics.hits.incr();
                    return Ok(value);
                }
                Role::Follow(flight) => {
                    if let Some(value) = flight.wait() {
                        self.shared.metrics.hits.incr();
                        return Ok(value);
                    }
                    tracing::trace!("fill abandoned by its producer, retrying");
                }
                Role::Lead(flight) => break flight,
            }
        };
        self.shared.metrics.misses.incr();

        let mut landing = Landing::new(&self.shared.in_flight, &key, flight);
        self.shared.metrics.producer_calls.incr();
        let value = self.store_filled(&key, producer()?, ttl);
        landing.land(value.clone());
        Ok(value)
    }

    /// Finds the running fill for `key`, or registers one for the caller.
    ///
    /// The cache is checked under the in-flight table lock: a leader stores
    /// its value before unregistering, so a key with no flight that is still
    /// missing here really is missing.
    fn join_flight(&self, key: &K) -> Role<V>
    where
        V: Clone,
    {
        let mut in_flight = self.shared.in_flight.lock();
        if let Some(flight) = in_flight.get(key) {
            return Role::Follow(Arc::clone(flight));
        }
        if let Some(value) = self.lookup(key) {
            return Role::Hit(value);
        }
        let flight = Arc::new(Flight::new());
        in_flight.insert(key.clone(), Arc::clone(&flight));
        Role::Lead(flight)
    }

    /// Stores a produced value unless a live value was inserted while the
    /// producer ran. Returns whichever value the cache now holds.
    fn store_filled(&self, key: &K, value: V, ttl: Duration) -> V
    where
        V: Clone,
    {
        let guard = self.shared.map.upgradable();
        if let Some(existing) = guard.get(key).and_then(|entry| self.live_value(entry)) {
            return existing;
        }

        let stored = value.clone();
        let (_guard, ()) = guard.upgrade_with(|map| match map.get_mut(key) {
            // Only reachable with check_expiry_on_read: an expired leftover.
            Some(entry) => entry.get_mut().renew(stored, ttl),
            None => {
                map.insert(key.clone(), Mutex::new(CacheEntry::new(stored, ttl)));
            }
        });
        self.shared.metrics.insertions.incr();
        value
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.shared
            .map
            .write()
            .remove(key)
            .map(|entry| entry.into_inner().value)
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.shared.map.write().clear();
    }

    /// Returns `true` if `key` is present (and, with `check_expiry_on_read`,
    /// not yet expired).
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let map = self.shared.map.read();
        map.get(key)
            .map_or(false, |entry| !(self.check_expiry_on_read && entry.lock().is_expired()))
    }

    /// Returns the time left before `key` expires, or `None` if absent.
    ///
    /// With `check_expiry_on_read`, an expired entry counts as absent here
    /// too.
    pub fn remaining_ttl<Q>(&self, key: &Q) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let map = self.shared.map.read();
        let entry = map.get(key)?.lock();
        if self.check_expiry_on_read && entry.is_expired() {
            None
        } else {
            Some(entry.remaining())
        }
    }

    /// Returns the number of entries physically stored, including entries
    /// past their deadline that the sweep has not removed yet.
    pub fn len(&self) -> usize {
        self.shared.map.read().len()
    }

    /// Returns `true` if no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.shared.map.read().is_empty()
    }

    /// Calls `f` for every entry without copying the map.
    ///
    /// The shared container lock is held for the whole iteration and each
    /// entry's lock while `f` sees it, so `f` must not write to this cache.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        let map = self.shared.map.read();
        for (key, entry) in map.iter() {
            f(key, &entry.lock().value);
        }
    }

    /// Returns a copy of every key/value pair taken under one shared lock.
    pub fn snapshot(&self) -> Vec<(K, V)>
    where
        V: Clone,
    {
        let map = self.shared.map.read();
        map.iter()
            .map(|(key, entry)| (key.clone(), entry.lock().value.clone()))
            .collect()
    }

    /// Returns a copy of every key.
    pub fn keys(&self) -> Vec<K> {
        self.shared.map.read().keys().cloned().collect()
    }

    /// Returns a copy of every value.
    pub fn values(&self) -> Vec<V>
    where
        V: Clone,
    {
        let map = self.shared.map.read();
        map.values().map(|entry| entry.lock().value.clone()).collect()
    }

    /// Runs a sweep now, on the calling thread.
    ///
    /// Returns the number of entries removed, or `None` if a sweep was
    /// already running (the request is dropped, not queued).
    pub fn purge_expired(&self) -> Option<usize> {
        self.shared.purge_expired()
    }
}

impl<K, V, S> ContainerMetrics for ExpiringCache<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher,
{
    fn metrics(&self) -> BTreeMap<String, f64> {
        let mut metrics = self.shared.metrics.to_btreemap();
        metrics.insert("len".to_string(), self.len() as f64);
        metrics
    }

    fn container_name(&self) -> &'static str {
        self.shared.metrics.container_name()
    }
}

impl<K, V, S> fmt::Debug for ExpiringCache<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringCache")
            .field("len", &self.shared.map.read().len())
            .field("default_ttl", &self.default_ttl)
            .field("check_expiry_on_read", &self.check_expiry_on_read)
            .field("sweeper", &self.sweeper)
            .finish()
    }
}
