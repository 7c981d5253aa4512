//! Dual-Key Map Implementation
//!
//! A dictionary addressable by either of two keys, where every entry is the
//! triple `(key1, key2, value)` and the pairing between the two keys is a
//! bijection: each `key1` pairs with exactly one `key2` and vice versa.
//!
//! # How It Works
//!
//! Two hash maps are kept in lockstep, each storing the *other* key next to
//! the value:
//!
//! ```text
//!   by_key1: HashMap<K1, (K2, V)>        by_key2: HashMap<K2, (K1, V)>
//!   ┌──────┬───────────────┐             ┌──────┬───────────────┐
//!   │ "a"  │ (1, value_a)  │ ◀─────────▶ │  1   │ ("a", value_a)│
//!   │ "b"  │ (2, value_b)  │ ◀─────────▶ │  2   │ ("b", value_b)│
//!   └──────┴───────────────┘             └──────┴───────────────┘
//! ```
//!
//! Both maps sit behind one [`UpgradableRwLock`]. Every mutation touches both
//! maps under the same exclusive section, so no reader can observe one side
//! updated and the other not.
//!
//! # Insert Rules
//!
//! | `key1` present? | `key2` present? | Result |
//! |-----------------|-----------------|--------|
//! | no  | no  | new triple inserted |
//! | yes, paired with `key2` | yes | value replaced |
//! | yes, paired elsewhere | any | [`Error::InvariantViolation`], nothing changes |
//! | no  | yes | [`Error::InvariantViolation`], nothing changes |
//!
//! # Example
//!
//! ```rust
//! use threaded_collections::{DualKeyMap, Error};
//!
//! let users = DualKeyMap::new();
//! users.insert("alice".to_string(), 1001u32, "Alice Liddell").unwrap();
//!
//! assert_eq!(users.get_by_key1("alice"), Ok("Alice Liddell"));
//! assert_eq!(users.get_by_key2(&1001), Ok("Alice Liddell"));
//!
//! // 1001 is already paired with "alice"
//! assert!(matches!(
//!     users.insert("bob".to_string(), 1001, "Bob"),
//!     Err(Error::InvariantViolation(_))
//! ));
//! ```

use crate::config::DualKeyMapConfig;
use crate::error::{Error, Result};
use crate::lock::UpgradableRwLock;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};

#[cfg(feature = "hashbrown")]
use hashbrown::{DefaultHashBuilder, HashMap};

#[cfg(not(feature = "hashbrown"))]
use std::collections::{hash_map::RandomState as DefaultHashBuilder, HashMap};

struct Maps<K1, K2, V, S> {
    by_key1: HashMap<K1, (K2, V), S>,
    by_key2: HashMap<K2, (K1, V), S>,
}

impl<K1, K2, V, S> Maps<K1, K2, V, S>
where
    K1: Hash + Eq + Clone,
    K2: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher,
{
    /// Classifies an insert without mutating anything.
    fn check_insert(&self, key1: &K1, key2: &K2) -> Result<bool> {
        match (self.by_key1.get(key1), self.by_key2.get(key2)) {
            (None, None) => Ok(false),
            (Some((paired, _)), Some(_)) if paired == key2 => Ok(true),
            (Some(_), Some(_)) => Err(Error::InvariantViolation(
                "both keys are present but paired with other keys",
            )),
            (Some(_), None) => Err(Error::InvariantViolation(
                "key1 is already paired with a different key2",
            )),
            (None, Some(_)) => Err(Error::InvariantViolation(
                "key2 is already paired with a different key1",
            )),
        }
    }

    fn replace(&mut self, key1: &K1, key2: &K2, value: V) {
        if let Some(slot) = self.by_key2.get_mut(key2) {
            slot.1 = value.clone();
        }
        if let Some(slot) = self.by_key1.get_mut(key1) {
            slot.1 = value;
        }
    }
}

/// A thread-safe map addressable by either of two bijectively paired keys.
///
/// Reads return clones of the stored data.
pub struct DualKeyMap<K1, K2, V, S = DefaultHashBuilder> {
    maps: UpgradableRwLock<Maps<K1, K2, V, S>>,
}

impl<K1, K2, V> DualKeyMap<K1, K2, V, DefaultHashBuilder> {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    /// Creates an empty map with room for `capacity` triples.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::init(DualKeyMapConfig { capacity })
    }

    /// Creates an empty map from a configuration.
    pub fn init(config: DualKeyMapConfig) -> Self {
        Self::init_with_hasher(config, DefaultHashBuilder::default())
    }
}

impl<K1, K2, V, S: Clone> DualKeyMap<K1, K2, V, S> {
    /// Creates an empty map using `hash_builder` for both sides.
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::init_with_hasher(DualKeyMapConfig::default(), hash_builder)
    }

    /// Creates an empty map from a configuration and a custom hash builder.
    pub fn init_with_hasher(config: DualKeyMapConfig, hash_builder: S) -> Self {
        Self {
            maps: UpgradableRwLock::new(Maps {
                by_key1: HashMap::with_capacity_and_hasher(config.capacity, hash_builder.clone()),
                by_key2: HashMap::with_capacity_and_hasher(config.capacity, hash_builder),
            }),
        }
    }
}

impl<K1, K2, V, S> DualKeyMap<K1, K2, V, S>
where
    K1: Hash + Eq + Clone,
    K2: Hash + Eq + Clone,
    V: Clone,
    S: BuildHasher,
{
    /// Inserts the triple `(key1, key2, value)`.
    ///
    /// If exactly this pairing already exists the value is replaced. Any
    /// insert that would pair a key with a second partner fails with
    /// [`Error::InvariantViolation`] and leaves the map unchanged.
    pub fn insert(&self, key1: K1, key2: K2, value: V) -> Result<()> {
        let guard = self.maps.upgradable();
        let replace = guard.check_insert(&key1, &key2).map_err(|err| {
            tracing::debug!(%err, "rejected dual-key insert");
            err
        })?;

        let (_guard, ()) = guard.upgrade_with(|maps| {
            if replace {
                maps.replace(&key1, &key2, value);
            } else {
                maps.by_key2
                    .insert(key2.clone(), (key1.clone(), value.clone()));
                maps.by_key1.insert(key1, (key2, value));
            }
        });
        Ok(())
    }

    /// Returns a clone of the value stored under `key1`.
    pub fn get_by_key1<Q>(&self, key1: &Q) -> Result<V>
    where
        K1: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let maps = self.maps.read();
        maps.by_key1
            .get(key1)
            .map(|(_, value)| value.clone())
            .ok_or(Error::NotFound)
    }

    /// Returns a clone of the value stored under `key2`.
    pub fn get_by_key2<Q>(&self, key2: &Q) -> Result<V>
    where
        K2: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let maps = self.maps.read();
        maps.by_key2
            .get(key2)
            .map(|(_, value)| value.clone())
            .ok_or(Error::NotFound)
    }

    /// Replaces the value of the triple addressed by `key1`.
    pub fn set_by_key1<Q>(&self, key1: &Q, value: V) -> Result<()>
    where
        K1: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let mut maps = self.maps.write();
        let Maps { by_key1, by_key2 } = &mut *maps;
        let (key2, slot) = by_key1.get_mut(key1).ok_or(Error::NotFound)?;
        if let Some(other) = by_key2.get_mut(&*key2) {
            other.1 = value.clone();
        }
        *slot = value;
        Ok(())
    }

    /// Replaces the value of the triple addressed by `key2`.
    pub fn set_by_key2<Q>(&self, key2: &Q, value: V) -> Result<()>
    where
        K2: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let mut maps = self.maps.write();
        let Maps { by_key1, by_key2 } = &mut *maps;
        let (key1, slot) = by_key2.get_mut(key2).ok_or(Error::NotFound)?;
        if let Some(other) = by_key1.get_mut(&*key1) {
            other.1 = value.clone();
        }
        *slot = value;
        Ok(())
    }

    /// Removes the triple addressed by `key1`, returning its `key2` and value.
    pub fn remove_by_key1<Q>(&self, key1: &Q) -> Option<(K2, V)>
    where
        K1: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let mut maps = self.maps.write();
        let (key2, value) = maps.by_key1.remove(key1)?;
        maps.by_key2.remove(&key2);
        Some((key2, value))
    }

    /// Removes the triple addressed by `key2`, returning its `key1` and value.
    pub fn remove_by_key2<Q>(&self, key2: &Q) -> Option<(K1, V)>
    where
        K2: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let mut maps = self.maps.write();
        let (key1, value) = maps.by_key2.remove(key2)?;
        maps.by_key1.remove(&key1);
        Some((key1, value))
    }

    /// Removes the triple only if `key1` and `key2` are paired with each other.
    pub fn remove_pair(&self, key1: &K1, key2: &K2) -> Option<V> {
        let guard = self.maps.upgradable();
        match guard.by_key1.get(key1) {
            Some((paired, _)) if paired == key2 => {}
            _ => return None,
        }
        let (_guard, value) = guard.upgrade_with(|maps| {
            maps.by_key2.remove(key2);
            maps.by_key1.remove(key1).map(|(_, value)| value)
        });
        value
    }

    /// Returns `true` if `key1` is present.
    pub fn contains_key1<Q>(&self, key1: &Q) -> bool
    where
        K1: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.maps.read().by_key1.contains_key(key1)
    }

    /// Returns `true` if `key2` is present.
    pub fn contains_key2<Q>(&self, key2: &Q) -> bool
    where
        K2: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.maps.read().by_key2.contains_key(key2)
    }

    /// Returns the `key2` paired with `key1`.
    pub fn key2_for<Q>(&self, key1: &Q) -> Option<K2>
    where
        K1: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.maps.read().by_key1.get(key1).map(|(key2, _)| key2.clone())
    }

    /// Returns the `key1` paired with `key2`.
    pub fn key1_for<Q>(&self, key2: &Q) -> Option<K1>
    where
        K2: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.maps.read().by_key2.get(key2).map(|(key1, _)| key1.clone())
    }

    /// Returns a copy of the map indexed by `key1`.
    pub fn snapshot_by_key1(&self) -> std::collections::HashMap<K1, V> {
        let maps = self.maps.read();
        maps.by_key1
            .iter()
            .map(|(key1, (_, value))| (key1.clone(), value.clone()))
            .collect()
    }

    /// Returns a copy of the map indexed by `key2`.
    pub fn snapshot_by_key2(&self) -> std::collections::HashMap<K2, V> {
        let maps = self.maps.read();
        maps.by_key2
            .iter()
            .map(|(key2, (_, value))| (key2.clone(), value.clone()))
            .collect()
    }

    /// Returns every `(key1, key2, value)` triple.
    pub fn triples(&self) -> Vec<(K1, K2, V)> {
        let maps = self.maps.read();
        maps.by_key1
            .iter()
            .map(|(key1, (key2, value))| (key1.clone(), key2.clone(), value.clone()))
            .collect()
    }
}

impl<K1, K2, V, S> DualKeyMap<K1, K2, V, S> {
    /// Returns the number of triples.
    pub fn len(&self) -> usize {
        self.maps.read().by_key1.len()
    }

    /// Returns `true` if the map holds no triples.
    pub fn is_empty(&self) -> bool {
        self.maps.read().by_key1.is_empty()
    }

    /// Removes every triple.
    pub fn clear(&self) {
        let mut maps = self.maps.write();
        maps.by_key1.clear();
        maps.by_key2.clear();
    }
}

impl<K1, K2, V> Default for DualKeyMap<K1, K2, V, DefaultHashBuilder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K1, K2, V, S> fmt::Debug for DualKeyMap<K1, K2, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DualKeyMap")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn sample() -> DualKeyMap<String, u32, &'static str> {
        let map = DualKeyMap::new();
        map.insert("a".to_string(), 1, "first").unwrap();
        map.insert("b".to_string(), 2, "second").unwrap();
        map
    }

    fn assert_bijection(map: &DualKeyMap<String, u32, &'static str>) {
        let by1 = map.snapshot_by_key1();
        let by2 = map.snapshot_by_key2();
        assert_eq!(by1.len(), by2.len());
        for (key1, key2, value) in map.triples() {
            assert_eq!(map.key1_for(&key2), Some(key1.clone()));
            assert_eq!(by1[&key1], value);
            assert_eq!(by2[&key2], value);
        }
    }

    #[test]
    fn test_lookup_by_either_key() {
        let map = sample();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get_by_key1("a"), Ok("first"));
        assert_eq!(map.get_by_key2(&2), Ok("second"));
        assert_eq!(map.get_by_key1("z"), Err(Error::NotFound));
        assert_eq!(map.get_by_key2(&9), Err(Error::NotFound));
        assert_eq!(map.key2_for("a"), Some(1));
        assert_eq!(map.key1_for(&2), Some("b".to_string()));
        assert_bijection(&map);
    }

    #[test]
    fn test_same_pair_replaces_value() {
        let map = sample();
        map.insert("a".to_string(), 1, "updated").unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get_by_key1("a"), Ok("updated"));
        assert_eq!(map.get_by_key2(&1), Ok("updated"));
        assert_bijection(&map);
    }

    #[test]
    fn test_conflicting_inserts_rejected() {
        let map = sample();

        // key1 present, paired with another key2
        assert!(matches!(
            map.insert("a".to_string(), 7, "x"),
            Err(Error::InvariantViolation(_))
        ));
        // key2 present, key1 new
        assert!(matches!(
            map.insert("c".to_string(), 1, "x"),
            Err(Error::InvariantViolation(_))
        ));
        // both present but cross-paired
        assert!(matches!(
            map.insert("a".to_string(), 2, "x"),
            Err(Error::InvariantViolation(_))
        ));

        assert_eq!(map.len(), 2);
        assert_eq!(map.get_by_key1("a"), Ok("first"));
        assert_eq!(map.get_by_key2(&2), Ok("second"));
        assert_bijection(&map);
    }

    #[test]
    fn test_set_by_either_key() {
        let map = sample();
        map.set_by_key1("a", "via-1").unwrap();
        assert_eq!(map.get_by_key2(&1), Ok("via-1"));

        map.set_by_key2(&2, "via-2").unwrap();
        assert_eq!(map.get_by_key1("b"), Ok("via-2"));

        assert_eq!(map.set_by_key1("zz", "x"), Err(Error::NotFound));
        assert_eq!(map.set_by_key2(&99, "x"), Err(Error::NotFound));
        assert_bijection(&map);
    }

    #[test]
    fn test_remove_keeps_sides_consistent() {
        let map = sample();
        assert_eq!(map.remove_by_key1("a"), Some((1, "first")));
        assert!(!map.contains_key2(&1));
        assert_eq!(map.remove_by_key1("a"), None);

        assert_eq!(map.remove_by_key2(&2), Some(("b".to_string(), "second")));
        assert!(!map.contains_key1("b"));
        assert!(map.is_empty());
    }

    #[test]
    fn test_remove_pair_requires_pairing() {
        let map = sample();
        assert_eq!(map.remove_pair(&"a".to_string(), &2), None);
        assert_eq!(map.len(), 2);

        assert_eq!(map.remove_pair(&"a".to_string(), &1), Some("first"));
        assert_eq!(map.len(), 1);
        assert_bijection(&map);
    }

    #[test]
    fn test_clear() {
        let map = sample();
        map.clear();
        assert!(map.is_empty());
        assert!(map.snapshot_by_key2().is_empty());
    }

    #[test]
    fn test_concurrent_conflicting_inserts_keep_bijection() {
        let map: Arc<DualKeyMap<u32, u32, u32>> = Arc::new(DualKeyMap::with_capacity(64));

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let map = Arc::clone(&map);
                thread::spawn(move || {
                    for i in 0..100 {
                        let _ = map.insert(i % 50, (i + t) % 50, t);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let by1 = map.snapshot_by_key1();
        let by2 = map.snapshot_by_key2();
        assert_eq!(by1.len(), by2.len());
        for (key1, key2, _) in map.triples() {
            assert_eq!(map.key1_for(&key2), Some(key1));
            assert_eq!(map.key2_for(&key1), Some(key2));
        }
    }

    #[test]
    fn test_debug_impl() {
        let map = sample();
        let debug_str = format!("{:?}", map);
        assert!(debug_str.contains("DualKeyMap"));
        assert!(debug_str.contains("len: 2"));
    }
}
