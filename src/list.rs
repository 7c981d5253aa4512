//! Reader/Writer List Implementation
//!
//! An ordered, index-addressable sequence shared between threads. Reads run
//! in parallel under a shared lock; mutations take the exclusive lock.
//!
//! # Snapshot Iteration
//!
//! The list never hands out references into its storage. [`RwList::iter`],
//! [`RwList::snapshot`] and the `find_*` family copy what they need under the
//! shared lock and release it before returning, so a caller iterating the
//! result never blocks writers and never observes their changes:
//!
//! ```text
//!   thread A: iter() ──▶ [copy under read lock] ──▶ a, b, c ...... (stable)
//!   thread B:                     push(d) ──▶ [a, b, c, d]
//! ```
//!
//! # Check-Then-Act
//!
//! [`RwList::add_if_absent`] and [`RwList::remove_first_matching`] scan under
//! the upgradable lock and upgrade in place only when they actually need to
//! mutate. No other writer can run between the scan and the mutation, so two
//! racing `add_if_absent` calls for the same value cannot both append.
//!
//! # Example
//!
//! ```rust
//! use threaded_collections::{Error, RwList};
//!
//! let list = RwList::new();
//! list.add_if_absent("x").unwrap();
//! assert_eq!(list.add_if_absent("x"), Err(Error::AlreadyExists));
//!
//! list.push("y");
//! list.push("zz");
//! assert_eq!(list.find_all(|s| s.len() == 1), vec!["x", "y"]);
//! assert_eq!(list.remove_first_matching(|s| s.starts_with('z')), Ok("zz"));
//! ```

use crate::config::RwListConfig;
use crate::error::{Error, Result};
use crate::lock::UpgradableRwLock;
use core::fmt;

/// A thread-safe growable list with snapshot iteration.
pub struct RwList<T> {
    items: UpgradableRwLock<Vec<T>>,
}

impl<T> RwList<T> {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::init(RwListConfig::default())
    }

    /// Creates an empty list from a configuration.
    pub fn init(config: RwListConfig) -> Self {
        Self::from(Vec::with_capacity(config.capacity))
    }

    /// Creates an empty list with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::init(RwListConfig { capacity })
    }

    /// Appends `value` to the end.
    pub fn push(&self, value: T) {
        self.items.write().push(value);
    }

    /// Inserts `value` at `index`, shifting later elements right.
    pub fn insert(&self, index: usize, value: T) -> Result<()> {
        let mut items = self.items.write();
        let len = items.len();
        if index > len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        items.insert(index, value);
        Ok(())
    }

    /// Replaces the element at `index`, returning the previous one.
    pub fn set(&self, index: usize, value: T) -> Result<T> {
        let mut items = self.items.write();
        let len = items.len();
        items
            .get_mut(index)
            .map(|slot| core::mem::replace(slot, value))
            .ok_or(Error::IndexOutOfBounds { index, len })
    }

    /// Removes and returns the element at `index`.
    pub fn remove_at(&self, index: usize) -> Result<T> {
        let mut items = self.items.write();
        let len = items.len();
        if index >= len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        Ok(items.remove(index))
    }

    /// Removes and returns the first element matching `predicate`.
    ///
    /// Fails with [`Error::NotFound`] if nothing matches.
    pub fn remove_first_matching<P>(&self, mut predicate: P) -> Result<T>
    where
        P: FnMut(&T) -> bool,
    {
        let guard = self.items.upgradable();
        let index = guard
            .iter()
            .position(|item| predicate(item))
            .ok_or(Error::NotFound)?;
        let (_guard, removed) = guard.upgrade_with(|items| items.remove(index));
        Ok(removed)
    }

    /// Keeps only the elements matching `predicate`.
    pub fn retain<P>(&self, predicate: P)
    where
        P: FnMut(&T) -> bool,
    {
        self.items.write().retain(predicate);
    }

    /// Removes every element.
    pub fn clear(&self) {
        self.items.write().clear();
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Returns `true` if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    /// Calls `f` for every element in order without copying.
    ///
    /// The shared lock is held throughout; `f` must not write to this list.
    pub fn for_each<F>(&self, f: F)
    where
        F: FnMut(&T),
    {
        self.items.read().iter().for_each(f);
    }
}

impl<T: PartialEq> RwList<T> {
    /// Appends `value` unless an equal element is already present.
    ///
    /// The presence check and the append happen with no writer in between.
    pub fn add_if_absent(&self, value: T) -> Result<()> {
        let guard = self.items.upgradable();
        if guard.contains(&value) {
            return Err(Error::AlreadyExists);
        }
        let (_guard, ()) = guard.upgrade_with(|items| items.push(value));
        Ok(())
    }

    /// Removes the first element equal to `value`. Returns whether one was
    /// removed.
    pub fn remove(&self, value: &T) -> bool {
        self.remove_first_matching(|item| item == value).is_ok()
    }

    /// Returns `true` if an element equal to `value` is present.
    pub fn contains(&self, value: &T) -> bool {
        self.items.read().contains(value)
    }

    /// Returns the index of the first element equal to `value`.
    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.items.read().iter().position(|item| item == value)
    }
}

impl<T: Clone> RwList<T> {
    /// Returns a copy of the element at `index`.
    pub fn get(&self, index: usize) -> Option<T> {
        self.items.read().get(index).cloned()
    }

    /// Returns copies of every element matching `predicate`, in order.
    pub fn find_all<P>(&self, mut predicate: P) -> Vec<T>
    where
        P: FnMut(&T) -> bool,
    {
        self.items
            .read()
            .iter()
            .filter(|item| predicate(*item))
            .cloned()
            .collect()
    }

    /// Returns a copy of the first element matching `predicate`.
    pub fn find_first<P>(&self, mut predicate: P) -> Option<T>
    where
        P: FnMut(&T) -> bool,
    {
        self.items
            .read()
            .iter()
            .find(|item| predicate(*item))
            .cloned()
    }

    /// Returns a copy of the whole list.
    pub fn snapshot(&self) -> Vec<T> {
        self.items.read().clone()
    }

    /// Returns an iterator over a snapshot taken now.
    ///
    /// Later mutations of the list are not visible through the iterator.
    pub fn iter(&self) -> std::vec::IntoIter<T> {
        self.snapshot().into_iter()
    }
}

impl<T> Default for RwList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Vec<T>> for RwList<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            items: UpgradableRwLock::new(items),
        }
    }
}

impl<T> FromIterator<T> for RwList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl<T: Clone> IntoIterator for &RwList<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: fmt::Debug> fmt::Debug for RwList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.read().iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scoped_threadpool::Pool;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_positional_operations() {
        let list = RwList::from(vec![1, 2, 3]);
        assert_eq!(list.get(1), Some(2));
        assert_eq!(list.get(3), None);

        assert_eq!(list.set(0, 10), Ok(1));
        list.insert(3, 4).unwrap();
        list.insert(0, 0).unwrap();
        assert_eq!(list.snapshot(), vec![0, 10, 2, 3, 4]);

        assert_eq!(list.remove_at(1), Ok(10));
        assert_eq!(
            list.remove_at(9),
            Err(Error::IndexOutOfBounds { index: 9, len: 4 })
        );
        assert_eq!(
            list.insert(5, 0),
            Err(Error::IndexOutOfBounds { index: 5, len: 4 })
        );
        assert_eq!(
            list.set(4, 0),
            Err(Error::IndexOutOfBounds { index: 4, len: 4 })
        );
    }

    #[test]
    fn test_value_operations() {
        let list: RwList<&str> = ["a", "b", "a"].into_iter().collect();
        assert!(list.contains(&"b"));
        assert_eq!(list.index_of(&"a"), Some(0));
        assert_eq!(list.index_of(&"z"), None);

        assert!(list.remove(&"a"));
        assert_eq!(list.snapshot(), vec!["b", "a"]);
        assert!(!list.remove(&"z"));

        list.retain(|s| *s != "b");
        assert_eq!(list.snapshot(), vec!["a"]);

        list.clear();
        assert!(list.is_empty());
    }

    #[test]
    fn test_add_if_absent() {
        let list = RwList::with_capacity(2);
        assert_eq!(list.add_if_absent(1), Ok(()));
        assert_eq!(list.add_if_absent(1), Err(Error::AlreadyExists));
        assert_eq!(list.add_if_absent(2), Ok(()));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_find_and_remove_first_matching() {
        let list = RwList::from(vec![1, 4, 6, 7]);
        assert_eq!(list.find_all(|n| n % 2 == 0), vec![4, 6]);
        assert_eq!(list.find_first(|n| *n > 5), Some(6));
        assert_eq!(list.find_first(|n| *n > 50), None);

        assert_eq!(list.remove_first_matching(|n| n % 2 == 0), Ok(4));
        assert_eq!(list.remove_first_matching(|n| *n > 50), Err(Error::NotFound));
        assert_eq!(list.snapshot(), vec![1, 6, 7]);
    }

    #[test]
    fn test_iteration_is_over_a_snapshot() {
        let list = Arc::new(RwList::from(vec![1, 2, 3]));
        let iter = list.iter();

        let writer = {
            let list = Arc::clone(&list);
            thread::spawn(move || {
                list.push(4);
                list.remove_at(0).unwrap();
            })
        };
        writer.join().unwrap();

        assert_eq!(iter.collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!((&*list).into_iter().collect::<Vec<_>>(), vec![2, 3, 4]);
    }

    #[test]
    fn test_for_each_in_order() {
        let list = RwList::from(vec!["a", "b"]);
        let mut seen = Vec::new();
        list.for_each(|s| seen.push(*s));
        assert_eq!(seen, vec!["a", "b"]);
    }

    #[test]
    fn test_concurrent_add_if_absent_inserts_once() {
        let list = RwList::new();
        let successes = AtomicUsize::new(0);
        let mut pool = Pool::new(8);

        pool.scoped(|scope| {
            for _ in 0..8 {
                scope.execute(|| {
                    for value in 0..100 {
                        if list.add_if_absent(value).is_ok() {
                            successes.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                });
            }
        });

        assert_eq!(successes.load(Ordering::SeqCst), 100);
        assert_eq!(list.len(), 100);
    }

    #[test]
    fn test_debug_impl() {
        let list = RwList::from(vec![1, 2]);
        assert_eq!(format!("{:?}", list), "[1, 2]");
    }
}
