//! Persistent (immutable) sorted map based on a left-leaning red-black tree.
//!
//! This module provides [`PersistentSortedMap`], an immutable ordered map
//! that uses structural sharing for efficient operations.
//!
//! # Overview
//!
//! - O(log N) get, insert, remove
//! - O(log N) rank (`index_of`) using subtree sizes
//! - O(log N) min/max and predecessor lookup
//! - O(log N + k) cursors and range queries where k is the number of results
//! - O(1) len and `is_empty`
//!
//! All operations return new maps without modifying the original. Only the
//! nodes on the modified path are copied; every other subtree is shared
//! between the old and the new version.
//!
//! # Examples
//!
//! ```rust
//! use llrb_collections::persistent::PersistentSortedMap;
//!
//! let map = PersistentSortedMap::new()
//!     .insert(3, "three")
//!     .insert(1, "one")
//!     .insert(2, "two");
//!
//! let keys: Vec<&i32> = map.keys().collect();
//! assert_eq!(keys, vec![&1, &2, &3]);
//! assert_eq!(map.index_of(&3), Some(2));
//!
//! let range: Vec<(&i32, &&str)> = map.range(2..).collect();
//! assert_eq!(range, vec![(&2, &"two"), (&3, &"three")]);
//! ```
//!
//! # Internal Structure
//!
//! The left-leaning red-black tree maintains the following invariants:
//! 1. The root is black, empty subtrees are black
//! 2. Red links lean left: no node has a red right child
//! 3. No red node has a red left child
//! 4. Every path from the root to an empty subtree has the same number of
//!    black nodes
//! 5. Every node caches the number of entries in its subtree
//!
//! [`PersistentSortedMap::check`] verifies all of them.

use super::iterator::{SortedMapIntoIterator, SortedMapIterator};
use super::node::{self, Link, Node, blacken, share, size};
use super::{InvariantViolation, verify};
use crate::comparator::{Comparator, NaturalOrder};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FromIterator;
use std::ops::{Bound, ControlFlow, RangeBounds};

/// A persistent (immutable) ordered map based on a left-leaning red-black
/// tree.
///
/// Entries are kept in the order defined by the map's [`Comparator`]. The
/// default comparator, [`NaturalOrder`], uses the key's [`Ord`]
/// implementation; [`with_comparator`](Self::with_comparator) accepts any
/// other total order, including plain closures.
///
/// Cloning a map is O(1): both clones share the same tree.
///
/// # Time Complexity
///
/// | Operation          | Complexity   |
/// |--------------------|--------------|
/// | `new`              | O(1)         |
/// | `get`              | O(log N)     |
/// | `insert`           | O(log N)     |
/// | `remove`           | O(log N)     |
/// | `index_of`         | O(log N)     |
/// | `min_key`/`max_key`| O(log N)     |
/// | `iter_from`        | O(log N)     |
/// | `range`            | O(log N + k) |
/// | `len`              | O(1)         |
///
/// # Examples
///
/// ```rust
/// use llrb_collections::persistent::PersistentSortedMap;
///
/// let first = PersistentSortedMap::new().insert(1, "a");
/// let second = first.insert(2, "b");
///
/// assert_eq!(first.get(&2), None);
/// assert_eq!(second.get(&2), Some(&"b"));
/// assert_eq!(first.get(&1), Some(&"a"));
/// ```
pub struct PersistentSortedMap<K, V, C = NaturalOrder> {
    comparator: C,
    root: Link<K, V>,
}

impl<K, V> PersistentSortedMap<K, V> {
    /// Creates a new empty map ordered by the keys' [`Ord`] implementation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use llrb_collections::persistent::PersistentSortedMap;
    ///
    /// let map: PersistentSortedMap<i32, String> = PersistentSortedMap::new();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }

    /// Creates a map containing a single entry.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use llrb_collections::persistent::PersistentSortedMap;
    ///
    /// let map = PersistentSortedMap::singleton(42, "answer");
    /// assert_eq!(map.len(), 1);
    /// assert_eq!(map.get(&42), Some(&"answer"));
    /// ```
    #[inline]
    #[must_use]
    pub fn singleton(key: K, value: V) -> Self
    where
        K: Clone + Ord,
        V: Clone,
    {
        Self::new().insert(key, value)
    }
}

impl<K, V, C> PersistentSortedMap<K, V, C> {
    /// Creates a new empty map ordered by `comparator`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use llrb_collections::persistent::PersistentSortedMap;
    ///
    /// let map = PersistentSortedMap::with_comparator(|left: &i32, right: &i32| right.cmp(left))
    ///     .insert(1, "one")
    ///     .insert(2, "two");
    ///
    /// assert_eq!(map.min_key(), Some(&2));
    /// ```
    #[inline]
    #[must_use]
    pub const fn with_comparator(comparator: C) -> Self {
        Self {
            comparator,
            root: None,
        }
    }

    /// Returns the comparator that orders this map.
    #[inline]
    pub const fn comparator(&self) -> &C {
        &self.comparator
    }

    /// Returns the number of entries in the map.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        size(&self.root)
    }

    /// Returns `true` if the map contains no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns `true` if both maps share the same tree.
    ///
    /// Maps that share a root are guaranteed to be equal; the converse does
    /// not hold.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use llrb_collections::persistent::PersistentSortedMap;
    ///
    /// let map = PersistentSortedMap::new().insert(1, "one");
    /// assert!(map.ptr_eq(&map.remove(&2)));
    /// assert!(!map.ptr_eq(&map.insert(2, "two")));
    /// ```
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (Some(left), Some(right)) => super::ReferenceCounter::ptr_eq(left, right),
            (None, None) => true,
            _ => false,
        }
    }

    /// Returns the entry with the smallest key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use llrb_collections::persistent::PersistentSortedMap;
    ///
    /// let map = PersistentSortedMap::new()
    ///     .insert(3, "three")
    ///     .insert(1, "one");
    ///
    /// assert_eq!(map.min(), Some((&1, &"one")));
    /// ```
    #[must_use]
    pub fn min(&self) -> Option<(&K, &V)> {
        let mut current = self.root.as_deref()?;
        while let Some(left) = current.left.as_deref() {
            current = left;
        }
        Some((&current.key, &current.value))
    }

    /// Returns the entry with the largest key.
    #[must_use]
    pub fn max(&self) -> Option<(&K, &V)> {
        let mut current = self.root.as_deref()?;
        while let Some(right) = current.right.as_deref() {
            current = right;
        }
        Some((&current.key, &current.value))
    }

    /// Returns the smallest key, or `None` if the map is empty.
    #[must_use]
    pub fn min_key(&self) -> Option<&K> {
        self.min().map(|(key, _)| key)
    }

    /// Returns the largest key, or `None` if the map is empty.
    #[must_use]
    pub fn max_key(&self) -> Option<&K> {
        self.max().map(|(key, _)| key)
    }

    /// Visits every entry in ascending key order.
    ///
    /// The walk stops as soon as `visit` returns [`ControlFlow::Break`], and
    /// the break value is handed back to the caller.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use llrb_collections::persistent::PersistentSortedMap;
    /// use std::ops::ControlFlow;
    ///
    /// let map: PersistentSortedMap<i32, i32> = (1..=10).map(|key| (key, key * key)).collect();
    ///
    /// let first_large = map.inorder_traversal(|key, square| {
    ///     if *square > 20 { ControlFlow::Break(*key) } else { ControlFlow::Continue(()) }
    /// });
    /// assert_eq!(first_large, ControlFlow::Break(5));
    /// ```
    pub fn inorder_traversal<B, F>(&self, mut visit: F) -> ControlFlow<B>
    where
        F: FnMut(&K, &V) -> ControlFlow<B>,
    {
        walk(&self.root, false, &mut visit)
    }

    /// Visits every entry in descending key order.
    ///
    /// Stops early on [`ControlFlow::Break`], like
    /// [`inorder_traversal`](Self::inorder_traversal).
    pub fn reverse_traversal<B, F>(&self, mut visit: F) -> ControlFlow<B>
    where
        F: FnMut(&K, &V) -> ControlFlow<B>,
    {
        walk(&self.root, true, &mut visit)
    }

    /// Returns an ascending cursor over all entries.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use llrb_collections::persistent::PersistentSortedMap;
    ///
    /// let map = PersistentSortedMap::new()
    ///     .insert(2, "two")
    ///     .insert(1, "one");
    ///
    /// let entries: Vec<(&i32, &&str)> = map.iter().collect();
    /// assert_eq!(entries, vec![(&1, &"one"), (&2, &"two")]);
    /// ```
    #[must_use]
    pub fn iter(&self) -> SortedMapIterator<'_, K, V> {
        SortedMapIterator::new(&self.root, false)
    }

    /// Returns a descending cursor over all entries.
    #[must_use]
    pub fn reverse_iter(&self) -> SortedMapIterator<'_, K, V> {
        SortedMapIterator::new(&self.root, true)
    }

    /// Returns an iterator over the keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over the values in ascending key order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    /// Verifies the red-black tree invariants and returns the black height.
    ///
    /// This walks the whole tree and is meant for tests and debugging.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    pub fn check(&self) -> Result<usize, InvariantViolation>
    where
        C: Comparator<K>,
    {
        verify::check(&self.root, &self.comparator).inspect_err(|violation| {
            tracing::debug!(%violation, len = self.len(), "sorted map failed its invariant check");
        })
    }

    /// Verifies the invariants and that the tree is no deeper than a
    /// red-black tree with this many entries may be.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    pub fn check_max_depth(&self) -> Result<(), InvariantViolation>
    where
        C: Comparator<K>,
    {
        verify::check_max_depth(&self.root, &self.comparator).inspect_err(|violation| {
            tracing::debug!(%violation, len = self.len(), "sorted map failed its depth check");
        })
    }

    fn find<Q>(&self, key: &Q) -> Option<&Node<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            match self.comparator.compare(key, node.key.borrow()) {
                Ordering::Less => current = node.left.as_deref(),
                Ordering::Greater => current = node.right.as_deref(),
                Ordering::Equal => return Some(node),
            }
        }
        None
    }

    /// Returns a reference to the value stored for `key`.
    ///
    /// The key may be any borrowed form of the map's key type, as long as the
    /// comparator can compare that form.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use llrb_collections::persistent::PersistentSortedMap;
    ///
    /// let map = PersistentSortedMap::new().insert("hello".to_string(), 42);
    ///
    /// assert_eq!(map.get("hello"), Some(&42));
    /// assert_eq!(map.get("world"), None);
    /// ```
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.find(key).map(|node| &node.value)
    }

    /// Returns the stored key and value for `key`.
    #[must_use]
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.find(key).map(|node| (&node.key, &node.value))
    }

    /// Returns `true` if the map contains a value for `key`.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.find(key).is_some()
    }

    /// Returns the position of `key` in ascending order, or `None` if the
    /// key is absent.
    ///
    /// The position equals the number of keys strictly smaller than `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use llrb_collections::persistent::PersistentSortedMap;
    ///
    /// let map: PersistentSortedMap<i32, ()> =
    ///     [5, 3, 8, 1, 4, 7, 9].into_iter().map(|key| (key, ())).collect();
    ///
    /// assert_eq!(map.index_of(&7), Some(4));
    /// assert_eq!(map.index_of(&6), None);
    /// ```
    #[must_use]
    pub fn index_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        let mut pruned = 0;
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            match self.comparator.compare(key, node.key.borrow()) {
                Ordering::Less => current = node.left.as_deref(),
                Ordering::Greater => {
                    pruned += size(&node.left) + 1;
                    current = node.right.as_deref();
                }
                Ordering::Equal => return Some(pruned + size(&node.left)),
            }
        }
        None
    }

    /// Returns the greatest key strictly smaller than `key`.
    ///
    /// Returns `None` if `key` is not in the map or is its smallest key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use llrb_collections::persistent::PersistentSortedMap;
    ///
    /// let map: PersistentSortedMap<i32, ()> = [1, 4, 9].into_iter().map(|key| (key, ())).collect();
    ///
    /// assert_eq!(map.predecessor_key(&9), Some(&4));
    /// assert_eq!(map.predecessor_key(&1), None);
    /// assert_eq!(map.predecessor_key(&5), None);
    /// ```
    #[must_use]
    pub fn predecessor_key<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        let mut right_parent: Option<&Node<K, V>> = None;
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            match self.comparator.compare(key, node.key.borrow()) {
                Ordering::Less => current = node.left.as_deref(),
                Ordering::Greater => {
                    right_parent = Some(node);
                    current = node.right.as_deref();
                }
                Ordering::Equal => {
                    let Some(mut predecessor) = node.left.as_deref() else {
                        return right_parent.map(|parent| &parent.key);
                    };
                    while let Some(right) = predecessor.right.as_deref() {
                        predecessor = right;
                    }
                    return Some(&predecessor.key);
                }
            }
        }
        None
    }

    /// Returns an ascending cursor starting at the smallest key `>= key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use llrb_collections::persistent::PersistentSortedMap;
    ///
    /// let map: PersistentSortedMap<i32, ()> = [10, 20, 30].into_iter().map(|key| (key, ())).collect();
    ///
    /// let keys: Vec<&i32> = map.iter_from(&15).map(|(key, _)| key).collect();
    /// assert_eq!(keys, vec![&20, &30]);
    /// ```
    #[must_use]
    pub fn iter_from<Q>(&self, key: &Q) -> SortedMapIterator<'_, K, V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        SortedMapIterator::starting_at(&self.root, key, &self.comparator, false)
    }

    /// Returns a descending cursor starting at the largest key `<= key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use llrb_collections::persistent::PersistentSortedMap;
    ///
    /// let map: PersistentSortedMap<i32, ()> = [10, 20, 30].into_iter().map(|key| (key, ())).collect();
    ///
    /// let keys: Vec<&i32> = map.reverse_iter_from(&25).map(|(key, _)| key).collect();
    /// assert_eq!(keys, vec![&20, &10]);
    /// ```
    #[must_use]
    pub fn reverse_iter_from<Q>(&self, key: &Q) -> SortedMapIterator<'_, K, V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        SortedMapIterator::starting_at(&self.root, key, &self.comparator, true)
    }

    /// Returns an ascending cursor over the entries whose keys fall within
    /// `range`.
    ///
    /// A range whose start lies after its end is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use llrb_collections::persistent::PersistentSortedMap;
    ///
    /// let map: PersistentSortedMap<i32, ()> = (1..=10).map(|key| (key, ())).collect();
    ///
    /// let keys: Vec<&i32> = map.range(3..6).map(|(key, _)| key).collect();
    /// assert_eq!(keys, vec![&3, &4, &5]);
    ///
    /// let keys: Vec<&i32> = map.range(8..).map(|(key, _)| key).collect();
    /// assert_eq!(keys, vec![&8, &9, &10]);
    /// ```
    #[must_use]
    pub fn range<Q, R>(&self, range: R) -> SortedMapIterator<'_, K, V>
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
        R: RangeBounds<Q>,
    {
        let start = match range.start_bound() {
            Bound::Included(key) => self.count_below(key, false),
            Bound::Excluded(key) => self.count_below(key, true),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(key) => self.count_below(key, true),
            Bound::Excluded(key) => self.count_below(key, false),
            Bound::Unbounded => self.len(),
        };
        SortedMapIterator::at_position(&self.root, start).limit(end.saturating_sub(start))
    }

    /// Counts the keys smaller than `key`, or not greater when
    /// `include_equal` is set.
    fn count_below<Q>(&self, key: &Q, include_equal: bool) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        let mut count = 0;
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            match self.comparator.compare(key, node.key.borrow()) {
                Ordering::Less => current = node.left.as_deref(),
                Ordering::Greater => {
                    count += size(&node.left) + 1;
                    current = node.right.as_deref();
                }
                Ordering::Equal => {
                    return count + size(&node.left) + usize::from(include_equal);
                }
            }
        }
        count
    }
}

impl<K: Clone, V: Clone, C: Comparator<K> + Clone> PersistentSortedMap<K, V, C> {
    /// Inserts a key-value pair and returns the new map.
    ///
    /// If the key is already present its value is replaced; the stored key
    /// is kept. The original map is left untouched.
    ///
    /// # Complexity
    ///
    /// O(log N) time, O(log N) newly allocated nodes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use llrb_collections::persistent::PersistentSortedMap;
    ///
    /// let map1 = PersistentSortedMap::new().insert(1, "one");
    /// let map2 = map1.insert(1, "ONE");
    ///
    /// assert_eq!(map1.get(&1), Some(&"one"));
    /// assert_eq!(map2.get(&1), Some(&"ONE"));
    /// ```
    #[must_use]
    pub fn insert(&self, key: K, value: V) -> Self {
        let (root, _) = node::insert(&self.root, key, value, &self.comparator);
        Self {
            comparator: self.comparator.clone(),
            root: Some(blacken(share(root))),
        }
    }

    /// Removes `key` and returns the new map.
    ///
    /// Removing an absent key returns a map sharing this map's tree.
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use llrb_collections::persistent::PersistentSortedMap;
    ///
    /// let map = PersistentSortedMap::new()
    ///     .insert(1, "one")
    ///     .insert(2, "two");
    /// let removed = map.remove(&1);
    ///
    /// assert_eq!(map.len(), 2);
    /// assert_eq!(removed.len(), 1);
    /// assert_eq!(removed.get(&1), None);
    /// ```
    #[must_use]
    pub fn remove<Q>(&self, key: &Q) -> Self
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        let Some(root) = self.root.as_ref().filter(|_| self.contains_key(key)) else {
            tracing::trace!(len = self.len(), "remove of an absent key leaves the map unchanged");
            return self.clone();
        };
        Self {
            comparator: self.comparator.clone(),
            root: node::remove_from_root(root, key, &self.comparator),
        }
    }
}

fn walk<K, V, B, F>(link: &Link<K, V>, reverse: bool, visit: &mut F) -> ControlFlow<B>
where
    F: FnMut(&K, &V) -> ControlFlow<B>,
{
    if let Some(node) = link {
        let (first, last) = if reverse {
            (&node.right, &node.left)
        } else {
            (&node.left, &node.right)
        };
        walk(first, reverse, visit)?;
        visit(&node.key, &node.value)?;
        walk(last, reverse, visit)?;
    }
    ControlFlow::Continue(())
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V, C: Clone> Clone for PersistentSortedMap<K, V, C> {
    fn clone(&self) -> Self {
        Self {
            comparator: self.comparator.clone(),
            root: self.root.clone(),
        }
    }
}

impl<K, V, C: Default> Default for PersistentSortedMap<K, V, C> {
    #[inline]
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<K, V, C> FromIterator<(K, V)> for PersistentSortedMap<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Comparator<K> + Clone + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::default(), |map, (key, value)| map.insert(key, value))
    }
}

impl<K: Clone, V: Clone, C> IntoIterator for PersistentSortedMap<K, V, C> {
    type Item = (K, V);
    type IntoIter = SortedMapIntoIterator<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        SortedMapIntoIterator::new(self.root, false)
    }
}

impl<'a, K, V, C> IntoIterator for &'a PersistentSortedMap<K, V, C> {
    type Item = (&'a K, &'a V);
    type IntoIter = SortedMapIterator<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: PartialEq, V: PartialEq, C> PartialEq for PersistentSortedMap<K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq, C> Eq for PersistentSortedMap<K, V, C> {}

/// Hashes the length, then every entry in iteration order.
impl<K: Hash, V: Hash, C> Hash for PersistentSortedMap<K, V, C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for (key, value) in self {
            key.hash(state);
            value.hash(state);
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, C> fmt::Debug for PersistentSortedMap<K, V, C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

impl<K: fmt::Display, V: fmt::Display, C> fmt::Display for PersistentSortedMap<K, V, C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{{")?;
        let mut first = true;
        for (key, value) in self {
            if first {
                first = false;
            } else {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{key}: {value}")?;
        }
        write!(formatter, "}}")
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<K, V, C> serde::Serialize for PersistentSortedMap<K, V, C>
where
    K: serde::Serialize,
    V: serde::Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(feature = "serde")]
struct PersistentSortedMapVisitor<K, V, C> {
    marker: std::marker::PhantomData<fn() -> PersistentSortedMap<K, V, C>>,
}

#[cfg(feature = "serde")]
impl<'de, K, V, C> serde::de::Visitor<'de> for PersistentSortedMapVisitor<K, V, C>
where
    K: serde::Deserialize<'de> + Clone,
    V: serde::Deserialize<'de> + Clone,
    C: Comparator<K> + Clone + Default,
{
    type Value = PersistentSortedMap<K, V, C>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let mut map = PersistentSortedMap::default();
        while let Some((key, value)) = access.next_entry()? {
            map = map.insert(key, value);
        }
        Ok(map)
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V, C> serde::Deserialize<'de> for PersistentSortedMap<K, V, C>
where
    K: serde::Deserialize<'de> + Clone,
    V: serde::Deserialize<'de> + Clone,
    C: Comparator<K> + Clone + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(PersistentSortedMapVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

// Maps can only cross threads when nodes are shared through `Arc`
#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(PersistentSortedMap<i32, String>: Send, Sync);
#[cfg(not(feature = "arc"))]
static_assertions::assert_not_impl_any!(PersistentSortedMap<i32, String>: Send, Sync);

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::Reversed;
    use rstest::{fixture, rstest};

    #[fixture]
    fn scenario_map() -> PersistentSortedMap<i32, String> {
        [5, 3, 8, 1, 4, 7, 9]
            .into_iter()
            .map(|key| (key, format!("v{key}")))
            .collect()
    }

    // =========================================================================
    // Display Tests
    // =========================================================================

    #[rstest]
    fn test_display_empty() {
        let map: PersistentSortedMap<i32, String> = PersistentSortedMap::new();
        assert_eq!(format!("{map}"), "{}");
    }

    #[rstest]
    fn test_display_sorted() {
        let map = PersistentSortedMap::new()
            .insert(3, "three".to_string())
            .insert(1, "one".to_string())
            .insert(2, "two".to_string());
        assert_eq!(format!("{map}"), "{1: one, 2: two, 3: three}");
    }

    #[rstest]
    fn test_debug_uses_map_notation() {
        let map = PersistentSortedMap::new().insert(1, "one");
        assert_eq!(format!("{map:?}"), r#"{1: "one"}"#);
    }

    // =========================================================================
    // Core Operations
    // =========================================================================

    #[rstest]
    fn test_scenario_order_rank_and_bounds(scenario_map: PersistentSortedMap<i32, String>) {
        let keys: Vec<i32> = scenario_map.keys().copied().collect();
        assert_eq!(keys, vec![1, 3, 4, 5, 7, 8, 9]);
        assert_eq!(scenario_map.index_of(&7), Some(4));
        assert_eq!(scenario_map.min_key(), Some(&1));
        assert_eq!(scenario_map.max_key(), Some(&9));
        // Seven entries form a perfect tree of black nodes
        assert_eq!(scenario_map.check(), Ok(3));
        assert_eq!(scenario_map.check_max_depth(), Ok(()));
    }

    #[rstest]
    fn test_insert_keeps_stored_key_on_overwrite() {
        let by_length = |left: &String, right: &String| left.len().cmp(&right.len());
        let map = PersistentSortedMap::with_comparator(by_length)
            .insert("abc".to_string(), 1)
            .insert("xyz".to_string(), 2);
        assert_eq!(map.len(), 1);
        assert_eq!(
            map.get_key_value(&"qqq".to_string()),
            Some((&"abc".to_string(), &2))
        );
    }

    #[rstest]
    fn test_remove_absent_key_shares_root(scenario_map: PersistentSortedMap<i32, String>) {
        let removed = scenario_map.remove(&6);
        assert!(removed.ptr_eq(&scenario_map));
        assert_eq!(removed, scenario_map);
    }

    #[rstest]
    fn test_remove_only_key() {
        let map = PersistentSortedMap::singleton(1, "one").remove(&1);
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert_eq!(map.min_key(), None);
        assert_eq!(map.max_key(), None);
    }

    #[rstest]
    fn test_remove_from_empty_map() {
        let map: PersistentSortedMap<i32, i32> = PersistentSortedMap::new();
        assert!(map.remove(&1).is_empty());
    }

    #[rstest]
    #[case(1)]
    #[case(5)]
    #[case(9)]
    #[case(4)]
    fn test_remove_each_scenario_key(
        scenario_map: PersistentSortedMap<i32, String>,
        #[case] key: i32,
    ) {
        let removed = scenario_map.remove(&key);
        assert_eq!(removed.len(), 6);
        assert_eq!(removed.get(&key), None);
        assert!(removed.check_max_depth().is_ok());
        assert_eq!(scenario_map.get(&key), Some(&format!("v{key}")));
    }

    #[rstest]
    fn test_predecessor_key(scenario_map: PersistentSortedMap<i32, String>) {
        assert_eq!(scenario_map.predecessor_key(&5), Some(&4));
        assert_eq!(scenario_map.predecessor_key(&7), Some(&5));
        assert_eq!(scenario_map.predecessor_key(&1), None);
        assert_eq!(scenario_map.predecessor_key(&6), None);
    }

    #[rstest]
    fn test_traversal_stops_early(scenario_map: PersistentSortedMap<i32, String>) {
        let mut visited = Vec::new();
        let flow = scenario_map.inorder_traversal(|key, _| {
            visited.push(*key);
            if *key == 4 {
                ControlFlow::Break(*key)
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(flow, ControlFlow::Break(4));
        assert_eq!(visited, vec![1, 3, 4]);

        let mut reversed = Vec::new();
        let flow: ControlFlow<()> = scenario_map.reverse_traversal(|key, _| {
            reversed.push(*key);
            ControlFlow::Continue(())
        });
        assert_eq!(flow, ControlFlow::Continue(()));
        assert_eq!(reversed, vec![9, 8, 7, 5, 4, 3, 1]);
    }

    #[rstest]
    #[case(3..6, vec![3, 4, 5])]
    #[case(2..3, vec![])]
    #[case(0..100, vec![1, 3, 4, 5, 7, 8, 9])]
    #[case(8..1, vec![])]
    fn test_range(
        scenario_map: PersistentSortedMap<i32, String>,
        #[case] range: std::ops::Range<i32>,
        #[case] expected: Vec<i32>,
    ) {
        let keys: Vec<i32> = scenario_map.range(range).map(|(key, _)| *key).collect();
        assert_eq!(keys, expected);
    }

    #[rstest]
    fn test_range_bound_kinds(scenario_map: PersistentSortedMap<i32, String>) {
        fn collect(iterator: SortedMapIterator<'_, i32, String>) -> Vec<i32> {
            iterator.map(|(key, _)| *key).collect()
        }
        assert_eq!(collect(scenario_map.range(4..=8)), vec![4, 5, 7, 8]);
        assert_eq!(collect(scenario_map.range(..4)), vec![1, 3]);
        assert_eq!(collect(scenario_map.range(..=4)), vec![1, 3, 4]);
        assert_eq!(
            collect(scenario_map.range((Bound::Excluded(4), Bound::Unbounded))),
            vec![5, 7, 8, 9]
        );
        assert_eq!(collect(scenario_map.range::<i32, _>(..)).len(), 7);
    }

    #[rstest]
    fn test_reversed_comparator_orders_descending() {
        let map: PersistentSortedMap<i32, (), Reversed<NaturalOrder>> =
            (1..=5).map(|key| (key, ())).collect();
        let keys: Vec<i32> = map.keys().copied().collect();
        assert_eq!(keys, vec![5, 4, 3, 2, 1]);
        assert_eq!(map.index_of(&5), Some(0));
        assert!(map.check().is_ok());
    }

    #[rstest]
    fn test_owned_iteration(scenario_map: PersistentSortedMap<i32, String>) {
        let entries: Vec<(i32, String)> = scenario_map.clone().into_iter().collect();
        assert_eq!(entries.len(), 7);
        assert_eq!(entries[0], (1, "v1".to_string()));
        assert_eq!(scenario_map.len(), 7);
    }

    #[rstest]
    fn test_equal_maps_hash_equally() {
        use std::collections::hash_map::DefaultHasher;

        let hash = |map: &PersistentSortedMap<i32, i32>| {
            let mut hasher = DefaultHasher::new();
            map.hash(&mut hasher);
            hasher.finish()
        };
        let left: PersistentSortedMap<i32, i32> = [(1, 1), (2, 2)].into_iter().collect();
        let right: PersistentSortedMap<i32, i32> = [(2, 2), (1, 1)].into_iter().collect();
        assert_eq!(left, right);
        assert_eq!(hash(&left), hash(&right));
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    fn red_rooted_map() -> PersistentSortedMap<i32, i32> {
        let root = Node {
            key: 1,
            value: 1,
            color: node::Color::Red,
            left: None,
            right: None,
            size: 1,
        };
        PersistentSortedMap {
            comparator: NaturalOrder,
            root: Some(share(root)),
        }
    }

    fn capture_debug_events<R>(body: impl FnOnce() -> R) -> (R, String) {
        use std::io;
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Buffer(Arc<Mutex<Vec<u8>>>);

        impl io::Write for Buffer {
            fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
                self.0.lock().expect("poisoned buffer").extend_from_slice(bytes);
                Ok(bytes.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let buffer = Buffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("llrb_collections=debug"))
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let result = tracing::subscriber::with_default(subscriber, body);
        let logs = String::from_utf8_lossy(&buffer.0.lock().expect("poisoned buffer")).into_owned();
        (result, logs)
    }

    #[rstest]
    fn test_failed_check_emits_debug_event() {
        let map = red_rooted_map();

        let (result, logs) = capture_debug_events(|| map.check());

        assert_eq!(result, Err(InvariantViolation::RedRoot));
        assert!(logs.contains("sorted map failed its invariant check"));
        assert!(logs.contains("violation=root node is red"));
        assert!(logs.contains("len=1"));
    }

    #[rstest]
    fn test_failed_depth_check_emits_debug_event() {
        let map = red_rooted_map();

        let (result, logs) = capture_debug_events(|| map.check_max_depth());

        assert_eq!(result, Err(InvariantViolation::RedRoot));
        assert!(logs.contains("sorted map failed its depth check"));
    }

    #[rstest]
    fn test_passing_check_is_silent(scenario_map: PersistentSortedMap<i32, String>) {
        let (result, logs) = capture_debug_events(|| scenario_map.check_max_depth());

        assert_eq!(result, Ok(()));
        assert!(logs.is_empty());
    }
}

// =============================================================================
// Send + Sync Tests (arc feature only)
// =============================================================================
