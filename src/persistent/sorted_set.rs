//! Persistent (immutable) sorted set built on [`PersistentSortedMap`].
//!
//! # Examples
//!
//! ```rust
//! use llrb_collections::persistent::PersistentSortedSet;
//!
//! let set: PersistentSortedSet<i32> = [5, 1, 3].into_iter().collect();
//! let extended = set.insert(2);
//!
//! assert_eq!(set.len(), 3);
//! assert_eq!(extended.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3, 5]);
//! assert_eq!(extended.first_after_or_equal(&4), Some(&5));
//! ```

use super::iterator::{SortedMapIntoIterator, SortedMapIterator};
use super::{InvariantViolation, PersistentSortedMap};
use crate::comparator::{Comparator, NaturalOrder};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::{FromIterator, FusedIterator};
use std::ops::{ControlFlow, RangeBounds};

/// A persistent (immutable) ordered set of unique elements.
///
/// Elements are ordered by the set's [`Comparator`]; two elements the
/// comparator considers equal are the same element.
#[derive(Clone)]
pub struct PersistentSortedSet<T, C = NaturalOrder> {
    map: PersistentSortedMap<T, (), C>,
}

impl<T> PersistentSortedSet<T> {
    /// Creates a new empty set ordered by the elements' [`Ord`]
    /// implementation.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            map: PersistentSortedMap::new(),
        }
    }
}

impl<T, C> PersistentSortedSet<T, C> {
    /// Creates a new empty set ordered by `comparator`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use llrb_collections::persistent::PersistentSortedSet;
    ///
    /// let set = PersistentSortedSet::with_comparator(|left: &&str, right: &&str| {
    ///     left.len().cmp(&right.len())
    /// })
    /// .insert("ccc")
    /// .insert("a")
    /// .insert("bb");
    ///
    /// assert_eq!(set.first(), Some(&"a"));
    /// assert_eq!(set.last(), Some(&"ccc"));
    /// ```
    #[inline]
    #[must_use]
    pub const fn with_comparator(comparator: C) -> Self {
        Self {
            map: PersistentSortedMap::with_comparator(comparator),
        }
    }

    /// Returns the number of elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the set has no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns the smallest element.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.map.min_key()
    }

    /// Returns the largest element.
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.map.max_key()
    }

    /// Returns `true` if the set contains `element`.
    #[must_use]
    pub fn contains<Q>(&self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.map.contains_key(element)
    }

    /// Returns the position of `element` in ascending order.
    #[must_use]
    pub fn index_of<Q>(&self, element: &Q) -> Option<usize>
    where
        T: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.map.index_of(element)
    }

    /// Returns the smallest element `>= element`.
    #[must_use]
    pub fn first_after_or_equal<Q>(&self, element: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        self.map.iter_from(element).next().map(|(key, ())| key)
    }

    /// Visits elements in ascending order until `visit` breaks.
    pub fn for_each_while<B, F>(&self, mut visit: F) -> ControlFlow<B>
    where
        F: FnMut(&T) -> ControlFlow<B>,
    {
        self.map.inorder_traversal(|element, ()| visit(element))
    }

    /// Returns an ascending iterator over the elements.
    #[must_use]
    pub fn iter(&self) -> SortedSetIterator<'_, T> {
        SortedSetIterator {
            inner: self.map.iter(),
        }
    }

    /// Returns a descending iterator over the elements.
    #[must_use]
    pub fn reverse_iter(&self) -> SortedSetIterator<'_, T> {
        SortedSetIterator {
            inner: self.map.reverse_iter(),
        }
    }

    /// Returns an ascending iterator starting at the smallest element
    /// `>= element`.
    #[must_use]
    pub fn iter_from<Q>(&self, element: &Q) -> SortedSetIterator<'_, T>
    where
        T: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        SortedSetIterator {
            inner: self.map.iter_from(element),
        }
    }

    /// Returns a descending iterator starting at the largest element
    /// `<= element`.
    #[must_use]
    pub fn reverse_iter_from<Q>(&self, element: &Q) -> SortedSetIterator<'_, T>
    where
        T: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        SortedSetIterator {
            inner: self.map.reverse_iter_from(element),
        }
    }

    /// Returns an ascending iterator over the elements within `range`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use llrb_collections::persistent::PersistentSortedSet;
    ///
    /// let set: PersistentSortedSet<i32> = (0..10).collect();
    /// let middle: Vec<i32> = set.range(3..=5).copied().collect();
    /// assert_eq!(middle, vec![3, 4, 5]);
    /// ```
    #[must_use]
    pub fn range<Q, R>(&self, range: R) -> SortedSetIterator<'_, T>
    where
        T: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
        R: RangeBounds<Q>,
    {
        SortedSetIterator {
            inner: self.map.range(range),
        }
    }

    /// Verifies the invariants of the backing tree.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    pub fn check(&self) -> Result<usize, InvariantViolation>
    where
        C: Comparator<T>,
    {
        self.map.check()
    }
}

impl<T: Clone, C: Comparator<T> + Clone> PersistentSortedSet<T, C> {
    /// Returns a set that also contains `element`.
    #[must_use]
    pub fn insert(&self, element: T) -> Self {
        Self {
            map: self.map.insert(element, ()),
        }
    }

    /// Returns a set without `element`. Absent elements leave the set as is.
    #[must_use]
    pub fn remove<Q>(&self, element: &Q) -> Self
    where
        T: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q>,
    {
        Self {
            map: self.map.remove(element),
        }
    }

    /// Returns the union of both sets.
    ///
    /// The smaller set is inserted into the larger one, so the result shares
    /// structure with whichever operand is bigger.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use llrb_collections::persistent::PersistentSortedSet;
    ///
    /// let left: PersistentSortedSet<i32> = [1, 2, 3].into_iter().collect();
    /// let right: PersistentSortedSet<i32> = [3, 4].into_iter().collect();
    ///
    /// let union = left.union(&right);
    /// assert_eq!(union.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    /// ```
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let (larger, smaller) = if self.len() >= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        smaller
            .iter()
            .fold(larger.clone(), |set, element| set.insert(element.clone()))
    }
}

// =============================================================================
// Iterators
// =============================================================================

/// A borrowing iterator over the elements of a [`PersistentSortedSet`].
pub struct SortedSetIterator<'a, T> {
    inner: SortedMapIterator<'a, T, ()>,
}

impl<'a, T> SortedSetIterator<'a, T> {
    /// Returns `true` if another element is available.
    #[inline]
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.inner.has_next()
    }

    /// Returns the next element without advancing.
    #[must_use]
    pub fn peek(&self) -> Option<&'a T> {
        self.inner.peek().map(|(element, ())| element)
    }
}

impl<'a, T> Iterator for SortedSetIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(element, ())| element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for SortedSetIterator<'_, T> {}

impl<T> FusedIterator for SortedSetIterator<'_, T> {}

/// An owning iterator over the elements of a [`PersistentSortedSet`].
pub struct SortedSetIntoIterator<T> {
    inner: SortedMapIntoIterator<T, ()>,
}

impl<T: Clone> Iterator for SortedSetIntoIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(element, ())| element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T: Clone> ExactSizeIterator for SortedSetIntoIterator<T> {}

impl<T: Clone> FusedIterator for SortedSetIntoIterator<T> {}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T, C: Default> Default for PersistentSortedSet<T, C> {
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<T, C> FromIterator<T> for PersistentSortedSet<T, C>
where
    T: Clone,
    C: Comparator<T> + Clone + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().map(|element| (element, ())).collect(),
        }
    }
}

impl<T: Clone, C> IntoIterator for PersistentSortedSet<T, C> {
    type Item = T;
    type IntoIter = SortedSetIntoIterator<T>;

    fn into_iter(self) -> Self::IntoIter {
        SortedSetIntoIterator {
            inner: self.map.into_iter(),
        }
    }
}

impl<'a, T, C> IntoIterator for &'a PersistentSortedSet<T, C> {
    type Item = &'a T;
    type IntoIter = SortedSetIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq, C> PartialEq for PersistentSortedSet<T, C> {
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl<T: Eq, C> Eq for PersistentSortedSet<T, C> {}

impl<T: Hash, C> Hash for PersistentSortedSet<T, C> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.map.hash(state);
    }
}

impl<T: fmt::Debug, C> fmt::Debug for PersistentSortedSet<T, C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}

impl<T: fmt::Display, C> fmt::Display for PersistentSortedSet<T, C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{{")?;
        for (index, element) in self.iter().enumerate() {
            if index > 0 {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{element}")?;
        }
        write!(formatter, "}}")
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T: serde::Serialize, C> serde::Serialize for PersistentSortedSet<T, C> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(feature = "serde")]
impl<'de, T, C> serde::Deserialize<'de> for PersistentSortedSet<T, C>
where
    T: serde::Deserialize<'de> + Clone,
    C: Comparator<T> + Clone + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let elements = <Vec<T> as serde::Deserialize>::deserialize(deserializer)?;
        Ok(elements.into_iter().collect())
    }
}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_serialize_as_sorted_sequence() {
        let set: PersistentSortedSet<i32> = [3, 1, 2].into_iter().collect();
        assert_eq!(serde_json::to_string(&set).unwrap(), "[1,2,3]");
    }

    #[rstest]
    fn test_deserialize_sorts_and_deduplicates() {
        let set: PersistentSortedSet<i32> = serde_json::from_str("[3,1,3,2]").unwrap();
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
    }
}
