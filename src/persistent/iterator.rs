//! Cursors over the entries of a [`PersistentSortedMap`](super::PersistentSortedMap).
//!
//! Both cursors keep an explicit stack of ancestors instead of recursing, so
//! they can be advanced one step at a time and parked between steps. A
//! cursor walks either in ascending or in descending order, starting at the
//! first entry, at a given key or at a given position.

use super::ReferenceCounter;
use super::node::{Link, Node, into_owned, size};
use crate::comparator::Comparator;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::iter::FusedIterator;

/// Which child comes next in iteration order, and which came before.
const fn sides<K, V>(node: &Node<K, V>, reverse: bool) -> (&Link<K, V>, &Link<K, V>) {
    if reverse {
        (&node.right, &node.left)
    } else {
        (&node.left, &node.right)
    }
}

/// A borrowing cursor over key-value pairs of a map.
///
/// Created by [`iter`](super::PersistentSortedMap::iter),
/// [`iter_from`](super::PersistentSortedMap::iter_from),
/// [`reverse_iter`](super::PersistentSortedMap::reverse_iter),
/// [`reverse_iter_from`](super::PersistentSortedMap::reverse_iter_from) and
/// [`range`](super::PersistentSortedMap::range).
///
/// # Examples
///
/// ```rust
/// use llrb_collections::persistent::PersistentSortedMap;
///
/// let map: PersistentSortedMap<i32, &str> =
///     [(1, "one"), (2, "two"), (3, "three")].into_iter().collect();
///
/// let mut cursor = map.iter_from(&2);
/// assert_eq!(cursor.peek(), Some((&2, &"two")));
/// assert_eq!(cursor.next(), Some((&2, &"two")));
/// assert!(cursor.has_next());
/// assert_eq!(cursor.next(), Some((&3, &"three")));
/// assert!(!cursor.has_next());
/// ```
pub struct SortedMapIterator<'a, K, V> {
    stack: Vec<&'a Node<K, V>>,
    reverse: bool,
    remaining: usize,
}

impl<'a, K, V> SortedMapIterator<'a, K, V> {
    /// Positions a cursor on the first entry in iteration order.
    pub(crate) fn new(root: &'a Link<K, V>, reverse: bool) -> Self {
        let mut iterator = Self {
            stack: Vec::new(),
            reverse,
            remaining: size(root),
        };
        iterator.push_spine(root);
        iterator
    }

    /// Positions a cursor on the first key at or after `start` in iteration
    /// order: the smallest key `>= start` going forward, the largest key
    /// `<= start` going backward.
    pub(crate) fn starting_at<Q, C>(
        root: &'a Link<K, V>,
        start: &Q,
        comparator: &C,
        reverse: bool,
    ) -> Self
    where
        K: Borrow<Q>,
        Q: ?Sized,
        C: Comparator<Q> + ?Sized,
    {
        let mut stack = Vec::new();
        let mut remaining = 0;
        let mut current = root.as_ref();

        while let Some(node) = current {
            let node: &'a Node<K, V> = node;
            let ordering = comparator.compare(node.key.borrow(), start);
            let ordering = if reverse { ordering.reverse() } else { ordering };
            let (before, after) = sides(node, reverse);
            match ordering {
                Ordering::Less => current = after.as_ref(),
                Ordering::Equal => {
                    stack.push(node);
                    remaining += 1 + size(after);
                    break;
                }
                Ordering::Greater => {
                    stack.push(node);
                    remaining += 1 + size(after);
                    current = before.as_ref();
                }
            }
        }

        Self {
            stack,
            reverse,
            remaining,
        }
    }

    /// Positions an ascending cursor on the entry of rank `position`.
    pub(crate) fn at_position(root: &'a Link<K, V>, mut position: usize) -> Self {
        let mut stack = Vec::new();
        let mut remaining = 0;
        let mut current = root.as_ref();

        while let Some(node) = current {
            let node: &'a Node<K, V> = node;
            let left_size = size(&node.left);
            match position.cmp(&left_size) {
                Ordering::Less => {
                    stack.push(node);
                    remaining += 1 + size(&node.right);
                    current = node.left.as_ref();
                }
                Ordering::Equal => {
                    stack.push(node);
                    remaining += 1 + size(&node.right);
                    break;
                }
                Ordering::Greater => {
                    position -= left_size + 1;
                    current = node.right.as_ref();
                }
            }
        }

        Self {
            stack,
            reverse: false,
            remaining,
        }
    }

    /// Stops the cursor after at most `count` more entries.
    pub(crate) fn limit(mut self, count: usize) -> Self {
        self.remaining = self.remaining.min(count);
        self
    }

    fn push_spine(&mut self, mut link: &'a Link<K, V>) {
        while let Some(node) = link {
            let node: &'a Node<K, V> = node;
            self.stack.push(node);
            link = sides(node, self.reverse).0;
        }
    }

    /// Returns `true` if another entry is available.
    #[inline]
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.remaining > 0
    }

    /// Returns the next entry without advancing.
    #[must_use]
    pub fn peek(&self) -> Option<(&'a K, &'a V)> {
        if self.remaining == 0 {
            return None;
        }
        self.stack.last().map(|node| (&node.key, &node.value))
    }
}

impl<'a, K, V> Iterator for SortedMapIterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.stack.pop()?;
        self.remaining -= 1;
        self.push_spine(sides(node, self.reverse).1);
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for SortedMapIterator<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V> FusedIterator for SortedMapIterator<'_, K, V> {}

impl<K, V> Clone for SortedMapIterator<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            stack: self.stack.clone(),
            reverse: self.reverse,
            remaining: self.remaining,
        }
    }
}

/// An owning cursor over the entries of a map.
///
/// Holds reference-counted nodes rather than borrows, so it does not keep
/// the map borrowed. Entries are moved out of nodes nobody else references
/// and cloned otherwise.
pub struct SortedMapIntoIterator<K, V> {
    stack: Vec<ReferenceCounter<Node<K, V>>>,
    reverse: bool,
    remaining: usize,
}

impl<K, V> SortedMapIntoIterator<K, V> {
    pub(crate) fn new(root: Link<K, V>, reverse: bool) -> Self {
        let mut iterator = Self {
            stack: Vec::new(),
            reverse,
            remaining: size(&root),
        };
        iterator.push_spine(root);
        iterator
    }

    fn push_spine(&mut self, mut link: Link<K, V>) {
        while let Some(node) = link {
            link = sides(&*node, self.reverse).0.clone();
            self.stack.push(node);
        }
    }

    /// Returns `true` if another entry is available.
    #[inline]
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.remaining > 0
    }

    /// Returns the next entry without advancing.
    #[must_use]
    pub fn peek(&self) -> Option<(&K, &V)> {
        self.stack.last().map(|node| (&node.key, &node.value))
    }
}

impl<K: Clone, V: Clone> Iterator for SortedMapIntoIterator<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.remaining -= 1;
        self.push_spine(sides(&*node, self.reverse).1.clone());
        let Node { key, value, .. } = into_owned(node);
        Some((key, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Clone, V: Clone> ExactSizeIterator for SortedMapIntoIterator<K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K: Clone, V: Clone> FusedIterator for SortedMapIntoIterator<K, V> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::NaturalOrder;
    use crate::persistent::node::{blacken, insert, share};
    use rstest::rstest;

    fn build(keys: &[i32]) -> Link<i32, i32> {
        let mut root: Link<i32, i32> = None;
        for &key in keys {
            let (node, _) = insert(&root, key, key * 10, &NaturalOrder);
            root = Some(blacken(share(node)));
        }
        root
    }

    fn keys<'a>(iterator: impl Iterator<Item = (&'a i32, &'a i32)>) -> Vec<i32> {
        iterator.map(|(key, _)| *key).collect()
    }

    #[rstest]
    fn test_forward_and_reverse() {
        let root = build(&[5, 3, 8, 1, 4, 7, 9]);
        assert_eq!(
            keys(SortedMapIterator::new(&root, false)),
            vec![1, 3, 4, 5, 7, 8, 9]
        );
        assert_eq!(
            keys(SortedMapIterator::new(&root, true)),
            vec![9, 8, 7, 5, 4, 3, 1]
        );
    }

    #[rstest]
    #[case(0, false, vec![1, 3, 4, 5, 7, 8, 9])]
    #[case(4, false, vec![4, 5, 7, 8, 9])]
    #[case(6, false, vec![7, 8, 9])]
    #[case(10, false, vec![])]
    #[case(10, true, vec![9, 8, 7, 5, 4, 3, 1])]
    #[case(6, true, vec![5, 4, 3, 1])]
    #[case(3, true, vec![3, 1])]
    #[case(0, true, vec![])]
    fn test_starting_at(#[case] start: i32, #[case] reverse: bool, #[case] expected: Vec<i32>) {
        let root = build(&[5, 3, 8, 1, 4, 7, 9]);
        let iterator = SortedMapIterator::starting_at(&root, &start, &NaturalOrder, reverse);
        assert_eq!(iterator.len(), expected.len());
        assert_eq!(keys(iterator), expected);
    }

    #[rstest]
    #[case(0, vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9])]
    #[case(4, vec![4, 5, 6, 7, 8, 9])]
    #[case(9, vec![9])]
    #[case(10, vec![])]
    fn test_at_position(#[case] position: usize, #[case] expected: Vec<i32>) {
        let root = build(&(0..10).collect::<Vec<_>>());
        let iterator = SortedMapIterator::at_position(&root, position);
        assert_eq!(iterator.len(), expected.len());
        assert_eq!(keys(iterator), expected);
    }

    #[rstest]
    fn test_limit_stops_early() {
        let root = build(&(0..10).collect::<Vec<_>>());
        let iterator = SortedMapIterator::at_position(&root, 2).limit(3);
        assert_eq!(keys(iterator), vec![2, 3, 4]);
    }

    #[rstest]
    fn test_peek_does_not_advance() {
        let root = build(&[2, 1]);
        let mut iterator = SortedMapIterator::new(&root, false);
        assert_eq!(iterator.peek(), Some((&1, &10)));
        assert_eq!(iterator.peek(), Some((&1, &10)));
        assert_eq!(iterator.next(), Some((&1, &10)));
        assert_eq!(iterator.peek(), Some((&2, &20)));
        assert_eq!(iterator.next(), Some((&2, &20)));
        assert_eq!(iterator.peek(), None);
        assert!(!iterator.has_next());
        assert_eq!(iterator.next(), None);
    }

    #[rstest]
    fn test_empty_tree() {
        let root: Link<i32, i32> = None;
        let mut iterator = SortedMapIterator::new(&root, false);
        assert!(!iterator.has_next());
        assert_eq!(iterator.next(), None);
    }

    #[rstest]
    fn test_into_iterator_yields_owned_entries() {
        let root = build(&[3, 1, 2]);
        let entries: Vec<(i32, i32)> = SortedMapIntoIterator::new(root.clone(), false).collect();
        assert_eq!(entries, vec![(1, 10), (2, 20), (3, 30)]);

        let reversed: Vec<(i32, i32)> = SortedMapIntoIterator::new(root, true).collect();
        assert_eq!(reversed, vec![(3, 30), (2, 20), (1, 10)]);
    }
}
