//! Left-leaning red-black tree nodes and the transformations that rebalance
//! them.
//!
//! Nodes are never mutated once they are shared. Every function here takes
//! an owned [`Node`] (obtained with [`into_owned`], which only clones when the
//! node is still referenced by another version), rewires it and hands back a
//! fresh node. The empty subtree is the `None` link: black, size 0, shared
//! by every leaf.

use super::ReferenceCounter;
use crate::comparator::Comparator;
use std::borrow::Borrow;
use std::cmp::Ordering;

/// The color of the link from a node's parent to the node.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum Color {
    Red,
    Black,
}

impl Color {
    const fn flip(self) -> Self {
        match self {
            Self::Red => Self::Black,
            Self::Black => Self::Red,
        }
    }
}

/// A possibly empty subtree.
pub(crate) type Link<K, V> = Option<ReferenceCounter<Node<K, V>>>;

#[derive(Clone)]
pub(crate) struct Node<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    pub(crate) color: Color,
    pub(crate) left: Link<K, V>,
    pub(crate) right: Link<K, V>,
    /// Number of entries in this subtree, this node included.
    pub(crate) size: usize,
}

impl<K, V> Node<K, V> {
    /// Creates a new red leaf.
    const fn new_red(key: K, value: V) -> Self {
        Self {
            key,
            value,
            color: Color::Red,
            left: None,
            right: None,
            size: 1,
        }
    }

    pub(crate) const fn is_red(&self) -> bool {
        matches!(self.color, Color::Red)
    }

    fn resize(&mut self) {
        self.size = 1 + size(&self.left) + size(&self.right);
    }
}

pub(crate) fn size<K, V>(link: &Link<K, V>) -> usize {
    link.as_ref().map_or(0, |node| node.size)
}

pub(crate) fn is_red<K, V>(link: &Link<K, V>) -> bool {
    link.as_ref().is_some_and(|node| node.is_red())
}

/// Whether the left child of `link` is red. False for empty links.
fn left_is_red<K, V>(link: &Link<K, V>) -> bool {
    link.as_ref().is_some_and(|node| is_red(&node.left))
}

pub(crate) fn share<K, V>(node: Node<K, V>) -> ReferenceCounter<Node<K, V>> {
    ReferenceCounter::new(node)
}

/// Takes the node out of its pointer, copying it if another version holds it.
pub(crate) fn into_owned<K: Clone, V: Clone>(node: ReferenceCounter<Node<K, V>>) -> Node<K, V> {
    ReferenceCounter::unwrap_or_clone(node)
}

/// Returns a copy of `node` whose color is black.
pub(crate) fn blacken<K: Clone, V: Clone>(
    node: ReferenceCounter<Node<K, V>>,
) -> ReferenceCounter<Node<K, V>> {
    if node.is_red() {
        let mut owned = into_owned(node);
        owned.color = Color::Black;
        share(owned)
    } else {
        node
    }
}

// =============================================================================
// Rebalancing
// =============================================================================

fn rotate_left<K: Clone, V: Clone>(mut node: Node<K, V>) -> Node<K, V> {
    let Some(right) = node.right.take() else {
        return node;
    };
    let mut pivot = into_owned(right);
    node.right = pivot.left.take();
    pivot.color = node.color;
    node.color = Color::Red;
    node.resize();
    pivot.left = Some(share(node));
    pivot.resize();
    pivot
}

fn rotate_right<K: Clone, V: Clone>(mut node: Node<K, V>) -> Node<K, V> {
    let Some(left) = node.left.take() else {
        return node;
    };
    let mut pivot = into_owned(left);
    node.left = pivot.right.take();
    pivot.color = node.color;
    node.color = Color::Red;
    node.resize();
    pivot.right = Some(share(node));
    pivot.resize();
    pivot
}

fn flip_link<K: Clone, V: Clone>(link: Link<K, V>) -> Link<K, V> {
    link.map(|child| {
        let mut child = into_owned(child);
        child.color = child.color.flip();
        share(child)
    })
}

/// Inverts the color of a node and of both of its children.
fn color_flip<K: Clone, V: Clone>(mut node: Node<K, V>) -> Node<K, V> {
    node.color = node.color.flip();
    node.left = flip_link(node.left.take());
    node.right = flip_link(node.right.take());
    node
}

/// Restores the left-leaning shape on the way back up from a modification.
fn fix_up<K: Clone, V: Clone>(mut node: Node<K, V>) -> Node<K, V> {
    if is_red(&node.right) && !is_red(&node.left) {
        node = rotate_left(node);
    }
    if is_red(&node.left) && left_is_red(&node.left) {
        node = rotate_right(node);
    }
    if is_red(&node.left) && is_red(&node.right) {
        node = color_flip(node);
    }
    node
}

/// Makes the left child (or one of its children) red before descending left.
fn move_red_left<K: Clone, V: Clone>(node: Node<K, V>) -> Node<K, V> {
    let mut node = color_flip(node);
    if left_is_red(&node.right) {
        node.right = node
            .right
            .take()
            .map(|right| share(rotate_right(into_owned(right))));
        node = color_flip(rotate_left(node));
    }
    node
}

/// Makes the right child (or one of its children) red before descending right.
fn move_red_right<K: Clone, V: Clone>(node: Node<K, V>) -> Node<K, V> {
    let mut node = color_flip(node);
    if left_is_red(&node.left) {
        node = color_flip(rotate_right(node));
    }
    node
}

// =============================================================================
// Structural operations
// =============================================================================

/// Inserts `key` below `link`, copying every node on the search path.
///
/// Returns the new subtree root and whether a new entry was added (as opposed
/// to an existing value being replaced). The key already stored is kept on
/// replacement.
pub(crate) fn insert<K, V, C>(
    link: &Link<K, V>,
    key: K,
    value: V,
    comparator: &C,
) -> (Node<K, V>, bool)
where
    K: Clone,
    V: Clone,
    C: Comparator<K> + ?Sized,
{
    let Some(current) = link else {
        return (Node::new_red(key, value), true);
    };

    let mut node = (**current).clone();
    let added = match comparator.compare(&key, &node.key) {
        Ordering::Less => {
            let (left, added) = insert(&node.left, key, value, comparator);
            node.left = Some(share(left));
            added
        }
        Ordering::Greater => {
            let (right, added) = insert(&node.right, key, value, comparator);
            node.right = Some(share(right));
            added
        }
        Ordering::Equal => {
            node.value = value;
            false
        }
    };
    node.resize();
    (fix_up(node), added)
}

/// Removes the smallest entry of the subtree rooted at `node`.
fn remove_min<K: Clone, V: Clone>(mut node: Node<K, V>) -> Link<K, V> {
    if node.left.is_none() {
        return None;
    }
    if !is_red(&node.left) && !left_is_red(&node.left) {
        node = move_red_left(node);
    }
    node.left = node.left.take().and_then(|left| remove_min(into_owned(left)));
    node.resize();
    Some(share(fix_up(node)))
}

/// Colors a root red when both of its children are black, which the top-down
/// deletion requires before it starts pushing red links downwards.
fn redden_root<K, V>(mut root: Node<K, V>) -> Node<K, V> {
    if !is_red(&root.left) && !is_red(&root.right) {
        root.color = Color::Red;
    }
    root
}

/// Removes `key` from the tree rooted at `root` and returns the new, black
/// root.
///
/// The key must be present; callers check membership first so that removing
/// an absent key can hand back the untouched root.
pub(crate) fn remove_from_root<K, V, Q, C>(
    root: &ReferenceCounter<Node<K, V>>,
    key: &Q,
    comparator: &C,
) -> Link<K, V>
where
    K: Clone + Borrow<Q>,
    V: Clone,
    Q: ?Sized,
    C: Comparator<Q> + ?Sized,
{
    let root = redden_root(into_owned(ReferenceCounter::clone(root)));
    remove(root, key, comparator).map(blacken)
}

fn remove<K, V, Q, C>(mut node: Node<K, V>, key: &Q, comparator: &C) -> Link<K, V>
where
    K: Clone + Borrow<Q>,
    V: Clone,
    Q: ?Sized,
    C: Comparator<Q> + ?Sized,
{
    if comparator.compare(key, node.key.borrow()) == Ordering::Less {
        if node.left.is_some() && !is_red(&node.left) && !left_is_red(&node.left) {
            node = move_red_left(node);
        }
        node.left = node
            .left
            .take()
            .and_then(|left| remove(into_owned(left), key, comparator));
    } else {
        if is_red(&node.left) {
            node = rotate_right(node);
        }
        if node.right.is_some() && !is_red(&node.right) && !left_is_red(&node.right) {
            node = move_red_right(node);
        }
        if comparator.compare(key, node.key.borrow()) == Ordering::Equal {
            // A matching node without a right child is a leaf here.
            let right = into_owned(node.right.take()?);
            let (successor_key, successor_value) = min_entry(&right);
            node.key = successor_key.clone();
            node.value = successor_value.clone();
            node.right = remove_min(right);
        } else {
            node.right = node
                .right
                .take()
                .and_then(|right| remove(into_owned(right), key, comparator));
        }
    }
    node.resize();
    Some(share(fix_up(node)))
}

fn min_entry<K, V>(node: &Node<K, V>) -> (&K, &V) {
    let mut current = node;
    while let Some(left) = &current.left {
        current = left;
    }
    (&current.key, &current.value)
}
