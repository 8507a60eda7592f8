//! Errors reported by the tree self-checks.

use thiserror::Error;

/// A broken red-black tree invariant found by
/// [`PersistentSortedMap::check`](super::PersistentSortedMap::check).
///
/// None of these can be produced through the public API; seeing one means
/// the balancing code has a bug. Test suites `expect` on the check result.
///
/// # Examples
///
/// ```rust
/// use llrb_collections::persistent::InvariantViolation;
///
/// let violation = InvariantViolation::BlackHeightMismatch { left: 2, right: 3 };
/// assert_eq!(
///     violation.to_string(),
///     "black heights differ: left subtree has 2, right subtree has 3"
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// The root node is red.
    #[error("root node is red")]
    RedRoot,
    /// A red node has a red left child.
    #[error("red node at depth {depth} has a red left child")]
    RedLeftChain {
        /// Depth of the offending parent, the root being at depth 0.
        depth: usize,
    },
    /// A node has a red right child.
    #[error("node at depth {depth} has a red right child")]
    RightLeaningRed {
        /// Depth of the offending parent.
        depth: usize,
    },
    /// A node's cached size does not match its subtrees.
    #[error("node at depth {depth} records size {actual}, subtrees add up to {expected}")]
    SizeMismatch {
        /// Depth of the offending node.
        depth: usize,
        /// `1 + left.size + right.size`.
        expected: usize,
        /// The size stored in the node.
        actual: usize,
    },
    /// Two sibling subtrees have different black heights.
    #[error("black heights differ: left subtree has {left}, right subtree has {right}")]
    BlackHeightMismatch {
        /// Black height of the left subtree.
        left: usize,
        /// Black height of the right subtree.
        right: usize,
    },
    /// An in-order neighbour is not strictly greater than its predecessor.
    #[error("keys are not in strictly ascending order at position {position}")]
    OutOfOrder {
        /// In-order position of the first key that is out of place.
        position: usize,
    },
    /// The tree is deeper than a red-black tree of this size may be.
    #[error("black height {black_height} is too large for {len} entries")]
    DepthExceeded {
        /// Black height of the root.
        black_height: usize,
        /// Number of entries in the map.
        len: usize,
    },
}
