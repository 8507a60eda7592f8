//! Persistent (immutable) sorted collections.
//!
//! This module provides ordered collections that use structural sharing to
//! minimize copying:
//!
//! - [`PersistentSortedMap`]: Persistent ordered map (left-leaning red-black tree)
//! - [`PersistentSortedSet`]: Persistent ordered set (backed by the map)
//!
//! # Structural Sharing
//!
//! Inserting or removing an entry copies only the O(log N) nodes on the path
//! to that entry. Every other subtree is shared by reference between the old
//! and the new version, and both remain valid snapshots.
//!
//! # Examples
//!
//! ## `PersistentSortedMap`
//!
//! ```rust
//! use llrb_collections::persistent::PersistentSortedMap;
//!
//! let map = PersistentSortedMap::new()
//!     .insert(3, "three")
//!     .insert(1, "one")
//!     .insert(2, "two");
//!
//! // Structural sharing: the original map is preserved
//! let updated = map.insert(1, "ONE");
//! assert_eq!(map.get(&1), Some(&"one"));
//! assert_eq!(updated.get(&1), Some(&"ONE"));
//!
//! // Cursors can start anywhere
//! let tail: Vec<&i32> = map.iter_from(&2).map(|(key, _)| key).collect();
//! assert_eq!(tail, vec![&2, &3]);
//! ```
//!
//! ## `PersistentSortedSet`
//!
//! ```rust
//! use llrb_collections::persistent::PersistentSortedSet;
//!
//! let set: PersistentSortedSet<i32> = [3, 1, 2].into_iter().collect();
//! let smaller = set.remove(&2);
//!
//! assert_eq!(set.len(), 3);
//! assert_eq!(smaller.len(), 2);
//! assert_eq!(smaller.index_of(&3), Some(1));
//! ```

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`,
/// which is thread-safe but has slightly higher overhead.
///
/// When the `arc` feature is disabled (default), this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

mod error;
mod iterator;
mod node;
mod sorted_map;
mod sorted_set;
mod verify;

pub use error::InvariantViolation;
pub use iterator::SortedMapIntoIterator;
pub use iterator::SortedMapIterator;
pub use sorted_map::PersistentSortedMap;
pub use sorted_set::PersistentSortedSet;
pub use sorted_set::SortedSetIntoIterator;
pub use sorted_set::SortedSetIterator;

// =============================================================================
// Tests
// =============================================================================
