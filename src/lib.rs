//! # llrb-collections
//!
//! Persistent sorted collections backed by a left-leaning red-black tree.
//!
//! ## Overview
//!
//! Every collection in this crate is immutable: `insert` and `remove` return
//! a new version and leave the old one untouched, sharing every subtree the
//! operation did not touch. Holding on to an old version is therefore a
//! cheap snapshot.
//!
//! - **Persistent collections**: [`PersistentSortedMap`](persistent::PersistentSortedMap),
//!   [`PersistentSortedSet`](persistent::PersistentSortedSet)
//! - **Comparators**: natural, reversed or closure-defined total orders
//! - **Cursors**: lazy, explicit-stack iterators that can start at any key
//! - **Self-checks**: invariant verification returning typed errors
//!
//! ## Feature Flags
//!
//! - `arc`: share nodes through `Arc` so snapshots are `Send + Sync`
//! - `serde`: `Serialize`/`Deserialize` implementations
//! - `full`: Enable all features
//!
//! ## Example
//!
//! ```rust
//! use llrb_collections::prelude::*;
//!
//! let scores = PersistentSortedMap::new()
//!     .insert("carol", 71)
//!     .insert("alice", 93)
//!     .insert("bob", 88);
//!
//! let snapshot = scores.clone();
//! let updated = scores.insert("dave", 64).remove("alice");
//!
//! assert_eq!(snapshot.len(), 3);
//! assert_eq!(updated.min_key(), Some(&"bob"));
//! assert_eq!(updated.index_of("dave"), Some(2));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// Re-exports commonly used types and traits.
///
/// # Usage
///
/// ```rust
/// use llrb_collections::prelude::*;
/// ```
pub mod prelude {
    pub use crate::comparator::*;
    pub use crate::persistent::*;
}

pub mod comparator;
pub mod persistent;
