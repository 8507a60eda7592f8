//! Total orders used to arrange keys.
//!
//! Every sorted collection in this crate is constructed with a [`Comparator`].
//! The default is [`NaturalOrder`], which defers to the key's [`Ord`]
//! implementation. Any closure of the form `Fn(&T, &T) -> Ordering` is a
//! comparator as well, and [`Reversed`] flips an existing one.
//!
//! # Examples
//!
//! ```rust
//! use llrb_collections::comparator::{Comparator, NaturalOrder, Reversed};
//! use std::cmp::Ordering;
//!
//! assert_eq!(NaturalOrder.compare(&1, &2), Ordering::Less);
//! assert_eq!(Reversed(NaturalOrder).compare(&1, &2), Ordering::Greater);
//!
//! let by_length = |left: &&str, right: &&str| left.len().cmp(&right.len());
//! assert_eq!(by_length.compare(&"abc", &"de"), Ordering::Greater);
//! ```

use std::cmp::Ordering;

/// A total order over values of type `T`.
///
/// Implementations must be consistent: the order has to stay the same for
/// the lifetime of every collection that uses it, otherwise lookups return
/// arbitrary results.
pub trait Comparator<T: ?Sized> {
    /// Compares two values.
    fn compare(&self, left: &T, right: &T) -> Ordering;
}

/// Orders values by their [`Ord`] implementation.
///
/// Because `NaturalOrder` works for any `T: Ord`, maps using it can be
/// queried through borrowed key forms (for example `&str` for `String` keys).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct NaturalOrder;

impl<T: Ord + ?Sized> Comparator<T> for NaturalOrder {
    #[inline]
    fn compare(&self, left: &T, right: &T) -> Ordering {
        left.cmp(right)
    }
}

/// Reverses the order of the wrapped comparator.
///
/// # Examples
///
/// ```rust
/// use llrb_collections::comparator::{NaturalOrder, Reversed};
/// use llrb_collections::persistent::PersistentSortedMap;
///
/// let map = PersistentSortedMap::with_comparator(Reversed(NaturalOrder))
///     .insert(1, "one")
///     .insert(3, "three")
///     .insert(2, "two");
///
/// let keys: Vec<&i32> = map.keys().collect();
/// assert_eq!(keys, vec![&3, &2, &1]);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Reversed<C>(pub C);

impl<T: ?Sized, C: Comparator<T>> Comparator<T> for Reversed<C> {
    #[inline]
    fn compare(&self, left: &T, right: &T) -> Ordering {
        self.0.compare(right, left)
    }
}

impl<T: ?Sized, F> Comparator<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    #[inline]
    fn compare(&self, left: &T, right: &T) -> Ordering {
        self(left, right)
    }
}
