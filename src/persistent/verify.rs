//! Structural self-checks for the red-black tree.

use super::InvariantViolation;
use super::node::{Link, is_red, size};
use crate::comparator::Comparator;
use std::cmp::Ordering;

/// Verifies every invariant below `root` and returns its black height.
///
/// The root itself must be black; ordering is checked with `comparator`.
pub(crate) fn check<K, V, C>(root: &Link<K, V>, comparator: &C) -> Result<usize, InvariantViolation>
where
    C: Comparator<K> + ?Sized,
{
    if is_red(root) {
        return Err(InvariantViolation::RedRoot);
    }
    let black_height = check_shape(root, 0)?;
    check_order(root, comparator)?;
    Ok(black_height)
}

/// Checks `2^black_height <= len + 1`, the depth bound of a red-black tree.
pub(crate) fn check_max_depth<K, V, C>(
    root: &Link<K, V>,
    comparator: &C,
) -> Result<(), InvariantViolation>
where
    C: Comparator<K> + ?Sized,
{
    let black_height = check(root, comparator)?;
    let len = size(root);
    let within_bound = u32::try_from(black_height)
        .ok()
        .and_then(|exponent| 2usize.checked_pow(exponent))
        .is_some_and(|bound| bound <= len + 1);
    if within_bound {
        Ok(())
    } else {
        Err(InvariantViolation::DepthExceeded { black_height, len })
    }
}

fn check_shape<K, V>(link: &Link<K, V>, depth: usize) -> Result<usize, InvariantViolation> {
    let Some(node) = link else {
        return Ok(0);
    };

    if node.is_red() && is_red(&node.left) {
        return Err(InvariantViolation::RedLeftChain { depth });
    }
    if is_red(&node.right) {
        return Err(InvariantViolation::RightLeaningRed { depth });
    }

    let expected = 1 + size(&node.left) + size(&node.right);
    if node.size != expected {
        return Err(InvariantViolation::SizeMismatch {
            depth,
            expected,
            actual: node.size,
        });
    }

    let left = check_shape(&node.left, depth + 1)?;
    let right = check_shape(&node.right, depth + 1)?;
    if left != right {
        return Err(InvariantViolation::BlackHeightMismatch { left, right });
    }

    Ok(left + usize::from(!node.is_red()))
}

fn check_order<K, V, C>(root: &Link<K, V>, comparator: &C) -> Result<(), InvariantViolation>
where
    C: Comparator<K> + ?Sized,
{
    let mut stack = Vec::new();
    let mut current = root.as_ref();
    let mut previous: Option<&K> = None;
    let mut position = 0;

    loop {
        while let Some(node) = current {
            stack.push(node);
            current = node.left.as_ref();
        }
        let Some(node) = stack.pop() else {
            return Ok(());
        };
        if let Some(previous_key) = previous
            && comparator.compare(previous_key, &node.key) != Ordering::Less
        {
            return Err(InvariantViolation::OutOfOrder { position });
        }
        previous = Some(&node.key);
        position += 1;
        current = node.right.as_ref();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::NaturalOrder;
    use crate::persistent::node::{Color, Node, share};
    use rstest::rstest;

    fn leaf(key: i32, color: Color) -> Link<i32, ()> {
        Some(share(Node {
            key,
            value: (),
            color,
            left: None,
            right: None,
            size: 1,
        }))
    }

    fn branch(key: i32, color: Color, left: Link<i32, ()>, right: Link<i32, ()>) -> Link<i32, ()> {
        let size = 1 + size(&left) + size(&right);
        Some(share(Node {
            key,
            value: (),
            color,
            left,
            right,
            size,
        }))
    }

    #[rstest]
    fn test_empty_tree_has_black_height_zero() {
        let root: Link<i32, ()> = None;
        assert_eq!(check(&root, &NaturalOrder), Ok(0));
        assert_eq!(check_max_depth(&root, &NaturalOrder), Ok(()));
    }

    #[rstest]
    fn test_valid_tree() {
        let root = branch(2, Color::Black, leaf(1, Color::Red), None);
        assert_eq!(check(&root, &NaturalOrder), Ok(1));
        assert_eq!(check_max_depth(&root, &NaturalOrder), Ok(()));
    }

    #[rstest]
    fn test_black_height_mismatch_is_rejected() {
        let root = branch(
            2,
            Color::Black,
            leaf(1, Color::Red),
            leaf(3, Color::Black),
        );
        assert_eq!(
            check(&root, &NaturalOrder),
            Err(InvariantViolation::BlackHeightMismatch { left: 0, right: 1 })
        );
    }

    #[rstest]
    fn test_red_root_is_rejected() {
        let root = leaf(1, Color::Red);
        assert_eq!(
            check(&root, &NaturalOrder),
            Err(InvariantViolation::RedRoot)
        );
    }

    #[rstest]
    fn test_right_leaning_red_is_rejected() {
        let root = branch(1, Color::Black, None, leaf(2, Color::Red));
        assert_eq!(
            check(&root, &NaturalOrder),
            Err(InvariantViolation::RightLeaningRed { depth: 0 })
        );
    }

    #[rstest]
    fn test_red_left_chain_is_rejected() {
        let root = branch(
            3,
            Color::Black,
            branch(2, Color::Red, leaf(1, Color::Red), None),
            None,
        );
        assert_eq!(
            check(&root, &NaturalOrder),
            Err(InvariantViolation::RedLeftChain { depth: 1 })
        );
    }

    #[rstest]
    fn test_size_mismatch_is_rejected() {
        let root = Some(share(Node {
            key: 2,
            value: (),
            color: Color::Black,
            left: leaf(1, Color::Red),
            right: None,
            size: 7,
        }));
        assert_eq!(
            check(&root, &NaturalOrder),
            Err(InvariantViolation::SizeMismatch {
                depth: 0,
                expected: 2,
                actual: 7
            })
        );
    }

    #[rstest]
    fn test_out_of_order_keys_are_rejected() {
        let root = branch(1, Color::Black, leaf(2, Color::Red), None);
        assert_eq!(
            check(&root, &NaturalOrder),
            Err(InvariantViolation::OutOfOrder { position: 1 })
        );
    }

    #[rstest]
    fn test_perfect_black_tree_meets_depth_bound() {
        let tall = branch(
            4,
            Color::Black,
            branch(2, Color::Black, leaf(1, Color::Black), leaf(3, Color::Black)),
            branch(6, Color::Black, leaf(5, Color::Black), leaf(7, Color::Black)),
        );
        assert_eq!(check(&tall, &NaturalOrder), Ok(3));
        assert_eq!(check_max_depth(&tall, &NaturalOrder), Ok(()));
    }
}
