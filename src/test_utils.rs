use std::{cell::Cell, ptr::NonNull};

use proptest::prelude::*;

use crate::{
    augment::Augment,
    cmp::Natural,
    node::{Direction, Node},
    tree::RbTree,
};

const KEY_MAX: i64 = 100;

/// Generate keys from a deliberately small domain so that randomized
/// operations collide on the same keys.
pub(crate) fn arbitrary_key() -> impl Strategy<Value = i64> {
    -KEY_MAX..KEY_MAX
}

/// Linear-feedback shift register based PRNG.
///
/// Generates 65,535 unique values before cycling.
#[derive(Debug, Clone)]
pub(crate) struct Lfsr(u16);

impl Default for Lfsr {
    fn default() -> Self {
        Self(42)
    }
}

impl Lfsr {
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> u16 {
        let lsb = self.0 & 1;
        self.0 >>= 1;
        if lsb == 1 {
            self.0 ^= 0xD008;
        }
        assert_ne!(self.0, 42, "LFSR rollover");
        self.0
    }
}

/// An augmentation maintaining, in every node, the maximum key of the
/// subtree rooted at that node.
///
/// Rotations recompute the two repositioned nodes locally (their combined
/// subtree holds the same key set, so nothing above changes); links, swaps
/// and unlinks recompute the ancestor chain.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SubtreeMax;

type MaxNode = Node<i64, usize, SubtreeMax>;

impl Augment<i64, usize> for SubtreeMax {
    type Payload = Cell<i64>;
    type Size = ();

    fn after_link(&self, node: NonNull<MaxNode>) {
        unsafe {
            recompute(node, None);
            ascend(node.as_ref().parent(), None);
        }
    }

    fn after_rotate(&self, old: NonNull<MaxNode>, new: NonNull<MaxNode>, _dir: Direction) {
        unsafe {
            recompute(old, None);
            recompute(new, None);
        }
    }

    fn after_swap(&self, deep: NonNull<MaxNode>, _shallow: NonNull<MaxNode>) {
        // The keys moved with the nodes, so every aggregate from the deep
        // position to the root (through the shallow one) is stale.
        unsafe {
            recompute(deep, None);
            ascend(deep.as_ref().parent(), None);
        }
    }

    fn before_unlink(&self, node: NonNull<MaxNode>) {
        // The node is still linked: recompute the ancestors as if it were
        // already gone.
        unsafe { ascend(node.as_ref().parent(), Some(node)) }
    }
}

/// Recompute the max of `n` from its key and child payloads, ignoring the
/// child `skip` (if any).
unsafe fn recompute(n: NonNull<MaxNode>, skip: Option<NonNull<MaxNode>>) {
    let node = n.as_ref();
    let mut max = *node.key();

    for dir in [Direction::Left, Direction::Right] {
        match node.child(dir) {
            Some(c) if Some(c) != skip => max = max.max(c.as_ref().payload().get()),
            _ => {}
        }
    }

    node.payload().set(max);
}

unsafe fn ascend(mut cur: Option<NonNull<MaxNode>>, skip: Option<NonNull<MaxNode>>) {
    while let Some(n) = cur {
        recompute(n, skip);
        cur = n.as_ref().parent();
    }
}

/// Assert every node's payload equals the true maximum key of its subtree,
/// computed independently.
pub(crate) fn check_subtree_max(t: &RbTree<i64, usize, Natural, SubtreeMax>) {
    fn walk(n: &MaxNode) -> i64 {
        let mut max = *n.key();
        if let Some(l) = n.left() {
            max = max.max(walk(l));
        }
        if let Some(r) = n.right() {
            max = max.max(walk(r));
        }

        assert_eq!(n.payload().get(), max, "stale subtree max at {}", n.key());
        max
    }

    if let Some(root) = t.root() {
        walk(root);
    }
}
