use std::ptr::NonNull;

use crate::node::{Direction, Node};

/// Subtree element counting, enabled per tree instantiation through
/// [`Augment::Size`].
///
/// `usize` tracks the number of elements in every node's subtree; `()`
/// disables tracking and occupies no space in the node.
pub trait Count: Copy + Default {
    const TRACKED: bool;

    fn one() -> Self;
    fn get(self) -> usize;
    fn set(&mut self, n: usize);
}

impl Count for () {
    const TRACKED: bool = false;

    #[inline]
    fn one() -> Self {}

    #[inline]
    fn get(self) -> usize {
        0
    }

    #[inline]
    fn set(&mut self, _n: usize) {}
}

impl Count for usize {
    const TRACKED: bool = true;

    #[inline]
    fn one() -> Self {
        1
    }

    #[inline]
    fn get(self) -> usize {
        self
    }

    #[inline]
    fn set(&mut self, n: usize) {
        *self = n;
    }
}

/// Per-subtree metadata maintained through structural mutation.
///
/// An implementation attaches a [`Payload`] to every node and is invoked at
/// fixed points during insertion and removal so it can restore any invariant
/// computable from `(node, left subtree, right subtree)` — a subtree maximum,
/// an order-statistic count, interval endpoints.
///
/// Every hook fires *after* the structural mutation it refers to is complete:
/// parent, child and color fields are consistent when a hook runs, so hooks
/// may read from the tree freely. Hooks must not structurally mutate the tree
/// they are observing.
///
/// | Hook | When |
/// |---|---|
/// | [`after_link`] | a new node was attached (as root or leaf), before any fixup |
/// | [`after_rotate`] | a rotation completed (old and new subtree roots) |
/// | [`after_recolor`] | one or more node colors were overwritten during fixup |
/// | [`after_swap`] | two nodes exchanged tree positions during removal |
/// | [`before_unlink`] | the removed node is about to be detached (still a linked leaf) |
/// | [`after_unlink`] | the removed node is no longer reachable from the tree |
///
/// All methods default to no-ops; implement only the ones the payload needs.
/// The tree never reads a payload — it is opaque, client-owned state.
///
/// Hook arguments are raw node pointers: dereferencing them is `unsafe`, and
/// sound for the duration of the hook because the tree is consistent and no
/// aliasing references exist while hooks run.
///
/// [`Payload`]: Augment::Payload
/// [`after_link`]: Augment::after_link
/// [`after_rotate`]: Augment::after_rotate
/// [`after_recolor`]: Augment::after_recolor
/// [`after_swap`]: Augment::after_swap
/// [`before_unlink`]: Augment::before_unlink
/// [`after_unlink`]: Augment::after_unlink
pub trait Augment<K, V>: Sized {
    /// Client metadata stored in every node.
    type Payload: Default;

    /// Subtree-size tracking: `usize` to maintain a per-node element count
    /// through every mutation, `()` to disable.
    type Size: Count;

    /// `new` took over `old`'s position; `old` is now `new`'s child in the
    /// rotation direction `dir`. Subtree sizes (when tracked) have already
    /// been recomputed for both.
    fn after_rotate(
        &self,
        old: NonNull<Node<K, V, Self>>,
        new: NonNull<Node<K, V, Self>>,
        dir: Direction,
    ) {
        let _ = (old, new, dir);
    }

    /// `deep` and `shallow` exchanged tree positions during removal. Keys,
    /// values and payloads stayed with their nodes, so `deep` (the node being
    /// removed) now sits out of key order at `shallow`'s former position.
    fn after_swap(&self, deep: NonNull<Node<K, V, Self>>, shallow: NonNull<Node<K, V, Self>>) {
        let _ = (deep, shallow);
    }

    /// `node` was linked into the tree. Rebalancing may not have happened
    /// yet; the node's payload is `Payload::default()`.
    fn after_link(&self, node: NonNull<Node<K, V, Self>>) {
        let _ = node;
    }

    /// The colors of `nodes` were overwritten by one fixup case action.
    fn after_recolor(&self, nodes: &[NonNull<Node<K, V, Self>>]) {
        let _ = nodes;
    }

    /// `node` is about to be detached. It is still linked and is a leaf.
    fn before_unlink(&self, node: NonNull<Node<K, V, Self>>) {
        let _ = node;
    }

    /// `node` is no longer reachable from the tree. Its memory is released
    /// by the container after this hook returns.
    fn after_unlink(&self, node: NonNull<Node<K, V, Self>>) {
        let _ = node;
    }
}

/// The default bundle: no payload, no subtree counting, no-op hooks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoAugment;

impl<K, V> Augment<K, V> for NoAugment {
    type Payload = ();
    type Size = ();
}

/// Subtree-size tracking with no client payload.
///
/// Every node carries the element count of its subtree, maintained in O(1)
/// per rebalancing step. The basis for order-statistic queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counted;

impl<K, V> Augment<K, V> for Counted {
    type Payload = ();
    type Size = usize;
}
