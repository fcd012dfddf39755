//! Structural red-black tree operations over an externally owned root slot.
//!
//! Nothing in this module allocates or frees: callers own the nodes and the
//! root pointer, and every function here only rewires parent/child/color
//! state. Augmentation hooks fire after each described mutation completes,
//! at which point all affected parent, child and color fields are
//! consistent and the hook may read from the tree.

use std::{cmp::Ordering, ptr::NonNull};

use crate::{
    augment::{Augment, Count},
    cmp::Comparator,
    node::{Color, Direction, Node},
};

pub(crate) type NodePtr<K, V, A> = NonNull<Node<K, V, A>>;

/// A null child slot into which a new node can be linked while preserving
/// search order: the `dir` child of `parent`.
#[derive(Debug)]
pub(crate) struct Location<K, V, A>
where
    A: Augment<K, V>,
{
    pub(crate) parent: NodePtr<K, V, A>,
    pub(crate) dir: Direction,
}

/// The outcome of descending a non-empty tree for a key: the matching node,
/// or the slot where a node with that key belongs.
#[derive(Debug)]
pub(crate) enum Search<K, V, A>
where
    A: Augment<K, V>,
{
    Found(NodePtr<K, V, A>),
    Vacant(Location<K, V, A>),
}

/// Returns `true` if `n` is a red node. Absent nodes are black.
#[inline]
pub(crate) fn is_red<K, V, A>(n: Option<NodePtr<K, V, A>>) -> bool
where
    A: Augment<K, V>,
{
    n.map_or(false, |n| unsafe { n.as_ref() }.color().is_red())
}

/// Descend from `root` looking for `key`.
///
/// A single descent: O(height) comparisons, no mutation.
pub(crate) unsafe fn search<K, V, A, C>(
    root: NodePtr<K, V, A>,
    cmp: &C,
    key: &K,
) -> Search<K, V, A>
where
    A: Augment<K, V>,
    C: Comparator<K>,
{
    let mut cur = root;

    loop {
        let n = cur.as_ref();
        let dir = match cmp.cmp(key, n.key()) {
            Ordering::Less => Direction::Left,
            Ordering::Equal => return Search::Found(cur),
            Ordering::Greater => Direction::Right,
        };

        match n.child(dir) {
            Some(c) => cur = c,
            None => return Search::Vacant(Location { parent: cur, dir }),
        }
    }
}

/// Attach `node` as the sole node of an empty tree.
pub(crate) unsafe fn make_root<K, V, A>(
    root: &mut Option<NodePtr<K, V, A>>,
    aug: &A,
    mut node: NodePtr<K, V, A>,
) where
    A: Augment<K, V>,
{
    debug_assert!(root.is_none());

    {
        let n = node.as_mut();
        n.set_parent_and_color(None, Color::Black);
        n.set_child(Direction::Left, None);
        n.set_child(Direction::Right, None);
        n.set_subtree_size(1);
    }

    *root = Some(node);

    aug.after_link(node);
}

/// Link `node` into the null slot named by `at`, then restore the red-black
/// invariants.
pub(crate) unsafe fn link_at<K, V, A>(
    root: &mut Option<NodePtr<K, V, A>>,
    aug: &A,
    mut node: NodePtr<K, V, A>,
    at: Location<K, V, A>,
) where
    A: Augment<K, V>,
{
    let Location { parent: mut p, dir } = at;
    debug_assert!(p.as_ref().child(dir).is_none());

    {
        let n = node.as_mut();
        n.set_parent_and_color(Some(p), Color::Red);
        n.set_child(Direction::Left, None);
        n.set_child(Direction::Right, None);
        n.set_subtree_size(1);
    }
    p.as_mut().set_child(dir, Some(node));

    shift_sizes(Some(p), 1);

    aug.after_link(node);

    insert_fixup(root, aug, node);
}

/// Walk upward from the newly linked red `node`, clearing any red-red edge.
unsafe fn insert_fixup<K, V, A>(
    root: &mut Option<NodePtr<K, V, A>>,
    aug: &A,
    mut node: NodePtr<K, V, A>,
) where
    A: Augment<K, V>,
{
    loop {
        let Some(mut parent) = node.as_ref().parent() else {
            break;
        };
        if parent.as_ref().color().is_black() {
            break;
        }

        let Some(mut grand) = parent.as_ref().parent() else {
            // The red parent is the root: repainting it black clears the
            // red-red edge and adds one black node to every path alike.
            parent.as_mut().set_color(Color::Black);
            aug.after_recolor(&[parent]);
            break;
        };

        let pdir = parent.as_ref().direction().unwrap();
        let uncle = grand.as_ref().child(pdir.invert());

        if is_red(uncle) {
            // Red uncle: push the grandparent's blackness down one level and
            // continue the repair from it.
            let mut uncle = uncle.unwrap();
            parent.as_mut().set_color(Color::Black);
            uncle.as_mut().set_color(Color::Black);
            grand.as_mut().set_color(Color::Red);
            aug.after_recolor(&[parent, uncle, grand]);

            node = grand;
            continue;
        }

        // Black (or absent) uncle: one or two rotations terminate the
        // repair.
        if node.as_ref().direction().unwrap() != pdir {
            // The node sits on the opposite side of its parent from the
            // parent's own side: rotate the pair into line first. The two
            // swap generational roles in the process.
            rotate(root, parent, pdir);
            aug.after_rotate(parent, node, pdir);
            (node, parent) = (parent, node);
        }

        rotate(root, grand, pdir.invert());
        aug.after_rotate(grand, parent, pdir.invert());

        parent.as_mut().set_color(Color::Black);
        grand.as_mut().set_color(Color::Red);
        aug.after_recolor(&[parent, grand]);
        break;
    }

    // A red-uncle cascade terminating at the root leaves it red; repaint so
    // the root is black whenever control returns to the caller.
    if let Some(mut r) = *root {
        if r.as_ref().color().is_red() {
            r.as_mut().set_color(Color::Black);
            aug.after_recolor(&[r]);
        }
    }
}

/// Rotate the subtree rooted at `n` in direction `dir`.
///
/// `n`'s child opposite the rotation direction takes `n`'s position
/// (updating the root slot when `n` was the root), `n` becomes its `dir`
/// child, and the displaced inner grandchild reattaches under `n`. Subtree
/// sizes are recomputed for the two repositioned nodes.
///
/// Returns the new subtree root. Does NOT emit `after_rotate` — callers do,
/// which lets deletion fixups capture pre-rotation state first.
///
/// # Panics
///
/// Panics if `n` has no child opposite the rotation direction.
pub(crate) unsafe fn rotate<K, V, A>(
    root: &mut Option<NodePtr<K, V, A>>,
    mut n: NodePtr<K, V, A>,
    dir: Direction,
) -> NodePtr<K, V, A>
where
    A: Augment<K, V>,
{
    let mut r = n.as_ref().child(dir.invert()).unwrap();
    let inner = r.as_ref().child(dir);

    // The inner grandchild moves to n's vacated child slot.
    n.as_mut().set_child(dir.invert(), inner);
    if let Some(mut inner) = inner {
        inner.as_mut().set_parent(Some(n));
    }

    // r takes n's position under n's parent (or in the root slot).
    let parent = n.as_ref().parent();
    let n_dir = n.as_ref().direction();
    r.as_mut().set_parent(parent);
    match n_dir {
        Some(d) => parent.unwrap().as_mut().set_child(d, Some(r)),
        None => *root = Some(r),
    }

    // n descends under r.
    r.as_mut().set_child(dir, Some(n));
    n.as_mut().set_parent(Some(r));

    // Bottom-up: n's subtree is now contained in r's.
    n.as_mut().update_subtree_size();
    r.as_mut().update_subtree_size();

    r
}

/// Exchange the tree positions of two distinct nodes.
///
/// Position means parent link, child links, color and subtree size; keys,
/// values and payloads stay with their nodes, so the tree is out of search
/// order until the caller completes the removal this serves. Handles the
/// adjacent case (one node the parent of the other) by fixing the
/// self-referential link.
pub(crate) unsafe fn swap_positions<K, V, A>(
    root: &mut Option<NodePtr<K, V, A>>,
    a: NodePtr<K, V, A>,
    b: NodePtr<K, V, A>,
) where
    A: Augment<K, V>,
{
    debug_assert_ne!(a, b);

    // Normalize adjacency so that `a` is the parent when the two are
    // parent and child.
    let (mut a, mut b) = if a.as_ref().parent() == Some(b) {
        (b, a)
    } else {
        (a, b)
    };

    let a_parent = a.as_ref().parent();
    let a_dir = a.as_ref().direction();
    let a_color = a.as_ref().color();
    let a_children = [
        a.as_ref().child(Direction::Left),
        a.as_ref().child(Direction::Right),
    ];
    let a_size = a.as_ref().subtree_size();

    let b_parent = b.as_ref().parent();
    let b_dir = b.as_ref().direction();
    let b_color = b.as_ref().color();
    let b_children = [
        b.as_ref().child(Direction::Left),
        b.as_ref().child(Direction::Right),
    ];
    let b_size = b.as_ref().subtree_size();

    let adjacent = b_parent == Some(a);

    // b takes a's position.
    b.as_mut().set_parent_and_color(a_parent, a_color);
    match a_dir {
        Some(d) => a_parent.unwrap().as_mut().set_child(d, Some(b)),
        None => *root = Some(b),
    }
    for dir in [Direction::Left, Direction::Right] {
        // a's former children hang under b; the slot that held b itself now
        // holds a.
        let c = a_children[dir as usize];
        let c = if c == Some(b) { Some(a) } else { c };
        b.as_mut().set_child(dir, c);
        if let Some(mut c) = c {
            c.as_mut().set_parent(Some(b));
        }
    }
    b.as_mut().set_subtree_size(a_size);

    // a takes b's position. When the two were adjacent, b's former parent
    // is a itself; the external edge was already rewired by the child loop
    // above.
    let a_new_parent = if adjacent { Some(b) } else { b_parent };
    a.as_mut().set_parent_and_color(a_new_parent, b_color);
    if !adjacent {
        match b_dir {
            Some(d) => b_parent.unwrap().as_mut().set_child(d, Some(a)),
            None => *root = Some(a),
        }
    }
    for dir in [Direction::Left, Direction::Right] {
        let c = b_children[dir as usize];
        debug_assert_ne!(c, Some(a));
        a.as_mut().set_child(dir, c);
        if let Some(mut c) = c {
            c.as_mut().set_parent(Some(a));
        }
    }
    a.as_mut().set_subtree_size(b_size);
}

/// Detach `node` from the tree and restore the red-black invariants.
///
/// The node is first swapped to the bottom of the tree (with its in-order
/// successor, and again with any remaining red leaf child) until it is a
/// leaf, then unlinked. A black leaf leaves a black-height deficit behind
/// that is repaired walking upward.
///
/// The caller frees the node's memory after this returns.
pub(crate) unsafe fn remove<K, V, A>(
    root: &mut Option<NodePtr<K, V, A>>,
    aug: &A,
    mut node: NodePtr<K, V, A>,
) where
    A: Augment<K, V>,
{
    // Reduce to removing a leaf.
    if let Some(right) = node.as_ref().child(Direction::Right) {
        // Swap with the in-order successor: the leftmost node of the right
        // subtree, which has no left child.
        let succ = NonNull::from(right.as_ref().extreme(Direction::Left));
        swap_positions(root, node, succ);
        aug.after_swap(node, succ);

        // The vacated position may still hold a right child; the equal
        // black-height invariant forces it to be a red leaf.
        if let Some(child) = node.as_ref().child(Direction::Right) {
            debug_assert!(child.as_ref().color().is_red());
            swap_positions(root, node, child);
            aug.after_swap(node, child);
        }
    } else if let Some(child) = node.as_ref().child(Direction::Left) {
        // A lone left child must likewise be a red leaf.
        debug_assert!(child.as_ref().color().is_red());
        swap_positions(root, node, child);
        aug.after_swap(node, child);
    }

    debug_assert!(node.as_ref().child(Direction::Left).is_none());
    debug_assert!(node.as_ref().child(Direction::Right).is_none());

    aug.before_unlink(node);

    match node.as_ref().parent() {
        None => *root = None,
        Some(mut parent) => {
            let dir = node.as_ref().direction().unwrap();
            let deficit = node.as_ref().color().is_black();

            parent.as_mut().set_child(dir, None);
            node.as_mut().set_parent(None);
            shift_sizes(Some(parent), -1);

            if deficit {
                remove_fixup(root, aug, parent, dir);
            }
        }
    }

    aug.after_unlink(node);
}

/// Repair a one-black-node deficit in the `dir` subtree of `parent`.
unsafe fn remove_fixup<K, V, A>(
    root: &mut Option<NodePtr<K, V, A>>,
    aug: &A,
    mut parent: NodePtr<K, V, A>,
    mut dir: Direction,
) where
    A: Augment<K, V>,
{
    loop {
        // The deficit side is one black node short, so the sibling side is
        // non-empty.
        let mut sibling = parent.as_ref().child(dir.invert()).unwrap();

        if sibling.as_ref().color().is_red() {
            // Red sibling: rotate it above the parent to expose a black
            // sibling (the former close nephew) for the cases below.
            rotate(root, parent, dir);
            aug.after_rotate(parent, sibling, dir);
            sibling.as_mut().set_color(Color::Black);
            parent.as_mut().set_color(Color::Red);
            aug.after_recolor(&[sibling, parent]);

            sibling = parent.as_ref().child(dir.invert()).unwrap();
        }

        // The sibling is black from here on.
        let close = sibling.as_ref().child(dir);
        let distant = sibling.as_ref().child(dir.invert());

        if !is_red(close) && !is_red(distant) {
            // Both nephews black: remove one black node from the sibling
            // side to even the two subtrees out.
            sibling.as_mut().set_color(Color::Red);

            if parent.as_ref().color().is_red() {
                // The parent absorbs the missing blackness.
                parent.as_mut().set_color(Color::Black);
                aug.after_recolor(&[sibling, parent]);
                return;
            }
            aug.after_recolor(&[sibling]);

            // The whole subtree at parent is now one black node short;
            // ascend and repeat.
            match parent.as_ref().direction() {
                Some(d) => {
                    dir = d;
                    parent = parent.as_ref().parent().unwrap();
                }
                // The deficit reached the root: every path shortened by one
                // black node, so the tree is balanced again.
                None => return,
            }
            continue;
        }

        if !is_red(distant) {
            // Red close nephew, black distant nephew: rotate the sibling
            // away so the close nephew becomes a black sibling with a red
            // distant child.
            let mut close = close.unwrap();
            rotate(root, sibling, dir.invert());
            aug.after_rotate(sibling, close, dir.invert());
            sibling.as_mut().set_color(Color::Red);
            close.as_mut().set_color(Color::Black);
            aug.after_recolor(&[sibling, close]);

            sibling = close;
        }

        // Red distant nephew: rotating the sibling above the parent and
        // repainting settles the deficit.
        let mut distant = sibling.as_ref().child(dir.invert()).unwrap();
        let parent_color = parent.as_ref().color();
        rotate(root, parent, dir);
        aug.after_rotate(parent, sibling, dir);
        sibling.as_mut().set_color(parent_color);
        parent.as_mut().set_color(Color::Black);
        distant.as_mut().set_color(Color::Black);
        aug.after_recolor(&[sibling, parent, distant]);
        return;
    }
}

/// Add `delta` to the subtree size of every node from `from` to the root.
///
/// No-op (and compiled out) when size tracking is disabled.
unsafe fn shift_sizes<K, V, A>(mut from: Option<NodePtr<K, V, A>>, delta: isize)
where
    A: Augment<K, V>,
{
    if !A::Size::TRACKED {
        return;
    }

    while let Some(mut n) = from {
        let size = (n.as_ref().subtree_size() as isize + delta) as usize;
        n.as_mut().set_subtree_size(size);
        from = n.as_ref().parent();
    }
}
