use std::{cmp::Ordering, fmt::Debug, marker::PhantomData, mem, ptr::NonNull};

use crate::{
    algo::{self, Location, NodePtr, Search},
    augment::{Augment, NoAugment},
    cmp::{Comparator, Natural},
    entry::{Entry, OccupiedEntry, VacantEntry},
    iter::{IntoIter, Iter},
    node::{Direction, Node},
};

/// An [`RbTree`] maps keys to values under a caller-supplied total order,
/// with worst-case logarithmic search, insertion and removal.
///
/// # Ordering
///
/// Keys are ordered by a [`Comparator`] value stored in the tree. The default
/// ([`Natural`]) delegates to `K: Ord`; a custom comparator can carry
/// whatever state the ordering needs (see [`CmpFn`] for lifting a plain
/// function).
///
/// # Augmentation
///
/// The tree is backed by a red-black tree whose nodes carry parent
/// back-pointers, and supports client-maintained per-subtree metadata: an
/// [`Augment`] implementation attaches a payload to every node and is called
/// back at fixed points during rebalancing so the payload can be kept
/// consistent with the subtree below it in O(log n) per mutation. Enabling
/// [`Augment::Size`] additionally maintains a per-node subtree element count.
///
/// # Node handles
///
/// Lookups can hand out [`Node`] borrows ([`get_node`]) that support in-order
/// navigation ([`Node::next`] / [`Node::prev`]) for the duration of the tree
/// borrow, or raw node pointers ([`find_node`]) that stay valid until that
/// node is removed or the tree is dropped or moved-from.
///
/// ```
/// use carmine::RbTree;
///
/// let mut t: RbTree<&str, usize> = RbTree::default();
///
/// t.insert("bananas", 42);
/// t.insert("platanos", 12);
///
/// assert_eq!(t.get(&"bananas"), Some(&42));
/// assert_eq!(t.len(), 2);
///
/// // In key order.
/// let names = t.iter().map(|(name, _count)| *name).collect::<Vec<_>>();
/// assert_eq!(names, ["bananas", "platanos"]);
/// ```
///
/// [`CmpFn`]: crate::CmpFn
/// [`get_node`]: RbTree::get_node
/// [`find_node`]: RbTree::find_node
pub struct RbTree<K, V, C = Natural, A = NoAugment>
where
    A: Augment<K, V>,
{
    root: Option<NodePtr<K, V, A>>,
    len: usize,
    cmp: C,
    aug: A,
    _marker: PhantomData<Box<Node<K, V, A>>>,
}

unsafe impl<K, V, C, A> Send for RbTree<K, V, C, A>
where
    K: Send,
    V: Send,
    C: Send,
    A: Augment<K, V> + Send,
    A::Payload: Send,
{
}

unsafe impl<K, V, C, A> Sync for RbTree<K, V, C, A>
where
    K: Sync,
    V: Sync,
    C: Sync,
    A: Augment<K, V> + Sync,
    A::Payload: Sync,
{
}

impl<K, V, C, A> Default for RbTree<K, V, C, A>
where
    C: Default,
    A: Augment<K, V> + Default,
{
    fn default() -> Self {
        Self::with_parts(C::default(), A::default())
    }
}

impl<K, V, C> RbTree<K, V, C, NoAugment> {
    /// Construct an empty tree ordered by `cmp`, without augmentation.
    pub fn with_comparator(cmp: C) -> Self {
        Self::with_parts(cmp, NoAugment)
    }
}

impl<K, V, A> RbTree<K, V, Natural, A>
where
    A: Augment<K, V>,
{
    /// Construct an empty, naturally-ordered tree with the given augmentation
    /// bundle.
    pub fn with_augment(aug: A) -> Self {
        Self::with_parts(Natural, aug)
    }
}

impl<K, V, C, A> RbTree<K, V, C, A>
where
    A: Augment<K, V>,
{
    /// Construct an empty tree from a comparator and an augmentation bundle.
    pub fn with_parts(cmp: C, aug: A) -> Self {
        Self {
            root: None,
            len: 0,
            cmp,
            aug,
            _marker: PhantomData,
        }
    }

    /// The number of entries in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the tree contains no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The root node, if any.
    ///
    /// The entry point for client-side structural traversals (augmentation
    /// readers, diagnostics).
    pub fn root(&self) -> Option<&Node<K, V, A>> {
        self.root.map(|r| unsafe { r.as_ref() })
    }

    /// The entry with the smallest key.
    pub fn min(&self) -> Option<(&K, &V)> {
        self.min_node().map(|n| (n.key(), n.value()))
    }

    /// The entry with the largest key.
    pub fn max(&self) -> Option<(&K, &V)> {
        self.max_node().map(|n| (n.key(), n.value()))
    }

    /// The node with the smallest key.
    pub fn min_node(&self) -> Option<&Node<K, V, A>> {
        self.root().map(Node::leftmost)
    }

    /// The node with the largest key.
    pub fn max_node(&self) -> Option<&Node<K, V, A>> {
        self.root().map(Node::rightmost)
    }

    /// Iterate over `(&key, &value)` tuples in key order.
    pub fn iter(&self) -> Iter<'_, K, V, A> {
        Iter::new(self.min_node(), self.len)
    }

    /// Yield the tree, leaving an empty one with the same comparator and
    /// augmentation behind. O(1).
    pub fn take(&mut self) -> Self
    where
        C: Clone,
        A: Clone,
    {
        Self {
            root: self.root.take(),
            len: mem::replace(&mut self.len, 0),
            cmp: self.cmp.clone(),
            aug: self.aug.clone(),
            _marker: PhantomData,
        }
    }

    /// Remove and free every entry.
    ///
    /// An iterative postorder walk (left chain, then right, then ascend), so
    /// teardown needs no stack proportional to the tree height. Augmentation
    /// hooks do not fire: the tree is discarded wholesale, not unlinked node
    /// by node.
    pub fn clear(&mut self) {
        let mut cur = self.root.take();
        self.len = 0;

        while let Some(n) = cur {
            let node = unsafe { n.as_ref() };

            if let Some(l) = node.child(Direction::Left) {
                cur = Some(l);
                continue;
            }
            if let Some(r) = node.child(Direction::Right) {
                cur = Some(r);
                continue;
            }

            // A leaf: detach it from its parent and release it.
            let parent = node.parent();
            if let (Some(mut p), Some(d)) = (parent, node.direction()) {
                unsafe { p.as_mut() }.set_child(d, None);
            }
            drop(unsafe { Box::from_raw(n.as_ptr()) });
            cur = parent;
        }
    }

    /// Allocate a node for `(key, value)` and link it into the slot named by
    /// `at` (the root slot when [`None`]).
    pub(crate) fn attach(
        &mut self,
        key: K,
        value: V,
        at: Option<Location<K, V, A>>,
    ) -> NodePtr<K, V, A> {
        let node = NonNull::from(Box::leak(Node::new(key, value)));

        match at {
            None => unsafe { algo::make_root(&mut self.root, &self.aug, node) },
            Some(at) => unsafe { algo::link_at(&mut self.root, &self.aug, node, at) },
        }
        self.len += 1;

        node
    }

    /// Unlink `node` from the tree and return its entry.
    ///
    /// Any raw pointer to `node` is invalidated; all other node pointers
    /// remain valid.
    ///
    /// # Safety
    ///
    /// `node` must be an element of this tree (obtained from
    /// [`find_node`](RbTree::find_node) or equivalent, and not removed
    /// since).
    pub unsafe fn remove_node(&mut self, node: NodePtr<K, V, A>) -> (K, V) {
        algo::remove(&mut self.root, &self.aug, node);
        self.len -= 1;

        Box::from_raw(node.as_ptr()).into_parts()
    }

    /// Remove `node`, returning its entry and the node holding the next
    /// greater key.
    ///
    /// The successor is resolved before the removal invalidates `node`'s
    /// links, making in-order destructive sweeps possible.
    ///
    /// # Safety
    ///
    /// As for [`remove_node`](RbTree::remove_node).
    pub unsafe fn remove_node_and_next(
        &mut self,
        node: NodePtr<K, V, A>,
    ) -> ((K, V), Option<NodePtr<K, V, A>>) {
        let next = node.as_ref().next().map(NonNull::from);
        (self.remove_node(node), next)
    }

    /// Remove `node`, returning its entry and the node holding the next
    /// smaller key.
    ///
    /// # Safety
    ///
    /// As for [`remove_node`](RbTree::remove_node).
    pub unsafe fn remove_node_and_prev(
        &mut self,
        node: NodePtr<K, V, A>,
    ) -> ((K, V), Option<NodePtr<K, V, A>>) {
        let prev = node.as_ref().prev().map(NonNull::from);
        (self.remove_node(node), prev)
    }
}

impl<K, V, C, A> RbTree<K, V, C, A>
where
    C: Comparator<K>,
    A: Augment<K, V>,
{
    fn find(&self, key: &K) -> Option<NodePtr<K, V, A>> {
        match unsafe { algo::search(self.root?, &self.cmp, key) } {
            Search::Found(n) => Some(n),
            Search::Vacant(_) => None,
        }
    }

    /// Return a reference to the value associated with `key`, if any.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.find(key).map(|n| unsafe { &*n.as_ptr() }.value())
    }

    /// Return a mutable reference to the value associated with `key`, if any.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.find(key).map(|n| unsafe { &mut *n.as_ptr() }.value_mut())
    }

    /// Return the stored key and value for `key`, if any.
    pub fn get_key_value(&self, key: &K) -> Option<(&K, &V)> {
        self.get_node(key).map(|n| (n.key(), n.value()))
    }

    /// Returns `true` if the tree contains a value for `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Return the node holding `key`, if any.
    ///
    /// The borrow supports in-order navigation: [`Node::next`] and
    /// [`Node::prev`] walk neighbouring entries without re-descending from
    /// the root.
    pub fn get_node(&self, key: &K) -> Option<&Node<K, V, A>> {
        self.find(key).map(|n| unsafe { &*n.as_ptr() })
    }

    /// Return a raw handle to the node holding `key`, if any.
    ///
    /// The pointer stays valid across unrelated mutations; it is invalidated
    /// by removal of that node, by [`take`](RbTree::take) or clone (the
    /// pointer then refers into the moved-from/source tree), and by drop.
    pub fn find_node(&self, key: &K) -> Option<NodePtr<K, V, A>> {
        self.find(key)
    }

    /// The node with the smallest key `>= key`, or [`None`] when every key
    /// is smaller.
    ///
    /// A single descent from the root.
    pub fn lower_bound_node(&self, key: &K) -> Option<&Node<K, V, A>> {
        let mut best = None;
        let mut cur = self.root;

        while let Some(n) = cur {
            let n = unsafe { n.as_ref() };
            match self.cmp.cmp(key, n.key()) {
                Ordering::Less => {
                    best = Some(n);
                    cur = n.child(Direction::Left);
                }
                Ordering::Equal => return Some(n),
                Ordering::Greater => cur = n.child(Direction::Right),
            }
        }

        best
    }

    /// The node with the largest key `<= key`, or [`None`] when every key is
    /// greater.
    ///
    /// A single descent from the root.
    pub fn upper_bound_node(&self, key: &K) -> Option<&Node<K, V, A>> {
        let mut best = None;
        let mut cur = self.root;

        while let Some(n) = cur {
            let n = unsafe { n.as_ref() };
            match self.cmp.cmp(key, n.key()) {
                Ordering::Greater => {
                    best = Some(n);
                    cur = n.child(Direction::Right);
                }
                Ordering::Equal => return Some(n),
                Ordering::Less => cur = n.child(Direction::Left),
            }
        }

        best
    }

    /// The entry with the smallest key `>= key`.
    pub fn lower_bound(&self, key: &K) -> Option<(&K, &V)> {
        self.lower_bound_node(key).map(|n| (n.key(), n.value()))
    }

    /// The entry with the largest key `<= key`.
    pub fn upper_bound(&self, key: &K) -> Option<(&K, &V)> {
        self.upper_bound_node(key).map(|n| (n.key(), n.value()))
    }

    /// Insert a `(key, value)` entry into the tree.
    ///
    /// If the key already existed, the value is replaced and the old value
    /// returned; the stored key is left untouched.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.root {
            None => {
                self.attach(key, value, None);
                None
            }
            Some(r) => match unsafe { algo::search(r, &self.cmp, &key) } {
                Search::Found(n) => Some(unsafe { &mut *n.as_ptr() }.replace_value(value)),
                Search::Vacant(at) => {
                    self.attach(key, value, Some(at));
                    None
                }
            },
        }
    }

    /// Insert an entry, replacing both the stored key and value when the key
    /// already existed, and returning the prior pair.
    ///
    /// Useful when keys carry data the comparator ignores (tie-break fields,
    /// provenance) that the caller wants refreshed. The new and old keys
    /// compare equal by construction, so the tree shape is untouched.
    pub fn replace(&mut self, key: K, value: V) -> Option<(K, V)> {
        match self.root {
            None => {
                self.attach(key, value, None);
                None
            }
            Some(r) => match unsafe { algo::search(r, &self.cmp, &key) } {
                Search::Found(n) => {
                    let n = unsafe { &mut *n.as_ptr() };
                    Some((n.replace_key(key), n.replace_value(value)))
                }
                Search::Vacant(at) => {
                    self.attach(key, value, Some(at));
                    None
                }
            },
        }
    }

    /// Gets the entry for `key` for in-place manipulation.
    ///
    /// A vacant entry remembers where the failed lookup ended, so inserting
    /// through it does not descend the tree again.
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, C, A> {
        match self.root {
            None => Entry::Vacant(VacantEntry::new(key, None, self)),
            Some(r) => match unsafe { algo::search(r, &self.cmp, &key) } {
                Search::Found(n) => Entry::Occupied(OccupiedEntry::new(n, self)),
                Search::Vacant(at) => Entry::Vacant(VacantEntry::new(key, Some(at), self)),
            },
        }
    }

    /// Remove the entry for `key`, returning its value.
    ///
    /// Returns [`None`] if `key` was not present in the tree.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|(_k, v)| v)
    }

    /// Remove the entry for `key`, returning the stored key and value.
    pub fn remove_entry(&mut self, key: &K) -> Option<(K, V)> {
        let node = self.find(key)?;
        Some(unsafe { self.remove_node(node) })
    }

    /// Structurally clone this tree under a replacement comparator and
    /// augmentation bundle.
    ///
    /// The copy is made by preorder duplication, not re-insertion: node
    /// colors, subtree sizes and augmentation payloads are carried over
    /// verbatim, so the clone is shape-identical and its payloads are valid
    /// without replaying any hooks.
    pub fn clone_with(&self, cmp: C, aug: A) -> Self
    where
        K: Clone,
        V: Clone,
        A::Payload: Clone,
    {
        let mut out = Self::with_parts(cmp, aug);
        let Some(src_root) = self.root else {
            return out;
        };

        unsafe {
            let dst_root = copy_node(src_root.as_ref());
            out.root = Some(dst_root);
            out.len = 1;

            // Preorder duplication: (source node, copied parent, slot). The
            // stack holds at most one pending sibling per level.
            let mut stack: Vec<(NodePtr<K, V, A>, NodePtr<K, V, A>, Direction)> = vec![];
            for dir in [Direction::Left, Direction::Right] {
                if let Some(c) = src_root.as_ref().child(dir) {
                    stack.push((c, dst_root, dir));
                }
            }

            while let Some((src, mut dst_parent, dir)) = stack.pop() {
                let mut dst = copy_node(src.as_ref());
                dst.as_mut()
                    .set_parent_and_color(Some(dst_parent), src.as_ref().color());
                dst_parent.as_mut().set_child(dir, Some(dst));
                out.len += 1;

                for dir in [Direction::Left, Direction::Right] {
                    if let Some(c) = src.as_ref().child(dir) {
                        stack.push((c, dst, dir));
                    }
                }
            }
        }

        debug_assert_eq!(out.len, self.len);
        out
    }
}

/// Duplicate a single node: key, value, payload, color and subtree size. The
/// copy starts unlinked.
fn copy_node<K, V, A>(src: &Node<K, V, A>) -> NodePtr<K, V, A>
where
    K: Clone,
    V: Clone,
    A: Augment<K, V>,
    A::Payload: Clone,
{
    let mut n = NonNull::from(Box::leak(Node::new(src.key().clone(), src.value().clone())));

    unsafe {
        n.as_mut().set_parent_and_color(None, src.color());
        n.as_mut().set_subtree_size(src.subtree_size());
        n.as_mut().set_payload(src.payload().clone());
    }

    n
}

impl<K, V, C, A> Clone for RbTree<K, V, C, A>
where
    K: Clone,
    V: Clone,
    C: Comparator<K> + Clone,
    A: Augment<K, V> + Clone,
    A::Payload: Clone,
{
    fn clone(&self) -> Self {
        self.clone_with(self.cmp.clone(), self.aug.clone())
    }
}

impl<K, V, C, A> Drop for RbTree<K, V, C, A>
where
    A: Augment<K, V>,
{
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K, V, C, A> Debug for RbTree<K, V, C, A>
where
    K: Debug,
    V: Debug,
    A: Augment<K, V>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Take ownership of this [`RbTree`] instance and iterate over all
/// `(key, value)` tuples stored in it, in key order.
impl<K, V, C, A> IntoIterator for RbTree<K, V, C, A>
where
    A: Augment<K, V>,
{
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, A>;

    fn into_iter(mut self) -> Self::IntoIter {
        let root = self.root.take();
        let len = mem::replace(&mut self.len, 0);

        IntoIter::new(root, len)
    }
}

impl<'a, K, V, C, A> IntoIterator for &'a RbTree<K, V, C, A>
where
    A: Augment<K, V>,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, A>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
