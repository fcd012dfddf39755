use std::{fmt::Debug, ptr::NonNull};

use crate::augment::{Augment, Count, NoAugment};

/// A node color.
///
/// The numeric values matter when `packed-links` is enabled: the color is
/// stored in the low bit of the parent word (0 = red, 1 = black).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red = 0,
    Black = 1,
}

impl Color {
    /// Returns `true` if the color is [`Red`].
    ///
    /// [`Red`]: Color::Red
    #[inline]
    #[must_use]
    pub fn is_red(self) -> bool {
        matches!(self, Self::Red)
    }

    /// Returns `true` if the color is [`Black`].
    ///
    /// [`Black`]: Color::Black
    #[inline]
    #[must_use]
    pub fn is_black(self) -> bool {
        matches!(self, Self::Black)
    }
}

/// A child direction, usable as an index into a node's child slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left = 0,
    Right = 1,
}

impl Direction {
    /// The opposite direction. An involution: `d.invert().invert() == d`.
    #[inline]
    #[must_use]
    pub fn invert(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Parent pointer + color storage, packed into one word.
///
/// The low bit of the word holds the color; the remaining bits hold the
/// parent address (zero means no parent). Valid only because node alignment
/// is statically ≥ 2 (asserted in [`Node::new`]).
#[cfg(feature = "packed-links")]
#[derive(Clone)]
struct Links {
    parent_color: usize,
}

#[cfg(feature = "packed-links")]
impl Links {
    fn new(color: Color) -> Self {
        Self {
            parent_color: color as usize,
        }
    }

    #[inline]
    fn parent(&self) -> usize {
        self.parent_color & !1
    }

    #[inline]
    fn color(&self) -> Color {
        if self.parent_color & 1 == 0 {
            Color::Red
        } else {
            Color::Black
        }
    }

    #[inline]
    fn set_parent(&mut self, parent: usize) {
        debug_assert_eq!(parent & 1, 0);
        self.parent_color = parent | (self.parent_color & 1);
    }

    #[inline]
    fn set_color(&mut self, color: Color) {
        self.parent_color = (self.parent_color & !1) | color as usize;
    }

    #[inline]
    fn set(&mut self, parent: usize, color: Color) {
        debug_assert_eq!(parent & 1, 0);
        self.parent_color = parent | color as usize;
    }
}

/// Parent pointer + color storage as separate fields.
#[cfg(not(feature = "packed-links"))]
#[derive(Clone)]
struct Links {
    parent: usize,
    color: Color,
}

#[cfg(not(feature = "packed-links"))]
impl Links {
    fn new(color: Color) -> Self {
        Self { parent: 0, color }
    }

    #[inline]
    fn parent(&self) -> usize {
        self.parent
    }

    #[inline]
    fn color(&self) -> Color {
        self.color
    }

    #[inline]
    fn set_parent(&mut self, parent: usize) {
        self.parent = parent;
    }

    #[inline]
    fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    #[inline]
    fn set(&mut self, parent: usize, color: Color) {
        self.parent = parent;
        self.color = color;
    }
}

/// A tree cell: key, value, augmentation payload, color, parent back-pointer
/// and two child pointers.
///
/// Nodes are owned by their tree. Borrowed nodes handed out by lookup
/// operations remain valid for the duration of the tree borrow; raw node
/// pointers remain valid until that node is removed or the tree is dropped.
///
/// The parent back-pointer is a raw, non-owning reference: ownership flows
/// strictly root-to-leaf through the child slots.
pub struct Node<K, V, A = NoAugment>
where
    A: Augment<K, V>,
{
    links: Links,
    children: [Option<NonNull<Node<K, V, A>>>; 2],
    size: A::Size,
    payload: A::Payload,
    key: K,
    value: V,
}

impl<K, V, A> Node<K, V, A>
where
    A: Augment<K, V>,
{
    /// Rejects any instantiation whose alignment cannot carry the color bit.
    #[cfg(feature = "packed-links")]
    const COLOR_BIT_FITS: () = assert!(
        std::mem::align_of::<Self>() >= 2,
        "node alignment cannot carry the color bit"
    );

    /// Allocate a new unlinked red node.
    pub(crate) fn new(key: K, value: V) -> Box<Self> {
        #[cfg(feature = "packed-links")]
        let () = Self::COLOR_BIT_FITS;

        Box::new(Self {
            links: Links::new(Color::Red),
            children: [None, None],
            size: A::Size::one(),
            payload: A::Payload::default(),
            key,
            value,
        })
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    pub(crate) fn replace_key(&mut self, key: K) -> K {
        std::mem::replace(&mut self.key, key)
    }

    pub(crate) fn replace_value(&mut self, value: V) -> V {
        std::mem::replace(&mut self.value, value)
    }

    /// The augmentation payload. Written only by [`Augment`] hooks; the tree
    /// itself never reads it.
    pub fn payload(&self) -> &A::Payload {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut A::Payload {
        &mut self.payload
    }

    pub(crate) fn set_payload(&mut self, payload: A::Payload) {
        self.payload = payload;
    }

    pub fn color(&self) -> Color {
        self.links.color()
    }

    pub(crate) fn set_color(&mut self, color: Color) {
        self.links.set_color(color);
    }

    /// The number of nodes in the subtree rooted at this node.
    ///
    /// Only meaningful when the augmentation enables size tracking
    /// ([`Augment::Size`] = `usize`); reads as zero otherwise.
    pub fn subtree_size(&self) -> usize {
        self.size.get()
    }

    pub(crate) fn set_subtree_size(&mut self, n: usize) {
        self.size.set(n);
    }

    /// Recompute this node's subtree size from its children.
    ///
    /// Caller must guarantee the child pointers are live.
    pub(crate) unsafe fn update_subtree_size(&mut self) {
        if A::Size::TRACKED {
            let n = 1
                + self.children[0].map_or(0, |c| c.as_ref().subtree_size())
                + self.children[1].map_or(0, |c| c.as_ref().subtree_size());
            self.size.set(n);
        }
    }

    pub fn parent(&self) -> Option<NonNull<Self>> {
        NonNull::new(self.links.parent() as *mut Self)
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NonNull<Self>>) {
        self.links
            .set_parent(parent.map_or(0, |p| p.as_ptr() as usize));
    }

    pub(crate) fn set_parent_and_color(&mut self, parent: Option<NonNull<Self>>, color: Color) {
        self.links
            .set(parent.map_or(0, |p| p.as_ptr() as usize), color);
    }

    pub fn child(&self, dir: Direction) -> Option<NonNull<Self>> {
        self.children[dir as usize]
    }

    pub(crate) fn set_child(&mut self, dir: Direction, child: Option<NonNull<Self>>) {
        self.children[dir as usize] = child;
    }

    pub fn left(&self) -> Option<&Self> {
        self.children[0].map(|v| unsafe { v.as_ref() })
    }

    pub fn right(&self) -> Option<&Self> {
        self.children[1].map(|v| unsafe { v.as_ref() })
    }

    /// Which child slot of the parent this node occupies, or [`None`] for the
    /// root.
    ///
    /// Well-defined because exactly one parent child slot points back at any
    /// non-root node.
    pub fn direction(&self) -> Option<Direction> {
        let parent = self.parent()?;
        let me = NonNull::from(self);

        if unsafe { parent.as_ref() }.child(Direction::Left) == Some(me) {
            Some(Direction::Left)
        } else {
            debug_assert_eq!(unsafe { parent.as_ref() }.child(Direction::Right), Some(me));
            Some(Direction::Right)
        }
    }

    /// The extreme node of this subtree in the given direction.
    pub(crate) fn extreme(&self, dir: Direction) -> &Self {
        let mut cur = self;
        while let Some(c) = cur.child(dir) {
            cur = unsafe { c.as_ref() };
        }
        cur
    }

    /// The minimum node of the subtree rooted at this node.
    pub fn leftmost(&self) -> &Self {
        self.extreme(Direction::Left)
    }

    /// The maximum node of the subtree rooted at this node.
    pub fn rightmost(&self) -> &Self {
        self.extreme(Direction::Right)
    }

    /// The in-order successor, or [`None`] at the tree maximum.
    pub fn next(&self) -> Option<&Self> {
        self.neighbor(Direction::Right)
    }

    /// The in-order predecessor, or [`None`] at the tree minimum.
    pub fn prev(&self) -> Option<&Self> {
        self.neighbor(Direction::Left)
    }

    fn neighbor(&self, dir: Direction) -> Option<&Self> {
        // The neighbour in `dir` is the opposite extreme of the `dir`
        // subtree, when there is one.
        if let Some(c) = self.child(dir) {
            return Some(unsafe { c.as_ref() }.extreme(dir.invert()));
        }

        // Otherwise walk upward until arriving at a parent from its
        // `dir.invert()` side.
        let mut cur = self;
        loop {
            match cur.direction() {
                Some(d) if d == dir.invert() => {
                    return Some(unsafe { cur.parent().unwrap().as_ref() })
                }
                Some(_) => cur = unsafe { cur.parent().unwrap().as_ref() },
                None => return None,
            }
        }
    }

    /// Explode this [`Node`] into the key and value it carries.
    pub(crate) fn into_parts(self: Box<Self>) -> (K, V) {
        let node = *self;
        (node.key, node.value)
    }
}

impl<K, V, A> Debug for Node<K, V, A>
where
    K: Debug,
    V: Debug,
    A: Augment<K, V>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("color", &self.color())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) type IntNode = Node<i64, usize>;

    /// Allocate an unlinked red test node.
    pub(crate) fn alloc(key: i64) -> NonNull<IntNode> {
        NonNull::from(Box::leak(Node::new(key, key as usize)))
    }

    /// Link `child` under `parent` in the given slot.
    pub(crate) unsafe fn link(
        mut parent: NonNull<IntNode>,
        dir: Direction,
        mut child: NonNull<IntNode>,
    ) {
        assert!(parent.as_ref().child(dir).is_none());
        parent.as_mut().set_child(dir, Some(child));
        child.as_mut().set_parent(Some(parent));
    }

    pub(crate) unsafe fn paint(mut n: NonNull<IntNode>, color: Color) {
        n.as_mut().set_color(color);
    }

    /// Release a hand-built subtree.
    pub(crate) unsafe fn free_subtree(n: NonNull<IntNode>) {
        for dir in [Direction::Left, Direction::Right] {
            if let Some(c) = n.as_ref().child(dir) {
                free_subtree(c);
            }
        }
        drop(Box::from_raw(n.as_ptr()));
    }

    #[test]
    fn test_direction_invert() {
        assert_eq!(Direction::Left.invert(), Direction::Right);
        assert_eq!(Direction::Right.invert(), Direction::Left);
        assert_eq!(Direction::Left.invert().invert(), Direction::Left);
    }

    #[test]
    fn test_links_roundtrip() {
        let a = alloc(1);
        let mut b = alloc(2);

        unsafe {
            // New nodes are red with no parent.
            assert_eq!(a.as_ref().color(), Color::Red);
            assert_eq!(a.as_ref().parent(), None);

            // The parent address and color are stored independently.
            paint(b, Color::Black);
            b.as_mut().set_parent(Some(a));
            assert_eq!(b.as_ref().parent(), Some(a));
            assert_eq!(b.as_ref().color(), Color::Black);

            paint(b, Color::Red);
            assert_eq!(b.as_ref().parent(), Some(a));
            assert_eq!(b.as_ref().color(), Color::Red);

            b.as_mut().set_parent(None);
            assert_eq!(b.as_ref().parent(), None);
            assert_eq!(b.as_ref().color(), Color::Red);

            b.as_mut().set_parent_and_color(Some(a), Color::Black);
            assert_eq!(b.as_ref().parent(), Some(a));
            assert_eq!(b.as_ref().color(), Color::Black);

            drop(Box::from_raw(a.as_ptr()));
            drop(Box::from_raw(b.as_ptr()));
        }
    }

    #[test]
    fn test_in_order_navigation() {
        //
        //          4
        //         / \
        //        2   6
        //       / \ / \
        //      1  3 5  7
        //
        let n4 = alloc(4);
        let n2 = alloc(2);
        let n6 = alloc(6);
        let n1 = alloc(1);
        let n3 = alloc(3);
        let n5 = alloc(5);
        let n7 = alloc(7);

        unsafe {
            link(n4, Direction::Left, n2);
            link(n4, Direction::Right, n6);
            link(n2, Direction::Left, n1);
            link(n2, Direction::Right, n3);
            link(n6, Direction::Left, n5);
            link(n6, Direction::Right, n7);

            let root = n4.as_ref();
            assert_eq!(*root.leftmost().key(), 1);
            assert_eq!(*root.rightmost().key(), 7);

            // Walk the whole tree forwards, then backwards.
            let mut keys = vec![];
            let mut cur = Some(root.leftmost());
            while let Some(n) = cur {
                keys.push(*n.key());
                cur = n.next();
            }
            assert_eq!(keys, [1, 2, 3, 4, 5, 6, 7]);

            let mut keys = vec![];
            let mut cur = Some(root.rightmost());
            while let Some(n) = cur {
                keys.push(*n.key());
                cur = n.prev();
            }
            assert_eq!(keys, [7, 6, 5, 4, 3, 2, 1]);

            // Directions relative to parents.
            assert_eq!(n4.as_ref().direction(), None);
            assert_eq!(n2.as_ref().direction(), Some(Direction::Left));
            assert_eq!(n7.as_ref().direction(), Some(Direction::Right));

            free_subtree(n4);
        }
    }
}
