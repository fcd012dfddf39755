use crate::{
    algo::{Location, NodePtr},
    augment::Augment,
    tree::RbTree,
};

/// A view into a single entry in an [`RbTree`], which may either be vacant or
/// occupied.
///
/// This `enum` is constructed from the [`entry`] method on [`RbTree`].
///
/// [`entry`]: RbTree::entry
pub enum Entry<'a, K, V, C, A>
where
    A: Augment<K, V>,
{
    /// A vacant entry.
    Vacant(VacantEntry<'a, K, V, C, A>),
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, K, V, C, A>),
}

impl<'a, K, V, C, A> Entry<'a, K, V, C, A>
where
    A: Augment<K, V>,
{
    /// Gets a reference to the key of this entry.
    pub fn key(&self) -> &K {
        match self {
            Self::Vacant(e) => e.key(),
            Self::Occupied(e) => e.key(),
        }
    }

    /// Ensures a value is in the entry, inserting `default` if vacant, and
    /// returns a mutable reference to the value.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Self::Vacant(e) => e.insert(default),
            Self::Occupied(e) => e.into_mut(),
        }
    }

    /// Ensures a value is in the entry, inserting the result of `default` if
    /// vacant, and returns a mutable reference to the value.
    pub fn or_insert_with(self, default: impl FnOnce() -> V) -> &'a mut V {
        match self {
            Self::Vacant(e) => e.insert(default()),
            Self::Occupied(e) => e.into_mut(),
        }
    }
}

/// A view into a vacant entry in an [`RbTree`].
/// It is part of the [`Entry`] enum.
///
/// Carries the insertion location discovered by the failed lookup, so
/// inserting through it does not descend the tree a second time.
pub struct VacantEntry<'a, K, V, C, A>
where
    A: Augment<K, V>,
{
    key: K,
    // The null child slot the key belongs in; None when the tree is empty.
    at: Option<Location<K, V, A>>,
    tree: &'a mut RbTree<K, V, C, A>,
}

impl<'a, K, V, C, A> VacantEntry<'a, K, V, C, A>
where
    A: Augment<K, V>,
{
    pub(crate) fn new(
        key: K,
        at: Option<Location<K, V, A>>,
        tree: &'a mut RbTree<K, V, C, A>,
    ) -> Self {
        Self { key, at, tree }
    }

    /// Gets a reference to the key that would be used when inserting a value
    /// through the `VacantEntry`.
    #[inline]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Take ownership of the key.
    #[inline]
    pub fn into_key(self) -> K {
        self.key
    }

    /// Sets the value of the entry with the `VacantEntry`'s key, and returns
    /// a mutable reference to it.
    #[inline]
    pub fn insert(self, value: V) -> &'a mut V {
        let mut node = self.tree.attach(self.key, value, self.at);
        unsafe { node.as_mut().value_mut() }
    }
}

/// A view into an occupied entry in an [`RbTree`].
/// It is part of the [`Entry`] enum.
pub struct OccupiedEntry<'a, K, V, C, A>
where
    A: Augment<K, V>,
{
    node: NodePtr<K, V, A>,
    tree: &'a mut RbTree<K, V, C, A>,
}

impl<'a, K, V, C, A> OccupiedEntry<'a, K, V, C, A>
where
    A: Augment<K, V>,
{
    pub(crate) fn new(node: NodePtr<K, V, A>, tree: &'a mut RbTree<K, V, C, A>) -> Self {
        Self { node, tree }
    }

    /// Gets a reference to the key in the entry.
    #[inline]
    pub fn key(&self) -> &K {
        unsafe { self.node.as_ref() }.key()
    }

    /// Gets a reference to the value in the entry.
    #[inline]
    pub fn get(&self) -> &V {
        unsafe { self.node.as_ref() }.value()
    }

    /// Gets a mutable reference to the value in the entry.
    ///
    /// To return a reference outliving the entry, see [`into_mut`].
    ///
    /// [`into_mut`]: OccupiedEntry::into_mut
    #[inline]
    pub fn get_mut(&mut self) -> &mut V {
        unsafe { &mut *self.node.as_ptr() }.value_mut()
    }

    /// Converts the entry into a mutable reference to its value, bound to the
    /// tree borrow.
    #[inline]
    pub fn into_mut(mut self) -> &'a mut V {
        unsafe { self.node.as_mut().value_mut() }
    }

    /// Sets the value of the entry and returns the entry's old value.
    #[inline]
    pub fn insert(&mut self, value: V) -> V {
        unsafe { &mut *self.node.as_ptr() }.replace_value(value)
    }

    /// Takes the value out of the entry, and returns it.
    #[inline]
    pub fn remove(self) -> V {
        self.remove_entry().1
    }

    /// Take the ownership of the key and value from the tree.
    #[inline]
    pub fn remove_entry(self) -> (K, V) {
        unsafe { self.tree.remove_node(self.node) }
    }
}
