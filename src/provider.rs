//! Children-provider traversal capabilities.
//!
//! A [`ChildrenProvider`] maps a "current" node to its children without the
//! node type knowing anything about traversal. Passing `None` as the current
//! node addresses the virtual root. Decorators add sorting and lookup by ID
//! on top of any provider.

use std::cmp::Ordering;

use crate::tree::ItemRef;

/// Capability of reporting an ID.
pub trait HasId {
    /// The ID type.
    type Id: PartialEq;

    /// Returns the ID of this object.
    fn id(&self) -> Self::Id;
}

impl<K: Clone + PartialEq, V> HasId for ItemRef<K, V> {
    type Id = K;

    fn id(&self) -> K {
        self.borrow().key().clone()
    }
}

/// Maps a node to its child collection.
///
/// `children` may return an empty collection, but must return a non-empty
/// one whenever `has_children` is true for the same input.
pub trait ChildrenProvider<T> {
    /// Returns the number of children of `current`.
    fn child_count(&self, current: Option<&T>) -> usize;

    /// Returns the children of `current`.
    fn children(&self, current: Option<&T>) -> Vec<T>;

    /// Returns true if `current` has at least one child.
    fn has_children(&self, current: Option<&T>) -> bool {
        self.child_count(current) > 0
    }
}

/// Provider over tree items.
///
/// The virtual root (`None`) has exactly one child: the tree's root item.
pub struct TreeItemChildrenProvider<K, V> {
    root: ItemRef<K, V>,
}

impl<K, V> TreeItemChildrenProvider<K, V> {
    /// Creates a provider rooted at the given item.
    pub fn new(root: ItemRef<K, V>) -> Self {
        TreeItemChildrenProvider { root }
    }
}

impl<K, V> ChildrenProvider<ItemRef<K, V>> for TreeItemChildrenProvider<K, V> {
    fn child_count(&self, current: Option<&ItemRef<K, V>>) -> usize {
        match current {
            Some(item) => item.borrow().child_count(),
            None => 1,
        }
    }

    fn children(&self, current: Option<&ItemRef<K, V>>) -> Vec<ItemRef<K, V>> {
        match current {
            Some(item) => item.borrow().children().to_vec(),
            None => vec![self.root.clone()],
        }
    }
}

/// Decorator that returns children ordered by an injected comparator.
///
/// The sort is stable; the relative order of children the comparator
/// considers equal is the inner provider's order.
pub struct SortingChildrenProvider<P, C> {
    inner: P,
    compare: C,
}

impl<P, C> SortingChildrenProvider<P, C> {
    /// Wraps `inner` so that children come back sorted by `compare`.
    pub fn new(inner: P, compare: C) -> Self {
        SortingChildrenProvider { inner, compare }
    }
}

impl<T, P, C> ChildrenProvider<T> for SortingChildrenProvider<P, C>
where
    P: ChildrenProvider<T>,
    C: Fn(&T, &T) -> Ordering,
{
    fn child_count(&self, current: Option<&T>) -> usize {
        self.inner.child_count(current)
    }

    fn children(&self, current: Option<&T>) -> Vec<T> {
        let mut children = self.inner.children(current);
        children.sort_by(|a, b| (self.compare)(a, b));
        children
    }
}

/// Decorator that adds child lookup by ID to any provider over `HasId` nodes.
pub struct WithIdChildrenProvider<P> {
    inner: P,
}

impl<P> WithIdChildrenProvider<P> {
    /// Wraps `inner` with ID-based child lookup.
    pub fn new(inner: P) -> Self {
        WithIdChildrenProvider { inner }
    }

    /// Returns the first child of `current` with the given ID, scanning the
    /// child list linearly.
    pub fn child_with_id<T>(&self, current: Option<&T>, id: &T::Id) -> Option<T>
    where
        T: HasId,
        P: ChildrenProvider<T>,
    {
        self.inner
            .children(current)
            .into_iter()
            .find(|child| child.id() == *id)
    }
}

impl<T, P> ChildrenProvider<T> for WithIdChildrenProvider<P>
where
    P: ChildrenProvider<T>,
{
    fn child_count(&self, current: Option<&T>) -> usize {
        self.inner.child_count(current)
    }

    fn children(&self, current: Option<&T>) -> Vec<T> {
        self.inner.children(current)
    }

    fn has_children(&self, current: Option<&T>) -> bool {
        self.inner.has_children(current)
    }
}
