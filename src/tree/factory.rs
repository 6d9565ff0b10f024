//! Tree item factories.
//!
//! Factories are the only way to create items, which lets the unique-ID
//! factory keep a key→item map covering everything it ever created. Not
//! thread-safe; callers must serialize access.

use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::{new_item_ref, ItemRef, TreeItem};
use crate::error::{Error, Result};

/// Factory trait for creating tree items.
///
/// This allows tree builders (e.g. the XML reader) to create items without
/// knowing which uniqueness policy backs them.
pub trait TreeItemFactory<K, V> {
    /// Creates the root item with the given key.
    fn create_root(&mut self, key: K) -> Result<ItemRef<K, V>>;

    /// Creates a child of `parent` carrying `key` and `value`.
    fn create_child_item(
        &mut self,
        parent: &ItemRef<K, V>,
        key: K,
        value: V,
    ) -> Result<ItemRef<K, V>>;
}

/// Factory that guarantees at most one item per key.
///
/// Every created item is registered in the key→item map; creating a second
/// item with an already-registered key fails with [`Error::DuplicateKey`].
#[derive(Debug)]
pub struct UniqueIdTreeItemFactory<K, V> {
    items: FxHashMap<K, ItemRef<K, V>>,
}

impl<K, V> Default for UniqueIdTreeItemFactory<K, V> {
    fn default() -> Self {
        UniqueIdTreeItemFactory {
            items: FxHashMap::default(),
        }
    }
}

impl<K, V> UniqueIdTreeItemFactory<K, V>
where
    K: Clone + Eq + Hash + Debug,
{
    /// Creates an empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if an item with the given key was created by this factory.
    pub fn contains_item_with_id(&self, key: &K) -> bool {
        self.items.contains_key(key)
    }

    /// Returns the item registered under the given key.
    pub fn item_of_id(&self, key: &K) -> Option<ItemRef<K, V>> {
        self.items.get(key).cloned()
    }

    /// Returns the number of items created by this factory.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns all items as a freshly materialized collection.
    ///
    /// The returned vector is independent of the factory's internal map;
    /// mutating it cannot corrupt the tree.
    pub fn all_items(&self) -> Vec<ItemRef<K, V>> {
        self.items.values().cloned().collect()
    }

    /// Returns the payload values of all items that carry one.
    ///
    /// Roots are created without a payload and are skipped.
    pub fn all_item_values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.items
            .values()
            .filter_map(|item| item.borrow().value().cloned())
            .collect()
    }

    /// Removes the item with the given key, detaching its subtree from the
    /// parent and unregistering the subtree's keys.
    ///
    /// Returns the removed item, or None if the key is unknown.
    pub fn remove_item_with_id(&mut self, key: &K) -> Option<ItemRef<K, V>> {
        let item = self.items.remove(key)?;
        TreeItem::detach_from_parent(&item);

        // The removed item's descendants leave the factory with it, so their
        // keys become available again.
        let mut stack: Vec<ItemRef<K, V>> = item.borrow().children().to_vec();
        while let Some(descendant) = stack.pop() {
            let descendant_key = descendant.borrow().key().clone();
            self.items.remove(&descendant_key);
            stack.extend(descendant.borrow().children().iter().cloned());
        }
        Some(item)
    }

    fn check_unused_key(&self, key: &K) -> Result<()> {
        if self.items.contains_key(key) {
            return Err(Error::DuplicateKey(format!("{key:?}")));
        }
        Ok(())
    }

    fn check_managed_parent(&self, parent: &ItemRef<K, V>) -> Result<()> {
        let parent_key = parent.borrow().key().clone();
        match self.items.get(&parent_key) {
            Some(known) if Rc::ptr_eq(known, parent) => Ok(()),
            _ => Err(Error::ForeignParent),
        }
    }
}

impl<K, V> TreeItemFactory<K, V> for UniqueIdTreeItemFactory<K, V>
where
    K: Clone + Eq + Hash + Debug,
{
    fn create_root(&mut self, key: K) -> Result<ItemRef<K, V>> {
        self.check_unused_key(&key)?;
        let root = new_item_ref(TreeItem::new(key.clone(), None));
        self.items.insert(key, root.clone());
        Ok(root)
    }

    fn create_child_item(
        &mut self,
        parent: &ItemRef<K, V>,
        key: K,
        value: V,
    ) -> Result<ItemRef<K, V>> {
        self.check_managed_parent(parent)?;
        self.check_unused_key(&key)?;

        let child = new_item_ref(TreeItem::new(key.clone(), Some(value)));
        TreeItem::add_child_to_ref(parent, child.clone());
        self.items.insert(key, child.clone());
        Ok(child)
    }
}

/// A tree whose items are created through a [`UniqueIdTreeItemFactory`],
/// so every key resolves to at most one item.
#[derive(Debug)]
pub struct TreeWithUniqueId<K, V> {
    factory: UniqueIdTreeItemFactory<K, V>,
    root: ItemRef<K, V>,
}

impl<K, V> TreeWithUniqueId<K, V>
where
    K: Clone + Eq + Hash + Debug,
{
    /// Creates a tree with a fresh factory and a root carrying `root_key`.
    pub fn new(root_key: K) -> Result<Self> {
        let mut factory = UniqueIdTreeItemFactory::new();
        let root = factory.create_root(root_key)?;
        Self::from_parts(factory, root)
    }

    /// Assembles a tree from a factory and the root it produced.
    ///
    /// Refuses to initialize if the root is structurally broken.
    pub(crate) fn from_parts(
        factory: UniqueIdTreeItemFactory<K, V>,
        root: ItemRef<K, V>,
    ) -> Result<Self> {
        if root.borrow().parent_item().is_some() {
            return Err(Error::BrokenRoot(
                "factory produced a root with a parent".to_string(),
            ));
        }
        if !factory.contains_item_with_id(root.borrow().key()) {
            return Err(Error::BrokenRoot(
                "root is not registered with the factory".to_string(),
            ));
        }
        Ok(TreeWithUniqueId { factory, root })
    }

    /// Returns the root item.
    pub fn root(&self) -> &ItemRef<K, V> {
        &self.root
    }

    /// Creates a child of `parent` carrying `key` and `value`.
    pub fn create_child_item(
        &mut self,
        parent: &ItemRef<K, V>,
        key: K,
        value: V,
    ) -> Result<ItemRef<K, V>> {
        self.factory.create_child_item(parent, key, value)
    }

    /// Returns true if the tree contains an item with the given key.
    pub fn has_item_with_id(&self, key: &K) -> bool {
        self.factory.contains_item_with_id(key)
    }

    /// Returns the item with the given key.
    pub fn item_with_id(&self, key: &K) -> Option<ItemRef<K, V>> {
        self.factory.item_of_id(key)
    }

    /// Returns the number of items in the tree, including the root.
    pub fn item_count(&self) -> usize {
        self.factory.item_count()
    }

    /// Returns all items as a freshly materialized collection.
    pub fn all_items(&self) -> Vec<ItemRef<K, V>> {
        self.factory.all_items()
    }

    /// Returns the payload values of all items that carry one.
    pub fn all_item_values(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.factory.all_item_values()
    }

    /// Removes the item with the given key and its subtree.
    ///
    /// The root cannot be removed; asking for it returns None.
    pub fn remove_item_with_id(&mut self, key: &K) -> Option<ItemRef<K, V>> {
        if key == self.root.borrow().key() {
            return None;
        }
        self.factory.remove_item_with_id(key)
    }

    /// Returns the underlying factory.
    pub fn factory(&self) -> &UniqueIdTreeItemFactory<K, V> {
        &self.factory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_child_links_both_ways() {
        let mut factory: UniqueIdTreeItemFactory<String, i32> = UniqueIdTreeItemFactory::new();
        let root = factory.create_root("root".to_string()).unwrap();
        let child = factory
            .create_child_item(&root, "a".to_string(), 1)
            .unwrap();

        // Reachable via the parent's child list
        assert_eq!(root.borrow().child_count(), 1);
        assert!(Rc::ptr_eq(&root.borrow().children()[0], &child));
        // Reachable via the factory's key map
        let looked_up = factory.item_of_id(&"a".to_string()).unwrap();
        assert!(Rc::ptr_eq(&looked_up, &child));
        // Parent back-reference
        let parent = child.borrow().parent_item().unwrap();
        assert!(Rc::ptr_eq(&parent, &root));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut factory: UniqueIdTreeItemFactory<String, i32> = UniqueIdTreeItemFactory::new();
        let root = factory.create_root("root".to_string()).unwrap();
        factory
            .create_child_item(&root, "a".to_string(), 1)
            .unwrap();

        let err = factory
            .create_child_item(&root, "a".to_string(), 2)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateKey(_)));

        // The first item is untouched
        let existing = factory.item_of_id(&"a".to_string()).unwrap();
        assert_eq!(existing.borrow().value(), Some(&1));
        assert_eq!(factory.item_count(), 2);
    }

    #[test]
    fn test_root_key_counts_toward_uniqueness() {
        let mut factory: UniqueIdTreeItemFactory<String, i32> = UniqueIdTreeItemFactory::new();
        let root = factory.create_root("root".to_string()).unwrap();
        let err = factory
            .create_child_item(&root, "root".to_string(), 1)
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateKey(_)));
    }

    #[test]
    fn test_foreign_parent_rejected() {
        let mut factory: UniqueIdTreeItemFactory<String, i32> = UniqueIdTreeItemFactory::new();
        factory.create_root("root".to_string()).unwrap();

        let mut other: UniqueIdTreeItemFactory<String, i32> = UniqueIdTreeItemFactory::new();
        let foreign_root = other.create_root("root".to_string()).unwrap();

        let err = factory
            .create_child_item(&foreign_root, "a".to_string(), 1)
            .unwrap_err();
        assert!(matches!(err, Error::ForeignParent));
    }

    #[test]
    fn test_all_items_returns_independent_collections() {
        let mut factory: UniqueIdTreeItemFactory<String, i32> = UniqueIdTreeItemFactory::new();
        let root = factory.create_root("root".to_string()).unwrap();
        factory
            .create_child_item(&root, "a".to_string(), 1)
            .unwrap();
        factory
            .create_child_item(&root, "b".to_string(), 2)
            .unwrap();

        let first = factory.all_items();
        let second = factory.all_items();

        // Equal by content
        let mut first_keys: Vec<String> =
            first.iter().map(|i| i.borrow().key().clone()).collect();
        let mut second_keys: Vec<String> =
            second.iter().map(|i| i.borrow().key().clone()).collect();
        first_keys.sort();
        second_keys.sort();
        assert_eq!(first_keys, second_keys);
        assert_eq!(first_keys, vec!["a", "b", "root"]);

        // Independent by identity: draining one does not affect the other
        let mut drained = first;
        drained.clear();
        assert_eq!(second.len(), 3);
    }

    #[test]
    fn test_all_item_values_skips_root() {
        let mut factory: UniqueIdTreeItemFactory<String, i32> = UniqueIdTreeItemFactory::new();
        let root = factory.create_root("root".to_string()).unwrap();
        factory
            .create_child_item(&root, "a".to_string(), 1)
            .unwrap();
        factory
            .create_child_item(&root, "b".to_string(), 2)
            .unwrap();

        let mut values = factory.all_item_values();
        values.sort();
        assert_eq!(values, vec![1, 2]);
    }

    #[test]
    fn test_remove_item_unregisters_subtree() {
        let mut factory: UniqueIdTreeItemFactory<String, i32> = UniqueIdTreeItemFactory::new();
        let root = factory.create_root("root".to_string()).unwrap();
        let a = factory
            .create_child_item(&root, "a".to_string(), 1)
            .unwrap();
        factory.create_child_item(&a, "a.1".to_string(), 2).unwrap();

        let removed = factory.remove_item_with_id(&"a".to_string()).unwrap();
        assert_eq!(removed.borrow().key(), "a");
        assert!(removed.borrow().is_root());

        assert_eq!(root.borrow().child_count(), 0);
        assert!(!factory.contains_item_with_id(&"a".to_string()));
        assert!(!factory.contains_item_with_id(&"a.1".to_string()));
        assert_eq!(factory.item_count(), 1);

        // Keys of the removed subtree are available again
        factory
            .create_child_item(&root, "a".to_string(), 3)
            .unwrap();
    }

    #[test]
    fn test_container_rejects_root_with_parent() {
        let mut factory: UniqueIdTreeItemFactory<String, i32> = UniqueIdTreeItemFactory::new();
        let root = factory.create_root("root".to_string()).unwrap();
        let child = factory
            .create_child_item(&root, "a".to_string(), 1)
            .unwrap();

        let err = TreeWithUniqueId::from_parts(factory, child).unwrap_err();
        assert!(matches!(err, Error::BrokenRoot(_)));
    }

    #[test]
    fn test_container_rejects_unregistered_root() {
        let factory: UniqueIdTreeItemFactory<String, i32> = UniqueIdTreeItemFactory::new();
        let mut other: UniqueIdTreeItemFactory<String, i32> = UniqueIdTreeItemFactory::new();
        let foreign_root = other.create_root("root".to_string()).unwrap();

        let err = TreeWithUniqueId::from_parts(factory, foreign_root).unwrap_err();
        assert!(matches!(err, Error::BrokenRoot(_)));
    }

    #[test]
    fn test_tree_container() {
        let mut tree: TreeWithUniqueId<String, i32> =
            TreeWithUniqueId::new("root".to_string()).unwrap();
        let root = tree.root().clone();
        let a = tree.create_child_item(&root, "a".to_string(), 1).unwrap();
        tree.create_child_item(&a, "b".to_string(), 2).unwrap();

        assert!(tree.has_item_with_id(&"b".to_string()));
        assert_eq!(tree.item_count(), 3);
        assert_eq!(
            tree.item_with_id(&"b".to_string()).unwrap().borrow().level(),
            2
        );

        // The root cannot be removed
        assert!(tree.remove_item_with_id(&"root".to_string()).is_none());
        assert!(tree.has_item_with_id(&"root".to_string()));

        tree.remove_item_with_id(&"a".to_string()).unwrap();
        assert!(!tree.has_item_with_id(&"b".to_string()));
        assert_eq!(tree.item_count(), 1);
    }
}
