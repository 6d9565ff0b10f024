//! Folder-style trees with composed path keys.
//!
//! A folder tree keys every item by a path composed from its ancestors'
//! keys through an injected combinator. Child keys are always derived from
//! the parent key plus the local segment, never set independently.

use super::{ItemRef, TreeWithUniqueId, UniqueIdTreeItemFactory};
use crate::error::{Error, Result};

/// Combines two keys into one, e.g. by joining path segments.
pub trait KeyCombinator<K> {
    /// Combines `first` and `second` into a single key.
    fn combine(&self, first: &K, second: &K) -> K;
}

/// Combinator that always joins both operands with a separator.
///
/// Empty operands are kept literally, so combining an empty parent key with
/// `"a"` under separator `/` yields `/a`.
#[derive(Debug, Clone)]
pub struct SeparatorCombinator {
    separator: String,
}

impl SeparatorCombinator {
    /// Creates a combinator with the given separator.
    ///
    /// Fails with [`Error::EmptySeparator`] if the separator is empty.
    pub fn new(separator: impl Into<String>) -> Result<Self> {
        let separator = separator.into();
        if separator.is_empty() {
            return Err(Error::EmptySeparator);
        }
        Ok(SeparatorCombinator { separator })
    }

    /// Returns the separator.
    pub fn separator(&self) -> &str {
        &self.separator
    }
}

impl KeyCombinator<String> for SeparatorCombinator {
    fn combine(&self, first: &String, second: &String) -> String {
        format!("{}{}{}", first, self.separator, second)
    }
}

/// Combinator that drops empty operands instead of joining them.
///
/// Combining an empty parent key with `"a"` yields `a`; two non-empty
/// operands are joined with the separator.
#[derive(Debug, Clone)]
pub struct IgnoreEmptyCombinator {
    separator: String,
}

impl IgnoreEmptyCombinator {
    /// Creates a combinator with the given separator.
    ///
    /// Fails with [`Error::EmptySeparator`] if the separator is empty.
    pub fn new(separator: impl Into<String>) -> Result<Self> {
        let separator = separator.into();
        if separator.is_empty() {
            return Err(Error::EmptySeparator);
        }
        Ok(IgnoreEmptyCombinator { separator })
    }

    /// Returns the separator.
    pub fn separator(&self) -> &str {
        &self.separator
    }
}

impl KeyCombinator<String> for IgnoreEmptyCombinator {
    fn combine(&self, first: &String, second: &String) -> String {
        if first.is_empty() {
            second.clone()
        } else if second.is_empty() {
            first.clone()
        } else {
            format!("{}{}{}", first, self.separator, second)
        }
    }
}

/// A tree keyed by combinator-composed paths.
///
/// The root carries the empty sentinel key; every child's key is the parent
/// key combined with the local segment.
pub struct FolderTree<V, C: KeyCombinator<String>> {
    combinator: C,
    tree: TreeWithUniqueId<String, V>,
}

impl<V, C: KeyCombinator<String>> FolderTree<V, C> {
    /// Creates an empty folder tree with the given combinator.
    pub fn new(combinator: C) -> Result<Self> {
        Ok(FolderTree {
            combinator,
            tree: TreeWithUniqueId::new(String::new())?,
        })
    }

    /// Returns the root item. Its key is the empty sentinel.
    pub fn root(&self) -> &ItemRef<String, V> {
        self.tree.root()
    }

    /// Creates a child folder of `parent` for the given path segment.
    ///
    /// The child's key is the parent key combined with `segment`; path
    /// uniqueness is enforced by the underlying factory.
    pub fn create_child_folder(
        &mut self,
        parent: &ItemRef<String, V>,
        segment: &str,
        value: V,
    ) -> Result<ItemRef<String, V>> {
        let full_key = {
            let parent_item = parent.borrow();
            self.combinator
                .combine(parent_item.key(), &segment.to_string())
        };
        self.tree.create_child_item(parent, full_key, value)
    }

    /// Returns true if a folder with the given composed path exists.
    pub fn has_folder_with_path(&self, path: &str) -> bool {
        self.tree.has_item_with_id(&path.to_string())
    }

    /// Returns the folder with the given composed path.
    pub fn folder_with_path(&self, path: &str) -> Option<ItemRef<String, V>> {
        self.tree.item_with_id(&path.to_string())
    }

    /// Removes the folder with the given composed path and its subtree.
    pub fn remove_folder_with_path(&mut self, path: &str) -> Option<ItemRef<String, V>> {
        self.tree.remove_item_with_id(&path.to_string())
    }

    /// Returns the number of folders, including the root.
    pub fn folder_count(&self) -> usize {
        self.tree.item_count()
    }

    /// Returns the underlying factory.
    pub fn factory(&self) -> &UniqueIdTreeItemFactory<String, V> {
        self.tree.factory()
    }

    /// Returns the underlying tree.
    pub fn tree(&self) -> &TreeWithUniqueId<String, V> {
        &self.tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_separator_rejected() {
        assert!(matches!(
            SeparatorCombinator::new(""),
            Err(Error::EmptySeparator)
        ));
        assert!(matches!(
            IgnoreEmptyCombinator::new(""),
            Err(Error::EmptySeparator)
        ));
    }

    #[test]
    fn test_separator_combinator_keeps_empty_operands() {
        let c = SeparatorCombinator::new("/").unwrap();
        assert_eq!(c.combine(&"a".to_string(), &"b".to_string()), "a/b");
        assert_eq!(c.combine(&String::new(), &"b".to_string()), "/b");
        assert_eq!(c.combine(&"a".to_string(), &String::new()), "a/");
    }

    #[test]
    fn test_ignore_empty_combinator_drops_empty_operands() {
        let c = IgnoreEmptyCombinator::new("/").unwrap();
        assert_eq!(c.combine(&"a".to_string(), &"b".to_string()), "a/b");
        assert_eq!(c.combine(&String::new(), &"b".to_string()), "b");
        assert_eq!(c.combine(&"a".to_string(), &String::new()), "a");
    }

    #[test]
    fn test_grandchild_path_composition() {
        let mut tree = FolderTree::new(IgnoreEmptyCombinator::new("/").unwrap()).unwrap();
        let root = tree.root().clone();
        let a = tree.create_child_folder(&root, "a", 1).unwrap();
        let b = tree.create_child_folder(&a, "b", 2).unwrap();

        assert_eq!(a.borrow().key(), "a");
        assert_eq!(b.borrow().key(), "a/b");
    }

    #[test]
    fn test_path_round_trip_lookup() {
        let mut tree = FolderTree::new(IgnoreEmptyCombinator::new("/").unwrap()).unwrap();
        let root = tree.root().clone();
        let a = tree.create_child_folder(&root, "a", 1).unwrap();
        let b = tree.create_child_folder(&a, "b", 2).unwrap();

        let found = tree.folder_with_path("a/b").unwrap();
        assert!(std::rc::Rc::ptr_eq(&found, &b));
        assert_eq!(found.borrow().value(), Some(&2));
        assert!(tree.has_folder_with_path("a"));
        assert!(!tree.has_folder_with_path("b"));
    }

    #[test]
    fn test_duplicate_segment_rejected() {
        let mut tree = FolderTree::new(IgnoreEmptyCombinator::new("/").unwrap()).unwrap();
        let root = tree.root().clone();
        tree.create_child_folder(&root, "a", 1).unwrap();
        let err = tree.create_child_folder(&root, "a", 2).unwrap_err();
        assert!(matches!(err, Error::DuplicateKey(_)));

        // The same segment is fine under a different parent
        let a = tree.folder_with_path("a").unwrap();
        let nested = tree.create_child_folder(&a, "a", 3).unwrap();
        assert_eq!(nested.borrow().key(), "a/a");
    }

    #[test]
    fn test_remove_folder_subtree() {
        let mut tree = FolderTree::new(IgnoreEmptyCombinator::new("/").unwrap()).unwrap();
        let root = tree.root().clone();
        let a = tree.create_child_folder(&root, "a", 1).unwrap();
        tree.create_child_folder(&a, "b", 2).unwrap();
        assert_eq!(tree.folder_count(), 3);

        tree.remove_folder_with_path("a").unwrap();
        assert!(!tree.has_folder_with_path("a"));
        assert!(!tree.has_folder_with_path("a/b"));
        assert_eq!(tree.folder_count(), 1);
    }
}
