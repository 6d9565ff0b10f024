//! treeid - Trees with typed unique IDs and pluggable type conversion
//!
//! This library provides a generic N-ary tree whose items carry typed keys,
//! created through factories that enforce a single item per key. On top of
//! the core structure sit traversal capabilities (children providers with
//! sorting and by-ID lookup decorators), folder-style trees whose keys are
//! combinator-composed paths, and XML serialization.
//!
//! The second half is a pluggable type-converter registry resolving
//! (source, destination) type pairs through exact registrations, predicate
//! rules, and a fuzzy walk over an explicit type hierarchy. The XML layer
//! uses it to render and parse payload values.
//!
//! # Example
//!
//! ```
//! use treeid::tree::{FolderTree, IgnoreEmptyCombinator};
//!
//! let mut tree = FolderTree::new(IgnoreEmptyCombinator::new("/")?)?;
//! let root = tree.root().clone();
//! let docs = tree.create_child_folder(&root, "docs", 1)?;
//! tree.create_child_folder(&docs, "img", 2)?;
//!
//! let img = tree.folder_with_path("docs/img").unwrap();
//! assert_eq!(img.borrow().value(), Some(&2));
//! # Ok::<(), treeid::Error>(())
//! ```
//!
//! Tree item factories and children providers are not thread-safe; callers
//! must serialize access. The converter registry is effectively immutable
//! after initialization and safe for concurrent readers.

pub mod convert;
pub mod error;
pub mod provider;
pub mod tree;
pub mod xml;

pub use error::{BoxError, Error, Result};

// Re-export commonly used types
pub use convert::{
    ConverterRegistrar, ConverterRule, CoreConverterRegistrar, TypeConverterRegistry,
    TypeHierarchy,
};
pub use provider::{
    ChildrenProvider, HasId, SortingChildrenProvider, TreeItemChildrenProvider,
    WithIdChildrenProvider,
};
pub use tree::{
    FolderTree, IgnoreEmptyCombinator, ItemRef, KeyCombinator, SeparatorCombinator, TreeItem,
    TreeItemFactory, TreeWithUniqueId, UniqueIdTreeItemFactory, WeakItemRef,
};
pub use xml::{
    read_tree_from_file, read_tree_from_str, write_tree_to_string, TreeXmlOptions, TreeXmlParser,
    TreeXmlWriter,
};
