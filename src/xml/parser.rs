//! XML parser that builds trees.
//!
//! The parser uses quick-xml's streaming API and creates every item through
//! an injected factory, so the uniqueness policy stays with the factory
//! rather than the parser.

use std::any::Any;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::TreeXmlOptions;
use crate::convert::TypeConverterRegistry;
use crate::error::{Error, Result};
use crate::tree::{ItemRef, TreeItemFactory, TreeWithUniqueId, UniqueIdTreeItemFactory};

/// XML parser that builds trees through a [`TreeItemFactory`].
pub struct TreeXmlParser<F> {
    factory: F,
    options: TreeXmlOptions,
}

impl<F> TreeXmlParser<F> {
    /// Creates a parser with the given factory and default options.
    pub fn new(factory: F) -> Self {
        Self::with_options(factory, TreeXmlOptions::default())
    }

    /// Creates a parser with the given factory and options.
    pub fn with_options(factory: F, options: TreeXmlOptions) -> Self {
        TreeXmlParser { factory, options }
    }

    /// Consumes the parser and returns the factory with everything it built.
    pub fn into_factory(self) -> F {
        self.factory
    }

    /// Parses a tree from a string, returning the root item.
    pub fn parse_str<V: Any>(
        &mut self,
        xml: &str,
        registry: &TypeConverterRegistry,
    ) -> Result<ItemRef<String, V>>
    where
        F: TreeItemFactory<String, V>,
    {
        let mut reader = Reader::from_str(xml);
        self.parse_reader(&mut reader, registry)
    }

    /// Parses a tree from a file, returning the root item.
    pub fn parse_file<V: Any, P: AsRef<Path>>(
        &mut self,
        path: P,
        registry: &TypeConverterRegistry,
    ) -> Result<ItemRef<String, V>>
    where
        F: TreeItemFactory<String, V>,
    {
        let file = File::open(path)?;
        let mut reader = Reader::from_reader(BufReader::new(file));
        self.parse_reader(&mut reader, registry)
    }

    fn parse_reader<R: BufRead, V: Any>(
        &mut self,
        reader: &mut Reader<R>,
        registry: &TypeConverterRegistry,
    ) -> Result<ItemRef<String, V>>
    where
        F: TreeItemFactory<String, V>,
    {
        let mut item_stack: Vec<ItemRef<String, V>> = Vec::new();
        let mut root: Option<ItemRef<String, V>> = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    let item = self.open_element(e, reader, registry, &item_stack, &mut root)?;
                    item_stack.push(item);
                }
                Ok(Event::Empty(ref e)) => {
                    // Self-closing item: created but never a parent
                    self.open_element(e, reader, registry, &item_stack, &mut root)?;
                }
                Ok(Event::End(_)) => {
                    item_stack.pop();
                }
                Ok(Event::Text(e)) => {
                    let raw = std::str::from_utf8(e.as_ref())
                        .map_err(|e| Error::Parse(e.to_string()))?;
                    if !raw.trim().is_empty() {
                        return Err(Error::Parse(format!(
                            "unexpected text content: {raw:?}"
                        )));
                    }
                }
                Ok(Event::Eof) => break,
                Ok(Event::Decl(_)) | Ok(Event::Comment(_)) | Ok(Event::DocType(_)) => {
                    // Ignore declaration, comments and DOCTYPE
                }
                Ok(_) => {
                    // Ignore processing instructions and entity references
                }
                Err(e) => return Err(Error::Xml(e)),
            }
            buf.clear();
        }

        root.ok_or_else(|| Error::Parse("document has no root element".to_string()))
    }

    fn open_element<R: BufRead, V: Any>(
        &mut self,
        e: &BytesStart,
        reader: &Reader<R>,
        registry: &TypeConverterRegistry,
        item_stack: &[ItemRef<String, V>],
        root: &mut Option<ItemRef<String, V>>,
    ) -> Result<ItemRef<String, V>>
    where
        F: TreeItemFactory<String, V>,
    {
        let name = reader
            .decoder()
            .decode(e.name().as_ref())
            .map_err(|e| Error::Parse(e.to_string()))?
            .to_string();

        let (id, rendered_value) = self.parse_attributes(e, reader)?;
        let id = id.ok_or_else(|| {
            Error::Parse(format!(
                "element <{}> is missing the {} attribute",
                name, self.options.id_attribute
            ))
        })?;

        match item_stack.last() {
            None => {
                if name != self.options.root_element {
                    return Err(Error::Parse(format!(
                        "expected root element <{}>, found <{}>",
                        self.options.root_element, name
                    )));
                }
                if root.is_some() {
                    return Err(Error::Parse("multiple root elements".to_string()));
                }
                let item = self.factory.create_root(id)?;
                *root = Some(item.clone());
                Ok(item)
            }
            Some(parent) => {
                if name != self.options.item_element {
                    return Err(Error::Parse(format!(
                        "expected item element <{}>, found <{}>",
                        self.options.item_element, name
                    )));
                }
                let rendered = rendered_value.ok_or_else(|| {
                    Error::Parse(format!(
                        "element <{}> is missing the {} attribute",
                        name, self.options.value_attribute
                    ))
                })?;
                let value: V = registry.convert(&rendered)?;
                self.factory.create_child_item(parent, id, value)
            }
        }
    }

    /// Extracts the id and value attributes; unknown attributes are ignored.
    fn parse_attributes<R: BufRead>(
        &self,
        e: &BytesStart,
        reader: &Reader<R>,
    ) -> Result<(Option<String>, Option<String>)> {
        let mut id = None;
        let mut value = None;
        for attr_result in e.attributes() {
            let attr = attr_result.map_err(|e| Error::Parse(format!("attribute error: {e}")))?;
            let key = reader
                .decoder()
                .decode(attr.key.as_ref())
                .map_err(|e| Error::Parse(e.to_string()))?
                .to_string();
            if key == self.options.id_attribute {
                let decoded = attr
                    .unescape_value()
                    .map_err(|e| Error::Parse(e.to_string()))?;
                id = Some(decoded.to_string());
            } else if key == self.options.value_attribute {
                let decoded = attr
                    .unescape_value()
                    .map_err(|e| Error::Parse(e.to_string()))?;
                value = Some(decoded.to_string());
            }
        }
        Ok((id, value))
    }
}

/// Reads a tree from an XML string using a unique-ID factory.
pub fn read_tree_from_str<V: Any>(
    xml: &str,
    registry: &TypeConverterRegistry,
    options: &TreeXmlOptions,
) -> Result<TreeWithUniqueId<String, V>> {
    let mut parser = TreeXmlParser::with_options(UniqueIdTreeItemFactory::new(), options.clone());
    let root = parser.parse_str(xml, registry)?;
    TreeWithUniqueId::from_parts(parser.into_factory(), root)
}

/// Reads a tree from an XML file using a unique-ID factory.
pub fn read_tree_from_file<V: Any, P: AsRef<Path>>(
    path: P,
    registry: &TypeConverterRegistry,
    options: &TreeXmlOptions,
) -> Result<TreeWithUniqueId<String, V>> {
    let mut parser = TreeXmlParser::with_options(UniqueIdTreeItemFactory::new(), options.clone());
    let root = parser.parse_file(path, registry)?;
    TreeWithUniqueId::from_parts(parser.into_factory(), root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{ConverterRegistrar, CoreConverterRegistrar};

    fn registry() -> TypeConverterRegistry {
        let registrars: [&dyn ConverterRegistrar; 1] = [&CoreConverterRegistrar];
        TypeConverterRegistry::init(registrars).unwrap()
    }

    #[test]
    fn test_parse_simple_tree() {
        let xml = r#"<tree id="root"><item id="a" value="1"><item id="b" value="2" /></item></tree>"#;
        let tree: TreeWithUniqueId<String, i32> =
            read_tree_from_str(xml, &registry(), &TreeXmlOptions::default()).unwrap();

        assert_eq!(tree.item_count(), 3);
        assert_eq!(tree.root().borrow().key(), "root");
        let a = tree.item_with_id(&"a".to_string()).unwrap();
        assert_eq!(a.borrow().value(), Some(&1));
        assert_eq!(a.borrow().child_count(), 1);
        let b = tree.item_with_id(&"b".to_string()).unwrap();
        assert_eq!(b.borrow().value(), Some(&2));
        assert_eq!(b.borrow().level(), 2);
    }

    #[test]
    fn test_parse_unescapes_attribute_values() {
        let xml = r#"<tree id="root"><item id="a&lt;b" value="x &amp; &quot;y&quot;" /></tree>"#;
        let tree: TreeWithUniqueId<String, String> =
            read_tree_from_str(xml, &registry(), &TreeXmlOptions::default()).unwrap();

        let item = tree.item_with_id(&"a<b".to_string()).unwrap();
        assert_eq!(item.borrow().value(), Some(&"x & \"y\"".to_string()));
    }

    #[test]
    fn test_missing_id_attribute_is_an_error() {
        let xml = r#"<tree id="root"><item value="1" /></tree>"#;
        let err = read_tree_from_str::<i32>(xml, &registry(), &TreeXmlOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_missing_value_attribute_is_an_error() {
        let xml = r#"<tree id="root"><item id="a" /></tree>"#;
        let err = read_tree_from_str::<i32>(xml, &registry(), &TreeXmlOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_unexpected_root_element_is_an_error() {
        let xml = r#"<wrong id="root" />"#;
        let err = read_tree_from_str::<i32>(xml, &registry(), &TreeXmlOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_duplicate_ids_are_rejected_by_the_factory() {
        let xml = r#"<tree id="root"><item id="a" value="1" /><item id="a" value="2" /></tree>"#;
        let err = read_tree_from_str::<i32>(xml, &registry(), &TreeXmlOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateKey(_)));
    }

    #[test]
    fn test_unconvertible_value_is_a_conversion_error() {
        let xml = r#"<tree id="root"><item id="a" value="not a number" /></tree>"#;
        let err = read_tree_from_str::<i32>(xml, &registry(), &TreeXmlOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::ConversionFailed { .. }));
    }
}
