//! XML printer that outputs trees.
//!
//! The document element carries the root key; every descendant becomes a
//! nested item element with its composed key and its value rendered through
//! the converter registry.

use std::any::Any;
use std::io::Write;

use super::TreeXmlOptions;
use crate::convert::TypeConverterRegistry;
use crate::error::Result;
use crate::tree::{ItemRef, TreeWithUniqueId};

/// XML printer that outputs trees.
pub struct TreeXmlWriter<W: Write> {
    writer: W,
    options: TreeXmlOptions,
    indent: usize,
}

impl<W: Write> TreeXmlWriter<W> {
    /// Creates a writer with default options.
    pub fn new(writer: W) -> Self {
        Self::with_options(writer, TreeXmlOptions::default())
    }

    /// Creates a writer with the given options.
    pub fn with_options(writer: W, options: TreeXmlOptions) -> Self {
        TreeXmlWriter {
            writer,
            options,
            indent: 0,
        }
    }

    /// Writes the tree as an XML document.
    pub fn write<V: Any>(
        &mut self,
        tree: &TreeWithUniqueId<String, V>,
        registry: &TypeConverterRegistry,
    ) -> Result<()> {
        write!(self.writer, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
        self.newline()?;
        self.write_item(tree.root(), registry, true)?;
        self.writer.flush()?;
        Ok(())
    }

    fn write_item<V: Any>(
        &mut self,
        item: &ItemRef<String, V>,
        registry: &TypeConverterRegistry,
        is_root: bool,
    ) -> Result<()> {
        let (key, rendered_value) = {
            let borrowed = item.borrow();
            let rendered_value = match borrowed.value() {
                Some(value) => Some(registry.convert::<V, String>(value)?),
                None => None,
            };
            (borrowed.key().clone(), rendered_value)
        };

        let name = if is_root {
            self.options.root_element.clone()
        } else {
            self.options.item_element.clone()
        };

        self.write_indent()?;
        write!(
            self.writer,
            "<{} {}=\"{}\"",
            name,
            self.options.id_attribute,
            to_entities(&key)
        )?;
        if let Some(rendered) = rendered_value {
            write!(
                self.writer,
                " {}=\"{}\"",
                self.options.value_attribute,
                to_entities(&rendered)
            )?;
        }

        let borrowed = item.borrow();
        if borrowed.has_children() {
            write!(self.writer, ">")?;
            self.newline()?;
            self.indent += 1;
            for child in borrowed.children() {
                self.write_item(child, registry, false)?;
            }
            self.indent -= 1;
            self.write_indent()?;
            write!(self.writer, "</{}>", name)?;
        } else {
            write!(self.writer, " />")?;
        }
        self.newline()?;
        Ok(())
    }

    fn write_indent(&mut self) -> std::io::Result<()> {
        if self.options.pretty_print {
            write!(self.writer, "{}", "  ".repeat(self.indent))?;
        }
        Ok(())
    }

    fn newline(&mut self) -> std::io::Result<()> {
        if self.options.pretty_print {
            writeln!(self.writer)?;
        }
        Ok(())
    }
}

/// Writes the tree as an XML string.
pub fn write_tree_to_string<V: Any>(
    tree: &TreeWithUniqueId<String, V>,
    registry: &TypeConverterRegistry,
    options: &TreeXmlOptions,
) -> Result<String> {
    let mut buf = Vec::new();
    TreeXmlWriter::with_options(&mut buf, options.clone()).write(tree, registry)?;
    String::from_utf8(buf).map_err(|e| crate::error::Error::Parse(e.to_string()))
}

/// Escapes characters that are unsafe inside XML attribute values.
fn to_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
