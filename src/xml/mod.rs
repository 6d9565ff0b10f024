//! Tree XML serialization.
//!
//! This module writes string-keyed trees to XML and reads them back.
//! Payload values are rendered and parsed through a
//! [`TypeConverterRegistry`](crate::convert::TypeConverterRegistry), so any
//! value type with a registered string conversion round-trips.

mod parser;
mod printer;

pub use parser::{read_tree_from_file, read_tree_from_str, TreeXmlParser};
pub use printer::{write_tree_to_string, TreeXmlWriter};

/// Options controlling tree XML output and input.
#[derive(Debug, Clone)]
pub struct TreeXmlOptions {
    /// Name of the document element.
    pub root_element: String,
    /// Name of the per-item element.
    pub item_element: String,
    /// Name of the key attribute.
    pub id_attribute: String,
    /// Name of the value attribute.
    pub value_attribute: String,
    /// Whether to pretty-print with indentation.
    pub pretty_print: bool,
}

impl Default for TreeXmlOptions {
    fn default() -> Self {
        TreeXmlOptions {
            root_element: "tree".to_string(),
            item_element: "item".to_string(),
            id_attribute: "id".to_string(),
            value_attribute: "value".to_string(),
            pretty_print: false,
        }
    }
}
