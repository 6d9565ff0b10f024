//! Error types for treeid.

use thiserror::Error;

/// Result type alias for treeid operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error type used as the cause of a failed conversion.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur during treeid operations.
#[derive(Error, Debug)]
pub enum Error {
    /// An item with this key already exists in the factory.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    /// The parent item was not created by this factory.
    #[error("parent item is not managed by this factory")]
    ForeignParent,

    /// A factory produced a structurally broken root.
    #[error("broken root: {0}")]
    BrokenRoot(String),

    /// A key combinator was constructed with an empty separator.
    #[error("separator must not be empty")]
    EmptySeparator,

    /// A converter for this type pair is already registered.
    #[error("converter from {source_type} to {dest_type} is already registered")]
    ConverterAlreadyRegistered {
        /// Name of the source type.
        source_type: &'static str,
        /// Name of the destination type.
        dest_type: &'static str,
    },

    /// No registered converter matches the requested type pair.
    #[error("no converter found from {source_type} to {dest_type}")]
    NoConverterFound {
        /// Name of the source type.
        source_type: &'static str,
        /// Name of the destination type.
        dest_type: &'static str,
    },

    /// A converter was found but failed on the actual value.
    #[error("conversion from {source_type} to {dest_type} failed: {source}")]
    ConversionFailed {
        /// Name of the source type.
        source_type: &'static str,
        /// Name of the destination type.
        dest_type: &'static str,
        /// The underlying cause reported by the converter.
        #[source]
        source: BoxError,
    },

    /// Malformed tree XML.
    #[error("tree XML parse error: {0}")]
    Parse(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML error from quick-xml.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}
