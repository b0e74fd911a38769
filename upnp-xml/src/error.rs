//! Error types for the XML mapping engine

use thiserror::Error;

/// Errors that can occur while mapping entities to or from XML documents
#[derive(Debug, Error)]
pub enum XmlError {
    /// Malformed or structurally invalid document content
    ///
    /// Carries the wire name of the offending element or attribute and a
    /// description of the underlying parse failure.
    #[error("malformed content in `{name}`: {cause}")]
    Decode { name: String, cause: String },

    /// The document ended while an element was still open
    #[error("document truncated inside `{name}`")]
    Truncated { name: String },

    /// Low-level XML syntax error from the underlying reader or writer
    #[error("XML syntax error: {0}")]
    Syntax(#[from] quick_xml::Error),

    /// Contract violation by the calling code
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// API misuse ordering, e.g. writing an attribute after element content
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
}

impl XmlError {
    /// Decode error naming the offending element or attribute
    pub fn decode(name: impl Into<String>, cause: impl ToString) -> Self {
        XmlError::Decode {
            name: name.into(),
            cause: cause.to_string(),
        }
    }
}

impl From<std::io::Error> for XmlError {
    fn from(error: std::io::Error) -> Self {
        XmlError::Syntax(quick_xml::Error::from(error))
    }
}

/// Result type alias for mapping operations
pub type XmlResult<T> = Result<T, XmlError>;
