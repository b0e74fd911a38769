//! Error types for description parsing and live control state

use soap_client::TransportError;
use thiserror::Error;
use upnp_xml::XmlError;

/// Errors surfaced by the description and control layer
#[derive(Debug, Error)]
pub enum UpnpError {
    /// Malformed or structurally invalid document content
    #[error("description decode failed: {0}")]
    Decode(#[from] XmlError),

    /// The device could not be reached or the transport failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A description fetch completed with a non-success HTTP status
    #[error("unexpected HTTP status {status} fetching {url}")]
    Http { status: u16, url: String },

    /// API misuse ordering, e.g. resolving a URL before a root was parsed
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Contract violation by the calling code
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type alias for description operations
pub type Result<T> = std::result::Result<T, UpnpError>;
