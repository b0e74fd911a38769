//! Error types for the transport helper

use thiserror::Error;

/// Errors that can occur during device communication
///
/// Kept distinct from description decode errors so callers can tell
/// "couldn't reach the device" apart from "the device sent garbage".
#[derive(Debug, Error)]
pub enum TransportError {
    /// Transport-level failure that produced no response to inspect
    #[error("network error: {0}")]
    Network(String),

    /// Every attempt timed out and no response was ever received
    #[error("request to {url} timed out after {attempts} attempts")]
    Timeout { url: String, attempts: u32 },

    /// SOAP envelope was missing or malformed
    #[error("SOAP envelope error: {0}")]
    Envelope(String),

    /// SOAP fault returned by the device
    #[error("SOAP fault: error code {0}")]
    Fault(u16),
}
