//! Private SOAP/HTTP transport helper for UPnP device communication
//!
//! This crate provides the retrying fetch used to pull description
//! documents from devices, plus the fixed SOAP envelope framing used for
//! control invocations. It deliberately knows nothing about the description
//! grammar itself; decode failures and transport failures stay separate
//! error types so callers can distinguish an unreachable device from a
//! garbled document.

mod envelope;
mod error;

pub use envelope::{read_envelope, write_envelope, SOAP_ENCODING_NS, SOAP_ENVELOPE_NS};
pub use error::TransportError;

use std::time::Duration;

use xmltree::Element;

/// Response handed back by [`HttpClient::fetch_with_retry`].
///
/// Error statuses are returned rather than raised so callers can inspect
/// HTTP-level error bodies.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    status: u16,
    body: String,
}

impl FetchResponse {
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn into_body(self) -> String {
        self.body
    }

    fn from_response(response: ureq::Response) -> Result<Self, TransportError> {
        let status = response.status();
        let body = response
            .into_string()
            .map_err(|e| TransportError::Network(format!("failed reading response body: {e}")))?;
        Ok(FetchResponse { status, body })
    }
}

/// HTTP client for UPnP device communication with fixed timeouts
#[derive(Debug, Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
}

impl HttpClient {
    /// Create a client with the default connect/read timeouts
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(Duration::from_secs(5))
                .timeout_read(Duration::from_secs(10))
                .build(),
        }
    }

    /// Create a client with an explicit overall request timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    /// GET `url`, retrying timeouts up to `max_retries` times.
    ///
    /// An HTTP 504 gateway timeout is treated identically to a
    /// transport-level timeout. Once retries are exhausted, a timeout that
    /// produced a response yields that response; a response-less timeout
    /// fails with [`TransportError::Timeout`]. Non-timeout failures that
    /// carry a response yield the response immediately; failures with no
    /// response at all propagate as [`TransportError::Network`].
    pub fn fetch_with_retry(
        &self,
        url: &str,
        max_retries: u32,
    ) -> Result<FetchResponse, TransportError> {
        let mut retries_left = max_retries;
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match self.agent.get(url).call() {
                Ok(response) => return FetchResponse::from_response(response),
                Err(ureq::Error::Status(504, response)) => {
                    if retries_left > 0 {
                        retries_left -= 1;
                        tracing::debug!(url, attempts, "gateway timeout, retrying");
                    } else {
                        // exhausted: hand the timeout response back for inspection
                        return FetchResponse::from_response(response);
                    }
                }
                Err(ureq::Error::Status(_, response)) => {
                    return FetchResponse::from_response(response)
                }
                Err(ureq::Error::Transport(transport)) => {
                    if !is_timeout(&transport) {
                        return Err(TransportError::Network(transport.to_string()));
                    }
                    if retries_left > 0 {
                        retries_left -= 1;
                        tracing::debug!(url, attempts, "request timed out, retrying");
                    } else {
                        return Err(TransportError::Timeout {
                            url: url.to_string(),
                            attempts,
                        });
                    }
                }
            }
        }
    }

    /// Invoke a SOAP action: frame `payload` in the fixed envelope, POST it
    /// with the `SOAPACTION` header, and unwrap the `<action>Response`
    /// payload from the reply envelope
    pub fn post_soap(
        &self,
        url: &str,
        service_type: &str,
        action: &str,
        payload: &str,
    ) -> Result<Element, TransportError> {
        let body = write_envelope(&format!(
            r#"<u:{action} xmlns:u="{service_type}">{payload}</u:{action}>"#
        ));
        let soap_action = format!("\"{service_type}#{action}\"");

        let text = match self
            .agent
            .post(url)
            .set("Content-Type", "text/xml; charset=\"utf-8\"")
            .set("SOAPACTION", &soap_action)
            .send_string(&body)
        {
            Ok(response) => response
                .into_string()
                .map_err(|e| TransportError::Network(e.to_string()))?,
            // SOAP faults typically arrive as HTTP 500 with an envelope body
            Err(ureq::Error::Status(_, response)) => response
                .into_string()
                .map_err(|e| TransportError::Network(e.to_string()))?,
            Err(e) => return Err(TransportError::Network(e.to_string())),
        };

        let payload = read_envelope(&text)?;
        let expected = format!("{action}Response");
        if payload.name != expected {
            return Err(TransportError::Envelope(format!(
                "missing {expected} element"
            )));
        }
        Ok(payload)
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn is_timeout(transport: &ureq::Transport) -> bool {
    use std::error::Error as _;

    if transport.kind() != ureq::ErrorKind::Io {
        return false;
    }
    transport
        .source()
        .and_then(|source| source.downcast_ref::<std::io::Error>())
        .map(|io| {
            matches!(
                io.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            )
        })
        .unwrap_or(false)
}
