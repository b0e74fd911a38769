//! Fixed SOAP envelope/body framing for control and eventing messages.

use xmltree::Element;

use crate::error::TransportError;

/// SOAP envelope namespace
pub const SOAP_ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// SOAP encoding namespace, declared via `encodingStyle` on the envelope
pub const SOAP_ENCODING_NS: &str = "http://schemas.xmlsoap.org/soap/encoding/";

/// Frame a single request/response payload inside the fixed SOAP
/// envelope and body wrapper elements
pub fn write_envelope(payload: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?><s:Envelope xmlns:s="{SOAP_ENVELOPE_NS}" s:encodingStyle="{SOAP_ENCODING_NS}"><s:Body>{payload}</s:Body></s:Envelope>"#
    )
}

/// Unwrap a SOAP envelope and return the single payload element inside
/// its body.
///
/// A `Fault` element in the body is surfaced as [`TransportError::Fault`]
/// carrying the UPnP error code (500 when the fault carries none).
pub fn read_envelope(xml: &str) -> Result<Element, TransportError> {
    let envelope = Element::parse(xml.as_bytes())
        .map_err(|e| TransportError::Envelope(format!("unparseable envelope: {e}")))?;
    if envelope.name != "Envelope" {
        return Err(TransportError::Envelope(format!(
            "expected Envelope root, found {}",
            envelope.name
        )));
    }

    let body = envelope
        .get_child("Body")
        .ok_or_else(|| TransportError::Envelope("missing SOAP Body".to_string()))?;

    if let Some(fault) = body.get_child("Fault") {
        let error_code = fault
            .get_child("detail")
            .and_then(|detail| detail.get_child("UPnPError"))
            .and_then(|error| error.get_child("errorCode"))
            .and_then(|code| code.get_text())
            .and_then(|text| text.trim().parse::<u16>().ok())
            .unwrap_or(500);
        return Err(TransportError::Fault(error_code));
    }

    body.children
        .iter()
        .find_map(|node| node.as_element())
        .cloned()
        .ok_or_else(|| TransportError::Envelope("empty SOAP Body".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_envelope_frames_payload() {
        let envelope = write_envelope("<u:GetVolume xmlns:u=\"urn:svc\"/>");

        assert!(envelope.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
        assert!(envelope.contains(r#"xmlns:s="http://schemas.xmlsoap.org/soap/envelope/""#));
        assert!(envelope
            .contains(r#"s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/""#));
        assert!(envelope.contains("<s:Body><u:GetVolume xmlns:u=\"urn:svc\"/></s:Body>"));
    }

    #[test]
    fn test_round_trip_through_envelope() {
        let envelope = write_envelope("<u:Probe xmlns:u=\"urn:svc\"><Level>7</Level></u:Probe>");

        let payload = read_envelope(&envelope).unwrap();
        assert_eq!(payload.name, "Probe");
        let level = payload.get_child("Level").unwrap().get_text().unwrap();
        assert_eq!(level, "7");
    }

    #[test]
    fn test_read_envelope_surfaces_fault_code() {
        let xml = r#"
            <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
                <s:Body>
                    <s:Fault>
                        <faultcode>s:Client</faultcode>
                        <faultstring>UPnPError</faultstring>
                        <detail>
                            <UPnPError xmlns="urn:schemas-upnp-org:control-1-0">
                                <errorCode>401</errorCode>
                                <errorDescription>Invalid Action</errorDescription>
                            </UPnPError>
                        </detail>
                    </s:Fault>
                </s:Body>
            </s:Envelope>
        "#;

        match read_envelope(xml) {
            Err(TransportError::Fault(code)) => assert_eq!(code, 401),
            other => panic!("expected fault, got {other:?}"),
        }
    }

    #[test]
    fn test_read_envelope_fault_without_code_defaults() {
        let xml = r#"
            <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
                <s:Body>
                    <s:Fault>
                        <faultcode>s:Server</faultcode>
                        <faultstring>Internal Error</faultstring>
                    </s:Fault>
                </s:Body>
            </s:Envelope>
        "#;

        match read_envelope(xml) {
            Err(TransportError::Fault(code)) => assert_eq!(code, 500),
            other => panic!("expected fault, got {other:?}"),
        }
    }

    #[test]
    fn test_read_envelope_missing_body() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"></s:Envelope>"#;

        match read_envelope(xml) {
            Err(TransportError::Envelope(message)) => assert!(message.contains("missing SOAP Body")),
            other => panic!("expected envelope error, got {other:?}"),
        }
    }

    #[test]
    fn test_read_envelope_empty_body() {
        let xml = r#"
            <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
                <s:Body></s:Body>
            </s:Envelope>
        "#;

        match read_envelope(xml) {
            Err(TransportError::Envelope(message)) => assert!(message.contains("empty SOAP Body")),
            other => panic!("expected envelope error, got {other:?}"),
        }
    }
}
