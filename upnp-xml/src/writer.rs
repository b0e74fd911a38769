//! Push writer over `quick_xml::Writer`.
//!
//! The start tag of the innermost element is kept pending until content is
//! written, so attributes can still be added to the currently open element —
//! the shape the serialize driver needs when an entity writes its attributes
//! before recursing into children.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{XmlError, XmlResult};

struct PendingStart {
    name: String,
    attributes: Vec<(String, String)>,
}

/// Forward-only XML writer producing a UTF-8 document string
pub struct XmlWriter {
    inner: Writer<Vec<u8>>,
    pending: Option<PendingStart>,
    open: Vec<String>,
}

impl XmlWriter {
    pub fn new() -> Self {
        XmlWriter {
            inner: Writer::new(Vec::new()),
            pending: None,
            open: Vec::new(),
        }
    }

    /// Create a writer that starts the output with an XML declaration
    pub fn with_declaration() -> XmlResult<Self> {
        let mut writer = Self::new();
        writer
            .inner
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        Ok(writer)
    }

    fn flush_pending(&mut self) -> XmlResult<()> {
        if let Some(pending) = self.pending.take() {
            let mut start = BytesStart::new(pending.name.as_str());
            for (name, value) in &pending.attributes {
                start.push_attribute((name.as_str(), value.as_str()));
            }
            self.inner.write_event(Event::Start(start))?;
        }
        Ok(())
    }

    /// Open a new element nested in the current one
    pub fn open(&mut self, name: &str) -> XmlResult<()> {
        self.flush_pending()?;
        self.pending = Some(PendingStart {
            name: name.to_string(),
            attributes: Vec::new(),
        });
        self.open.push(name.to_string());
        Ok(())
    }

    /// Add an attribute to the element opened last.
    ///
    /// Fails with `InvalidOperation` once any content has been written into
    /// that element — attributes belong to the start tag only.
    pub fn attribute(&mut self, name: &str, value: &str) -> XmlResult<()> {
        match self.pending.as_mut() {
            Some(pending) => {
                pending.attributes.push((name.to_string(), value.to_string()));
                Ok(())
            }
            None => Err(XmlError::InvalidOperation(format!(
                "attribute `{name}` written after element content"
            ))),
        }
    }

    /// Write escaped text content into the current element
    pub fn text(&mut self, value: &str) -> XmlResult<()> {
        if self.open.is_empty() {
            return Err(XmlError::InvalidOperation(
                "text written outside an open element".to_string(),
            ));
        }
        self.flush_pending()?;
        self.inner.write_event(Event::Text(BytesText::new(value)))?;
        Ok(())
    }

    /// Close the current element; an element with no content is written
    /// self-closing
    pub fn close(&mut self) -> XmlResult<()> {
        let name = self.open.pop().ok_or_else(|| {
            XmlError::InvalidOperation("close with no open element".to_string())
        })?;
        if let Some(pending) = self.pending.take() {
            let mut start = BytesStart::new(pending.name.as_str());
            for (attr_name, value) in &pending.attributes {
                start.push_attribute((attr_name.as_str(), value.as_str()));
            }
            self.inner.write_event(Event::Empty(start))?;
        } else {
            self.inner.write_event(Event::End(BytesEnd::new(name.as_str())))?;
        }
        Ok(())
    }

    /// Finish writing and return the document string.
    ///
    /// Fails with `InvalidOperation` if any element is still open.
    pub fn into_string(mut self) -> XmlResult<String> {
        self.flush_pending()?;
        if let Some(name) = self.open.last() {
            return Err(XmlError::InvalidOperation(format!(
                "document finished while `{name}` is still open"
            )));
        }
        String::from_utf8(self.inner.into_inner()).map_err(|e| {
            XmlError::InvalidOperation(format!("writer produced invalid UTF-8: {e}"))
        })
    }
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_then_children() {
        let mut writer = XmlWriter::new();
        writer.open("stateVariable").unwrap();
        writer.attribute("sendEvents", "yes").unwrap();
        writer.open("name").unwrap();
        writer.text("Volume").unwrap();
        writer.close().unwrap();
        writer.close().unwrap();

        assert_eq!(
            writer.into_string().unwrap(),
            r#"<stateVariable sendEvents="yes"><name>Volume</name></stateVariable>"#
        );
    }

    #[test]
    fn test_empty_element_is_self_closing() {
        let mut writer = XmlWriter::new();
        writer.open("argument").unwrap();
        writer.open("retval").unwrap();
        writer.close().unwrap();
        writer.close().unwrap();

        assert_eq!(
            writer.into_string().unwrap(),
            r#"<argument><retval/></argument>"#
        );
    }

    #[test]
    fn test_text_is_escaped() {
        let mut writer = XmlWriter::new();
        writer.open("friendlyName").unwrap();
        writer.text("Living Room <AV> & more").unwrap();
        writer.close().unwrap();

        assert_eq!(
            writer.into_string().unwrap(),
            r#"<friendlyName>Living Room &lt;AV&gt; &amp; more</friendlyName>"#
        );
    }

    #[test]
    fn test_attribute_after_content_is_rejected() {
        let mut writer = XmlWriter::new();
        writer.open("device").unwrap();
        writer.text("content").unwrap();

        let result = writer.attribute("late", "value");
        assert!(matches!(result, Err(XmlError::InvalidOperation(_))));
    }

    #[test]
    fn test_unbalanced_document_is_rejected() {
        let mut writer = XmlWriter::new();
        writer.open("root").unwrap();

        let result = writer.into_string();
        assert!(matches!(result, Err(XmlError::InvalidOperation(_))));
    }

    #[test]
    fn test_declaration() {
        let mut writer = XmlWriter::with_declaration().unwrap();
        writer.open("root").unwrap();
        writer.close().unwrap();

        let xml = writer.into_string().unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
    }
}
