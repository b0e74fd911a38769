//! Open extension slot for vendor- and subclass-specific entity content.
//!
//! Standard entities stay plain structs; a consumer that needs extra fields
//! on a standard element installs an `XmlExtension` through its entity
//! factory instead of subclassing. During deserialization the engine offers
//! the extension every attribute and child element no descriptor matched;
//! during serialization the extension's fields are appended after the
//! standard ones, so the element stays structurally valid for plain readers.

use std::fmt;

use crate::cursor::Cursor;
use crate::error::XmlResult;
use crate::writer::XmlWriter;

pub trait XmlExtension: fmt::Debug + Send + Sync {
    /// Offered each attribute no descriptor matched.
    ///
    /// Return `Ok(true)` when the attribute was consumed; unclaimed
    /// attributes are ignored by the engine.
    fn deserialize_attribute(&mut self, name: &str, value: &str) -> XmlResult<bool> {
        let _ = (name, value);
        Ok(false)
    }

    /// Offered each child element no descriptor matched, with the cursor
    /// positioned on that element.
    ///
    /// Return `Ok(true)` when the element was consumed. The engine restores
    /// the cursor position afterwards either way, so an extension cannot
    /// disturb parse ordering for the rest of the document.
    fn deserialize_element(&mut self, cursor: &mut Cursor<'_>) -> XmlResult<bool> {
        let _ = cursor;
        Ok(false)
    }

    /// Write the extension's fields into the owning entity's element,
    /// after the standard fields.
    fn serialize_members_only(&self, writer: &mut XmlWriter) -> XmlResult<()>;
}
