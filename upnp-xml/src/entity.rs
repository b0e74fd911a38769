//! The contract a mapped entity type implements to be driven by the engine.

use crate::descriptor::FieldTable;
use crate::extension::XmlExtension;

/// A protocol entity described by a static field descriptor table.
///
/// Implementors declare their wire shape once in [`XmlEntity::table`] and are
/// then serialized and deserialized entirely by the generic drivers in
/// [`crate::serialize`] and [`crate::deserialize`].
pub trait XmlEntity: Sized {
    /// Shared context handed to element parse hooks during deserialization,
    /// typically the deserializer owning the factory and document state.
    type Context;

    /// The statically declared descriptor table for this entity type
    fn table() -> &'static FieldTable<Self>;

    /// Open polymorphic extension slot, consulted for unmatched content
    /// during deserialization and appended after the standard fields during
    /// serialization.
    fn extension(&self) -> Option<&dyn XmlExtension> {
        None
    }

    fn extension_mut(&mut self) -> Option<&mut (dyn XmlExtension + 'static)> {
        None
    }
}
