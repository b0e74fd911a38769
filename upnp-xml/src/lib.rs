//! # upnp-xml
//!
//! Declarative XML field mapping for the UPnP description grammar.
//!
//! Entity types declare a static [`FieldTable`] mapping their fields onto
//! attributes, child elements, element collections, or text content; one
//! generic pair of drivers walks those tables against a document cursor or
//! writer. No runtime reflection is involved — the table is plain data plus
//! `fn` accessors, built once per type.
//!
//! Two extension seams keep the engine open for vendor-specific entities
//! without breaking the standard document structure:
//!
//! - [`XmlSerialize`] is a two-phase contract: an entity can write itself as
//!   a complete element, or write only its content into an element a caller
//!   opened (standard fields first, derived fields appended last).
//! - [`XmlExtension`] is a per-entity slot offered all unmatched content
//!   during parse; installed by the consumer's entity factory.
//!
//! Unknown elements and attributes are tolerated, never errors — the
//! forward-compatibility contract the description protocol requires.

pub mod cursor;
pub mod descriptor;
pub mod deserialize;
pub mod entity;
pub mod error;
pub mod extension;
pub mod serialize;
pub mod writer;

pub use cursor::Cursor;
pub use descriptor::{Field, FieldBinding, FieldDescriptor, FieldKind, FieldTable, TableBuilder};
pub use deserialize::deserialize_entity;
pub use entity::XmlEntity;
pub use error::{XmlError, XmlResult};
pub use extension::XmlExtension;
pub use serialize::{serialize_entity, serialize_members, XmlSerialize};
pub use writer::XmlWriter;
