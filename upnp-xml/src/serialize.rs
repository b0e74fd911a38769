//! Generic serialize driver walking an entity's descriptor table.

use crate::descriptor::FieldBinding;
use crate::entity::XmlEntity;
use crate::error::XmlResult;
use crate::writer::XmlWriter;

/// The two-phase serialization contract.
///
/// `serialize_self_and_members` opens the entity's own element and writes
/// everything into it; `serialize_members_only` writes the same content into
/// an element the caller already opened. The ordering contract is standard
/// fields first, extension fields last, so a reader expecting only the
/// standard grammar still finds a structurally valid element.
pub trait XmlSerialize {
    fn serialize_self_and_members(&self, writer: &mut XmlWriter) -> XmlResult<()>;

    fn serialize_members_only(&self, writer: &mut XmlWriter) -> XmlResult<()>;
}

impl<E: XmlEntity + 'static> XmlSerialize for E {
    fn serialize_self_and_members(&self, writer: &mut XmlWriter) -> XmlResult<()> {
        serialize_entity(self, writer)
    }

    fn serialize_members_only(&self, writer: &mut XmlWriter) -> XmlResult<()> {
        serialize_members(self, writer)
    }
}

/// Write the entity as its own element, content included
pub fn serialize_entity<E: XmlEntity + 'static>(entity: &E, writer: &mut XmlWriter) -> XmlResult<()> {
    writer.open(E::table().element())?;
    serialize_members(entity, writer)?;
    writer.close()
}

/// Write the entity's attributes and children into the element the caller
/// opened, descriptors in declared order, extension fields last.
///
/// An absent value is skipped when its descriptor allows omission and
/// written empty otherwise; a present value is never omitted.
pub fn serialize_members<E: XmlEntity + 'static>(entity: &E, writer: &mut XmlWriter) -> XmlResult<()> {
    let table = E::table();

    for field in table.attributes() {
        if let FieldBinding::Attribute { get, .. } = &field.binding {
            match get(entity) {
                Some(value) => writer.attribute(field.descriptor.name, &value)?,
                None if !field.descriptor.omit_if_absent => {
                    writer.attribute(field.descriptor.name, "")?
                }
                None => {}
            }
        }
    }

    if let Some(field) = table.text_field() {
        if let FieldBinding::Text { get, .. } = &field.binding {
            if let Some(value) = get(entity) {
                writer.text(&value)?;
            }
        }
    }

    for field in table.elements() {
        match &field.binding {
            FieldBinding::Element { present, emit, .. } => {
                if present(entity) {
                    writer.open(field.descriptor.name)?;
                    emit(entity, writer)?;
                    writer.close()?;
                } else if !field.descriptor.omit_if_absent {
                    writer.open(field.descriptor.name)?;
                    writer.close()?;
                }
            }
            FieldBinding::Collection {
                present,
                emit_items,
                ..
            } => {
                if present(entity) {
                    writer.open(field.descriptor.name)?;
                    emit_items(entity, writer)?;
                    writer.close()?;
                }
            }
            _ => {}
        }
    }

    if let Some(extension) = entity.extension() {
        extension.serialize_members_only(writer)?;
    }

    Ok(())
}
