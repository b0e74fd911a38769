//! Generic deserialize driver walking a document cursor against an
//! entity's descriptor table.

use crate::cursor::Cursor;
use crate::descriptor::{Field, FieldBinding};
use crate::entity::XmlEntity;
use crate::error::{XmlError, XmlResult};

/// Populate `entity` from the element the cursor is positioned on.
///
/// Attributes are matched by name; unmatched attributes are offered to the
/// entity's extension and otherwise ignored. Child elements are dispatched
/// by name to the matching descriptor; an element with no descriptor is
/// offered to the extension and otherwise skipped with its whole subtree —
/// the forward-compatibility contract for protocol evolution. Any decode
/// error aborts the entity. On return the element is fully consumed and the
/// cursor is back on the parent.
pub fn deserialize_entity<E: XmlEntity + 'static>(
    entity: &mut E,
    cursor: &mut Cursor<'_>,
    context: &E::Context,
) -> XmlResult<()> {
    let table = E::table();
    let element = cursor.element_name().to_string();

    for (name, value) in cursor.take_attributes() {
        match table.attribute_field(&name) {
            Some(field) => {
                if let FieldBinding::Attribute { set, .. } = &field.binding {
                    set(entity, &value).map_err(|e| named_decode(e, &name))?;
                }
            }
            None => {
                let handled = match entity.extension_mut() {
                    Some(extension) => extension.deserialize_attribute(&name, &value)?,
                    None => false,
                };
                if !handled {
                    tracing::debug!(element = %element, attribute = %name, "ignoring unknown attribute");
                }
            }
        }
    }

    if let Some(field) = table.text_field() {
        if let FieldBinding::Text { set, .. } = &field.binding {
            let value = cursor.text()?;
            set(entity, &value).map_err(|e| named_decode(e, &element))?;
        }
        return Ok(());
    }

    let own_depth = cursor.depth();
    while cursor.next_child()? {
        let child = cursor.element_name().to_string();
        match table.element_field(&child) {
            Some(field) => match &field.binding {
                FieldBinding::Element { parse, .. } => {
                    parse(entity, cursor, context).map_err(|e| named_decode(e, &child))?;
                }
                FieldBinding::Collection { .. } => {
                    deserialize_collection(entity, cursor, context, field)?;
                }
                _ => cursor.skip()?,
            },
            None => {
                let handled = match entity.extension_mut() {
                    Some(extension) => extension.deserialize_element(cursor)?,
                    None => false,
                };
                if !handled {
                    tracing::debug!(element = %element, child = %child, "skipping unknown element");
                }
            }
        }
        // the dispatched hook may have under-consumed its element
        cursor.pop_to(own_depth)?;
    }
    Ok(())
}

/// Accumulate one entry per matching child of the collection's wrapping
/// element, stopping at the first non-matching sibling or the wrapper's
/// close tag; the remaining children are consumed without accumulating.
fn deserialize_collection<E: XmlEntity>(
    entity: &mut E,
    cursor: &mut Cursor<'_>,
    context: &E::Context,
    field: &Field<E>,
) -> XmlResult<()> {
    let FieldBinding::Collection { parse_item, .. } = &field.binding else {
        return Ok(());
    };
    let item_name = field.descriptor.item_name.unwrap_or_default();
    let wrapper_depth = cursor.depth();
    let mut accumulating = true;
    while cursor.next_child()? {
        if accumulating && cursor.element_name() == item_name {
            parse_item(entity, cursor, context).map_err(|e| named_decode(e, item_name))?;
        } else {
            accumulating = false;
        }
        cursor.pop_to(wrapper_depth)?;
    }
    Ok(())
}

fn named_decode(error: XmlError, name: &str) -> XmlError {
    match error {
        decode @ XmlError::Decode { .. } => decode,
        truncated @ XmlError::Truncated { .. } => truncated,
        other @ XmlError::Syntax(_) => other,
        other => XmlError::Decode {
            name: name.to_string(),
            cause: other.to_string(),
        },
    }
}
