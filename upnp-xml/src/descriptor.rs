//! Declarative field descriptors and the per-entity descriptor table.
//!
//! Each entity type declares one static [`FieldTable`] describing how its
//! fields map onto XML attributes, child elements, element collections, or
//! text content. The table is built once with [`FieldTable::builder`] and
//! consumed by the generic serialize/deserialize drivers; declaration order
//! in the builder is the wire order on write.

use crate::cursor::Cursor;
use crate::entity::XmlEntity;
use crate::error::XmlResult;
use crate::writer::XmlWriter;

/// How a mapped field appears on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// An attribute on the entity's own element
    Attribute,
    /// A child element (scalar text or a nested entity)
    Element,
    /// A wrapping element containing one child element per collection item
    ElementCollection,
    /// Text content of the entity's own element
    Text,
}

/// Describes one mapped field of an entity type
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// Wire kind of the field
    pub kind: FieldKind,
    /// Wire name of the attribute or element
    pub name: &'static str,
    /// Per-item element name, for collections only
    pub item_name: Option<&'static str>,
    /// Position among sibling descriptors, assigned by declaration order
    pub order: usize,
    /// Skip serialization entirely when the value is unset
    pub omit_if_absent: bool,
}

/// Reads a field's serialized value; `None` means the value is absent
pub type GetFn<E> = fn(&E) -> Option<String>;

/// Stores a decoded attribute or text value on the entity
pub type SetFn<E> = fn(&mut E, &str) -> XmlResult<()>;

/// Reports whether a field currently holds a value worth serializing
pub type PresentFn<E> = fn(&E) -> bool;

/// Writes a field's content into the element the driver opened for it
pub type EmitFn<E> = fn(&E, &mut XmlWriter) -> XmlResult<()>;

/// Populates a field from the child element the cursor is positioned on
pub type ParseFn<E> = fn(&mut E, &mut Cursor<'_>, &<E as XmlEntity>::Context) -> XmlResult<()>;

/// The accessors paired with one descriptor
pub enum FieldBinding<E: XmlEntity> {
    Attribute {
        get: GetFn<E>,
        set: SetFn<E>,
    },
    Element {
        present: PresentFn<E>,
        emit: EmitFn<E>,
        parse: ParseFn<E>,
    },
    Collection {
        present: PresentFn<E>,
        emit_items: EmitFn<E>,
        parse_item: ParseFn<E>,
    },
    Text {
        get: GetFn<E>,
        set: SetFn<E>,
    },
}

/// One descriptor plus its accessors
pub struct Field<E: XmlEntity> {
    pub descriptor: FieldDescriptor,
    pub binding: FieldBinding<E>,
}

/// The statically declared descriptor table for one entity type
///
/// Attribute descriptors always precede element descriptors on write,
/// matching the document structure; within each group the declaration
/// order is preserved.
pub struct FieldTable<E: XmlEntity> {
    element: &'static str,
    attributes: Vec<Field<E>>,
    elements: Vec<Field<E>>,
    text: Option<Field<E>>,
}

impl<E: XmlEntity> FieldTable<E> {
    /// Start declaring the table for an entity serialized as `element`
    pub fn builder(element: &'static str) -> TableBuilder<E> {
        TableBuilder {
            element,
            attributes: Vec::new(),
            elements: Vec::new(),
            text: None,
            order: 0,
        }
    }

    /// Wire name of the entity's own element
    pub fn element(&self) -> &'static str {
        self.element
    }

    pub fn attributes(&self) -> &[Field<E>] {
        &self.attributes
    }

    pub fn elements(&self) -> &[Field<E>] {
        &self.elements
    }

    pub fn text_field(&self) -> Option<&Field<E>> {
        self.text.as_ref()
    }

    /// Look up an attribute descriptor by wire name
    pub fn attribute_field(&self, name: &str) -> Option<&Field<E>> {
        self.attributes.iter().find(|f| f.descriptor.name == name)
    }

    /// Look up an element or collection descriptor by wire name
    pub fn element_field(&self, name: &str) -> Option<&Field<E>> {
        self.elements.iter().find(|f| f.descriptor.name == name)
    }
}

/// Builder for a [`FieldTable`]; field declaration order is wire order
pub struct TableBuilder<E: XmlEntity> {
    element: &'static str,
    attributes: Vec<Field<E>>,
    elements: Vec<Field<E>>,
    text: Option<Field<E>>,
    order: usize,
}

impl<E: XmlEntity> TableBuilder<E> {
    fn next_order(&mut self) -> usize {
        let order = self.order;
        self.order += 1;
        order
    }

    /// Declare an attribute; absent values are omitted on write
    pub fn attribute(mut self, name: &'static str, get: GetFn<E>, set: SetFn<E>) -> Self {
        let order = self.next_order();
        self.attributes.push(Field {
            descriptor: FieldDescriptor {
                kind: FieldKind::Attribute,
                name,
                item_name: None,
                order,
                omit_if_absent: true,
            },
            binding: FieldBinding::Attribute { get, set },
        });
        self
    }

    /// Declare a required child element; always written
    pub fn element(mut self, name: &'static str, emit: EmitFn<E>, parse: ParseFn<E>) -> Self {
        let order = self.next_order();
        self.elements.push(Field {
            descriptor: FieldDescriptor {
                kind: FieldKind::Element,
                name,
                item_name: None,
                order,
                omit_if_absent: false,
            },
            binding: FieldBinding::Element {
                present: |_| true,
                emit,
                parse,
            },
        });
        self
    }

    /// Declare an optional child element, skipped on write when absent
    pub fn optional_element(
        mut self,
        name: &'static str,
        present: PresentFn<E>,
        emit: EmitFn<E>,
        parse: ParseFn<E>,
    ) -> Self {
        let order = self.next_order();
        self.elements.push(Field {
            descriptor: FieldDescriptor {
                kind: FieldKind::Element,
                name,
                item_name: None,
                order,
                omit_if_absent: true,
            },
            binding: FieldBinding::Element {
                present,
                emit,
                parse,
            },
        });
        self
    }

    /// Declare an element collection: a wrapping element holding one
    /// `item_name` child per item; skipped on write when absent
    pub fn collection(
        mut self,
        name: &'static str,
        item_name: &'static str,
        present: PresentFn<E>,
        emit_items: EmitFn<E>,
        parse_item: ParseFn<E>,
    ) -> Self {
        let order = self.next_order();
        self.elements.push(Field {
            descriptor: FieldDescriptor {
                kind: FieldKind::ElementCollection,
                name,
                item_name: Some(item_name),
                order,
                omit_if_absent: true,
            },
            binding: FieldBinding::Collection {
                present,
                emit_items,
                parse_item,
            },
        });
        self
    }

    /// Declare the entity's element text content; excludes child elements
    pub fn text(mut self, get: GetFn<E>, set: SetFn<E>) -> Self {
        let order = self.next_order();
        self.text = Some(Field {
            descriptor: FieldDescriptor {
                kind: FieldKind::Text,
                name: "",
                item_name: None,
                order,
                omit_if_absent: true,
            },
            binding: FieldBinding::Text { get, set },
        });
        self
    }

    pub fn build(self) -> FieldTable<E> {
        FieldTable {
            element: self.element,
            attributes: self.attributes,
            elements: self.elements,
            text: self.text,
        }
    }
}
