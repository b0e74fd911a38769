//! The root of a parsed device description.

use once_cell::sync::Lazy;
use url::Url;
use upnp_xml::{
    serialize_members, Cursor, FieldTable, XmlEntity, XmlError, XmlExtension, XmlResult,
    XmlSerialize, XmlWriter,
};

use crate::deserializer::{resolve_against, Deserializer, DEVICE_SCHEMA};
use crate::device::Device;
use crate::error::Result;

/// Architecture version block carried by descriptions and SCPDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpecVersion {
    major: u32,
    minor: u32,
}

impl SpecVersion {
    pub fn new(major: u32, minor: u32) -> Self {
        SpecVersion { major, minor }
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    /// Children are required in the fixed order `major` then `minor`;
    /// reordered documents are rejected.
    pub(crate) fn deserialize(cursor: &mut Cursor<'_>) -> XmlResult<Self> {
        if !cursor.next_child()? || cursor.element_name() != "major" {
            return Err(XmlError::decode(
                "specVersion",
                "expected `major` as the first child",
            ));
        }
        let major = cursor
            .text()?
            .trim()
            .parse()
            .map_err(|e| XmlError::decode("major", e))?;

        if !cursor.next_child()? || cursor.element_name() != "minor" {
            return Err(XmlError::decode(
                "specVersion",
                "expected `minor` after `major`",
            ));
        }
        let minor = cursor
            .text()?
            .trim()
            .parse()
            .map_err(|e| XmlError::decode("minor", e))?;

        while cursor.next_child()? {
            cursor.skip()?;
        }
        Ok(SpecVersion { major, minor })
    }

    /// Write `major` and `minor` into an element the caller opened
    pub fn serialize_members_only(&self, writer: &mut XmlWriter) -> XmlResult<()> {
        writer.open("major")?;
        writer.text(&self.major.to_string())?;
        writer.close()?;
        writer.open("minor")?;
        writer.text(&self.minor.to_string())?;
        writer.close()
    }
}

/// Root of one parsed device description.
///
/// Created once per document and never mutated afterwards; it fixes the
/// base URL every relative reference in the description resolves against.
/// The base starts as the description's own location and is replaced by a
/// `URLBase` element when the document carries one.
#[derive(Debug)]
pub struct Root {
    spec_version: SpecVersion,
    url_base: Url,
    device: Device,
    extension: Option<Box<dyn XmlExtension>>,
}

impl Root {
    pub fn new(location: Url) -> Self {
        Root {
            spec_version: SpecVersion::new(1, 0),
            url_base: location,
            device: Device::default(),
            extension: None,
        }
    }

    pub fn spec_version(&self) -> SpecVersion {
        self.spec_version
    }

    /// Base URL all relative references in this description resolve against
    pub fn url_base(&self) -> &Url {
        &self.url_base
    }

    /// The description's top-level device
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Resolve a reference against this description's base URL
    pub fn resolve_url(&self, raw: &str) -> XmlResult<Url> {
        resolve_against(&self.url_base, raw)
    }

    /// Install an extension slot; used by custom factories
    pub fn set_extension(&mut self, extension: Box<dyn XmlExtension>) {
        self.extension = Some(extension);
    }

    /// Serialize the description back to a document string
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = XmlWriter::with_declaration()?;
        self.serialize_self_and_members(&mut writer)?;
        Ok(writer.into_string()?)
    }
}

impl XmlEntity for Root {
    type Context = Deserializer;

    fn table() -> &'static FieldTable<Self> {
        static TABLE: Lazy<FieldTable<Root>> = Lazy::new(|| {
            FieldTable::<Root>::builder("root")
                .attribute("xmlns", |_| Some(DEVICE_SCHEMA.to_string()), |_, _| Ok(()))
                .element(
                    "specVersion",
                    |root, w| root.spec_version.serialize_members_only(w),
                    |root, cur, _ctx| {
                        root.spec_version = SpecVersion::deserialize(cur)?;
                        Ok(())
                    },
                )
                .optional_element(
                    "URLBase",
                    // the base is folded into every resolved URL, so the
                    // element is not written back out
                    |_| false,
                    |_, _| Ok(()),
                    |root, cur, ctx| {
                        let raw = cur.text()?;
                        let url = Url::parse(raw.trim())
                            .map_err(|e| XmlError::decode("URLBase", e))?;
                        ctx.set_base_url(url.clone());
                        root.url_base = url;
                        Ok(())
                    },
                )
                .element(
                    "device",
                    |root, w| serialize_members(&root.device, w),
                    |root, cur, ctx| {
                        root.device = ctx.deserialize_device(cur)?;
                        Ok(())
                    },
                )
                .build()
        });
        &TABLE
    }

    fn extension(&self) -> Option<&dyn XmlExtension> {
        self.extension.as_deref()
    }

    fn extension_mut(&mut self) -> Option<&mut (dyn XmlExtension + '_)> {
        self.extension.as_deref_mut()
    }
}
