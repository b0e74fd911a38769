//! Icon entity of a device description.

use once_cell::sync::Lazy;
use url::Url;
use upnp_xml::{FieldTable, XmlEntity, XmlError, XmlExtension};

use crate::deserializer::Deserializer;

#[derive(Debug, Default)]
pub struct Icon {
    mime_type: String,
    width: u32,
    height: u32,
    depth: u32,
    url: Option<Url>,
    extension: Option<Box<dyn XmlExtension>>,
}

impl Icon {
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Color depth in bits
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Absolute URL of the icon image, resolved against the root's base
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// Install an extension slot; used by custom factories
    pub fn set_extension(&mut self, extension: Box<dyn XmlExtension>) {
        self.extension = Some(extension);
    }
}

impl XmlEntity for Icon {
    type Context = Deserializer;

    fn table() -> &'static FieldTable<Self> {
        static TABLE: Lazy<FieldTable<Icon>> = Lazy::new(|| {
            FieldTable::<Icon>::builder("icon")
                .element(
                    "mimetype",
                    |i, w| w.text(&i.mime_type),
                    |i, cur, _| {
                        i.mime_type = cur.text()?;
                        Ok(())
                    },
                )
                .element(
                    "width",
                    |i, w| w.text(&i.width.to_string()),
                    |i, cur, _| {
                        i.width = cur
                            .text()?
                            .trim()
                            .parse()
                            .map_err(|e| XmlError::decode("width", e))?;
                        Ok(())
                    },
                )
                .element(
                    "height",
                    |i, w| w.text(&i.height.to_string()),
                    |i, cur, _| {
                        i.height = cur
                            .text()?
                            .trim()
                            .parse()
                            .map_err(|e| XmlError::decode("height", e))?;
                        Ok(())
                    },
                )
                .element(
                    "depth",
                    |i, w| w.text(&i.depth.to_string()),
                    |i, cur, _| {
                        i.depth = cur
                            .text()?
                            .trim()
                            .parse()
                            .map_err(|e| XmlError::decode("depth", e))?;
                        Ok(())
                    },
                )
                .element(
                    "url",
                    |i, w| {
                        if let Some(url) = &i.url {
                            w.text(url.as_str())?;
                        }
                        Ok(())
                    },
                    |i, cur, ctx| {
                        i.url = Some(ctx.resolve_url(&cur.text()?)?);
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
