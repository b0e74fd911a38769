//! Device entity of a description: identity fields plus the owned trees of
//! icons, services, and embedded devices.

use once_cell::sync::Lazy;
use url::Url;
use upnp_xml::{FieldTable, XmlEntity, XmlExtension, XmlSerialize, XmlWriter, XmlResult};

use crate::deserializer::Deserializer;
use crate::icon::Icon;
use crate::service::Service;

/// One device of a description tree.
///
/// Ownership is strictly hierarchical: a device owns its icons, services,
/// and embedded devices, and nothing else holds them. The collections are
/// populated during deserialization and read-only afterwards.
#[derive(Debug, Default)]
pub struct Device {
    device_type: String,
    friendly_name: String,
    manufacturer: String,
    manufacturer_url: Option<Url>,
    model_description: Option<String>,
    model_name: String,
    model_number: Option<String>,
    model_url: Option<Url>,
    serial_number: Option<String>,
    udn: String,
    upc: Option<String>,
    icons: Vec<Icon>,
    services: Vec<Service>,
    devices: Vec<Device>,
    presentation_url: Option<Url>,
    extension: Option<Box<dyn XmlExtension>>,
}

impl Device {
    pub fn device_type(&self) -> &str {
        &self.device_type
    }

    pub fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    pub fn manufacturer_url(&self) -> Option<&Url> {
        self.manufacturer_url.as_ref()
    }

    pub fn model_description(&self) -> Option<&str> {
        self.model_description.as_deref()
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn model_number(&self) -> Option<&str> {
        self.model_number.as_deref()
    }

    pub fn model_url(&self) -> Option<&Url> {
        self.model_url.as_ref()
    }

    pub fn serial_number(&self) -> Option<&str> {
        self.serial_number.as_deref()
    }

    /// Unique device name, e.g. `uuid:...`
    pub fn udn(&self) -> &str {
        &self.udn
    }

    pub fn upc(&self) -> Option<&str> {
        self.upc.as_deref()
    }

    pub fn icons(&self) -> &[Icon] {
        &self.icons
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    /// Embedded child devices
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn presentation_url(&self) -> Option<&Url> {
        self.presentation_url.as_ref()
    }

    /// Find a service anywhere in this device tree by service type
    pub fn find_service(&self, service_type: &str) -> Option<&Service> {
        self.services
            .iter()
            .find(|s| s.service_type() == service_type)
            .or_else(|| {
                self.devices
                    .iter()
                    .find_map(|d| d.find_service(service_type))
            })
    }

    /// Install an extension slot; used by custom factories
    pub fn set_extension(&mut self, extension: Box<dyn XmlExtension>) {
        self.extension = Some(extension);
    }
}

fn optional_text(value: &Option<String>, writer: &mut XmlWriter) -> XmlResult<()> {
    if let Some(value) = value {
        writer.text(value)?;
    }
    Ok(())
}

fn optional_url(value: &Option<Url>, writer: &mut XmlWriter) -> XmlResult<()> {
    if let Some(url) = value {
        writer.text(url.as_str())?;
    }
    Ok(())
}

impl XmlEntity for Device {
    type Context = Deserializer;

    fn table() -> &'static FieldTable<Self> {
        static TABLE: Lazy<FieldTable<Device>> = Lazy::new(|| {
            FieldTable::<Device>::builder("device")
                .element(
                    "deviceType",
                    |d, w| w.text(&d.device_type),
                    |d, cur, _| {
                        d.device_type = cur.text()?;
                        Ok(())
                    },
                )
                .element(
                    "friendlyName",
                    |d, w| w.text(&d.friendly_name),
                    |d, cur, _| {
                        d.friendly_name = cur.text()?;
                        Ok(())
                    },
                )
                .element(
                    "manufacturer",
                    |d, w| w.text(&d.manufacturer),
                    |d, cur, _| {
                        d.manufacturer = cur.text()?;
                        Ok(())
                    },
                )
                .optional_element(
                    "manufacturerURL",
                    |d| d.manufacturer_url.is_some(),
                    |d, w| optional_url(&d.manufacturer_url, w),
                    |d, cur, ctx| {
                        d.manufacturer_url = Some(ctx.resolve_url(&cur.text()?)?);
                        Ok(())
                    },
                )
                .optional_element(
                    "modelDescription",
                    |d| d.model_description.is_some(),
                    |d, w| optional_text(&d.model_description, w),
                    |d, cur, _| {
                        d.model_description = Some(cur.text()?);
                        Ok(())
                    },
                )
                .element(
                    "modelName",
                    |d, w| w.text(&d.model_name),
                    |d, cur, _| {
                        d.model_name = cur.text()?;
                        Ok(())
                    },
                )
                .optional_element(
                    "modelNumber",
                    |d| d.model_number.is_some(),
                    |d, w| optional_text(&d.model_number, w),
                    |d, cur, _| {
                        d.model_number = Some(cur.text()?);
                        Ok(())
                    },
                )
                .optional_element(
                    "modelURL",
                    |d| d.model_url.is_some(),
                    |d, w| optional_url(&d.model_url, w),
                    |d, cur, ctx| {
                        d.model_url = Some(ctx.resolve_url(&cur.text()?)?);
                        Ok(())
                    },
                )
                .optional_element(
                    "serialNumber",
                    |d| d.serial_number.is_some(),
                    |d, w| optional_text(&d.serial_number, w),
                    |d, cur, _| {
                        d.serial_number = Some(cur.text()?);
                        Ok(())
                    },
                )
                .element(
                    "UDN",
                    |d, w| w.text(&d.udn),
                    |d, cur, _| {
                        d.udn = cur.text()?;
                        Ok(())
                    },
                )
                .optional_element(
                    "UPC",
                    |d| d.upc.is_some(),
                    |d, w| optional_text(&d.upc, w),
                    |d, cur, _| {
                        d.upc = Some(cur.text()?);
                        Ok(())
                    },
                )
                .collection(
                    "iconList",
                    "icon",
                    |d| !d.icons.is_empty(),
                    |d, w| {
                        for icon in &d.icons {
                            icon.serialize_self_and_members(w)?;
                        }
                        Ok(())
                    },
                    |d, cur, ctx| {
                        d.icons.push(ctx.deserialize_icon(cur)?);
                        Ok(())
                    },
                )
                .collection(
                    "serviceList",
                    "service",
                    |d| !d.services.is_empty(),
                    |d, w| {
                        for service in &d.services {
                            service.serialize_self_and_members(w)?;
                        }
                        Ok(())
                    },
                    |d, cur, ctx| {
                        d.services.push(ctx.deserialize_service(cur)?);
                        Ok(())
                    },
                )
                .collection(
                    "deviceList",
                    "device",
                    |d| !d.devices.is_empty(),
                    |d, w| {
                        for device in &d.devices {
                            device.serialize_self_and_members(w)?;
                        }
                        Ok(())
                    },
                    |d, cur, ctx| {
                        d.devices.push(ctx.deserialize_device(cur)?);
                        Ok(())
                    },
                )
                .optional_element(
                    "presentationURL",
                    |d| d.presentation_url.is_some(),
                    |d, w| optional_url(&d.presentation_url, w),
                    |d, cur, ctx| {
                        d.presentation_url = Some(ctx.resolve_url(&cur.text()?)?);
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
