//! Document deserialization: the injectable entity factory, base-URL
//! tracking for a parse in progress, and relative URL resolution.

use parking_lot::RwLock;
use url::Url;
use upnp_xml::{deserialize_entity, Cursor, XmlError, XmlResult};

use crate::control::{ServiceAction, ServiceController, StateVariable};
use crate::device::Device;
use crate::error::{Result, UpnpError};
use crate::icon::Icon;
use crate::root::Root;
use crate::service::Service;

/// Namespace of device description documents
pub const DEVICE_SCHEMA: &str = "urn:schemas-upnp-org:device-1-0";

/// Namespace of service control documents
pub const SERVICE_SCHEMA: &str = "urn:schemas-upnp-org:service-1-0";

/// Per-entity-kind construction hooks for polymorphic parsing.
///
/// The deserializer asks the factory for each instance before populating it,
/// so a consumer can substitute entities carrying vendor extension slots
/// without the engine knowing about them. Hooks receive at most the document
/// location — never a document cursor — so substituted types cannot violate
/// parse ordering. The default implementation of every hook returns the
/// base protocol type.
pub trait DescriptionFactory: Send + Sync {
    fn create_root(&self, location: &Url) -> Root {
        Root::new(location.clone())
    }

    fn create_device(&self) -> Device {
        Device::default()
    }

    fn create_service(&self) -> Service {
        Service::default()
    }

    fn create_icon(&self) -> Icon {
        Icon::default()
    }

    fn create_action(&self) -> ServiceAction {
        ServiceAction::default()
    }

    fn create_state_variable(&self) -> StateVariable {
        StateVariable::default()
    }

    fn create_controller(&self) -> ServiceController {
        ServiceController::default()
    }
}

/// Factory producing the base protocol types
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFactory;

impl DescriptionFactory for DefaultFactory {}

/// Drives description parsing under one document context.
///
/// One deserializer serves one document at a time; parse several documents
/// concurrently with one deserializer each.
pub struct Deserializer {
    factory: Box<dyn DescriptionFactory>,
    base_url: RwLock<Option<Url>>,
}

impl Deserializer {
    pub fn new() -> Self {
        Self::with_factory(Box::new(DefaultFactory))
    }

    /// Create a deserializer that constructs entities through `factory`
    pub fn with_factory(factory: Box<dyn DescriptionFactory>) -> Self {
        Deserializer {
            factory,
            base_url: RwLock::new(None),
        }
    }

    /// Base URL of the description being (or last) parsed
    pub fn base_url(&self) -> Option<Url> {
        self.base_url.read().clone()
    }

    pub(crate) fn set_base_url(&self, url: Url) {
        *self.base_url.write() = Some(url);
    }

    /// Resolve a URL reference found inside the current description.
    ///
    /// An absolute URL is returned unchanged; a relative reference is joined
    /// against the root's base URL; anything else fails with a decode error
    /// naming the offending string. Resolving before a root has been parsed
    /// is a programmer error.
    pub fn resolve_url(&self, raw: &str) -> XmlResult<Url> {
        let base = self.base_url.read();
        let base = base.as_ref().ok_or_else(|| {
            XmlError::InvalidOperation(
                "a device description must be parsed before URLs can be resolved".to_string(),
            )
        })?;
        resolve_against(base, raw)
    }

    /// Parse a device description fetched from `location`
    pub fn deserialize_description(&self, location: &Url, xml: &str) -> Result<Root> {
        self.set_base_url(location.clone());
        let mut cursor = Cursor::new(xml)?;
        if cursor.element_name() != "root" {
            return Err(UpnpError::Decode(XmlError::decode(
                cursor.element_name().to_string(),
                "expected device description `root` element",
            )));
        }
        let mut root = self.factory.create_root(location);
        deserialize_entity(&mut root, &mut cursor, self)?;
        tracing::debug!(device = %root.device().friendly_name(), "parsed device description");
        Ok(root)
    }

    /// Parse a service control document (SCPD)
    pub fn deserialize_scpd(&self, xml: &str) -> Result<ServiceController> {
        let mut cursor = Cursor::new(xml)?;
        if cursor.element_name() != "scpd" {
            return Err(UpnpError::Decode(XmlError::decode(
                cursor.element_name().to_string(),
                "expected service control `scpd` element",
            )));
        }
        let mut controller = self.factory.create_controller();
        deserialize_entity(&mut controller, &mut cursor, self)?;
        controller.finish_deserialize();
        Ok(controller)
    }

    pub(crate) fn deserialize_device(&self, cursor: &mut Cursor<'_>) -> XmlResult<Device> {
        let mut device = self.factory.create_device();
        deserialize_entity(&mut device, cursor, self)?;
        Ok(device)
    }

    pub(crate) fn deserialize_service(&self, cursor: &mut Cursor<'_>) -> XmlResult<Service> {
        let mut service = self.factory.create_service();
        deserialize_entity(&mut service, cursor, self)?;
        Ok(service)
    }

    pub(crate) fn deserialize_icon(&self, cursor: &mut Cursor<'_>) -> XmlResult<Icon> {
        let mut icon = self.factory.create_icon();
        deserialize_entity(&mut icon, cursor, self)?;
        Ok(icon)
    }

    pub(crate) fn deserialize_action(&self, cursor: &mut Cursor<'_>) -> XmlResult<ServiceAction> {
        let mut action = self.factory.create_action();
        deserialize_entity(&mut action, cursor, self)?;
        Ok(action)
    }

    pub(crate) fn deserialize_state_variable(
        &self,
        cursor: &mut Cursor<'_>,
    ) -> XmlResult<StateVariable> {
        let mut variable = self.factory.create_state_variable();
        deserialize_entity(&mut variable, cursor, self)?;
        variable.check_constraint_groups()?;
        Ok(variable)
    }
}

impl Default for Deserializer {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolution shared by the deserializer (during a parse) and a finished
/// [`Root`] (afterwards)
pub(crate) fn resolve_against(base: &Url, raw: &str) -> XmlResult<Url> {
    let raw = raw.trim();
    match Url::parse(raw) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            // a well-formed relative reference cannot carry a colon in its
            // first path segment; that would make it a malformed scheme
            let first_segment = raw.split('/').next().unwrap_or("");
            if first_segment.contains(':') {
                return Err(XmlError::decode(
                    "url",
                    format!("neither absolute nor relative: {raw}"),
                ));
            }
            base.join(raw)
                .map_err(|e| XmlError::decode("url", format!("{raw}: {e}")))
        }
        Err(e) => Err(XmlError::decode("url", format!("{raw}: {e}"))),
    }
}
