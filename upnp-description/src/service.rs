//! Service entity of a device description, with the lazily fetched
//! controller for its control document.

use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};
use soap_client::HttpClient;
use url::Url;
use upnp_xml::{FieldTable, XmlEntity, XmlExtension};

use crate::control::ServiceController;
use crate::deserializer::Deserializer;
use crate::error::{Result, UpnpError};

/// How many times a control document fetch retries on timeout
const SCPD_FETCH_RETRIES: u32 = 1;

/// One service declared by a device.
///
/// The service's control document is not part of the device description; it
/// is fetched and parsed on first use through [`Service::controller`] and
/// cached for the service's remaining lifetime.
#[derive(Debug, Default)]
pub struct Service {
    service_type: String,
    service_id: String,
    scpd_url: Option<Url>,
    control_url: Option<Url>,
    event_sub_url: Option<Url>,
    controller: OnceCell<Arc<ServiceController>>,
    extension: Option<Box<dyn XmlExtension>>,
}

impl Service {
    /// Service type URN, e.g. `urn:schemas-upnp-org:service:SwitchPower:1`
    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    /// Absolute URL of the service's control document
    pub fn scpd_url(&self) -> Option<&Url> {
        self.scpd_url.as_ref()
    }

    /// Absolute URL control invocations are posted to
    pub fn control_url(&self) -> Option<&Url> {
        self.control_url.as_ref()
    }

    /// Absolute URL event subscriptions are sent to
    pub fn event_sub_url(&self) -> Option<&Url> {
        self.event_sub_url.as_ref()
    }

    /// The runtime control surface for this service.
    ///
    /// On first call the control document is fetched over `client` and
    /// parsed through `deserializer`'s factory; the result is cached.
    /// Concurrent first callers block on the in-flight initialization, so at
    /// most one fetch is issued per service instance. A failed fetch is not
    /// cached — the next caller retries.
    pub fn controller(
        &self,
        deserializer: &Deserializer,
        client: &HttpClient,
    ) -> Result<&Arc<ServiceController>> {
        self.controller.get_or_try_init(|| {
            let url = self.scpd_url.as_ref().ok_or_else(|| {
                UpnpError::InvalidOperation(format!(
                    "service {} has no SCPD URL",
                    self.service_id
                ))
            })?;
            tracing::debug!(service = %self.service_id, url = %url, "fetching control document");
            let response = client.fetch_with_retry(url.as_str(), SCPD_FETCH_RETRIES)?;
            if !response.is_success() {
                return Err(UpnpError::Http {
                    status: response.status(),
                    url: url.to_string(),
                });
            }
            let controller = deserializer.deserialize_scpd(response.body())?;
            Ok(Arc::new(controller))
        })
    }

    /// The cached controller, if one has been fetched already
    pub fn controller_if_fetched(&self) -> Option<&Arc<ServiceController>> {
        self.controller.get()
    }

    /// Install an extension slot; used by custom factories
    pub fn set_extension(&mut self, extension: Box<dyn XmlExtension>) {
        self.extension = Some(extension);
    }
}

impl XmlEntity for Service {
    type Context = Deserializer;

    fn table() -> &'static FieldTable<Self> {
        static TABLE: Lazy<FieldTable<Service>> = Lazy::new(|| {
            FieldTable::<Service>::builder("service")
                .element(
                    "serviceType",
                    |s, w| w.text(&s.service_type),
                    |s, cur, _| {
                        s.service_type = cur.text()?;
                        Ok(())
                    },
                )
                .element(
                    "serviceId",
                    |s, w| w.text(&s.service_id),
                    |s, cur, _| {
                        s.service_id = cur.text()?;
                        Ok(())
                    },
                )
                .element(
                    "SCPDURL",
                    |s, w| {
                        if let Some(url) = &s.scpd_url {
                            w.text(url.as_str())?;
                        }
                        Ok(())
                    },
                    |s, cur, ctx| {
                        s.scpd_url = Some(ctx.resolve_url(&cur.text()?)?);
                        Ok(())
                    },
                )
                .element(
                    "controlURL",
                    |s, w| {
                        if let Some(url) = &s.control_url {
                            w.text(url.as_str())?;
                        }
                        Ok(())
                    },
                    |s, cur, ctx| {
                        s.control_url = Some(ctx.resolve_url(&cur.text()?)?);
                        Ok(())
                    },
                )
                .element(
                    "eventSubURL",
                    |s, w| {
                        if let Some(url) = &s.event_sub_url {
                            w.text(url.as_str())?;
                        }
                        Ok(())
                    },
                    |s, cur, ctx| {
                        s.event_sub_url = Some(ctx.resolve_url(&cur.text()?)?);
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
