//! # upnp-description
//!
//! Typed UPnP device and service descriptions with live control state.
//!
//! A device description parses into a [`Root`] owning the device tree; each
//! [`Service`] lazily fetches and parses its control document into a
//! [`ServiceController`] owning the service's actions and state variables.
//! Live value changes flow from an [`Eventer`] into the bound
//! [`StateVariable`] and out through the owning controller's update queue.
//!
//! Parsing is driven by the descriptor engine in `upnp-xml`; entity
//! construction goes through an injectable [`DescriptionFactory`], so
//! consumers can substitute entities carrying vendor extension slots.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use upnp_description::{Deserializer, Url};
//! use soap_client::HttpClient;
//!
//! let client = HttpClient::new();
//! let location = Url::parse("http://10.0.0.5:1400/desc.xml")?;
//! let body = client.fetch_with_retry(location.as_str(), 1)?;
//!
//! let deserializer = Deserializer::new();
//! let root = deserializer.deserialize_description(&location, body.body())?;
//! for service in root.device().services() {
//!     let controller = service.controller(&deserializer, &client)?;
//!     println!("{} actions", controller.actions().len());
//! }
//! ```

pub mod control;
pub mod deserializer;
pub mod device;
pub mod error;
pub mod icon;
pub mod root;
pub mod service;

pub use control::{
    AllowedValueRange, Argument, Direction, Eventer, ServiceAction, ServiceController,
    StateVariable, StateVariableUpdate,
};
pub use deserializer::{
    DefaultFactory, DescriptionFactory, Deserializer, DEVICE_SCHEMA, SERVICE_SCHEMA,
};
pub use device::Device;
pub use error::{Result, UpnpError};
pub use icon::Icon;
pub use root::{Root, SpecVersion};
pub use service::Service;

// re-exported so consumers share the exact Url type used in entity fields
pub use url::Url;
