//! Integration tests for device description parsing, URL resolution, and
//! the polymorphic factory extension point.

use upnp_description::{
    DescriptionFactory, Deserializer, Device, Root, SpecVersion, UpnpError, Url,
};
use upnp_xml::{Cursor, XmlExtension, XmlResult, XmlWriter};

const DESCRIPTION: &str = r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <specVersion><major>1</major><minor>0</minor></specVersion>
  <device>
    <deviceType>urn:schemas-upnp-org:device:BinaryLight:1</deviceType>
    <friendlyName>Hallway Light</friendlyName>
    <manufacturer>Acme</manufacturer>
    <modelDescription>Dimmable ceiling light</modelDescription>
    <modelName>Lux 100</modelName>
    <serialNumber>00-1A</serialNumber>
    <UDN>uuid:device-1</UDN>
    <iconList>
      <icon>
        <mimetype>image/png</mimetype>
        <width>48</width>
        <height>48</height>
        <depth>24</depth>
        <url>icons/small.png</url>
      </icon>
    </iconList>
    <serviceList>
      <service>
        <serviceType>urn:schemas-upnp-org:service:SwitchPower:1</serviceType>
        <serviceId>urn:upnp-org:serviceId:SwitchPower</serviceId>
        <SCPDURL>switchpower/scpd.xml</SCPDURL>
        <controlURL>switchpower/control</controlURL>
        <eventSubURL>switchpower/events</eventSubURL>
      </service>
    </serviceList>
    <deviceList>
      <device>
        <deviceType>urn:schemas-upnp-org:device:DimmingControl:1</deviceType>
        <friendlyName>Dimmer</friendlyName>
        <manufacturer>Acme</manufacturer>
        <modelName>Lux Dim</modelName>
        <UDN>uuid:device-2</UDN>
      </device>
    </deviceList>
    <presentationURL>status.html</presentationURL>
  </device>
</root>"#;

fn location() -> Url {
    Url::parse("http://10.0.0.5:80/desc.xml").unwrap()
}

fn parse_description() -> Root {
    Deserializer::new()
        .deserialize_description(&location(), DESCRIPTION)
        .unwrap()
}

#[test]
fn test_device_tree_is_parsed() {
    let root = parse_description();

    assert_eq!(root.spec_version(), SpecVersion::new(1, 0));
    let device = root.device();
    assert_eq!(device.device_type(), "urn:schemas-upnp-org:device:BinaryLight:1");
    assert_eq!(device.friendly_name(), "Hallway Light");
    assert_eq!(device.manufacturer(), "Acme");
    assert_eq!(device.model_description(), Some("Dimmable ceiling light"));
    assert_eq!(device.model_name(), "Lux 100");
    assert_eq!(device.serial_number(), Some("00-1A"));
    assert_eq!(device.udn(), "uuid:device-1");

    assert_eq!(device.icons().len(), 1);
    assert_eq!(device.services().len(), 1);
    assert_eq!(device.devices().len(), 1);
    assert_eq!(device.devices()[0].friendly_name(), "Dimmer");
}

#[test]
fn test_urls_resolve_against_description_location() {
    let root = parse_description();
    let device = root.device();

    let icon = &device.icons()[0];
    assert_eq!(
        icon.url(),
        Some(&Url::parse("http://10.0.0.5/icons/small.png").unwrap())
    );

    let service = &device.services()[0];
    assert_eq!(
        service.scpd_url(),
        Some(&Url::parse("http://10.0.0.5/switchpower/scpd.xml").unwrap())
    );
    assert_eq!(
        service.control_url(),
        Some(&Url::parse("http://10.0.0.5/switchpower/control").unwrap())
    );
    assert_eq!(
        device.presentation_url(),
        Some(&Url::parse("http://10.0.0.5/status.html").unwrap())
    );
}

#[test]
fn test_root_resolves_relative_and_absolute_references() {
    let root = parse_description();

    assert_eq!(
        root.resolve_url("control").unwrap(),
        Url::parse("http://10.0.0.5:80/control").unwrap()
    );
    assert_eq!(
        root.resolve_url("http://elsewhere/x").unwrap(),
        Url::parse("http://elsewhere/x").unwrap()
    );
    assert!(root.resolve_url("::bad::").is_err());
}

#[test]
fn test_find_service_searches_embedded_devices() {
    let root = parse_description();
    let service = root
        .device()
        .find_service("urn:schemas-upnp-org:service:SwitchPower:1")
        .unwrap();
    assert_eq!(service.service_id(), "urn:upnp-org:serviceId:SwitchPower");
}

#[test]
fn test_unknown_elements_are_tolerated() {
    let xml = DESCRIPTION.replace(
        "<presentationURL>status.html</presentationURL>",
        "<presentationURL>status.html</presentationURL><X_futureBlock><nested/></X_futureBlock>",
    );

    let root = Deserializer::new()
        .deserialize_description(&location(), &xml)
        .unwrap();
    assert_eq!(root.device().friendly_name(), "Hallway Light");
}

#[test]
fn test_wrong_root_element_is_a_decode_error() {
    let result = Deserializer::new().deserialize_description(&location(), "<bogus/>");
    assert!(matches!(result, Err(UpnpError::Decode(_))));
}

#[test]
fn test_truncated_description_is_a_decode_error() {
    let truncated = &DESCRIPTION[..DESCRIPTION.len() / 2];
    let result = Deserializer::new().deserialize_description(&location(), truncated);
    assert!(matches!(result, Err(UpnpError::Decode(_))));
}

#[test]
fn test_description_round_trip() {
    let root = parse_description();
    let serialized = root.to_xml().unwrap();

    let reparsed = Deserializer::new()
        .deserialize_description(&location(), &serialized)
        .unwrap();
    let device = reparsed.device();
    assert_eq!(device.friendly_name(), "Hallway Light");
    assert_eq!(device.icons().len(), 1);
    assert_eq!(device.icons()[0].width(), 48);
    assert_eq!(device.services().len(), 1);
    assert_eq!(device.devices().len(), 1);
    // URLs were resolved during the first parse and serialize absolute
    assert!(serialized.contains("http://10.0.0.5/switchpower/control"));
}

// -- vendor extension through a custom factory -------------------------------

#[derive(Debug, Default)]
struct AcmeDeviceFields {
    x_location: Option<String>,
}

impl XmlExtension for AcmeDeviceFields {
    fn deserialize_element(&mut self, cursor: &mut Cursor<'_>) -> XmlResult<bool> {
        if cursor.element_name() == "X_location" {
            self.x_location = Some(cursor.text()?);
            return Ok(true);
        }
        Ok(false)
    }

    fn serialize_members_only(&self, writer: &mut XmlWriter) -> XmlResult<()> {
        if let Some(x_location) = &self.x_location {
            writer.open("X_location")?;
            writer.text(x_location)?;
            writer.close()?;
        }
        Ok(())
    }
}

#[derive(Debug)]
struct AcmeFactory;

impl DescriptionFactory for AcmeFactory {
    fn create_device(&self) -> Device {
        let mut device = Device::default();
        device.set_extension(Box::<AcmeDeviceFields>::default());
        device
    }
}

#[test]
fn test_factory_installed_extension_captures_vendor_fields() {
    let xml = DESCRIPTION.replace(
        "<UDN>uuid:device-1</UDN>",
        "<UDN>uuid:device-1</UDN><X_location>attic</X_location>",
    );

    let deserializer = Deserializer::with_factory(Box::new(AcmeFactory));
    let root = deserializer.deserialize_description(&location(), &xml).unwrap();

    // the standard fields still parse through the base descriptors
    assert_eq!(root.device().udn(), "uuid:device-1");

    // and the vendor field survives a round trip, appended after the
    // standard content of its element
    let serialized = root.to_xml().unwrap();
    assert!(serialized.contains("<X_location>attic</X_location>"));
    let standard_end = serialized.find("<presentationURL>").unwrap();
    let vendor_start = serialized.find("<X_location>").unwrap();
    assert!(vendor_start > standard_end);
}
