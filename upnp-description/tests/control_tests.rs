//! Integration tests for live control state: eventer propagation and the
//! at-most-once lazy fetch of a service's control document.

use std::thread;
use std::time::Duration;

use soap_client::HttpClient;
use upnp_description::{
    Deserializer, Eventer, ServiceAction, ServiceController, StateVariable, UpnpError, Url,
};

const DESCRIPTION: &str = r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <specVersion><major>1</major><minor>0</minor></specVersion>
  <device>
    <deviceType>urn:schemas-upnp-org:device:BinaryLight:1</deviceType>
    <friendlyName>Desk Light</friendlyName>
    <manufacturer>Acme</manufacturer>
    <modelName>Lux 10</modelName>
    <UDN>uuid:light-1</UDN>
    <serviceList>
      <service>
        <serviceType>urn:schemas-upnp-org:service:SwitchPower:1</serviceType>
        <serviceId>urn:upnp-org:serviceId:SwitchPower</serviceId>
        <SCPDURL>scpd.xml</SCPDURL>
        <controlURL>control</controlURL>
        <eventSubURL>events</eventSubURL>
      </service>
    </serviceList>
  </device>
</root>"#;

const SCPD: &str = r#"<?xml version="1.0"?>
<scpd xmlns="urn:schemas-upnp-org:service-1-0">
  <specVersion><major>1</major><minor>0</minor></specVersion>
  <actionList>
    <action>
      <name>SetTarget</name>
      <argumentList>
        <argument>
          <name>NewTargetValue</name>
          <direction>in</direction>
          <relatedStateVariable>Target</relatedStateVariable>
        </argument>
      </argumentList>
    </action>
  </actionList>
  <serviceStateTable>
    <stateVariable sendEvents="yes">
      <name>Status</name>
      <dataType>boolean</dataType>
    </stateVariable>
    <stateVariable>
      <name>Target</name>
      <dataType>boolean</dataType>
    </stateVariable>
  </serviceStateTable>
</scpd>"#;

#[test]
fn test_eventer_updates_value_and_notifies_once() {
    let eventer = Eventer::new();
    let controller = ServiceController::new(
        Vec::new(),
        vec![StateVariable::evented("Status", "boolean", eventer.clone(), false)],
    );
    assert!(eventer.is_bound());

    eventer.set_value("1");

    let variable = controller.state_variable("Status").unwrap();
    assert_eq!(variable.value().as_deref(), Some("1"));

    let update = controller
        .recv_update_timeout(Duration::from_millis(200))
        .unwrap();
    assert_eq!(update.variable, "Status");
    assert_eq!(update.old_value, None);
    assert_eq!(update.new_value, "1");
    // exactly one notification per delivery
    assert!(controller.try_recv_update().is_none());

    eventer.set_value("0");
    let update = controller
        .recv_update_timeout(Duration::from_millis(200))
        .unwrap();
    assert_eq!(update.old_value.as_deref(), Some("1"));
    assert_eq!(update.new_value, "0");
}

#[test]
fn test_eventer_deliveries_arrive_in_order() {
    let eventer = Eventer::new();
    let controller = ServiceController::new(
        Vec::new(),
        vec![StateVariable::evented("Counter", "ui4", eventer.clone(), false)],
    );

    // deliveries come from a listener thread in real use
    let producer = thread::spawn(move || {
        for i in 1..=5 {
            eventer.set_value(i.to_string());
        }
    });

    for expected in 1..=5 {
        let update = controller
            .recv_update_timeout(Duration::from_secs(1))
            .unwrap();
        assert_eq!(update.new_value, expected.to_string());
    }
    producer.join().unwrap();

    let variable = controller.state_variable("Counter").unwrap();
    assert_eq!(variable.value().as_deref(), Some("5"));
}

#[test]
fn test_one_eventer_can_feed_several_variables() {
    let eventer = Eventer::new();
    let controller = ServiceController::new(
        Vec::new(),
        vec![
            StateVariable::evented("A", "string", eventer.clone(), false),
            StateVariable::evented("B", "string", eventer.clone(), false),
        ],
    );

    eventer.set_value("x");

    let mut notified: Vec<String> = Vec::new();
    while let Some(update) = controller.recv_update_timeout(Duration::from_millis(200)) {
        notified.push(update.variable);
        if notified.len() == 2 {
            break;
        }
    }
    notified.sort();
    assert_eq!(notified, vec!["A".to_string(), "B".to_string()]);
}

#[test]
fn test_concurrent_controller_requests_fetch_once() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/scpd.xml")
        .with_status(200)
        .with_header("content-type", "text/xml")
        .with_body(SCPD)
        .expect(1)
        .create();

    let location = Url::parse(&format!("{}/desc.xml", server.url())).unwrap();
    let deserializer = Deserializer::new();
    let root = deserializer
        .deserialize_description(&location, DESCRIPTION)
        .unwrap();
    let service = &root.device().services()[0];
    let client = HttpClient::new();

    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                let controller = service.controller(&deserializer, &client).unwrap();
                assert_eq!(controller.actions().len(), 1);
                assert!(controller.state_variable("Status").is_some());
            });
        }
    });

    // every caller shares the one parsed controller, fetched exactly once
    mock.assert();
    assert!(service.controller_if_fetched().is_some());
}

#[test]
fn test_failed_controller_fetch_is_not_cached() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/scpd.xml")
        .with_status(500)
        .with_body("boom")
        .create();

    let location = Url::parse(&format!("{}/desc.xml", server.url())).unwrap();
    let deserializer = Deserializer::new();
    let root = deserializer
        .deserialize_description(&location, DESCRIPTION)
        .unwrap();
    let service = &root.device().services()[0];
    let client = HttpClient::new();

    match service.controller(&deserializer, &client) {
        Err(UpnpError::Http { status, .. }) => assert_eq!(status, 500),
        other => panic!("expected HTTP error, got {other:?}"),
    }
    assert!(service.controller_if_fetched().is_none());

    // the next attempt retries and succeeds
    server.reset();
    server
        .mock("GET", "/scpd.xml")
        .with_status(200)
        .with_header("content-type", "text/xml")
        .with_body(SCPD)
        .create();

    let controller = service.controller(&deserializer, &client).unwrap();
    assert_eq!(controller.actions().len(), 1);
}

#[test]
fn test_fetched_controller_matches_invocations() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", "/scpd.xml")
        .with_status(200)
        .with_body(SCPD)
        .create();

    let location = Url::parse(&format!("{}/desc.xml", server.url())).unwrap();
    let deserializer = Deserializer::new();
    let root = deserializer
        .deserialize_description(&location, DESCRIPTION)
        .unwrap();
    let client = HttpClient::new();
    let controller = root.device().services()[0]
        .controller(&deserializer, &client)
        .unwrap();

    controller
        .check_invocation("SetTarget", &[("NewTargetValue", "1")])
        .unwrap();
    assert!(controller
        .check_invocation("Toggle", &[("NewTargetValue", "1")])
        .is_err());
}

// parse-path variables carry no eventer; the manual update path still
// reaches external observers through the controller queue
#[test]
fn test_parsed_controller_manual_updates() {
    let controller = Deserializer::new().deserialize_scpd(SCPD).unwrap();

    controller.update_state_variable("Status", "1").unwrap();
    let update = controller
        .recv_update_timeout(Duration::from_millis(200))
        .unwrap();
    assert_eq!(update.variable, "Status");
    assert_eq!(update.new_value, "1");
}

// an eventer whose variables were never wired into a controller must not
// panic or block the delivering thread
#[test]
fn test_unbound_eventer_is_harmless() {
    let eventer = Eventer::new();
    let _variable = StateVariable::evented("Orphan", "string", eventer.clone(), false);
    assert!(!eventer.is_bound());
    eventer.set_value("dropped");
}

#[test]
fn test_programmatic_controller_with_actions() {
    use upnp_description::{Argument, Direction};

    let eventer = Eventer::new();
    let controller = ServiceController::new(
        vec![ServiceAction::new(
            "GetStatus",
            vec![Argument::new("ResultStatus", Direction::Out, "Status").with_return_value()],
        )],
        vec![StateVariable::evented("Status", "boolean", eventer.clone(), false)],
    );

    eventer.set_value("1");
    let update = controller
        .recv_update_timeout(Duration::from_millis(200))
        .unwrap();
    assert_eq!(update.variable, "Status");

    let action = controller.action("GetStatus").unwrap();
    let retval = action.out_arguments().next().unwrap();
    assert_eq!(
        controller.related_state_variable(retval).unwrap().name(),
        "Status"
    );
}
