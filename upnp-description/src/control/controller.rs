//! The runtime control surface for one described service.

use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::time::Duration;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use upnp_xml::{FieldTable, XmlEntity, XmlExtension, XmlSerialize, XmlWriter};

use crate::control::action::{Argument, Direction, ServiceAction};
use crate::control::eventing::StateVariableUpdate;
use crate::control::state_variable::StateVariable;
use crate::deserializer::{Deserializer, SERVICE_SCHEMA};
use crate::error::{Result, UpnpError};
use crate::root::SpecVersion;

/// Bound on queued-but-unconsumed state change notifications
const UPDATE_QUEUE_DEPTH: usize = 64;

/// Owner of one service's actions and state variables, and the single
/// point through which external observers learn of state changes.
///
/// State variables never notify observers directly: committed changes are
/// queued here and drained with [`ServiceController::try_recv_update`] or
/// [`ServiceController::recv_update_timeout`].
#[derive(Debug)]
pub struct ServiceController {
    spec_version: SpecVersion,
    actions: Vec<ServiceAction>,
    state_variables: Vec<StateVariable>,
    updates_tx: SyncSender<StateVariableUpdate>,
    updates_rx: Mutex<Receiver<StateVariableUpdate>>,
    extension: Option<Box<dyn XmlExtension>>,
}

impl ServiceController {
    /// Build a controller around declared actions and state variables,
    /// wiring every evented variable to this controller's update queue
    pub fn new(actions: Vec<ServiceAction>, state_variables: Vec<StateVariable>) -> Self {
        let (updates_tx, updates_rx) = sync_channel(UPDATE_QUEUE_DEPTH);
        let controller = ServiceController {
            spec_version: SpecVersion::new(1, 0),
            actions,
            state_variables,
            updates_tx,
            updates_rx: Mutex::new(updates_rx),
            extension: None,
        };
        controller.wire_eventers();
        controller
    }

    fn wire_eventers(&self) {
        for variable in &self.state_variables {
            variable.attach_updates(self.updates_tx.clone());
        }
    }

    /// Wire eventers of variables populated during deserialization;
    /// called once the document is fully parsed
    pub(crate) fn finish_deserialize(&self) {
        self.wire_eventers();
    }

    pub fn spec_version(&self) -> SpecVersion {
        self.spec_version
    }

    pub fn actions(&self) -> &[ServiceAction] {
        &self.actions
    }

    pub fn state_variables(&self) -> &[StateVariable] {
        &self.state_variables
    }

    pub fn action(&self, name: &str) -> Option<&ServiceAction> {
        self.actions.iter().find(|a| a.name() == name)
    }

    pub fn state_variable(&self, name: &str) -> Option<&StateVariable> {
        self.state_variables.iter().find(|v| v.name() == name)
    }

    /// The state variable an action argument is typed by
    pub fn related_state_variable(&self, argument: &Argument) -> Option<&StateVariable> {
        self.state_variable(argument.related_state_variable())
    }

    /// Match an invocation's arguments against the declared action: every
    /// provided argument must name a declared input argument whose related
    /// state variable accepts the value
    pub fn check_invocation(&self, action_name: &str, arguments: &[(&str, &str)]) -> Result<()> {
        let action = self.action(action_name).ok_or_else(|| {
            UpnpError::InvalidArgument(format!("unknown action `{action_name}`"))
        })?;
        for (name, value) in arguments {
            let argument = action.argument(name).ok_or_else(|| {
                UpnpError::InvalidArgument(format!(
                    "action `{action_name}` has no argument `{name}`"
                ))
            })?;
            if argument.direction() != Direction::In {
                return Err(UpnpError::InvalidArgument(format!(
                    "argument `{name}` of `{action_name}` is not an input"
                )));
            }
            if let Some(variable) = self.related_state_variable(argument) {
                if !variable.is_value_allowed(value) {
                    return Err(UpnpError::InvalidArgument(format!(
                        "value `{value}` is not allowed for argument `{name}`"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Manual update path: commit a new value for `name` and queue the
    /// notification, exactly as an eventer delivery would
    pub fn update_state_variable(&self, name: &str, new_value: &str) -> Result<()> {
        let variable = self.state_variable(name).ok_or_else(|| {
            UpnpError::InvalidArgument(format!("unknown state variable `{name}`"))
        })?;
        variable.apply_update(new_value, &self.updates_tx);
        Ok(())
    }

    /// Drain one queued state change without blocking
    pub fn try_recv_update(&self) -> Option<StateVariableUpdate> {
        self.updates_rx.lock().try_recv().ok()
    }

    /// Wait up to `timeout` for the next queued state change
    pub fn recv_update_timeout(&self, timeout: Duration) -> Option<StateVariableUpdate> {
        self.updates_rx.lock().recv_timeout(timeout).ok()
    }

    /// Install an extension slot; used by custom factories
    pub fn set_extension(&mut self, extension: Box<dyn XmlExtension>) {
        self.extension = Some(extension);
    }

    /// Serialize the control document back to a document string
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = XmlWriter::with_declaration()?;
        self.serialize_self_and_members(&mut writer)?;
        Ok(writer.into_string()?)
    }
}

impl Default for ServiceController {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl XmlEntity for ServiceController {
    type Context = Deserializer;

    fn table() -> &'static FieldTable<Self> {
        static TABLE: Lazy<FieldTable<ServiceController>> = Lazy::new(|| {
            FieldTable::<ServiceController>::builder("scpd")
                .attribute("xmlns", |_| Some(SERVICE_SCHEMA.to_string()), |_, _| Ok(()))
                .element(
                    "specVersion",
                    |c, w| c.spec_version.serialize_members_only(w),
                    |c, cur, _| {
                        c.spec_version = SpecVersion::deserialize(cur)?;
                        Ok(())
                    },
                )
                .collection(
                    "actionList",
                    "action",
                    |c| !c.actions.is_empty(),
                    |c, w| {
                        for action in &c.actions {
                            action.serialize_self_and_members(w)?;
                        }
                        Ok(())
                    },
                    |c, cur, ctx| {
                        c.actions.push(ctx.deserialize_action(cur)?);
                        Ok(())
                    },
                )
                .collection(
                    "serviceStateTable",
                    "stateVariable",
                    |c| !c.state_variables.is_empty(),
                    |c, w| {
                        for variable in &c.state_variables {
                            variable.serialize_self_and_members(w)?;
                        }
                        Ok(())
                    },
                    |c, cur, ctx| {
                        c.state_variables.push(ctx.deserialize_state_variable(cur)?);
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
