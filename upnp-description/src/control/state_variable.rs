//! State variables and their allowed-value constraints.

use std::sync::mpsc::SyncSender;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use upnp_xml::{
    deserialize_entity, FieldTable, XmlEntity, XmlError, XmlExtension, XmlResult, XmlSerialize,
};

use crate::control::eventing::{Eventer, StateVariableUpdate};
use crate::deserializer::Deserializer;

/// Numeric bounds for a state variable: `minimum <= maximum`, and when a
/// step is present each allowed value is reachable from the minimum by
/// whole multiples of it
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AllowedValueRange {
    minimum: f64,
    maximum: f64,
    step: Option<f64>,
}

impl AllowedValueRange {
    pub fn new(minimum: f64, maximum: f64) -> Result<Self, XmlError> {
        if minimum > maximum {
            return Err(XmlError::InvalidArgument(format!(
                "range minimum {minimum} exceeds maximum {maximum}"
            )));
        }
        Ok(AllowedValueRange {
            minimum,
            maximum,
            step: None,
        })
    }

    pub fn with_step(mut self, step: f64) -> Result<Self, XmlError> {
        if step <= 0.0 {
            return Err(XmlError::InvalidArgument(format!(
                "range step {step} is not positive"
            )));
        }
        self.step = Some(step);
        Ok(self)
    }

    pub fn minimum(&self) -> f64 {
        self.minimum
    }

    pub fn maximum(&self) -> f64 {
        self.maximum
    }

    pub fn step(&self) -> Option<f64> {
        self.step
    }

    /// Whether `value` lies within the bounds and on the step grid
    pub fn contains(&self, value: f64) -> bool {
        if value < self.minimum || value > self.maximum {
            return false;
        }
        match self.step {
            Some(step) => {
                let steps = (value - self.minimum) / step;
                (steps - steps.round()).abs() < 1e-9
            }
            None => true,
        }
    }

    fn validate_decoded(&self) -> XmlResult<()> {
        if self.minimum > self.maximum {
            return Err(XmlError::decode(
                "allowedValueRange",
                format!("minimum {} exceeds maximum {}", self.minimum, self.maximum),
            ));
        }
        if let Some(step) = self.step {
            if step <= 0.0 {
                return Err(XmlError::decode(
                    "allowedValueRange",
                    format!("step {step} is not positive"),
                ));
            }
        }
        Ok(())
    }
}

fn parse_number(text: &str, name: &'static str) -> XmlResult<f64> {
    text.trim()
        .parse()
        .map_err(|e| XmlError::decode(name, format!("{e}: `{}`", text.trim())))
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

impl XmlEntity for AllowedValueRange {
    type Context = Deserializer;

    fn table() -> &'static FieldTable<Self> {
        static TABLE: Lazy<FieldTable<AllowedValueRange>> = Lazy::new(|| {
            FieldTable::<AllowedValueRange>::builder("allowedValueRange")
                .element(
                    "minimum",
                    |r, w| w.text(&format_number(r.minimum)),
                    |r, cur, _| {
                        r.minimum = parse_number(&cur.text()?, "minimum")?;
                        Ok(())
                    },
                )
                .element(
                    "maximum",
                    |r, w| w.text(&format_number(r.maximum)),
                    |r, cur, _| {
                        r.maximum = parse_number(&cur.text()?, "maximum")?;
                        Ok(())
                    },
                )
                .optional_element(
                    "step",
                    |r| r.step.is_some(),
                    |r, w| {
                        if let Some(step) = r.step {
                            w.text(&format_number(step))?;
                        }
                        Ok(())
                    },
                    |r, cur, _| {
                        r.step = Some(parse_number(&cur.text()?, "step")?);
                        Ok(())
                    },
                )
                .build()
        });
        &TABLE
    }
}

/// A named, typed piece of live service state.
///
/// The declared data type is a protocol tag (`"string"`, `"i4"`,
/// `"boolean"`, ...) kept in string form — the engine does not enforce it
/// as a native type. A variable carries either an enumerated allowed-value
/// set or an [`AllowedValueRange`], never both.
///
/// A variable constructed with [`StateVariable::evented`] is bound to its
/// [`Eventer`] for life: each delivered value replaces the live value and
/// notifies the owning controller. Incoming values are deliberately not
/// constraint-checked by the engine — live data from the network may be
/// slightly invalid and tolerating it beats dropping state; callers decide
/// with [`StateVariable::is_value_allowed`].
#[derive(Debug, Default)]
pub struct StateVariable {
    name: String,
    data_type: String,
    default_value: Option<String>,
    sends_events: bool,
    is_multicast: bool,
    allowed_values: Option<Vec<String>>,
    allowed_range: Option<AllowedValueRange>,
    value: Arc<Mutex<Option<String>>>,
    eventer: Option<Eventer>,
    extension: Option<Box<dyn XmlExtension>>,
}

impl StateVariable {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        StateVariable {
            name: name.into(),
            data_type: data_type.into(),
            ..StateVariable::default()
        }
    }

    /// An event-published variable bound to `eventer` for its lifetime
    pub fn evented(
        name: impl Into<String>,
        data_type: impl Into<String>,
        eventer: Eventer,
        is_multicast: bool,
    ) -> Self {
        StateVariable {
            name: name.into(),
            data_type: data_type.into(),
            sends_events: true,
            is_multicast,
            eventer: Some(eventer),
            ..StateVariable::default()
        }
    }

    /// A string variable constrained to an enumerated set of values
    pub fn enumerated(name: impl Into<String>, allowed_values: Vec<String>) -> Self {
        StateVariable {
            name: name.into(),
            data_type: "string".to_string(),
            allowed_values: Some(allowed_values),
            ..StateVariable::default()
        }
    }

    /// A numeric variable constrained to a value range
    pub fn ranged(
        name: impl Into<String>,
        data_type: impl Into<String>,
        range: AllowedValueRange,
    ) -> Self {
        StateVariable {
            name: name.into(),
            data_type: data_type.into(),
            allowed_range: Some(range),
            ..StateVariable::default()
        }
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> &str {
        &self.data_type
    }

    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    pub fn sends_events(&self) -> bool {
        self.sends_events
    }

    pub fn is_multicast(&self) -> bool {
        self.is_multicast
    }

    pub fn allowed_values(&self) -> Option<&[String]> {
        self.allowed_values.as_deref()
    }

    pub fn allowed_value_range(&self) -> Option<&AllowedValueRange> {
        self.allowed_range.as_ref()
    }

    /// The last committed live value
    pub fn value(&self) -> Option<String> {
        self.value.lock().clone()
    }

    /// Check a value against this variable's constraint group: membership
    /// in the enumerated set, or range bounds plus step reachability. An
    /// unconstrained variable accepts everything.
    pub fn is_value_allowed(&self, value: &str) -> bool {
        if let Some(values) = &self.allowed_values {
            return values.iter().any(|allowed| allowed == value);
        }
        if let Some(range) = &self.allowed_range {
            return value
                .trim()
                .parse::<f64>()
                .map(|v| range.contains(v))
                .unwrap_or(false);
        }
        true
    }

    /// Install an extension slot; used by custom factories
    pub fn set_extension(&mut self, extension: Box<dyn XmlExtension>) {
        self.extension = Some(extension);
    }

    /// Wire this variable's eventer (when present) to the owning
    /// controller's update queue; idempotent
    pub(crate) fn attach_updates(&self, updates: SyncSender<StateVariableUpdate>) {
        if let Some(eventer) = &self.eventer {
            eventer.bind(self.name.clone(), Arc::clone(&self.value), updates);
        }
    }

    /// Manual update path used by the controller: commit the value and
    /// enqueue the notification, holding the slot lock across both
    pub(crate) fn apply_update(&self, new_value: &str, updates: &SyncSender<StateVariableUpdate>) {
        let mut slot = self.value.lock();
        let old_value = slot.replace(new_value.to_string());
        let update = StateVariableUpdate {
            variable: self.name.clone(),
            old_value,
            new_value: new_value.to_string(),
        };
        if updates.send(update).is_err() {
            tracing::warn!(variable = %self.name, "controller update queue closed, dropping state change");
        }
    }

    /// The constraint groups are mutually exclusive; a document declaring
    /// both is structurally invalid
    pub(crate) fn check_constraint_groups(&self) -> XmlResult<()> {
        if self.allowed_values.is_some() && self.allowed_range.is_some() {
            return Err(XmlError::decode(
                "stateVariable",
                "allowedValueList and allowedValueRange are mutually exclusive",
            ));
        }
        Ok(())
    }
}

impl XmlEntity for StateVariable {
    type Context = Deserializer;

    fn table() -> &'static FieldTable<Self> {
        static TABLE: Lazy<FieldTable<StateVariable>> = Lazy::new(|| {
            FieldTable::<StateVariable>::builder("stateVariable")
                .attribute(
                    "sendEvents",
                    |v| v.sends_events.then(|| "yes".to_string()),
                    |v, s| {
                        v.sends_events = s == "yes";
                        Ok(())
                    },
                )
                .attribute(
                    "multicast",
                    |v| v.is_multicast.then(|| "yes".to_string()),
                    |v, s| {
                        v.is_multicast = s == "yes";
                        Ok(())
                    },
                )
                .element(
                    "name",
                    |v, w| w.text(&v.name),
                    |v, cur, _| {
                        v.name = cur.text()?;
                        Ok(())
                    },
                )
                .element(
                    "dataType",
                    |v, w| w.text(&v.data_type),
                    |v, cur, _| {
                        v.data_type = cur.text()?;
                        Ok(())
                    },
                )
                .optional_element(
                    "defaultValue",
                    |v| v.default_value.is_some(),
                    |v, w| {
                        if let Some(default) = &v.default_value {
                            w.text(default)?;
                        }
                        Ok(())
                    },
                    |v, cur, _| {
                        v.default_value = Some(cur.text()?);
                        Ok(())
                    },
                )
                .collection(
                    "allowedValueList",
                    "allowedValue",
                    |v| v.allowed_values.is_some(),
                    |v, w| {
                        if let Some(values) = &v.allowed_values {
                            for value in values {
                                w.open("allowedValue")?;
                                w.text(value)?;
                                w.close()?;
                            }
                        }
                        Ok(())
                    },
                    |v, cur, _| {
                        v.allowed_values
                            .get_or_insert_with(Vec::new)
                            .push(cur.text()?);
                        Ok(())
                    },
                )
                .optional_element(
                    "allowedValueRange",
                    |v| v.allowed_range.is_some(),
                    |v, w| {
                        if let Some(range) = &v.allowed_range {
                            range.serialize_members_only(w)?;
                        }
                        Ok(())
                    },
                    |v, cur, ctx| {
                        let mut range = AllowedValueRange::default();
                        deserialize_entity(&mut range, cur, ctx)?;
                        range.validate_decoded()?;
                        v.allowed_range = Some(range);
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
