//! Actions declared by a service's control document.

use once_cell::sync::Lazy;
use upnp_xml::{
    deserialize_entity, FieldTable, XmlEntity, XmlError, XmlExtension, XmlSerialize,
};

use crate::deserializer::Deserializer;

/// Direction of an action argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    In,
    Out,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }

    fn parse(text: &str) -> Result<Self, XmlError> {
        match text {
            "in" => Ok(Direction::In),
            "out" => Ok(Direction::Out),
            other => Err(XmlError::decode(
                "direction",
                format!("expected `in` or `out`, found `{other}`"),
            )),
        }
    }
}

/// One declared argument of an action
#[derive(Debug, Clone, Default)]
pub struct Argument {
    name: String,
    direction: Direction,
    is_return_value: bool,
    related_state_variable: String,
}

impl Argument {
    pub fn new(
        name: impl Into<String>,
        direction: Direction,
        related_state_variable: impl Into<String>,
    ) -> Self {
        Argument {
            name: name.into(),
            direction,
            is_return_value: false,
            related_state_variable: related_state_variable.into(),
        }
    }

    /// Mark this argument as the action's return value
    pub fn with_return_value(mut self) -> Self {
        self.is_return_value = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_return_value(&self) -> bool {
        self.is_return_value
    }

    /// Name of the state variable this argument's value is typed by
    pub fn related_state_variable(&self) -> &str {
        &self.related_state_variable
    }
}

impl XmlEntity for Argument {
    type Context = Deserializer;

    fn table() -> &'static FieldTable<Self> {
        static TABLE: Lazy<FieldTable<Argument>> = Lazy::new(|| {
            FieldTable::<Argument>::builder("argument")
                .element(
                    "name",
                    |a, w| w.text(&a.name),
                    |a, cur, _| {
                        a.name = cur.text()?;
                        Ok(())
                    },
                )
                .element(
                    "direction",
                    |a, w| w.text(a.direction.as_str()),
                    |a, cur, _| {
                        a.direction = Direction::parse(cur.text()?.trim())?;
                        Ok(())
                    },
                )
                .optional_element(
                    "retval",
                    |a| a.is_return_value,
                    |_, _| Ok(()),
                    |a, _cur, _| {
                        a.is_return_value = true;
                        Ok(())
                    },
                )
                .element(
                    "relatedStateVariable",
                    |a, w| w.text(&a.related_state_variable),
                    |a, cur, _| {
                        a.related_state_variable = cur.text()?;
                        Ok(())
                    },
                )
                .build()
        });
        &TABLE
    }
}

/// One action of a service: a name plus its ordered argument list
#[derive(Debug, Default)]
pub struct ServiceAction {
    name: String,
    arguments: Vec<Argument>,
    extension: Option<Box<dyn XmlExtension>>,
}

impl ServiceAction {
    pub fn new(name: impl Into<String>, arguments: Vec<Argument>) -> Self {
        ServiceAction {
            name: name.into(),
            arguments,
            extension: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared arguments, in document order
    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn argument(&self, name: &str) -> Option<&Argument> {
        self.arguments.iter().find(|a| a.name == name)
    }

    /// Declared input arguments, in document order
    pub fn in_arguments(&self) -> impl Iterator<Item = &Argument> {
        self.arguments
            .iter()
            .filter(|a| a.direction == Direction::In)
    }

    /// Declared output arguments, in document order
    pub fn out_arguments(&self) -> impl Iterator<Item = &Argument> {
        self.arguments
            .iter()
            .filter(|a| a.direction == Direction::Out)
    }

    /// Install an extension slot; used by custom factories
    pub fn set_extension(&mut self, extension: Box<dyn XmlExtension>) {
        self.extension = Some(extension);
    }
}

impl XmlEntity for ServiceAction {
    type Context = Deserializer;

    fn table() -> &'static FieldTable<Self> {
        static TABLE: Lazy<FieldTable<ServiceAction>> = Lazy::new(|| {
            FieldTable::<ServiceAction>::builder("action")
                .element(
                    "name",
                    |a, w| w.text(&a.name),
                    |a, cur, _| {
                        a.name = cur.text()?;
                        Ok(())
                    },
                )
                .collection(
                    "argumentList",
                    "argument",
                    |a| !a.arguments.is_empty(),
                    |a, w| {
                        for argument in &a.arguments {
                            argument.serialize_self_and_members(w)?;
                        }
                        Ok(())
                    },
                    |a, cur, ctx| {
                        let mut argument = Argument::default();
                        deserialize_entity(&mut argument, cur, ctx)?;
                        a.arguments.push(argument);
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_parse() {
        assert_eq!(Direction::parse("in").unwrap(), Direction::In);
        assert_eq!(Direction::parse("out").unwrap(), Direction::Out);
        assert!(Direction::parse("sideways").is_err());
    }

    #[test]
    fn test_argument_lookups() {
        let action = ServiceAction::new(
            "SetTarget",
            vec![
                Argument::new("NewTargetValue", Direction::In, "Target"),
                Argument::new("Result", Direction::Out, "Status").with_return_value(),
            ],
        );

        assert_eq!(action.in_arguments().count(), 1);
        assert_eq!(action.out_arguments().count(), 1);
        let result = action.argument("Result").unwrap();
        assert!(result.is_return_value());
        assert_eq!(result.related_state_variable(), "Status");
    }
}
