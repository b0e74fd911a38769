//! The control model: actions, state variables, value constraints, and the
//! live eventing channel between a variable and its controller.

mod action;
mod controller;
mod eventing;
mod state_variable;

pub use action::{Argument, Direction, ServiceAction};
pub use controller::ServiceController;
pub use eventing::{Eventer, StateVariableUpdate};
pub use state_variable::{AllowedValueRange, StateVariable};
