//! Live value-change delivery from a notification source to state
//! variables and their owning controller.

use std::sync::mpsc::SyncSender;
use std::sync::Arc;

use parking_lot::Mutex;

/// One committed state change, delivered through the owning controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateVariableUpdate {
    /// Name of the state variable that changed
    pub variable: String,
    /// Value before the change; `None` when the variable had no value yet
    pub old_value: Option<String>,
    /// The committed new value
    pub new_value: String,
}

struct Binding {
    variable: String,
    value: Arc<Mutex<Option<String>>>,
    updates: SyncSender<StateVariableUpdate>,
}

impl std::fmt::Debug for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Binding")
            .field("variable", &self.variable)
            .finish()
    }
}

/// Notification source feeding live value changes into bound state
/// variables.
///
/// A state variable is bound to at most one eventer, fixed at construction;
/// one eventer may feed several variables. Deliveries may arrive on a
/// network-listener thread: each bound variable's value slot is a mutex,
/// held across the queue send, so the update path is single-writer per
/// variable and updates stay in delivery order.
#[derive(Debug, Clone, Default)]
pub struct Eventer {
    inner: Arc<EventerInner>,
}

#[derive(Debug, Default)]
struct EventerInner {
    bindings: Mutex<Vec<Binding>>,
}

impl Eventer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any state variable is wired to this eventer yet
    pub fn is_bound(&self) -> bool {
        !self.inner.bindings.lock().is_empty()
    }

    /// Deliver a new value: replace each bound variable's live value, then
    /// notify its owning controller with the (old, new) pair.
    ///
    /// Values delivered before any variable is bound are dropped.
    pub fn set_value(&self, new_value: impl Into<String>) {
        let new_value = new_value.into();
        let bindings = self.inner.bindings.lock();
        if bindings.is_empty() {
            tracing::debug!(value = %new_value, "dropping update delivered to an unbound eventer");
            return;
        }
        for binding in bindings.iter() {
            let mut slot = binding.value.lock();
            let old_value = slot.replace(new_value.clone());
            let update = StateVariableUpdate {
                variable: binding.variable.clone(),
                old_value,
                new_value: new_value.clone(),
            };
            // slot lock held across the send keeps per-variable ordering
            if binding.updates.send(update).is_err() {
                tracing::warn!(
                    variable = %binding.variable,
                    "controller update queue closed, dropping state change"
                );
            }
        }
    }

    pub(crate) fn bind(
        &self,
        variable: String,
        value: Arc<Mutex<Option<String>>>,
        updates: SyncSender<StateVariableUpdate>,
    ) {
        let mut bindings = self.inner.bindings.lock();
        if bindings.iter().any(|b| Arc::ptr_eq(&b.value, &value)) {
            return;
        }
        bindings.push(Binding {
            variable,
            value,
            updates,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_unbound_eventer_drops_values() {
        let eventer = Eventer::new();
        assert!(!eventer.is_bound());
        // must not panic or block
        eventer.set_value("ignored");
    }

    #[test]
    fn test_bound_eventer_updates_slot_and_queue() {
        let eventer = Eventer::new();
        let slot = Arc::new(Mutex::new(None));
        let (tx, rx) = mpsc::sync_channel(8);
        eventer.bind("Level".to_string(), Arc::clone(&slot), tx);

        eventer.set_value("42");

        assert_eq!(slot.lock().as_deref(), Some("42"));
        let update = rx.try_recv().unwrap();
        assert_eq!(update.variable, "Level");
        assert_eq!(update.old_value, None);
        assert_eq!(update.new_value, "42");
    }

    #[test]
    fn test_rebinding_same_slot_is_idempotent() {
        let eventer = Eventer::new();
        let slot = Arc::new(Mutex::new(None));
        let (tx, rx) = mpsc::sync_channel(8);
        eventer.bind("Level".to_string(), Arc::clone(&slot), tx.clone());
        eventer.bind("Level".to_string(), Arc::clone(&slot), tx);

        eventer.set_value("7");

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }
}
