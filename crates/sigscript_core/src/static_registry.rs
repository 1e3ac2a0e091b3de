//! In-memory capability registry.
//!
//! [`StaticRegistry`] is a complete [`CapabilityRegistry`] backed by plain maps. Hosts without a live object
//! graph, tests, and the CLI's JSON host fixtures use it directly.
//!
//! ## Notes
//! - Clones share state: keep a clone to change signal values or availability after handing the registry to
//!   an engine.
//! - Accessors read the shared state on every call, so a capability switched off after parsing fails at
//!   evaluation time with `BadState`.
//! - Every action invocation is recorded (see [`StaticRegistry::calls`]).
//!
//! ## Examples
//! ```rust
//! use sigscript_core::capabilities::{CapabilityRegistry, SignalDefinition};
//! use sigscript_core::static_registry::StaticRegistry;
//! use sigscript_core::value::{ScriptValue, ValueType};
//!
//! let registry = StaticRegistry::new()
//!     .with_signal(SignalDefinition::new("Door.Position", ValueType::Number), ScriptValue::from_int(40));
//! let read = registry.signal_source("Door.Position").unwrap();
//! assert_eq!(read().unwrap(), ScriptValue::from_int(40));
//!
//! registry.set_available("Door.Position", false);
//! assert!(read().is_err());
//! assert!(!registry.has_signal("Door.Position"));
//! ```

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::capabilities::{
    ActionDefinition, ActionExecutor, CapabilityRegistry, PropertyDefinition, PropertySource, PropertyValue,
    SharedRegistry, SignalDefinition, SignalSource,
};
use crate::errors::{BadStateError, RuntimeError};
use crate::value::ScriptValue;

/// One recorded action invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord {
    pub name: String,
    pub args: Vec<ScriptValue>,
}

#[derive(Default)]
struct RegistryState {
    signals: BTreeMap<String, (Rc<SignalDefinition>, ScriptValue)>,
    actions: BTreeMap<String, (Rc<ActionDefinition>, Option<ActionExecutor>)>,
    properties: BTreeMap<String, (Rc<PropertyDefinition>, PropertyValue)>,
    unavailable: BTreeSet<String>,
    calls: Vec<ActionRecord>,
}

/// Map-backed registry with availability toggles and call recording.
#[derive(Clone, Default)]
pub struct StaticRegistry {
    state: Rc<RefCell<RegistryState>>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a clone as the shared handle parsers expect.
    pub fn shared(&self) -> SharedRegistry {
        Rc::new(self.clone())
    }

    pub fn with_signal(self, definition: SignalDefinition, value: ScriptValue) -> Self {
        self.add_signal(definition, value);
        self
    }

    pub fn with_action(self, definition: ActionDefinition) -> Self {
        self.add_action(definition, None);
        self
    }

    /// Register an action whose invocations also run `handler`.
    pub fn with_action_handler(self, definition: ActionDefinition, handler: ActionExecutor) -> Self {
        self.add_action(definition, Some(handler));
        self
    }

    pub fn with_property(self, definition: PropertyDefinition, value: PropertyValue) -> Self {
        self.add_property(definition, value);
        self
    }

    pub fn add_signal(&self, definition: SignalDefinition, value: ScriptValue) {
        let name = definition.script_name.clone();
        self.state
            .borrow_mut()
            .signals
            .insert(name, (Rc::new(definition), value));
    }

    pub fn add_action(&self, definition: ActionDefinition, handler: Option<ActionExecutor>) {
        let name = definition.script_name.clone();
        self.state
            .borrow_mut()
            .actions
            .insert(name, (Rc::new(definition), handler));
    }

    pub fn add_property(&self, definition: PropertyDefinition, value: PropertyValue) {
        let name = definition.reference.clone();
        self.state
            .borrow_mut()
            .properties
            .insert(name, (Rc::new(definition), value));
    }

    /// Update a signal's current value.
    ///
    /// ## Errors
    /// - `BadStateError` if no such signal is registered.
    pub fn set_signal(&self, name: &str, value: ScriptValue) -> Result<(), BadStateError> {
        let mut state = self.state.borrow_mut();
        let entry = state
            .signals
            .get_mut(name)
            .ok_or_else(|| BadStateError::unknown_signal(name))?;
        entry.1 = value;
        Ok(())
    }

    /// Update a property's current value.
    pub fn set_property(&self, reference: &str, value: PropertyValue) -> Result<(), BadStateError> {
        let mut state = self.state.borrow_mut();
        let entry = state
            .properties
            .get_mut(reference)
            .ok_or_else(|| BadStateError::unknown_property(reference))?;
        entry.1 = value;
        Ok(())
    }

    /// Switch a signal, action or property on or off in this context.
    pub fn set_available(&self, name: &str, available: bool) {
        let mut state = self.state.borrow_mut();
        if available {
            state.unavailable.remove(name);
        } else {
            state.unavailable.insert(name.to_string());
        }
    }

    /// Action invocations so far, oldest first.
    pub fn calls(&self) -> Vec<ActionRecord> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn signal_names(&self) -> Vec<String> {
        self.state.borrow().signals.keys().cloned().collect()
    }

    pub fn action_names(&self) -> Vec<String> {
        self.state.borrow().actions.keys().cloned().collect()
    }

    fn check_available(&self, name: &str) -> Result<(), BadStateError> {
        check_available(&self.state.borrow(), name)
    }
}

impl CapabilityRegistry for StaticRegistry {
    fn signal_definition(&self, name: &str) -> Result<Rc<SignalDefinition>, BadStateError> {
        let state = self.state.borrow();
        let (definition, _) = state
            .signals
            .get(name)
            .ok_or_else(|| BadStateError::unknown_signal(name))?;
        check_available(&state, name)?;
        Ok(Rc::clone(definition))
    }

    fn signal_source(&self, name: &str) -> Result<SignalSource, BadStateError> {
        self.signal_definition(name)?;
        let state = Rc::clone(&self.state);
        let name = name.to_string();
        Ok(Rc::new(move || -> Result<ScriptValue, RuntimeError> {
            let state = state.borrow();
            check_available(&state, &name)?;
            let (_, value) = state
                .signals
                .get(&name)
                .ok_or_else(|| BadStateError::unknown_signal(&name))?;
            Ok(value.clone())
        }))
    }

    fn action_definition(&self, name: &str) -> Result<Rc<ActionDefinition>, BadStateError> {
        let state = self.state.borrow();
        let (definition, _) = state
            .actions
            .get(name)
            .ok_or_else(|| BadStateError::unknown_action(name))?;
        check_available(&state, name)?;
        Ok(Rc::clone(definition))
    }

    fn action_executor(&self, name: &str) -> Result<ActionExecutor, BadStateError> {
        self.action_definition(name)?;
        let state = Rc::clone(&self.state);
        let name = name.to_string();
        Ok(Rc::new(move |args: &[ScriptValue]| -> Result<(), RuntimeError> {
            let handler = {
                let mut state = state.borrow_mut();
                check_available(&state, &name)?;
                let handler = state
                    .actions
                    .get(&name)
                    .ok_or_else(|| BadStateError::unknown_action(&name))?
                    .1
                    .clone();
                state.calls.push(ActionRecord {
                    name: name.clone(),
                    args: args.to_vec(),
                });
                handler
            };
            // The state borrow is released: handlers may evaluate other rules against this registry.
            match handler {
                Some(handler) => handler(args),
                None => Ok(()),
            }
        }))
    }

    fn property_definition(&self, reference: &str) -> Result<Rc<PropertyDefinition>, BadStateError> {
        let state = self.state.borrow();
        let (definition, _) = state
            .properties
            .get(reference)
            .ok_or_else(|| BadStateError::unknown_property(reference))?;
        check_available(&state, reference)?;
        Ok(Rc::clone(definition))
    }

    fn property_source(&self, reference: &str) -> Result<PropertySource, BadStateError> {
        self.property_definition(reference)?;
        let state = Rc::clone(&self.state);
        let reference = reference.to_string();
        Ok(Rc::new(move || -> Result<PropertyValue, RuntimeError> {
            let state = state.borrow();
            check_available(&state, &reference)?;
            let (_, value) = state
                .properties
                .get(&reference)
                .ok_or_else(|| BadStateError::unknown_property(&reference))?;
            Ok(value.clone())
        }))
    }

    fn has_signal(&self, name: &str) -> bool {
        self.state.borrow().signals.contains_key(name) && self.check_available(name).is_ok()
    }

    fn has_action(&self, name: &str) -> bool {
        self.state.borrow().actions.contains_key(name) && self.check_available(name).is_ok()
    }
}

fn check_available(state: &RegistryState, name: &str) -> Result<(), BadStateError> {
    if state.unavailable.contains(name) {
        Err(BadStateError::unavailable(name))
    } else {
        Ok(())
    }
}
