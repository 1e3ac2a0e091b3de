//! Provide the shared, pure semantic core of the SigScript rule engine.
//!
//! This crate is intentionally small and dependency-light. It holds everything that the syntax frontend,
//! the engine facade, and host integrations must agree on:
//! - the value model ([`value::ScriptValue`], scaled fixed-point numbers),
//! - the runtime error taxonomy and localization keys ([`errors`], [`lang::messages`]),
//! - the capability-registry interface a host implements ([`capabilities`]) and an in-memory implementation
//!   ([`static_registry`]),
//! - canonical language vocabulary (operators, grammars, punctuation, messages) in [`lang`].
//!
//! ## Notes
//!
//! - This is a “semantic core” crate: **no IO**, no global state, and no parser types.
//! - Everything here is single-threaded by construction: host accessors are `Rc` handles.

pub mod capabilities;
pub mod errors;
pub mod lang;
pub mod static_registry;
pub mod value;

pub use capabilities::{
    ActionDefinition, ActionExecutor, ArgumentDefinition, CapabilityRegistry, PropertyDefinition, PropertyShape,
    PropertySource, PropertyValue, SharedRegistry, SignalDefinition, SignalSource, Validator,
};
pub use errors::{BadStateError, LocalizedMessage, RuntimeError, RuntimeErrorKind};
pub use static_registry::StaticRegistry;
pub use value::{ScriptValue, ValueType};
