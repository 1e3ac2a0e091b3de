//! Runtime error taxonomy shared by the evaluator, host registries, and the engine facade.
//!
//! Every error here carries a [`LocalizedMessage`]: a stable message id from [`crate::lang::messages`] plus its
//! positional arguments. `Display` renders the built-in English text; hosts render through their own
//! [`MessageCatalog`] when showing a status to users.
//!
//! ## Notes
//! - [`BadStateError`] means “syntactically fine, but not satisfiable in the current host context”. It can surface
//!   while resolving references at parse time and again during evaluation if the context changed.
//! - [`RuntimeError`] carries a *reported* flag so an error that already bubbled through one re-entrant
//!   evaluation is not reported a second time by an outer caller.

use std::fmt;

use thiserror::Error;

use crate::lang::messages::{self, EnglishCatalog, MessageCatalog, MessageId};

/// A message id plus its positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedMessage {
    pub id: MessageId,
    pub args: Vec<String>,
}

impl LocalizedMessage {
    pub fn new(id: MessageId) -> Self {
        Self { id, args: Vec::new() }
    }

    /// Append a positional argument (`{0}`, `{1}`, ... in the template).
    pub fn arg(mut self, value: impl fmt::Display) -> Self {
        self.args.push(value.to_string());
        self
    }

    /// The stable localization key, e.g. `"error.unknown_signal"`.
    pub fn key(&self) -> &'static str {
        messages::key(self.id)
    }

    /// Render through a catalog.
    pub fn render(&self, catalog: &dyn MessageCatalog) -> String {
        catalog.render(self.id, &self.args)
    }
}

impl fmt::Display for LocalizedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&EnglishCatalog))
    }
}

/// A reference is valid but cannot be satisfied in the current host context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BadStateError {
    pub message: LocalizedMessage,
}

impl BadStateError {
    pub fn new(message: LocalizedMessage) -> Self {
        Self { message }
    }

    pub fn unknown_signal(name: &str) -> Self {
        Self::new(LocalizedMessage::new(MessageId::UnknownSignal).arg(name))
    }

    pub fn unknown_action(name: &str) -> Self {
        Self::new(LocalizedMessage::new(MessageId::UnknownAction).arg(name))
    }

    pub fn unknown_property(reference: &str) -> Self {
        Self::new(LocalizedMessage::new(MessageId::UnknownProperty).arg(reference))
    }

    /// The capability exists but is switched off in this context.
    pub fn unavailable(name: &str) -> Self {
        Self::new(LocalizedMessage::new(MessageId::Unavailable).arg(name))
    }
}

/// The three runtime failure categories.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeErrorKind {
    /// A value is outside its permitted range (index out of bounds, validator range, overflow).
    #[error("{0}")]
    ValueOutOfRange(LocalizedMessage),
    /// A value has the wrong shape (unset, not a number, division by zero, rejected option).
    #[error("{0}")]
    BadValue(LocalizedMessage),
    #[error(transparent)]
    BadState(#[from] BadStateError),
}

/// An evaluation-time failure.
///
/// Aborts the evaluation of the offending rule only; callers turn it into a visible status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct RuntimeError {
    kind: RuntimeErrorKind,
    reported: bool,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind) -> Self {
        Self { kind, reported: false }
    }

    pub fn out_of_range(message: LocalizedMessage) -> Self {
        Self::new(RuntimeErrorKind::ValueOutOfRange(message))
    }

    pub fn bad_value(message: LocalizedMessage) -> Self {
        Self::new(RuntimeErrorKind::BadValue(message))
    }

    pub fn kind(&self) -> &RuntimeErrorKind {
        &self.kind
    }

    pub fn message(&self) -> &LocalizedMessage {
        match &self.kind {
            RuntimeErrorKind::ValueOutOfRange(m) | RuntimeErrorKind::BadValue(m) => m,
            RuntimeErrorKind::BadState(state) => &state.message,
        }
    }

    /// Whether a status for this error has already been shown to the user.
    pub fn is_reported(&self) -> bool {
        self.reported
    }

    pub fn mark_reported(&mut self) {
        self.reported = true;
    }
}

impl From<BadStateError> for RuntimeError {
    fn from(err: BadStateError) -> Self {
        Self::new(RuntimeErrorKind::BadState(err))
    }
}
