//! Parse-time diagnostics.
//!
//! Every failure between raw text and a finished expression tree is a [`ParsingError`]: tokenizer errors,
//! grammar errors, arity and type errors from node construction, and reference-resolution failures. A parse
//! either yields a complete tree or exactly one error; no partial trees escape.
//!
//! `ParsingError` implements [`miette::Diagnostic`], so callers holding the source text can render a
//! highlighted report:
//!
//! ```rust,no_run
//! use sigscript_syntax::diagnostics::ParsingError;
//! use sigscript_syntax::ast::Span;
//!
//! let err = ParsingError::syntax("unexpected ')'", Span::new(4, 5));
//! let report = miette::Report::new(err).with_source_code("(eq )");
//! eprintln!("{report:?}");
//! ```

use std::fmt;

use miette::{Diagnostic, LabeledSpan};
use sigscript_core::errors::BadStateError;
use thiserror::Error;

use crate::ast::Span;

/// Category of a parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsingErrorKind {
    /// Malformed text: bad token, unexpected token, unclosed form, trailing input.
    Syntax,
    /// Wrong number of operands or arguments.
    Arity,
    /// Operand of the wrong static type.
    Type,
    /// A literal rejected by a signal's declared options.
    Value,
    /// A reference that does not resolve in the current host context.
    BadState(BadStateError),
}

impl ParsingErrorKind {
    fn code(&self) -> &'static str {
        match self {
            ParsingErrorKind::Syntax => "sigscript::syntax",
            ParsingErrorKind::Arity => "sigscript::arity",
            ParsingErrorKind::Type => "sigscript::type",
            ParsingErrorKind::Value => "sigscript::value",
            ParsingErrorKind::BadState(_) => "sigscript::bad_state",
        }
    }
}

impl fmt::Display for ParsingErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsingErrorKind::Syntax => write!(f, "syntax error"),
            ParsingErrorKind::Arity => write!(f, "arity error"),
            ParsingErrorKind::Type => write!(f, "type error"),
            ParsingErrorKind::Value => write!(f, "value error"),
            ParsingErrorKind::BadState(_) => write!(f, "unresolved reference"),
        }
    }
}

/// A static construction-time failure, positioned when the position is known.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParsingError {
    pub message: String,
    pub span: Option<Span>,
    pub kind: ParsingErrorKind,
}

impl ParsingError {
    pub fn new(kind: ParsingErrorKind, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            message: message.into(),
            span,
            kind,
        }
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self::new(ParsingErrorKind::Syntax, message, Some(span))
    }

    pub fn arity(message: impl Into<String>, span: Span) -> Self {
        Self::new(ParsingErrorKind::Arity, message, Some(span))
    }

    pub fn type_error(message: impl Into<String>, span: Span) -> Self {
        Self::new(ParsingErrorKind::Type, message, Some(span))
    }

    pub fn value(message: impl Into<String>, span: Span) -> Self {
        Self::new(ParsingErrorKind::Value, message, Some(span))
    }

    pub fn bad_state(err: BadStateError, span: Span) -> Self {
        Self::new(ParsingErrorKind::BadState(err.clone()), err.to_string(), Some(span))
    }

    /// The unresolved-reference cause, if this is one.
    pub fn bad_state_error(&self) -> Option<&BadStateError> {
        match &self.kind {
            ParsingErrorKind::BadState(err) => Some(err),
            _ => None,
        }
    }

    /// Re-base the span onto a larger source the parsed text was cut from.
    pub fn shifted(mut self, delta: usize) -> Self {
        self.span = self.span.map(|span| span.shift(delta));
        self
    }
}

impl Diagnostic for ParsingError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.kind.code()))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.span?;
        Some(Box::new(std::iter::once(LabeledSpan::at(
            span.start..span.end.max(span.start),
            self.kind.to_string(),
        ))))
    }
}
