//! Shared syntax frontend for SigScript: tokenizer, expression tree, parsers, evaluator, decompiler.
//!
//! ## Notes
//! - Both grammars produce the same [`ast::Expr`] tree through [`build::NodeBuilder`].
//! - Host names are resolved at parse time through a `sigscript_core::capabilities::CapabilityRegistry`; the tree
//!   keeps the resolved accessors and reads live state on every evaluation.
//! - Vocabulary identity (operators, grammars, messages) comes from `sigscript_core::lang` registries.
//!
//! ## Examples
//! ```rust
//! use sigscript_core::capabilities::SignalDefinition;
//! use sigscript_core::lang::grammars::GrammarId;
//! use sigscript_core::static_registry::StaticRegistry;
//! use sigscript_core::value::{ScriptValue, ValueType};
//! use sigscript_syntax::{ParseContext, decompile, parser};
//!
//! let registry = StaticRegistry::new()
//!     .with_signal(SignalDefinition::new("Door.Position", ValueType::Number), ScriptValue::from_int(40));
//! let ctx = ParseContext::new(registry.shared());
//!
//! let expr = parser::parse("(gt (sig Door.Position) 30)", GrammarId::Prefix, &ctx).unwrap();
//! assert!(expr.node.test().unwrap());
//! assert_eq!(decompile::decompile(&expr.node, GrammarId::Infix), "Door.Position > 30");
//! ```

pub mod ast;
pub mod build;
pub mod decompile;
pub mod diagnostics;
pub mod eval;
pub mod lexer;
pub mod parser;

#[cfg(test)]
mod test_support;

pub use ast::{Expr, ExprType, Span, Spanned};
pub use build::{NodeBuilder, ParseContext};
pub use diagnostics::{ParsingError, ParsingErrorKind};
pub use eval::ActionOutcome;
