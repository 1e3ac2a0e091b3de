#![forbid(unsafe_code)]
//! SigScript: a small expression language for signal-driven rules.
//!
//! Expressions are written in one of two grammars (parenthesised prefix forms or conventional infix) and
//! compile to one typed tree. The tree reads live host state through a
//! [`CapabilityRegistry`](sigscript_core::capabilities::CapabilityRegistry) every time it is evaluated.
//!
//! This crate provides the engine facade over the shared frontend (`sigscript_syntax`), the describer, JSON
//! host fixtures, status reporting and the `sigscript` CLI.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//! - **True invariants**: Vocabulary registry lookups use `.expect("... info missing")`; every id has an entry.
//!
//! ## Examples
//! ```rust
//! use sigscript::{Engine, EngineConfig};
//! use sigscript_core::capabilities::SignalDefinition;
//! use sigscript_core::static_registry::StaticRegistry;
//! use sigscript_core::value::{ScriptValue, ValueType};
//!
//! let host = StaticRegistry::new()
//!     .with_signal(SignalDefinition::new("Room.Temp", ValueType::Number), ScriptValue::from_int(21));
//! let engine = Engine::new(host.shared(), EngineConfig::default());
//!
//! let rule = engine.parse_condition("Room.Temp >= 20 and Room.Temp < 25").unwrap();
//! assert!(rule.test().unwrap());
//! assert_eq!(engine.decompile(&rule, sigscript_core::lang::grammars::GrammarId::Prefix),
//!            "(and (ge (sig Room.Temp) 20) (lt (sig Room.Temp) 25))");
//! ```

pub mod cli;
pub mod describe;
pub mod engine;
pub mod host;
pub mod report;

pub use engine::{Engine, EngineConfig, Expression, LocParsingError, ParsingResult, ScriptError};
pub use host::{HostError, HostFixture};
pub use report::{ErrorReporter, RuleStatus};
