//! SigScript language vocabulary registries.
//!
//! This module is the “front door” for language-level vocabulary: operators, grammars, punctuation and
//! user-facing messages.
//!
//! Callers work with **stable IDs** (e.g. `OperatorId`, `GrammarId`, `MessageId`) and look up spellings and
//! metadata via registry tables instead of scattering string checks across the tokenizer, parsers and
//! decompilers.
//!
//! ## Notes
//! - Registries are **pure**: no expression types, no IO, no side effects.
//! - The tokenizer and parsers enforce syntax; registries provide spellings and metadata for shared use.
//!
//! ## Examples
//! ```rust
//! use sigscript_core::lang::operators::{self, OperatorId};
//!
//! assert_eq!(operators::from_prefix("concat"), Some(OperatorId::Concat));
//! assert_eq!(operators::prefix_spelling(OperatorId::HasSignal), "?sig");
//! ```

pub mod grammars;
pub mod messages;
pub mod operators;
pub mod punctuation;
pub mod registry;
