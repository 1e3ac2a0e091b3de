//! Punctuation vocabulary.
//!
//! Non-operator punctuation used by the tokenizers and parsers: delimiters, separators, the escape character
//! and the macro brackets.
//!
//! ## Notes
//! - Lookup via [`from_str`] is **case-sensitive**.
//! - This module is vocabulary only. It does not tokenize source text.
//!
//! ## Examples
//! ```rust
//! use sigscript_core::lang::punctuation::{self, PunctuationId};
//!
//! assert_eq!(punctuation::from_str("("), Some(PunctuationId::LParen));
//! assert_eq!(punctuation::as_str(PunctuationId::MacroOpen), "{%");
//! ```

/// Stable identifier for punctuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PunctuationId {
    Space,
    Comma,
    Dot,
    LParen,
    RParen,
    Backslash,
    SingleQuote,
    DoubleQuote,
    MacroOpen,
    MacroClose,
}

/// Metadata for a punctuation token.
#[derive(Debug, Clone, Copy)]
pub struct PunctuationInfo {
    pub id: PunctuationId,
    pub canonical: &'static str,
    pub description: &'static str,
}

/// Registry of all punctuation.
pub const PUNCTUATION: &[PunctuationInfo] = &[
    info(PunctuationId::Space, " ", "Separates tokens; never emitted."),
    info(PunctuationId::Comma, ",", "Separates call arguments (infix grammar)."),
    info(PunctuationId::Dot, ".", "Separates the segments of a dotted name."),
    info(PunctuationId::LParen, "(", "Opens a form, call or group."),
    info(PunctuationId::RParen, ")", "Closes a form, call or group."),
    info(PunctuationId::Backslash, "\\", "Escapes the next character inside a string literal."),
    info(PunctuationId::SingleQuote, "'", "String delimiter."),
    info(PunctuationId::DoubleQuote, "\"", "String delimiter."),
    info(PunctuationId::MacroOpen, "{%", "Opens a preprocessing macro."),
    info(PunctuationId::MacroClose, "%}", "Closes a preprocessing macro."),
];

pub fn info_for(id: PunctuationId) -> &'static PunctuationInfo {
    PUNCTUATION
        .iter()
        .find(|p| p.id == id)
        .expect("punctuation info missing")
}

pub fn as_str(id: PunctuationId) -> &'static str {
    info_for(id).canonical
}

/// Single-character spelling. Returns `None` for the two-character macro brackets.
pub fn as_char(id: PunctuationId) -> Option<char> {
    let mut chars = as_str(id).chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

pub fn from_str(s: &str) -> Option<PunctuationId> {
    PUNCTUATION.iter().find(|p| p.canonical == s).map(|p| p.id)
}

// --- helpers -----------------------------------------------------------------

const fn info(id: PunctuationId, canonical: &'static str, description: &'static str) -> PunctuationInfo {
    PunctuationInfo {
        id,
        canonical,
        description,
    }
}
