//! Front-end grammar vocabulary.
//!
//! SigScript has two interchangeable concrete syntaxes that build the same expression tree:
//! - **prefix**: `(eq (sig Door.Position) 100)`
//! - **infix**: `Door.Position == 100`
//!
//! Each grammar entry records its name, its source marker, its quote characters and its plain stop symbols.
//! Keyword sets are derived from the operator registry so that adding an operator updates both tokenizers.
//!
//! ## Examples
//! ```rust
//! use sigscript_core::lang::grammars::{self, GrammarId};
//!
//! assert_eq!(grammars::from_name("infix"), Some(GrammarId::Infix));
//! assert_eq!(grammars::strip_marker("#!prefix (not (sig A.b))"), Some((GrammarId::Prefix, " (not (sig A.b))")));
//! assert!(grammars::stop_keywords(GrammarId::Infix).contains(&"<="));
//! ```

use std::fmt;

use super::operators::{InfixForm, OPERATORS};

/// Stable identifier for a front-end grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum GrammarId {
    Prefix,
    #[default]
    Infix,
}

/// Metadata for a grammar.
#[derive(Debug, Clone, Copy)]
pub struct GrammarInfo {
    pub id: GrammarId,
    pub name: &'static str,
    /// Leading marker that forces this grammar regardless of the configured default.
    pub marker: &'static str,
    pub quotes: &'static [char],
    /// Single-character stop symbols. Space separates tokens and is never emitted.
    pub stop_symbols: &'static [char],
    pub description: &'static str,
}

/// Registry of all grammars.
pub const GRAMMARS: &[GrammarInfo] = &[
    GrammarInfo {
        id: GrammarId::Prefix,
        name: "prefix",
        marker: "#!prefix",
        quotes: &['\'', '"'],
        stop_symbols: &[' ', '(', ')'],
        description: "Parenthesised forms with the operator keyword first.",
    },
    GrammarInfo {
        id: GrammarId::Infix,
        name: "infix",
        marker: "#!infix",
        quotes: &['\'', '"'],
        stop_symbols: &[' ', '(', ')', ',', '+', '-', '*', '/', '%', '<', '>', '=', '!'],
        description: "Operators between operands, calls written as `name(args)`.",
    },
];

pub fn info_for(id: GrammarId) -> &'static GrammarInfo {
    GRAMMARS.iter().find(|g| g.id == id).expect("grammar info missing")
}

pub fn as_str(id: GrammarId) -> &'static str {
    info_for(id).name
}

pub fn from_name(name: &str) -> Option<GrammarId> {
    GRAMMARS.iter().find(|g| g.name == name).map(|g| g.id)
}

/// Detect a leading grammar marker.
///
/// ## Returns
/// - The forced grammar and the remaining source (marker removed), when `source` starts with a marker followed by
///   whitespace or the end of input.
pub fn strip_marker(source: &str) -> Option<(GrammarId, &str)> {
    GRAMMARS.iter().find_map(|g| {
        let rest = source.strip_prefix(g.marker)?;
        match rest.chars().next() {
            None => Some((g.id, rest)),
            Some(c) if c.is_whitespace() => Some((g.id, rest)),
            Some(_) => None,
        }
    })
}

/// Reserved words of a grammar (plain keywords, not stop-symbol keywords).
pub fn keywords(id: GrammarId) -> Vec<&'static str> {
    match id {
        GrammarId::Prefix => OPERATORS.iter().map(|o| o.prefix).collect(),
        GrammarId::Infix => OPERATORS
            .iter()
            .filter_map(|o| match o.infix {
                InfixForm::Call(name) => Some(name),
                InfixForm::Binary(s) | InfixForm::Unary(s) if is_word(s) => Some(s),
                _ => None,
            })
            .collect(),
    }
}

/// Multi-character operators built from stop symbols (e.g. `<=`), longest first.
pub fn stop_keywords(id: GrammarId) -> Vec<&'static str> {
    let stops = info_for(id).stop_symbols;
    let mut out: Vec<&'static str> = OPERATORS
        .iter()
        .filter_map(|o| match o.infix {
            InfixForm::Binary(s) if id == GrammarId::Infix && s.chars().count() > 1 && !is_word(s) => Some(s),
            _ => None,
        })
        .filter(|s| s.chars().any(|c| stops.contains(&c)))
        .collect();
    out.sort_by_key(|s| std::cmp::Reverse(s.len()));
    out.dedup();
    out
}

impl fmt::Display for GrammarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(as_str(*self))
    }
}

// --- helpers -----------------------------------------------------------------

fn is_word(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infix_keywords() {
        let kws = keywords(GrammarId::Infix);
        for kw in ["and", "or", "not", "min", "max", "round", "concat", "getnum", "hassignal"] {
            assert!(kws.contains(&kw), "missing {kw}");
        }
        assert!(!kws.contains(&"+"));
    }

    #[test]
    fn test_prefix_keywords_include_existence_checks() {
        let kws = keywords(GrammarId::Prefix);
        assert!(kws.contains(&"?sig"));
        assert!(kws.contains(&"?act"));
        assert!(stop_keywords(GrammarId::Prefix).is_empty());
    }

    #[test]
    fn test_infix_stop_keywords() {
        let mut kws = stop_keywords(GrammarId::Infix);
        kws.sort_unstable();
        assert_eq!(kws, vec!["!=", "<=", "==", ">="]);
    }

    #[test]
    fn test_marker_requires_separator() {
        assert_eq!(strip_marker("#!infix"), Some((GrammarId::Infix, "")));
        assert_eq!(strip_marker("#!infix\n1 == 1"), Some((GrammarId::Infix, "\n1 == 1")));
        assert_eq!(strip_marker("#!infixed"), None);
        assert_eq!(strip_marker("1 == 1"), None);
    }
}
