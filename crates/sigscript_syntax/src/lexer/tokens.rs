//! Token types and tokenizer configuration.
//!
//! Unlike a fixed-language lexer, the SigScript tokenizer is driven entirely by a [`SyntaxConfig`]: each
//! grammar supplies its own quote characters, stop symbols and keyword sets (derived from
//! `sigscript_core::lang`), and tests or hosts can build custom configurations.

use std::fmt;

use sigscript_core::lang::grammars::{self, GrammarId};

use crate::ast::Span;

/// Kind of token produced by the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A reserved word or a multi-character stop-symbol keyword such as `<=`.
    Keyword,
    /// A single stop symbol other than space.
    StopSymbol,
    /// A quoted literal; the token value holds the unescaped text without quotes.
    StringLiteral,
    /// A run starting with a digit or `-`. Not validated as a number here.
    NumericValue,
    /// A dotted name such as `Door.Position`.
    Identifier,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Keyword => "keyword",
            TokenKind::StopSymbol => "symbol",
            TokenKind::StringLiteral => "string",
            TokenKind::NumericValue => "number",
            TokenKind::Identifier => "identifier",
        };
        f.write_str(name)
    }
}

/// A token with its text and source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub value: String,
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(value: impl Into<String>, kind: TokenKind, span: Span) -> Self {
        Self {
            value: value.into(),
            kind,
            span,
        }
    }

    /// Return `true` if this is the stop symbol `c`.
    pub fn is_symbol(&self, c: char) -> bool {
        self.kind == TokenKind::StopSymbol && self.value.chars().eq(std::iter::once(c))
    }

    /// Return `true` if this is the keyword `kw`.
    pub fn is_keyword(&self, kw: &str) -> bool {
        self.kind == TokenKind::Keyword && self.value == kw
    }
}

/// Tokenizer configuration.
///
/// ## Notes
/// - `stop_keywords` are tried longest first regardless of the order given.
/// - Space is always a separator; tabs, newlines and carriage returns are treated as spaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxConfig {
    pub quotes: Vec<char>,
    pub stop_symbols: Vec<char>,
    pub keywords: Vec<String>,
    pub stop_keywords: Vec<String>,
}

impl Default for SyntaxConfig {
    fn default() -> Self {
        Self {
            quotes: Vec::new(),
            stop_symbols: vec![' '],
            keywords: Vec::new(),
            stop_keywords: Vec::new(),
        }
    }
}

impl SyntaxConfig {
    /// Create an empty configuration (space is the only stop symbol).
    pub fn new() -> Self {
        Self::default()
    }

    /// The configuration a front-end grammar tokenizes with.
    pub fn for_grammar(grammar: GrammarId) -> Self {
        let info = grammars::info_for(grammar);
        Self::new()
            .with_quotes(info.quotes)
            .with_stop_symbols(info.stop_symbols)
            .with_keywords(grammars::keywords(grammar))
            .with_stop_keywords(grammars::stop_keywords(grammar))
    }

    pub fn with_quotes(mut self, quotes: &[char]) -> Self {
        self.quotes = quotes.to_vec();
        self
    }

    pub fn with_stop_symbols(mut self, symbols: &[char]) -> Self {
        self.stop_symbols = symbols.to_vec();
        if !self.stop_symbols.contains(&' ') {
            self.stop_symbols.push(' ');
        }
        self
    }

    pub fn with_keywords<S: Into<String>>(mut self, keywords: impl IntoIterator<Item = S>) -> Self {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_stop_keywords<S: Into<String>>(mut self, keywords: impl IntoIterator<Item = S>) -> Self {
        self.stop_keywords = keywords.into_iter().map(Into::into).collect();
        self.stop_keywords.sort_by_key(|kw| std::cmp::Reverse(kw.len()));
        self
    }

    pub fn is_stop_symbol(&self, c: char) -> bool {
        is_blank(c) || self.stop_symbols.contains(&c)
    }

    pub fn is_quote(&self, c: char) -> bool {
        self.quotes.contains(&c)
    }

    pub fn is_keyword(&self, word: &str) -> bool {
        self.keywords.iter().any(|kw| kw == word)
    }
}

/// Whitespace that separates tokens.
pub(crate) fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}
