//! Front-end parsers.
//!
//! Two grammars build the same [`Expr`] tree:
//! - [`prefix`]: `(keyword operand*)` forms, Lisp style;
//! - [`infix`]: operators between operands with precedence climbing, builtins and actions as `name(args)`.
//!
//! Grammar rules only decide *shape*. Arity, operand types, flattening and reference resolution happen in
//! [`crate::build::NodeBuilder`], so the same mistake produces the same error in either syntax.
//!
//! ## Module Structure
//!
//! - `prefix` - prefix grammar
//! - `infix` - infix grammar (precedence climbing)

pub mod infix;
pub mod prefix;

pub use infix::parse_infix;
pub use prefix::parse_prefix;

use sigscript_core::lang::grammars::GrammarId;

use crate::ast::{Expr, Span, Spanned};
use crate::build::ParseContext;
use crate::diagnostics::ParsingError;
use crate::lexer::{Token, TokenKind};

/// Parse one complete expression written in `grammar`.
///
/// ## Errors
/// - The first tokenizer or parser error, positioned where possible.
/// - Trailing tokens after a complete expression.
pub fn parse(source: &str, grammar: GrammarId, ctx: &ParseContext) -> Result<Spanned<Expr>, ParsingError> {
    match grammar {
        GrammarId::Prefix => parse_prefix(source, ctx),
        GrammarId::Infix => parse_infix(source, ctx),
    }
}

/// Reject results that are not expressions on their own.
pub(crate) fn finish(expr: Spanned<Expr>) -> Result<Spanned<Expr>, ParsingError> {
    match &expr.node {
        Expr::Symbol(name) => Err(ParsingError::syntax(
            format!("'{name}' is a bare name, not an expression"),
            expr.span,
        )),
        _ => Ok(expr),
    }
}

pub(crate) fn empty_input(source: &str) -> ParsingError {
    ParsingError::syntax("empty expression", Span::new(0, source.len()))
}

/// Read position over a token slice.
pub(crate) struct TokenCursor<'a> {
    tokens: &'a [Token],
    pos: usize,
    source_len: usize,
}

impl<'a> TokenCursor<'a> {
    pub fn new(tokens: &'a [Token], source_len: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            source_len,
        }
    }

    pub fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    pub fn advance(&mut self) -> Option<&'a Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    pub fn check_symbol(&self, c: char) -> bool {
        self.peek().is_some_and(|t| t.is_symbol(c))
    }

    /// Consume the stop symbol `c` if it is next.
    pub fn match_symbol(&mut self, c: char) -> Option<&'a Token> {
        if self.check_symbol(c) { self.advance() } else { None }
    }

    pub fn expect_symbol(&mut self, c: char, expected: &str) -> Result<&'a Token, ParsingError> {
        match self.match_symbol(c) {
            Some(token) => Ok(token),
            None => Err(self.unexpected(expected)),
        }
    }

    /// Error for whatever is at the cursor (or the end of input).
    pub fn unexpected(&self, expected: &str) -> ParsingError {
        match self.peek() {
            Some(token) => Self::unexpected_token(token, expected),
            None => ParsingError::syntax(format!("unexpected end of input, expected {expected}"), self.eof_span()),
        }
    }

    pub fn unexpected_token(token: &Token, expected: &str) -> ParsingError {
        let found = match token.kind {
            TokenKind::StringLiteral => format!("string '{}'", token.value),
            _ => format!("'{}'", token.value),
        };
        ParsingError::syntax(format!("expected {expected}, found {found}"), token.span)
    }

    pub fn eof_span(&self) -> Span {
        Span::new(self.source_len, self.source_len)
    }

    /// Fail unless every token has been consumed.
    pub fn expect_end(&self) -> Result<(), ParsingError> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(ParsingError::syntax(
                format!("unexpected '{}' after the end of the expression", token.value),
                token.span,
            )),
        }
    }
}
