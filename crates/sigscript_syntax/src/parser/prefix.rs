//! Prefix grammar: `( <keyword> <operand>* )`.
//!
//! ```text
//! expr    := form | NUMBER | STRING | IDENTIFIER
//! form    := "(" KEYWORD expr* ")"
//! ```
//!
//! Identifiers become `Symbol` nodes; only `sig`, `act`, `?sig` and `?act` accept them.

use sigscript_core::lang::grammars::GrammarId;
use sigscript_core::lang::operators;
use sigscript_core::value::ScriptValue;

use crate::ast::{Expr, Span, Spanned};
use crate::build::{NodeBuilder, ParseContext};
use crate::diagnostics::ParsingError;
use crate::lexer::{self, SyntaxConfig, TokenKind};
use crate::parser::{TokenCursor, empty_input, finish};

/// Parse a prefix-grammar expression.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn parse_prefix(source: &str, ctx: &ParseContext) -> Result<Spanned<Expr>, ParsingError> {
    let tokens = lexer::tokenize(source, &SyntaxConfig::for_grammar(GrammarId::Prefix))?;
    if tokens.is_empty() {
        return Err(empty_input(source));
    }
    let mut parser = PrefixParser {
        cursor: TokenCursor::new(&tokens, source.len()),
        builder: NodeBuilder::new(ctx, GrammarId::Prefix),
    };
    let expr = parser.expression()?;
    parser.cursor.expect_end()?;
    finish(expr)
}

struct PrefixParser<'a> {
    cursor: TokenCursor<'a>,
    builder: NodeBuilder<'a>,
}

impl<'a> PrefixParser<'a> {
    fn expression(&mut self) -> Result<Spanned<Expr>, ParsingError> {
        let Some(token) = self.cursor.advance() else {
            return Err(self.cursor.unexpected("an expression"));
        };
        match token.kind {
            TokenKind::StopSymbol if token.is_symbol('(') => self.form(token.span),
            TokenKind::NumericValue => self.builder.number(&token.value, token.span),
            TokenKind::StringLiteral => Ok(self.builder.constant(ScriptValue::string(&token.value), token.span)),
            TokenKind::Identifier => Ok(self.builder.symbol(&token.value, token.span)),
            TokenKind::Keyword => Err(ParsingError::syntax(
                format!("'{}' must directly follow '('", token.value),
                token.span,
            )),
            TokenKind::StopSymbol => Err(TokenCursor::unexpected_token(token, "an expression")),
        }
    }

    fn form(&mut self, open: Span) -> Result<Spanned<Expr>, ParsingError> {
        let head = match self.cursor.advance() {
            Some(token) if token.kind == TokenKind::Keyword => token,
            Some(token) => return Err(TokenCursor::unexpected_token(token, "an operator keyword after '('")),
            None => return Err(ParsingError::syntax("unclosed '('", open.merge(self.cursor.eof_span()))),
        };
        let Some(op) = operators::from_prefix(&head.value) else {
            return Err(ParsingError::syntax(
                format!("unknown operator '{}'", head.value),
                head.span,
            ));
        };

        let mut operands = Vec::new();
        let close = loop {
            if let Some(close) = self.cursor.match_symbol(')') {
                break close;
            }
            if self.cursor.peek().is_none() {
                return Err(ParsingError::syntax("unclosed '('", open.merge(self.cursor.eof_span())));
            }
            operands.push(self.expression()?);
        };
        self.builder.operator(op, operands, open.merge(close.span))
    }
}
