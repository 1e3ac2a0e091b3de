//! Infix grammar: precedence climbing over the operator registry.
//!
//! ```text
//! expr     := unary (BINOP expr)*          -- climbing on registry precedence
//! unary    := "-" unary | "not" unary | primary
//! primary  := NUMBER | STRING | "(" expr ")" | call | IDENTIFIER ( "(" args? ")" )?
//! call     := BUILTIN "(" args? ")"
//! args     := expr ("," expr)*
//! ```
//!
//! ## Notes
//! - Binding powers come from `sigscript_core::lang::operators`; binary operators are left-associative.
//! - A bare dotted name reads a signal; the same name followed by `(` invokes an action.
//! - `-` directly in front of a number literal folds into a negative constant.

use sigscript_core::lang::grammars::GrammarId;
use sigscript_core::lang::operators::{self, OperatorFamily, OperatorId};
use sigscript_core::value::ScriptValue;

use crate::ast::{Expr, Spanned};
use crate::build::{NodeBuilder, ParseContext};
use crate::diagnostics::ParsingError;
use crate::lexer::{self, SyntaxConfig, Token, TokenKind};
use crate::parser::{TokenCursor, empty_input, finish};

const LOWEST_PRECEDENCE: u8 = 0;

/// Parse an infix-grammar expression.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn parse_infix(source: &str, ctx: &ParseContext) -> Result<Spanned<Expr>, ParsingError> {
    let tokens = lexer::tokenize(source, &SyntaxConfig::for_grammar(GrammarId::Infix))?;
    if tokens.is_empty() {
        return Err(empty_input(source));
    }
    let mut parser = InfixParser {
        cursor: TokenCursor::new(&tokens, source.len()),
        builder: NodeBuilder::new(ctx, GrammarId::Infix),
    };
    let expr = parser.expression(LOWEST_PRECEDENCE)?;
    parser.cursor.expect_end()?;
    finish(expr)
}

struct InfixParser<'a> {
    cursor: TokenCursor<'a>,
    builder: NodeBuilder<'a>,
}

impl<'a> InfixParser<'a> {
    // ========================================================================
    // Operators
    // ========================================================================

    fn expression(&mut self, min_precedence: u8) -> Result<Spanned<Expr>, ParsingError> {
        let mut left = self.unary()?;
        while let Some((op, precedence)) = self.binary_operator() {
            if precedence < min_precedence {
                break;
            }
            self.cursor.advance();
            let right = self.expression(precedence + 1)?;
            let span = left.span.merge(right.span);
            left = self.builder.operator(op, vec![left, right], span)?;
        }
        Ok(left)
    }

    fn binary_operator(&self) -> Option<(OperatorId, u8)> {
        let token = self.cursor.peek().filter(|t| is_operator_token(t))?;
        let op = operators::binary_from_infix(&token.value)?;
        Some((op, operators::info_for(op).precedence))
    }

    fn unary(&mut self) -> Result<Spanned<Expr>, ParsingError> {
        let Some(token) = self.cursor.peek() else {
            return Err(self.cursor.unexpected("an expression"));
        };
        let op = if is_operator_token(token) {
            operators::unary_from_infix(&token.value)
        } else {
            None
        };
        let Some(op) = op else {
            return self.primary();
        };
        self.cursor.advance();

        if op == OperatorId::Neg {
            if let Some(number) = self.cursor.peek().filter(|t| t.kind == TokenKind::NumericValue) {
                self.cursor.advance();
                return self
                    .builder
                    .number(&format!("-{}", number.value), token.span.merge(number.span));
            }
        }

        let operand = self.expression(operators::unary_operand_precedence(op))?;
        let span = token.span.merge(operand.span);
        self.builder.operator(op, vec![operand], span)
    }

    // ========================================================================
    // Primaries
    // ========================================================================

    fn primary(&mut self) -> Result<Spanned<Expr>, ParsingError> {
        let Some(token) = self.cursor.advance() else {
            return Err(self.cursor.unexpected("an expression"));
        };
        match token.kind {
            TokenKind::NumericValue => self.builder.number(&token.value, token.span),
            TokenKind::StringLiteral => Ok(self.builder.constant(ScriptValue::string(&token.value), token.span)),
            TokenKind::StopSymbol if token.is_symbol('(') => {
                let inner = self.expression(LOWEST_PRECEDENCE)?;
                let close = self.cursor.expect_symbol(')', "')'")?;
                Ok(Spanned::new(inner.node, token.span.merge(close.span)))
            }
            TokenKind::Keyword => match operators::call_from_infix(&token.value) {
                Some(op) => self.call(op, token),
                None => Err(TokenCursor::unexpected_token(token, "an expression")),
            },
            TokenKind::Identifier if self.cursor.check_symbol('(') => {
                let (args, close) = self.arguments(false)?;
                self.builder.action(&token.value, args, token.span.merge(close.span))
            }
            TokenKind::Identifier => self.builder.signal(&token.value, token.span),
            TokenKind::StopSymbol => Err(TokenCursor::unexpected_token(token, "an expression")),
        }
    }

    /// `name(args)` for a builtin.
    fn call(&mut self, op: OperatorId, name: &'a Token) -> Result<Spanned<Expr>, ParsingError> {
        let names_only = operators::info_for(op).family == OperatorFamily::Existence;
        let (args, close) = self.arguments(names_only)?;
        self.builder.operator(op, args, name.span.merge(close.span))
    }

    /// Parenthesised, comma-separated arguments; returns them with the closing parenthesis.
    fn arguments(&mut self, names_only: bool) -> Result<(Vec<Spanned<Expr>>, &'a Token), ParsingError> {
        self.cursor.expect_symbol('(', "'('")?;
        let mut args = Vec::new();
        if let Some(close) = self.cursor.match_symbol(')') {
            return Ok((args, close));
        }
        loop {
            let arg = if names_only { self.name()? } else { self.expression(LOWEST_PRECEDENCE)? };
            args.push(arg);
            if self.cursor.match_symbol(',').is_none() {
                let close = self.cursor.expect_symbol(')', "',' or ')'")?;
                return Ok((args, close));
            }
        }
    }

    fn name(&mut self) -> Result<Spanned<Expr>, ParsingError> {
        match self.cursor.peek() {
            Some(token) if token.kind == TokenKind::Identifier => {
                self.cursor.advance();
                Ok(self.builder.symbol(&token.value, token.span))
            }
            _ => Err(self.cursor.unexpected("a name")),
        }
    }
}

/// Operators are stop symbols (`+`), stop-symbol keywords (`<=`) or word keywords (`and`).
fn is_operator_token(token: &Token) -> bool {
    matches!(token.kind, TokenKind::StopSymbol | TokenKind::Keyword)
}
