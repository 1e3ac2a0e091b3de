//! Engine facade: configuration, grammar selection, macro preprocessing and rule validation.
//!
//! An [`Engine`] pairs an [`EngineConfig`] with the host's capability registry. Engines are cheap to build and
//! hold no global state, so differently configured engines can coexist in one process.
//!
//! ## Notes
//! - A source that starts with a grammar marker (`#!prefix`, `#!infix`) is parsed with that grammar whatever the
//!   configured default.
//! - With macros enabled, every `{%...%}` span is parsed and evaluated before the main parse. A boolean macro is
//!   a guard: false fails with [`ScriptError::PreconditionNotSatisfied`], true disappears. A value macro is
//!   spliced into the text.
//!
//! ## Examples
//! ```rust
//! use sigscript::{Engine, EngineConfig};
//! use sigscript_core::lang::grammars::GrammarId;
//! use sigscript_core::static_registry::StaticRegistry;
//!
//! let engine = Engine::new(StaticRegistry::new().shared(), EngineConfig::default());
//! let expr = engine.parse("#!prefix (eq (add 1 2) 3)").unwrap();
//! assert!(expr.test().unwrap());
//! assert_eq!(engine.decompile(&expr, GrammarId::Infix), "1 + 2 == 3");
//! ```

use std::borrow::Cow;
use std::fmt;

use miette::{Diagnostic, LabeledSpan};
use sigscript_core::capabilities::SharedRegistry;
use sigscript_core::errors::{LocalizedMessage, RuntimeError};
use sigscript_core::lang::grammars::{self, GrammarId};
use sigscript_core::lang::messages::{EnglishCatalog, MessageCatalog, MessageId};
use sigscript_core::lang::punctuation::{self, PunctuationId};
use sigscript_core::value::{self, ScriptValue};
use sigscript_syntax::ast::{Expr, ExprType, Span, Spanned};
use sigscript_syntax::build::ParseContext;
use sigscript_syntax::diagnostics::ParsingError;
use sigscript_syntax::eval::ActionOutcome;
use sigscript_syntax::{decompile, parser};
use thiserror::Error;

use crate::describe;

// ============================================================================
// Configuration
// ============================================================================

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Grammar used when the source carries no marker.
    pub default_grammar: GrammarId,
    /// Reject comparison literals outside a signal's declared options.
    pub strict_options: bool,
    /// Expand `{%...%}` macros before parsing.
    pub macros: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_grammar: GrammarId::Infix,
            strict_options: false,
            macros: true,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_grammar(mut self, grammar: GrammarId) -> Self {
        self.default_grammar = grammar;
        self
    }

    pub fn with_strict_options(mut self, strict: bool) -> Self {
        self.strict_options = strict;
        self
    }

    pub fn with_macros(mut self, macros: bool) -> Self {
        self.macros = macros;
        self
    }
}

// ============================================================================
// Errors
// ============================================================================

/// A user-facing validation failure carrying a localization key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct LocParsingError {
    pub message: LocalizedMessage,
    pub span: Option<Span>,
}

impl LocParsingError {
    pub fn new(id: MessageId, span: Option<Span>) -> Self {
        Self {
            message: LocalizedMessage::new(id),
            span,
        }
    }

    pub fn key(&self) -> &'static str {
        self.message.key()
    }
}

/// Why a parse attempt produced no expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error(transparent)]
    Parsing(#[from] ParsingError),
    #[error(transparent)]
    Localized(#[from] LocParsingError),
    /// A macro guard evaluated to false. Not a defect in the text.
    #[error("{0}")]
    PreconditionNotSatisfied(LocalizedMessage),
}

impl ScriptError {
    pub fn span(&self) -> Option<Span> {
        match self {
            ScriptError::Parsing(err) => err.span,
            ScriptError::Localized(err) => err.span,
            ScriptError::PreconditionNotSatisfied(_) => None,
        }
    }

    pub fn is_precondition(&self) -> bool {
        matches!(self, ScriptError::PreconditionNotSatisfied(_))
    }

    /// Render for users through `catalog`. Free-form parser messages are not localized.
    pub fn render(&self, catalog: &dyn MessageCatalog) -> String {
        match self {
            ScriptError::Parsing(err) => match err.bad_state_error() {
                Some(state) => state.message.render(catalog),
                None => err.message.clone(),
            },
            ScriptError::Localized(err) => err.message.render(catalog),
            ScriptError::PreconditionNotSatisfied(message) => message.render(catalog),
        }
    }
}

impl Diagnostic for ScriptError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            ScriptError::Parsing(err) => err.code(),
            ScriptError::Localized(err) => Some(Box::new(err.key())),
            ScriptError::PreconditionNotSatisfied(message) => Some(Box::new(message.key())),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            ScriptError::Parsing(err) => err.labels(),
            ScriptError::Localized(err) => {
                let span = err.span?;
                Some(Box::new(std::iter::once(LabeledSpan::at(span.start..span.end, "here"))))
            }
            ScriptError::PreconditionNotSatisfied(_) => None,
        }
    }
}

/// Exactly one of a parsed expression or the reason there is none.
pub type ParsingResult = Result<Expression, ScriptError>;

// ============================================================================
// Expressions
// ============================================================================

/// A parsed, validated expression together with the grammar it was written in.
#[derive(Debug, Clone)]
pub struct Expression {
    tree: Spanned<Expr>,
    grammar: GrammarId,
}

impl Expression {
    pub fn new(tree: Spanned<Expr>, grammar: GrammarId) -> Self {
        Self { tree, grammar }
    }

    pub fn tree(&self) -> &Spanned<Expr> {
        &self.tree
    }

    pub fn node(&self) -> &Expr {
        &self.tree.node
    }

    pub fn grammar(&self) -> GrammarId {
        self.grammar
    }

    pub fn expr_type(&self) -> ExprType {
        self.tree.node.expr_type()
    }

    pub fn value(&self) -> Result<ScriptValue, RuntimeError> {
        self.tree.node.value()
    }

    pub fn test(&self) -> Result<bool, RuntimeError> {
        self.tree.node.test()
    }

    pub fn execute(&self) -> Result<ActionOutcome, RuntimeError> {
        self.tree.node.execute()
    }

    /// Canonical text in the grammar the expression was written in.
    pub fn canonical(&self) -> String {
        decompile::decompile(&self.tree.node, self.grammar)
    }

    pub fn into_tree(self) -> Spanned<Expr> {
        self.tree
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Parses, validates, decompiles and describes expressions against one host registry.
#[derive(Clone)]
pub struct Engine {
    config: EngineConfig,
    registry: SharedRegistry,
}

impl Engine {
    pub fn new(registry: SharedRegistry, config: EngineConfig) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    fn context(&self) -> ParseContext {
        ParseContext::new(self.registry.clone()).with_strict_options(self.config.strict_options)
    }

    /// Parse with the configured default grammar (or the grammar a leading marker names).
    ///
    /// ## Errors
    /// - [`ScriptError::Parsing`] for any tokenizer, grammar, type or reference failure.
    /// - [`ScriptError::PreconditionNotSatisfied`] when a macro guard is false.
    #[tracing::instrument(skip_all, fields(source_len = source.len()))]
    pub fn parse(&self, source: &str) -> ParsingResult {
        self.parse_with(source, self.config.default_grammar)
    }

    /// Parse with `grammar` unless the source carries a marker.
    pub fn parse_with(&self, source: &str, grammar: GrammarId) -> ParsingResult {
        let (grammar, body) = match grammars::strip_marker(source) {
            Some((forced, rest)) => (forced, rest),
            None => (grammar, source),
        };
        let offset = source.len() - body.len();

        let text = if self.config.macros {
            self.preprocess(body, grammar).map_err(|err| shift_error(err, offset))?
        } else {
            Cow::Borrowed(body)
        };

        // Positions only map back onto the source when no macro rewrote it.
        let rewritten = matches!(text, Cow::Owned(_));
        let tree = parser::parse(&text, grammar, &self.context()).map_err(|err| {
            if rewritten {
                ParsingError { span: None, ..err }
            } else {
                err.shifted(offset)
            }
        })?;
        tracing::debug!(grammar = %grammar, ty = %tree.node.expr_type(), "parsed expression");
        Ok(Expression::new(tree, grammar))
    }

    /// Parse a rule condition: a boolean expression that reads at least one signal or property.
    pub fn parse_condition(&self, source: &str) -> ParsingResult {
        let expr = self.parse(source)?;
        let span = Some(expr.tree.span);
        if expr.expr_type() != ExprType::Boolean {
            return Err(LocParsingError::new(MessageId::ConditionNotBoolean, span).into());
        }
        if !expr.node().reads_host_state() {
            return Err(LocParsingError::new(MessageId::ConditionWithoutSignal, span).into());
        }
        Ok(expr)
    }

    /// Parse a rule action: the expression must invoke a host action.
    pub fn parse_action(&self, source: &str) -> ParsingResult {
        let expr = self.parse(source)?;
        if expr.expr_type() != ExprType::Action {
            return Err(LocParsingError::new(MessageId::NotAnAction, Some(expr.tree.span)).into());
        }
        Ok(expr)
    }

    pub fn decompile(&self, expr: &Expression, grammar: GrammarId) -> String {
        decompile::decompile(expr.node(), grammar)
    }

    /// Decompile into the configured default grammar.
    pub fn decompile_default(&self, expr: &Expression) -> String {
        self.decompile(expr, self.config.default_grammar)
    }

    /// Parse `source` and return the canonical text that should be persisted for it.
    pub fn canonicalize(&self, source: &str) -> Result<String, ScriptError> {
        Ok(self.parse(source)?.canonical())
    }

    /// Human-facing English description.
    pub fn describe(&self, expr: &Expression) -> String {
        describe::describe(expr.node(), &EnglishCatalog)
    }

    pub fn describe_with(&self, expr: &Expression, catalog: &dyn MessageCatalog) -> String {
        describe::describe(expr.node(), catalog)
    }

    /// Expand `{%...%}` macros in `source`.
    ///
    /// ## Errors
    /// - [`ScriptError::PreconditionNotSatisfied`] when a boolean macro evaluates to false.
    /// - [`ScriptError::Parsing`] for an unterminated macro, a macro that fails to parse or evaluate, or a macro
    ///   that is an action.
    #[tracing::instrument(skip_all, fields(source_len = source.len()))]
    pub fn preprocess<'s>(&self, source: &'s str, grammar: GrammarId) -> Result<Cow<'s, str>, ScriptError> {
        let open = punctuation::as_str(PunctuationId::MacroOpen);
        let close = punctuation::as_str(PunctuationId::MacroClose);
        if !source.contains(open) {
            return Ok(Cow::Borrowed(source));
        }

        let mut out = String::with_capacity(source.len());
        let mut rest = source;
        let mut offset = 0;
        while let Some(start) = rest.find(open) {
            out.push_str(&rest[..start]);
            let body_start = start + open.len();
            let Some(len) = rest[body_start..].find(close) else {
                return Err(ParsingError::syntax(
                    format!("unterminated macro: missing '{close}'"),
                    Span::new(offset + start, offset + rest.len()),
                )
                .into());
            };
            let body = &rest[body_start..body_start + len];
            out.push_str(&self.expand_macro(body, grammar, offset + body_start)?);

            let consumed = body_start + len + close.len();
            offset += consumed;
            rest = &rest[consumed..];
        }
        out.push_str(rest);
        tracing::debug!(expanded = %out, "macros expanded");
        Ok(Cow::Owned(out))
    }

    fn expand_macro(&self, body: &str, grammar: GrammarId, at: usize) -> Result<String, ScriptError> {
        let expr = parser::parse(body, grammar, &self.context()).map_err(|err| err.shifted(at))?;
        let span = expr.span.shift(at);
        let failed = |err: RuntimeError| ParsingError::value(format!("macro '{}' failed: {err}", body.trim()), span);

        match expr.node.expr_type() {
            ExprType::Boolean => match expr.node.test() {
                Ok(true) => Ok(String::new()),
                Ok(false) => Err(ScriptError::PreconditionNotSatisfied(
                    LocalizedMessage::new(MessageId::PreconditionNotSatisfied).arg(body.trim()),
                )),
                Err(err) => Err(failed(err).into()),
            },
            ExprType::Value(_) => match expr.node.value() {
                Ok(ScriptValue::Number(n)) => Ok(value::format_scaled(n)),
                Ok(other) => Ok(other.as_string()),
                Err(err) => Err(failed(err).into()),
            },
            found @ (ExprType::Action | ExprType::Symbol) => Err(ParsingError::type_error(
                format!("a macro must be a condition or a value, found {found}"),
                span,
            )
            .into()),
        }
    }
}

fn shift_error(err: ScriptError, offset: usize) -> ScriptError {
    match err {
        ScriptError::Parsing(err) => ScriptError::Parsing(err.shifted(offset)),
        other => other,
    }
}
