//! Shared node construction.
//!
//! Both front-end parsers hand raw operands to a [`NodeBuilder`], which owns every rule about what a valid tree
//! looks like:
//! - operand arity (from the operator registry) and static operand types;
//! - reference resolution against the host's capability registry;
//! - flattening of `add` / `and` / `or` chains into one n-ary node;
//! - the legacy-literal remap and option enforcement for signal comparisons.
//!
//! Because the rules live here and not in the grammars, `(add 1 (add 2 3))` and `1 + (2 + 3)` build the same
//! tree, and an arity error reads the same whichever syntax produced it.

use std::rc::Rc;

use sigscript_core::capabilities::{SharedRegistry, SignalDefinition};
use sigscript_core::errors::LocalizedMessage;
use sigscript_core::lang::grammars::GrammarId;
use sigscript_core::lang::messages::MessageId;
use sigscript_core::lang::operators::{self, OperatorFamily, OperatorId};
use sigscript_core::lang::registry::Arity;
use sigscript_core::value::{self, ScriptValue, ValueType};

use crate::ast::{
    ActionCall, ComparisonOp, ExistenceCheck, ExistenceKind, Expr, ExprType, LogicalOp, MathOp, PropertyAccess,
    PropertyMode, SignalRef, Span, Spanned,
};
use crate::diagnostics::ParsingError;

/// Action-name suffix marking "execute, then deactivate the rule".
pub const ONCE_SUFFIX: &str = ".once";

/// Everything a parse needs from its caller.
#[derive(Clone)]
pub struct ParseContext {
    pub registry: SharedRegistry,
    /// Reject comparison literals outside a signal's declared options.
    pub strict_options: bool,
}

impl ParseContext {
    pub fn new(registry: SharedRegistry) -> Self {
        Self {
            registry,
            strict_options: false,
        }
    }

    pub fn with_strict_options(mut self, strict: bool) -> Self {
        self.strict_options = strict;
        self
    }
}

/// Canonical replacement for a deprecated comparison literal.
///
/// Pure: the caller builds a fresh constant node from the result before linking it into a comparison.
pub fn remap_literal(definition: &SignalDefinition, literal: &ScriptValue) -> Option<ScriptValue> {
    definition.remap_legacy(literal).cloned()
}

/// Validating constructor for expression nodes.
pub struct NodeBuilder<'a> {
    ctx: &'a ParseContext,
    grammar: GrammarId,
}

impl<'a> NodeBuilder<'a> {
    /// `grammar` only affects how operators are spelled in error messages.
    pub fn new(ctx: &'a ParseContext, grammar: GrammarId) -> Self {
        Self { ctx, grammar }
    }

    pub fn constant(&self, value: ScriptValue, span: Span) -> Spanned<Expr> {
        Spanned::new(Expr::Constant(value), span)
    }

    /// Build a numeric constant from literal text (`"1.5"`, `"-2"`).
    pub fn number(&self, text: &str, span: Span) -> Result<Spanned<Expr>, ParsingError> {
        let scaled = value::parse_scaled(text)
            .ok_or_else(|| ParsingError::syntax(format!("malformed number '{text}'"), span))?;
        Ok(self.constant(ScriptValue::Number(scaled), span))
    }

    pub fn symbol(&self, name: &str, span: Span) -> Spanned<Expr> {
        Spanned::new(Expr::Symbol(name.to_string()), span)
    }

    /// Build the node for `op` applied to `operands`.
    ///
    /// ## Errors
    /// - `Arity` if the operand count is outside the operator's arity.
    /// - `Type` if an operand has the wrong static type.
    /// - `BadState` if a referenced signal, action or property does not resolve.
    /// - `Value` if option enforcement rejects a comparison literal.
    pub fn operator(&self, op: OperatorId, operands: Vec<Spanned<Expr>>, span: Span) -> Result<Spanned<Expr>, ParsingError> {
        let info = operators::info_for(op);
        if !info.arity.accepts(operands.len()) {
            return Err(ParsingError::arity(
                format!(
                    "'{}' expects {}, found {}",
                    self.spelling(op),
                    count_phrase(info.arity, "operand"),
                    operands.len()
                ),
                span,
            ));
        }

        match info.family {
            OperatorFamily::Comparison => self.comparison(op, operands, span),
            OperatorFamily::Logical => self.logical(op, operands, span),
            OperatorFamily::Math => self.math(op, operands, span),
            OperatorFamily::Concat => self.concat(operands, span),
            OperatorFamily::Property => self.property(op, operands, span),
            OperatorFamily::Existence => self.existence(op, operands, span),
            OperatorFamily::Reference => {
                let mut operands = operands.into_iter();
                let name = match operands.next() {
                    Some(Spanned {
                        node: Expr::Symbol(name),
                        ..
                    }) => name,
                    _ => {
                        return Err(ParsingError::type_error(
                            format!("'{}' expects a name as its first operand", self.spelling(op)),
                            span,
                        ));
                    }
                };
                if op == OperatorId::Signal {
                    self.signal(&name, span)
                } else {
                    self.action(&name, operands.collect(), span)
                }
            }
        }
    }

    /// Resolve a signal read.
    pub fn signal(&self, name: &str, span: Span) -> Result<Spanned<Expr>, ParsingError> {
        let registry = &self.ctx.registry;
        let definition = registry
            .signal_definition(name)
            .map_err(|err| ParsingError::bad_state(err, span))?;
        let source = registry
            .signal_source(name)
            .map_err(|err| ParsingError::bad_state(err, span))?;
        Ok(Spanned::new(Expr::Signal(SignalRef { definition, source }), span))
    }

    /// Resolve an action invocation; `name` may carry the [`ONCE_SUFFIX`].
    pub fn action(&self, name: &str, args: Vec<Spanned<Expr>>, span: Span) -> Result<Spanned<Expr>, ParsingError> {
        let (name, once) = match name.strip_suffix(ONCE_SUFFIX) {
            Some(base) if !base.is_empty() => (base, true),
            _ => (name, false),
        };
        let registry = &self.ctx.registry;
        let definition = registry
            .action_definition(name)
            .map_err(|err| ParsingError::bad_state(err, span))?;
        let executor = registry
            .action_executor(name)
            .map_err(|err| ParsingError::bad_state(err, span))?;

        let arity = definition.arity();
        if !arity.accepts(args.len()) {
            return Err(ParsingError::arity(
                format!(
                    "{name} expects {}, found {}",
                    count_phrase(arity, "argument"),
                    args.len()
                ),
                span,
            ));
        }
        for (i, arg) in args.iter().enumerate() {
            let Some(param) = definition.argument(i) else {
                continue;
            };
            let found = arg.node.expr_type();
            if found != ExprType::Value(param.value_type) {
                return Err(ParsingError::type_error(
                    format!(
                        "argument {} of {name} ('{}') must be a {}, found {found}",
                        i + 1,
                        param.name,
                        param.value_type
                    ),
                    arg.span,
                ));
            }
        }

        Ok(Spanned::new(
            Expr::Action(ActionCall {
                definition,
                args,
                once,
                executor,
            }),
            span,
        ))
    }

    // ========================================================================
    // Operator families
    // ========================================================================

    fn comparison(&self, op: OperatorId, operands: Vec<Spanned<Expr>>, span: Span) -> Result<Spanned<Expr>, ParsingError> {
        let Some(cmp) = ComparisonOp::from_operator(op) else {
            return Err(self.misrouted(op, span));
        };
        let [left, right] = self.exactly::<2>(op, operands, span)?;

        let left_ty = self.value_operand(op, &left)?;
        let right_ty = self.value_operand(op, &right)?;
        if left_ty != right_ty {
            return Err(ParsingError::type_error(
                format!("cannot compare {left_ty} with {right_ty}"),
                span,
            ));
        }
        if cmp.is_relational() && left_ty == ValueType::String {
            return Err(ParsingError::type_error(
                format!("'{}' is not defined for strings", self.spelling(op)),
                span,
            ));
        }

        let (left, right) = if matches!(left.node, Expr::Signal(_)) {
            let right = self.apply_signal_options(&left, right)?;
            (left, right)
        } else {
            let left = self.apply_signal_options(&right, left)?;
            (left, right)
        };

        Ok(Spanned::new(
            Expr::Comparison {
                op: cmp,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        ))
    }

    /// Remap a legacy literal compared against a signal, then enforce the signal's options.
    fn apply_signal_options(&self, signal: &Spanned<Expr>, other: Spanned<Expr>) -> Result<Spanned<Expr>, ParsingError> {
        let Expr::Signal(signal) = &signal.node else {
            return Ok(other);
        };
        let definition = &signal.definition;
        let literal = match other.node {
            Expr::Constant(literal) => literal,
            node => return Ok(Spanned::new(node, other.span)),
        };

        let literal = match remap_literal(definition, &literal) {
            Some(canonical) => {
                tracing::warn!(
                    signal = %definition.script_name,
                    legacy = %literal,
                    canonical = %canonical,
                    "deprecated literal remapped to its canonical value"
                );
                canonical
            }
            None => literal,
        };

        if self.ctx.strict_options && !definition.allows(&literal) {
            let message = LocalizedMessage::new(MessageId::ValueNotAllowed)
                .arg(&literal)
                .arg(&definition.script_name);
            return Err(ParsingError::value(message.to_string(), other.span));
        }
        Ok(self.constant(literal, other.span))
    }

    fn logical(&self, op: OperatorId, operands: Vec<Spanned<Expr>>, span: Span) -> Result<Spanned<Expr>, ParsingError> {
        let Some(logical) = LogicalOp::from_operator(op) else {
            return Err(self.misrouted(op, span));
        };
        for operand in &operands {
            let found = operand.node.expr_type();
            if found != ExprType::Boolean {
                return Err(ParsingError::type_error(
                    format!("operands of '{}' must be boolean, found {found}", self.spelling(op)),
                    operand.span,
                ));
            }
        }

        let args = if operators::is_flattened(op) {
            flatten(operands, |node| {
                matches!(node, Expr::Logical { op: inner, .. } if *inner == logical)
            })
        } else {
            operands
        };
        Ok(Spanned::new(Expr::Logical { op: logical, args }, span))
    }

    fn math(&self, op: OperatorId, operands: Vec<Spanned<Expr>>, span: Span) -> Result<Spanned<Expr>, ParsingError> {
        let Some(math) = MathOp::from_operator(op) else {
            return Err(self.misrouted(op, span));
        };
        for operand in &operands {
            let found = operand.node.expr_type();
            if found != ExprType::Value(ValueType::Number) {
                return Err(ParsingError::type_error(
                    format!("operands of '{}' must be numbers, found {found}", self.spelling(op)),
                    operand.span,
                ));
            }
        }

        let args = if operators::is_flattened(op) {
            flatten(operands, |node| matches!(node, Expr::Math { op: inner, .. } if *inner == math))
        } else {
            operands
        };
        Ok(Spanned::new(Expr::Math { op: math, args }, span))
    }

    fn concat(&self, operands: Vec<Spanned<Expr>>, span: Span) -> Result<Spanned<Expr>, ParsingError> {
        for operand in &operands {
            self.value_operand(OperatorId::Concat, operand)?;
        }
        Ok(Spanned::new(Expr::Concat(operands), span))
    }

    fn property(&self, op: OperatorId, operands: Vec<Spanned<Expr>>, span: Span) -> Result<Spanned<Expr>, ParsingError> {
        let spelling = self.spelling(op);
        let mut operands = operands.into_iter();
        let (reference, reference_span) = match operands.next() {
            Some(Spanned {
                node: Expr::Constant(ScriptValue::String(reference)),
                span: reference_span,
            }) => (reference, reference_span),
            _ => {
                return Err(ParsingError::type_error(
                    format!("'{spelling}' expects a quoted 'Component.Property' reference as its first operand"),
                    span,
                ));
            }
        };
        let index = operands.next();

        let registry = &self.ctx.registry;
        let definition = registry
            .property_definition(&reference)
            .map_err(|err| ParsingError::bad_state(err, reference_span))?;
        let source = registry
            .property_source(&reference)
            .map_err(|err| ParsingError::bad_state(err, reference_span))?;

        let mode = match (op, index.is_some()) {
            (OperatorId::GetNum, false) => PropertyMode::Value(ValueType::Number),
            (OperatorId::GetNum, true) => PropertyMode::Element(ValueType::Number),
            (OperatorId::GetStr, false) => PropertyMode::Value(ValueType::String),
            (OperatorId::GetStr, true) => PropertyMode::Element(ValueType::String),
            (OperatorId::GetLen, _) => PropertyMode::Length,
            _ => return Err(self.misrouted(op, span)),
        };

        if mode != PropertyMode::Length && mode.result_type() != definition.value_type {
            return Err(ParsingError::type_error(
                format!(
                    "'{spelling}' cannot read {reference}: it holds {} values",
                    definition.value_type
                ),
                span,
            ));
        }
        let collection = definition.shape.is_collection();
        match mode {
            PropertyMode::Length if !collection => {
                return Err(ParsingError::type_error(
                    format!("'{spelling}' needs a collection, but {reference} is a single value"),
                    span,
                ));
            }
            PropertyMode::Element(_) if !collection => {
                return Err(ParsingError::type_error(
                    format!("{reference} is a single value and cannot be indexed"),
                    span,
                ));
            }
            PropertyMode::Value(_) if collection => {
                return Err(ParsingError::type_error(
                    format!("{reference} is a collection; pass an index to '{spelling}'"),
                    span,
                ));
            }
            _ => {}
        }
        if let Some(index) = &index {
            let found = index.node.expr_type();
            if found != ExprType::Value(ValueType::Number) {
                return Err(ParsingError::type_error(
                    format!("the index of '{spelling}' must be a number, found {found}"),
                    index.span,
                ));
            }
        }

        Ok(Spanned::new(
            Expr::Property(PropertyAccess {
                mode,
                definition,
                index: index.map(Box::new),
                source,
            }),
            span,
        ))
    }

    fn existence(&self, op: OperatorId, operands: Vec<Spanned<Expr>>, span: Span) -> Result<Spanned<Expr>, ParsingError> {
        let kind = match op {
            OperatorId::HasSignal => ExistenceKind::Signal,
            OperatorId::HasAction => ExistenceKind::Action,
            _ => return Err(self.misrouted(op, span)),
        };
        let names = operands
            .into_iter()
            .map(|operand| match operand.node {
                Expr::Symbol(name) => Ok(name),
                other => Err(ParsingError::type_error(
                    format!(
                        "'{}' expects bare names, found {}",
                        self.spelling(op),
                        other.expr_type()
                    ),
                    operand.span,
                )),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Spanned::new(
            Expr::Exists(ExistenceCheck {
                kind,
                names,
                registry: Rc::clone(&self.ctx.registry),
            }),
            span,
        ))
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// How `op` is written in the grammar being parsed.
    fn spelling(&self, op: OperatorId) -> &'static str {
        let info = operators::info_for(op);
        match self.grammar {
            GrammarId::Prefix => info.prefix,
            GrammarId::Infix => info.infix.spelling().unwrap_or(info.prefix),
        }
    }

    fn value_operand(&self, op: OperatorId, operand: &Spanned<Expr>) -> Result<ValueType, ParsingError> {
        match operand.node.expr_type() {
            ExprType::Value(ty) => Ok(ty),
            found => Err(ParsingError::type_error(
                format!("operands of '{}' must be values, found {found}", self.spelling(op)),
                operand.span,
            )),
        }
    }

    fn exactly<const N: usize>(
        &self,
        op: OperatorId,
        operands: Vec<Spanned<Expr>>,
        span: Span,
    ) -> Result<[Spanned<Expr>; N], ParsingError> {
        <[Spanned<Expr>; N]>::try_from(operands).map_err(|found| {
            ParsingError::arity(
                format!("'{}' expects {N} operands, found {}", self.spelling(op), found.len()),
                span,
            )
        })
    }

    fn misrouted(&self, op: OperatorId, span: Span) -> ParsingError {
        ParsingError::syntax(format!("'{}' cannot be used here", self.spelling(op)), span)
    }
}

/// Splice the operands of same-kind children into the parent.
fn flatten(operands: Vec<Spanned<Expr>>, same_kind: impl Fn(&Expr) -> bool) -> Vec<Spanned<Expr>> {
    let mut out = Vec::with_capacity(operands.len());
    for operand in operands {
        if same_kind(&operand.node) {
            match operand.node {
                Expr::Logical { args, .. } | Expr::Math { args, .. } => out.extend(args),
                node => out.push(Spanned::new(node, operand.span)),
            }
        } else {
            out.push(operand);
        }
    }
    out
}

/// `"1 operand"`, `"2 operands"`, `"at least 2 operands"`, `"1 to 2 operands"`.
fn count_phrase(arity: Arity, noun: &str) -> String {
    if arity == Arity::exact(1) {
        format!("1 {noun}")
    } else {
        format!("{arity} {noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::registry;

    fn num(n: i64) -> Spanned<Expr> {
        Spanned::new(Expr::Constant(ScriptValue::from_int(n)), Span::default())
    }

    fn text(s: &str) -> Spanned<Expr> {
        Spanned::new(Expr::Constant(ScriptValue::string(s)), Span::default())
    }

    fn ctx() -> ParseContext {
        ParseContext::new(registry())
    }

    #[test]
    fn test_add_flattens_nested_add() {
        let ctx = ctx();
        let b = NodeBuilder::new(&ctx, GrammarId::Infix);
        let inner = b.operator(OperatorId::Add, vec![num(3), num(4)], Span::default()).unwrap();
        let outer = b
            .operator(OperatorId::Add, vec![num(1), num(2), inner], Span::default())
            .unwrap();
        let Expr::Math { op: MathOp::Add, args } = &outer.node else {
            panic!("expected add, got {outer:?}");
        };
        assert_eq!(args.len(), 4);
    }

    #[test]
    fn test_sub_does_not_flatten() {
        let ctx = ctx();
        let b = NodeBuilder::new(&ctx, GrammarId::Infix);
        let inner = b.operator(OperatorId::Sub, vec![num(1), num(2)], Span::default()).unwrap();
        let outer = b.operator(OperatorId::Sub, vec![inner, num(3)], Span::default()).unwrap();
        assert!(matches!(&outer.node, Expr::Math { op: MathOp::Sub, args } if args.len() == 2));
    }

    #[test]
    fn test_arity_message_uses_grammar_spelling() {
        let ctx = ctx();
        let err = NodeBuilder::new(&ctx, GrammarId::Infix)
            .operator(OperatorId::Min, vec![num(1)], Span::new(0, 6))
            .unwrap_err();
        assert_eq!(err.message, "'min' expects at least 2 operands, found 1");
        let err = NodeBuilder::new(&ctx, GrammarId::Prefix)
            .operator(OperatorId::Round, vec![], Span::new(0, 7))
            .unwrap_err();
        assert_eq!(err.message, "'round' expects 1 operand, found 0");
    }

    #[test]
    fn test_relational_on_strings_rejected() {
        let ctx = ctx();
        let err = NodeBuilder::new(&ctx, GrammarId::Infix)
            .operator(OperatorId::Gt, vec![text("test"), text("test")], Span::default())
            .unwrap_err();
        assert_eq!(err.message, "'>' is not defined for strings");
    }

    #[test]
    fn test_mixed_comparison_rejected() {
        let ctx = ctx();
        let err = NodeBuilder::new(&ctx, GrammarId::Infix)
            .operator(OperatorId::Eq, vec![num(1), text("1")], Span::default())
            .unwrap_err();
        assert_eq!(err.message, "cannot compare number with string");
    }

    #[test]
    fn test_logical_requires_boolean() {
        let ctx = ctx();
        let err = NodeBuilder::new(&ctx, GrammarId::Prefix)
            .operator(OperatorId::And, vec![num(1), num(2)], Span::default())
            .unwrap_err();
        assert_eq!(err.message, "operands of 'and' must be boolean, found number");
    }

    #[test]
    fn test_legacy_literal_is_remapped() {
        let ctx = ctx();
        let b = NodeBuilder::new(&ctx, GrammarId::Infix);
        let signal = b.signal("Door.State", Span::default()).unwrap();
        let cmp = b
            .operator(OperatorId::Eq, vec![text("opened"), signal], Span::default())
            .unwrap();
        let Expr::Comparison { left, .. } = &cmp.node else {
            panic!("expected comparison");
        };
        assert!(matches!(&left.node, Expr::Constant(ScriptValue::String(s)) if s == "open"));
    }

    #[test]
    fn test_strict_options_reject_unknown_literal() {
        let ctx = ctx().with_strict_options(true);
        let b = NodeBuilder::new(&ctx, GrammarId::Infix);
        let signal = b.signal("Door.State", Span::default()).unwrap();
        let err = b
            .operator(OperatorId::Eq, vec![signal, text("ajar")], Span::default())
            .unwrap_err();
        assert_eq!(err.message, "'ajar' is not an allowed value for Door.State");

        let lenient = ParseContext::new(registry());
        let b = NodeBuilder::new(&lenient, GrammarId::Infix);
        let signal = b.signal("Door.State", Span::default()).unwrap();
        assert!(b.operator(OperatorId::Eq, vec![signal, text("ajar")], Span::default()).is_ok());
    }

    #[test]
    fn test_unknown_signal_is_bad_state() {
        let ctx = ctx();
        let err = NodeBuilder::new(&ctx, GrammarId::Prefix)
            .signal("Foo.Bar", Span::new(4, 17))
            .unwrap_err();
        assert_eq!(err.message, "unknown signal: Foo.Bar");
        assert!(err.bad_state_error().is_some());
    }

    #[test]
    fn test_action_once_suffix_and_argument_types() {
        let ctx = ctx();
        let b = NodeBuilder::new(&ctx, GrammarId::Infix);
        let call = b.action("Door.Move.once", vec![num(10)], Span::default()).unwrap();
        assert!(matches!(&call.node, Expr::Action(ActionCall { once: true, .. })));

        let err = b.action("Door.Move", vec![text("up")], Span::default()).unwrap_err();
        assert_eq!(err.message, "argument 1 of Door.Move ('position') must be a number, found string");

        let err = b.action("Door.Move", vec![], Span::default()).unwrap_err();
        assert_eq!(err.message, "Door.Move expects 1 argument, found 0");
    }

    #[test]
    fn test_property_shape_checks() {
        let ctx = ctx();
        let b = NodeBuilder::new(&ctx, GrammarId::Infix);
        assert!(b.operator(OperatorId::GetNum, vec![text("Foobar.numList"), num(1)], Span::default()).is_ok());
        assert!(b.operator(OperatorId::GetLen, vec![text("Foobar.numList")], Span::default()).is_ok());

        let err = b.operator(OperatorId::GetNum, vec![text("Foobar.numList")], Span::default()).unwrap_err();
        assert!(err.message.contains("is a collection"), "{}", err.message);

        let err = b
            .operator(OperatorId::GetStr, vec![text("Foobar.numList"), num(0)], Span::default())
            .unwrap_err();
        assert!(err.message.contains("holds number values"), "{}", err.message);

        let err = b.operator(OperatorId::GetNum, vec![text("Foobar.missing")], Span::default()).unwrap_err();
        assert_eq!(err.message, "unknown property: Foobar.missing");
    }
}
