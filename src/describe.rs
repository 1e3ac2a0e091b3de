//! Human-facing descriptions of expressions.
//!
//! Unlike the decompiler, the describer is free-form and never re-parsed. It:
//! - folds constant sub-trees (`10 * 2` is shown as `20`);
//! - shows display names instead of script names, and fills action format templates;
//! - turns evaluation failures into localized text instead of returning them.
//!
//! Phrases come from a [`MessageCatalog`], so a host can translate them by key.

use sigscript_core::capabilities::ActionDefinition;
use sigscript_core::errors::RuntimeError;
use sigscript_core::lang::messages::{self, MessageCatalog, MessageId};
use sigscript_core::lang::operators::{self, OperatorId};
use sigscript_core::value::{self, ScriptValue};
use sigscript_syntax::ast::{
    ActionCall, ComparisonOp, ExistenceKind, Expr, ExprType, LogicalOp, MathOp, PropertyMode, Spanned,
};

/// Describe `expr` with phrases from `catalog`.
pub fn describe(expr: &Expr, catalog: &dyn MessageCatalog) -> String {
    Describer { catalog }.describe(expr)
}

struct Describer<'c> {
    catalog: &'c dyn MessageCatalog,
}

impl Describer<'_> {
    fn describe(&self, expr: &Expr) -> String {
        if let Some(folded) = self.fold(expr) {
            return folded;
        }
        match expr {
            Expr::Constant(value) => self.value(value),
            Expr::Symbol(name) => name.clone(),
            Expr::Signal(signal) => signal.definition.display_name.clone(),
            Expr::Action(call) => self.action(call),
            Expr::Comparison { op, left, right } => {
                let id = match op {
                    ComparisonOp::Eq => MessageId::DescribeEq,
                    ComparisonOp::Ne => MessageId::DescribeNe,
                    ComparisonOp::Gt => MessageId::DescribeGt,
                    ComparisonOp::Ge => MessageId::DescribeGe,
                    ComparisonOp::Lt => MessageId::DescribeLt,
                    ComparisonOp::Le => MessageId::DescribeLe,
                };
                self.phrase(id, [self.describe(&left.node), self.describe(&right.node)])
            }
            Expr::Logical { op: LogicalOp::Not, args } => self.phrase(MessageId::DescribeNot, [self.list(args, ", ")]),
            Expr::Logical { op, args } => {
                let id = if *op == LogicalOp::And {
                    MessageId::DescribeAnd
                } else {
                    MessageId::DescribeOr
                };
                self.chain(id, *op, args)
            }
            Expr::Math { op, args } => self.math(*op, args),
            Expr::Concat(args) => self.list(args, " + "),
            Expr::Property(access) => {
                let name = access.definition.display_name.clone();
                match (&access.mode, &access.index) {
                    (PropertyMode::Length, _) => self.phrase(MessageId::DescribeLength, [name]),
                    (PropertyMode::Element(_), Some(index)) => {
                        self.phrase(MessageId::DescribeElement, [name, self.describe(&index.node)])
                    }
                    _ => name,
                }
            }
            Expr::Exists(check) => {
                let id = match check.kind {
                    ExistenceKind::Signal => MessageId::DescribeHasSignal,
                    ExistenceKind::Action => MessageId::DescribeHasAction,
                };
                self.phrase(id, [check.names.join(", ")])
            }
        }
    }

    /// Evaluate a constant value sub-tree eagerly.
    fn fold(&self, expr: &Expr) -> Option<String> {
        if matches!(expr, Expr::Constant(_)) || !expr.is_constant() {
            return None;
        }
        match expr.expr_type() {
            ExprType::Value(_) => Some(match expr.value() {
                Ok(value) => self.value(&value),
                Err(err) => self.failure(&err),
            }),
            _ => None,
        }
    }

    fn math(&self, op: MathOp, args: &[Spanned<Expr>]) -> String {
        match op {
            MathOp::Min => self.phrase(MessageId::DescribeMin, [self.list(args, ", ")]),
            MathOp::Max => self.phrase(MessageId::DescribeMax, [self.list(args, ", ")]),
            MathOp::Round => self.phrase(MessageId::DescribeRound, [self.list(args, ", ")]),
            MathOp::Neg => {
                let minimum = operators::unary_operand_precedence(OperatorId::Neg);
                let operands = args.iter().map(|arg| {
                    let nested = arg.node.operator() == Some(OperatorId::Neg);
                    self.grouped(&arg.node, arg.node.precedence() < minimum && !nested)
                });
                format!("-{}", operands.collect::<Vec<_>>().join(", "))
            }
            _ => {
                let parent = op.operator();
                let info = operators::info_for(parent);
                let symbol = info.infix.spelling().unwrap_or(info.prefix);
                args.iter()
                    .enumerate()
                    .map(|(i, arg)| {
                        let child = arg.node.precedence();
                        let same_chain = operators::is_flattened(parent) && arg.node.operator() == Some(parent);
                        let looser = child < info.precedence || (i > 0 && child == info.precedence && !same_chain);
                        self.grouped(&arg.node, looser)
                    })
                    .collect::<Vec<_>>()
                    .join(&format!(" {symbol} "))
            }
        }
    }

    /// Describe an operand, parenthesised when `looser` unless it folds to a constant.
    ///
    /// Later operands are grouped the way the decompiler groups them, so `10 - (a - 1)` keeps its parentheses.
    fn grouped(&self, arg: &Expr, looser: bool) -> String {
        let text = self.describe(arg);
        if looser && self.fold(arg).is_none() {
            format!("({text})")
        } else {
            text
        }
    }

    fn chain(&self, id: MessageId, op: LogicalOp, args: &[Spanned<Expr>]) -> String {
        let mut parts = args.iter().map(|arg| {
            let text = self.describe(&arg.node);
            match &arg.node {
                Expr::Logical { op: inner, .. } if *inner != op && *inner != LogicalOp::Not => format!("({text})"),
                _ => text,
            }
        });
        let first = parts.next().unwrap_or_default();
        parts.fold(first, |acc, next| self.phrase(id, [acc, next]))
    }

    fn action(&self, call: &ActionCall) -> String {
        let args: Vec<String> = call.args.iter().map(|arg| self.describe(&arg.node)).collect();
        let text = action_text(&call.definition, &args);
        if call.once {
            self.phrase(MessageId::DescribeActionOnce, [text])
        } else {
            text
        }
    }

    fn list(&self, args: &[Spanned<Expr>], separator: &str) -> String {
        args.iter()
            .map(|arg| self.describe(&arg.node))
            .collect::<Vec<_>>()
            .join(separator)
    }

    fn value(&self, value: &ScriptValue) -> String {
        match value {
            ScriptValue::Unset => self.catalog.render(MessageId::DescribeUnset, &[]),
            ScriptValue::String(s) => format!("\"{s}\""),
            ScriptValue::Number(n) => value::format_scaled(*n),
        }
    }

    fn failure(&self, err: &RuntimeError) -> String {
        tracing::debug!(error = %err, "evaluation failed while describing");
        self.phrase(MessageId::DescribeFailure, [err.message().render(self.catalog)])
    }

    fn phrase<const N: usize>(&self, id: MessageId, args: [String; N]) -> String {
        self.catalog.render(id, &args)
    }
}

fn action_text(definition: &ActionDefinition, args: &[String]) -> String {
    match &definition.format {
        Some(template) => messages::substitute(template, args),
        None if args.is_empty() => definition.display_name.clone(),
        None => format!("{}({})", definition.display_name, args.join(", ")),
    }
}
