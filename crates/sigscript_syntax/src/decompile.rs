//! Canonical source text for expression trees.
//!
//! Walks the tree and emits text that re-parses into an equivalent tree in the chosen grammar. The output is
//! the persisted form of a rule, so it must be stable: one spelling per operator, single-quoted strings,
//! numbers with trailing zeros trimmed.
//!
//! ## Notes
//! - Infix output carries the minimum parentheses: a left operand is wrapped when it binds strictly looser than
//!   its parent, later operands when they bind looser or equally, except between same-kind members of a
//!   flattened `+` / `and` / `or` chain.
//! - `-` in front of a number literal would fold into a negative constant on re-parse, so a negated literal is
//!   written `-(2)`.
//! - Neither parser produces an `Unset` constant; one built by hand is written as the empty string `''`, the
//!   literal an unset value compares equal to as text.

use sigscript_core::lang::grammars::GrammarId;
use sigscript_core::lang::operators::{self, OperatorId};
use sigscript_core::value::{self, ScriptValue};

use crate::ast::{ExistenceKind, Expr, LogicalOp, MathOp, PropertyAccess, Spanned};
use crate::build::ONCE_SUFFIX;

/// Render `expr` as canonical source in `grammar`.
pub fn decompile(expr: &Expr, grammar: GrammarId) -> String {
    let mut decompiler = Decompiler::new(grammar);
    decompiler.format_expr(expr);
    decompiler.finish()
}

/// Tree walker that accumulates output text.
struct Decompiler {
    output: String,
    grammar: GrammarId,
}

impl Decompiler {
    fn new(grammar: GrammarId) -> Self {
        Self {
            output: String::new(),
            grammar,
        }
    }

    fn finish(self) -> String {
        self.output
    }

    fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn format_expr(&mut self, expr: &Expr) {
        match self.grammar {
            GrammarId::Prefix => self.prefix_expr(expr),
            GrammarId::Infix => self.infix_expr(expr),
        }
    }

    fn format_constant(&mut self, value: &ScriptValue) {
        match value {
            ScriptValue::Number(n) => self.write(&value::format_scaled(*n)),
            ScriptValue::String(s) => self.write(&quote(s)),
            ScriptValue::Unset => self.write("''"),
        }
    }

    fn action_name(call_name: &str, once: bool) -> String {
        if once {
            format!("{call_name}{ONCE_SUFFIX}")
        } else {
            call_name.to_string()
        }
    }

    // ========================================================================
    // Prefix
    // ========================================================================

    fn prefix_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Constant(value) => self.format_constant(value),
            Expr::Symbol(name) => self.write(name),
            Expr::Signal(signal) => {
                let name = signal.definition.script_name.clone();
                self.prefix_form(OperatorId::Signal, |d| d.write(&name));
            }
            Expr::Action(call) => {
                let name = Self::action_name(&call.definition.script_name, call.once);
                self.prefix_form(OperatorId::Action, |d| {
                    d.write(&name);
                    d.prefix_operands(&call.args);
                });
            }
            Expr::Comparison { op, left, right } => self.prefix_form(op.operator(), |d| {
                d.prefix_expr(&left.node);
                d.write(" ");
                d.prefix_expr(&right.node);
            }),
            Expr::Logical { op, args } => self.prefix_call(op.operator(), args),
            Expr::Math { op, args } => self.prefix_call(op.operator(), args),
            Expr::Concat(args) => self.prefix_call(OperatorId::Concat, args),
            Expr::Property(access) => {
                let reference = quote(&access.definition.reference);
                self.prefix_form(access.mode.operator(), |d| {
                    d.write(&reference);
                    if let Some(index) = &access.index {
                        d.write(" ");
                        d.prefix_expr(&index.node);
                    }
                });
            }
            Expr::Exists(check) => {
                let names = check.names.join(" ");
                self.prefix_form(check.kind.operator(), |d| d.write(&names));
            }
        }
    }

    fn prefix_form(&mut self, op: OperatorId, body: impl FnOnce(&mut Self)) {
        self.write("(");
        self.write(operators::prefix_spelling(op));
        self.write(" ");
        body(self);
        self.write(")");
    }

    fn prefix_call(&mut self, op: OperatorId, args: &[Spanned<Expr>]) {
        self.write("(");
        self.write(operators::prefix_spelling(op));
        self.prefix_operands(args);
        self.write(")");
    }

    fn prefix_operands(&mut self, args: &[Spanned<Expr>]) {
        for arg in args {
            self.write(" ");
            self.prefix_expr(&arg.node);
        }
    }

    // ========================================================================
    // Infix
    // ========================================================================

    fn infix_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Constant(value) => self.format_constant(value),
            Expr::Symbol(name) => self.write(name),
            Expr::Signal(signal) => self.write(&signal.definition.script_name),
            Expr::Action(call) => {
                let name = Self::action_name(&call.definition.script_name, call.once);
                self.write(&name);
                self.infix_arguments(&call.args);
            }
            Expr::Comparison { op, left, right } => {
                self.infix_chain(op.operator(), [left.as_ref(), right.as_ref()]);
            }
            Expr::Logical { op: LogicalOp::Not, args } => self.infix_unary(OperatorId::Not, args),
            Expr::Logical { op, args } => self.infix_chain(op.operator(), args),
            Expr::Math { op: MathOp::Neg, args } => self.infix_unary(OperatorId::Neg, args),
            Expr::Math {
                op: op @ (MathOp::Min | MathOp::Max | MathOp::Round),
                args,
            } => self.infix_call(op.operator(), args),
            Expr::Math { op, args } => self.infix_chain(op.operator(), args),
            Expr::Concat(args) => self.infix_call(OperatorId::Concat, args),
            Expr::Property(access) => self.infix_property(access),
            Expr::Exists(check) => {
                let name = match check.kind {
                    ExistenceKind::Signal => infix_spelling(OperatorId::HasSignal),
                    ExistenceKind::Action => infix_spelling(OperatorId::HasAction),
                };
                self.write(name);
                self.write("(");
                self.write(&check.names.join(", "));
                self.write(")");
            }
        }
    }

    fn infix_chain<'e>(&mut self, op: OperatorId, args: impl IntoIterator<Item = &'e Spanned<Expr>>) {
        let precedence = operators::info_for(op).precedence;
        let spelling = infix_spelling(op);
        for (i, arg) in args.into_iter().enumerate() {
            let child = arg.node.precedence();
            let parens = if i == 0 {
                child < precedence
            } else {
                let same_chain = operators::is_flattened(op) && arg.node.operator() == Some(op);
                child < precedence || (child == precedence && !same_chain)
            };
            if i > 0 {
                self.write(" ");
                self.write(spelling);
                self.write(" ");
            }
            self.infix_operand(&arg.node, parens);
        }
    }

    fn infix_unary(&mut self, op: OperatorId, args: &[Spanned<Expr>]) {
        let spelling = infix_spelling(op);
        self.write(spelling);
        if spelling.chars().all(char::is_alphabetic) {
            self.write(" ");
        }
        for arg in args {
            let literal = matches!(arg.node, Expr::Constant(ScriptValue::Number(_)));
            let nested = arg.node.operator() == Some(op);
            let parens = (arg.node.precedence() < operators::unary_operand_precedence(op) && !nested) || literal;
            self.infix_operand(&arg.node, parens);
        }
    }

    fn infix_operand(&mut self, expr: &Expr, parens: bool) {
        if parens {
            self.write("(");
            self.infix_expr(expr);
            self.write(")");
        } else {
            self.infix_expr(expr);
        }
    }

    fn infix_call(&mut self, op: OperatorId, args: &[Spanned<Expr>]) {
        self.write(infix_spelling(op));
        self.infix_arguments(args);
    }

    fn infix_arguments(&mut self, args: &[Spanned<Expr>]) {
        self.write("(");
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.infix_expr(&arg.node);
        }
        self.write(")");
    }

    fn infix_property(&mut self, access: &PropertyAccess) {
        self.write(infix_spelling(access.mode.operator()));
        self.write("(");
        self.write(&quote(&access.definition.reference));
        if let Some(index) = &access.index {
            self.write(", ");
            self.infix_expr(&index.node);
        }
        self.write(")");
    }
}

fn infix_spelling(op: OperatorId) -> &'static str {
    let info = operators::info_for(op);
    info.infix.spelling().unwrap_or(info.prefix)
}

/// Single-quote `s`, escaping backslashes and single quotes.
///
/// A `%` right after `{` is escaped too, so the literal never reads as a macro opener.
pub fn quote(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 2);
    result.push('\'');
    let mut previous = None;
    for c in s.chars() {
        if matches!(c, '\\' | '\'') || (c == '%' && previous == Some('{')) {
            result.push('\\');
        }
        result.push(c);
        previous = Some(c);
    }
    result.push('\'');
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::test_support::ctx;

    fn infix(source: &str) -> String {
        let expr = parse(source, GrammarId::Infix, &ctx()).unwrap();
        decompile(&expr.node, GrammarId::Infix)
    }

    fn prefix_to_infix(source: &str) -> String {
        let expr = parse(source, GrammarId::Prefix, &ctx()).unwrap();
        decompile(&expr.node, GrammarId::Infix)
    }

    fn infix_to_prefix(source: &str) -> String {
        let expr = parse(source, GrammarId::Infix, &ctx()).unwrap();
        decompile(&expr.node, GrammarId::Prefix)
    }

    #[test]
    fn test_subtraction_grouping() {
        insta::assert_snapshot!(infix("(1 - 2) - 3"), @"1 - 2 - 3");
        insta::assert_snapshot!(infix("1 - (2 - 3)"), @"1 - (2 - 3)");
        insta::assert_snapshot!(infix("1 - 2 - 3 == -4"), @"1 - 2 - 3 == -4");
    }

    #[test]
    fn test_flattened_chains() {
        insta::assert_snapshot!(infix("1 + 2 + (3 + 4)"), @"1 + 2 + 3 + 4");
        insta::assert_snapshot!(infix("1 + (2 - 3)"), @"1 + (2 - 3)");
        insta::assert_snapshot!(
            infix("(Door.Position > 1 and Room.Temp > 2) and (Door.State == 'open' or Room.Name == 'Lab')"),
            @"Door.Position > 1 and Room.Temp > 2 and (Door.State == 'open' or Room.Name == 'Lab')"
        );
    }

    #[test]
    fn test_precedence_parentheses() {
        insta::assert_snapshot!(infix("(1 + 2) * 3"), @"(1 + 2) * 3");
        insta::assert_snapshot!(infix("1 + 2 * 3"), @"1 + 2 * 3");
        insta::assert_snapshot!(infix("6 / (2 * 3)"), @"6 / (2 * 3)");
        insta::assert_snapshot!(infix("-(1 + 2) * -Door.Position"), @"-(1 + 2) * -Door.Position");
    }

    #[test]
    fn test_unary_operands() {
        insta::assert_snapshot!(infix("not (Door.Position > 1 or Room.Temp > 2)"), @"not (Door.Position > 1 or Room.Temp > 2)");
        insta::assert_snapshot!(infix("not Door.Position == 1"), @"not Door.Position == 1");
        insta::assert_snapshot!(infix("not (not Door.Position == 1)"), @"not not Door.Position == 1");
        insta::assert_snapshot!(infix("not not Door.Position > 1 and Room.Temp > 2"), @"not not Door.Position > 1 and Room.Temp > 2");
        insta::assert_snapshot!(prefix_to_infix("(neg 2)"), @"-(2)");
        insta::assert_snapshot!(prefix_to_infix("(neg -2)"), @"-(-2)");
    }

    #[test]
    fn test_calls_and_references() {
        insta::assert_snapshot!(
            infix("min(1, max(2, 3), round(Room.Temp))"),
            @"min(1, max(2, 3), round(Room.Temp))"
        );
        insta::assert_snapshot!(infix("Door.Move.once(getnum('Foobar.numList', 1) * 10)"), @"Door.Move.once(getnum('Foobar.numList', 1) * 10)");
        insta::assert_snapshot!(infix("hassignal(Door.State,Room.Name)"), @"hassignal(Door.State, Room.Name)");
        insta::assert_snapshot!(infix(r"concat('it\'s ', 1.50)"), @r"concat('it\'s ', 1.5)");
    }

    #[test]
    fn test_prefix_output() {
        insta::assert_snapshot!(
            infix_to_prefix("1 - 2 - 3 == -4"),
            @"(eq (sub (sub 1 2) 3) -4)"
        );
        insta::assert_snapshot!(
            infix_to_prefix("Door.Move(getlen('Foobar.names')) "),
            @"(act Door.Move (getlen 'Foobar.names'))"
        );
        insta::assert_snapshot!(
            infix_to_prefix("hasaction(Door.Move, Alarm.Ring) and Door.State != 'closed'"),
            @"(and (?act Door.Move Alarm.Ring) (ne (sig Door.State) 'closed'))"
        );
    }

    #[test]
    fn test_macro_opener_in_text_is_escaped() {
        insta::assert_snapshot!(quote("{% 7 %}"), @r"'{\% 7 %}'");
        insta::assert_snapshot!(quote("50% {x} {"), @"'50% {x} {'");
        insta::assert_snapshot!(infix(r"Room.Name == '{\% 1 > 2 %}'"), @r"Room.Name == '{\% 1 > 2 %}'");
    }

    #[test]
    fn test_unset_constant_is_written_as_empty_text() {
        let expr = Expr::Constant(ScriptValue::Unset);
        assert_eq!(decompile(&expr, GrammarId::Infix), "''");
        assert_eq!(decompile(&expr, GrammarId::Prefix), "''");
    }

    #[test]
    fn test_legacy_literal_is_written_canonically() {
        insta::assert_snapshot!(infix("Door.State == 'opened'"), @"Door.State == 'open'");
    }
}
