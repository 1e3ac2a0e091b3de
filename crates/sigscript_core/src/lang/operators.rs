//! Operator vocabulary.
//!
//! Every operator node the expression tree can hold has one entry here: its prefix-grammar keyword, its
//! infix-grammar spelling and notation, its binding power, its family, and its operand arity. Both parsers, both
//! decompilers and the tokenizer configurations are derived from this table so the grammars cannot drift apart.
//!
//! ## Notes
//! - Lookup via [`from_prefix`] / [`binary_from_infix`] / [`unary_from_infix`] / [`call_from_infix`] is
//!   **case-sensitive**.
//! - Binding powers follow `or < and < not < equality < relational < additive < multiplicative < unary minus`;
//!   calls, names and literals sit above everything at [`ATOM_PRECEDENCE`].
//!
//! ## Examples
//! ```rust
//! use sigscript_core::lang::operators::{self, OperatorId};
//!
//! assert_eq!(operators::from_prefix("add"), Some(OperatorId::Add));
//! assert_eq!(operators::binary_from_infix("+"), Some(OperatorId::Add));
//! assert_eq!(operators::info_for(OperatorId::Mul).precedence, 6);
//! ```

use super::registry::{Arity, Example, SinceVersion, Stability};

/// Binding power of literals, names and calls in the infix grammar.
pub const ATOM_PRECEDENCE: u8 = 8;

/// Stable identifier for every operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorId {
    // Comparison
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,

    // Logical
    And,
    Or,
    Not,

    // Math
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Min,
    Max,
    Round,
    Neg,

    // Text
    Concat,

    // References
    Signal,
    Action,

    // Property access
    GetNum,
    GetStr,
    GetLen,

    // Existence checks
    HasSignal,
    HasAction,
}

/// Which node family an operator builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorFamily {
    Comparison,
    Logical,
    Math,
    Concat,
    Reference,
    Property,
    Existence,
}

/// How an operator is written in the infix grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfixForm {
    /// `left <op> right`
    Binary(&'static str),
    /// `<op> operand`
    Unary(&'static str),
    /// `name(args, ...)`
    Call(&'static str),
    /// Bare dotted name (signals) or `Name(args, ...)` (actions).
    Named,
}

impl InfixForm {
    /// The spelling, if the form has one.
    pub fn spelling(&self) -> Option<&'static str> {
        match self {
            InfixForm::Binary(s) | InfixForm::Unary(s) | InfixForm::Call(s) => Some(s),
            InfixForm::Named => None,
        }
    }
}

/// Metadata for an operator.
///
/// ## Notes
/// - `precedence` is the infix binding power; higher binds tighter.
/// - `arity` counts operands as they appear in the prefix grammar (for `act` that includes the action name).
#[derive(Debug, Clone, Copy)]
pub struct OperatorInfo {
    pub id: OperatorId,
    pub prefix: &'static str,
    pub infix: InfixForm,
    pub precedence: u8,
    pub family: OperatorFamily,
    pub arity: Arity,
    pub description: &'static str,
    pub since_version: Option<SinceVersion>,
    pub stability: Stability,
    pub examples: &'static [Example],
}

/// Registry of all operators.
pub const OPERATORS: &[OperatorInfo] = &[
    // Comparison
    op(
        OperatorId::Eq,
        "eq",
        InfixForm::Binary("=="),
        3,
        OperatorFamily::Comparison,
        Arity::exact(2),
        "Equal.",
    ),
    op(
        OperatorId::Ne,
        "ne",
        InfixForm::Binary("!="),
        3,
        OperatorFamily::Comparison,
        Arity::exact(2),
        "Not equal.",
    ),
    op(
        OperatorId::Gt,
        "gt",
        InfixForm::Binary(">"),
        4,
        OperatorFamily::Comparison,
        Arity::exact(2),
        "Greater than (numbers only).",
    ),
    op(
        OperatorId::Ge,
        "ge",
        InfixForm::Binary(">="),
        4,
        OperatorFamily::Comparison,
        Arity::exact(2),
        "Greater than or equal (numbers only).",
    ),
    op(
        OperatorId::Lt,
        "lt",
        InfixForm::Binary("<"),
        4,
        OperatorFamily::Comparison,
        Arity::exact(2),
        "Less than (numbers only).",
    ),
    op(
        OperatorId::Le,
        "le",
        InfixForm::Binary("<="),
        4,
        OperatorFamily::Comparison,
        Arity::exact(2),
        "Less than or equal (numbers only).",
    ),
    // Logical
    op(
        OperatorId::And,
        "and",
        InfixForm::Binary("and"),
        1,
        OperatorFamily::Logical,
        Arity::at_least(2),
        "True when every operand is true; stops at the first false one.",
    ),
    op(
        OperatorId::Or,
        "or",
        InfixForm::Binary("or"),
        0,
        OperatorFamily::Logical,
        Arity::at_least(2),
        "True when any operand is true; stops at the first true one.",
    ),
    op(
        OperatorId::Not,
        "not",
        InfixForm::Unary("not"),
        2,
        OperatorFamily::Logical,
        Arity::exact(1),
        "Logical negation.",
    ),
    // Math
    op(
        OperatorId::Add,
        "add",
        InfixForm::Binary("+"),
        5,
        OperatorFamily::Math,
        Arity::at_least(2),
        "Sum of all operands.",
    ),
    op(
        OperatorId::Sub,
        "sub",
        InfixForm::Binary("-"),
        5,
        OperatorFamily::Math,
        Arity::exact(2),
        "Difference.",
    ),
    op(
        OperatorId::Mul,
        "mul",
        InfixForm::Binary("*"),
        6,
        OperatorFamily::Math,
        Arity::exact(2),
        "Product.",
    ),
    op(
        OperatorId::Div,
        "div",
        InfixForm::Binary("/"),
        6,
        OperatorFamily::Math,
        Arity::exact(2),
        "Quotient, rounded toward zero at two decimals.",
    ),
    op(
        OperatorId::Mod,
        "mod",
        InfixForm::Binary("%"),
        6,
        OperatorFamily::Math,
        Arity::exact(2),
        "Remainder.",
    ),
    op(
        OperatorId::Min,
        "min",
        InfixForm::Call("min"),
        ATOM_PRECEDENCE,
        OperatorFamily::Math,
        Arity::at_least(2),
        "Smallest operand.",
    ),
    op(
        OperatorId::Max,
        "max",
        InfixForm::Call("max"),
        ATOM_PRECEDENCE,
        OperatorFamily::Math,
        Arity::at_least(2),
        "Largest operand.",
    ),
    op(
        OperatorId::Round,
        "round",
        InfixForm::Call("round"),
        ATOM_PRECEDENCE,
        OperatorFamily::Math,
        Arity::exact(1),
        "Round to the nearest whole unit.",
    ),
    op(
        OperatorId::Neg,
        "neg",
        InfixForm::Unary("-"),
        7,
        OperatorFamily::Math,
        Arity::exact(1),
        "Arithmetic negation.",
    ),
    // Text
    op(
        OperatorId::Concat,
        "concat",
        InfixForm::Call("concat"),
        ATOM_PRECEDENCE,
        OperatorFamily::Concat,
        Arity::at_least(2),
        "Concatenate the text of every operand.",
    ),
    // References
    op(
        OperatorId::Signal,
        "sig",
        InfixForm::Named,
        ATOM_PRECEDENCE,
        OperatorFamily::Reference,
        Arity::exact(1),
        "Read a host signal.",
    ),
    op(
        OperatorId::Action,
        "act",
        InfixForm::Named,
        ATOM_PRECEDENCE,
        OperatorFamily::Reference,
        Arity::at_least(1),
        "Invoke a host action.",
    ),
    // Property access
    op(
        OperatorId::GetNum,
        "getnum",
        InfixForm::Call("getnum"),
        ATOM_PRECEDENCE,
        OperatorFamily::Property,
        Arity::range(1, 2),
        "Read a numeric property, or one element of a numeric collection.",
    ),
    op(
        OperatorId::GetStr,
        "getstr",
        InfixForm::Call("getstr"),
        ATOM_PRECEDENCE,
        OperatorFamily::Property,
        Arity::range(1, 2),
        "Read a text property, or one element of a text collection.",
    ),
    op(
        OperatorId::GetLen,
        "getlen",
        InfixForm::Call("getlen"),
        ATOM_PRECEDENCE,
        OperatorFamily::Property,
        Arity::exact(1),
        "Number of elements in a collection property.",
    ),
    // Existence checks
    op(
        OperatorId::HasSignal,
        "?sig",
        InfixForm::Call("hassignal"),
        ATOM_PRECEDENCE,
        OperatorFamily::Existence,
        Arity::at_least(1),
        "True when every named signal resolves right now.",
    ),
    op(
        OperatorId::HasAction,
        "?act",
        InfixForm::Call("hasaction"),
        ATOM_PRECEDENCE,
        OperatorFamily::Existence,
        Arity::at_least(1),
        "True when every named action resolves right now.",
    ),
];

/// Return the full metadata entry for an operator.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (this indicates a programming error).
pub fn info_for(id: OperatorId) -> &'static OperatorInfo {
    OPERATORS.iter().find(|o| o.id == id).expect("operator info missing")
}

/// Prefix-grammar keyword for an operator.
pub fn prefix_spelling(id: OperatorId) -> &'static str {
    info_for(id).prefix
}

/// Resolve a prefix-grammar keyword.
pub fn from_prefix(keyword: &str) -> Option<OperatorId> {
    OPERATORS.iter().find(|o| o.prefix == keyword).map(|o| o.id)
}

/// Resolve an infix binary operator spelling (`+`, `==`, `and`, ...).
pub fn binary_from_infix(spelling: &str) -> Option<OperatorId> {
    OPERATORS
        .iter()
        .find(|o| matches!(o.infix, InfixForm::Binary(s) if s == spelling))
        .map(|o| o.id)
}

/// Resolve an infix unary operator spelling (`-`, `not`).
pub fn unary_from_infix(spelling: &str) -> Option<OperatorId> {
    OPERATORS
        .iter()
        .find(|o| matches!(o.infix, InfixForm::Unary(s) if s == spelling))
        .map(|o| o.id)
}

/// Resolve an infix builtin function name (`min`, `getnum`, `hassignal`, ...).
pub fn call_from_infix(name: &str) -> Option<OperatorId> {
    OPERATORS
        .iter()
        .find(|o| matches!(o.infix, InfixForm::Call(s) if s == name))
        .map(|o| o.id)
}

/// Return `true` for the associative n-ary operators the parsers flatten (`add`, `and`, `or`).
pub fn is_flattened(id: OperatorId) -> bool {
    matches!(id, OperatorId::Add | OperatorId::And | OperatorId::Or)
}

/// Minimum binding power of the operand of a unary infix operator.
///
/// `-` takes anything that binds at least as tightly as itself; `not` takes a whole comparison, so
/// `not a == b` negates the comparison while `not a and b` negates only `a`.
pub fn unary_operand_precedence(id: OperatorId) -> u8 {
    match id {
        OperatorId::Not => info_for(OperatorId::Eq).precedence,
        other => info_for(other).precedence,
    }
}

// --- helpers -----------------------------------------------------------------

const fn op(
    id: OperatorId,
    prefix: &'static str,
    infix: InfixForm,
    precedence: u8,
    family: OperatorFamily,
    arity: Arity,
    description: &'static str,
) -> OperatorInfo {
    OperatorInfo {
        id,
        prefix,
        infix,
        precedence,
        family,
        arity,
        description,
        since_version: None,
        stability: Stability::Stable,
        examples: &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_prefix_spellings_unique() {
        let mut seen = HashSet::new();
        for o in OPERATORS {
            assert!(seen.insert(o.prefix), "duplicate prefix keyword {:?}", o.prefix);
        }
    }

    #[test]
    fn test_minus_is_both_binary_and_unary() {
        assert_eq!(binary_from_infix("-"), Some(OperatorId::Sub));
        assert_eq!(unary_from_infix("-"), Some(OperatorId::Neg));
        assert_eq!(unary_from_infix("not"), Some(OperatorId::Not));
        assert_eq!(binary_from_infix("not"), None);
    }

    #[test]
    fn test_infix_lookups_respect_the_form() {
        assert_eq!(binary_from_infix("<="), Some(OperatorId::Le));
        assert_eq!(binary_from_infix("and"), Some(OperatorId::And));
        assert_eq!(call_from_infix("getnum"), Some(OperatorId::GetNum));
        assert_eq!(call_from_infix("+"), None);
        assert_eq!(unary_from_infix("*"), None);
        assert_eq!(binary_from_infix("nope"), None);
    }

    #[test]
    fn test_precedence_ladder() {
        let p = |id| info_for(id).precedence;
        assert!(p(OperatorId::Or) < p(OperatorId::And));
        assert!(p(OperatorId::And) < p(OperatorId::Not));
        assert!(p(OperatorId::Not) < p(OperatorId::Eq));
        assert!(p(OperatorId::Eq) < p(OperatorId::Lt));
        assert!(p(OperatorId::Lt) < p(OperatorId::Add));
        assert!(p(OperatorId::Add) < p(OperatorId::Mul));
        assert!(p(OperatorId::Mul) < p(OperatorId::Neg));
        assert!(p(OperatorId::Neg) < ATOM_PRECEDENCE);
    }

    #[test]
    fn test_unary_operand_precedence() {
        assert_eq!(unary_operand_precedence(OperatorId::Not), 3);
        assert_eq!(unary_operand_precedence(OperatorId::Neg), 7);
    }

    #[test]
    fn test_call_lookup() {
        assert_eq!(call_from_infix("getnum"), Some(OperatorId::GetNum));
        assert_eq!(call_from_infix("hassignal"), Some(OperatorId::HasSignal));
        assert_eq!(call_from_infix("nope"), None);
    }
}
