//! Expression tree definitions for SigScript.
//!
//! Both front-end grammars build this one tree. The node set is closed: the evaluator, decompiler and describer
//! match on [`Expr`] exhaustively.
//!
//! ## Notes
//! - Nodes own their operands; nothing is shared between trees except `Rc` handles to host definitions and
//!   accessors.
//! - Nodes are immutable once built. Construction goes through [`crate::build::NodeBuilder`], which validates
//!   arity and operand types.

use std::fmt;
use std::rc::Rc;

use sigscript_core::capabilities::{
    ActionDefinition, ActionExecutor, PropertyDefinition, PropertySource, SharedRegistry, SignalDefinition,
    SignalSource,
};
use sigscript_core::lang::operators::{self, ATOM_PRECEDENCE, OperatorId};
use sigscript_core::value::{ScriptValue, ValueType};

/// Source location span (byte offsets)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Move the span right by `delta` bytes (used when the parsed text was a slice of a larger source).
    pub fn shift(self, delta: usize) -> Span {
        Span {
            start: self.start + delta,
            end: self.end + delta,
        }
    }
}

/// A node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// Static type of an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExprType {
    Value(ValueType),
    Boolean,
    Action,
    /// A bare name; only meaningful as an operand of `sig`, `act`, `?sig`, `?act`.
    Symbol,
}

impl fmt::Display for ExprType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprType::Value(ty) => write!(f, "{ty}"),
            ExprType::Boolean => write!(f, "boolean"),
            ExprType::Action => write!(f, "action"),
            ExprType::Symbol => write!(f, "name"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl ComparisonOp {
    pub fn from_operator(id: OperatorId) -> Option<Self> {
        Some(match id {
            OperatorId::Eq => ComparisonOp::Eq,
            OperatorId::Ne => ComparisonOp::Ne,
            OperatorId::Gt => ComparisonOp::Gt,
            OperatorId::Ge => ComparisonOp::Ge,
            OperatorId::Lt => ComparisonOp::Lt,
            OperatorId::Le => ComparisonOp::Le,
            _ => return None,
        })
    }

    pub fn operator(self) -> OperatorId {
        match self {
            ComparisonOp::Eq => OperatorId::Eq,
            ComparisonOp::Ne => OperatorId::Ne,
            ComparisonOp::Gt => OperatorId::Gt,
            ComparisonOp::Ge => OperatorId::Ge,
            ComparisonOp::Lt => OperatorId::Lt,
            ComparisonOp::Le => OperatorId::Le,
        }
    }

    /// Ordering comparisons; only defined for numbers.
    pub fn is_relational(self) -> bool {
        !matches!(self, ComparisonOp::Eq | ComparisonOp::Ne)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
    Not,
}

impl LogicalOp {
    pub fn from_operator(id: OperatorId) -> Option<Self> {
        Some(match id {
            OperatorId::And => LogicalOp::And,
            OperatorId::Or => LogicalOp::Or,
            OperatorId::Not => LogicalOp::Not,
            _ => return None,
        })
    }

    pub fn operator(self) -> OperatorId {
        match self {
            LogicalOp::And => OperatorId::And,
            LogicalOp::Or => OperatorId::Or,
            LogicalOp::Not => OperatorId::Not,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MathOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Min,
    Max,
    Round,
    Neg,
}

impl MathOp {
    pub fn from_operator(id: OperatorId) -> Option<Self> {
        Some(match id {
            OperatorId::Add => MathOp::Add,
            OperatorId::Sub => MathOp::Sub,
            OperatorId::Mul => MathOp::Mul,
            OperatorId::Div => MathOp::Div,
            OperatorId::Mod => MathOp::Mod,
            OperatorId::Min => MathOp::Min,
            OperatorId::Max => MathOp::Max,
            OperatorId::Round => MathOp::Round,
            OperatorId::Neg => MathOp::Neg,
            _ => return None,
        })
    }

    pub fn operator(self) -> OperatorId {
        match self {
            MathOp::Add => OperatorId::Add,
            MathOp::Sub => OperatorId::Sub,
            MathOp::Mul => OperatorId::Mul,
            MathOp::Div => OperatorId::Div,
            MathOp::Mod => OperatorId::Mod,
            MathOp::Min => OperatorId::Min,
            MathOp::Max => OperatorId::Max,
            MathOp::Round => OperatorId::Round,
            MathOp::Neg => OperatorId::Neg,
        }
    }
}

/// A resolved signal read.
#[derive(Clone)]
pub struct SignalRef {
    pub definition: Rc<SignalDefinition>,
    pub source: SignalSource,
}

/// A resolved action invocation.
#[derive(Clone)]
pub struct ActionCall {
    pub definition: Rc<ActionDefinition>,
    pub args: Vec<Spanned<Expr>>,
    /// Written with the `.once` suffix: the owning rule deactivates after a successful run.
    pub once: bool,
    pub executor: ActionExecutor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyMode {
    /// `getnum(ref)` / `getstr(ref)`
    Value(ValueType),
    /// `getnum(ref, index)` / `getstr(ref, index)`
    Element(ValueType),
    /// `getlen(ref)`
    Length,
}

impl PropertyMode {
    pub fn operator(self) -> OperatorId {
        match self {
            PropertyMode::Value(ValueType::Number) | PropertyMode::Element(ValueType::Number) => OperatorId::GetNum,
            PropertyMode::Value(ValueType::String) | PropertyMode::Element(ValueType::String) => OperatorId::GetStr,
            PropertyMode::Length => OperatorId::GetLen,
        }
    }

    pub fn result_type(self) -> ValueType {
        match self {
            PropertyMode::Value(ty) | PropertyMode::Element(ty) => ty,
            PropertyMode::Length => ValueType::Number,
        }
    }
}

/// A resolved `Component.Property` read.
#[derive(Clone)]
pub struct PropertyAccess {
    pub mode: PropertyMode,
    pub definition: Rc<PropertyDefinition>,
    pub index: Option<Box<Spanned<Expr>>>,
    pub source: PropertySource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExistenceKind {
    Signal,
    Action,
}

impl ExistenceKind {
    pub fn operator(self) -> OperatorId {
        match self {
            ExistenceKind::Signal => OperatorId::HasSignal,
            ExistenceKind::Action => OperatorId::HasAction,
        }
    }
}

/// `?sig` / `?act` over a list of names; resolved on every evaluation.
#[derive(Clone)]
pub struct ExistenceCheck {
    pub kind: ExistenceKind,
    pub names: Vec<String>,
    pub registry: SharedRegistry,
}

/// Expression node.
#[derive(Debug, Clone)]
pub enum Expr {
    Constant(ScriptValue),
    Symbol(String),
    Signal(SignalRef),
    Action(ActionCall),
    Comparison {
        op: ComparisonOp,
        left: Box<Spanned<Expr>>,
        right: Box<Spanned<Expr>>,
    },
    Logical {
        op: LogicalOp,
        args: Vec<Spanned<Expr>>,
    },
    Math {
        op: MathOp,
        args: Vec<Spanned<Expr>>,
    },
    Concat(Vec<Spanned<Expr>>),
    Property(PropertyAccess),
    Exists(ExistenceCheck),
}

impl Expr {
    pub fn expr_type(&self) -> ExprType {
        match self {
            Expr::Constant(value) => ExprType::Value(value.value_type().unwrap_or(ValueType::String)),
            Expr::Symbol(_) => ExprType::Symbol,
            Expr::Signal(signal) => ExprType::Value(signal.definition.result_type),
            Expr::Action(_) => ExprType::Action,
            Expr::Comparison { .. } | Expr::Logical { .. } | Expr::Exists(_) => ExprType::Boolean,
            Expr::Math { .. } => ExprType::Value(ValueType::Number),
            Expr::Concat(_) => ExprType::Value(ValueType::String),
            Expr::Property(access) => ExprType::Value(access.mode.result_type()),
        }
    }

    /// The registry operator this node was built from. Constants and bare names have none.
    pub fn operator(&self) -> Option<OperatorId> {
        match self {
            Expr::Constant(_) | Expr::Symbol(_) => None,
            Expr::Signal(_) => Some(OperatorId::Signal),
            Expr::Action(_) => Some(OperatorId::Action),
            Expr::Comparison { op, .. } => Some(op.operator()),
            Expr::Logical { op, .. } => Some(op.operator()),
            Expr::Math { op, .. } => Some(op.operator()),
            Expr::Concat(_) => Some(OperatorId::Concat),
            Expr::Property(access) => Some(access.mode.operator()),
            Expr::Exists(check) => Some(check.kind.operator()),
        }
    }

    /// Infix binding power of the node as a whole.
    pub fn precedence(&self) -> u8 {
        self.operator()
            .map(|id| operators::info_for(id).precedence)
            .unwrap_or(ATOM_PRECEDENCE)
    }

    /// Direct operand nodes, in source order.
    pub fn children(&self) -> Vec<&Spanned<Expr>> {
        match self {
            Expr::Constant(_) | Expr::Symbol(_) | Expr::Signal(_) | Expr::Exists(_) => Vec::new(),
            Expr::Action(call) => call.args.iter().collect(),
            Expr::Comparison { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Expr::Logical { args, .. } | Expr::Math { args, .. } | Expr::Concat(args) => args.iter().collect(),
            Expr::Property(access) => access.index.iter().map(|i| i.as_ref()).collect(),
        }
    }

    /// Whether the tree reads live host state (a signal or a property) anywhere.
    pub fn reads_host_state(&self) -> bool {
        matches!(self, Expr::Signal(_) | Expr::Property(_))
            || self.children().iter().any(|child| child.node.reads_host_state())
    }

    /// Whether the tree contains no host reads, actions or existence checks, so it can be evaluated eagerly.
    pub fn is_constant(&self) -> bool {
        match self {
            Expr::Constant(_) => true,
            Expr::Symbol(_) | Expr::Signal(_) | Expr::Action(_) | Expr::Property(_) | Expr::Exists(_) => false,
            _ => self.children().iter().all(|child| child.node.is_constant()),
        }
    }
}

// --- Debug for nodes holding host closures -----------------------------------

impl fmt::Debug for SignalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SignalRef").field(&self.definition.script_name).finish()
    }
}

impl fmt::Debug for ActionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionCall")
            .field("name", &self.definition.script_name)
            .field("args", &self.args)
            .field("once", &self.once)
            .finish()
    }
}

impl fmt::Debug for PropertyAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyAccess")
            .field("mode", &self.mode)
            .field("reference", &self.definition.reference)
            .field("index", &self.index)
            .finish()
    }
}

impl fmt::Debug for ExistenceCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExistenceCheck")
            .field("kind", &self.kind)
            .field("names", &self.names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constant(n: i64) -> Spanned<Expr> {
        Spanned::new(Expr::Constant(ScriptValue::from_int(n)), Span::default())
    }

    #[test]
    fn test_span_merge_and_shift() {
        let merged = Span::new(4, 6).merge(Span::new(1, 3));
        assert_eq!(merged, Span::new(1, 6));
        assert_eq!(merged.shift(10), Span::new(11, 16));
    }

    #[test]
    fn test_math_node_metadata() {
        let expr = Expr::Math {
            op: MathOp::Mul,
            args: vec![constant(2), constant(3)],
        };
        assert_eq!(expr.expr_type(), ExprType::Value(ValueType::Number));
        assert_eq!(expr.operator(), Some(OperatorId::Mul));
        assert_eq!(expr.precedence(), 6);
        assert_eq!(expr.children().len(), 2);
        assert!(expr.is_constant());
        assert!(!expr.reads_host_state());
    }

    #[test]
    fn test_constant_precedence_is_atom() {
        assert_eq!(constant(1).node.precedence(), ATOM_PRECEDENCE);
        assert_eq!(ExprType::Boolean.to_string(), "boolean");
    }
}
