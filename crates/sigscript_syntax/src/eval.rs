//! Lazy evaluation of expression trees.
//!
//! Nothing is computed at parse time: every call to [`Expr::value`], [`Expr::test`] or [`Expr::execute`] walks
//! the tree again and reads live host state through the accessors the nodes captured. No result is cached, so
//! consecutive calls may observe different host state.
//!
//! ## Notes
//! - Numbers stay in the scaled representation for `+ - * /`, `min`, `max`, `round` and negation.
//! - `%` converts to floating point and back.
//! - `Unset` only equals `Unset`; ordering comparisons against `Unset` fail with `BadValue`.

use sigscript_core::capabilities::PropertyValue;
use sigscript_core::errors::{LocalizedMessage, RuntimeError};
use sigscript_core::lang::messages::MessageId;
use sigscript_core::value::{self, SCALE, ScriptValue, ValueType};

use crate::ast::{
    ActionCall, ComparisonOp, ExistenceKind, Expr, LogicalOp, MathOp, PropertyAccess, PropertyMode, SignalRef, Spanned,
};

/// What running an action asks of the rule that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionOutcome {
    /// The action was written with `.once`: deactivate the rule after this run.
    pub deactivate: bool,
}

impl Expr {
    /// Evaluate a value-typed expression.
    ///
    /// ## Errors
    /// - Any [`RuntimeError`] raised by host accessors, validators or arithmetic.
    /// - `BadValue` if the expression is not value-typed.
    pub fn value(&self) -> Result<ScriptValue, RuntimeError> {
        match self {
            Expr::Constant(value) => Ok(value.clone()),
            Expr::Signal(signal) => read_signal(signal),
            Expr::Math { op, args } => eval_math(*op, args),
            Expr::Concat(args) => args
                .iter()
                .map(|arg| arg.node.value().map(|v| v.as_string()))
                .collect::<Result<String, _>>()
                .map(ScriptValue::String),
            Expr::Property(access) => read_property(access),
            Expr::Symbol(_) | Expr::Action(_) | Expr::Comparison { .. } | Expr::Logical { .. } | Expr::Exists(_) => {
                Err(not_a("value"))
            }
        }
    }

    /// Evaluate a boolean expression. `and` / `or` stop at the first deciding operand.
    pub fn test(&self) -> Result<bool, RuntimeError> {
        match self {
            Expr::Comparison { op, left, right } => compare(*op, &left.node.value()?, &right.node.value()?),
            Expr::Logical { op: LogicalOp::And, args } => {
                for arg in args {
                    if !arg.node.test()? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Expr::Logical { op: LogicalOp::Or, args } => {
                for arg in args {
                    if arg.node.test()? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Expr::Logical { op: LogicalOp::Not, args } => match args.as_slice() {
                [operand] => Ok(!operand.node.test()?),
                _ => Err(not_a("boolean")),
            },
            Expr::Exists(check) => Ok(check.names.iter().all(|name| match check.kind {
                ExistenceKind::Signal => check.registry.has_signal(name),
                ExistenceKind::Action => check.registry.has_action(name),
            })),
            Expr::Constant(_)
            | Expr::Symbol(_)
            | Expr::Signal(_)
            | Expr::Action(_)
            | Expr::Math { .. }
            | Expr::Concat(_)
            | Expr::Property(_) => Err(not_a("boolean")),
        }
    }

    /// Run an action expression: evaluate its arguments, validate them, and invoke the host executor.
    pub fn execute(&self) -> Result<ActionOutcome, RuntimeError> {
        match self {
            Expr::Action(call) => run_action(call),
            _ => Err(not_a("action")),
        }
    }

    /// A zero-argument closure producing this expression's value on every call.
    pub fn into_value_fn(self) -> impl Fn() -> Result<ScriptValue, RuntimeError> {
        move || self.value()
    }

    /// A zero-argument closure testing this expression on every call.
    pub fn into_predicate(self) -> impl Fn() -> Result<bool, RuntimeError> {
        move || self.test()
    }
}

fn not_a(what: &str) -> RuntimeError {
    RuntimeError::bad_value(LocalizedMessage::new(MessageId::NotAValue).arg(what))
}

fn overflow() -> RuntimeError {
    RuntimeError::out_of_range(LocalizedMessage::new(MessageId::NumericOverflow))
}

fn division_by_zero() -> RuntimeError {
    RuntimeError::bad_value(LocalizedMessage::new(MessageId::DivisionByZero))
}

// ============================================================================
// Host reads
// ============================================================================

fn read_signal(signal: &SignalRef) -> Result<ScriptValue, RuntimeError> {
    let definition = &signal.definition;
    let value = coerce((signal.source)()?, definition.result_type)?;
    definition.validator.validate(&definition.script_name, &value)?;
    Ok(value)
}

fn read_property(access: &PropertyAccess) -> Result<ScriptValue, RuntimeError> {
    let raw: PropertyValue = (access.source)()?;
    match access.mode {
        PropertyMode::Value(ty) => coerce(raw.into_scalar(), ty),
        PropertyMode::Length => {
            let len = i64::try_from(raw.into_elements().len()).map_err(|_| overflow())?;
            Ok(ScriptValue::from_int(len))
        }
        PropertyMode::Element(ty) => {
            let Some(index) = &access.index else {
                return Err(not_a("number"));
            };
            let index = index.node.value()?.as_int()?;
            let mut elements = raw.into_elements();
            let len = elements.len();
            match usize::try_from(index).ok().filter(|i| *i < len) {
                Some(i) => coerce(elements.swap_remove(i), ty),
                None => Err(RuntimeError::out_of_range(
                    LocalizedMessage::new(MessageId::IndexOutOfRange)
                        .arg(index)
                        .arg(&access.definition.reference)
                        .arg(len),
                )),
            }
        }
    }
}

/// Bring a host value to the declared type. `Unset` passes through.
fn coerce(value: ScriptValue, ty: ValueType) -> Result<ScriptValue, RuntimeError> {
    match (value, ty) {
        (ScriptValue::String(text), ValueType::Number) => ScriptValue::String(text).as_number().map(ScriptValue::Number),
        (ScriptValue::Number(n), ValueType::String) => Ok(ScriptValue::String(value::format_scaled(n))),
        (value, _) => Ok(value),
    }
}

fn run_action(call: &ActionCall) -> Result<ActionOutcome, RuntimeError> {
    let definition = &call.definition;
    let mut args = Vec::with_capacity(call.args.len());
    for (i, arg) in call.args.iter().enumerate() {
        let value = arg.node.value()?;
        if let Some(param) = definition.argument(i) {
            param.validator.validate(&param.name, &value)?;
        }
        args.push(value);
    }
    tracing::trace!(action = %definition.script_name, args = args.len(), once = call.once, "executing action");
    (call.executor)(&args)?;
    Ok(ActionOutcome { deactivate: call.once })
}

// ============================================================================
// Operators
// ============================================================================

fn compare(op: ComparisonOp, left: &ScriptValue, right: &ScriptValue) -> Result<bool, RuntimeError> {
    if !op.is_relational() {
        let equal = match (left, right) {
            (ScriptValue::Unset, ScriptValue::Unset) => true,
            (ScriptValue::Unset, _) | (_, ScriptValue::Unset) => false,
            (ScriptValue::String(a), ScriptValue::String(b)) => a == b,
            (a, b) => matches!((a.as_number(), b.as_number()), (Ok(x), Ok(y)) if x == y),
        };
        return Ok(equal == (op == ComparisonOp::Eq));
    }

    if left.is_unset() || right.is_unset() {
        return Err(RuntimeError::bad_value(LocalizedMessage::new(MessageId::UnsetValue)));
    }
    let (a, b) = (left.as_number()?, right.as_number()?);
    Ok(match op {
        ComparisonOp::Gt => a > b,
        ComparisonOp::Ge => a >= b,
        ComparisonOp::Lt => a < b,
        ComparisonOp::Le => a <= b,
        ComparisonOp::Eq => a == b,
        ComparisonOp::Ne => a != b,
    })
}

fn eval_math(op: MathOp, args: &[Spanned<Expr>]) -> Result<ScriptValue, RuntimeError> {
    let nums = args
        .iter()
        .map(|arg| arg.node.value()?.as_number())
        .collect::<Result<Vec<i64>, _>>()?;

    let scaled = match (op, nums.as_slice()) {
        (MathOp::Add, _) => nums
            .iter()
            .try_fold(0i64, |acc, n| acc.checked_add(*n))
            .ok_or_else(overflow)?,
        (MathOp::Sub, [a, b]) => a.checked_sub(*b).ok_or_else(overflow)?,
        (MathOp::Mul, [a, b]) => narrow(i128::from(*a) * i128::from(*b) / i128::from(SCALE))?,
        (MathOp::Div, [a, b]) => {
            if *b == 0 {
                return Err(division_by_zero());
            }
            narrow(i128::from(*a) * i128::from(SCALE) / i128::from(*b))?
        }
        (MathOp::Mod, [a, b]) => {
            if *b == 0 {
                return Err(division_by_zero());
            }
            let scale = SCALE as f64;
            value::scale_float((*a as f64 / scale) % (*b as f64 / scale))?
        }
        (MathOp::Min, [first, ..]) => nums.iter().copied().fold(*first, i64::min),
        (MathOp::Max, [first, ..]) => nums.iter().copied().fold(*first, i64::max),
        (MathOp::Round, [n]) => round_whole(*n)?,
        (MathOp::Neg, [n]) => n.checked_neg().ok_or_else(overflow)?,
        _ => return Err(not_a("number")),
    };
    Ok(ScriptValue::Number(scaled))
}

fn narrow(wide: i128) -> Result<i64, RuntimeError> {
    i64::try_from(wide).map_err(|_| overflow())
}

/// Round to the nearest whole unit, halves away from zero.
fn round_whole(scaled: i64) -> Result<i64, RuntimeError> {
    let (whole, rest) = (scaled / SCALE, scaled % SCALE);
    let whole = if rest.abs() * 2 >= SCALE {
        whole.checked_add(rest.signum()).ok_or_else(overflow)?
    } else {
        whole
    };
    whole.checked_mul(SCALE).ok_or_else(overflow)
}
