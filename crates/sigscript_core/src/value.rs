//! Script value model.
//!
//! A [`ScriptValue`] is what signals produce, what constants hold, and what actions receive. Numbers are stored
//! as a **scaled integer**: the real value multiplied by [`SCALE`] (two implied decimal digits). Addition,
//! subtraction, multiplication, division, `min`/`max` and negation operate directly on that representation so
//! equality comparisons never observe floating-point drift.
//!
//! ## Examples
//! ```rust
//! use sigscript_core::value::{self, ScriptValue};
//!
//! assert_eq!(value::parse_scaled("1.003"), Some(100));
//! assert_eq!(value::format_scaled(150), "1.5");
//! assert_eq!(ScriptValue::from_int(3).as_string(), "3");
//! ```

use std::fmt;

use crate::errors::{LocalizedMessage, RuntimeError};
use crate::lang::messages::MessageId;

/// Number of scaled units per whole unit.
pub const SCALE: i64 = 100;

/// Static type of a value-producing expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ValueType {
    String,
    Number,
}

impl ValueType {
    /// Lower-case name used in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Number => "number",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A runtime value.
///
/// ## Notes
/// - `Number` holds the scaled representation (`1.5` is `Number(150)`).
/// - The derived ordering (`Unset < String < Number`) is only used to sort unordered host collections into a
///   deterministic order; comparisons in scripts go through the comparison operators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum ScriptValue {
    #[default]
    Unset,
    String(String),
    Number(i64),
}

impl ScriptValue {
    /// Build a number from whole units (`from_int(2)` is `2.00`).
    pub fn from_int(units: i64) -> Self {
        ScriptValue::Number(units.saturating_mul(SCALE))
    }

    /// Build a number from a float, rounding to the nearest hundredth.
    ///
    /// ## Errors
    /// - `BadValue` if `real` is NaN or infinite, `ValueOutOfRange` if it does not fit the scaled range.
    pub fn from_float(real: f64) -> Result<Self, RuntimeError> {
        scale_float(real).map(ScriptValue::Number)
    }

    pub fn string(text: impl Into<String>) -> Self {
        ScriptValue::String(text.into())
    }

    /// Return the value's type, or `None` for `Unset`.
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            ScriptValue::Unset => None,
            ScriptValue::String(_) => Some(ValueType::String),
            ScriptValue::Number(_) => Some(ValueType::Number),
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, ScriptValue::Unset)
    }

    /// Render as text. Numbers use up to two decimals with trailing zeros trimmed; `Unset` is empty.
    pub fn as_string(&self) -> String {
        match self {
            ScriptValue::Unset => String::new(),
            ScriptValue::String(s) => s.clone(),
            ScriptValue::Number(n) => format_scaled(*n),
        }
    }

    /// Return the scaled number, parsing strings when needed.
    ///
    /// ## Errors
    /// - `BadValue` for `Unset` or for strings that are not decimal numbers.
    pub fn as_number(&self) -> Result<i64, RuntimeError> {
        match self {
            ScriptValue::Number(n) => Ok(*n),
            ScriptValue::String(s) => parse_scaled(s.trim()).ok_or_else(|| {
                RuntimeError::bad_value(LocalizedMessage::new(MessageId::NotANumber).arg(s))
            }),
            ScriptValue::Unset => Err(RuntimeError::bad_value(LocalizedMessage::new(MessageId::UnsetValue))),
        }
    }

    /// Return whole units, truncating toward zero.
    pub fn as_int(&self) -> Result<i64, RuntimeError> {
        self.as_number().map(|n| n / SCALE)
    }

    pub fn as_float(&self) -> Result<f64, RuntimeError> {
        self.as_number().map(|n| n as f64 / SCALE as f64)
    }

    /// Truthiness: non-zero numbers and non-empty strings are true; `Unset` is false.
    pub fn as_bool(&self) -> bool {
        match self {
            ScriptValue::Unset => false,
            ScriptValue::String(s) => !s.is_empty(),
            ScriptValue::Number(n) => *n != 0,
        }
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

impl From<&str> for ScriptValue {
    fn from(value: &str) -> Self {
        ScriptValue::String(value.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(value: String) -> Self {
        ScriptValue::String(value)
    }
}

/// Parse decimal text into the scaled representation.
///
/// Digits beyond the second decimal are rounded half away from zero, so `"1.005"` becomes `101` and
/// `"1.003"` becomes `100`.
///
/// ## Returns
/// - `None` if `text` is not `-?digits(.digits)?` or does not fit in `i64`.
pub fn parse_scaled(text: &str) -> Option<i64> {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (whole, fraction) = match body.split_once('.') {
        Some((w, f)) => (w, f),
        None => (body, ""),
    };
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if body.contains('.') && (fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }

    let mut scaled: i64 = 0;
    for b in whole.bytes() {
        scaled = scaled.checked_mul(10)?.checked_add(i64::from(b - b'0'))?;
    }
    let mut digits = fraction.bytes();
    for _ in 0..2 {
        let d = digits.next().map(|b| i64::from(b - b'0')).unwrap_or(0);
        scaled = scaled.checked_mul(10)?.checked_add(d)?;
    }
    if digits.next().is_some_and(|b| b >= b'5') {
        scaled = scaled.checked_add(1)?;
    }

    Some(if negative { -scaled } else { scaled })
}

/// Render a scaled number with up to two decimals, trimming trailing zeros.
pub fn format_scaled(scaled: i64) -> String {
    let sign = if scaled < 0 { "-" } else { "" };
    let abs = scaled.unsigned_abs();
    let scale = SCALE as u64;
    let (whole, frac) = (abs / scale, abs % scale);
    if frac == 0 {
        format!("{sign}{whole}")
    } else if frac % 10 == 0 {
        format!("{sign}{whole}.{}", frac / 10)
    } else {
        format!("{sign}{whole}.{frac:02}")
    }
}

/// Convert a real number into scaled form, rounding to the nearest hundredth.
pub fn scale_float(real: f64) -> Result<i64, RuntimeError> {
    if !real.is_finite() {
        return Err(RuntimeError::bad_value(
            LocalizedMessage::new(MessageId::NotANumber).arg(real),
        ));
    }
    let scaled = (real * SCALE as f64).round();
    if scaled < i64::MIN as f64 || scaled > i64::MAX as f64 {
        return Err(RuntimeError::out_of_range(LocalizedMessage::new(MessageId::NumericOverflow)));
    }
    Ok(scaled as i64)
}
