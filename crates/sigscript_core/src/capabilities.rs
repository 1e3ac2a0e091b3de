//! Capability-registry interface.
//!
//! A host exposes its live state to scripts through a [`CapabilityRegistry`]: a pre-populated map from dotted
//! names (`Component.Property`) to typed definitions and accessors. The syntax frontend resolves every signal,
//! action and property reference through it at parse time; the resulting expression nodes keep `Rc` handles to
//! the accessors and call them on every evaluation.
//!
//! ## Notes
//! - A registry instance represents one host context. Resolution failures are [`BadStateError`]s.
//! - Accessors may fail at evaluation time too (e.g. the capability was switched off after parsing).

use std::fmt;
use std::rc::Rc;

use crate::errors::{BadStateError, LocalizedMessage, RuntimeError};
use crate::lang::messages::MessageId;
use crate::lang::registry::Arity;
use crate::value::{self, ScriptValue, ValueType};

/// Reads the current value of a signal.
pub type SignalSource = Rc<dyn Fn() -> Result<ScriptValue, RuntimeError>>;

/// Performs an action with already-evaluated arguments.
pub type ActionExecutor = Rc<dyn Fn(&[ScriptValue]) -> Result<(), RuntimeError>>;

/// Reads the current value of a property.
pub type PropertySource = Rc<dyn Fn() -> Result<PropertyValue, RuntimeError>>;

/// Shared handle to a registry; expression nodes that resolve names lazily hold one.
pub type SharedRegistry = Rc<dyn CapabilityRegistry>;

/// Host-side name resolution.
///
/// ## Notes
/// - `name` is always the script name without the `.once` suffix.
/// - The `has_*` helpers default to "the lookup succeeds" and must never fail.
pub trait CapabilityRegistry {
    fn signal_definition(&self, name: &str) -> Result<Rc<SignalDefinition>, BadStateError>;

    fn signal_source(&self, name: &str) -> Result<SignalSource, BadStateError>;

    fn action_definition(&self, name: &str) -> Result<Rc<ActionDefinition>, BadStateError>;

    fn action_executor(&self, name: &str) -> Result<ActionExecutor, BadStateError>;

    fn property_definition(&self, reference: &str) -> Result<Rc<PropertyDefinition>, BadStateError>;

    fn property_source(&self, reference: &str) -> Result<PropertySource, BadStateError>;

    fn has_signal(&self, name: &str) -> bool {
        self.signal_source(name).is_ok()
    }

    fn has_action(&self, name: &str) -> bool {
        self.action_executor(name).is_ok()
    }
}

/// Check applied to a value before a script observes it (signals) or a host receives it (action arguments).
///
/// `Unset` values are never rejected; comparisons decide what an unset value means.
#[derive(Clone, Default)]
pub enum Validator {
    #[default]
    Any,
    /// Inclusive bounds, scaled.
    Range { min: i64, max: i64 },
    NonEmpty,
    OneOf(Vec<ScriptValue>),
    Custom(Rc<dyn Fn(&ScriptValue) -> Result<(), RuntimeError>>),
}

impl Validator {
    /// Build a range from whole units.
    pub fn range(min: i64, max: i64) -> Self {
        Validator::Range {
            min: min.saturating_mul(value::SCALE),
            max: max.saturating_mul(value::SCALE),
        }
    }

    /// Validate `value`; `subject` names the signal or argument in the error message.
    ///
    /// ## Errors
    /// - `ValueOutOfRange` for a number outside `Range`.
    /// - `BadValue` for empty text under `NonEmpty`, a value outside `OneOf`, or a non-number under `Range`.
    pub fn validate(&self, subject: &str, value: &ScriptValue) -> Result<(), RuntimeError> {
        if value.is_unset() {
            return Ok(());
        }
        match self {
            Validator::Any => Ok(()),
            Validator::Range { min, max } => {
                let n = value.as_number()?;
                if (*min..=*max).contains(&n) {
                    Ok(())
                } else {
                    Err(RuntimeError::out_of_range(
                        LocalizedMessage::new(MessageId::ValueOutOfBounds)
                            .arg(value::format_scaled(n))
                            .arg(value::format_scaled(*min))
                            .arg(value::format_scaled(*max)),
                    ))
                }
            }
            Validator::NonEmpty => {
                if value.as_string().is_empty() {
                    Err(RuntimeError::bad_value(
                        LocalizedMessage::new(MessageId::ValueEmpty).arg(subject),
                    ))
                } else {
                    Ok(())
                }
            }
            Validator::OneOf(allowed) => {
                if allowed.contains(value) {
                    Ok(())
                } else {
                    Err(RuntimeError::bad_value(
                        LocalizedMessage::new(MessageId::ValueNotAllowed)
                            .arg(value)
                            .arg(subject),
                    ))
                }
            }
            Validator::Custom(check) => check(value),
        }
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Validator::Any => f.write_str("Any"),
            Validator::Range { min, max } => f.debug_struct("Range").field("min", min).field("max", max).finish(),
            Validator::NonEmpty => f.write_str("NonEmpty"),
            Validator::OneOf(values) => f.debug_tuple("OneOf").field(values).finish(),
            Validator::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Declared shape of a signal.
#[derive(Debug, Clone)]
pub struct SignalDefinition {
    pub script_name: String,
    pub display_name: String,
    pub result_type: ValueType,
    pub validator: Validator,
    /// Values a comparison constant may take when option enforcement is on.
    pub options: Option<Vec<ScriptValue>>,
    /// Deprecated literal spellings and their canonical replacements.
    pub legacy: Vec<(ScriptValue, ScriptValue)>,
}

impl SignalDefinition {
    pub fn new(script_name: impl Into<String>, result_type: ValueType) -> Self {
        let script_name = script_name.into();
        Self {
            display_name: script_name.clone(),
            script_name,
            result_type,
            validator: Validator::Any,
            options: None,
            legacy: Vec::new(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_options(mut self, options: Vec<ScriptValue>) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_legacy(mut self, legacy: ScriptValue, canonical: ScriptValue) -> Self {
        self.legacy.push((legacy, canonical));
        self
    }

    /// Canonical replacement for a deprecated literal, if `value` is one.
    pub fn remap_legacy(&self, value: &ScriptValue) -> Option<&ScriptValue> {
        self.legacy
            .iter()
            .find(|(legacy, _)| legacy == value)
            .map(|(_, canonical)| canonical)
    }

    /// Whether `value` is among the declared options. Signals without options allow everything.
    pub fn allows(&self, value: &ScriptValue) -> bool {
        self.options.as_ref().is_none_or(|options| options.contains(value))
    }
}

/// One declared action parameter.
#[derive(Debug, Clone)]
pub struct ArgumentDefinition {
    pub name: String,
    pub value_type: ValueType,
    pub validator: Validator,
}

impl ArgumentDefinition {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            validator: Validator::Any,
        }
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }
}

/// Declared shape of an action.
#[derive(Debug, Clone)]
pub struct ActionDefinition {
    pub script_name: String,
    pub display_name: String,
    pub arguments: Vec<ArgumentDefinition>,
    /// Repeated trailing parameter; when present the action accepts any number of extra arguments of this shape.
    pub variadic: Option<ArgumentDefinition>,
    /// Describer template with `{0}`-style placeholders for the described arguments.
    pub format: Option<String>,
}

impl ActionDefinition {
    pub fn new(script_name: impl Into<String>) -> Self {
        let script_name = script_name.into();
        Self {
            display_name: script_name.clone(),
            script_name,
            arguments: Vec::new(),
            variadic: None,
            format: None,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_argument(mut self, argument: ArgumentDefinition) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn with_variadic(mut self, argument: ArgumentDefinition) -> Self {
        self.variadic = Some(argument);
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn arity(&self) -> Arity {
        if self.variadic.is_some() {
            Arity::at_least(self.arguments.len())
        } else {
            Arity::exact(self.arguments.len())
        }
    }

    /// Parameter governing the argument at `index`, including the variadic tail.
    pub fn argument(&self, index: usize) -> Option<&ArgumentDefinition> {
        self.arguments.get(index).or(self.variadic.as_ref())
    }
}

/// Whether a property is a single value or a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PropertyShape {
    Scalar,
    Sequence,
    /// A collection without a natural order; elements are sorted before indexing.
    Unordered,
}

impl PropertyShape {
    pub fn is_collection(self) -> bool {
        !matches!(self, PropertyShape::Scalar)
    }
}

/// Declared shape of a `Component.Property` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDefinition {
    pub reference: String,
    pub display_name: String,
    pub value_type: ValueType,
    pub shape: PropertyShape,
}

impl PropertyDefinition {
    pub fn new(reference: impl Into<String>, value_type: ValueType, shape: PropertyShape) -> Self {
        let reference = reference.into();
        Self {
            display_name: reference.clone(),
            reference,
            value_type,
            shape,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }
}

/// A property value as the host hands it over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Scalar(ScriptValue),
    Sequence(Vec<ScriptValue>),
    Unordered(Vec<ScriptValue>),
}

impl PropertyValue {
    /// Elements in evaluation order: sequences as given, unordered collections sorted, scalars as one element.
    pub fn into_elements(self) -> Vec<ScriptValue> {
        match self {
            PropertyValue::Scalar(value) => vec![value],
            PropertyValue::Sequence(values) => values,
            PropertyValue::Unordered(mut values) => {
                values.sort();
                values
            }
        }
    }

    /// The single value of a scalar, or the collection rendered as comma-separated text.
    pub fn into_scalar(self) -> ScriptValue {
        match self {
            PropertyValue::Scalar(value) => value,
            other => {
                let parts: Vec<String> = other.into_elements().iter().map(ScriptValue::as_string).collect();
                ScriptValue::String(parts.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RuntimeErrorKind;

    #[test]
    fn test_range_validator() {
        let v = Validator::range(0, 100);
        assert!(v.validate("Door.Position", &ScriptValue::from_int(50)).is_ok());
        let err = v.validate("Door.Position", &ScriptValue::from_int(101)).unwrap_err();
        assert!(matches!(err.kind(), RuntimeErrorKind::ValueOutOfRange(_)));
        assert_eq!(err.to_string(), "101 is outside [0, 100]");
        assert!(v.validate("Door.Position", &ScriptValue::Unset).is_ok());
    }

    #[test]
    fn test_one_of_validator() {
        let v = Validator::OneOf(vec!["open".into(), "closed".into()]);
        assert!(v.validate("Door.State", &"open".into()).is_ok());
        let err = v.validate("Door.State", &"ajar".into()).unwrap_err();
        assert!(matches!(err.kind(), RuntimeErrorKind::BadValue(_)));
        assert_eq!(err.to_string(), "'ajar' is not an allowed value for Door.State");
    }

    #[test]
    fn test_legacy_remap_and_options() {
        let def = SignalDefinition::new("Door.State", ValueType::String)
            .with_options(vec!["open".into(), "closed".into()])
            .with_legacy("opened".into(), "open".into());
        assert_eq!(def.remap_legacy(&"opened".into()), Some(&ScriptValue::string("open")));
        assert_eq!(def.remap_legacy(&"open".into()), None);
        assert!(def.allows(&"closed".into()));
        assert!(!def.allows(&"ajar".into()));
    }

    #[test]
    fn test_action_arity_with_variadic_tail() {
        let def = ActionDefinition::new("Log.Write")
            .with_argument(ArgumentDefinition::new("level", ValueType::Number))
            .with_variadic(ArgumentDefinition::new("part", ValueType::String));
        assert!(def.arity().accepts(1));
        assert!(def.arity().accepts(4));
        assert!(!def.arity().accepts(0));
        assert_eq!(def.argument(3).map(|a| a.name.as_str()), Some("part"));
    }

    #[test]
    fn test_unordered_elements_sorted() {
        let value = PropertyValue::Unordered(vec![ScriptValue::from_int(3), ScriptValue::from_int(1)]);
        assert_eq!(value.into_elements(), vec![ScriptValue::from_int(1), ScriptValue::from_int(3)]);
    }
}
