//! User-facing message vocabulary.
//!
//! Every message the engine shows to users (validation failures, runtime errors, describer phrases) has a
//! stable [`MessageId`], a stable dotted localization key, and a built-in English template. Templates use
//! positional placeholders: `{0}`, `{1}`, ...
//!
//! ## Notes
//! - Keys are part of the host contract: a host catalog is keyed by them, so never rename a key.
//! - [`EnglishCatalog`] is the fallback used by `Display` impls.
//!
//! ## Examples
//! ```rust
//! use sigscript_core::lang::messages::{self, EnglishCatalog, MessageCatalog, MessageId};
//!
//! assert_eq!(messages::key(MessageId::UnknownSignal), "error.unknown_signal");
//! let text = EnglishCatalog.render(MessageId::UnknownSignal, &["Foo.Bar".to_string()]);
//! assert_eq!(text, "unknown signal: Foo.Bar");
//! ```

use std::borrow::Cow;

/// Stable identifier for every user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageId {
    // Reference resolution
    UnknownSignal,
    UnknownAction,
    UnknownProperty,
    Unavailable,

    // Rule validation
    ConditionNotBoolean,
    ConditionWithoutSignal,
    NotAnAction,
    PreconditionNotSatisfied,

    // Runtime values
    IndexOutOfRange,
    ValueOutOfBounds,
    ValueNotAllowed,
    ValueEmpty,
    NotANumber,
    UnsetValue,
    DivisionByZero,
    NumericOverflow,
    NotAValue,

    // Describer phrases
    DescribeEq,
    DescribeNe,
    DescribeGt,
    DescribeGe,
    DescribeLt,
    DescribeLe,
    DescribeAnd,
    DescribeOr,
    DescribeNot,
    DescribeMin,
    DescribeMax,
    DescribeRound,
    DescribeLength,
    DescribeElement,
    DescribeHasSignal,
    DescribeHasAction,
    DescribeActionOnce,
    DescribeUnset,
    DescribeFailure,
}

/// Metadata for a message.
#[derive(Debug, Clone, Copy)]
pub struct MessageInfo {
    pub id: MessageId,
    pub key: &'static str,
    pub english: &'static str,
}

/// Registry of all messages.
pub const MESSAGES: &[MessageInfo] = &[
    // Reference resolution
    msg(MessageId::UnknownSignal, "error.unknown_signal", "unknown signal: {0}"),
    msg(MessageId::UnknownAction, "error.unknown_action", "unknown action: {0}"),
    msg(MessageId::UnknownProperty, "error.unknown_property", "unknown property: {0}"),
    msg(MessageId::Unavailable, "error.unavailable", "{0} is not available in this context"),
    // Rule validation
    msg(MessageId::ConditionNotBoolean, "error.condition_not_boolean", "condition must be boolean"),
    msg(
        MessageId::ConditionWithoutSignal,
        "error.condition_without_signal",
        "condition must reference a signal",
    ),
    msg(MessageId::NotAnAction, "error.not_an_action", "expression is not an action"),
    msg(
        MessageId::PreconditionNotSatisfied,
        "error.precondition_not_satisfied",
        "precondition not satisfied: {0}",
    ),
    // Runtime values
    msg(
        MessageId::IndexOutOfRange,
        "error.index_out_of_range",
        "index {0} is out of range for {1} (length {2})",
    ),
    msg(MessageId::ValueOutOfBounds, "error.value_out_of_bounds", "{0} is outside [{1}, {2}]"),
    msg(MessageId::ValueNotAllowed, "error.value_not_allowed", "'{0}' is not an allowed value for {1}"),
    msg(MessageId::ValueEmpty, "error.value_empty", "{0} must not be empty"),
    msg(MessageId::NotANumber, "error.not_a_number", "'{0}' is not a number"),
    msg(MessageId::UnsetValue, "error.unset_value", "value is unset"),
    msg(MessageId::DivisionByZero, "error.division_by_zero", "division by zero"),
    msg(MessageId::NumericOverflow, "error.numeric_overflow", "numeric overflow"),
    msg(MessageId::NotAValue, "error.not_a_value", "expression does not produce a {0}"),
    // Describer phrases
    msg(MessageId::DescribeEq, "describe.eq", "{0} is {1}"),
    msg(MessageId::DescribeNe, "describe.ne", "{0} is not {1}"),
    msg(MessageId::DescribeGt, "describe.gt", "{0} is greater than {1}"),
    msg(MessageId::DescribeGe, "describe.ge", "{0} is at least {1}"),
    msg(MessageId::DescribeLt, "describe.lt", "{0} is less than {1}"),
    msg(MessageId::DescribeLe, "describe.le", "{0} is at most {1}"),
    msg(MessageId::DescribeAnd, "describe.and", "{0} and {1}"),
    msg(MessageId::DescribeOr, "describe.or", "{0} or {1}"),
    msg(MessageId::DescribeNot, "describe.not", "not ({0})"),
    msg(MessageId::DescribeMin, "describe.min", "the smallest of {0}"),
    msg(MessageId::DescribeMax, "describe.max", "the largest of {0}"),
    msg(MessageId::DescribeRound, "describe.round", "{0} rounded"),
    msg(MessageId::DescribeLength, "describe.length", "the number of {0}"),
    msg(MessageId::DescribeElement, "describe.element", "{0} #{1}"),
    msg(MessageId::DescribeHasSignal, "describe.has_signal", "{0} is available"),
    msg(MessageId::DescribeHasAction, "describe.has_action", "{0} can be performed"),
    msg(MessageId::DescribeActionOnce, "describe.action_once", "{0}, once"),
    msg(MessageId::DescribeUnset, "describe.unset", "(unset)"),
    msg(MessageId::DescribeFailure, "describe.failure", "<{0}>"),
];

/// Return the full metadata entry for a message.
///
/// ## Panics
/// - If the registry is missing an entry for `id` (this indicates a programming error).
pub fn info_for(id: MessageId) -> &'static MessageInfo {
    MESSAGES.iter().find(|m| m.id == id).expect("message info missing")
}

/// Return the stable localization key.
pub fn key(id: MessageId) -> &'static str {
    info_for(id).key
}

/// Resolve a localization key back to its id.
pub fn from_key(key: &str) -> Option<MessageId> {
    MESSAGES.iter().find(|m| m.key == key).map(|m| m.id)
}

/// Source of localized templates.
///
/// Hosts implement this to translate engine messages; [`MessageCatalog::render`] does placeholder substitution.
pub trait MessageCatalog {
    /// Template text for `id`, with `{0}`-style placeholders.
    fn template(&self, id: MessageId) -> Cow<'_, str>;

    fn render(&self, id: MessageId, args: &[String]) -> String {
        substitute(&self.template(id), args)
    }
}

/// Built-in English catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishCatalog;

impl MessageCatalog for EnglishCatalog {
    fn template(&self, id: MessageId) -> Cow<'_, str> {
        Cow::Borrowed(info_for(id).english)
    }
}

/// Replace `{n}` placeholders with `args[n]`.
///
/// Placeholders without a matching argument are kept verbatim.
pub fn substitute(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len() + args.iter().map(String::len).sum::<usize>());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let index = after
            .find('}')
            .and_then(|close| after[..close].parse::<usize>().ok().map(|i| (i, close)));
        match index {
            Some((i, close)) if i < args.len() => {
                out.push_str(&args[i]);
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

// --- helpers -----------------------------------------------------------------

const fn msg(id: MessageId, key: &'static str, english: &'static str) -> MessageInfo {
    MessageInfo { id, key, english }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_keys_are_unique() {
        let mut seen = HashSet::new();
        for m in MESSAGES {
            assert!(seen.insert(m.key), "duplicate message key {:?}", m.key);
        }
    }

    #[test]
    fn test_from_key_round_trips() {
        for m in MESSAGES {
            assert_eq!(from_key(m.key), Some(m.id));
        }
    }

    #[test]
    fn test_substitute_positional() {
        let args = vec!["a".to_string(), "b".to_string()];
        assert_eq!(substitute("{1} then {0}", &args), "b then a");
        assert_eq!(substitute("{2} stays", &args), "{2} stays");
        assert_eq!(substitute("no {placeholder}", &args), "no {placeholder}");
        assert_eq!(substitute("<{0}>", &args), "<a>");
    }
}
