//! Property-based tests for the SigScript engine
//!
//! These tests use proptest to verify invariants across many randomly
//! generated inputs, catching edge cases that hand-written tests might miss.

use proptest::prelude::*;
use sigscript::{Engine, EngineConfig};
use sigscript_core::capabilities::SignalDefinition;
use sigscript_core::lang::grammars::GrammarId;
use sigscript_core::static_registry::StaticRegistry;
use sigscript_core::value::{self, ScriptValue, ValueType};

fn engine() -> Engine {
    let host = StaticRegistry::new()
        .with_signal(SignalDefinition::new("A.x", ValueType::Number), ScriptValue::from_int(7))
        .with_signal(SignalDefinition::new("B.y", ValueType::Number), ScriptValue::Number(-250))
        .with_signal(SignalDefinition::new("C.name", ValueType::String), ScriptValue::string("Lab"));
    Engine::new(host.shared(), EngineConfig::default())
}

/// Random infix arithmetic over small literals and two signals, fully parenthesised.
fn arith() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        (0u32..1000).prop_map(|n| n.to_string()),
        (0u32..1000, 1u32..100).prop_map(|(w, f)| format!("{w}.{f:02}")),
        Just("A.x".to_string()),
        Just("B.y".to_string()),
    ];
    leaf.prop_recursive(4, 24, 3, |inner| {
        prop_oneof![
            (
                inner.clone(),
                prop_oneof![Just("+"), Just("-"), Just("*"), Just("/"), Just("%")],
                inner.clone()
            )
                .prop_map(|(a, op, b)| format!("({a} {op} {b})")),
            inner.clone().prop_map(|a| format!("-({a})")),
            (inner.clone(), inner).prop_map(|(a, b)| format!("max({a}, {b})")),
        ]
    })
}

/// A quoted text literal whose characters are all escaped where they could be mistaken for syntax.
fn text_literal() -> impl Strategy<Value = String> {
    "[a-z {}%'\\\\]{0,8}".prop_map(|text| {
        let mut literal = String::from("'");
        for c in text.chars() {
            if matches!(c, '\\' | '\'' | '%') {
                literal.push('\\');
            }
            literal.push(c);
        }
        literal.push('\'');
        literal
    })
}

/// Random conditions: numeric and text comparisons joined by `and`, `or` and `not`.
fn condition() -> impl Strategy<Value = String> {
    let comparison = prop_oneof![
        (
            arith(),
            prop_oneof![Just("=="), Just("!="), Just(">"), Just(">="), Just("<"), Just("<=")],
            arith()
        )
            .prop_map(|(a, op, b)| format!("({a} {op} {b})")),
        (prop_oneof![Just("=="), Just("!=")], text_literal()).prop_map(|(op, text)| format!("(C.name {op} {text})")),
    ];
    comparison.prop_recursive(3, 12, 2, |inner| {
        prop_oneof![
            (inner.clone(), prop_oneof![Just("and"), Just("or")], inner.clone())
                .prop_map(|(a, op, b)| format!("({a} {op} {b})")),
            inner.prop_map(|a| format!("not ({a})")),
        ]
    })
}

// =============================================================================
// Parser robustness
// =============================================================================

proptest! {
    /// Property: arbitrary text never panics the tokenizer or either parser.
    #[test]
    fn parse_never_panics(source in "\\PC{0,40}") {
        let engine = engine();
        let _ = engine.parse_with(&source, GrammarId::Infix);
        let _ = engine.parse_with(&source, GrammarId::Prefix);
    }

    /// Property: text built from the language's own symbols never panics either.
    #[test]
    fn parse_symbol_soup_never_panics(source in "[()a-zA-Z0-9 .,'+*/%<>=!-]{0,30}") {
        let engine = engine();
        let _ = engine.parse(&source);
    }
}

// =============================================================================
// Decompiler properties
// =============================================================================

proptest! {
    /// Property: canonical text re-parses to the same canonical text.
    #[test]
    fn canonical_form_is_stable(source in arith()) {
        let engine = engine();
        let once = engine.canonicalize(&source).unwrap();
        let twice = engine.canonicalize(&once).unwrap();
        prop_assert_eq!(once, twice);
    }

    /// Property: translating to prefix and back keeps the value.
    #[test]
    fn prefix_round_trip_keeps_value(source in arith()) {
        let engine = engine();
        let expr = engine.parse(&source).unwrap();
        let prefix = engine.decompile(&expr, GrammarId::Prefix);
        let reparsed = engine.parse_with(&prefix, GrammarId::Prefix).unwrap();
        prop_assert_eq!(reparsed.value().ok(), expr.value().ok());
        prop_assert_eq!(engine.decompile(&reparsed, GrammarId::Infix), expr.canonical());
    }

    /// Property: conditions keep their canonical text and outcome across both grammars.
    #[test]
    fn condition_round_trip(source in condition()) {
        let engine = engine();
        let expr = engine.parse(&source).unwrap();
        let canonical = expr.canonical();
        let reparsed = engine.parse(&canonical).unwrap();
        prop_assert_eq!(reparsed.canonical(), canonical.clone());
        prop_assert_eq!(reparsed.test().ok(), expr.test().ok());

        let prefix = engine.decompile(&expr, GrammarId::Prefix);
        let from_prefix = engine.parse_with(&prefix, GrammarId::Prefix).unwrap();
        prop_assert_eq!(engine.decompile(&from_prefix, GrammarId::Infix), canonical);
        prop_assert_eq!(from_prefix.test().ok(), expr.test().ok());
    }

    /// Property: text literals survive canonical output unchanged, macro openers included.
    #[test]
    fn text_literals_round_trip(text in text_literal()) {
        let engine = engine();
        let expr = engine.parse(&format!("C.name == {text}")).unwrap();
        let reparsed = engine.parse(&expr.canonical()).unwrap();
        prop_assert_eq!(reparsed.canonical(), expr.canonical());
    }

    /// Property: minimal parentheses never change the value.
    #[test]
    fn canonical_text_keeps_value(source in arith()) {
        let engine = engine();
        let expr = engine.parse(&source).unwrap();
        let canonical = engine.parse(&expr.canonical()).unwrap();
        prop_assert_eq!(canonical.value().ok(), expr.value().ok());
    }
}

// =============================================================================
// Number properties
// =============================================================================

proptest! {
    /// Property: scaled numbers survive formatting and parsing.
    #[test]
    fn scaled_numbers_round_trip(n in -1_000_000_000i64..1_000_000_000) {
        prop_assert_eq!(value::parse_scaled(&value::format_scaled(n)), Some(n));
    }

    /// Property: addition and subtraction are exact at two decimals.
    #[test]
    fn addition_is_exact(a in -100_000i64..100_000, b in -100_000i64..100_000) {
        let engine = engine();
        let (a_text, b_text) = (value::format_scaled(a), value::format_scaled(b));
        let expr = engine.parse(&format!("{a_text} + ({b_text}) - ({b_text})")).unwrap();
        prop_assert_eq!(expr.value().unwrap(), ScriptValue::Number(a));
    }
}
