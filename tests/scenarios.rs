//! End-to-end behavior of the engine against a JSON host fixture.

use sigscript::{Engine, EngineConfig, HostFixture, ScriptError};
use sigscript_core::errors::RuntimeErrorKind;
use sigscript_core::lang::grammars::GrammarId;
use sigscript_core::static_registry::StaticRegistry;
use sigscript_core::value::ScriptValue;
use sigscript_syntax::ast::{ComparisonOp, Expr};
use sigscript_syntax::diagnostics::ParsingErrorKind;

fn host() -> StaticRegistry {
    HostFixture::from_json(include_str!("fixtures/door_host.json"))
        .and_then(HostFixture::into_registry)
        .expect("fixture should load")
}

fn engine_with(config: EngineConfig) -> (Engine, StaticRegistry) {
    let host = host();
    (Engine::new(host.shared(), config), host)
}

fn engine() -> Engine {
    engine_with(EngineConfig::default()).0
}

fn parse_error(result: sigscript::ParsingResult) -> sigscript_syntax::ParsingError {
    match result {
        Err(ScriptError::Parsing(err)) => err,
        Err(other) => panic!("expected a parsing error, got {other}"),
        Ok(expr) => panic!("expected a parsing error, got {}", expr.canonical()),
    }
}

// =============================================================================
// Core scenarios
// =============================================================================

#[test]
fn prefix_signal_comparison_resolves_or_fails_by_registration() {
    let engine = engine();
    let expr = engine.parse_with("(eq (sig Door.Position) 50)", GrammarId::Prefix).unwrap();
    assert!(matches!(expr.node(), Expr::Comparison { op: ComparisonOp::Eq, .. }));
    assert!(expr.test().unwrap());

    let err = parse_error(engine.parse_with("(eq (sig Foo.Bar) 5)", GrammarId::Prefix));
    assert!(matches!(err.kind, ParsingErrorKind::BadState(_)));
    assert_eq!(err.message, "unknown signal: Foo.Bar");
    assert!(err.span.is_some());
}

#[test]
fn subtraction_is_left_associative_and_round_trips() {
    let engine = engine();
    let expr = engine.parse("1 - 2 - 3 == -4").unwrap();
    assert!(expr.test().unwrap());

    let text = expr.canonical();
    assert_eq!(text, "1 - 2 - 3 == -4");
    let again = engine.parse(&text).unwrap();
    assert_eq!(
        engine.decompile(&again, GrammarId::Prefix),
        engine.decompile(&expr, GrammarId::Prefix)
    );
    assert_eq!(engine.decompile(&expr, GrammarId::Prefix), "(eq (sub (sub 1 2) 3) -4)");
}

#[test]
fn round_halves_to_whole_units() {
    let engine = engine();
    assert!(engine.parse("round(1.61) == 2").unwrap().test().unwrap());
    assert!(engine.parse("round(1.01) == 1").unwrap().test().unwrap());
    assert!(engine.parse("round(-1.5) == -2").unwrap().test().unwrap());
}

#[test]
fn property_index_is_checked_at_evaluation_time() {
    let engine = engine();
    assert!(engine.parse("getnum('Foobar.numList', 1) == 2").unwrap().test().unwrap());

    let out_of_range = engine.parse("getnum('Foobar.numList', 2) == 2").unwrap();
    let err = out_of_range.test().unwrap_err();
    assert!(matches!(err.kind(), RuntimeErrorKind::ValueOutOfRange(_)));
}

#[test]
fn malformed_infix_reports_a_position() {
    let engine = engine();
    let err = parse_error(engine.parse("1 + (1 + 2 + )"));
    assert_eq!(err.kind, ParsingErrorKind::Syntax);
    let span = err.span.expect("syntax errors carry a position");
    assert_eq!(span.start, 13);
}

// =============================================================================
// Host interaction
// =============================================================================

#[test]
fn conditions_read_live_host_state() {
    let (engine, host) = engine_with(EngineConfig::default());
    let rule = engine.parse_condition("Door.Position > 40 and Door.State == 'open'").unwrap();
    assert!(rule.test().unwrap());

    host.set_signal("Door.Position", ScriptValue::from_int(10)).unwrap();
    assert!(!rule.test().unwrap());
}

#[test]
fn actions_validate_arguments_and_record_calls() {
    let (engine, host) = engine_with(EngineConfig::default());
    let action = engine.parse_action("Door.Move(Door.Position + 10)").unwrap();
    assert!(!action.execute().unwrap().deactivate);
    assert_eq!(host.calls()[0].args, vec![ScriptValue::from_int(60)]);

    let too_far = engine.parse_action("Door.Move(Door.Position * 3)").unwrap();
    let err = too_far.execute().unwrap_err();
    assert!(matches!(err.kind(), RuntimeErrorKind::ValueOutOfRange(_)));
    assert_eq!(host.calls().len(), 1);

    let once = engine.parse_action("Alarm.Ring.once()").unwrap();
    assert!(once.execute().unwrap().deactivate);
}

#[test]
fn variadic_actions_accept_extra_arguments() {
    let (engine, host) = engine_with(EngineConfig::default());
    engine
        .parse_action("Log.Write(1, 'door', Door.State, Room.Name)")
        .unwrap()
        .execute()
        .unwrap();
    let args = &host.calls()[0].args;
    assert_eq!(args.len(), 4);
    assert_eq!(args[2], ScriptValue::string("open"));
}

#[test]
fn unavailable_names_fail_existence_checks_without_raising() {
    let (engine, host) = engine_with(EngineConfig::default());
    let check = engine.parse("hassignal(Door.Position, Room.Temp) and hasaction(Alarm.Ring)").unwrap();
    assert!(check.test().unwrap());

    host.set_available("Alarm.Ring", false);
    assert!(!check.test().unwrap());
    let err = parse_error(engine.parse("Alarm.Ring()"));
    assert!(matches!(err.kind, ParsingErrorKind::BadState(_)));
}

#[test]
fn unset_signals_compare_only_with_equality() {
    let engine = engine();
    assert!(engine.parse("Room.Occupant == ''").unwrap().test().is_ok());
    assert!(engine.parse("Room.Occupant != 'Ada'").unwrap().test().unwrap());
}

#[test]
fn legacy_literals_are_remapped_and_strict_mode_rejects_unknown_options() {
    let engine = engine();
    let expr = engine.parse("Door.State == 'opened'").unwrap();
    assert_eq!(expr.canonical(), "Door.State == 'open'");
    assert!(expr.test().unwrap());

    let (strict, _) = engine_with(EngineConfig::new().with_strict_options(true));
    let err = parse_error(strict.parse("Door.State == 'ajar'"));
    assert_eq!(err.kind, ParsingErrorKind::Value);
    assert!(engine.parse("Door.State == 'ajar'").is_ok());
}

// =============================================================================
// Grammar markers and configuration
// =============================================================================

#[test]
fn markers_override_the_default_grammar() {
    let engine = engine();
    let expr = engine.parse("#!prefix (gt (sig Room.Temp) 20)").unwrap();
    assert_eq!(expr.grammar(), GrammarId::Prefix);
    assert!(expr.test().unwrap());

    let (prefix_engine, _) = engine_with(EngineConfig::new().with_default_grammar(GrammarId::Prefix));
    let expr = prefix_engine.parse("#!infix Room.Temp > 20").unwrap();
    assert_eq!(expr.grammar(), GrammarId::Infix);
}

#[test]
fn marker_errors_point_into_the_original_text() {
    let engine = engine();
    let err = parse_error(engine.parse("#!prefix (gt (sig Nope.Nothing) 1)"));
    let span = err.span.unwrap();
    assert_eq!(&"#!prefix (gt (sig Nope.Nothing) 1)"[span.start..span.end], "(sig Nope.Nothing)");
}

#[test]
fn conditions_and_actions_are_type_checked() {
    let engine = engine();
    let err = engine.parse_condition("Room.Temp + 1").unwrap_err();
    assert_eq!(err.render(&sigscript_core::lang::messages::EnglishCatalog), "condition must be boolean");

    let err = engine.parse_condition("1 < 2").unwrap_err();
    assert!(matches!(err, ScriptError::Localized(ref e) if e.key() == "error.condition_without_signal"));

    assert!(engine.parse_action("Room.Temp > 1").is_err());
}
