//! Cross-grammar translation: infix -> prefix -> infix keeps structure and meaning.

use sigscript::{Engine, EngineConfig, HostFixture};
use sigscript_core::lang::grammars::GrammarId;

fn engine() -> Engine {
    let host = HostFixture::from_json(include_str!("fixtures/door_host.json"))
        .and_then(HostFixture::into_registry)
        .unwrap();
    Engine::new(host.shared(), EngineConfig::default())
}

const SOURCES: &[&str] = &[
    "1 - 2 - 3 == -4",
    "1 - (2 - 3) == 2",
    "(1 + 2) * 3 == 9",
    "Door.Position * 2 + 1 > 100 or not Door.State == 'closed'",
    "not (Door.Position > 10 and Room.Temp < 30)",
    "-(Door.Position - 60) == 10",
    "min(Door.Position, 80, Room.Temp) == Room.Temp",
    "round(Room.Temp) % 4 == 2",
    "concat(Room.Name, ' ', Door.State) == 'Lab open'",
    "getnum('Foobar.numList', 0) + getlen('Foobar.names') == 3",
    "getstr('Foobar.names', 0) == 'a'",
    "hassignal(Door.Position, Room.Name) and hasaction(Door.Move)",
    "Room.Name == 'it\\'s'",
];

#[test]
fn infix_survives_a_trip_through_prefix() {
    let engine = engine();
    for source in SOURCES {
        let expr = engine.parse(source).unwrap_or_else(|e| panic!("{source}: {e}"));
        let prefix = engine.decompile(&expr, GrammarId::Prefix);
        let reparsed = engine
            .parse_with(&prefix, GrammarId::Prefix)
            .unwrap_or_else(|e| panic!("{prefix}: {e}"));

        assert_eq!(engine.decompile(&reparsed, GrammarId::Infix), expr.canonical(), "{source}");
        assert_eq!(engine.decompile(&reparsed, GrammarId::Prefix), prefix, "{source}");
        assert_eq!(reparsed.test().ok(), expr.test().ok(), "{source}");
    }
}

#[test]
fn canonical_text_is_a_fixed_point() {
    let engine = engine();
    for source in SOURCES {
        let once = engine.canonicalize(source).unwrap();
        let twice = engine.canonicalize(&once).unwrap();
        assert_eq!(once, twice, "{source}");
    }
}

#[test]
fn macro_openers_inside_text_stay_text() {
    let engine = engine();
    for source in [r"Room.Name == '{\% 7 %}'", r"Room.Name == '{\% 1 > 2 %}'", r"concat('{', '\%', Room.Name) == '{\%Lab'"] {
        let expr = engine.parse(source).unwrap_or_else(|e| panic!("{source}: {e}"));
        let canonical = expr.canonical();
        let reparsed = engine.parse(&canonical).unwrap_or_else(|e| panic!("{canonical}: {e}"));
        assert_eq!(reparsed.canonical(), canonical, "{source}");
        assert_eq!(reparsed.test().ok(), expr.test().ok(), "{source}");

        let prefix = engine.decompile(&expr, GrammarId::Prefix);
        let from_prefix = engine
            .parse_with(&prefix, GrammarId::Prefix)
            .unwrap_or_else(|e| panic!("{prefix}: {e}"));
        assert_eq!(engine.decompile(&from_prefix, GrammarId::Infix), canonical, "{source}");
    }

    let expr = engine.parse(r"Room.Name == '{\% 7 %}'").unwrap();
    insta::assert_snapshot!(expr.canonical(), @r"Room.Name == '{\% 7 %}'");
    assert_eq!(expr.test().ok(), Some(false));
}

#[test]
fn prefix_translations() {
    let engine = engine();
    let prefix = |source: &str| engine.decompile(&engine.parse(source).unwrap(), GrammarId::Prefix);

    insta::assert_snapshot!(prefix("1 - 2 - 3 == -4"), @"(eq (sub (sub 1 2) 3) -4)");
    insta::assert_snapshot!(
        prefix("Door.Position >= 1 and Door.Position <= 2 or Door.Position == 3"),
        @"(or (and (ge (sig Door.Position) 1) (le (sig Door.Position) 2)) (eq (sig Door.Position) 3))"
    );
    insta::assert_snapshot!(prefix("Door.Move(Door.Position + 5)"), @"(act Door.Move (add (sig Door.Position) 5))");
    insta::assert_snapshot!(prefix("Alarm.Ring.once()"), @"(act Alarm.Ring.once)");
}

#[test]
fn infix_translations() {
    let engine = engine();
    let infix = |source: &str| {
        let expr = engine.parse_with(source, GrammarId::Prefix).unwrap();
        engine.decompile(&expr, GrammarId::Infix)
    };

    insta::assert_snapshot!(infix("(mul (add 1 2) 3)"), @"(1 + 2) * 3");
    insta::assert_snapshot!(infix("(sub 1 (sub 2 3))"), @"1 - (2 - 3)");
    insta::assert_snapshot!(infix("(and (or (eq 1 1) (eq 2 3)) (not (eq 1 2)))"), @"(1 == 1 or 2 == 3) and not 1 == 2");
    insta::assert_snapshot!(infix("(?sig Door.Position Room.Temp)"), @"hassignal(Door.Position, Room.Temp)");
}
