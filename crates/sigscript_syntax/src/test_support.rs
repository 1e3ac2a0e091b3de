//! Sample host used by unit tests across the crate.

use sigscript_core::capabilities::{
    ActionDefinition, ArgumentDefinition, PropertyDefinition, PropertyShape, PropertyValue, SharedRegistry,
    SignalDefinition, Validator,
};
use sigscript_core::static_registry::StaticRegistry;
use sigscript_core::value::{ScriptValue, ValueType};

use crate::build::ParseContext;

pub fn static_registry() -> StaticRegistry {
    StaticRegistry::new()
        .with_signal(
            SignalDefinition::new("Door.Position", ValueType::Number)
                .with_display_name("door position")
                .with_validator(Validator::range(0, 100)),
            ScriptValue::from_int(50),
        )
        .with_signal(
            SignalDefinition::new("Door.State", ValueType::String)
                .with_display_name("door state")
                .with_options(vec![ScriptValue::string("open"), ScriptValue::string("closed")])
                .with_legacy(ScriptValue::string("opened"), ScriptValue::string("open")),
            ScriptValue::string("open"),
        )
        .with_signal(SignalDefinition::new("Room.Temp", ValueType::Number), ScriptValue::Number(2150))
        .with_signal(SignalDefinition::new("Room.Name", ValueType::String), ScriptValue::string("Lab"))
        .with_action(
            ActionDefinition::new("Door.Move")
                .with_display_name("move door")
                .with_argument(
                    ArgumentDefinition::new("position", ValueType::Number).with_validator(Validator::range(0, 100)),
                )
                .with_format("move the door to {0}"),
        )
        .with_action(
            ActionDefinition::new("Log.Write")
                .with_argument(ArgumentDefinition::new("level", ValueType::Number))
                .with_variadic(ArgumentDefinition::new("part", ValueType::String)),
        )
        .with_action(ActionDefinition::new("Alarm.Ring"))
        .with_property(
            PropertyDefinition::new("Foobar.numList", ValueType::Number, PropertyShape::Sequence),
            PropertyValue::Sequence(vec![ScriptValue::from_int(1), ScriptValue::from_int(2)]),
        )
        .with_property(
            PropertyDefinition::new("Foobar.names", ValueType::String, PropertyShape::Unordered),
            PropertyValue::Unordered(vec![ScriptValue::string("b"), ScriptValue::string("a")]),
        )
        .with_property(
            PropertyDefinition::new("Foobar.count", ValueType::Number, PropertyShape::Scalar),
            PropertyValue::Scalar(ScriptValue::from_int(3)),
        )
}

pub fn registry() -> SharedRegistry {
    static_registry().shared()
}

pub fn ctx() -> ParseContext {
    ParseContext::new(registry())
}
