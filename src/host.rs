//! JSON host fixtures.
//!
//! A fixture describes a host's signals, actions and properties so the CLI and integration tests can run
//! expressions without a live host:
//!
//! ```json
//! {
//!   "signals": [
//!     { "name": "Door.Position", "type": "number", "value": 40, "display": "door position", "range": [0, 100] },
//!     { "name": "Door.State", "type": "string", "value": "open",
//!       "options": ["open", "closed"], "legacy": { "opened": "open" } }
//!   ],
//!   "actions": [
//!     { "name": "Door.Move", "format": "move the door to {0}",
//!       "arguments": [{ "name": "position", "type": "number", "range": [0, 100] }] }
//!   ],
//!   "properties": [
//!     { "reference": "Foobar.numList", "type": "number", "shape": "sequence", "value": [1, 2] }
//!   ],
//!   "unavailable": []
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use sigscript_core::capabilities::{
    ActionDefinition, ArgumentDefinition, PropertyDefinition, PropertyShape, PropertyValue, SignalDefinition,
    Validator,
};
use sigscript_core::static_registry::StaticRegistry;
use sigscript_core::value::{self, ScriptValue, ValueType};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("cannot read host fixture {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid host fixture: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostFixture {
    #[serde(default)]
    pub signals: Vec<SignalSpec>,
    #[serde(default)]
    pub actions: Vec<ActionSpec>,
    #[serde(default)]
    pub properties: Vec<PropertySpec>,
    /// Names registered but switched off in this context.
    #[serde(default)]
    pub unavailable: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignalSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default)]
    pub value: serde_json::Value,
    pub display: Option<String>,
    /// Inclusive whole-unit bounds.
    pub range: Option<(i64, i64)>,
    pub options: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub legacy: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArgumentSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub range: Option<(i64, i64)>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionSpec {
    pub name: String,
    pub display: Option<String>,
    pub format: Option<String>,
    #[serde(default)]
    pub arguments: Vec<ArgumentSpec>,
    pub variadic: Option<ArgumentSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertySpec {
    pub reference: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    #[serde(default = "scalar_shape")]
    pub shape: PropertyShape,
    #[serde(default)]
    pub value: serde_json::Value,
    pub display: Option<String>,
}

fn scalar_shape() -> PropertyShape {
    PropertyShape::Scalar
}

impl HostFixture {
    pub fn from_json(text: &str) -> Result<Self, HostError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, HostError> {
        let text = fs::read_to_string(path).map_err(|source| HostError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Build the in-memory registry this fixture describes.
    pub fn into_registry(self) -> Result<StaticRegistry, HostError> {
        let registry = StaticRegistry::new();

        for spec in self.signals {
            let mut definition = SignalDefinition::new(&spec.name, spec.value_type);
            if let Some(display) = spec.display {
                definition = definition.with_display_name(display);
            }
            if let Some((min, max)) = spec.range {
                definition = definition.with_validator(Validator::range(min, max));
            }
            if let Some(options) = &spec.options {
                let options = options
                    .iter()
                    .map(|v| script_value(&spec.name, v))
                    .collect::<Result<Vec<_>, _>>()?;
                definition = definition.with_options(options);
            }
            for (legacy, canonical) in &spec.legacy {
                definition = definition.with_legacy(ScriptValue::string(legacy), script_value(&spec.name, canonical)?);
            }
            let value = script_value(&spec.name, &spec.value)?;
            registry.add_signal(definition, value);
        }

        for spec in self.actions {
            let mut definition = ActionDefinition::new(&spec.name);
            if let Some(display) = spec.display {
                definition = definition.with_display_name(display);
            }
            if let Some(format) = spec.format {
                definition = definition.with_format(format);
            }
            for argument in spec.arguments {
                definition = definition.with_argument(argument_definition(argument));
            }
            if let Some(variadic) = spec.variadic {
                definition = definition.with_variadic(argument_definition(variadic));
            }
            registry.add_action(definition, None);
        }

        for spec in self.properties {
            let mut definition = PropertyDefinition::new(&spec.reference, spec.value_type, spec.shape);
            if let Some(display) = spec.display {
                definition = definition.with_display_name(display);
            }
            let value = property_value(&spec.reference, spec.shape, &spec.value)?;
            registry.add_property(definition, value);
        }

        for name in &self.unavailable {
            registry.set_available(name, false);
        }
        tracing::debug!(
            signals = registry.signal_names().len(),
            actions = registry.action_names().len(),
            "host fixture loaded"
        );
        Ok(registry)
    }
}

fn argument_definition(spec: ArgumentSpec) -> ArgumentDefinition {
    let definition = ArgumentDefinition::new(spec.name, spec.value_type);
    match spec.range {
        Some((min, max)) => definition.with_validator(Validator::range(min, max)),
        None => definition,
    }
}

/// JSON numbers keep two decimals; `null` is `Unset`.
fn script_value(name: &str, json: &serde_json::Value) -> Result<ScriptValue, HostError> {
    let invalid = |reason: &str| HostError::InvalidValue {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    match json {
        serde_json::Value::Null => Ok(ScriptValue::Unset),
        serde_json::Value::String(s) => Ok(ScriptValue::string(s)),
        serde_json::Value::Number(n) => {
            value::parse_scaled(&n.to_string())
                .map(ScriptValue::Number)
                .ok_or_else(|| invalid("number out of range"))
        }
        _ => Err(invalid("expected a string, a number or null")),
    }
}

fn property_value(name: &str, shape: PropertyShape, json: &serde_json::Value) -> Result<PropertyValue, HostError> {
    let elements = || -> Result<Vec<ScriptValue>, HostError> {
        match json {
            serde_json::Value::Array(items) => items.iter().map(|item| script_value(name, item)).collect(),
            serde_json::Value::Null => Ok(Vec::new()),
            _ => Err(HostError::InvalidValue {
                name: name.to_string(),
                reason: "expected an array".to_string(),
            }),
        }
    };
    Ok(match shape {
        PropertyShape::Scalar => PropertyValue::Scalar(script_value(name, json)?),
        PropertyShape::Sequence => PropertyValue::Sequence(elements()?),
        PropertyShape::Unordered => PropertyValue::Unordered(elements()?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigscript_core::capabilities::CapabilityRegistry;

    const FIXTURE: &str = r#"{
        "signals": [
            { "name": "Door.Position", "type": "number", "value": 40.5, "range": [0, 100] },
            { "name": "Door.State", "type": "string", "value": "open",
              "options": ["open", "closed"], "legacy": { "opened": "open" } },
            { "name": "Door.Lock", "type": "string" }
        ],
        "actions": [
            { "name": "Door.Move", "arguments": [{ "name": "position", "type": "number" }] }
        ],
        "properties": [
            { "reference": "Foobar.numList", "type": "number", "shape": "sequence", "value": [1, 2] }
        ],
        "unavailable": ["Door.Lock"]
    }"#;

    #[test]
    fn test_fixture_builds_registry() {
        let registry = HostFixture::from_json(FIXTURE).unwrap().into_registry().unwrap();
        let read = registry.signal_source("Door.Position").unwrap();
        assert_eq!(read().unwrap(), ScriptValue::Number(4050));

        let state = registry.signal_definition("Door.State").unwrap();
        assert_eq!(state.remap_legacy(&ScriptValue::string("opened")), Some(&ScriptValue::string("open")));
        assert!(!registry.has_signal("Door.Lock"));
        assert_eq!(registry.action_definition("Door.Move").unwrap().arguments.len(), 1);
        assert!(registry.property_source("Foobar.numList").is_ok());
    }

    #[test]
    fn test_rejects_unknown_fields_and_bad_values() {
        assert!(matches!(HostFixture::from_json(r#"{ "signal": [] }"#), Err(HostError::Json(_))));
        let fixture = HostFixture::from_json(r#"{ "signals": [{ "name": "A", "type": "number", "value": [1] }] }"#)
            .unwrap();
        let Err(err) = fixture.into_registry() else {
            panic!("a list is not a signal value");
        };
        assert_eq!(err.to_string(), "invalid value for A: expected a string, a number or null");
    }
}
