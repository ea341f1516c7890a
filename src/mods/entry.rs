//! Mod entries.
//!
//! A mod entry is a JSON object with a `type` tag and a `value` payload.
//! Entries are decoded once into [`ModEntry`] so the merge engine matches
//! on a tag instead of inspecting raw JSON.

use plistmods_tree::{Scalar, ScalarKind};
use serde_json::{Map, Value};

use super::key::ModKey;

/// A decoded mod entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ModEntry {
    /// `bool`, `integer`, `real`, `string`, `date` or `data`.
    Scalar(Scalar),
    /// `array`: items are applied as keyless elements.
    Array(Vec<ModEntry>),
    /// `dict`: keyed items in document order.
    Dict(Vec<(ModKey, ModEntry)>),
    /// A `type` this version does not know. Applying it is a no-op.
    Unknown(String),
    /// Entry that cannot be applied, with the reason.
    Malformed(String),
    /// Payload under a deletion key; never looked at.
    Ignored,
}

impl ModEntry {
    /// Decode one entry.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return ModEntry::Malformed(format!("entry must be an object, got {}", json_kind(value)));
        };

        let payload = obj.get("value").filter(|v| !v.is_null());
        let tag = match obj.get("type") {
            Some(Value::String(tag)) => tag.as_str(),
            Some(other) => {
                return ModEntry::Malformed(format!(
                    "'type' must be a string, got {}",
                    json_kind(other)
                ))
            }
            None if payload.is_none() => {
                return ModEntry::Malformed("entry has neither 'type' nor 'value'".to_string())
            }
            None => return ModEntry::Malformed("entry has no 'type'".to_string()),
        };

        match tag {
            "array" => match payload {
                None => ModEntry::Array(Vec::new()),
                Some(Value::Array(items)) => {
                    ModEntry::Array(items.iter().map(ModEntry::from_value).collect())
                }
                Some(other) => ModEntry::Malformed(format!(
                    "'array' value must be an array, got {}",
                    json_kind(other)
                )),
            },
            "dict" => match payload {
                None => ModEntry::Dict(Vec::new()),
                Some(Value::Object(items)) => ModEntry::Dict(decode_items(items)),
                Some(other) => ModEntry::Malformed(format!(
                    "'dict' value must be an object, got {}",
                    json_kind(other)
                )),
            },
            other => match ScalarKind::from_tag(other) {
                Some(kind) => decode_scalar(kind, payload),
                None => ModEntry::Unknown(other.to_string()),
            },
        }
    }

    /// The `type` tag this entry was decoded from, where one applies.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            ModEntry::Scalar(s) => Some(s.kind().as_str()),
            ModEntry::Array(_) => Some("array"),
            ModEntry::Dict(_) => Some("dict"),
            ModEntry::Unknown(tag) => Some(tag),
            ModEntry::Malformed(_) | ModEntry::Ignored => None,
        }
    }
}

/// Decode keyed items in document order.
pub(crate) fn decode_items(items: &Map<String, Value>) -> Vec<(ModKey, ModEntry)> {
    items
        .iter()
        .map(|(raw, value)| {
            let key = ModKey::parse(raw);
            let entry = if key.is_delete() {
                ModEntry::Ignored
            } else {
                ModEntry::from_value(value)
            };
            (key, entry)
        })
        .collect()
}

fn decode_scalar(kind: ScalarKind, payload: Option<&Value>) -> ModEntry {
    let Some(value) = payload else {
        return ModEntry::Scalar(Scalar::Void(kind));
    };

    let scalar = match (kind, value) {
        (ScalarKind::Bool, Value::Bool(b)) => Some(Scalar::Bool(*b)),
        (ScalarKind::Bool, Value::String(s)) => match s.as_str() {
            "true" => Some(Scalar::Bool(true)),
            "false" => Some(Scalar::Bool(false)),
            _ => None,
        },
        (ScalarKind::Integer, Value::Number(n)) if n.is_i64() || n.is_u64() => {
            Some(Scalar::Integer(n.to_string()))
        }
        (ScalarKind::Integer, Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .ok()
            .map(|i| Scalar::Integer(i.to_string())),
        (ScalarKind::Real, Value::Number(n)) => Some(Scalar::Real(n.to_string())),
        (ScalarKind::Real, Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|_| Scalar::Real(s.trim().to_string())),
        (ScalarKind::String | ScalarKind::Date | ScalarKind::Data, Value::String(s)) => {
            Scalar::from_text(kind, s.clone())
        }
        (ScalarKind::String | ScalarKind::Date | ScalarKind::Data, Value::Number(n)) => {
            Scalar::from_text(kind, n.to_string())
        }
        (ScalarKind::String | ScalarKind::Date | ScalarKind::Data, Value::Bool(b)) => {
            Scalar::from_text(kind, b.to_string())
        }
        _ => None,
    };

    match scalar {
        Some(scalar) => ModEntry::Scalar(scalar),
        None => ModEntry::Malformed(format!(
            "'{}' value cannot be {}",
            kind,
            describe(value)
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Bool(_) | Value::Number(_) | Value::String(_) => format!("{}", value),
        other => json_kind(other).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_kinds() {
        let cases = vec![
            (json!({"type": "bool", "value": true}), Scalar::Bool(true)),
            (json!({"type": "bool", "value": "false"}), Scalar::Bool(false)),
            (json!({"type": "integer", "value": 42}), Scalar::Integer("42".to_string())),
            (json!({"type": "integer", "value": " -7 "}), Scalar::Integer("-7".to_string())),
            (json!({"type": "real", "value": 1.5}), Scalar::Real("1.5".to_string())),
            (json!({"type": "real", "value": "2.25"}), Scalar::Real("2.25".to_string())),
            (json!({"type": "string", "value": "hi"}), Scalar::String("hi".to_string())),
            (json!({"type": "string", "value": 3}), Scalar::String("3".to_string())),
            (
                json!({"type": "date", "value": "2024-01-01T00:00:00Z"}),
                Scalar::Date("2024-01-01T00:00:00Z".to_string()),
            ),
            (json!({"type": "data", "value": "AAEC"}), Scalar::Data("AAEC".to_string())),
        ];

        for (value, expected) in cases {
            assert_eq!(ModEntry::from_value(&value), ModEntry::Scalar(expected), "{}", value);
        }
    }

    #[test]
    fn test_missing_value_is_void() {
        let entry = ModEntry::from_value(&json!({"type": "string"}));
        assert_eq!(entry, ModEntry::Scalar(Scalar::Void(ScalarKind::String)));

        let entry = ModEntry::from_value(&json!({"type": "integer", "value": null}));
        assert_eq!(entry, ModEntry::Scalar(Scalar::Void(ScalarKind::Integer)));
    }

    #[test]
    fn test_missing_value_containers_are_empty() {
        assert_eq!(ModEntry::from_value(&json!({"type": "array"})), ModEntry::Array(vec![]));
        assert_eq!(ModEntry::from_value(&json!({"type": "dict"})), ModEntry::Dict(vec![]));
    }

    #[test]
    fn test_malformed_entries() {
        for value in [
            json!({}),
            json!({"value": "x"}),
            json!({"type": 1, "value": "x"}),
            json!("bare string"),
            json!({"type": "integer", "value": 1.5}),
            json!({"type": "integer", "value": "ten"}),
            json!({"type": "bool", "value": 1}),
            json!({"type": "string", "value": ["x"]}),
            json!({"type": "array", "value": {"a": 1}}),
            json!({"type": "dict", "value": [1]}),
        ] {
            assert!(
                matches!(ModEntry::from_value(&value), ModEntry::Malformed(_)),
                "expected malformed: {}",
                value
            );
        }
    }

    #[test]
    fn test_neither_type_nor_value_message() {
        match ModEntry::from_value(&json!({})) {
            ModEntry::Malformed(reason) => assert!(reason.contains("neither")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type() {
        let entry = ModEntry::from_value(&json!({"type": "frobnicate", "value": 1}));
        assert_eq!(entry, ModEntry::Unknown("frobnicate".to_string()));
        assert_eq!(entry.type_name(), Some("frobnicate"));
    }

    #[test]
    fn test_nested_decode_preserves_order() {
        let entry = ModEntry::from_value(&json!({
            "type": "dict",
            "value": {
                "Zeta": {"type": "string", "value": "z"},
                "-Alpha": {},
                "Mid": {"type": "array", "value": [{"type": "bool", "value": true}]}
            }
        }));

        let ModEntry::Dict(items) = entry else {
            panic!("expected dict");
        };
        let keys: Vec<String> = items.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["Zeta", "-Alpha", "Mid"]);
        assert_eq!(items[1].1, ModEntry::Ignored);
        assert_eq!(
            items[2].1,
            ModEntry::Array(vec![ModEntry::Scalar(Scalar::Bool(true))])
        );
    }
}
