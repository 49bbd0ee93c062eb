//! Normalize raw tool-call arguments into a keyed argument set.
//!
//! Backends emit arguments as an object, as a JSON-encoded string, as
//! nothing at all, or occasionally as a list of `[key, value]` pairs.

use serde_json::{Map, Value};
use sous_protocol::ToolArguments;
use thiserror::Error;

/// Raw arguments that cannot be turned into a keyed set.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MalformedArguments {
    /// A string payload that is not valid JSON.
    #[error("arguments string is not valid JSON: {0}")]
    InvalidJson(String),
    /// A string payload that decodes to something other than an object.
    #[error("arguments string decodes to {0}, expected an object")]
    NotAnObject(&'static str),
    /// A payload shape with no keyed interpretation.
    #[error("unsupported arguments shape: {0}")]
    UnsupportedShape(&'static str),
}

/// Turn a raw payload into a keyed argument set.
///
/// - `null` yields an empty set;
/// - an object is returned unchanged;
/// - a string is decoded as JSON and must yield an object (or `null`);
/// - an array of `[key, value]` pairs with string keys becomes a keyed set,
///   later duplicates overriding earlier ones.
///
/// Every other shape is rejected. Fields are never dropped, and applying
/// the function to its own output returns that output.
pub fn normalize_arguments(raw: &Value) -> Result<ToolArguments, MalformedArguments> {
    match raw {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map.clone()),
        Value::String(encoded) => decode_string(encoded),
        Value::Array(entries) => pairs_to_map(entries),
        other => Err(MalformedArguments::UnsupportedShape(kind(other))),
    }
}

fn decode_string(encoded: &str) -> Result<ToolArguments, MalformedArguments> {
    let decoded: Value = serde_json::from_str(encoded)
        .map_err(|err| MalformedArguments::InvalidJson(err.to_string()))?;
    match decoded {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(MalformedArguments::NotAnObject(kind(&other))),
    }
}

fn pairs_to_map(entries: &[Value]) -> Result<ToolArguments, MalformedArguments> {
    let mut map = Map::new();
    for entry in entries {
        match entry {
            Value::Array(pair) if pair.len() == 2 => match &pair[0] {
                Value::String(key) => {
                    map.insert(key.clone(), pair[1].clone());
                }
                _ => return Err(MalformedArguments::UnsupportedShape("pair with non-string key")),
            },
            _ => return Err(MalformedArguments::UnsupportedShape("array")),
        }
    }
    Ok(map)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::{MalformedArguments, normalize_arguments};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn object(value: Value) -> serde_json::Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn null_is_empty() {
        assert!(normalize_arguments(&json!(null)).expect("args").is_empty());
    }

    #[test]
    fn object_passes_through_and_is_idempotent() {
        let raw = json!({ "item": { "name": "milk", "qty": 2 }, "note": null });
        let once = normalize_arguments(&raw).expect("args");
        assert_eq!(once, object(raw));
        let twice = normalize_arguments(&Value::Object(once.clone())).expect("args");
        assert_eq!(twice, once);
    }

    #[test]
    fn encoded_string_decodes_to_object() {
        let raw = json!("{\"item\":{\"name\":\"milk\"}}");
        assert_eq!(
            normalize_arguments(&raw).expect("args"),
            object(json!({ "item": { "name": "milk" } }))
        );
    }

    #[test]
    fn encoded_null_is_empty() {
        assert!(normalize_arguments(&json!("null")).expect("args").is_empty());
    }

    #[test]
    fn bad_strings_are_malformed() {
        assert!(matches!(
            normalize_arguments(&json!("{not json")),
            Err(MalformedArguments::InvalidJson(_))
        ));
        assert!(matches!(
            normalize_arguments(&json!("")),
            Err(MalformedArguments::InvalidJson(_))
        ));
        assert_eq!(
            normalize_arguments(&json!("[1, 2]")),
            Err(MalformedArguments::NotAnObject("array"))
        );
    }

    #[test]
    fn key_value_pairs_become_keyed_set() {
        let raw = json!([["query", "lentil"], ["tag", "vegan"], ["query", "pasta"]]);
        assert_eq!(
            normalize_arguments(&raw).expect("args"),
            object(json!({ "query": "pasta", "tag": "vegan" }))
        );
    }

    #[test]
    fn scalars_and_loose_arrays_are_rejected() {
        assert_eq!(
            normalize_arguments(&json!(7)),
            Err(MalformedArguments::UnsupportedShape("number"))
        );
        assert!(normalize_arguments(&json!(["query"])).is_err());
        assert!(normalize_arguments(&json!([[1, "x"]])).is_err());
    }
}
