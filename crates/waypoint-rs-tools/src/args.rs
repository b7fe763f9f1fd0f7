//! Argument parsing shared by the domain tools.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use waypoint_rs_protocol::ToolError;

/// Parse JSON args into a typed struct.
pub(crate) fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    let args = match args {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    serde_json::from_value(args).map_err(|err| ToolError::InvalidArguments(err.to_string()))
}

/// Schema fragment for the `search_id` argument.
pub(crate) fn search_id_property(domain_noun: &str) -> Value {
    json!({
        "type": "string",
        "description": format!("Search id returned by the {domain_noun} search tool"),
    })
}

/// Object schema with the given properties; `required` names must be present.
pub(crate) fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

pub(crate) fn number_property(description: &str) -> Value {
    json!({"type": "number", "description": description})
}

pub(crate) fn string_list_property(description: &str) -> Value {
    json!({
        "type": "array",
        "items": {"type": "string"},
        "minItems": 1,
        "description": description,
    })
}

/// Drop nulls so `filters_applied` echoes only what the caller set.
pub(crate) fn applied(entries: Value) -> Value {
    match entries {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, value)| !value.is_null())
                .collect(),
        ),
        other => other,
    }
}
