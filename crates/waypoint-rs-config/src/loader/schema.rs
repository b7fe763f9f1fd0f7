//! Structural checks for a single JSON5 config layer.
//!
//! Layers are partial, so every section is optional; what is present must
//! use known keys and the right JSON types.

use crate::ConfigError;
use serde_json::{Map, Value};
use waypoint_rs_protocol::{Domain, json_type_name};

/// Validate one layer (or the merged result) against the config schema.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    ensure_allowed_keys(map, &["$schema", "storage", "search", "tools"], layer, "")?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, layer, "$schema")?;
    }
    if let Some(value) = map.get("storage") {
        validate_storage(value, layer, "storage")?;
    }
    if let Some(value) = map.get("search") {
        validate_search(value, layer, "search")?;
    }
    if let Some(value) = map.get("tools") {
        validate_tools(value, layer, "tools")?;
    }
    Ok(())
}

fn validate_storage(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["root", "directories"], layer, path)?;

    if let Some(value) = map.get("root") {
        expect_string(value, layer, &join_path(path, "root"))?;
    }
    if let Some(value) = map.get("directories") {
        let dirs_path = join_path(path, "directories");
        let dirs = expect_object(value, layer, &dirs_path)?;
        for (key, dir) in dirs {
            let entry_path = join_path(&dirs_path, key);
            if key.parse::<Domain>().is_err() {
                return Err(invalid_field(layer, &entry_path, "unknown domain"));
            }
            expect_string(dir, layer, &entry_path)?;
        }
    }
    Ok(())
}

fn validate_search(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["default_max_results", "list_order"], layer, path)?;

    if let Some(value) = map.get("default_max_results") {
        expect_u64(value, layer, &join_path(path, "default_max_results"))?;
    }
    if let Some(value) = map.get("list_order") {
        let order_path = join_path(path, "list_order");
        match value.as_str() {
            Some("ascending" | "descending") => {}
            Some(_) => {
                return Err(invalid_field(
                    layer,
                    &order_path,
                    "expected \"ascending\" or \"descending\"",
                ));
            }
            None => return Err(invalid_field(layer, &order_path, "expected string")),
        }
    }
    Ok(())
}

fn validate_tools(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["output_policy"], layer, path)?;

    let Some(policy) = map.get("output_policy") else {
        return Ok(());
    };
    let policy_path = join_path(path, "output_policy");
    let policy = expect_object(policy, layer, &policy_path)?;
    ensure_allowed_keys(
        policy,
        &[
            "max_string_bytes",
            "max_array_len",
            "max_object_entries",
            "redact_keys",
            "redact_values",
            "replacement",
        ],
        layer,
        &policy_path,
    )?;
    for key in ["max_string_bytes", "max_array_len", "max_object_entries"] {
        if let Some(value) = policy.get(key) {
            expect_u64(value, layer, &join_path(&policy_path, key))?;
        }
    }
    for key in ["redact_keys", "redact_values"] {
        if let Some(value) = policy.get(key) {
            validate_string_array(value, layer, &join_path(&policy_path, key))?;
        }
    }
    if let Some(value) = policy.get("replacement") {
        expect_string(value, layer, &join_path(&policy_path, "replacement"))?;
    }
    Ok(())
}

fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    value.as_object().ok_or_else(|| {
        invalid_field(
            layer,
            path,
            &format!("expected object, got {}", json_type_name(value)),
        )
    })
}

fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    match value {
        Value::String(_) => Ok(()),
        other => Err(invalid_field(
            layer,
            path,
            &format!("expected string, got {}", json_type_name(other)),
        )),
    }
}

fn expect_u64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_u64() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected non-negative integer"))
    }
}

fn validate_string_array(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let Some(entries) = value.as_array() else {
        return Err(invalid_field(layer, path, "expected array"));
    };
    for (idx, entry) in entries.iter().enumerate() {
        expect_string(entry, layer, &format!("{path}[{idx}]"))?;
    }
    Ok(())
}

fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    match map.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(invalid_field(layer, &join_path(path, key), "unknown key")),
        None => Ok(()),
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Errors read as `{layer}:{path}`, with `root` for the top-level object.
fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{path}"),
        message: message.to_string(),
    }
}
