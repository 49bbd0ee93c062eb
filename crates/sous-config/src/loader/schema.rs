//! Schema validation for Sous JSON5 configuration.
//!
//! Serde would silently ignore misspelled keys, so every layer is checked
//! here before merging.

use crate::ConfigError;
use serde_json::{Map, Value};

/// Validate a single config layer against the schema.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    let allowed = [
        "$schema",
        "model",
        "orchestrator",
        "tool_host",
        "store",
        "server",
    ];
    ensure_allowed_keys(map, &allowed, layer, "")?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, layer, "$schema")?;
    }
    if let Some(value) = map.get("model") {
        validate_model(value, layer, "model")?;
    }
    if let Some(value) = map.get("orchestrator") {
        validate_orchestrator(value, layer, "orchestrator")?;
    }
    if let Some(value) = map.get("tool_host") {
        validate_tool_host(value, layer, "tool_host")?;
    }
    if let Some(value) = map.get("store") {
        let map = expect_object(value, layer, "store")?;
        ensure_allowed_keys(map, &["path"], layer, "store")?;
        if let Some(value) = map.get("path") {
            expect_string(value, layer, "store.path")?;
        }
    }
    if let Some(value) = map.get("server") {
        validate_server(value, layer, "server")?;
    }
    Ok(())
}

/// Validate the "model" block.
fn validate_model(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["name", "endpoint", "timeout_secs"], layer, path)?;
    if let Some(value) = map.get("name") {
        expect_string(value, layer, &join_path(path, "name"))?;
    }
    if let Some(value) = map.get("endpoint") {
        let endpoint_path = join_path(path, "endpoint");
        expect_string(value, layer, &endpoint_path)?;
        let endpoint = value.as_str().unwrap_or_default();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(invalid_field(layer, &endpoint_path, "expected http(s) url"));
        }
    }
    if let Some(value) = map.get("timeout_secs") {
        expect_u64(value, layer, &join_path(path, "timeout_secs"))?;
    }
    Ok(())
}

/// Validate the "orchestrator" block.
fn validate_orchestrator(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &["max_steps", "system_prompt", "append_system_prompt"],
        layer,
        path,
    )?;
    if let Some(value) = map.get("max_steps") {
        expect_u64(value, layer, &join_path(path, "max_steps"))?;
    }
    if let Some(value) = map.get("system_prompt") {
        expect_string(value, layer, &join_path(path, "system_prompt"))?;
    }
    if let Some(value) = map.get("append_system_prompt") {
        expect_string(value, layer, &join_path(path, "append_system_prompt"))?;
    }
    Ok(())
}

/// Validate the "tool_host" block.
fn validate_tool_host(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &["command", "args", "env", "cwd", "timeout_secs"],
        layer,
        path,
    )?;
    if let Some(value) = map.get("command") {
        expect_string(value, layer, &join_path(path, "command"))?;
    }
    if let Some(value) = map.get("args") {
        validate_string_array(value, layer, &join_path(path, "args"))?;
    }
    if let Some(value) = map.get("env") {
        let env_path = join_path(path, "env");
        let env = expect_object(value, layer, &env_path)?;
        for (key, value) in env {
            expect_string(value, layer, &join_path(&env_path, key))?;
        }
    }
    if let Some(value) = map.get("cwd") {
        expect_string(value, layer, &join_path(path, "cwd"))?;
    }
    if let Some(value) = map.get("timeout_secs") {
        expect_u64(value, layer, &join_path(path, "timeout_secs"))?;
    }
    Ok(())
}

/// Validate the "server" block.
fn validate_server(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["bind", "frontend_dir"], layer, path)?;
    if let Some(value) = map.get("bind") {
        expect_string(value, layer, &join_path(path, "bind"))?;
    }
    if let Some(value) = map.get("frontend_dir") {
        expect_string(value, layer, &join_path(path, "frontend_dir"))?;
    }
    Ok(())
}

fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_field(layer, path, "expected object")),
    }
}

fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_string() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected string"))
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
    let Value::Array(entries) = value else {
        return Err(invalid_field(layer, path, "expected array"));
    };
    for (idx, entry) in entries.iter().enumerate() {
        if !entry.is_string() {
            return Err(invalid_field(
                layer,
                &format!("{path}[{idx}]"),
                "expected string",
            ));
        }
    }
    Ok(())
}

/// Ensure an object contains only allowed keys.
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

fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    ConfigError::Schema {
        layer: layer.to_string(),
        key: if path.is_empty() { "root" } else { path }.to_string(),
        reason: message.to_string(),
    }
}
