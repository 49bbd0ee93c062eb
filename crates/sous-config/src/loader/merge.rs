//! JSON merge for layered configuration.

use serde_json::Value;

/// Merge `overlay` into `base`. Objects merge key by key; any other value,
/// arrays included, replaces what was there.
pub(super) fn merge_json_values(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge_json_values(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::merge_json_values;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn nested_objects_merge_and_arrays_replace() {
        let mut base = json!({
            "model": { "name": "llama3.1", "timeout_secs": 120 },
            "tool_host": { "args": ["tool-server", "--verbose"] }
        });
        merge_json_values(
            &mut base,
            &json!({
                "model": { "name": "qwen2.5" },
                "tool_host": { "args": ["serve"] }
            }),
        );
        assert_eq!(
            base,
            json!({
                "model": { "name": "qwen2.5", "timeout_secs": 120 },
                "tool_host": { "args": ["serve"] }
            })
        );
    }
}
