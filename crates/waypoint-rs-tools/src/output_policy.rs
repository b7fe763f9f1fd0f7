//! Redaction and truncation applied to tool results.
//!
//! Vendor payloads echo request details (and sometimes account data) back
//! verbatim, so every tool result passes through this policy before it
//! leaves a domain server.

use serde_json::{Map, Value};
use waypoint_rs_config::ToolOutputPolicyConfig;

/// Limits and redaction rules for tool output.
#[derive(Debug, Clone)]
pub struct ToolOutputPolicy {
    /// Maximum size of a string value in bytes.
    pub max_string_bytes: usize,
    pub max_array_len: usize,
    pub max_object_entries: usize,
    /// Object keys whose values are replaced (case-insensitive).
    pub redact_keys: Vec<String>,
    /// Substrings that cause a whole string value to be replaced (case-insensitive).
    pub redact_values: Vec<String>,
    pub replacement: String,
}

impl Default for ToolOutputPolicy {
    fn default() -> Self {
        Self::from(&ToolOutputPolicyConfig::default())
    }
}

impl From<&ToolOutputPolicyConfig> for ToolOutputPolicy {
    fn from(config: &ToolOutputPolicyConfig) -> Self {
        Self {
            max_string_bytes: config.max_string_bytes,
            max_array_len: config.max_array_len,
            max_object_entries: config.max_object_entries,
            redact_keys: config.redact_keys.clone(),
            redact_values: config
                .redact_values
                .iter()
                .filter(|pattern| !pattern.is_empty())
                .map(|pattern| pattern.to_lowercase())
                .collect(),
            replacement: config.replacement.clone(),
        }
    }
}

impl ToolOutputPolicy {
    pub fn apply(&self, value: Value) -> Value {
        match value {
            Value::String(text) => Value::String(self.apply_string(text)),
            Value::Array(values) => Value::Array(
                values
                    .into_iter()
                    .take(self.max_array_len)
                    .map(|value| self.apply(value))
                    .collect(),
            ),
            Value::Object(entries) => {
                let mut kept = Map::new();
                for (key, value) in entries.into_iter().take(self.max_object_entries) {
                    let value = if self.redacts_key(&key) {
                        Value::String(self.replacement())
                    } else {
                        self.apply(value)
                    };
                    kept.insert(key, value);
                }
                Value::Object(kept)
            }
            other => other,
        }
    }

    fn apply_string(&self, text: String) -> String {
        if self.redacts_value(&text) {
            self.replacement()
        } else {
            truncate(text, self.max_string_bytes)
        }
    }

    fn replacement(&self) -> String {
        truncate(self.replacement.clone(), self.max_string_bytes)
    }

    fn redacts_key(&self, key: &str) -> bool {
        self.redact_keys
            .iter()
            .any(|entry| entry.eq_ignore_ascii_case(key))
    }

    fn redacts_value(&self, text: &str) -> bool {
        if self.redact_values.is_empty() {
            return false;
        }
        let lowered = text.to_lowercase();
        self.redact_values
            .iter()
            .any(|pattern| lowered.contains(&pattern.to_lowercase()))
    }
}

/// Cut a string to at most `max_bytes` without splitting a character.
fn truncate(mut text: String, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text;
    }
    let end = text
        .char_indices()
        .map(|(idx, ch)| idx + ch.len_utf8())
        .take_while(|end| *end <= max_bytes)
        .last()
        .unwrap_or(0);
    text.truncate(end);
    text
}
