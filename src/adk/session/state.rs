// SPDX-License-Identifier: MIT

//! Session state storage and instruction templating

use crate::adk::error::AdkError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const STATE_PREFIXES: [&str; 3] = ["app:", "user:", "temp:"];

/// Key/value state shared by every agent of one session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionState {
    fields: Map<String, Value>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// String view of a value; non-string values render as JSON
    pub fn get_string(&self, key: &str) -> Option<String> {
        self.fields.get(key).map(render_value)
    }

    pub fn apply_delta(&mut self, delta: &Map<String, Value>) {
        for (k, v) in delta {
            self.fields.insert(k.clone(), v.clone());
        }
    }

    /// Drop `temp:` keys, which only live for one invocation
    pub fn clear_temp(&mut self) {
        self.fields.retain(|k, _| !k.starts_with("temp:"));
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Whether `name` may appear inside `{...}` as a state reference
fn is_state_name(name: &str) -> bool {
    let bare = STATE_PREFIXES
        .iter()
        .find_map(|p| name.strip_prefix(p))
        .unwrap_or(name);

    let mut chars = bare.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Replace `{key}` placeholders in an instruction with state values.
///
/// `{key?}` renders as empty when the key is missing. Braces whose content is
/// not a state name (JSON examples, `{}`) are copied through unchanged.
pub fn inject_state(template: &str, state: &SessionState) -> Result<String, AdkError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];

        let Some(close) = after_open.find('}') else {
            out.push_str(&rest[open..]);
            return Ok(out);
        };

        let inner = after_open[..close].trim();
        let (name, optional) = match inner.strip_suffix('?') {
            Some(n) => (n, true),
            None => (inner, false),
        };

        if is_state_name(name) {
            match state.get(name) {
                Some(v) => out.push_str(&render_value(v)),
                None if optional => {}
                None => return Err(AdkError::MissingStateKey(name.to_string())),
            }
        } else {
            out.push_str(&rest[open..open + close + 2]);
        }

        rest = &after_open[close + 1..];
    }

    out.push_str(rest);
    Ok(out)
}
