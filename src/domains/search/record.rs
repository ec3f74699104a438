//! User records returned by the upstream API.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single user record.
///
/// Records carry no fixed schema: field presence and types vary per record.
/// The matcher only ever looks at a field through [`UserRecord::field_text`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRecord(Map<String, Value>);

impl UserRecord {
    /// String projection of a field used for comparisons.
    ///
    /// Strings are returned as-is, numbers and booleans are stringified and
    /// `null` becomes the empty string. Nested values fall back to their JSON
    /// text. Returns `None` only when the field is absent.
    pub fn field_text(&self, field: &str) -> Option<String> {
        self.0.get(field).map(|value| match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => other.to_string(),
        })
    }
}

impl TryFrom<Value> for UserRecord {
    type Error = Value;

    /// Accepts only JSON objects; any other value is handed back.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(other),
        }
    }
}
