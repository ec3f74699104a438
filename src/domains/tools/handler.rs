//! Tool handler contract.
//!
//! Every tool plugs into the dispatcher through [`ToolHandler`]. A call is
//! split in two phases:
//!
//! 1. `prepare()` decodes and validates the raw arguments synchronously. Any
//!    failure here is a protocol-level error and nothing is executed.
//! 2. The returned [`PreparedCall`] future performs the actual work. It is
//!    lazy: nothing runs until the dispatcher polls it.

use futures::future::BoxFuture;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::ToolError;

/// Raw tool arguments as received on the wire.
pub type Arguments = Map<String, Value>;

/// A validated call, ready to execute.
pub type PreparedCall = BoxFuture<'static, Result<ToolResult, ToolError>>;

/// Trait implemented by every invokable tool.
pub trait ToolHandler: Send + Sync {
    /// Metadata advertised in `tools/list`.
    fn descriptor(&self) -> &ToolDescriptor;

    /// Validate arguments and build the call future.
    ///
    /// Return [`ToolError::InvalidArguments`] for bad input; the handler
    /// future is then never created.
    fn prepare(&self, arguments: Arguments) -> Result<PreparedCall, ToolError>;
}

// ============================================================================
// Tool metadata
// ============================================================================

/// Public description of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Unique, stable dispatch key.
    pub name: String,

    /// Human-readable description shown to clients.
    pub description: String,

    /// JSON schema of the accepted arguments.
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDescriptor {
    /// Create a descriptor with an explicit schema.
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    /// Create a descriptor whose schema is derived from a params type.
    pub fn for_params<P: JsonSchema>(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, schema_for_params::<P>())
    }

    /// Names listed under the schema's `required` key.
    pub fn required_arguments(&self) -> Vec<&str> {
        self.input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// Generate the JSON schema for a params struct.
pub fn schema_for_params<P: JsonSchema>() -> Value {
    schemars::schema_for!(P).to_value()
}

/// Decode raw arguments into a typed params struct.
pub fn parse_params<P: DeserializeOwned>(arguments: Arguments) -> Result<P, ToolError> {
    serde_json::from_value(Value::Object(arguments))
        .map_err(|e| ToolError::invalid_arguments(e.to_string()))
}

// ============================================================================
// Tool results
// ============================================================================

/// A single content item of a tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    /// Plain text.
    Text { text: String },
}

impl Content {
    /// Create a text content item.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// The text of this item, if it is a text item.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
        }
    }
}

/// Result of a tool call.
///
/// `is_error` marks soft failures: the call completed at the protocol level
/// but the tool could not do what was asked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: Vec<Content>,

    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

impl ToolResult {
    /// Successful result with the given content.
    pub fn success(content: Vec<Content>) -> Self {
        Self {
            content,
            is_error: false,
        }
    }

    /// Successful result with a single text item.
    pub fn text(text: impl Into<String>) -> Self {
        Self::success(vec![Content::text(text)])
    }

    /// Soft failure carrying a human-readable explanation.
    pub fn error_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(text)],
            is_error: true,
        }
    }

    /// Text of the first content item.
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().and_then(Content::as_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize, JsonSchema)]
    #[allow(dead_code)]
    struct SampleParams {
        city: String,
        #[serde(default)]
        verbose: bool,
        note: Option<String>,
    }

    #[test]
    fn test_schema_required_arguments() {
        let descriptor = ToolDescriptor::for_params::<SampleParams>("sample", "A sample");
        assert_eq!(descriptor.input_schema["type"], "object");
        assert_eq!(descriptor.required_arguments(), vec!["city"]);
    }

    #[test]
    fn test_descriptor_serializes_input_schema_key() {
        let descriptor = ToolDescriptor::new("t", "d", json!({"type": "object"}));
        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(value["inputSchema"]["type"], "object");
        assert!(value.get("input_schema").is_none());
    }

    #[test]
    fn test_result_wire_format() {
        let value = serde_json::to_value(ToolResult::text("hi")).unwrap();
        assert_eq!(
            value,
            json!({"content": [{"type": "text", "text": "hi"}], "isError": false})
        );
        assert!(ToolResult::error_text("boom").is_error);
    }

    #[test]
    fn test_parse_params_reports_invalid_arguments() {
        let mut args = Arguments::new();
        args.insert("city".into(), json!(12));
        let err = parse_params::<SampleParams>(args).err().unwrap();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
