//! JSON-RPC 2.0 message types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// JSON-RPC version string.
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol revision this server speaks.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

/// MCP: `resources/read` named a URI that no resource serves.
pub const RESOURCE_NOT_FOUND: i32 = -32002;

/// JSON-RPC request. A request without `id` is a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    /// Build a request with the given id.
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(id.into()),
            method: method.into(),
            params,
        }
    }

    /// `true` when no response is expected.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.unwrap_or(Value::Null),
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.unwrap_or(Value::Null),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Parse errors always carry a null id; the request id is unknowable.
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::error(None, PARSE_ERROR, message)
    }

    pub fn invalid_request(id: Option<Value>, message: impl Into<String>) -> Self {
        Self::error(id, INVALID_REQUEST, message)
    }

    pub fn method_not_found(id: Option<Value>, method: &str) -> Self {
        Self::error(id, METHOD_NOT_FOUND, format!("Method not found: {}", method))
    }

    pub fn invalid_params(id: Option<Value>, message: impl Into<String>) -> Self {
        Self::error(id, INVALID_PARAMS, message)
    }

    pub fn internal_error(id: Option<Value>, message: impl Into<String>) -> Self {
        Self::error(id, INTERNAL_ERROR, message)
    }

    /// Error code, if this is an error response.
    pub fn error_code(&self) -> Option<i32> {
        self.error.as_ref().map(|e| e.code)
    }
}

/// A decoded inbound frame.
#[derive(Debug, Clone)]
pub enum Inbound {
    /// A well-formed request or notification.
    Request(JsonRpcRequest),

    /// A response from the peer. The server never issues requests, so these
    /// are logged and dropped.
    Response(Value),

    /// Valid JSON that is not a valid request.
    Invalid { id: Option<Value>, reason: String },
}

/// The frame is not JSON at all.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: frame is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Decode one raw line, as read off the wire.
pub fn decode_bytes(bytes: Vec<u8>) -> Result<String, DecodeError> {
    Ok(String::from_utf8(bytes)?)
}

/// Decode one frame of text.
///
/// Only a frame that is not valid JSON is an error; every other defect is
/// reported as [`Inbound::Invalid`] so the caller can answer with `-32600`.
pub fn decode_frame(text: &str) -> Result<Inbound, DecodeError> {
    let value: Value = serde_json::from_str(text)?;

    let Some(object) = value.as_object() else {
        let reason = if value.is_array() {
            "Batch requests are not supported"
        } else {
            "Request must be a JSON object"
        };
        return Ok(Inbound::Invalid {
            id: None,
            reason: reason.to_string(),
        });
    };

    let id = object.get("id").cloned().filter(|id| !id.is_null());

    if !object.contains_key("method")
        && (object.contains_key("result") || object.contains_key("error"))
    {
        return Ok(Inbound::Response(value));
    }

    match serde_json::from_value::<JsonRpcRequest>(value) {
        Ok(request) if request.jsonrpc == JSONRPC_VERSION => Ok(Inbound::Request(request)),
        Ok(request) => Ok(Inbound::Invalid {
            id,
            reason: format!("Unsupported jsonrpc version: {:?}", request.jsonrpc),
        }),
        Err(e) => Ok(Inbound::Invalid {
            id,
            reason: format!("Invalid request: {}", e),
        }),
    }
}
