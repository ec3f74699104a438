//! MCP server implementation.
//!
//! [`McpServer`] is the context handed to every transport: the configuration,
//! one shared [`Dispatcher`] and the [`ResourceService`]. It turns decoded
//! JSON-RPC requests into responses and knows nothing about framing.
//!
//! Tools are defined in `domains/tools/definitions/` and registered in
//! `domains/tools/registry.rs`; resources likewise under `domains/resources/`.
//! Adding either does not touch this file.

use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::config::Config;
use super::error::Result;
use super::protocol::message::{
    INTERNAL_ERROR, INVALID_PARAMS, PROTOCOL_VERSION, RESOURCE_NOT_FOUND,
};
use super::protocol::{ClientInfo, JsonRpcRequest, JsonRpcResponse, SessionState};
use crate::domains::resources::{ResourceError, ResourceService};
use crate::domains::tools::{
    DispatchError, Dispatcher, ToolCallRequest, ToolDescriptor, ToolRegistry, ToolResult,
    build_tool_registry,
};
use crate::domains::upstream::HttpRecordSource;

/// `initialize` parameters. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitializeParams {
    #[serde(default)]
    protocol_version: Option<String>,
    #[serde(default)]
    client_info: Option<ClientInfo>,
}

/// `resources/read` parameters.
#[derive(Debug, Deserialize)]
struct ReadResourceParams {
    uri: String,
}

/// The main MCP server handler.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Tool dispatcher shared by every session.
    dispatcher: Arc<Dispatcher>,

    /// Readable resources and resource templates.
    resources: Arc<ResourceService>,
}

impl McpServer {
    /// Create a server backed by the HTTP user API from `config.upstream`.
    pub fn new(config: Config) -> Result<Self> {
        let source = Arc::new(HttpRecordSource::new(&config.upstream)?);
        let registry = build_tool_registry(&config, source)?;
        Ok(Self::with_registry(config, registry))
    }

    /// Create a server over an already built registry.
    pub fn with_registry(config: Config, registry: ToolRegistry) -> Self {
        let resources = ResourceService::new(&config.server);
        Self {
            config: Arc::new(config),
            dispatcher: Arc::new(Dispatcher::new(registry)),
            resources: Arc::new(resources),
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Tool metadata in registration order.
    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.dispatcher.list_tools()
    }

    /// Dispatch a single tool call.
    pub async fn call_tool(
        &self,
        request: ToolCallRequest,
    ) -> std::result::Result<ToolResult, DispatchError> {
        self.dispatcher.dispatch(request).await
    }

    /// Handle one request. Returns `None` for notifications.
    #[instrument(skip_all, fields(method = %request.method))]
    pub async fn handle_request(
        &self,
        request: JsonRpcRequest,
        session: &SessionState,
    ) -> Option<JsonRpcResponse> {
        let JsonRpcRequest {
            id, method, params, ..
        } = request;

        let Some(id) = id else {
            self.handle_notification(&method, session);
            return None;
        };
        let id = Some(id);

        if !session.is_initialized() && !matches!(method.as_str(), "initialize" | "ping") {
            debug!("{} received before notifications/initialized", method);
        }

        let response = match method.as_str() {
            "initialize" => self.handle_initialize(id, params, session),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, params).await,
            "resources/list" => JsonRpcResponse::success(
                id,
                json!({ "resources": self.resources.list_resources() }),
            ),
            "resources/templates/list" => JsonRpcResponse::success(
                id,
                json!({ "resourceTemplates": self.resources.list_resource_templates() }),
            ),
            "resources/read" => self.handle_resources_read(id, params),
            m if m.starts_with("notifications/") => {
                // Sent with an id by some clients; acknowledge it.
                self.handle_notification(m, session);
                JsonRpcResponse::success(id, Value::Null)
            }
            _ => {
                warn!("Unknown method: {}", method);
                JsonRpcResponse::method_not_found(id, &method)
            }
        };
        Some(response)
    }

    fn handle_notification(&self, method: &str, session: &SessionState) {
        match method {
            "notifications/initialized" => {
                session.mark_initialized();
                match session.client() {
                    Some(client) => info!("Client initialized: {}", client.name),
                    None => info!("Client initialized"),
                }
            }
            other => debug!("Ignoring notification: {}", other),
        }
    }

    fn handle_initialize(
        &self,
        id: Option<Value>,
        params: Option<Value>,
        session: &SessionState,
    ) -> JsonRpcResponse {
        let params = params
            .map(serde_json::from_value::<InitializeParams>)
            .transpose();
        let params = match params {
            Ok(params) => params,
            Err(e) => {
                return JsonRpcResponse::invalid_params(
                    id,
                    format!("Invalid initialize params: {}", e),
                );
            }
        };

        if let Some(params) = params {
            if let Some(version) = params.protocol_version.as_deref() {
                if version != PROTOCOL_VERSION {
                    debug!(
                        "Client requested protocol {}, answering with {}",
                        version, PROTOCOL_VERSION
                    );
                }
            }
            if let Some(client) = params.client_info {
                info!("Client connected: {} {}", client.name, client.version);
                session.record_client(client);
            }
        }

        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {
                    "tools": { "listChanged": false },
                    "resources": { "subscribe": false, "listChanged": false },
                },
                "serverInfo": {
                    "name": self.name(),
                    "version": self.version(),
                },
                "instructions": self.config.server.description,
            }),
        )
    }

    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        let tools = self.list_tools();
        debug!("Listing {} tools", tools.len());
        JsonRpcResponse::success(id, json!({ "tools": tools }))
    }

    fn handle_resources_read(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params = params.map(serde_json::from_value::<ReadResourceParams>);
        let uri = match params {
            Some(Ok(params)) => params.uri,
            Some(Err(e)) => {
                return JsonRpcResponse::invalid_params(
                    id,
                    format!("Invalid resources/read params: {}", e),
                );
            }
            None => return JsonRpcResponse::invalid_params(id, "Missing params for resources/read"),
        };

        match self.resources.read_resource(&uri) {
            Ok(contents) => JsonRpcResponse::success(id, json!({ "contents": [contents] })),
            Err(err @ ResourceError::NotFound(_)) => {
                warn!("{}", err);
                JsonRpcResponse::error(id, RESOURCE_NOT_FOUND, err.to_string())
            }
            Err(err) => JsonRpcResponse::invalid_params(id, err.to_string()),
        }
    }

    async fn handle_tools_call(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let Some(params) = params else {
            return JsonRpcResponse::invalid_params(id, "Missing params for tools/call");
        };
        let request: ToolCallRequest = match serde_json::from_value(params) {
            Ok(request) => request,
            Err(e) => {
                return JsonRpcResponse::invalid_params(
                    id,
                    format!("Invalid tools/call params: {}", e),
                );
            }
        };

        match self.call_tool(request).await {
            Ok(result) => match serde_json::to_value(&result) {
                Ok(value) => JsonRpcResponse::success(id, value),
                Err(e) => JsonRpcResponse::internal_error(id, e.to_string()),
            },
            Err(err) => {
                let code = if err.is_internal() {
                    INTERNAL_ERROR
                } else {
                    INVALID_PARAMS
                };
                JsonRpcResponse::error(id, code, err.to_string())
            }
        }
    }
}

/// Server over a fixed in-memory user directory.
#[cfg(test)]
pub(crate) fn test_server() -> McpServer {
    use crate::domains::search::UserRecord;
    use crate::domains::upstream::testing::StaticSource;

    let users = vec![
        json!({"id": 1, "fullname": "Nguyen Van A", "email": "a@adavigo.com"}),
        json!({"id": 2, "fullname": "Tran Thi B", "email": "b@gmail.com"}),
    ]
    .into_iter()
    .map(|v| UserRecord::try_from(v).unwrap())
    .collect();

    let config = Config::default();
    let registry = build_tool_registry(&config, Arc::new(StaticSource(users))).unwrap();
    McpServer::with_registry(config, registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::protocol::message::METHOD_NOT_FOUND;

    async fn call(server: &McpServer, method: &str, params: Value) -> JsonRpcResponse {
        let request = JsonRpcRequest::new(1, method, Some(params));
        server
            .handle_request(request, &SessionState::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_initialize_records_client() {
        let server = test_server();
        let session = SessionState::new();
        let request = JsonRpcRequest::new(
            1,
            "initialize",
            Some(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {"name": "inspector", "version": "0.1"}
            })),
        );
        let response = server.handle_request(request, &session).await.unwrap();
        let result = response.result.unwrap();

        assert_eq!(result["protocolVersion"], json!(PROTOCOL_VERSION));
        assert_eq!(result["serverInfo"]["name"], json!("simple-info-server"));
        assert!(result["capabilities"]["tools"].is_object());
        assert_eq!(result["capabilities"]["resources"]["subscribe"], json!(false));
        assert_eq!(session.client().unwrap().name, "inspector");
    }

    #[tokio::test]
    async fn test_initialized_notification() {
        let server = test_server();
        let session = SessionState::new();
        let request = JsonRpcRequest {
            id: None,
            ..JsonRpcRequest::new(0, "notifications/initialized", None)
        };
        assert!(server.handle_request(request, &session).await.is_none());
        assert!(session.is_initialized());
    }

    #[tokio::test]
    async fn test_tools_list_in_registration_order() {
        let response = call(&test_server(), "tools/list", json!({})).await;
        let result = response.result.unwrap();
        let names: Vec<&str> = result["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec![
                "Weather_Tool",
                "Weather_Execute",
                "hello",
                "add",
                "fetch_weather",
                "search_users",
                "list_users"
            ]
        );
        assert!(result["tools"][0]["inputSchema"].is_object());
    }

    #[tokio::test]
    async fn test_tools_call_search() {
        let response = call(
            &test_server(),
            "tools/call",
            json!({
                "name": "search_users",
                "arguments": {
                    "search_criteria": {
                        "email": {"operator": "ends_with", "value": "@ADAVIGO.com"}
                    }
                }
            }),
        )
        .await;
        let result = response.result.unwrap();
        assert_eq!(result["isError"], json!(false));
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("Nguyen Van A"));
        assert!(!text.contains("Tran Thi B"));
    }

    #[tokio::test]
    async fn test_tools_call_bad_operator_is_invalid_params() {
        let response = call(
            &test_server(),
            "tools/call",
            json!({
                "name": "search_users",
                "arguments": {"search_criteria": {"email": {"operator": "regex", "value": "x"}}}
            }),
        )
        .await;
        assert_eq!(response.error_code(), Some(INVALID_PARAMS));
    }

    #[tokio::test]
    async fn test_tools_call_missing_params() {
        let server = test_server();
        let request = JsonRpcRequest::new(4, "tools/call", None);
        let response = server
            .handle_request(request, &SessionState::new())
            .await
            .unwrap();
        assert_eq!(response.id, json!(4));
        assert_eq!(response.error_code(), Some(INVALID_PARAMS));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = call(&test_server(), "prompts/list", json!({})).await;
        assert_eq!(response.error_code(), Some(METHOD_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_resources_list() {
        let response = call(&test_server(), "resources/list", json!({})).await;
        let result = response.result.unwrap();
        assert_eq!(result["resources"][0]["uri"], json!("mcp://server/info"));
        assert_eq!(result["resources"][0]["mimeType"], json!("application/json"));
    }

    #[tokio::test]
    async fn test_resource_templates_list() {
        let response = call(&test_server(), "resources/templates/list", json!({})).await;
        let result = response.result.unwrap();
        assert_eq!(
            result["resourceTemplates"][0]["uriTemplate"],
            json!("greeting://{name}")
        );
    }

    #[tokio::test]
    async fn test_resources_read_greeting() {
        let response = call(
            &test_server(),
            "resources/read",
            json!({"uri": "greeting://Hoa"}),
        )
        .await;
        let contents = &response.result.unwrap()["contents"][0];
        assert_eq!(contents["uri"], json!("greeting://Hoa"));
        assert!(contents["text"].as_str().unwrap().contains("Fpt Online"));
    }

    #[tokio::test]
    async fn test_resources_read_unknown_uri() {
        let response = call(&test_server(), "resources/read", json!({"uri": "file:///etc/passwd"})).await;
        assert_eq!(response.error_code(), Some(RESOURCE_NOT_FOUND));

        let response = call(&test_server(), "resources/read", json!({})).await;
        assert_eq!(response.error_code(), Some(INVALID_PARAMS));
    }

    #[tokio::test]
    async fn test_ping() {
        let response = call(&test_server(), "ping", json!({})).await;
        assert_eq!(response.result, Some(json!({})));
    }
}
