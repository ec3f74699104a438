//! HTTP transport implementation.
//!
//! Two ways in:
//! - **SSE**: `GET /sse` opens an event stream whose first `endpoint` event
//!   names the POST URL for that session. Messages POSTed to
//!   `/messages/?session_id=…` are answered with `202 Accepted`; the JSON-RPC
//!   response arrives later as a `message` event. Calls in one session run
//!   concurrently, and closing the stream cancels the ones still in flight.
//! - **Direct**: `POST {rpc_path}` answers a single JSON-RPC request in the
//!   HTTP response body. Each request gets a fresh session state.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::{TransportError, TransportResult, config::HttpConfig};
use crate::core::McpServer;
use crate::core::protocol::{Inbound, JsonRpcResponse, SessionState, decode_frame};

/// Path of the SSE stream.
pub const SSE_PATH: &str = "/sse";

/// Path that receives messages for SSE sessions.
pub const MESSAGES_PATH: &str = "/messages/";

/// Responses buffered per SSE session before senders wait.
const SSE_CHANNEL_CAPACITY: usize = 32;

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

/// One open SSE stream.
pub struct SseSession {
    id: String,
    sender: mpsc::Sender<JsonRpcResponse>,
    state: SessionState,
}

impl SseSession {
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Registry of open SSE sessions, keyed by session id.
#[derive(Clone, Default)]
pub struct SseSessions {
    inner: Arc<Mutex<HashMap<String, Arc<SseSession>>>>,
}

impl SseSessions {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<SseSession>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new session. It stays registered until the guard drops.
    fn open(&self) -> (Arc<SseSession>, mpsc::Receiver<JsonRpcResponse>, SessionGuard) {
        let (sender, receiver) = mpsc::channel(SSE_CHANNEL_CAPACITY);
        let session = Arc::new(SseSession {
            id: Uuid::new_v4().simple().to_string(),
            sender,
            state: SessionState::new(),
        });
        self.lock().insert(session.id.clone(), session.clone());

        let guard = SessionGuard {
            id: session.id.clone(),
            sessions: self.clone(),
        };
        (session, receiver, guard)
    }

    pub fn get(&self, id: &str) -> Option<Arc<SseSession>> {
        self.lock().get(id).cloned()
    }

    fn remove(&self, id: &str) {
        self.lock().remove(id);
    }

    /// Number of open sessions.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Unregisters its session when the event stream is dropped.
struct SessionGuard {
    id: String,
    sessions: SseSessions,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.sessions.remove(&self.id);
        info!(session = %self.id, "SSE session closed");
    }
}

/// Application state shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// The MCP server instance.
    server: McpServer,

    /// Open SSE sessions.
    sessions: SseSessions,
}

impl AppState {
    pub fn new(server: McpServer) -> Self {
        Self {
            server,
            sessions: SseSessions::default(),
        }
    }

    pub fn sessions(&self) -> &SseSessions {
        &self.sessions
    }
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Run the HTTP transport.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();
        let app = router(AppState::new(server), &self.config);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!(
            "Ready - listening on {} (JSON-RPC over HTTP, CORS {})",
            addr, cors_status
        );
        info!("  → SSE:      GET {}", SSE_PATH);
        info!("  → Messages: POST {}?session_id=<id>", MESSAGES_PATH);
        info!("  → JSON-RPC: POST {}", self.config.rpc_path);
        info!("  → Health:   GET /health");

        axum::serve(listener, app)
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        Ok(())
    }
}

/// Build the router for the given state.
pub fn router(state: AppState, config: &HttpConfig) -> Router {
    let mut app = Router::new()
        .route("/", get(server_info))
        .route("/info", get(server_info))
        .route("/health", get(health_check))
        .route(SSE_PATH, get(sse_handler))
        .route(MESSAGES_PATH, post(post_message))
        .route(&config.rpc_path, post(handle_rpc))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Add CORS if enabled
    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Server info - name, version and endpoints.
async fn server_info(State(state): State<AppState>) -> impl IntoResponse {
    let server = &state.server;
    let tools: Vec<String> = server.list_tools().into_iter().map(|t| t.name).collect();
    Json(json!({
        "name": server.name(),
        "version": server.version(),
        "description": server.config().server.description,
        "transport": "HTTP",
        "protocol": "JSON-RPC 2.0",
        "endpoints": {
            "sse": SSE_PATH,
            "messages": MESSAGES_PATH,
            "info": "/info",
            "health": "/health"
        },
        "tools": tools,
    }))
}

/// Health check endpoint.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "sse_sessions": state.sessions.len(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Open an SSE session.
async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (session, receiver, guard) = state.sessions.open();
    let endpoint = format!("{}?session_id={}", MESSAGES_PATH, session.id());
    info!(session = %session.id(), "SSE session opened");

    let first = stream::once(async move { Ok(Event::default().event("endpoint").data(endpoint)) });

    // The guard travels with the stream and drops with it.
    let messages = stream::unfold((receiver, guard), |(mut receiver, guard)| async move {
        let response = receiver.recv().await?;
        let event = match serde_json::to_string(&response) {
            Ok(data) => Event::default().event("message").data(data),
            Err(e) => {
                error!("Failed to encode SSE message: {}", e);
                Event::default().comment("dropped unencodable message")
            }
        };
        Some((Ok(event), (receiver, guard)))
    });

    Sse::new(first.chain(messages)).keep_alive(KeepAlive::default())
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    session_id: String,
}

/// Accept a message for an SSE session.
#[instrument(skip_all, fields(session = %query.session_id))]
async fn post_message(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    body: String,
) -> Response {
    let Some(session) = state.sessions.get(&query.session_id) else {
        warn!("Message for unknown session");
        return (StatusCode::NOT_FOUND, "Could not find session").into_response();
    };

    let request = match decode_frame(&body) {
        Ok(Inbound::Request(request)) => request,
        Ok(Inbound::Invalid { id, reason }) => {
            warn!("Invalid request: {}", reason);
            deliver(&session, JsonRpcResponse::invalid_request(id, reason)).await;
            return accepted();
        }
        Ok(Inbound::Response(_)) => {
            debug!("Ignoring response from client");
            return accepted();
        }
        Err(e) => {
            warn!("Could not parse message: {}", e);
            return (StatusCode::BAD_REQUEST, "Could not parse message").into_response();
        }
    };

    let server = state.server.clone();
    tokio::spawn(async move {
        tokio::select! {
            response = server.handle_request(request, &session.state) => {
                if let Some(response) = response {
                    deliver(&session, response).await;
                }
            }
            _ = session.sender.closed() => {
                info!(session = %session.id, "Client disconnected, call cancelled");
            }
        }
    });

    accepted()
}

async fn deliver(session: &SseSession, response: JsonRpcResponse) {
    if session.sender.send(response).await.is_err() {
        debug!(session = %session.id, "Stream closed, response discarded");
    }
}

fn accepted() -> Response {
    (StatusCode::ACCEPTED, "Accepted").into_response()
}

/// Handle a direct JSON-RPC request.
#[instrument(skip_all)]
async fn handle_rpc(State(state): State<AppState>, body: String) -> Response {
    match decode_frame(&body) {
        Ok(Inbound::Request(request)) => {
            info!("Received JSON-RPC request: {}", request.method);
            match state
                .server
                .handle_request(request, &SessionState::new())
                .await
            {
                Some(response) => (StatusCode::OK, Json(response)).into_response(),
                None => StatusCode::ACCEPTED.into_response(),
            }
        }
        Ok(Inbound::Invalid { id, reason }) => {
            (StatusCode::OK, Json(JsonRpcResponse::invalid_request(id, reason))).into_response()
        }
        Ok(Inbound::Response(_)) => StatusCode::ACCEPTED.into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(JsonRpcResponse::parse_error(e.to_string())),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::core::server::test_server;
    use crate::domains::tools::build_tool_registry;
    use crate::domains::upstream::testing::HangingSource;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use tokio::time::timeout;
    use tower::ServiceExt;

    fn app() -> (AppState, Router) {
        let state = AppState::new(test_server());
        let router = router(state.clone(), &HttpConfig::default());
        (state, router)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Read SSE frames until one complete event is buffered.
    async fn next_event(body: &mut Body) -> String {
        let mut buffer = String::new();
        while !buffer.contains("\n\n") {
            let frame = body.frame().await.unwrap().unwrap();
            if let Ok(data) = frame.into_data() {
                buffer.push_str(std::str::from_utf8(&data).unwrap());
            }
        }
        buffer
    }

    /// The POST URL announced by an `endpoint` event.
    fn endpoint_url(event: &str) -> String {
        assert!(event.contains("event: endpoint"));
        event
            .lines()
            .find_map(|line| line.strip_prefix("data: "))
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let (_, app) = app();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], json!("healthy"));
    }

    #[tokio::test]
    async fn test_info_lists_endpoints() {
        let (_, app) = app();
        let response = app
            .oneshot(Request::get("/info").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["endpoints"]["sse"], json!("/sse"));
        assert_eq!(body["tools"].as_array().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_direct_rpc_tools_call() {
        let (_, app) = app();
        let response = app
            .oneshot(post_json(
                "/mcp",
                r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"Weather_Execute","arguments":{"city":"Ha Noi"}}}"#,
            ))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["id"], json!(1));
        assert!(
            body["result"]["content"][0]["text"]
                .as_str()
                .unwrap()
                .starts_with("Hà Nội")
        );
    }

    #[tokio::test]
    async fn test_direct_rpc_unknown_tool() {
        let (_, app) = app();
        let response = app
            .oneshot(post_json(
                "/mcp",
                r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"Weather_Forecast"}}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["error"]["code"], json!(-32602));
    }

    #[tokio::test]
    async fn test_direct_rpc_parse_error() {
        let (_, app) = app();
        let response = app.oneshot(post_json("/mcp", "{")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], json!(-32700));
    }

    #[tokio::test]
    async fn test_message_for_unknown_session() {
        let (_, app) = app();
        let response = app
            .oneshot(post_json(
                "/messages/?session_id=missing",
                r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_sse_round_trip() {
        let (state, app) = app();

        let response = app
            .clone()
            .oneshot(Request::get("/sse").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let mut stream = response.into_body();

        let url = endpoint_url(&next_event(&mut stream).await);
        assert!(url.starts_with("/messages/?session_id="));
        assert_eq!(state.sessions().len(), 1);

        let response = app
            .oneshot(post_json(
                &url,
                r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"add","arguments":{"a":40,"b":2}}}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let message = next_event(&mut stream).await;
        assert!(message.contains("event: message"));
        assert!(message.contains(r#""id":5"#));
        assert!(message.contains("42"));

        drop(stream);
        assert!(state.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_session_guard_unregisters() {
        let sessions = SseSessions::default();
        let (session, _receiver, guard) = sessions.open();
        assert!(sessions.get(session.id()).is_some());
        drop(guard);
        assert!(sessions.get(session.id()).is_none());
    }

    #[tokio::test]
    async fn test_disconnect_cancels_in_flight_call() {
        let source = HangingSource::default();
        let config = Config::default();
        let registry = build_tool_registry(&config, Arc::new(source.clone())).unwrap();
        let state = AppState::new(McpServer::with_registry(config, registry));
        let app = router(state.clone(), &HttpConfig::default());

        let response = app
            .clone()
            .oneshot(Request::get("/sse").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let mut stream = response.into_body();
        let url = endpoint_url(&next_event(&mut stream).await);

        let response = app
            .oneshot(post_json(
                &url,
                r#"{"jsonrpc":"2.0","id":9,"method":"tools/call","params":{"name":"list_users","arguments":{}}}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        timeout(Duration::from_secs(2), source.started.notified())
            .await
            .expect("upstream fetch never started");
        assert!(!source.dropped.load(Ordering::SeqCst));

        drop(stream);
        timeout(Duration::from_secs(2), async {
            while !source.dropped.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("upstream fetch was not cancelled");
        assert!(state.sessions().is_empty());
    }
}
