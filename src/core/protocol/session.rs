//! Stream sessions over newline-delimited JSON-RPC.
//!
//! A [`Session`] owns one reader/writer pair (stdin/stdout, or the two halves
//! of a TCP stream) and handles its frames strictly in arrival order. The
//! writer is shut down in exactly one place, [`Session::run`], whatever way
//! the session ends.

use futures::FutureExt;
use serde::Deserialize;
use std::panic::AssertUnwindSafe;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, instrument, warn};

use super::message::{DecodeError, Inbound, JsonRpcResponse, decode_bytes, decode_frame};
use crate::core::McpServer;

/// Client identity reported in `initialize`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

/// Protocol state for one session.
///
/// Shared by reference with concurrently running calls on the SSE transport,
/// hence the interior mutability.
#[derive(Debug, Default)]
pub struct SessionState {
    initialized: AtomicBool,
    client: OnceLock<ClientInfo>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the client from the first `initialize`. Later calls are
    /// ignored and return `false`.
    pub fn record_client(&self, client: ClientInfo) -> bool {
        self.client.set(client).is_ok()
    }

    pub fn client(&self) -> Option<&ClientInfo> {
        self.client.get()
    }

    /// Handle `notifications/initialized`.
    pub fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::Release);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }
}

/// Errors that end a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to read frame: {0}")]
    Read(#[source] std::io::Error),

    #[error("Failed to write response: {0}")]
    Write(#[source] std::io::Error),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Session aborted: {0}")]
    Panicked(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Counters reported when a session ends cleanly.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Non-blank frames read.
    pub frames: usize,
    /// Responses written.
    pub responses: usize,
}

/// One client connection.
pub struct Session<R, W> {
    server: McpServer,
    reader: R,
    writer: W,
    state: SessionState,
    peer: String,
}

impl<R, W> Session<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(server: McpServer, reader: R, writer: W, peer: impl Into<String>) -> Self {
        Self {
            server,
            reader,
            writer,
            state: SessionState::new(),
            peer: peer.into(),
        }
    }

    /// Serve until end of input or a fatal error, then release the writer.
    #[instrument(skip_all, fields(peer = %self.peer))]
    pub async fn run(mut self) -> SessionResult<SessionSummary> {
        let outcome = match AssertUnwindSafe(self.serve()).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "session panicked".to_string());
                Err(SessionError::Panicked(message))
            }
        };

        if let Err(e) = self.writer.shutdown().await {
            debug!("Writer shutdown failed: {}", e);
        }

        match &outcome {
            Ok(summary) => info!(
                frames = summary.frames,
                responses = summary.responses,
                "Session closed"
            ),
            Err(e) => warn!("Session terminated: {}", e),
        }
        outcome
    }

    async fn serve(&mut self) -> SessionResult<SessionSummary> {
        let mut summary = SessionSummary::default();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = self
                .reader
                .read_until(b'\n', &mut buf)
                .await
                .map_err(SessionError::Read)?;
            if read == 0 {
                debug!("End of input");
                return Ok(summary);
            }

            let line = match decode_bytes(std::mem::take(&mut buf)) {
                Ok(line) => line,
                Err(err) => return Err(self.reject(err).await),
            };
            let frame = line.trim();
            if frame.is_empty() {
                continue;
            }
            summary.frames += 1;

            let response = match decode_frame(frame) {
                Ok(Inbound::Request(request)) => {
                    self.server.handle_request(request, &self.state).await
                }
                Ok(Inbound::Invalid { id, reason }) => {
                    warn!("Invalid request: {}", reason);
                    Some(JsonRpcResponse::invalid_request(id, reason))
                }
                Ok(Inbound::Response(value)) => {
                    debug!("Ignoring response from client: {}", value);
                    None
                }
                Err(err) => return Err(self.reject(err).await),
            };

            if let Some(response) = response {
                self.write(&response).await?;
                summary.responses += 1;
            }
        }
    }

    /// Report an undecodable frame. The stream can no longer be trusted to
    /// be in sync, so the session ends with the returned error.
    async fn reject(&mut self, err: DecodeError) -> SessionError {
        let reply = JsonRpcResponse::parse_error(err.to_string());
        if let Err(write_err) = self.write(&reply).await {
            debug!("Could not report parse error: {}", write_err);
        }
        err.into()
    }

    async fn write(&mut self, response: &JsonRpcResponse) -> SessionResult<()> {
        let mut bytes = serde_json::to_vec(response)?;
        bytes.push(b'\n');
        self.writer
            .write_all(&bytes)
            .await
            .map_err(SessionError::Write)?;
        self.writer.flush().await.map_err(SessionError::Write)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::protocol::message::{
        INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR,
    };
    use crate::core::server::test_server;
    use serde_json::{Value, json};
    use tokio::io::{AsyncReadExt, BufReader};

    /// Run a session over `input` and return the parsed output lines.
    async fn run_session(input: &str) -> (SessionResult<SessionSummary>, Vec<Value>) {
        run_session_bytes(input.as_bytes()).await
    }

    async fn run_session_bytes(input: &[u8]) -> (SessionResult<SessionSummary>, Vec<Value>) {
        let reader = BufReader::new(tokio_test::io::Builder::new().read(input).build());
        let (writer, mut output) = tokio::io::duplex(64 * 1024);

        let outcome = Session::new(test_server(), reader, writer, "test").run().await;

        let mut text = String::new();
        output.read_to_string(&mut text).await.unwrap();
        let lines = text
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        (outcome, lines)
    }

    #[tokio::test]
    async fn test_unknown_tool_keeps_session_open() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"nope","arguments":{}}}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"add","arguments":{"a":2,"b":3}}}"#,
            "\n",
        );
        let (outcome, lines) = run_session(input).await;

        assert_eq!(outcome.unwrap().responses, 2);
        assert_eq!(lines[0]["id"], json!(1));
        assert_eq!(lines[0]["error"]["code"], json!(INVALID_PARAMS));
        assert!(lines[0]["error"]["message"].as_str().unwrap().contains("nope"));
        assert_eq!(lines[1]["id"], json!(2));
        assert_eq!(lines[1]["result"]["content"][0]["text"], json!("5"));
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":"p","method":"ping"}"#,
            "\n",
        );
        let (outcome, lines) = run_session(input).await;

        let summary = outcome.unwrap();
        assert_eq!(summary.frames, 2);
        assert_eq!(summary.responses, 1);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["id"], json!("p"));
    }

    #[tokio::test]
    async fn test_malformed_frame_terminates_session() {
        let input = concat!(
            "{this is not json\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
            "\n",
        );
        let (outcome, lines) = run_session(input).await;

        assert!(matches!(outcome, Err(SessionError::Decode(_))));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["id"], Value::Null);
        assert_eq!(lines[0]["error"]["code"], json!(PARSE_ERROR));
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_reported_as_parse_error() {
        let mut input = vec![0xff, 0xfe, b'{', b'}', b'\n'];
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#);
        input.push(b'\n');
        let (outcome, lines) = run_session_bytes(&input).await;

        assert!(matches!(
            outcome,
            Err(SessionError::Decode(DecodeError::Utf8(_)))
        ));
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["id"], Value::Null);
        assert_eq!(lines[0]["error"]["code"], json!(PARSE_ERROR));
    }

    #[tokio::test]
    async fn test_invalid_request_keeps_session_open() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"prompts/list"}"#,
            "\n",
        );
        let (outcome, lines) = run_session(input).await;

        assert!(outcome.is_ok());
        assert_eq!(lines[0]["error"]["code"], json!(INVALID_REQUEST));
        assert_eq!(lines[1]["error"]["code"], json!(METHOD_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_blank_lines_are_skipped() {
        let (outcome, lines) = run_session("\n\n   \n").await;
        assert_eq!(outcome.unwrap(), SessionSummary::default());
        assert!(lines.is_empty());
    }

    #[test]
    fn test_session_state_records_first_client_only() {
        let state = SessionState::new();
        assert!(!state.is_initialized());
        assert!(state.record_client(ClientInfo {
            name: "first".to_string(),
            version: String::new(),
        }));
        assert!(!state.record_client(ClientInfo {
            name: "second".to_string(),
            version: String::new(),
        }));
        assert_eq!(state.client().unwrap().name, "first");
        state.mark_initialized();
        assert!(state.is_initialized());
    }
}
