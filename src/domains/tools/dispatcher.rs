//! Tool call dispatcher.
//!
//! Every call walks the same state machine:
//!
//! ```text
//! RECEIVED ──► VALIDATED ──► EXECUTING ──► COMPLETED
//!    │                           │
//!    └──────────► FAILED ◄───────┘
//! ```
//!
//! Validation failures and programming faults become [`DispatchError`]s,
//! which transports encode as protocol-level errors. Recoverable execution
//! failures (upstream down, timeouts, bad values) are turned into a
//! [`ToolResult`] with `is_error` set, so the caller receives readable text.

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use thiserror::Error;
use tracing::{debug, error, info, instrument, trace, warn};

use super::error::ToolError;
use super::handler::{Arguments, PreparedCall, ToolDescriptor, ToolResult};
use super::registry::ToolRegistry;

/// An incoming `tools/call` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Name of the tool to invoke.
    #[serde(alias = "toolName")]
    pub name: String,

    /// Tool arguments; absent and `null` both mean "no arguments".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Arguments>,
}

impl ToolCallRequest {
    /// Create a request.
    pub fn new(name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            name: name.into(),
            arguments: Some(arguments),
        }
    }
}

/// Lifecycle state of a single call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Received,
    Validated,
    Executing,
    Completed,
    Failed,
}

impl CallState {
    /// `Completed` and `Failed` have no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: CallState) -> bool {
        use CallState::*;
        matches!(
            (self, next),
            (Received, Validated)
                | (Received, Failed)
                | (Validated, Executing)
                | (Executing, Completed)
                | (Executing, Failed)
        )
    }
}

/// Per-call state, owned by a single dispatch.
struct Call<'a> {
    tool: &'a str,
    state: CallState,
}

impl<'a> Call<'a> {
    fn new(tool: &'a str) -> Self {
        Self {
            tool,
            state: CallState::Received,
        }
    }

    fn advance(&mut self, next: CallState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal call transition {:?} -> {:?}",
            self.state,
            next
        );
        trace!(tool = self.tool, from = ?self.state, to = ?next, "call transition");
        self.state = next;
    }
}

/// Errors reported to the caller as protocol-level failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The request carried an empty tool name.
    #[error("Tool name must not be empty")]
    EmptyToolName,

    /// No tool is registered under this name.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// A required argument was absent or null.
    #[error("Missing required argument '{argument}' for tool '{tool}'")]
    MissingArgument { tool: String, argument: String },

    /// The tool rejected its arguments.
    #[error("Invalid arguments for tool '{tool}': {message}")]
    InvalidArguments { tool: String, message: String },

    /// The tool failed in a way that indicates a defect.
    #[error("Internal error in tool '{tool}': {message}")]
    Internal { tool: String, message: String },
}

impl DispatchError {
    /// `true` for programming faults, `false` for caller mistakes.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }
}

/// Routes tool calls through the registry.
///
/// One dispatcher is shared by every session; it holds no per-call state.
pub struct Dispatcher {
    registry: ToolRegistry,
}

impl Dispatcher {
    /// Create a dispatcher over a fully built registry.
    pub fn new(registry: ToolRegistry) -> Self {
        info!("Dispatcher ready with {} tools", registry.len());
        Self { registry }
    }

    /// Tool metadata in registration order.
    pub fn list_tools(&self) -> Vec<ToolDescriptor> {
        self.registry.descriptors().into_iter().cloned().collect()
    }

    /// Dispatch one call to completion.
    #[instrument(skip_all, fields(tool = %request.name))]
    pub async fn dispatch(&self, request: ToolCallRequest) -> Result<ToolResult, DispatchError> {
        let tool = request.name;
        let mut call = Call::new(&tool);

        let prepared = match self.validate(&tool, request.arguments.unwrap_or_default()) {
            Ok(prepared) => prepared,
            Err(err) => {
                call.advance(CallState::Failed);
                warn!("Rejected call: {}", err);
                return Err(err);
            }
        };
        call.advance(CallState::Validated);

        call.advance(CallState::Executing);
        debug!("Executing tool");
        let outcome = AssertUnwindSafe(prepared).catch_unwind().await;

        match outcome {
            Ok(Ok(result)) => {
                call.advance(CallState::Completed);
                debug!(is_error = result.is_error, "Tool completed");
                Ok(result)
            }
            Ok(Err(err)) => {
                call.advance(CallState::Failed);
                soften(&tool, err)
            }
            Err(panic) => {
                call.advance(CallState::Failed);
                let message = panic_message(panic.as_ref());
                error!("Tool panicked: {}", message);
                Err(DispatchError::Internal {
                    tool: tool.clone(),
                    message,
                })
            }
        }
    }

    /// RECEIVED -> VALIDATED: resolve, check required arguments, prepare.
    ///
    /// The name is matched exactly as sent.
    fn validate(&self, tool: &str, arguments: Arguments) -> Result<PreparedCall, DispatchError> {
        if tool.is_empty() {
            return Err(DispatchError::EmptyToolName);
        }

        let handler = self
            .registry
            .resolve(tool)
            .map_err(|_| DispatchError::UnknownTool(tool.to_string()))?;

        if let Some(missing) = handler
            .descriptor()
            .required_arguments()
            .into_iter()
            .find(|name| arguments.get(*name).is_none_or(|v| v.is_null()))
        {
            return Err(DispatchError::MissingArgument {
                tool: tool.to_string(),
                argument: missing.to_string(),
            });
        }

        match std::panic::catch_unwind(AssertUnwindSafe(|| handler.prepare(arguments))) {
            Ok(Ok(prepared)) => Ok(prepared),
            Ok(Err(ToolError::InvalidArguments(message))) => Err(DispatchError::InvalidArguments {
                tool: tool.to_string(),
                message,
            }),
            Ok(Err(other)) => Err(DispatchError::Internal {
                tool: tool.to_string(),
                message: other.to_string(),
            }),
            Err(panic) => Err(DispatchError::Internal {
                tool: tool.to_string(),
                message: panic_message(panic.as_ref()),
            }),
        }
    }
}

/// EXECUTING -> FAILED: recoverable errors become readable results.
fn soften(tool: &str, err: ToolError) -> Result<ToolResult, DispatchError> {
    match err {
        ToolError::Internal(message) | ToolError::Duplicate(message) => {
            error!("Tool failed internally: {}", message);
            Err(DispatchError::Internal {
                tool: tool.to_string(),
                message,
            })
        }
        recoverable => {
            warn!("Tool failed: {}", recoverable);
            Ok(ToolResult::error_text(recoverable.to_string()))
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "tool panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::handler::{ToolHandler, parse_params};
    use crate::domains::upstream::UpstreamError;
    use futures::FutureExt;
    use schemars::JsonSchema;
    use serde_json::json;

    #[derive(Deserialize, JsonSchema)]
    struct EchoParams {
        message: String,
    }

    /// Test tool whose behaviour is chosen by the `message` argument.
    struct EchoTool {
        descriptor: ToolDescriptor,
    }

    impl EchoTool {
        fn new() -> Self {
            Self {
                descriptor: ToolDescriptor::for_params::<EchoParams>("echo", "Echo a message"),
            }
        }
    }

    impl ToolHandler for EchoTool {
        fn descriptor(&self) -> &ToolDescriptor {
            &self.descriptor
        }

        fn prepare(&self, arguments: Arguments) -> Result<PreparedCall, ToolError> {
            let params: EchoParams = parse_params(arguments)?;
            if params.message == "prepare-panic" {
                panic!("prepare exploded");
            }
            Ok(async move {
                match params.message.as_str() {
                    "upstream" => Err(ToolError::Upstream(UpstreamError::Status {
                        status: 500,
                        body: "boom".into(),
                    })),
                    "internal" => Err(ToolError::internal("invariant broken")),
                    "panic" => panic!("handler exploded"),
                    other => Ok(ToolResult::text(other.to_string())),
                }
            }
            .boxed())
        }
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(ToolRegistry::new().with_tool(EchoTool::new()).unwrap())
    }

    fn call(message: serde_json::Value) -> ToolCallRequest {
        ToolCallRequest::new(
            "echo",
            json!({ "message": message }).as_object().unwrap().clone(),
        )
    }

    #[test]
    fn test_state_machine_transitions() {
        use CallState::*;
        assert!(Received.can_transition_to(Validated));
        assert!(Received.can_transition_to(Failed));
        assert!(Validated.can_transition_to(Executing));
        assert!(Executing.can_transition_to(Completed));
        assert!(Executing.can_transition_to(Failed));
        assert!(!Received.can_transition_to(Executing));
        assert!(!Validated.can_transition_to(Completed));
        for terminal in [Completed, Failed] {
            assert!(terminal.is_terminal());
            for next in [Received, Validated, Executing, Completed, Failed] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let result = dispatcher().dispatch(call(json!("hello"))).await.unwrap();
        assert_eq!(result, ToolResult::text("hello"));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let err = dispatcher()
            .dispatch(ToolCallRequest::new("nope", Arguments::new()))
            .await
            .unwrap_err();
        assert_eq!(err, DispatchError::UnknownTool("nope".into()));
        assert!(err.to_string().contains("nope"));
        assert!(!err.is_internal());
    }

    #[tokio::test]
    async fn test_empty_tool_name() {
        let err = dispatcher()
            .dispatch(ToolCallRequest::new("", Arguments::new()))
            .await
            .unwrap_err();
        assert_eq!(err, DispatchError::EmptyToolName);
    }

    #[tokio::test]
    async fn test_tool_name_is_not_trimmed() {
        let d = dispatcher();
        let padded = d.dispatch(ToolCallRequest::new(" echo ", Arguments::new())).await;
        assert_eq!(padded.unwrap_err(), DispatchError::UnknownTool(" echo ".into()));

        let blank = d.dispatch(ToolCallRequest::new("  ", Arguments::new())).await;
        assert_eq!(blank.unwrap_err(), DispatchError::UnknownTool("  ".into()));
    }

    #[tokio::test]
    async fn test_missing_and_null_required_argument() {
        let d = dispatcher();
        let missing = d
            .dispatch(ToolCallRequest {
                name: "echo".into(),
                arguments: None,
            })
            .await
            .unwrap_err();
        assert_eq!(
            missing,
            DispatchError::MissingArgument {
                tool: "echo".into(),
                argument: "message".into()
            }
        );

        let null = d.dispatch(call(json!(null))).await.unwrap_err();
        assert!(matches!(null, DispatchError::MissingArgument { .. }));
    }

    #[tokio::test]
    async fn test_invalid_argument_type() {
        let err = dispatcher().dispatch(call(json!(42))).await.unwrap_err();
        assert!(matches!(err, DispatchError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn test_recoverable_failure_is_soft() {
        let result = dispatcher().dispatch(call(json!("upstream"))).await.unwrap();
        assert!(result.is_error);
        assert!(result.first_text().unwrap().contains("HTTP Error 500"));
    }

    #[tokio::test]
    async fn test_internal_failure_is_protocol_error() {
        let err = dispatcher().dispatch(call(json!("internal"))).await.unwrap_err();
        assert!(err.is_internal());
    }

    #[tokio::test]
    async fn test_panics_are_contained() {
        let d = dispatcher();
        let err = d.dispatch(call(json!("panic"))).await.unwrap_err();
        assert_eq!(
            err,
            DispatchError::Internal {
                tool: "echo".into(),
                message: "handler exploded".into()
            }
        );

        let err = d.dispatch(call(json!("prepare-panic"))).await.unwrap_err();
        assert!(err.is_internal());

        // The dispatcher keeps serving after a panic.
        assert!(d.dispatch(call(json!("still alive"))).await.is_ok());
    }

    #[test]
    fn test_call_request_accepts_tool_name_alias() {
        let req: ToolCallRequest =
            serde_json::from_value(json!({"toolName": "echo", "arguments": null})).unwrap();
        assert_eq!(req.name, "echo");
        assert_eq!(req.arguments, None);
    }
}
