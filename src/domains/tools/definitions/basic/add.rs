//! Add tool definition - adds two integers.

use futures::FutureExt;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::debug;

use crate::domains::tools::error::ToolError;
use crate::domains::tools::handler::{
    Arguments, PreparedCall, ToolDescriptor, ToolHandler, ToolResult, parse_params,
};

/// Parameters for the add tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AddParams {
    /// First operand.
    pub a: i64,

    /// Second operand.
    pub b: i64,
}

/// Integer addition tool.
pub struct AddTool {
    descriptor: ToolDescriptor,
}

impl AddTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "add";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Add two integers";

    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor::for_params::<AddParams>(Self::NAME, Self::DESCRIPTION),
        }
    }

    pub fn execute(params: &AddParams) -> Result<ToolResult, ToolError> {
        let sum = params.a.checked_add(params.b).ok_or_else(|| {
            ToolError::execution_failed(format!("{} + {} overflows a 64-bit integer", params.a, params.b))
        })?;
        debug!("{} + {} = {}", params.a, params.b, sum);
        Ok(ToolResult::text(sum.to_string()))
    }
}

impl Default for AddTool {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolHandler for AddTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    fn prepare(&self, arguments: Arguments) -> Result<PreparedCall, ToolError> {
        let params: AddParams = parse_params(arguments)?;
        Ok(async move { Self::execute(&params) }.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add() {
        let result = AddTool::execute(&AddParams { a: 2, b: -5 }).unwrap();
        assert_eq!(result.first_text(), Some("-3"));
    }

    #[test]
    fn test_add_overflow_is_execution_failure() {
        let err = AddTool::execute(&AddParams { a: i64::MAX, b: 1 }).unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed(_)));
    }

    #[test]
    fn test_add_rejects_non_integers() {
        let tool = AddTool::new();
        let args = json!({"a": "two", "b": 2}).as_object().unwrap().clone();
        assert!(matches!(tool.prepare(args), Err(ToolError::InvalidArguments(_))));
        let mut required = tool.descriptor().required_arguments();
        required.sort_unstable();
        assert_eq!(required, vec!["a", "b"]);
    }
}
