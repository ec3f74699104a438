//! Hello tool definition.

use futures::FutureExt;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;

use crate::domains::tools::error::ToolError;
use crate::domains::tools::handler::{
    Arguments, PreparedCall, ToolDescriptor, ToolHandler, ToolResult, parse_params,
};

/// Parameters for the hello tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct HelloParams {
    /// Name to greet.
    pub name: Option<String>,
}

/// A simple hello world tool.
pub struct HelloTool {
    descriptor: ToolDescriptor,
}

impl HelloTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "hello";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "A simple hello world tool";

    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor::for_params::<HelloParams>(Self::NAME, Self::DESCRIPTION),
        }
    }

    pub fn execute(params: &HelloParams) -> ToolResult {
        info!("Hello tool called with: {:?}", params);
        let message = match params.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => format!("Hello, {}!", name),
            _ => "Hello, World!".to_string(),
        };
        ToolResult::text(message)
    }
}

impl Default for HelloTool {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolHandler for HelloTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    fn prepare(&self, arguments: Arguments) -> Result<PreparedCall, ToolError> {
        let params: HelloParams = parse_params(arguments)?;
        Ok(async move { Ok(Self::execute(&params)) }.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hello_default() {
        let result = HelloTool::execute(&HelloParams::default());
        assert_eq!(result.first_text(), Some("Hello, World!"));
    }

    #[test]
    fn test_hello_name() {
        let result = HelloTool::execute(&HelloParams {
            name: Some("Lan".into()),
        });
        assert_eq!(result.first_text(), Some("Hello, Lan!"));
    }
}
