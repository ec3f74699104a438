//! `list_users` - list the user directory.

use futures::FutureExt;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::common::{effective_limit, fetch_users, format_users, summary_line};
use crate::domains::search::truncate;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::handler::{
    Arguments, PreparedCall, ToolDescriptor, ToolHandler, ToolResult, parse_params,
};
use crate::domains::upstream::RecordSource;

/// Parameters for the user listing tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListUsersParams {
    /// Maximum number of users to return (default: 20, max: 100).
    #[serde(default)]
    pub limit: Option<usize>,
}

/// User listing tool.
pub struct ListUsersTool {
    descriptor: ToolDescriptor,
    source: Arc<dyn RecordSource>,
    timeout: Duration,
}

impl ListUsersTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "list_users";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str =
        "List users from the user directory in directory order (default 20, max 100).";

    pub fn new(source: Arc<dyn RecordSource>, timeout: Duration) -> Self {
        Self {
            descriptor: ToolDescriptor::for_params::<ListUsersParams>(Self::NAME, Self::DESCRIPTION),
            source,
            timeout,
        }
    }

    pub async fn execute(
        source: &dyn RecordSource,
        timeout: Duration,
        limit: usize,
    ) -> Result<ToolResult, ToolError> {
        let users = fetch_users(source, timeout).await?;
        let total = users.len();
        info!("Listing {} users (limit {})", total, limit);

        if users.is_empty() {
            return Ok(ToolResult::text("The user directory is empty."));
        }

        let kept = truncate(users, limit);
        Ok(ToolResult::text(format!(
            "{}\n{}",
            summary_line("Fetched", total, kept.len()),
            format_users(&kept)?
        )))
    }
}

impl ToolHandler for ListUsersTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    fn prepare(&self, arguments: Arguments) -> Result<PreparedCall, ToolError> {
        let params: ListUsersParams = parse_params(arguments)?;
        let limit = effective_limit(params.limit);
        let source = self.source.clone();
        let timeout = self.timeout;
        Ok(async move { Self::execute(source.as_ref(), timeout, limit).await }.boxed())
    }
}
