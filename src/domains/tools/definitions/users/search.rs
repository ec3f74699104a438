//! `search_users` - flexible multi-field user search.
//!
//! Criteria format:
//!
//! ```json
//! {
//!   "search_criteria": {
//!     "fullname": "nguyen",
//!     "email": { "operator": "ends_with", "value": "@adavigo.com" }
//!   },
//!   "limit": 20
//! }
//! ```
//!
//! Criteria are parsed in `prepare()`, so a bad operator is rejected before
//! the upstream is contacted.

use futures::FutureExt;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

use super::common::{effective_limit, fetch_users, format_users, summary_line};
use crate::domains::search::{self, SearchCriteria};
use crate::domains::tools::error::ToolError;
use crate::domains::tools::handler::{
    Arguments, PreparedCall, ToolDescriptor, ToolHandler, ToolResult, parse_params,
};
use crate::domains::upstream::RecordSource;

/// Parameters for the user search tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchUsersParams {
    /// Field criteria. Each value is either a plain string (case-insensitive
    /// "contains") or an object `{"operator": "contains|equals|starts_with|ends_with", "value": "..."}`.
    /// All criteria must match.
    pub search_criteria: Map<String, Value>,

    /// Maximum number of results (default: 20, max: 100).
    #[serde(default)]
    pub limit: Option<usize>,
}

/// User search tool.
pub struct SearchUsersTool {
    descriptor: ToolDescriptor,
    source: Arc<dyn RecordSource>,
    timeout: Duration,
}

impl SearchUsersTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "search_users";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Search users by one or more fields. Every criterion must match (AND). \
        A plain string value matches case-insensitively as a substring; use \
        {\"operator\": \"contains|equals|starts_with|ends_with\", \"value\": \"...\"} for other comparisons. \
        Returns at most `limit` users (default 20, max 100) in directory order.";

    pub fn new(source: Arc<dyn RecordSource>, timeout: Duration) -> Self {
        Self {
            descriptor: ToolDescriptor::for_params::<SearchUsersParams>(
                Self::NAME,
                Self::DESCRIPTION,
            ),
            source,
            timeout,
        }
    }

    /// Fetch, filter and render.
    #[instrument(skip_all, fields(criteria = %criteria.describe(), limit = limit))]
    pub async fn execute(
        source: &dyn RecordSource,
        timeout: Duration,
        criteria: &SearchCriteria,
        limit: usize,
    ) -> Result<ToolResult, ToolError> {
        if let Some(field) = criteria.first_empty_value() {
            return Err(ToolError::execution_failed(format!(
                "Search value for field '{}' must not be empty",
                field
            )));
        }

        let users = fetch_users(source, timeout).await?;
        let scanned = users.len();
        let (total, kept) = search::search(users, criteria, limit);
        info!("Matched {} of {} users", total, scanned);

        if kept.is_empty() {
            return Ok(ToolResult::text(format!(
                "No users found matching {}.",
                criteria.describe()
            )));
        }

        Ok(ToolResult::text(format!(
            "{}\n{}",
            summary_line("Found", total, kept.len()),
            format_users(&kept)?
        )))
    }
}

impl ToolHandler for SearchUsersTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    fn prepare(&self, arguments: Arguments) -> Result<PreparedCall, ToolError> {
        let params: SearchUsersParams = parse_params(arguments)?;
        let criteria = SearchCriteria::from_map(&params.search_criteria)?;
        let limit = effective_limit(params.limit);

        let source = self.source.clone();
        let timeout = self.timeout;
        Ok(async move { Self::execute(source.as_ref(), timeout, &criteria, limit).await }.boxed())
    }
}
