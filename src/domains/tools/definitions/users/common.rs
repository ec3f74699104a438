//! Helpers shared by the user tools.

use std::time::Duration;
use tracing::warn;

use crate::domains::search::{DEFAULT_LIMIT, UserRecord, clamp_limit};
use crate::domains::tools::error::ToolError;
use crate::domains::upstream::{RecordSource, UpstreamError};

/// Effective result limit. An absent or `null` limit means the default.
pub fn effective_limit(limit: Option<usize>) -> usize {
    clamp_limit(limit.unwrap_or(DEFAULT_LIMIT))
}

/// Fetch all users, bounded by `timeout`.
///
/// Timeouts and upstream failures are logged and returned as
/// [`ToolError::Upstream`].
pub async fn fetch_users(
    source: &dyn RecordSource,
    timeout: Duration,
) -> Result<Vec<UserRecord>, ToolError> {
    let fetched = tokio::time::timeout(timeout, source.fetch_records())
        .await
        .map_err(|_| UpstreamError::Timeout(timeout));

    match fetched {
        Ok(Ok(records)) => Ok(records),
        Ok(Err(err)) | Err(err) => {
            warn!("Failed to fetch users: {}", err);
            Err(ToolError::Upstream(err))
        }
    }
}

/// Render records as pretty-printed JSON.
pub fn format_users(records: &[UserRecord]) -> Result<String, ToolError> {
    serde_json::to_string_pretty(records)
        .map_err(|e| ToolError::internal(format!("failed to encode users: {}", e)))
}

/// Header line such as `Found 3 users (showing 2):`.
pub fn summary_line(verb: &str, total: usize, shown: usize) -> String {
    let noun = if total == 1 { "user" } else { "users" };
    if shown < total {
        format!("{} {} {} (showing first {}):", verb, total, noun, shown)
    } else {
        format!("{} {} {}:", verb, total, noun)
    }
}
