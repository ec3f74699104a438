//! HTTP client for the upstream user API.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use super::error::{UpstreamError, UpstreamResult};
use crate::core::config::UpstreamConfig;
use crate::domains::search::UserRecord;

/// Path of the user listing endpoint, relative to the base URL.
pub const USERS_PATH: &str = "/api/v1/user/";

/// Source of user records.
///
/// Implementations may block on I/O; callers bound the fetch with their own
/// timeout.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch the full current record set.
    async fn fetch_records(&self) -> UpstreamResult<Vec<UserRecord>>;
}

/// `RecordSource` backed by the upstream REST API.
pub struct HttpRecordSource {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpRecordSource {
    /// Create a client from configuration.
    pub fn new(config: &UpstreamConfig) -> UpstreamResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| UpstreamError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Full URL of the user listing endpoint.
    pub fn users_url(&self) -> String {
        format!("{}{}", self.base_url, USERS_PATH)
    }
}

#[async_trait]
impl RecordSource for HttpRecordSource {
    #[instrument(skip(self), fields(url = %self.users_url()))]
    async fn fetch_records(&self) -> UpstreamResult<Vec<UserRecord>> {
        let mut request = self.client.get(self.users_url());
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Request(format!("request timed out: {}", e))
            } else {
                UpstreamError::from(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = UpstreamError::Status {
                status: status.as_u16(),
                body,
            };
            warn!("{}", err);
            return Err(err);
        }

        let payload: Value = response.json().await?;
        let records = parse_records(payload)?;
        debug!("Fetched {} user records", records.len());
        Ok(records)
    }
}

/// Interpret an upstream payload as a list of records.
///
/// Accepts a bare array or an object wrapping the array under `data`.
pub(crate) fn parse_records(payload: Value) -> UpstreamResult<Vec<UserRecord>> {
    let items = match payload {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(UpstreamError::Payload(
                    "expected an array of users or an object with a 'data' array".to_string(),
                ));
            }
        },
        other => {
            return Err(UpstreamError::Payload(format!(
                "expected an array of users, got {}",
                json_kind(&other)
            )));
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            UserRecord::try_from(item).map_err(|v| {
                UpstreamError::Payload(format!("user #{} is {}, not an object", i, json_kind(&v)))
            })
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
