//! `fetch_weather` - current weather for a city from the remote weather API.
//!
//! The city becomes the last path segment of the configured base URL and the
//! response body is returned as-is.

use futures::FutureExt;
use reqwest::Url;
use schemars::JsonSchema;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::core::config::WeatherApiConfig;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::handler::{
    Arguments, PreparedCall, ToolDescriptor, ToolHandler, ToolResult, parse_params,
};
use crate::domains::upstream::{UpstreamError, UpstreamResult};

/// Parameters for the remote weather tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FetchWeatherParams {
    /// City name.
    pub city: String,
}

/// Remote weather tool.
pub struct FetchWeatherTool {
    descriptor: ToolDescriptor,
    client: reqwest::Client,
    base_url: Url,
}

impl FetchWeatherTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "fetch_weather";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str =
        "Fetch the current weather for a city from the remote weather API";

    pub fn new(config: &WeatherApiConfig, timeout: Duration) -> UpstreamResult<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            UpstreamError::Client(format!("invalid weather API URL {:?}: {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(UpstreamError::Client(format!(
                "weather API URL {:?} cannot take a path",
                config.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| UpstreamError::Client(e.to_string()))?;

        Ok(Self {
            descriptor: ToolDescriptor::for_params::<FetchWeatherParams>(
                Self::NAME,
                Self::DESCRIPTION,
            ),
            client,
            base_url,
        })
    }

    /// URL for one city. The city is percent-encoded as a single segment.
    pub fn city_url(&self, city: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(city);
        }
        url
    }

    #[instrument(skip_all, fields(url = %url))]
    pub async fn execute(client: reqwest::Client, url: Url) -> Result<ToolResult, ToolError> {
        let response = client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Request(format!("request timed out: {}", e))
            } else {
                UpstreamError::from(e)
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(UpstreamError::from)?;
        if !status.is_success() {
            let err = UpstreamError::Status {
                status: status.as_u16(),
                body,
            };
            warn!("{}", err);
            return Err(err.into());
        }

        debug!("Weather API answered with {} bytes", body.len());
        Ok(ToolResult::text(body))
    }
}

impl ToolHandler for FetchWeatherTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    fn prepare(&self, arguments: Arguments) -> Result<PreparedCall, ToolError> {
        let params: FetchWeatherParams = parse_params(arguments)?;
        if params.city.trim().is_empty() {
            return Err(ToolError::invalid_arguments("city must not be empty"));
        }

        let url = self.city_url(&params.city);
        let client = self.client.clone();
        Ok(async move { Self::execute(client, url).await }.boxed())
    }
}
