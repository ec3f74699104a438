//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure that can be
//! populated from environment variables (optionally via a `.env` file) or
//! defaults.

use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Upstream user API configuration.
    pub upstream: UpstreamConfig,

    /// Remote weather API used by `fetch_weather`.
    pub weather_api: WeatherApiConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,

    /// Short description returned by the info endpoint.
    pub description: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Optional file that receives a copy of the log output.
    pub file: Option<PathBuf>,
}

/// Configuration for the upstream user API.
#[derive(Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL of the user API, without the `/api/v1/user/` suffix.
    pub base_url: String,

    /// Optional bearer token.
    pub api_key: Option<String>,

    /// Upper bound on a single fetch, in seconds.
    pub timeout_secs: u64,
}

impl UpstreamConfig {
    /// Fetch timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Configuration for the remote weather API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherApiConfig {
    /// Base URL; the city is appended as the last path segment.
    pub base_url: String,
}

impl Default for WeatherApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.weather.com".to_string(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "simple-info-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                description: "MCP server providing weather information and user search"
                    .to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: None,
            },
            transport: TransportConfig::default(),
            upstream: UpstreamConfig::default(),
            weather_api: WeatherApiConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `MCP_`.
    /// For example: `MCP_SERVER_NAME`, `MCP_LOG_LEVEL`, `MCP_UPSTREAM_URL`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(file) = std::env::var("MCP_LOG_FILE") {
            config.logging.file = Some(PathBuf::from(file));
        }

        // Load transport configuration from environment
        config.transport = TransportConfig::from_env();

        if let Ok(base_url) = std::env::var("MCP_UPSTREAM_URL") {
            config.upstream.base_url = base_url;
        } else {
            warn!(
                "MCP_UPSTREAM_URL not set - user tools will query {}",
                config.upstream.base_url
            );
        }

        if let Ok(api_key) = std::env::var("MCP_UPSTREAM_API_KEY") {
            config.upstream.api_key = Some(api_key);
            info!("Upstream API key loaded from environment");
        }

        if let Ok(timeout) = std::env::var("MCP_UPSTREAM_TIMEOUT_SECS") {
            match timeout.parse::<u64>() {
                Ok(secs) if secs > 0 => config.upstream.timeout_secs = secs,
                _ => warn!(
                    "Ignoring invalid MCP_UPSTREAM_TIMEOUT_SECS={:?}, using {}s",
                    timeout, config.upstream.timeout_secs
                ),
            }
        }

        if let Ok(base_url) = std::env::var("MCP_WEATHER_API_URL") {
            config.weather_api.base_url = base_url;
        }

        config
    }
}
