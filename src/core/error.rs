//! Error types and handling for the MCP server.
//!
//! This module defines the error type returned while assembling the server
//! from its domains. Transports report their own [`TransportError`].
//!
//! [`TransportError`]: super::transport::TransportError

use thiserror::Error;

/// A specialized Result type for MCP server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the MCP server.
#[derive(Debug, Error)]
pub enum Error {
    /// Error originating from the tools domain.
    #[error("Tool error: {0}")]
    Tool(#[from] crate::domains::tools::ToolError),

    /// Error originating from the upstream client.
    #[error("Upstream error: {0}")]
    Upstream(#[from] crate::domains::upstream::UpstreamError),
}
