//! User search MCP server library.
//!
//! A Model Context Protocol server that exposes a handful of tools over
//! stdio, TCP or HTTP (SSE). The interesting one is `search_users`, which
//! filters an upstream user directory with per-field criteria.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, JSON-RPC framing and sessions,
//!   the server context and the transports
//! - **domains**: business logic organized by bounded contexts
//!   - **tools**: tool handlers, the registry and the call dispatcher
//!   - **search**: user records, criteria and the matcher
//!   - **upstream**: the client for the user directory API
//!   - **resources**: readable resources and URI templates
//!
//! # Example
//!
//! ```rust,no_run
//! use user_search_mcp_server::core::{Config, McpServer, TransportService};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::new(config.clone())?;
//!     TransportService::new(config.transport).run(server).await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
