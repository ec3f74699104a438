//! STDIO transport implementation.
//!
//! Standard input/output transport for MCP - the default and recommended mode.
//! stdout carries protocol frames only; logs go to stderr.

use tokio::io::BufReader;
use tracing::info;

use super::TransportResult;
use crate::core::McpServer;
use crate::core::protocol::Session;

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Run the STDIO transport until stdin is closed.
    pub async fn run(server: McpServer) -> TransportResult<()> {
        info!("Ready - communicating via stdin/stdout");

        let reader = BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();
        Session::new(server, reader, writer, "stdio").run().await?;

        info!("STDIO transport finished");
        Ok(())
    }
}
