//! Server info resource definition.

use serde_json::json;

use super::ResourceDefinition;
use crate::core::config::ServerConfig;

/// Server information resource.
pub struct ServerInfoResource;

impl ResourceDefinition for ServerInfoResource {
    const URI: &'static str = "mcp://server/info";
    const NAME: &'static str = "Server Information";
    const DESCRIPTION: &'static str = "Information about this MCP server";
    const MIME_TYPE: &'static str = "application/json";

    fn content(server: &ServerConfig) -> String {
        let info = json!({
            "name": server.name,
            "version": server.version,
            "description": server.description,
        });
        format!("{:#}", info)
    }
}
