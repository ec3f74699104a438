//! Tool Registry - central registration and lookup for all tools.
//!
//! This module provides:
//! - A name-indexed registry of tool handlers
//! - Tool metadata for listing, in registration order
//! - `build_tool_registry()`, the single place where built-in tools are wired

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::config::Config;
use crate::domains::upstream::RecordSource;

use super::definitions::{
    AddTool, FetchWeatherTool, HelloTool, ListUsersTool, SearchUsersTool, WeatherExecuteTool,
    WeatherTool,
};
use super::error::ToolError;
use super::handler::{ToolDescriptor, ToolHandler};

// ============================================================================
// Tool Registry
// ============================================================================

/// Tool registry - maps tool names to handlers.
///
/// Registration happens at startup. Once the registry is moved into the
/// dispatcher it is only ever read, so lookups need no locking.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn ToolHandler>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool.
    ///
    /// Fails if a tool with the same name is already registered.
    pub fn register(&mut self, tool: Arc<dyn ToolHandler>) -> Result<(), ToolError> {
        let name = tool.descriptor().name.clone();
        if self.index.contains_key(&name) {
            warn!("Rejecting duplicate tool registration: {}", name);
            return Err(ToolError::Duplicate(name));
        }
        debug!("Registered tool: {}", name);
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Builder-style registration.
    pub fn with_tool(mut self, tool: impl ToolHandler + 'static) -> Result<Self, ToolError> {
        self.register(Arc::new(tool))?;
        Ok(self)
    }

    /// Resolve a tool by name.
    pub fn resolve(&self, name: &str) -> Result<&dyn ToolHandler, ToolError> {
        self.index
            .get(name)
            .map(|&i| self.tools[i].as_ref())
            .ok_or_else(|| ToolError::not_found(name))
    }

    /// Metadata for all tools, in registration order.
    pub fn descriptors(&self) -> Vec<&ToolDescriptor> {
        self.tools.iter().map(|t| t.descriptor()).collect()
    }

    /// Get all tool names, in registration order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools
            .iter()
            .map(|t| t.descriptor().name.as_str())
            .collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Build the registry with all built-in tools.
///
/// User tools read from `source`. They and `fetch_weather` are bounded by the
/// configured upstream timeout.
pub fn build_tool_registry(
    config: &Config,
    source: Arc<dyn RecordSource>,
) -> Result<ToolRegistry, ToolError> {
    let timeout = config.upstream.timeout();

    ToolRegistry::new()
        .with_tool(WeatherTool::new())?
        .with_tool(WeatherExecuteTool::new())?
        .with_tool(HelloTool::new())?
        .with_tool(AddTool::new())?
        .with_tool(FetchWeatherTool::new(&config.weather_api, timeout)?)?
        .with_tool(SearchUsersTool::new(source.clone(), timeout))?
        .with_tool(ListUsersTool::new(source, timeout))
}
