//! Tools domain module.
//!
//! This module handles all tool-related functionality for the MCP server.
//! Tools are executable functions that can be called by MCP clients to perform
//! specific actions or computations.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual tool implementations (one file per tool)
//! - `handler.rs` - The `ToolHandler` contract and result types
//! - `registry.rs` - Name-indexed tool registry and built-in tool wiring
//! - `dispatcher.rs` - Call validation, execution and error classification
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in `definitions/` (e.g., `my_tool.rs`)
//! 2. Define a params struct deriving `Deserialize` + `JsonSchema`
//! 3. Implement `ToolHandler` (`descriptor()` and `prepare()`)
//! 4. Register it in `build_tool_registry()` in `registry.rs`
//!
//! **No need to modify the dispatcher or the transports!**

pub mod definitions;
mod dispatcher;
mod error;
mod handler;
mod registry;

pub use dispatcher::{CallState, DispatchError, Dispatcher, ToolCallRequest};
pub use error::ToolError;
pub use handler::{
    Arguments, Content, PreparedCall, ToolDescriptor, ToolHandler, ToolResult, parse_params,
    schema_for_params,
};
pub use registry::{ToolRegistry, build_tool_registry};
