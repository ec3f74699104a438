//! Tool definitions module.
//!
//! This module exports all available tool definitions.
//! Each tool is defined in its own file for better maintainability.

pub mod basic;
pub mod users;
pub mod weather;

pub use basic::{AddParams, AddTool, HelloParams, HelloTool};
pub use users::{ListUsersParams, ListUsersTool, SearchUsersParams, SearchUsersTool};
pub use weather::{
    FetchWeatherParams, FetchWeatherTool, WeatherExecuteParams, WeatherExecuteTool, WeatherParams,
    WeatherTool,
};
