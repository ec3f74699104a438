//! Basic tools: greeting and arithmetic.

pub mod add;
pub mod hello;

pub use add::{AddParams, AddTool};
pub use hello::{HelloParams, HelloTool};
