//! `Weather_Tool` - describes how to get weather information.
//!
//! This tool does not look anything up; it tells the caller to use
//! `Weather_Execute` for real data.

use futures::FutureExt;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::info;

use super::known_cities;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::handler::{
    Arguments, PreparedCall, ToolDescriptor, ToolHandler, ToolResult, parse_params,
};

/// Parameters for the weather description tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct WeatherParams {
    /// City name.
    pub city: Option<String>,
}

/// Weather description tool.
pub struct WeatherTool {
    descriptor: ToolDescriptor,
}

impl WeatherTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "Weather_Tool";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Công cụ mô tả cách lấy thông tin thời tiết";

    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor::for_params::<WeatherParams>(Self::NAME, Self::DESCRIPTION),
        }
    }

    /// Build the usage text.
    pub fn execute(params: &WeatherParams) -> ToolResult {
        info!("Weather description requested (city: {:?})", params.city);

        let mut text = String::from(
            "Đây là công cụ để lấy thông tin thời tiết.\n\n\
             Tham số:\n\
             - city (bắt buộc): Tên thành phố cần lấy thông tin thời tiết\n\n",
        );
        text.push_str(&format!(
            "Sử dụng phiên bản Execute ({}) để lấy dữ liệu thực tế. Thành phố hỗ trợ: {}.",
            super::WeatherExecuteTool::NAME,
            known_cities().join(", ")
        ));
        ToolResult::text(text)
    }
}

impl Default for WeatherTool {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolHandler for WeatherTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    fn prepare(&self, arguments: Arguments) -> Result<PreparedCall, ToolError> {
        let params: WeatherParams = parse_params(arguments)?;
        Ok(async move { Ok(Self::execute(&params)) }.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describes_execute_tool() {
        let result = WeatherTool::execute(&WeatherParams::default());
        let text = result.first_text().unwrap();
        assert!(text.contains("Weather_Execute"));
        assert!(text.contains("hanoi"));
        assert!(!result.is_error);
    }

    #[test]
    fn test_schema_has_no_required_arguments() {
        let tool = WeatherTool::new();
        assert!(tool.descriptor().required_arguments().is_empty());
    }
}
