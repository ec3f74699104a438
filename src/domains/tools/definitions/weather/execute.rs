//! `Weather_Execute` - returns weather information for a city.

use futures::FutureExt;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, instrument};

use super::lookup;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::handler::{
    Arguments, PreparedCall, ToolDescriptor, ToolHandler, ToolResult, parse_params,
};

/// Parameters for the weather lookup tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct WeatherExecuteParams {
    /// City name.
    pub city: String,
}

/// Weather lookup tool.
pub struct WeatherExecuteTool {
    descriptor: ToolDescriptor,
}

impl WeatherExecuteTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "Weather_Execute";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Thực thi để lấy thông tin thời tiết";

    pub fn new() -> Self {
        Self {
            descriptor: ToolDescriptor::for_params::<WeatherExecuteParams>(
                Self::NAME,
                Self::DESCRIPTION,
            ),
        }
    }

    /// Look the city up. Unknown cities are not an error.
    #[instrument(skip_all, fields(city = %params.city))]
    pub fn execute(params: &WeatherExecuteParams) -> ToolResult {
        match lookup(&params.city) {
            Some(report) => {
                info!("Weather found");
                ToolResult::text(report)
            }
            None => {
                info!("No weather data for city");
                ToolResult::text(format!("Không có thông tin thời tiết cho {}", params.city))
            }
        }
    }
}

impl Default for WeatherExecuteTool {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolHandler for WeatherExecuteTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    fn prepare(&self, arguments: Arguments) -> Result<PreparedCall, ToolError> {
        let params: WeatherExecuteParams = parse_params(arguments)?;
        Ok(async move { Ok(Self::execute(&params)) }.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(city: &str) -> String {
        WeatherExecuteTool::execute(&WeatherExecuteParams {
            city: city.to_string(),
        })
        .first_text()
        .unwrap()
        .to_string()
    }

    #[test]
    fn test_known_city() {
        assert_eq!(run("Ha Noi"), "Hà Nội: 32°C, Nắng nhẹ");
        assert_eq!(run("DANANG"), "Đà Nẵng: 30°C, Mưa nhỏ");
    }

    #[test]
    fn test_unknown_city() {
        assert_eq!(run("Hue"), "Không có thông tin thời tiết cho Hue");
    }

    #[test]
    fn test_city_is_required() {
        let tool = WeatherExecuteTool::new();
        assert_eq!(tool.descriptor().required_arguments(), vec!["city"]);
    }
}
