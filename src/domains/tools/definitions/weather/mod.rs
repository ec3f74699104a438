//! Weather tools module.
//!
//! Two tools share a small built-in weather table:
//! - `describe`: `Weather_Tool`, explains how to obtain weather data
//! - `execute`: `Weather_Execute`, looks a city up in the table
//!
//! `fetch`: `fetch_weather` asks a remote weather API instead.

pub mod describe;
pub mod execute;
pub mod fetch;

pub use describe::{WeatherParams, WeatherTool};
pub use execute::{WeatherExecuteParams, WeatherExecuteTool};
pub use fetch::{FetchWeatherParams, FetchWeatherTool};

/// Built-in weather table, keyed by normalized city name.
const WEATHER_TABLE: &[(&str, &str)] = &[
    ("hanoi", "Hà Nội: 32°C, Nắng nhẹ"),
    ("saigon", "Sài Gòn: 34°C, Có mây"),
    ("danang", "Đà Nẵng: 30°C, Mưa nhỏ"),
];

/// Normalize a city name into a table key: lowercase, ASCII spaces removed.
/// Other whitespace is kept.
pub fn city_key(city: &str) -> String {
    city.to_lowercase().replace(' ', "")
}

/// Look up the weather report for a city.
pub fn lookup(city: &str) -> Option<&'static str> {
    let key = city_key(city);
    WEATHER_TABLE
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, report)| *report)
}

/// Cities known to the table, for help texts.
pub fn known_cities() -> Vec<&'static str> {
    WEATHER_TABLE.iter().map(|(k, _)| *k).collect()
}
