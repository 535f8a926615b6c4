//! Shared forecast data types and provider errors

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Aggregated outlook for one calendar day.
///
/// The temperature is the expected daily maximum in degrees Celsius. The
/// contextual readings come from whichever 3-hourly entry the provider
/// listed last for the day and may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayOutlook {
    pub date: NaiveDate,
    /// Expected daily maximum in degrees Celsius
    pub temperature: f64,
    /// Chance of rain in percent (0-100)
    pub rain_probability: Option<u8>,
    /// Relative humidity in percent
    pub humidity: Option<f64>,
    /// Atmospheric pressure in hPa
    pub pressure: Option<f64>,
    /// Wind speed in m/s
    pub wind_speed: Option<f64>,
}

/// Forecast for tomorrow and, when the provider covers it, the day after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoDayForecast {
    /// City name as the user entered it
    pub city: String,
    pub tomorrow: DayOutlook,
    pub day_after: Option<DayOutlook>,
}

/// Errors from fetching or interpreting a forecast.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("City not found: {0}")]
    CityNotFound(String),

    #[error("Weather API rejected the configured key")]
    InvalidApiKey,

    #[error("No forecast entries cover tomorrow")]
    NoForecast,

    #[error("Weather API returned status {0}")]
    Status(u16),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected response from the weather API: {0}")]
    Parse(String),
}

impl WeatherError {
    /// Returns a user-friendly message suitable for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::CityNotFound(_) => "City not found. Check the spelling and try again.",
            WeatherError::InvalidApiKey => "Weather API key is invalid. Check your settings.",
            WeatherError::NoForecast => "Weather data is unavailable for this city right now.",
            WeatherError::Status(_) => "Weather service error. Please try again later.",
            WeatherError::Network(_) => "Unable to connect. Check your internet connection.",
            WeatherError::Parse(_) => "Received an unexpected response from the weather service.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_not_found_keeps_city_name() {
        let err = WeatherError::CityNotFound("Atlantis".to_string());
        assert_eq!(err.to_string(), "City not found: Atlantis");
    }

    #[test]
    fn test_user_messages_are_not_empty() {
        let errors = [
            WeatherError::CityNotFound("x".to_string()),
            WeatherError::InvalidApiKey,
            WeatherError::NoForecast,
            WeatherError::Status(500),
            WeatherError::Parse("bad".to_string()),
        ];
        for err in errors {
            assert!(!err.user_message().is_empty());
        }
    }
}
