//! Provider abstraction over forecast sources

use async_trait::async_trait;

use crate::types::{TwoDayForecast, WeatherError};

/// A source of two-day city forecasts.
///
/// Implementations are expected to resolve the city name themselves and to
/// report unknown cities as [`WeatherError::CityNotFound`].
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    /// Fetch the forecast for tomorrow and the day after for `city`.
    async fn fetch_forecast(&self, city: &str) -> Result<TwoDayForecast, WeatherError>;
}
