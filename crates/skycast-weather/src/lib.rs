//! Forecast providers for Skycast
//!
//! Fetches two-day city forecasts from OpenWeatherMap and aggregates the
//! provider's 3-hourly entries into one outlook per calendar day. When no
//! API key is configured, a built-in offline provider serves canned data
//! so the rest of the application still works.

pub mod offline;
pub mod openweather;
pub mod provider;
pub mod types;

pub use offline::OfflineProvider;
pub use openweather::OpenWeatherClient;
pub use provider::ForecastProvider;
pub use types::{DayOutlook, TwoDayForecast, WeatherError};
