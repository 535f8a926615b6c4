//! Built-in forecasts served when no API key is configured

use async_trait::async_trait;
use chrono::{Days, Local};

use crate::provider::ForecastProvider;
use crate::types::{DayOutlook, TwoDayForecast, WeatherError};

/// Serves canned forecasts for a single demo city so the application can be
/// exercised end to end before any credentials are set up.
#[derive(Debug, Default, Clone)]
pub struct OfflineProvider;

impl OfflineProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ForecastProvider for OfflineProvider {
    async fn fetch_forecast(&self, city: &str) -> Result<TwoDayForecast, WeatherError> {
        if !city.eq_ignore_ascii_case("lyon") {
            return Err(WeatherError::CityNotFound(city.to_string()));
        }

        let today = Local::now().date_naive();
        Ok(TwoDayForecast {
            city: city.to_string(),
            tomorrow: DayOutlook {
                date: today + Days::new(1),
                temperature: 15.0,
                rain_probability: Some(15),
                humidity: Some(70.0),
                pressure: Some(1012.0),
                wind_speed: Some(5.0),
            },
            day_after: Some(DayOutlook {
                date: today + Days::new(2),
                temperature: 25.0,
                rain_probability: Some(50),
                humidity: Some(65.0),
                pressure: Some(1010.0),
                wind_speed: Some(7.0),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[tokio::test]
    async fn test_demo_city_is_case_insensitive() {
        let provider = OfflineProvider::new();

        for name in ["lyon", "Lyon", "LYON"] {
            let forecast = provider.fetch_forecast(name).await.unwrap();
            assert_eq!(forecast.tomorrow.temperature, 15.0);
            assert_eq!(forecast.city, name);
        }
    }

    #[tokio::test]
    async fn test_other_cities_are_not_found() {
        let provider = OfflineProvider::new();

        let result = provider.fetch_forecast("Paris").await;

        assert!(matches!(result, Err(WeatherError::CityNotFound(city)) if city == "Paris"));
    }

    #[tokio::test]
    async fn test_dates_are_tomorrow_and_day_after() {
        let provider = OfflineProvider::new();
        let today = Local::now().date_naive();

        let forecast = provider.fetch_forecast("Lyon").await.unwrap();

        assert_eq!(forecast.tomorrow.date, today + Days::new(1));
        let day_after = forecast.day_after.unwrap();
        assert_eq!(day_after.date, today + Days::new(2));
        assert_eq!(day_after.temperature, 25.0);
    }
}
