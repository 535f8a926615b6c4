//! Application context and the forecast cycle
//!
//! Wires the configured provider, the newest trained model, and the
//! observation log together once at startup, then runs the
//! fetch-predict-log cycle per request.

use anyhow::{Context, Result};
use chrono::Local;

use skycast_core::{AppError, Config};
use skycast_model::{
    ObservationLog, ObservationRecord, Prediction, TemperaturePredictor, Unavailability,
};
use skycast_weather::{DayOutlook, ForecastProvider, OfflineProvider, OpenWeatherClient};

/// One day of the rendered forecast: provider values plus the model's
/// verdict for that day.
#[derive(Debug, Clone)]
pub struct DayReport {
    pub outlook: DayOutlook,
    pub model: Prediction,
}

impl DayReport {
    /// The temperature shown to the user and logged as the model value:
    /// the prediction when there is one, the provider value otherwise.
    pub fn displayed_temperature(&self) -> f64 {
        match self.model {
            Prediction::Predicted(value) => value,
            Prediction::Unavailable(_) => self.outlook.temperature,
        }
    }
}

/// Everything the presentation layer needs for one forecast request.
#[derive(Debug, Clone)]
pub struct ForecastView {
    pub city: String,
    pub days: Vec<DayReport>,
    /// Set when observation logging failed; shown as a non-blocking warning
    pub log_warning: Option<String>,
}

/// Application context, wired once at startup.
pub struct App {
    provider: Box<dyn ForecastProvider>,
    predictor: TemperaturePredictor,
    log: ObservationLog,
}

impl App {
    pub fn new(config: &Config) -> Result<Self> {
        let provider: Box<dyn ForecastProvider> = match &config.weather.api_key {
            Some(key) => Box::new(
                OpenWeatherClient::new(&config.weather.base_url, key.clone())
                    .context("Failed to create weather client")?,
            ),
            None => {
                tracing::warn!("No weather API key configured; serving built-in offline forecasts");
                Box::new(OfflineProvider::new())
            }
        };

        let predictor = TemperaturePredictor::load(&config.models_dir());
        let log = ObservationLog::new(config.observation_log_path());

        Ok(Self {
            provider,
            predictor,
            log,
        })
    }

    /// Run one forecast cycle: fetch, predict, log.
    ///
    /// The model is consulted for tomorrow only. Both days are appended to
    /// the observation log, the day after tomorrow with the provider
    /// temperature standing in for the model value. Logging failures never
    /// fail the forecast.
    pub async fn forecast(&self, city: &str) -> Result<ForecastView, AppError> {
        let forecast = self.provider.fetch_forecast(city).await?;

        let tomorrow = forecast.tomorrow;
        let model = self.predictor.predict(
            tomorrow.temperature,
            tomorrow.date,
            tomorrow.humidity,
            tomorrow.pressure,
            tomorrow.wind_speed,
        );

        let mut days = vec![DayReport {
            outlook: tomorrow,
            model,
        }];
        if let Some(outlook) = forecast.day_after {
            days.push(DayReport {
                outlook,
                model: Prediction::Unavailable(Unavailability::NotPredicted),
            });
        }

        let log_warning = self.log_observations(&forecast.city, &days);

        Ok(ForecastView {
            city: forecast.city,
            days,
            log_warning,
        })
    }

    /// Append one row per displayed day. Returns a user-facing warning when
    /// any append failed.
    fn log_observations(&self, city: &str, days: &[DayReport]) -> Option<String> {
        let logged_at = Local::now().naive_local();
        let mut warning = None;

        for day in days {
            let record = ObservationRecord {
                logged_at,
                city: city.to_string(),
                forecast_date: day.outlook.date,
                model_temperature: day.displayed_temperature(),
                api_temperature: day.outlook.temperature,
                humidity: day.outlook.humidity,
                pressure: day.outlook.pressure,
                wind_speed: day.outlook.wind_speed,
            };
            if let Err(e) = self.log.append(&record) {
                tracing::warn!("Observation logging failed: {}", e);
                warning = Some(e.user_message().to_string());
            }
        }

        warning
    }
}
