//! OpenWeatherMap forecast client
//!
//! Talks to the 5-day/3-hour forecast endpoint and collapses its entries
//! into daily outlooks. Temperature is the maximum over the day's entries,
//! rain probability the maximum probability, and the remaining readings
//! come from the day's last entry that reports them.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, Local, NaiveDate, NaiveDateTime};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::provider::ForecastProvider;
use crate::types::{DayOutlook, TwoDayForecast, WeatherError};

const FORECAST_PATH: &str = "data/2.5/forecast";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    list: Vec<ForecastEntry>,
}

/// One 3-hourly entry from the forecast endpoint.
#[derive(Debug, Deserialize)]
struct ForecastEntry {
    dt_txt: String,
    main: MainReadings,
    wind: Option<WindReadings>,
    #[serde(default)]
    pop: f64,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp_max: f64,
    humidity: Option<f64>,
    pressure: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WindReadings {
    speed: Option<f64>,
}

/// Client for the OpenWeatherMap forecast API.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    base_url: Url,
    client: Arc<Client>,
    api_key: String,
}

impl OpenWeatherClient {
    /// Create a client against `base_url` (scheme and host only; the
    /// forecast path is appended per request).
    pub fn new(base_url: &str, api_key: String) -> Result<Self, WeatherError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| WeatherError::Parse(format!("invalid base URL: {e}")))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            base_url,
            client: Arc::new(client),
            api_key,
        })
    }

    async fn request_entries(&self, city: &str) -> Result<Vec<ForecastEntry>, WeatherError> {
        let url = self
            .base_url
            .join(FORECAST_PATH)
            .map_err(|e| WeatherError::Parse(format!("invalid forecast URL: {e}")))?;

        tracing::debug!("Fetching forecast for {}", city);

        let response = self
            .client
            .get(url)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(WeatherError::CityNotFound(city.to_string())),
            StatusCode::UNAUTHORIZED => return Err(WeatherError::InvalidApiKey),
            status if !status.is_success() => return Err(WeatherError::Status(status.as_u16())),
            _ => {}
        }

        let body: ForecastResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(e.to_string()))?;

        tracing::debug!("Received {} forecast entries for {}", body.list.len(), city);
        Ok(body.list)
    }
}

#[async_trait]
impl ForecastProvider for OpenWeatherClient {
    async fn fetch_forecast(&self, city: &str) -> Result<TwoDayForecast, WeatherError> {
        let entries = self.request_entries(city).await?;
        let today = Local::now().date_naive();
        select_two_days(city, &entries, today)
    }
}

/// Running per-day aggregate over 3-hourly entries.
#[derive(Debug)]
struct DayReadings {
    temp_max: f64,
    pop_max: f64,
    humidity: Option<f64>,
    pressure: Option<f64>,
    wind_speed: Option<f64>,
}

fn aggregate_days(entries: &[ForecastEntry]) -> BTreeMap<NaiveDate, DayReadings> {
    let mut days: BTreeMap<NaiveDate, DayReadings> = BTreeMap::new();

    for entry in entries {
        let date = match NaiveDateTime::parse_from_str(&entry.dt_txt, TIMESTAMP_FORMAT) {
            Ok(dt) => dt.date(),
            Err(e) => {
                tracing::debug!("Skipping forecast entry with bad timestamp {:?}: {}", entry.dt_txt, e);
                continue;
            }
        };
        let wind_speed = entry.wind.as_ref().and_then(|w| w.speed);

        match days.entry(date) {
            Entry::Vacant(slot) => {
                slot.insert(DayReadings {
                    temp_max: entry.main.temp_max,
                    pop_max: entry.pop,
                    humidity: entry.main.humidity,
                    pressure: entry.main.pressure,
                    wind_speed,
                });
            }
            Entry::Occupied(mut slot) => {
                let day = slot.get_mut();
                day.temp_max = day.temp_max.max(entry.main.temp_max);
                day.pop_max = day.pop_max.max(entry.pop);
                // An entry that omits a reading must not blank an earlier one.
                day.humidity = entry.main.humidity.or(day.humidity);
                day.pressure = entry.main.pressure.or(day.pressure);
                day.wind_speed = wind_speed.or(day.wind_speed);
            }
        }
    }

    days
}

fn outlook_for(date: NaiveDate, readings: &DayReadings) -> DayOutlook {
    DayOutlook {
        date,
        temperature: readings.temp_max,
        rain_probability: Some((readings.pop_max * 100.0) as u8),
        humidity: readings.humidity,
        pressure: readings.pressure,
        wind_speed: readings.wind_speed,
    }
}

fn select_two_days(
    city: &str,
    entries: &[ForecastEntry],
    today: NaiveDate,
) -> Result<TwoDayForecast, WeatherError> {
    let days = aggregate_days(entries);
    let tomorrow_date = today + Days::new(1);
    let day_after_date = today + Days::new(2);

    let tomorrow = days
        .get(&tomorrow_date)
        .map(|readings| outlook_for(tomorrow_date, readings))
        .ok_or(WeatherError::NoForecast)?;
    let day_after = days
        .get(&day_after_date)
        .map(|readings| outlook_for(day_after_date, readings));

    Ok(TwoDayForecast {
        city: city.to_string(),
        tomorrow,
        day_after,
    })
}
