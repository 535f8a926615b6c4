//! Model input assembly
//!
//! Training and inference must present columns in the same order. Both go
//! through [`feature_vector`], and [`FEATURE_NAMES`] is recorded in every
//! artifact so a model trained under a different layout is rejected at
//! load time.

use chrono::{Datelike, NaiveDate};

/// Column order of the model input.
pub const FEATURE_NAMES: [&str; 7] = [
    "model_temperature",
    "humidity",
    "pressure",
    "wind_speed",
    "day_of_year",
    "month",
    "day_of_week",
];

/// Number of input columns.
pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

/// Calendar features derived from a forecast date.
///
/// Weekday numbering is fixed at Monday = 0 through Sunday = 6 so that
/// models survive library upgrades without silently shifting a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFeatures {
    /// 1 through 365, or 366 in leap years
    pub day_of_year: u16,
    /// 1 through 12
    pub month: u8,
    /// 0 (Monday) through 6 (Sunday)
    pub day_of_week: u8,
}

impl CalendarFeatures {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            day_of_year: date.ordinal() as u16,
            month: date.month() as u8,
            day_of_week: date.weekday().num_days_from_monday() as u8,
        }
    }
}

/// Assemble the full model input for one forecast.
pub fn feature_vector(
    model_temperature: f64,
    humidity: f64,
    pressure: f64,
    wind_speed: f64,
    date: NaiveDate,
) -> [f64; FEATURE_COUNT] {
    let calendar = CalendarFeatures::from_date(date);
    [
        model_temperature,
        humidity,
        pressure,
        wind_speed,
        f64::from(calendar.day_of_year),
        f64::from(calendar.month),
        f64::from(calendar.day_of_week),
    ]
}
