//! Append-only CSV observation log
//!
//! Each displayed forecast day becomes one row pairing the temperature that
//! was shown with the provider's value for the same day. Rows are never
//! edited or deleted; the header is written once, when the file is first
//! created. Single process, single writer.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Column order of the header and of every data row.
pub const LOG_COLUMNS: [&str; 8] = [
    "logged_at",
    "city",
    "forecast_date",
    "model_temperature",
    "api_temperature",
    "humidity",
    "pressure",
    "wind_speed",
];

/// One logged forecast day.
///
/// `model_temperature` is the value that was actually displayed, which is
/// the provider value whenever no model prediction was available.
/// `api_temperature` is the provider value and serves as the training
/// target. Absent contextual readings are written as empty fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRecord {
    pub logged_at: NaiveDateTime,
    pub city: String,
    pub forecast_date: NaiveDate,
    pub model_temperature: f64,
    pub api_temperature: f64,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub wind_speed: Option<f64>,
}

/// Errors from appending to the observation log.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to open observation log {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write to observation log {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Returns a user-friendly message suitable for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            StoreError::Open { .. } | StoreError::Write { .. } => {
                "Could not record this forecast for model training. The forecast itself is unaffected."
            }
        }
    }
}

/// Handle to the observation log file.
#[derive(Debug, Clone)]
pub struct ObservationLog {
    path: PathBuf,
}

impl ObservationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, creating the file and its header if needed.
    ///
    /// Appends are not rolled back on failure; a short write leaves the
    /// partial row in place for the reader's cleaning pass to drop.
    pub fn append(&self, record: &ObservationRecord) -> Result<(), StoreError> {
        let write_header = !self.path.exists();

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::Open {
                    path: self.path.clone(),
                    source,
                })?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| StoreError::Open {
                path: self.path.clone(),
                source,
            })?;

        if write_header {
            writeln!(file, "{}", LOG_COLUMNS.join(",")).map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;
        }

        writeln!(file, "{}", record.to_csv_row()).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;

        tracing::debug!(
            "Logged observation for {} on {}",
            record.city,
            record.forecast_date
        );
        Ok(())
    }
}

impl ObservationRecord {
    fn to_csv_row(&self) -> String {
        [
            csv_field(&self.logged_at.format("%Y-%m-%d %H:%M:%S").to_string()),
            csv_field(&self.city),
            csv_field(&self.forecast_date.format("%Y-%m-%d").to_string()),
            self.model_temperature.to_string(),
            self.api_temperature.to_string(),
            optional_field(self.humidity),
            optional_field(self.pressure),
            optional_field(self.wind_speed),
        ]
        .join(",")
    }
}

fn optional_field(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Quote a field only when it contains a delimiter, quote, or line break.
fn csv_field(raw: &str) -> String {
    let needs_quoting = raw.chars().any(|c| matches!(c, ',' | '"' | '\n' | '\r'));
    if needs_quoting {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}
