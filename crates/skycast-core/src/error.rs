//! Centralized error types for the application
//!
//! Leaf crates define their own error enums; this module aggregates them
//! behind [`AppError`] and gives every failure a user-facing message. No
//! failure here is fatal to a running session: provider problems surface
//! as informational text, persistence problems as non-blocking warnings.

use std::path::PathBuf;

use thiserror::Error;

use skycast_model::{ModelError, StoreError};
use skycast_weather::WeatherError;

/// Top-level application error.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Weather provider error: {0}")]
    Weather(#[from] WeatherError),

    #[error("Observation store error: {0}")]
    Store(#[from] StoreError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Weather(e) => e.user_message(),
            AppError::Store(e) => e.user_message(),
            AppError::Model(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config file is malformed: {0}")]
    Parse(String),

    #[error("Could not serialize configuration: {0}")]
    Serialize(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not determine the platform config directory")]
    NoConfigDir,
}

impl ConfigError {
    /// Returns a user-friendly message suitable for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } | ConfigError::Write { .. } => {
                "Could not access the configuration file."
            }
            ConfigError::Parse(_) => "Configuration file is malformed. Check your settings.",
            ConfigError::Serialize(_) => "Configuration could not be saved.",
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::NoConfigDir => "Could not locate a configuration directory.",
        }
    }
}
