//! Application configuration
//!
//! Loaded from a TOML file in the platform config directory; a default
//! file is written on first run. The WEATHER_API_KEY environment variable
//! always wins over the file, matching how the key is provisioned in
//! development.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

/// A single configuration validation problem.
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation outcome: errors block startup, warnings are logged.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn add_error(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    fn add_warning(&mut self, field: &str, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the observation log and model artifacts
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Weather provider settings
    #[serde(default)]
    pub weather: WeatherSettings,
}

/// Settings for the forecast provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherSettings {
    /// Base URL of the forecast API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key. Without one, built-in offline forecasts are served.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
        }
    }
}

fn default_base_url() -> String {
    "https://api.openweathermap.org".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            weather: WeatherSettings::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("skycast")
}

impl Config {
    /// Load the configuration, writing a default file on first run.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Self::default().with_env_overrides();
            config.save()?;
            tracing::info!("Created default configuration at {}", config_path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: config_path.clone(),
            source,
        })?;
        let config: Config =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(config.with_env_overrides())
    }

    /// Load and validate; errors abort, warnings are logged and returned.
    pub fn load_validated() -> Result<(Self, ValidationResult), ConfigError> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }
        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// WEATHER_API_KEY in the environment wins over the file.
    fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var("WEATHER_API_KEY") {
            if !key.is_empty() {
                self.weather.api_key = Some(key);
            }
        }
        self
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        validate_url(&self.weather.base_url, "weather.base_url", &mut result);

        match &self.weather.api_key {
            Some(key) if key.trim().is_empty() => result.add_warning(
                "weather.api_key",
                "API key is blank - built-in offline forecasts will be served",
            ),
            Some(_) => {}
            None => result.add_warning(
                "weather.api_key",
                "No API key configured - built-in offline forecasts will be served",
            ),
        }

        if self.data_dir.exists() && !self.data_dir.is_dir() {
            result.add_error(
                "data_dir",
                format!("Path is not a directory: {}", self.data_dir.display()),
            );
        }

        result
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        std::fs::write(&config_path, contents).map_err(|source| ConfigError::Write {
            path: config_path.clone(),
            source,
        })?;

        Ok(())
    }

    /// Path of the observation log inside the data directory.
    pub fn observation_log_path(&self) -> PathBuf {
        self.data_dir.join("observations.csv")
    }

    /// Directory where model artifacts are written and discovered.
    pub fn models_dir(&self) -> PathBuf {
        self.data_dir.join("models")
    }

    fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NoConfigDir)?
            .join("skycast");
        Ok(config_dir.join("config.toml"))
    }
}

fn validate_url(url_str: &str, field: &str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(field, format!("URL scheme must be http or https: {url_str}"));
            }
            if url.host().is_none() {
                result.add_error(field, format!("URL has no host: {url_str}"));
            }
            if let Some(0) = url.port() {
                result.add_error(field, format!("URL port cannot be 0: {url_str}"));
            }
        }
        Err(e) => {
            result.add_error(field, format!("Invalid URL '{url_str}': {e}"));
        }
    }
}
