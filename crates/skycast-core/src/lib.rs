//! Core application plumbing for Skycast
//!
//! Configuration, error aggregation, and logging setup shared by the
//! binary and the tests.

pub mod config;
pub mod error;

pub use config::{Config, ConfigValidationError, ValidationResult, WeatherSettings};
pub use error::{AppError, ConfigError};

/// Install the global tracing subscriber.
///
/// RUST_LOG takes precedence when set; otherwise `verbose` decides between
/// debug and info level output.
pub fn init(verbose: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(if verbose { "debug" } else { "info" })
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
