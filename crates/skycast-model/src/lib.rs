//! Observation logging and the local temperature model
//!
//! Every displayed forecast is appended to a CSV observation log. The
//! trainer turns that log into a random-forest regressor that learns the
//! gap between forecast temperatures and what the provider later reported,
//! and the predictor scores new forecasts with the most recent artifact.
//!
//! The feature column order is the contract between training and
//! inference; both sides build their inputs through [`feature_vector`] and
//! artifacts record the column names so a mismatched model is never scored.

pub mod dataset;
pub mod features;
pub mod forest;
pub mod observations;
pub mod predictor;
pub mod trainer;

pub use features::{feature_vector, CalendarFeatures, FEATURE_COUNT, FEATURE_NAMES};
pub use forest::{ForestConfig, RandomForest};
pub use observations::{ObservationLog, ObservationRecord, StoreError, LOG_COLUMNS};
pub use predictor::{Prediction, TemperaturePredictor, Unavailability};
pub use trainer::{train, ModelError, SkipReason, TrainOutcome, TrainingReport};
