//! Scoring forecasts with the newest trained model
//!
//! The predictor never fails: every problem loading or applying a model
//! degrades to an `Unavailable` answer and the caller falls back to the
//! provider temperature.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::NaiveDate;

use crate::features::{feature_vector, FEATURE_NAMES};
use crate::forest::RandomForest;

const ARTIFACT_PREFIX: &str = "weather_model_";
const ARTIFACT_SUFFIX: &str = ".json";

/// Result of asking the model for a temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Prediction {
    /// Model output, rounded to one decimal place
    Predicted(f64),
    Unavailable(Unavailability),
}

/// Why no model temperature is offered. All of these are normal outcomes,
/// not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unavailability {
    /// No artifact exists, or none could be loaded
    NoModel,
    /// The forecast lacked a contextual reading the model needs
    MissingInputs,
    /// No prediction was requested for this horizon
    NotPredicted,
}

/// Loads the newest model artifact and scores forecasts with it.
#[derive(Debug)]
pub struct TemperaturePredictor {
    model: Option<RandomForest>,
}

impl TemperaturePredictor {
    /// Load the newest artifact from `models_dir`, selected by modification
    /// time with the filename breaking ties. Any failure along the way
    /// leaves the predictor answering `Unavailable`.
    pub fn load(models_dir: &Path) -> Self {
        let model = match newest_artifact(models_dir) {
            Some(path) => load_artifact(&path),
            None => {
                tracing::info!("No model artifacts in {}", models_dir.display());
                None
            }
        };
        Self { model }
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Score one forecast day. The inputs mirror the training columns; a
    /// missing contextual reading makes the prediction unavailable rather
    /// than guessing a fill-in value.
    pub fn predict(
        &self,
        api_temperature: f64,
        forecast_date: NaiveDate,
        humidity: Option<f64>,
        pressure: Option<f64>,
        wind_speed: Option<f64>,
    ) -> Prediction {
        let Some(model) = &self.model else {
            return Prediction::Unavailable(Unavailability::NoModel);
        };
        let (Some(humidity), Some(pressure), Some(wind_speed)) = (humidity, pressure, wind_speed)
        else {
            tracing::debug!("Skipping model prediction: contextual readings are missing");
            return Prediction::Unavailable(Unavailability::MissingInputs);
        };

        let features = feature_vector(api_temperature, humidity, pressure, wind_speed, forecast_date);
        Prediction::Predicted(round_one_decimal(model.predict(&features)))
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn newest_artifact(models_dir: &Path) -> Option<PathBuf> {
    let entries = match std::fs::read_dir(models_dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("Cannot list models directory {}: {}", models_dir.display(), e);
            return None;
        }
    };

    let mut candidates: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !(name.starts_with(ARTIFACT_PREFIX) && name.ends_with(ARTIFACT_SUFFIX)) {
            continue;
        }
        let modified = entry
            .metadata()
            .and_then(|metadata| metadata.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        candidates.push((modified, path));
    }

    candidates.sort();
    candidates.pop().map(|(_, path)| path)
}

fn load_artifact(path: &Path) -> Option<RandomForest> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::warn!("Cannot read model artifact {}: {}", path.display(), e);
            return None;
        }
    };
    let model: RandomForest = match serde_json::from_str(&contents) {
        Ok(model) => model,
        Err(e) => {
            tracing::warn!("Model artifact {} is not a valid model: {}", path.display(), e);
            return None;
        }
    };

    let names_match = model
        .feature_names()
        .iter()
        .map(String::as_str)
        .eq(FEATURE_NAMES);
    if !names_match || !model.is_consistent() {
        tracing::warn!(
            "Model artifact {} does not match the current feature layout; ignoring it",
            path.display()
        );
        return None;
    }

    tracing::info!("Loaded model artifact {}", path.display());
    Some(model)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::features::FEATURE_COUNT;
    use crate::forest::ForestConfig;
    use std::time::Duration;
    use tempfile::tempdir;

    fn write_model(dir: &Path, name: &str, target: f64) -> PathBuf {
        let rows = [[1.0; FEATURE_COUNT]];
        let forest = RandomForest::fit(&ForestConfig::default(), &rows, &[target]);
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_string(&forest).unwrap()).unwrap();
        path
    }

    fn set_mtime(path: &Path, secs_after_epoch: u64) {
        let file = std::fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs_after_epoch))
            .unwrap();
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    #[test]
    fn test_missing_directory_means_no_model() {
        let dir = tempdir().unwrap();

        let predictor = TemperaturePredictor::load(&dir.path().join("models"));

        assert!(!predictor.has_model());
        assert_eq!(
            predictor.predict(15.0, date(), Some(70.0), Some(1012.0), Some(5.0)),
            Prediction::Unavailable(Unavailability::NoModel)
        );
    }

    #[test]
    fn test_empty_directory_means_no_model() {
        let dir = tempdir().unwrap();

        let predictor = TemperaturePredictor::load(dir.path());

        assert!(!predictor.has_model());
    }

    #[test]
    fn test_unrelated_files_are_not_artifacts() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("notes.json"), "{}").unwrap();
        std::fs::write(dir.path().join("weather_model_plan.txt"), "x").unwrap();

        let predictor = TemperaturePredictor::load(dir.path());

        assert!(!predictor.has_model());
    }

    #[test]
    fn test_corrupt_artifact_degrades_to_no_model() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("weather_model_20260301_080000.json"), "not json").unwrap();

        let predictor = TemperaturePredictor::load(dir.path());

        assert!(!predictor.has_model());
    }

    #[test]
    fn test_foreign_feature_layout_is_refused() {
        let dir = tempdir().unwrap();
        let path = write_model(dir.path(), "weather_model_20260301_080000.json", 5.0);
        let mut value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        value["feature_names"][0] = serde_json::json!("temperature_yesterday");
        std::fs::write(&path, serde_json::to_string(&value).unwrap()).unwrap();

        let predictor = TemperaturePredictor::load(dir.path());

        assert!(!predictor.has_model());
    }

    #[test]
    fn test_newest_mtime_wins_over_lexical_order() {
        let dir = tempdir().unwrap();
        // The lexically later name is the older file on disk.
        let old = write_model(dir.path(), "weather_model_20300101_000000.json", 5.0);
        let new = write_model(dir.path(), "weather_model_20200101_000000.json", 9.0);
        set_mtime(&old, 1_600_000_000);
        set_mtime(&new, 1_900_000_000);

        let predictor = TemperaturePredictor::load(dir.path());

        assert_eq!(
            predictor.predict(15.0, date(), Some(70.0), Some(1012.0), Some(5.0)),
            Prediction::Predicted(9.0)
        );
    }

    #[test]
    fn test_equal_mtimes_break_by_name() {
        let dir = tempdir().unwrap();
        let first = write_model(dir.path(), "weather_model_20260301_080000.json", 5.0);
        let second = write_model(dir.path(), "weather_model_20260301_080001.json", 9.0);
        set_mtime(&first, 1_800_000_000);
        set_mtime(&second, 1_800_000_000);

        let predictor = TemperaturePredictor::load(dir.path());

        assert_eq!(
            predictor.predict(15.0, date(), Some(70.0), Some(1012.0), Some(5.0)),
            Prediction::Predicted(9.0)
        );
    }

    #[test]
    fn test_missing_inputs_degrade_gracefully() {
        let dir = tempdir().unwrap();
        write_model(dir.path(), "weather_model_20260301_080000.json", 5.0);

        let predictor = TemperaturePredictor::load(dir.path());

        assert!(predictor.has_model());
        assert_eq!(
            predictor.predict(15.0, date(), None, Some(1012.0), Some(5.0)),
            Prediction::Unavailable(Unavailability::MissingInputs)
        );
    }

    #[test]
    fn test_predictions_are_rounded_to_one_decimal() {
        let dir = tempdir().unwrap();
        // Identical features with conflicting targets leave bootstrap noise
        // in the ensemble mean.
        let rows = [[1.0; FEATURE_COUNT], [1.0; FEATURE_COUNT]];
        let forest = RandomForest::fit(&ForestConfig::default(), &rows, &[10.0, 11.0]);
        std::fs::write(
            dir.path().join("weather_model_20260301_080000.json"),
            serde_json::to_string(&forest).unwrap(),
        )
        .unwrap();

        let predictor = TemperaturePredictor::load(dir.path());

        let Prediction::Predicted(value) =
            predictor.predict(15.0, date(), Some(70.0), Some(1012.0), Some(5.0))
        else {
            panic!("expected a prediction");
        };
        assert!((value * 10.0 - (value * 10.0).round()).abs() < 1e-9);
    }
}
