//! Model training pipeline
//!
//! Reads the observation log, holds out a seeded evaluation split when
//! there is enough data, fits the forest, and writes a timestamped JSON
//! artifact. A missing or empty log is a skip, not an error; the caller
//! decides how loudly to report it.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use thiserror::Error;

use crate::dataset::{load_dataset, TrainingRow};
use crate::features::FEATURE_COUNT;
use crate::forest::{ForestConfig, RandomForest, SeededRng};

/// Minimum usable rows before any are held out for evaluation.
pub const MIN_ROWS_FOR_HOLDOUT: usize = 5;
/// Fraction of usable rows reserved for evaluation.
pub const HOLDOUT_FRACTION: f64 = 0.2;
/// Seed for the holdout shuffle; the forest seed lives in [`ForestConfig`].
pub const TRAINING_SEED: u64 = 42;

/// Why a training run produced no artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The observation log does not exist yet.
    StoreMissing,
    /// The observation log exists but could not be read.
    StoreUnreadable,
    /// No data rows survived cleaning.
    NoUsableRows,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::StoreMissing => write!(f, "no observation log exists yet"),
            SkipReason::StoreUnreadable => write!(f, "the observation log could not be read"),
            SkipReason::NoUsableRows => write!(f, "no usable rows after cleaning"),
        }
    }
}

/// Outcome of a training run.
#[derive(Debug)]
pub enum TrainOutcome {
    Trained(TrainingReport),
    Skipped(SkipReason),
}

/// Summary of a completed training run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    /// Raw data rows seen in the log
    pub total_rows: usize,
    /// Rows that survived cleaning and fed the run
    pub usable_rows: usize,
    /// Rows reserved for evaluation (0 when below the holdout minimum)
    pub held_out_rows: usize,
    /// Mean absolute error on the held-out rows, when any were reserved
    pub mean_absolute_error: Option<f64>,
    pub artifact_path: PathBuf,
}

/// Errors from persisting a trained model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Failed to create models directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize model: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write model artifact {path}: {source}")]
    WriteArtifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ModelError {
    /// Returns a user-friendly message suitable for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            ModelError::CreateDir { .. } | ModelError::WriteArtifact { .. } => {
                "The trained model could not be saved. Check disk space and permissions."
            }
            ModelError::Serialize(_) => "The trained model could not be saved. Please try again.",
        }
    }
}

/// Train a model from the observation log and write a new artifact under
/// `models_dir`. Prior artifacts are never touched.
pub fn train(log_path: &Path, models_dir: &Path) -> Result<TrainOutcome, ModelError> {
    let dataset = match load_dataset(log_path) {
        Ok(dataset) => dataset,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(
                "No observation log at {}; nothing to train on",
                log_path.display()
            );
            return Ok(TrainOutcome::Skipped(SkipReason::StoreMissing));
        }
        Err(e) => {
            tracing::warn!("Observation log {} is unreadable: {}", log_path.display(), e);
            return Ok(TrainOutcome::Skipped(SkipReason::StoreUnreadable));
        }
    };

    if dataset.rows.is_empty() {
        tracing::warn!(
            "Observation log {} has no usable rows after cleaning ({} raw rows)",
            log_path.display(),
            dataset.total_rows
        );
        return Ok(TrainOutcome::Skipped(SkipReason::NoUsableRows));
    }

    let usable_rows = dataset.rows.len();
    tracing::info!(
        "Training on {} usable rows ({} raw rows in the log)",
        usable_rows,
        dataset.total_rows
    );

    let (train_rows, test_rows) = split_rows(dataset.rows, TRAINING_SEED);
    let features: Vec<[f64; FEATURE_COUNT]> = train_rows.iter().map(|row| row.features).collect();
    let targets: Vec<f64> = train_rows.iter().map(|row| row.target).collect();
    let forest = RandomForest::fit(&ForestConfig::default(), &features, &targets);

    let mean_absolute_error = if test_rows.is_empty() {
        tracing::info!(
            "Fewer than {} usable rows; trained on everything, evaluation unavailable",
            MIN_ROWS_FOR_HOLDOUT
        );
        None
    } else {
        let mae = evaluate(&forest, &test_rows);
        tracing::info!(
            "Mean absolute error on {} held-out rows: {:.3}",
            test_rows.len(),
            mae
        );
        Some(mae)
    };

    std::fs::create_dir_all(models_dir).map_err(|source| ModelError::CreateDir {
        path: models_dir.to_path_buf(),
        source,
    })?;
    let artifact_path = artifact_file(models_dir, Local::now().naive_local());
    let payload = serde_json::to_string(&forest)?;
    std::fs::write(&artifact_path, payload).map_err(|source| ModelError::WriteArtifact {
        path: artifact_path.clone(),
        source,
    })?;
    tracing::info!("Saved model artifact {}", artifact_path.display());

    Ok(TrainOutcome::Trained(TrainingReport {
        total_rows: dataset.total_rows,
        usable_rows,
        held_out_rows: test_rows.len(),
        mean_absolute_error,
        artifact_path,
    }))
}

/// Reserve round(20%) of the rows for evaluation, chosen by a seeded
/// shuffle. Below [`MIN_ROWS_FOR_HOLDOUT`] rows, everything trains.
fn split_rows(rows: Vec<TrainingRow>, seed: u64) -> (Vec<TrainingRow>, Vec<TrainingRow>) {
    let n = rows.len();
    if n < MIN_ROWS_FOR_HOLDOUT {
        return (rows, Vec::new());
    }

    let held_out = ((n as f64) * HOLDOUT_FRACTION).round() as usize;
    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = SeededRng::new(seed);
    rng.shuffle(&mut order);
    let test_set: HashSet<usize> = order[..held_out].iter().copied().collect();

    let mut train = Vec::with_capacity(n - held_out);
    let mut test = Vec::with_capacity(held_out);
    for (i, row) in rows.into_iter().enumerate() {
        if test_set.contains(&i) {
            test.push(row);
        } else {
            train.push(row);
        }
    }
    (train, test)
}

fn evaluate(forest: &RandomForest, rows: &[TrainingRow]) -> f64 {
    let total: f64 = rows
        .iter()
        .map(|row| (forest.predict(&row.features) - row.target).abs())
        .sum();
    total / rows.len() as f64
}

/// Artifact filenames carry a second-resolution timestamp, so sorting by
/// name matches sorting by creation time.
fn artifact_file(models_dir: &Path, timestamp: NaiveDateTime) -> PathBuf {
    models_dir.join(format!(
        "weather_model_{}.json",
        timestamp.format("%Y%m%d_%H%M%S")
    ))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn rows(n: usize) -> Vec<TrainingRow> {
        (0..n)
            .map(|i| TrainingRow {
                features: [f64::from(i as u32), 50.0, 1000.0, 3.0, 60.0, 3.0, 0.0],
                target: f64::from(i as u32) + 1.0,
            })
            .collect()
    }

    const LOG_HEADER: &str =
        "logged_at,city,forecast_date,model_temperature,api_temperature,humidity,pressure,wind_speed";

    fn write_log(path: &Path, data_rows: &[&str]) {
        let mut contents = String::from(LOG_HEADER);
        for row in data_rows {
            contents.push('\n');
            contents.push_str(row);
        }
        contents.push('\n');
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_small_datasets_train_on_everything() {
        let (train, test) = split_rows(rows(4), TRAINING_SEED);

        assert_eq!(train.len(), 4);
        assert!(test.is_empty());
    }

    #[test]
    fn test_holdout_is_one_fifth_rounded() {
        for (n, expected) in [(5, 1), (6, 1), (10, 2), (13, 3), (25, 5)] {
            let (train, test) = split_rows(rows(n), TRAINING_SEED);
            assert_eq!(test.len(), expected, "n = {n}");
            assert_eq!(train.len() + test.len(), n);
        }
    }

    #[test]
    fn test_split_is_deterministic() {
        let (first_train, first_test) = split_rows(rows(10), TRAINING_SEED);
        let (second_train, second_test) = split_rows(rows(10), TRAINING_SEED);

        let targets = |split: &[TrainingRow]| split.iter().map(|r| r.target).collect::<Vec<_>>();
        assert_eq!(targets(&first_train), targets(&second_train));
        assert_eq!(targets(&first_test), targets(&second_test));
    }

    #[test]
    fn test_missing_log_is_skipped() {
        let dir = tempdir().unwrap();
        let models_dir = dir.path().join("models");

        let outcome = train(&dir.path().join("absent.csv"), &models_dir).unwrap();

        assert!(matches!(
            outcome,
            TrainOutcome::Skipped(SkipReason::StoreMissing)
        ));
        assert!(!models_dir.exists());
    }

    #[test]
    fn test_unreadable_log_is_skipped() {
        let dir = tempdir().unwrap();

        // A directory in place of the log file fails the read without
        // being NotFound.
        let outcome = train(dir.path(), &dir.path().join("models")).unwrap();

        assert!(matches!(
            outcome,
            TrainOutcome::Skipped(SkipReason::StoreUnreadable)
        ));
    }

    #[test]
    fn test_header_only_log_is_skipped() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("observations.csv");
        write_log(&log_path, &[]);

        let outcome = train(&log_path, &dir.path().join("models")).unwrap();

        assert!(matches!(
            outcome,
            TrainOutcome::Skipped(SkipReason::NoUsableRows)
        ));
    }

    #[test]
    fn test_training_below_holdout_minimum_reports_no_error() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("observations.csv");
        write_log(
            &log_path,
            &[
                "2026-03-01 08:00:00,Lyon,2026-03-02,14.2,15,70,1012,5",
                "2026-03-01 08:00:00,Lyon,2026-03-03,25,24,65,1010,7",
            ],
        );

        let outcome = train(&log_path, &dir.path().join("models")).unwrap();

        let TrainOutcome::Trained(report) = outcome else {
            panic!("expected a trained outcome");
        };
        assert_eq!(report.usable_rows, 2);
        assert_eq!(report.held_out_rows, 0);
        assert_eq!(report.mean_absolute_error, None);
        assert!(report.artifact_path.exists());
    }

    #[test]
    fn test_training_writes_exactly_one_artifact() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("observations.csv");
        let models_dir = dir.path().join("models");
        write_log(
            &log_path,
            &[
                "2026-03-01 08:00:00,Lyon,2026-03-02,14.2,15,70,1012,5",
                "2026-03-01 08:00:00,Lyon,2026-03-03,25,24,65,1010,7",
                "2026-03-02 08:00:00,Lyon,2026-03-03,24,23,60,1011,6",
                "2026-03-02 08:00:00,Lyon,2026-03-04,18,19,75,1013,4",
                "2026-03-03 08:00:00,Lyon,2026-03-04,19,18,72,1012,5",
                "2026-03-03 08:00:00,Lyon,2026-03-05,21,22,68,1009,8",
            ],
        );

        let outcome = train(&log_path, &models_dir).unwrap();

        let TrainOutcome::Trained(report) = outcome else {
            panic!("expected a trained outcome");
        };
        assert_eq!(report.usable_rows, 6);
        assert_eq!(report.held_out_rows, 1);
        assert!(report.mean_absolute_error.is_some());

        let artifacts: Vec<_> = std::fs::read_dir(&models_dir).unwrap().collect();
        assert_eq!(artifacts.len(), 1);
        let name = report
            .artifact_path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .to_string();
        assert!(name.starts_with("weather_model_"));
        assert!(name.ends_with(".json"));
    }

    #[test]
    fn test_artifact_names_sort_with_time() {
        let earlier = artifact_file(
            Path::new("models"),
            NaiveDate::from_ymd_opt(2026, 3, 1)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        );
        let later = artifact_file(
            Path::new("models"),
            NaiveDate::from_ymd_opt(2026, 3, 1)
                .unwrap()
                .and_hms_opt(8, 0, 1)
                .unwrap(),
        );

        assert_eq!(
            earlier.file_name().unwrap().to_string_lossy(),
            "weather_model_20260301_080000.json"
        );
        assert!(later > earlier);
    }
}
