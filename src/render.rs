//! Console rendering of forecast views and training outcomes
//!
//! All display text per prediction variant lives here; the application
//! layer only decides values, never wording.

use skycast_model::{Prediction, TrainOutcome, Unavailability};

use crate::app::{DayReport, ForecastView};

pub fn print_forecast(view: &ForecastView) {
    println!("Forecast for {}", view.city);
    for day in &view.days {
        println!();
        for line in day_lines(day) {
            println!("  {line}");
        }
    }

    if let Some(warning) = &view.log_warning {
        println!();
        println!("Warning: {warning}");
    }
}

pub fn print_training_outcome(outcome: &TrainOutcome) {
    match outcome {
        TrainOutcome::Trained(report) => {
            println!(
                "Model trained on {} usable rows ({} raw rows in the log)",
                report.usable_rows, report.total_rows
            );
            match report.mean_absolute_error {
                Some(mae) => println!(
                    "Mean absolute error on {} held-out rows: {:.2} °C",
                    report.held_out_rows, mae
                ),
                None => println!("Evaluation unavailable: not enough rows for a held-out set"),
            }
            println!("Saved {}", report.artifact_path.display());
        }
        TrainOutcome::Skipped(reason) => {
            println!("Training skipped: {reason}");
        }
    }
}

fn day_lines(day: &DayReport) -> Vec<String> {
    let outlook = &day.outlook;
    let mut lines = vec![
        outlook.date.format("%A %Y-%m-%d").to_string(),
        format!("Temperature: {:.1} °C", day.displayed_temperature()),
    ];

    match day.model {
        Prediction::Predicted(value) => {
            lines.push(format!(
                "Model temperature: {value:.1} °C (provider: {:.1} °C)",
                outlook.temperature
            ));
        }
        Prediction::Unavailable(Unavailability::NoModel) => {
            lines.push("Model temperature: unavailable (no trained model yet)".to_string());
        }
        Prediction::Unavailable(Unavailability::MissingInputs) => {
            lines.push("Model temperature: unavailable (incomplete provider data)".to_string());
        }
        // Days beyond tomorrow show the provider value alone.
        Prediction::Unavailable(Unavailability::NotPredicted) => {}
    }

    lines.push(format!(
        "Rain chance: {}",
        percent_or_placeholder(outlook.rain_probability)
    ));
    lines.push(format!(
        "Humidity: {}",
        reading_or_placeholder(outlook.humidity, " %")
    ));
    lines.push(format!(
        "Pressure: {}",
        reading_or_placeholder(outlook.pressure, " hPa")
    ));
    lines.push(format!(
        "Wind: {}",
        reading_or_placeholder(outlook.wind_speed, " m/s")
    ));

    lines
}

fn percent_or_placeholder(value: Option<u8>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v} %"))
}

fn reading_or_placeholder(value: Option<f64>, unit: &str) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v}{unit}"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use chrono::NaiveDate;
    use skycast_weather::DayOutlook;

    fn report(model: Prediction) -> DayReport {
        DayReport {
            outlook: DayOutlook {
                date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
                temperature: 15.0,
                rain_probability: Some(15),
                humidity: Some(70.0),
                pressure: None,
                wind_speed: Some(5.0),
            },
            model,
        }
    }

    #[test]
    fn test_predicted_value_is_emphasized() {
        let lines = day_lines(&report(Prediction::Predicted(14.2)));

        assert!(lines.iter().any(|l| l.contains("Temperature: 14.2")));
        assert!(lines
            .iter()
            .any(|l| l.contains("Model temperature: 14.2") && l.contains("provider: 15.0")));
    }

    #[test]
    fn test_no_model_points_at_training() {
        let lines = day_lines(&report(Prediction::Unavailable(Unavailability::NoModel)));

        assert!(lines.iter().any(|l| l.contains("Temperature: 15.0")));
        assert!(lines.iter().any(|l| l.contains("no trained model yet")));
    }

    #[test]
    fn test_unpredicted_day_has_no_model_line() {
        let lines = day_lines(&report(Prediction::Unavailable(Unavailability::NotPredicted)));

        assert!(!lines.iter().any(|l| l.contains("Model temperature")));
        assert!(lines.iter().any(|l| l.contains("Temperature: 15.0")));
    }

    #[test]
    fn test_missing_readings_render_a_placeholder() {
        let lines = day_lines(&report(Prediction::Predicted(14.2)));

        assert!(lines.iter().any(|l| l == "Pressure: n/a"));
        assert!(lines.iter().any(|l| l == "Humidity: 70 %"));
    }
}
