//! Reading the observation log back as training data
//!
//! Columns are located by header name, so a log written with extra or
//! reordered columns still trains correctly. Rows missing any required
//! training column are dropped; they count toward the raw total but not
//! toward the usable rows that drive the holdout decision.

use std::path::Path;

use chrono::NaiveDate;

use crate::features::{feature_vector, FEATURE_COUNT};

/// One usable training example.
#[derive(Debug, Clone)]
pub struct TrainingRow {
    pub features: [f64; FEATURE_COUNT],
    pub target: f64,
}

/// Cleaned training rows plus the raw data-row count before cleaning.
#[derive(Debug, Default)]
pub struct Dataset {
    pub rows: Vec<TrainingRow>,
    pub total_rows: usize,
}

/// Read and clean the observation log.
pub fn load_dataset(path: &Path) -> std::io::Result<Dataset> {
    let contents = std::fs::read_to_string(path)?;
    Ok(parse_dataset(&contents))
}

fn parse_dataset(contents: &str) -> Dataset {
    let mut dataset = Dataset::default();
    let mut records = split_csv_records(contents).into_iter();

    let Some(header) = records.next() else {
        return dataset;
    };
    let columns = split_csv_line(header);
    let Some(index) = ColumnIndex::from_header(&columns) else {
        tracing::warn!("Observation log header is missing required training columns");
        return dataset;
    };

    for record in records {
        if record.trim().is_empty() {
            continue;
        }
        dataset.total_rows += 1;
        match parse_row(record, &index) {
            Some(row) => dataset.rows.push(row),
            None => tracing::debug!("Dropping unusable observation row: {}", record),
        }
    }

    dataset
}

/// Positions of the required training columns within the header.
struct ColumnIndex {
    forecast_date: usize,
    model_temperature: usize,
    api_temperature: usize,
    humidity: usize,
    pressure: usize,
    wind_speed: usize,
}

impl ColumnIndex {
    fn from_header(columns: &[String]) -> Option<Self> {
        let find = |name: &str| columns.iter().position(|column| column.trim() == name);
        Some(Self {
            forecast_date: find("forecast_date")?,
            model_temperature: find("model_temperature")?,
            api_temperature: find("api_temperature")?,
            humidity: find("humidity")?,
            pressure: find("pressure")?,
            wind_speed: find("wind_speed")?,
        })
    }
}

fn parse_row(line: &str, index: &ColumnIndex) -> Option<TrainingRow> {
    let fields = split_csv_line(line);

    let date = NaiveDate::parse_from_str(field(&fields, index.forecast_date)?, "%Y-%m-%d").ok()?;
    let model_temperature = parse_f64(&fields, index.model_temperature)?;
    let api_temperature = parse_f64(&fields, index.api_temperature)?;
    let humidity = parse_f64(&fields, index.humidity)?;
    let pressure = parse_f64(&fields, index.pressure)?;
    let wind_speed = parse_f64(&fields, index.wind_speed)?;

    Some(TrainingRow {
        features: feature_vector(model_temperature, humidity, pressure, wind_speed, date),
        target: api_temperature,
    })
}

fn field<'a>(fields: &'a [String], index: usize) -> Option<&'a str> {
    let value = fields.get(index)?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn parse_f64(fields: &[String], index: usize) -> Option<f64> {
    field(fields, index)?.parse().ok()
}

/// Split the log into records on unquoted line breaks, so a quoted field
/// can span physical lines. The writer quotes any field containing one.
fn split_csv_records(contents: &str) -> Vec<&str> {
    let mut records = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut chars = contents.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '"' if in_quotes => {
                if matches!(chars.peek(), Some(&(_, '"'))) {
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            '\n' if !in_quotes => {
                let line = &contents[start..pos];
                records.push(line.strip_suffix('\r').unwrap_or(line));
                start = pos + 1;
            }
            _ => {}
        }
    }

    if start < contents.len() {
        records.push(&contents[start..]);
    }
    records
}

/// Split one CSV line, honoring double-quoted fields with doubled quotes.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.is_empty() => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}
