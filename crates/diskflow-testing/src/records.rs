//! Canned forecast records.

use diskflow::{ForecastQuality, ForecastRecord};

/// A valid prediction whose lower band never reaches 100%.
#[must_use]
pub fn clean_record() -> ForecastRecord {
    let mut record = ForecastRecord::valid();
    record.usage_history = vec![42.0, 43.5, 45.0];
    record.lower_forecast = vec![46.0, 47.0, 48.5, 50.0, 51.0];
    record.upper_forecast = Some(vec![49.0, 51.0, 53.5, 56.0, 58.0]);
    record
}

/// A valid prediction crossing 100% at `crossing_index` (0-based, so
/// the violation reports `crossing_index + 1` days until full), with
/// the given current usage and a 5-point band at the crossing day
/// (confidence 0.95).
#[must_use]
pub fn violation_record(current_usage: f64, crossing_index: usize) -> ForecastRecord {
    let mut lower = Vec::with_capacity(crossing_index + 3);
    for day in 0..crossing_index + 3 {
        if day < crossing_index {
            lower.push(90.0 + day as f64);
        } else {
            lower.push(100.0 + day as f64);
        }
    }
    let upper: Vec<f64> = lower.iter().map(|value| value + 5.0).collect();

    let mut record = ForecastRecord::valid();
    record.usage_history = vec![current_usage - 2.0, current_usage - 1.0, current_usage];
    record.lower_forecast = lower;
    record.upper_forecast = Some(upper);
    record
}

/// A prediction the analyzer self-rejected.
#[must_use]
pub fn invalid_record() -> ForecastRecord {
    let mut record = clean_record();
    record.forecast_quality_assessment = ForecastQuality::Invalid;
    record
}
