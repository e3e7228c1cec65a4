// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Wire-shape decoding and lenient mapping into core types.
//!
//! The analyzer keys per-record series by metric and band name
//! (`max(dt.host.disk.used.percent)`, `dt.davis.forecast.lower`, ...),
//! so records arrive as loose JSON objects. Mapping is lenient by
//! design: a prediction with missing or malformed pieces maps to a
//! [`ForecastRecord`] with empty series, which the interpreter rejects
//! per disk instead of failing the whole response.

use diskflow::{
    AnalysisStatus, AnalyzerResponse, ExecutionStatus, ForecastQuality, ForecastRecord,
    ForecastResult,
};
use serde::Deserialize;
use serde_json::Value;

/// Series key for observed usage.
const USAGE_KEY: &str = "max(dt.host.disk.used.percent)";
/// Series key for the pessimistic forecast band.
const LOWER_KEY: &str = "dt.davis.forecast.lower";
/// Series key for the optimistic forecast band.
const UPPER_KEY: &str = "dt.davis.forecast.upper";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireResponse {
    #[serde(default)]
    request_token: Option<String>,
    #[serde(default)]
    result: Option<WireResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireResult {
    #[serde(default)]
    execution_status: String,
    #[serde(default)]
    output: Vec<WirePrediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePrediction {
    #[serde(default)]
    analysis_status: Option<String>,
    #[serde(default)]
    forecast_quality_assessment: Option<String>,
    #[serde(default)]
    analyzed_time_series_query: Option<WireRecords>,
    #[serde(default)]
    time_series_data_with_predictions: Option<WireRecords>,
}

#[derive(Debug, Deserialize)]
struct WireRecords {
    #[serde(default)]
    records: Vec<Value>,
}

impl WireResponse {
    /// Map the wire payload into the core response type.
    pub(crate) fn into_response(self) -> AnalyzerResponse {
        let status = self
            .result
            .as_ref()
            .map_or(ExecutionStatus::Running, |result| {
                match result.execution_status.as_str() {
                    "COMPLETED" => ExecutionStatus::Completed,
                    "FAILED" => ExecutionStatus::Failed,
                    // Unknown statuses keep polling until a ceiling trips.
                    _ => ExecutionStatus::Running,
                }
            });

        let result = match (status, self.result) {
            (ExecutionStatus::Completed, Some(result)) => Some(ForecastResult {
                records: result.output.into_iter().map(map_prediction).collect(),
            }),
            _ => None,
        };

        AnalyzerResponse {
            status,
            request_token: self.request_token,
            result,
        }
    }
}

fn map_prediction(prediction: WirePrediction) -> ForecastRecord {
    let forecast_row = prediction
        .time_series_data_with_predictions
        .as_ref()
        .and_then(|records| records.records.first());
    let history_row = prediction
        .analyzed_time_series_query
        .as_ref()
        .and_then(|records| records.records.first());

    // Usage history rides on the prediction row in current payloads,
    // on the analyzed-query row in older ones.
    let usage_history = forecast_row
        .map(|row| number_series(row, USAGE_KEY))
        .filter(|series| !series.is_empty())
        .or_else(|| history_row.map(|row| number_series(row, USAGE_KEY)))
        .unwrap_or_default();

    let mut record = ForecastRecord::valid();
    record.analysis_status = match prediction.analysis_status.as_deref() {
        Some("OK") => AnalysisStatus::Ok,
        Some(other) => AnalysisStatus::Other(other.to_string()),
        None => AnalysisStatus::Other("MISSING".to_string()),
    };
    record.forecast_quality_assessment = match prediction.forecast_quality_assessment.as_deref() {
        Some("VALID") => ForecastQuality::Valid,
        Some("INVALID") => ForecastQuality::Invalid,
        Some(other) => ForecastQuality::Other(other.to_string()),
        None => ForecastQuality::Other("MISSING".to_string()),
    };
    record.usage_history = usage_history;

    if let Some(row) = forecast_row {
        record.lower_forecast = number_series(row, LOWER_KEY);
        let upper = number_series(row, UPPER_KEY);
        record.upper_forecast = (!upper.is_empty()).then_some(upper);
        record.disk_id = string_field(row, "dt.entity.disk");
        record.disk_name = string_field(row, "disk.name");
        record.host_id = string_field(row, "dt.entity.host");
        record.host_name = string_field(row, "host.name");
    }

    record
}

/// Numeric series under `key`; non-numeric entries are dropped, a
/// missing or non-array value yields an empty series.
fn number_series(row: &Value, key: &str) -> Vec<f64> {
    row.get(key)
        .and_then(Value::as_array)
        .map(|values| values.iter().filter_map(Value::as_f64).collect())
        .unwrap_or_default()
}

fn string_field(row: &Value, key: &str) -> Option<String> {
    row.get(key)
        .and_then(Value::as_str)
        .map(ToString::to_string)
}
