// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! The forecast-analyzer seam.
//!
//! The statistical forecasting service is an opaque asynchronous
//! collaborator: a submission either completes immediately or returns a
//! request token that must be polled. This module defines the
//! [`ForecastAnalyzer`] capability trait plus the request/response
//! types crossing that boundary. Driving a pending submission to a
//! terminal state is the job of [`ForecastPoller`].
//!
//! [`ForecastPoller`]: crate::poller::ForecastPoller

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default analyzer identifier for generic statistical forecasting.
pub const DEFAULT_ANALYZER_NAME: &str = "davis.anomaly_detection.GenericForecastAnalyzer";

/// Analyzer-side execution status of a forecast job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    /// Result is available
    Completed,
    /// Job accepted, still computing; poll with the request token
    Running,
    /// Job ended without a result
    Failed,
}

impl ExecutionStatus {
    /// True for states that end the polling loop.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExecutionStatus::Running)
    }
}

/// Parameters of one forecast submission.
///
/// `expression` is the rendered time-series query
/// ([`TimeSeriesQuery::render`](crate::query::TimeSeriesQuery::render));
/// the remaining fields control the statistical simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRequest {
    /// Analyzer to invoke
    pub analyzer_name: String,
    /// Time-series expression describing the historical window
    pub expression: String,
    /// Number of future days to predict
    pub forecast_horizon_days: u32,
    /// Width of the predicted confidence interval, exclusive (0, 1)
    pub coverage_probability: f64,
    /// Number of simulation paths
    pub path_count: u32,
    /// Reuse a cached model when the analyzer offers one
    pub use_model_cache: bool,
}

impl ForecastRequest {
    /// Request with the default analyzer and simulation parameters
    /// (365-day horizon, 0.9 coverage, 200 paths, model cache on).
    #[must_use]
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            analyzer_name: DEFAULT_ANALYZER_NAME.to_string(),
            expression: expression.into(),
            forecast_horizon_days: 365,
            coverage_probability: 0.9,
            path_count: 200,
            use_model_cache: true,
        }
    }

    /// Override the analyzer identifier.
    #[must_use]
    pub fn with_analyzer_name(mut self, name: impl Into<String>) -> Self {
        self.analyzer_name = name.into();
        self
    }

    /// Override the forecast horizon.
    #[must_use]
    pub fn with_horizon_days(mut self, days: u32) -> Self {
        self.forecast_horizon_days = days;
        self
    }

    /// Override the coverage probability.
    #[must_use]
    pub fn with_coverage_probability(mut self, coverage: f64) -> Self {
        self.coverage_probability = coverage;
        self
    }

    /// Override the simulation path count.
    #[must_use]
    pub fn with_path_count(mut self, paths: u32) -> Self {
        self.path_count = paths;
        self
    }

    /// Validate parameter ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when the horizon is outside
    /// 1..=365, the coverage probability is outside the open interval
    /// (0, 1), or the path count is zero.
    pub fn validate(&self) -> Result<()> {
        if self.forecast_horizon_days == 0 || self.forecast_horizon_days > 365 {
            return Err(Error::InvalidConfig(format!(
                "forecast horizon must be within 1..=365 days, got {}",
                self.forecast_horizon_days
            )));
        }
        if self.coverage_probability <= 0.0 || self.coverage_probability >= 1.0 {
            return Err(Error::InvalidConfig(format!(
                "coverage probability must be within (0, 1), got {}",
                self.coverage_probability
            )));
        }
        if self.path_count == 0 {
            return Err(Error::InvalidConfig(
                "path count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Response to a submit or poll call.
///
/// `request_token` is present while the job is pending; each poll must
/// present the most recent token seen (tokens chain). `result` is
/// present once `status` is [`ExecutionStatus::Completed`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerResponse {
    /// Current job status
    pub status: ExecutionStatus,
    /// Opaque continuation token for pending jobs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_token: Option<String>,
    /// Completed result payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<ForecastResult>,
}

impl AnalyzerResponse {
    /// A completed response carrying `result`.
    #[must_use]
    pub fn completed(result: ForecastResult) -> Self {
        Self {
            status: ExecutionStatus::Completed,
            request_token: None,
            result: Some(result),
        }
    }

    /// A pending response carrying a continuation token.
    #[must_use]
    pub fn running(token: impl Into<String>) -> Self {
        Self {
            status: ExecutionStatus::Running,
            request_token: Some(token.into()),
            result: None,
        }
    }

    /// A failed response.
    #[must_use]
    pub fn failed() -> Self {
        Self {
            status: ExecutionStatus::Failed,
            request_token: None,
            result: None,
        }
    }
}

/// Completed analyzer output: one record per analyzed disk series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    /// Per-disk prediction rows
    pub records: Vec<ForecastRecord>,
}

/// Quality self-assessment the analyzer attaches to a prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ForecastQuality {
    /// Prediction is usable
    Valid,
    /// Analyzer explicitly rejected its own prediction
    Invalid,
    /// Any other assessment string
    #[serde(untagged)]
    Other(String),
}

/// Per-prediction analysis status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisStatus {
    /// Analysis ran to completion
    Ok,
    /// Any other status string
    #[serde(untagged)]
    Other(String),
}

/// One disk's forecast row: observed history plus the predicted
/// confidence band, and the analyzer's quality metadata.
///
/// Entity attribution fields are optional; when the analyzer resolves
/// display names they take precedence over the entity-list names.
/// Series may be empty when the upstream payload was malformed - the
/// interpreter rejects such records instead of crashing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRecord {
    /// Disk entity id as reported by the analyzer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_id: Option<String>,
    /// Disk display name as reported by the analyzer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_name: Option<String>,
    /// Host entity id as reported by the analyzer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_id: Option<String>,
    /// Host display name as reported by the analyzer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    /// Whether the analysis itself succeeded
    pub analysis_status: AnalysisStatus,
    /// Analyzer's self-assessment of the prediction
    pub forecast_quality_assessment: ForecastQuality,
    /// Observed usage percentages, chronological; last = most recent
    #[serde(default)]
    pub usage_history: Vec<f64>,
    /// Pessimistic band, one value per horizon day starting at day 1
    #[serde(default)]
    pub lower_forecast: Vec<f64>,
    /// Optimistic band; absent means "treat as equal to lower"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_forecast: Option<Vec<f64>>,
}

impl ForecastRecord {
    /// A record with OK/VALID metadata and empty series; builder-style
    /// setters fill in the rest.
    #[must_use]
    pub fn valid() -> Self {
        Self {
            disk_id: None,
            disk_name: None,
            host_id: None,
            host_name: None,
            analysis_status: AnalysisStatus::Ok,
            forecast_quality_assessment: ForecastQuality::Valid,
            usage_history: Vec::new(),
            lower_forecast: Vec::new(),
            upper_forecast: None,
        }
    }
}

/// The asynchronous forecasting service.
///
/// `submit` starts one analysis; `poll` advances a pending one.
/// Implementations must be cheap to share (`&self` methods) - the
/// scheduler calls them from many in-flight disk tasks.
#[async_trait]
pub trait ForecastAnalyzer: Send + Sync {
    /// Submit a forecast request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AnalyzerSubmit`] when the submission cannot be
    /// delivered or is rejected outright.
    async fn submit(&self, request: &ForecastRequest) -> Result<AnalyzerResponse>;

    /// Poll a pending job identified by `request_token`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AnalyzerSubmit`] when the poll call itself
    /// cannot be delivered.
    async fn poll(&self, analyzer_name: &str, request_token: &str) -> Result<AnalyzerResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== ForecastRequest Validation ==========

    #[test]
    fn test_default_request_is_valid() {
        let request = ForecastRequest::new("timeseries ...");
        assert!(request.validate().is_ok());
        assert_eq!(request.forecast_horizon_days, 365);
        assert_eq!(request.path_count, 200);
        assert!(request.use_model_cache);
    }

    #[test]
    fn test_zero_horizon_rejected() {
        let request = ForecastRequest::new("q").with_horizon_days(0);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_oversized_horizon_rejected() {
        let request = ForecastRequest::new("q").with_horizon_days(366);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_coverage_bounds_exclusive() {
        assert!(ForecastRequest::new("q")
            .with_coverage_probability(0.0)
            .validate()
            .is_err());
        assert!(ForecastRequest::new("q")
            .with_coverage_probability(1.0)
            .validate()
            .is_err());
        assert!(ForecastRequest::new("q")
            .with_coverage_probability(0.5)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_zero_paths_rejected() {
        let request = ForecastRequest::new("q").with_path_count(0);
        assert!(request.validate().is_err());
    }

    // ========== Status & Response ==========

    #[test]
    fn test_terminal_statuses() {
        assert!(ExecutionStatus::Completed.is_terminal());
        assert!(ExecutionStatus::Failed.is_terminal());
        assert!(!ExecutionStatus::Running.is_terminal());
    }

    #[test]
    fn test_status_serializes_screaming_snake() {
        let json = serde_json::to_string(&ExecutionStatus::Completed).unwrap();
        assert_eq!(json, r#""COMPLETED""#);
    }

    #[test]
    fn test_running_response_carries_token() {
        let response = AnalyzerResponse::running("token-1");
        assert_eq!(response.status, ExecutionStatus::Running);
        assert_eq!(response.request_token.as_deref(), Some("token-1"));
        assert!(response.result.is_none());
    }

    // ========== Quality / Status Parsing ==========

    #[test]
    fn test_quality_parses_known_and_unknown() {
        let valid: ForecastQuality = serde_json::from_str(r#""VALID""#).unwrap();
        assert_eq!(valid, ForecastQuality::Valid);

        let invalid: ForecastQuality = serde_json::from_str(r#""INVALID""#).unwrap();
        assert_eq!(invalid, ForecastQuality::Invalid);

        let other: ForecastQuality = serde_json::from_str(r#""DUBIOUS""#).unwrap();
        assert_eq!(other, ForecastQuality::Other("DUBIOUS".to_string()));
    }

    #[test]
    fn test_analysis_status_parses_known_and_unknown() {
        let ok: AnalysisStatus = serde_json::from_str(r#""OK""#).unwrap();
        assert_eq!(ok, AnalysisStatus::Ok);

        let other: AnalysisStatus = serde_json::from_str(r#""PARTIAL""#).unwrap();
        assert_eq!(other, AnalysisStatus::Other("PARTIAL".to_string()));
    }

    #[test]
    fn test_record_deserialize_tolerates_missing_series() {
        let record: ForecastRecord = serde_json::from_str(
            r#"{"analysisStatus":"OK","forecastQualityAssessment":"VALID"}"#,
        )
        .unwrap();
        assert!(record.usage_history.is_empty());
        assert!(record.lower_forecast.is_empty());
        assert!(record.upper_forecast.is_none());
    }
}
