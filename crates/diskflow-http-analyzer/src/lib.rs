// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! REST client for the forecast analyzer service
//!
//! Implements [`ForecastAnalyzer`] over the analyzer's HTTP surface:
//!
//! - `POST {base}/analyzers/{name}:execute` submits an analysis
//! - `POST {base}/analyzers/{name}:poll?requestToken=...` advances a
//!   pending one
//!
//! The service's wire shape is loose (per-record series keyed by metric
//! and forecast-band names); this crate maps it into the core's typed
//! [`ForecastRecord`]s leniently - missing or malformed series become
//! empty values the interpreter rejects, never a decode failure for the
//! whole batch.
//!
//! # Example
//!
//! ```rust,ignore
//! use diskflow_http_analyzer::HttpForecastAnalyzer;
//!
//! // Token from DISKFLOW_API_TOKEN
//! let analyzer = HttpForecastAnalyzer::from_env("https://telemetry.example.com/api/v1")?;
//! let orchestrator = PipelineOrchestrator::new(source, Arc::new(analyzer), store, config);
//! ```
//!
//! # See Also
//!
//! - [`ForecastAnalyzer`] - The trait this implements
//! - [`diskflow_testing::MockForecastAnalyzer`](https://docs.rs/diskflow-testing) -
//!   Scriptable alternative for tests

mod wire;

use std::time::Duration;

use async_trait::async_trait;
use diskflow::{AnalyzerResponse, ForecastAnalyzer, ForecastRequest, Result as DiskFlowResult};
use reqwest::StatusCode;
use serde_json::json;
use tracing::{debug, error};

use wire::WireResponse;

/// Environment variable holding the API token.
pub const API_TOKEN_ENV: &str = "DISKFLOW_API_TOKEN";

/// Default per-request timeout.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP-backed [`ForecastAnalyzer`].
pub struct HttpForecastAnalyzer {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl HttpForecastAnalyzer {
    /// Client against `base_url` authenticating with `api_token`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpAnalyzerError::Configuration`] when the underlying
    /// HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Result<Self, HttpAnalyzerError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .map_err(|err| HttpAnalyzerError::Configuration(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: api_token.into(),
        })
    }

    /// Client with the token taken from [`API_TOKEN_ENV`].
    ///
    /// # Errors
    ///
    /// Returns [`HttpAnalyzerError::Configuration`] when the variable
    /// is unset or the client cannot be built.
    pub fn from_env(base_url: impl Into<String>) -> Result<Self, HttpAnalyzerError> {
        let token = std::env::var(API_TOKEN_ENV).map_err(|_| {
            HttpAnalyzerError::Configuration(format!("{API_TOKEN_ENV} is not set"))
        })?;
        Self::new(base_url, token)
    }

    async fn post_json(
        &self,
        url: String,
        body: serde_json::Value,
    ) -> Result<AnalyzerResponse, HttpAnalyzerError> {
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Api-Token {}", self.api_token))
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                error!(url = %url, error = %err, "analyzer request failed");
                HttpAnalyzerError::Request(err.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(url = %url, status = %status, "analyzer returned error status");
            return Err(HttpAnalyzerError::Status {
                code: status,
                body: truncate(&body, 512),
            });
        }

        let wire: WireResponse = response.json().await.map_err(|err| {
            error!(url = %url, error = %err, "failed to decode analyzer response");
            HttpAnalyzerError::Decode(err.to_string())
        })?;

        let mapped = wire.into_response();
        debug!(url = %url, status = ?mapped.status, "analyzer call mapped");
        Ok(mapped)
    }
}

/// Keep error bodies loggable without echoing megabytes.
fn truncate(body: &str, limit: usize) -> String {
    if body.len() <= limit {
        body.to_string()
    } else {
        let mut end = limit;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    }
}

#[async_trait]
impl ForecastAnalyzer for HttpForecastAnalyzer {
    async fn submit(&self, request: &ForecastRequest) -> DiskFlowResult<AnalyzerResponse> {
        let url = format!(
            "{}/analyzers/{}:execute",
            self.base_url, request.analyzer_name
        );
        let body = json!({
            "timeSeriesData": { "expression": request.expression },
            "forecastHorizon": request.forecast_horizon_days,
            "coverageProbability": request.coverage_probability,
            "nPaths": request.path_count,
            "useModelCache": request.use_model_cache,
        });
        Ok(self.post_json(url, body).await?)
    }

    async fn poll(
        &self,
        analyzer_name: &str,
        request_token: &str,
    ) -> DiskFlowResult<AnalyzerResponse> {
        let url = format!(
            "{}/analyzers/{analyzer_name}:poll?requestToken={request_token}",
            self.base_url
        );
        Ok(self.post_json(url, json!({})).await?)
    }
}

/// Error types for the HTTP analyzer client
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum HttpAnalyzerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Request error: {0}")]
    Request(String),

    #[error("Analyzer returned {code}: {body}")]
    Status { code: StatusCode, body: String },

    #[error("Decode error: {0}")]
    Decode(String),
}

/// Convert `HttpAnalyzerError` to `diskflow::Error` for use with `?`
impl From<HttpAnalyzerError> for diskflow::Error {
    fn from(err: HttpAnalyzerError) -> Self {
        diskflow::Error::AnalyzerSubmit(err.to_string())
    }
}
