//! Pipeline tunables.

use serde::{Deserialize, Serialize};

use crate::analyzer::DEFAULT_ANALYZER_NAME;
use crate::checkpoint::CHECKPOINT_KEY;
use crate::error::{Error, Result};
use crate::poller::PollPolicy;
use crate::query::DEFAULT_LOOKBACK_DAYS;

/// Tunables for one pipeline run.
///
/// Defaults match the operating envelope the pipeline was sized for: 10
/// disks advanced per invocation with 5 in flight keeps a full batch
/// within a host execution ceiling of about two minutes even when every
/// disk needs polling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// Analyzer to submit forecasts to
    pub analyzer_name: String,
    /// Disks advanced per invocation
    pub batch_size: usize,
    /// Disks processed concurrently within a slice
    pub max_concurrency: usize,
    /// Days of future prediction requested
    pub forecast_horizon_days: u32,
    /// Confidence-interval coverage, exclusive (0, 1)
    pub coverage_probability: f64,
    /// Simulation paths per forecast
    pub path_count: u32,
    /// Reuse cached models when the analyzer offers it
    pub use_model_cache: bool,
    /// Historical lookback window in days
    pub lookback_days: u32,
    /// Poll pacing and ceilings
    #[serde(skip)]
    pub poll: PollPolicy,
    /// Checkpoint slot key
    pub checkpoint_key: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            analyzer_name: DEFAULT_ANALYZER_NAME.to_string(),
            batch_size: 10,
            max_concurrency: 5,
            forecast_horizon_days: 365,
            coverage_probability: 0.9,
            path_count: 200,
            use_model_cache: true,
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            poll: PollPolicy::default(),
            checkpoint_key: CHECKPOINT_KEY.to_string(),
        }
    }
}

impl PipelineConfig {
    /// Override the disks advanced per invocation.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Override the in-flight disk limit.
    #[must_use]
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Override the forecast horizon.
    #[must_use]
    pub fn with_horizon_days(mut self, days: u32) -> Self {
        self.forecast_horizon_days = days;
        self
    }

    /// Override the poll policy.
    #[must_use]
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Override the analyzer identifier.
    #[must_use]
    pub fn with_analyzer_name(mut self, name: impl Into<String>) -> Self {
        self.analyzer_name = name.into();
        self
    }

    /// Validate all tunables.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] naming the first offending
    /// field.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch size must be at least 1".into()));
        }
        if self.max_concurrency == 0 {
            return Err(Error::InvalidConfig(
                "max concurrency must be at least 1".into(),
            ));
        }
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
            return Err(Error::InvalidConfig("path count must be at least 1".into()));
        }
        if self.lookback_days == 0 {
            return Err(Error::InvalidConfig(
                "lookback window must be at least 1 day".into(),
            ));
        }
        if self.checkpoint_key.is_empty() {
            return Err(Error::InvalidConfig("checkpoint key must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.max_concurrency, 5);
        assert_eq!(config.forecast_horizon_days, 365);
        assert_eq!(config.lookback_days, 30);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = PipelineConfig::default().with_batch_size(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = PipelineConfig::default().with_max_concurrency(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_horizon_bounds() {
        assert!(PipelineConfig::default()
            .with_horizon_days(0)
            .validate()
            .is_err());
        assert!(PipelineConfig::default()
            .with_horizon_days(366)
            .validate()
            .is_err());
        assert!(PipelineConfig::default()
            .with_horizon_days(90)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let config = PipelineConfig::default()
            .with_batch_size(25)
            .with_max_concurrency(8)
            .with_analyzer_name("custom.Forecast");
        assert_eq!(config.batch_size, 25);
        assert_eq!(config.max_concurrency, 8);
        assert_eq!(config.analyzer_name, "custom.Forecast");
    }
}
