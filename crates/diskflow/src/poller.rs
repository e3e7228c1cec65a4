// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Polling state machine for asynchronous forecast jobs.
//!
//! One configurable loop drives every submission to a terminal state:
//!
//! ```text
//! SUBMITTED --> COMPLETED                 (immediate result)
//! SUBMITTED --> RUNNING --> RUNNING ...   (poll with token, sleep)
//!                       --> COMPLETED     (result returned)
//!                       --> FAILED        (AnalyzerFailure)
//!                       --> TIMED_OUT     (PollTimeout: attempt or
//!                                          wall-clock ceiling)
//! ```
//!
//! The loop is bounded by both an attempt ceiling and an elapsed-time
//! ceiling; whichever trips first fails that one disk's unit of work.
//! It never blocks indefinitely.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::analyzer::{ExecutionStatus, ForecastAnalyzer, ForecastRequest, ForecastResult};
use crate::error::{Error, Result};

/// Bounds and pacing for the poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    /// Maximum poll attempts before giving up
    pub max_attempts: u32,
    /// Maximum wall-clock time spent polling before giving up
    pub max_elapsed: Duration,
    /// Delay before the first poll
    pub initial_delay: Duration,
    /// Additional delay added per completed attempt; zero gives a
    /// fixed-interval loop
    pub delay_increment: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            max_elapsed: Duration::from_secs(45),
            initial_delay: Duration::from_secs(2),
            delay_increment: Duration::from_millis(500),
        }
    }
}

impl PollPolicy {
    /// Delay before poll attempt `attempt` (0-based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.initial_delay + self.delay_increment * attempt
    }
}

/// Drives one forecast submission to completion against an analyzer.
pub struct ForecastPoller<'a, A: ForecastAnalyzer> {
    analyzer: &'a A,
    policy: PollPolicy,
}

impl<'a, A: ForecastAnalyzer> ForecastPoller<'a, A> {
    /// Poller over `analyzer` with the given policy.
    pub fn new(analyzer: &'a A, policy: PollPolicy) -> Self {
        Self { analyzer, policy }
    }

    /// Submit `request` and poll until a terminal state.
    ///
    /// # Errors
    ///
    /// - [`Error::AnalyzerSubmit`] - the submission (or a poll call)
    ///   could not be delivered, or the analyzer returned a pending
    ///   status without a continuation token.
    /// - [`Error::AnalyzerFailure`] - the analyzer reported a failed
    ///   execution.
    /// - [`Error::PollTimeout`] - neither ceiling was reached with a
    ///   terminal status.
    pub async fn resolve(&self, request: &ForecastRequest) -> Result<ForecastResult> {
        let response = self.analyzer.submit(request).await?;

        match response.status {
            ExecutionStatus::Completed => {
                return Ok(response.result.unwrap_or_default());
            }
            ExecutionStatus::Failed => {
                return Err(Error::AnalyzerFailure(format!(
                    "analyzer {} failed at submission",
                    request.analyzer_name
                )));
            }
            ExecutionStatus::Running => {}
        }

        let mut token = response.request_token.ok_or_else(|| {
            Error::AnalyzerSubmit(format!(
                "analyzer {} returned RUNNING without a request token",
                request.analyzer_name
            ))
        })?;

        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            if attempts >= self.policy.max_attempts {
                warn!(
                    analyzer = %request.analyzer_name,
                    attempts,
                    "giving up: poll attempt ceiling reached"
                );
                return Err(Error::PollTimeout {
                    attempts,
                    elapsed: started.elapsed(),
                });
            }
            if started.elapsed() > self.policy.max_elapsed {
                warn!(
                    analyzer = %request.analyzer_name,
                    elapsed = ?started.elapsed(),
                    "giving up: poll wall-clock ceiling reached"
                );
                return Err(Error::PollTimeout {
                    attempts,
                    elapsed: started.elapsed(),
                });
            }

            tokio::time::sleep(self.policy.delay_for_attempt(attempts)).await;
            attempts += 1;

            let response = self
                .analyzer
                .poll(&request.analyzer_name, &token)
                .await?;
            debug!(
                analyzer = %request.analyzer_name,
                attempt = attempts,
                status = ?response.status,
                "poll attempt"
            );

            match response.status {
                ExecutionStatus::Completed => {
                    return Ok(response.result.unwrap_or_default());
                }
                ExecutionStatus::Failed => {
                    return Err(Error::AnalyzerFailure(format!(
                        "analyzer {} reported execution failure after {attempts} polls",
                        request.analyzer_name
                    )));
                }
                ExecutionStatus::Running => {
                    // Tokens chain: always present the latest one.
                    if let Some(next) = response.request_token {
                        token = next;
                    }
                }
            }
        }
    }
}
