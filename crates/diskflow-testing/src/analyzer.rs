//! Scriptable mock analyzer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use diskflow::{
    AnalyzerResponse, Error, ForecastAnalyzer, ForecastRecord, ForecastRequest, ForecastResult,
    Result,
};

/// What the mock does for a given disk.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Submission completes immediately with this record
    Complete(ForecastRecord),
    /// Submission returns a token; completes with this record after
    /// the given number of polls
    CompleteAfterPolls(u32, ForecastRecord),
    /// Submission completes immediately with an empty result
    CompleteEmpty,
    /// Submission reports a failed execution
    FailExecution,
    /// Submission returns a token; fails after the given number of
    /// polls
    FailAfterPolls(u32),
    /// The submit call itself errors
    ErrorOnSubmit,
    /// Polls report RUNNING forever (exercises poller ceilings)
    NeverComplete,
}

struct PendingJob {
    behavior: MockBehavior,
    polls_so_far: u32,
}

/// Mock [`ForecastAnalyzer`] scripted per disk id.
///
/// Behaviors are keyed by the disk id appearing in the request's query
/// expression; disks without a scripted behavior get the default.
pub struct MockForecastAnalyzer {
    default_behavior: MockBehavior,
    behaviors: Mutex<HashMap<String, MockBehavior>>,
    pending: Mutex<HashMap<String, PendingJob>>,
    next_token: AtomicU32,
    submit_count: AtomicU32,
    poll_count: AtomicU32,
    track_concurrency: bool,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockForecastAnalyzer {
    /// Analyzer whose default behavior is to complete immediately with
    /// `record`.
    #[must_use]
    pub fn completing_with(record: ForecastRecord) -> Self {
        Self::with_default(MockBehavior::Complete(record))
    }

    /// Analyzer with an arbitrary default behavior.
    #[must_use]
    pub fn with_default(default_behavior: MockBehavior) -> Self {
        Self {
            default_behavior,
            behaviors: Mutex::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
            next_token: AtomicU32::new(0),
            submit_count: AtomicU32::new(0),
            poll_count: AtomicU32::new(0),
            track_concurrency: false,
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Script a behavior for one disk id.
    #[must_use]
    pub fn with_behavior(self, disk_id: &str, behavior: MockBehavior) -> Self {
        self.behaviors.lock().insert(disk_id.to_string(), behavior);
        self
    }

    /// Record peak submissions in flight (each submit then lingers a
    /// few milliseconds so overlap is observable).
    #[must_use]
    pub fn tracking_concurrency(mut self) -> Self {
        self.track_concurrency = true;
        self
    }

    /// Submissions received so far.
    #[must_use]
    pub fn submit_count(&self) -> u32 {
        self.submit_count.load(Ordering::SeqCst)
    }

    /// Poll calls received so far.
    #[must_use]
    pub fn poll_count(&self) -> u32 {
        self.poll_count.load(Ordering::SeqCst)
    }

    /// Highest number of submissions observed in flight at once.
    #[must_use]
    pub fn peak_concurrency(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn behavior_for(&self, disk_id: &str) -> MockBehavior {
        self.behaviors
            .lock()
            .get(disk_id)
            .cloned()
            .unwrap_or_else(|| self.default_behavior.clone())
    }

    fn completed(record: ForecastRecord, disk_id: &str) -> AnalyzerResponse {
        let mut record = record;
        if record.disk_id.is_none() {
            record.disk_id = Some(disk_id.to_string());
        }
        AnalyzerResponse::completed(ForecastResult {
            records: vec![record],
        })
    }
}

/// Pull the disk id out of the query expression's equality filter.
fn disk_id_from_expression(expression: &str) -> Option<&str> {
    let (_, rest) = expression.split_once(r#"dt.entity.disk == ""#)?;
    rest.split_once('"').map(|(id, _)| id)
}

#[async_trait]
impl ForecastAnalyzer for MockForecastAnalyzer {
    async fn submit(&self, request: &ForecastRequest) -> Result<AnalyzerResponse> {
        self.submit_count.fetch_add(1, Ordering::SeqCst);

        if self.track_concurrency {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }

        let disk_id = disk_id_from_expression(&request.expression)
            .unwrap_or("")
            .to_string();

        match self.behavior_for(&disk_id) {
            MockBehavior::Complete(record) => Ok(Self::completed(record, &disk_id)),
            MockBehavior::CompleteEmpty => {
                Ok(AnalyzerResponse::completed(ForecastResult::default()))
            }
            MockBehavior::FailExecution => Ok(AnalyzerResponse::failed()),
            MockBehavior::ErrorOnSubmit => Err(Error::AnalyzerSubmit(format!(
                "injected submit failure for {disk_id}"
            ))),
            behavior @ (MockBehavior::CompleteAfterPolls(..)
            | MockBehavior::FailAfterPolls(_)
            | MockBehavior::NeverComplete) => {
                let token = format!(
                    "job-{}-{disk_id}",
                    self.next_token.fetch_add(1, Ordering::SeqCst)
                );
                self.pending.lock().insert(
                    token.clone(),
                    PendingJob {
                        behavior,
                        polls_so_far: 0,
                    },
                );
                Ok(AnalyzerResponse::running(token))
            }
        }
    }

    async fn poll(&self, _analyzer_name: &str, request_token: &str) -> Result<AnalyzerResponse> {
        self.poll_count.fetch_add(1, Ordering::SeqCst);

        let mut pending = self.pending.lock();
        let job = pending.get_mut(request_token).ok_or_else(|| {
            Error::AnalyzerSubmit(format!("unknown request token {request_token}"))
        })?;
        job.polls_so_far += 1;
        let polls = job.polls_so_far;

        match job.behavior.clone() {
            MockBehavior::CompleteAfterPolls(needed, record) if polls >= needed => {
                pending.remove(request_token);
                let disk_id = token_disk_id(request_token).to_string();
                drop(pending);
                Ok(Self::completed(record, &disk_id))
            }
            MockBehavior::FailAfterPolls(needed) if polls >= needed => {
                pending.remove(request_token);
                Ok(AnalyzerResponse::failed())
            }
            _ => Ok(AnalyzerResponse::running(request_token)),
        }
    }
}

fn token_disk_id(token: &str) -> &str {
    token.splitn(3, '-').nth(2).unwrap_or("")
}
