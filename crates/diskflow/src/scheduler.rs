// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

// Allow clippy warnings for the scheduler:
// - expect_used: Semaphore acquire uses expect() for synchronization (only panics if semaphore is closed)
#![allow(clippy::expect_used)]

//! Batch scheduling and bounded-concurrency disk processing.
//!
//! One invocation advances a fixed-size slice `[start_index,
//! end_index)` of the entity list. Within the slice at most
//! `max_concurrency` disks are in flight at once; as a permit frees up
//! the next disk is admitted, which bounds the load put on the external
//! analyzer. Per-disk failures are contained here: a bad disk becomes a
//! [`DiskOutcome::Failed`] and processing continues.
//!
//! Tasks do not share the summary. Each returns its [`DiskOutcome`] and
//! the scheduler folds them sequentially, in submission order, after
//! the wave settles.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::analyzer::{ForecastAnalyzer, ForecastRecord, ForecastRequest, ForecastResult};
use crate::config::PipelineConfig;
use crate::entity::DiskEntity;
use crate::interpreter::interpret;
use crate::poller::ForecastPoller;
use crate::query::TimeSeriesQuery;
use crate::summary::{DiskOutcome, PipelineSummary};

/// Drives one slice of the entity list through polling and
/// interpretation.
pub struct BatchScheduler<A> {
    analyzer: Arc<A>,
    config: Arc<PipelineConfig>,
}

impl<A> BatchScheduler<A>
where
    A: ForecastAnalyzer + 'static,
{
    /// Scheduler over `analyzer` with `config` tunables.
    pub fn new(analyzer: Arc<A>, config: Arc<PipelineConfig>) -> Self {
        Self { analyzer, config }
    }

    /// Process the slice starting at `start_index`, folding outcomes
    /// into `summary`. Returns the index one past the last disk
    /// attempted (`min(start_index + batch_size, disks.len())`).
    ///
    /// Disk order within the slice is the entity-list order; completion
    /// order under bounded concurrency is not guaranteed, but the fold
    /// happens in submission order either way.
    pub async fn run_slice(
        &self,
        disks: &[DiskEntity],
        start_index: usize,
        summary: &mut PipelineSummary,
    ) -> usize {
        let end_index = (start_index + self.config.batch_size).min(disks.len());
        if start_index >= end_index {
            return end_index;
        }

        info!(
            start_index,
            end_index,
            total = disks.len(),
            "processing disk slice"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency));
        let mut tasks = Vec::with_capacity(end_index - start_index);

        for disk in &disks[start_index..end_index] {
            let disk = disk.clone();
            let analyzer = Arc::clone(&self.analyzer);
            let config = Arc::clone(&self.config);
            let semaphore = Arc::clone(&semaphore);

            tasks.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore closed unexpectedly");
                process_disk(analyzer.as_ref(), &config, &disk).await
            }));
        }

        for task in tasks {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    error!(error = %join_error, "disk task aborted");
                    DiskOutcome::Failed
                }
            };
            summary.record(outcome);
        }

        end_index
    }
}

/// Process a single disk: validate, query, resolve the forecast,
/// interpret. Every error is contained here and mapped to an outcome.
async fn process_disk<A: ForecastAnalyzer>(
    analyzer: &A,
    config: &PipelineConfig,
    disk: &DiskEntity,
) -> DiskOutcome {
    if !disk.has_required_ids() {
        warn!(
            disk_id = %disk.disk_id,
            host_id = %disk.host_id,
            "skipping disk with missing identifiers"
        );
        return DiskOutcome::Skipped;
    }

    let expression = TimeSeriesQuery::disk_used_percent()
        .with_lookback_days(config.lookback_days)
        .for_disk(&disk.disk_id)
        .render();

    let mut request = ForecastRequest::new(expression)
        .with_analyzer_name(&config.analyzer_name)
        .with_horizon_days(config.forecast_horizon_days)
        .with_coverage_probability(config.coverage_probability)
        .with_path_count(config.path_count);
    request.use_model_cache = config.use_model_cache;

    let poller = ForecastPoller::new(analyzer, config.poll.clone());
    match poller.resolve(&request).await {
        Ok(result) => match select_record(&result, &disk.disk_id) {
            Some(record) => interpret(disk, record, Utc::now()),
            None => {
                warn!(disk_id = %disk.disk_id, "no prediction output for disk");
                DiskOutcome::Inconclusive
            }
        },
        Err(err) => {
            warn!(disk_id = %disk.disk_id, error = %err, "disk processing failed");
            DiskOutcome::Failed
        }
    }
}

/// Pick the record for `disk_id`; single-disk queries produce exactly
/// one row, so an unattributed first row is accepted as a fallback.
fn select_record<'a>(result: &'a ForecastResult, disk_id: &str) -> Option<&'a ForecastRecord> {
    result
        .records
        .iter()
        .find(|record| record.disk_id.as_deref() == Some(disk_id))
        .or_else(|| result.records.first())
}
