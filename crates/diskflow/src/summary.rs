// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Violations, run metrics, and the single-writer summary fold.
//!
//! Per-disk tasks never touch the shared summary: each task returns a
//! [`DiskOutcome`] and the scheduler folds outcomes into the
//! [`PipelineSummary`] sequentially after the concurrency wave settles.
//! That keeps the accumulator race-free without any locking.
//!
//! The serialized forms are a consumer contract: the downstream report
//! formatter reads camelCase field names (`diskId`, `daysUntilFull`,
//! `predictedDate`, ...) from the violations array.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A disk predicted to reach 100% usage within the forecast horizon.
///
/// Immutable once created; owned solely by the summary that holds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationRecord {
    /// Disk entity id
    pub disk_id: String,
    /// Disk display name
    pub disk_name: String,
    /// Host entity id
    pub host_id: String,
    /// Host display name
    pub host_name: String,
    /// Most recent observed usage percent (0-100, 2 decimals)
    pub current_usage: f64,
    /// Days until the pessimistic band reaches 100%, 1-indexed
    pub days_until_full: u32,
    /// Calendar date of predicted exhaustion
    pub predicted_date: NaiveDate,
    /// 1 minus the normalized confidence-band width at the crossing
    /// day (0-1, 2 decimals); narrower band means higher confidence
    pub confidence: f64,
    /// When this disk was analyzed
    pub analyzed_at: DateTime<Utc>,
}

/// Counters accumulated over one run, across resumed invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineMetrics {
    /// Disks whose analysis produced an interpretation
    pub analyzed_disks: u32,
    /// Analyzed disks with a usable prediction (violation or clean)
    pub valid_predictions: u32,
    /// Analyzed disks whose prediction the analyzer self-rejected
    pub invalid_predictions: u32,
    /// Violations raised (always equals `violations.len()`)
    pub disks_with_violations: u32,
    /// Disks whose processing failed (submit error, analyzer failure,
    /// poll timeout); soft failures, never fatal to the run
    pub failed_disks: u32,
    /// Disks skipped for missing identifiers
    pub skipped_disks: u32,
    /// Size of the entity universe for the run
    pub total_disks: u32,
}

impl PipelineMetrics {
    /// Disks the pipeline has advanced past, whatever the outcome.
    /// Equals the checkpoint position whenever a checkpoint exists.
    #[must_use]
    pub fn attempted_disks(&self) -> u32 {
        self.analyzed_disks + self.failed_disks + self.skipped_disks
    }
}

/// Result of processing one disk, returned by the per-disk task and
/// folded into the summary by a single writer.
#[derive(Debug, Clone, PartialEq)]
pub enum DiskOutcome {
    /// Lower band crosses 100% within the horizon
    Violation(Box<ViolationRecord>),
    /// Usable prediction, no crossing (or the disk is already full)
    Clean,
    /// Analyzer self-rejected the prediction quality
    Invalid,
    /// Analysis ran but produced nothing interpretable (bad status,
    /// missing series)
    Inconclusive,
    /// Processing failed; the error was contained at the disk boundary
    Failed,
    /// Entity was missing required identifiers and was never analyzed
    Skipped,
}

/// Accumulated violations and metrics for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSummary {
    /// Violations found so far, in processing order
    pub violations: Vec<ViolationRecord>,
    /// Run counters
    pub metrics: PipelineMetrics,
}

impl PipelineSummary {
    /// Empty summary for a universe of `total_disks` entities.
    #[must_use]
    pub fn new(total_disks: u32) -> Self {
        Self {
            violations: Vec::new(),
            metrics: PipelineMetrics {
                total_disks,
                ..PipelineMetrics::default()
            },
        }
    }

    /// Fold one disk outcome into the summary.
    pub fn record(&mut self, outcome: DiskOutcome) {
        match outcome {
            DiskOutcome::Violation(violation) => {
                self.metrics.analyzed_disks += 1;
                self.metrics.valid_predictions += 1;
                self.metrics.disks_with_violations += 1;
                self.violations.push(*violation);
            }
            DiskOutcome::Clean => {
                self.metrics.analyzed_disks += 1;
                self.metrics.valid_predictions += 1;
            }
            DiskOutcome::Invalid => {
                self.metrics.analyzed_disks += 1;
                self.metrics.invalid_predictions += 1;
            }
            DiskOutcome::Inconclusive => {
                self.metrics.analyzed_disks += 1;
            }
            DiskOutcome::Failed => {
                self.metrics.failed_disks += 1;
            }
            DiskOutcome::Skipped => {
                self.metrics.skipped_disks += 1;
            }
        }
        debug_assert_eq!(
            self.violations.len(),
            self.metrics.disks_with_violations as usize
        );
    }
}
