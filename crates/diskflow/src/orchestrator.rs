// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Top-level run driver: resumable invocations over a checkpoint.
//!
//! A host invokes [`PipelineOrchestrator::run`] repeatedly under a hard
//! execution-time ceiling. Each invocation advances one slice of the
//! entity list and either completes the run (checkpoint cleared, full
//! summary returned) or persists its progress and reports
//! `incomplete`. Scheduling the next invocation is the host's
//! responsibility; the orchestrator only persists and reports state.
//!
//! The checkpoint has a single writer - this orchestrator, once per
//! invocation, strictly after the batch has settled.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::analyzer::ForecastAnalyzer;
use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::config::PipelineConfig;
use crate::entity::EntitySource;
use crate::error::{CheckpointError, Result};
use crate::scheduler::BatchScheduler;
use crate::summary::PipelineSummary;

/// Result of one orchestrator invocation.
///
/// Serializes to the downstream consumer contract: a completed run is
/// the bare summary object (`{violations, metrics}`), a partial run is
/// `{"status": "incomplete", "processed": .., "total": .., "summary":
/// ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunOutcome {
    /// The entity list was not exhausted; a checkpoint was persisted
    /// and the host should re-invoke.
    Incomplete {
        /// Always `"incomplete"`
        status: String,
        /// Disks advanced past so far (the new checkpoint position)
        processed: usize,
        /// Size of the entity universe
        total: usize,
        /// Summary accumulated so far
        summary: PipelineSummary,
    },
    /// The run finished; the checkpoint was cleared.
    Complete(PipelineSummary),
}

impl RunOutcome {
    /// A completed run.
    #[must_use]
    pub fn complete(summary: PipelineSummary) -> Self {
        RunOutcome::Complete(summary)
    }

    /// A partial run at position `processed` of `total`.
    #[must_use]
    pub fn incomplete(processed: usize, total: usize, summary: PipelineSummary) -> Self {
        RunOutcome::Incomplete {
            status: "incomplete".to_string(),
            processed,
            total,
            summary,
        }
    }

    /// True when the run finished this invocation.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, RunOutcome::Complete(_))
    }

    /// The summary accumulated so far, whatever the status.
    #[must_use]
    pub fn summary(&self) -> &PipelineSummary {
        match self {
            RunOutcome::Complete(summary) => summary,
            RunOutcome::Incomplete { summary, .. } => summary,
        }
    }
}

/// Top-level driver wiring the entity source, analyzer, and checkpoint
/// store together.
pub struct PipelineOrchestrator<E, A, C> {
    entity_source: E,
    analyzer: Arc<A>,
    checkpoints: C,
    config: Arc<PipelineConfig>,
}

impl<E, A, C> PipelineOrchestrator<E, A, C>
where
    E: EntitySource,
    A: ForecastAnalyzer + 'static,
    C: CheckpointStore,
{
    /// Orchestrator over the three collaborators.
    pub fn new(entity_source: E, analyzer: Arc<A>, checkpoints: C, config: PipelineConfig) -> Self {
        Self {
            entity_source,
            analyzer,
            checkpoints,
            config: Arc::new(config),
        }
    }

    /// Run one invocation of the pipeline for `run_id`.
    ///
    /// # Errors
    ///
    /// Only run-fatal errors surface here:
    /// [`Error::EntitySource`](crate::Error::EntitySource) when the
    /// entity list cannot be fetched,
    /// [`Error::Checkpoint`](crate::Error::Checkpoint) when progress
    /// cannot be loaded or persisted (or a loaded checkpoint is
    /// inconsistent with the entity universe), and
    /// [`Error::InvalidConfig`](crate::Error::InvalidConfig) from
    /// validation. Per-disk failures are contained by the scheduler and
    /// reported through the summary metrics instead.
    pub async fn run(&self, run_id: &str) -> Result<RunOutcome> {
        self.config.validate()?;

        // Fetched once per invocation; never re-fetched mid-run, so the
        // slice arithmetic stays consistent against one universe.
        let disks = self.entity_source.entities(run_id).await?;
        let total = disks.len();
        let key = self.config.checkpoint_key.as_str();

        let (start_index, mut summary) = match self.checkpoints.load(run_id, key).await? {
            Some(checkpoint) => {
                if checkpoint.start_index > total {
                    return Err(CheckpointError::Corrupt {
                        reason: format!(
                            "startIndex {} exceeds {} entities for run {run_id}",
                            checkpoint.start_index, total
                        ),
                    }
                    .into());
                }
                info!(
                    run_id,
                    start_index = checkpoint.start_index,
                    total,
                    "resuming from checkpoint"
                );
                (checkpoint.start_index, checkpoint.summary)
            }
            None => {
                info!(run_id, total, "starting new run");
                (0, PipelineSummary::new(total as u32))
            }
        };

        let scheduler = BatchScheduler::new(Arc::clone(&self.analyzer), Arc::clone(&self.config));
        let end_index = scheduler.run_slice(&disks, start_index, &mut summary).await;

        if end_index >= total {
            // Deleting an absent checkpoint is a no-op by the store
            // contract, so a fresh single-invocation run passes through
            // here without ever having persisted one.
            self.checkpoints.delete(run_id, key).await?;
            info!(
                run_id,
                analyzed = summary.metrics.analyzed_disks,
                violations = summary.violations.len(),
                "run complete"
            );
            Ok(RunOutcome::complete(summary))
        } else {
            let checkpoint = Checkpoint::new(end_index, summary.clone());
            self.checkpoints.save(run_id, key, &checkpoint).await?;
            warn!(
                run_id,
                processed = end_index,
                total,
                "run incomplete, checkpoint saved"
            );
            Ok(RunOutcome::incomplete(end_index, total, summary))
        }
    }
}
