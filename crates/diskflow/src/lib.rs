// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! DiskFlow - resumable batched disk-capacity forecast pipeline
//!
//! DiskFlow predicts when monitored storage volumes will run out of
//! capacity. It feeds historical usage telemetry to an external
//! statistical forecasting analyzer, drives the analyzer's
//! asynchronous jobs to completion under bounded polling, and turns the
//! resulting confidence bands into a deterministic "days until full"
//! verdict per disk.
//!
//! The pipeline is built to survive a hard per-invocation execution
//! ceiling: each invocation advances a fixed-size batch of disks with
//! bounded concurrency and persists a checkpoint, so a run over a large
//! entity universe completes across repeated invocations and a
//! half-finished run resumes exactly where it stopped.
//!
//! # Architecture
//!
//! - [`PipelineOrchestrator`] - loads/persists progress, runs one
//!   slice, decides complete vs incomplete
//! - [`BatchScheduler`] - slices the entity list and processes disks
//!   with bounded concurrency
//! - [`ForecastPoller`] - drives one analyzer job to a terminal state
//!   under attempt and wall-clock ceilings
//! - [`interpret`] - turns a completed forecast into a
//!   violation-or-clean verdict with a confidence score
//! - [`CheckpointStore`] / [`ForecastAnalyzer`] / [`EntitySource`] -
//!   capability traits for the external collaborators
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use diskflow::{MemoryCheckpointStore, PipelineConfig, PipelineOrchestrator, RunOutcome};
//!
//! let orchestrator = PipelineOrchestrator::new(
//!     entity_source,                 // impl EntitySource
//!     Arc::new(analyzer),            // impl ForecastAnalyzer
//!     MemoryCheckpointStore::new(),  // impl CheckpointStore
//!     PipelineConfig::default(),
//! );
//!
//! // The host re-invokes until the run reports completion.
//! loop {
//!     match orchestrator.run("run-2026-08-07").await? {
//!         RunOutcome::Complete(summary) => break summary,
//!         RunOutcome::Incomplete { processed, total, .. } => {
//!             tracing::info!("processed {processed}/{total}, re-invoking");
//!         }
//!     }
//! }
//! ```
//!
//! # See Also
//!
//! - `diskflow-file-checkpointer` - durable file-backed
//!   [`CheckpointStore`]
//! - `diskflow-http-analyzer` - REST client implementing
//!   [`ForecastAnalyzer`]
//! - `diskflow-testing` - mocks for every capability trait

pub mod analyzer;
pub mod checkpoint;
pub mod config;
pub mod entity;
pub mod error;
pub mod interpreter;
pub mod orchestrator;
pub mod poller;
pub mod query;
pub mod scheduler;
pub mod summary;

pub use analyzer::{
    AnalysisStatus, AnalyzerResponse, ExecutionStatus, ForecastAnalyzer, ForecastQuality,
    ForecastRecord, ForecastRequest, ForecastResult, DEFAULT_ANALYZER_NAME,
};
pub use checkpoint::{Checkpoint, CheckpointStore, MemoryCheckpointStore, CHECKPOINT_KEY};
pub use config::PipelineConfig;
pub use entity::{DiskEntity, EntitySource};
pub use error::{CheckpointError, Error, Result};
pub use interpreter::interpret;
pub use orchestrator::{PipelineOrchestrator, RunOutcome};
pub use poller::{ForecastPoller, PollPolicy};
pub use query::TimeSeriesQuery;
pub use scheduler::BatchScheduler;
pub use summary::{DiskOutcome, PipelineMetrics, PipelineSummary, ViolationRecord};
