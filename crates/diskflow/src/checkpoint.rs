// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Checkpoint persistence for resumable runs.
//!
//! A run that cannot finish inside one invocation persists its position
//! and accumulated summary, and a later invocation resumes from there.
//! Storage is a capability trait so the core is testable with the
//! in-memory store and deployable against any durable backend (see the
//! file-backed store in `diskflow-file-checkpointer`).
//!
//! Ownership rules: a checkpoint slot is keyed by `(run_id, key)` and
//! owned exclusively by one pipeline run; the orchestrator is its only
//! writer, once per invocation, after the batch fully settles.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::summary::PipelineSummary;

/// Default slot key for the capacity-forecast checkpoint.
pub const CHECKPOINT_KEY: &str = "disk_forecast_checkpoint";

/// Persisted progress of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    /// Index of the first disk the next invocation should process;
    /// always within `0..=total_disks`
    pub start_index: usize,
    /// Summary accumulated by all previous invocations of this run
    pub summary: PipelineSummary,
}

impl Checkpoint {
    /// Checkpoint at `start_index` carrying `summary`.
    #[must_use]
    pub fn new(start_index: usize, summary: PipelineSummary) -> Self {
        Self {
            start_index,
            summary,
        }
    }
}

/// Durable key-value slot for run progress.
///
/// `delete` is idempotent: deleting an absent checkpoint is not an
/// error. Backends convert their failures into
/// [`CheckpointError`](crate::error::CheckpointError).
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Load the checkpoint for `(run_id, key)`, if any.
    ///
    /// # Errors
    ///
    /// Returns a checkpoint error when the backend cannot be read or
    /// the stored payload cannot be decoded.
    async fn load(&self, run_id: &str, key: &str) -> Result<Option<Checkpoint>>;

    /// Persist `checkpoint` under `(run_id, key)`, replacing any
    /// previous value.
    ///
    /// # Errors
    ///
    /// Returns a checkpoint error when the backend cannot be written.
    async fn save(&self, run_id: &str, key: &str, checkpoint: &Checkpoint) -> Result<()>;

    /// Remove the checkpoint for `(run_id, key)`. Removing an absent
    /// checkpoint succeeds.
    ///
    /// # Errors
    ///
    /// Returns a checkpoint error when the backend fails for a reason
    /// other than absence.
    async fn delete(&self, run_id: &str, key: &str) -> Result<()>;
}

#[async_trait]
impl<T: CheckpointStore + ?Sized> CheckpointStore for std::sync::Arc<T> {
    async fn load(&self, run_id: &str, key: &str) -> Result<Option<Checkpoint>> {
        (**self).load(run_id, key).await
    }

    async fn save(&self, run_id: &str, key: &str, checkpoint: &Checkpoint) -> Result<()> {
        (**self).save(run_id, key, checkpoint).await
    }

    async fn delete(&self, run_id: &str, key: &str) -> Result<()> {
        (**self).delete(run_id, key).await
    }
}

/// In-memory checkpoint store for tests and single-process hosts.
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    slots: parking_lot::Mutex<HashMap<(String, String), Checkpoint>>,
}

impl MemoryCheckpointStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of checkpoints currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// True when no checkpoints are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn load(&self, run_id: &str, key: &str) -> Result<Option<Checkpoint>> {
        let slot = (run_id.to_string(), key.to_string());
        Ok(self.slots.lock().get(&slot).cloned())
    }

    async fn save(&self, run_id: &str, key: &str, checkpoint: &Checkpoint) -> Result<()> {
        let slot = (run_id.to_string(), key.to_string());
        debug!(run_id, key, start_index = checkpoint.start_index, "saved checkpoint");
        self.slots.lock().insert(slot, checkpoint.clone());
        Ok(())
    }

    async fn delete(&self, run_id: &str, key: &str) -> Result<()> {
        let slot = (run_id.to_string(), key.to_string());
        self.slots.lock().remove(&slot);
        debug!(run_id, key, "deleted checkpoint");
        Ok(())
    }
}
