//! Fault-injecting checkpoint store.

use async_trait::async_trait;

use diskflow::{Checkpoint, CheckpointError, CheckpointStore, MemoryCheckpointStore, Result};

/// Checkpoint store that fails selected operations, delegating the
/// rest to an in-memory store. For exercising the pipeline's fatal
/// persistence paths.
#[derive(Default)]
pub struct FailingCheckpointStore {
    inner: MemoryCheckpointStore,
    fail_load: bool,
    fail_save: bool,
    fail_delete: bool,
}

impl FailingCheckpointStore {
    /// Store with no injected failures (behaves like
    /// [`MemoryCheckpointStore`]).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `load` fail.
    #[must_use]
    pub fn failing_load(mut self) -> Self {
        self.fail_load = true;
        self
    }

    /// Make every `save` fail.
    #[must_use]
    pub fn failing_save(mut self) -> Self {
        self.fail_save = true;
        self
    }

    /// Make every `delete` fail.
    #[must_use]
    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    fn injected(op: &str) -> CheckpointError {
        CheckpointError::Io {
            backend: "failing-mock".to_string(),
            reason: format!("injected {op} failure"),
        }
    }
}

#[async_trait]
impl CheckpointStore for FailingCheckpointStore {
    async fn load(&self, run_id: &str, key: &str) -> Result<Option<Checkpoint>> {
        if self.fail_load {
            return Err(Self::injected("load").into());
        }
        self.inner.load(run_id, key).await
    }

    async fn save(&self, run_id: &str, key: &str, checkpoint: &Checkpoint) -> Result<()> {
        if self.fail_save {
            return Err(Self::injected("save").into());
        }
        self.inner.save(run_id, key, checkpoint).await
    }

    async fn delete(&self, run_id: &str, key: &str) -> Result<()> {
        if self.fail_delete {
            return Err(Self::injected("delete").into());
        }
        self.inner.delete(run_id, key).await
    }
}
