//! JSON-file checkpointer for DiskFlow
//!
//! Persists checkpoints as human-inspectable JSON files under a root
//! directory, one file per `(run_id, key)` slot:
//! `<root>/<run_id>/<key>.json`. Writes are atomic (temp file +
//! rename) so a crash mid-save never leaves a truncated checkpoint
//! behind.
//!
//! # Example
//!
//! ```rust,ignore
//! use diskflow::{PipelineConfig, PipelineOrchestrator};
//! use diskflow_file_checkpointer::FileCheckpointStore;
//!
//! let store = FileCheckpointStore::new("/var/lib/diskflow/checkpoints");
//! let orchestrator = PipelineOrchestrator::new(source, analyzer, store, PipelineConfig::default());
//! ```
//!
//! # See Also
//!
//! - [`CheckpointStore`] - The trait this implements
//! - [`diskflow::MemoryCheckpointStore`] - In-memory alternative for
//!   tests and single-process hosts

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use diskflow::{Checkpoint, CheckpointError, CheckpointStore, Result as DiskFlowResult};
use tracing::{debug, error};

/// Longest accepted run id / key component.
const MAX_COMPONENT_LEN: usize = 128;

/// Validate a path component (run id or slot key).
///
/// Components must be non-empty, at most 128 characters, and contain
/// only ASCII alphanumerics, `_`, `-`, or `.` without leading dots, so
/// a hostile run id cannot traverse outside the store root.
fn validate_component(name: &str) -> Result<(), FileCheckpointerError> {
    if name.is_empty() {
        return Err(FileCheckpointerError::InvalidComponent(
            "component cannot be empty".to_string(),
        ));
    }
    if name.len() > MAX_COMPONENT_LEN {
        return Err(FileCheckpointerError::InvalidComponent(format!(
            "component '{name}' exceeds maximum length of {MAX_COMPONENT_LEN} characters"
        )));
    }
    if name.starts_with('.') {
        return Err(FileCheckpointerError::InvalidComponent(format!(
            "component '{name}' must not start with a dot"
        )));
    }
    for c in name.chars() {
        if !c.is_ascii_alphanumeric() && c != '_' && c != '-' && c != '.' {
            return Err(FileCheckpointerError::InvalidComponent(format!(
                "component '{name}' contains invalid character '{c}'"
            )));
        }
    }
    Ok(())
}

/// File-backed checkpoint store.
///
/// Layout: one directory per run id, one JSON file per slot key.
/// Deleting a run's last checkpoint leaves its (empty) directory in
/// place; the store never removes directories it did not just create.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    root: PathBuf,
}

impl FileCheckpointStore {
    /// Store rooted at `root`. The directory is created lazily on
    /// first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn slot_path(&self, run_id: &str, key: &str) -> Result<PathBuf, FileCheckpointerError> {
        validate_component(run_id)?;
        validate_component(key)?;
        Ok(self.root.join(run_id).join(format!("{key}.json")))
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn load(&self, run_id: &str, key: &str) -> DiskFlowResult<Option<Checkpoint>> {
        let path = self.slot_path(run_id, key)?;

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(run_id, key, "no checkpoint on disk");
                return Ok(None);
            }
            Err(err) => {
                error!(run_id, key, error = %err, "failed to read checkpoint");
                return Err(FileCheckpointerError::Io(err.to_string()).into());
            }
        };

        let checkpoint: Checkpoint = serde_json::from_slice(&bytes).map_err(|err| {
            error!(run_id, key, error = %err, "failed to decode checkpoint");
            FileCheckpointerError::Serialization(err.to_string())
        })?;
        debug!(
            run_id,
            key,
            start_index = checkpoint.start_index,
            "loaded checkpoint"
        );
        Ok(Some(checkpoint))
    }

    async fn save(&self, run_id: &str, key: &str, checkpoint: &Checkpoint) -> DiskFlowResult<()> {
        let path = self.slot_path(run_id, key)?;
        let parent = path.parent().ok_or_else(|| {
            FileCheckpointerError::InvalidComponent("slot path has no parent".to_string())
        })?;

        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|err| FileCheckpointerError::Io(err.to_string()))?;

        let bytes = serde_json::to_vec_pretty(checkpoint)
            .map_err(|err| FileCheckpointerError::Serialization(err.to_string()))?;

        // Write-then-rename keeps the previous checkpoint intact if
        // this invocation dies mid-write.
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &bytes)
            .await
            .map_err(|err| FileCheckpointerError::Io(err.to_string()))?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|err| FileCheckpointerError::Io(err.to_string()))?;

        debug!(
            run_id,
            key,
            start_index = checkpoint.start_index,
            path = %path.display(),
            "saved checkpoint"
        );
        Ok(())
    }

    async fn delete(&self, run_id: &str, key: &str) -> DiskFlowResult<()> {
        let path = self.slot_path(run_id, key)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(run_id, key, "deleted checkpoint");
                Ok(())
            }
            // Deleting an absent checkpoint is a no-op by contract.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                error!(run_id, key, error = %err, "failed to delete checkpoint");
                Err(FileCheckpointerError::Io(err.to_string()).into())
            }
        }
    }
}

/// Error types for the file checkpointer
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FileCheckpointerError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid component: {0}")]
    InvalidComponent(String),
}

/// Convert `FileCheckpointerError` to `diskflow::Error` for use with `?`
impl From<FileCheckpointerError> for diskflow::Error {
    fn from(err: FileCheckpointerError) -> Self {
        let checkpoint_err = match err {
            FileCheckpointerError::Io(reason) => CheckpointError::Io {
                backend: "file".to_string(),
                reason,
            },
            FileCheckpointerError::Serialization(reason) => {
                CheckpointError::SerializationFailed { reason }
            }
            FileCheckpointerError::InvalidComponent(reason) => CheckpointError::Other(format!(
                "invalid component: {reason}"
            )),
        };
        diskflow::Error::Checkpoint(checkpoint_err)
    }
}
