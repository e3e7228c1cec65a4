// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)

//! Error types for DiskFlow operations
//!
//! Errors fall into two tiers with different propagation rules:
//!
//! - **Run-fatal** - the invocation cannot produce a usable summary and
//!   the error surfaces to the host: entity-source failures, checkpoint
//!   persistence failures, invalid configuration.
//! - **Disk-scoped** - the failure is contained at the disk-processing
//!   boundary and recorded as a soft failure in the run metrics:
//!   analyzer submit errors, analyzer execution failures, poll
//!   timeouts.
//!
//! Use [`Error::is_fatal`] to distinguish the two. The scheduler never
//! lets a disk-scoped error abort a batch; the orchestrator never
//! swallows a run-fatal one.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for DiskFlow operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for DiskFlow operations
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    /// Fetching the disk entity list failed. Fatal: without a stable
    /// entity universe there is nothing to batch against.
    #[error("Entity source error: {0}")]
    EntitySource(String),

    /// The analyzer rejected or failed a submission for one disk.
    #[error("Analyzer submit error: {0}")]
    AnalyzerSubmit(String),

    /// The analyzer reported a non-completable execution for one disk.
    #[error("Analyzer execution failed: {0}")]
    AnalyzerFailure(String),

    /// Polling gave up before the analyzer reached a terminal state.
    /// Bounded by both an attempt ceiling and a wall-clock ceiling;
    /// whichever trips first.
    #[error("Polling timed out after {attempts} attempts ({elapsed:?} elapsed)")]
    PollTimeout {
        /// Poll attempts made before giving up
        attempts: u32,
        /// Wall-clock time spent polling
        elapsed: Duration,
    },

    /// Checkpoint load/save/delete failed. Fatal: progress cannot be
    /// safely resumed.
    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    /// Pipeline configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization/deserialization failure outside the checkpoint
    /// store (e.g. rendering the run outcome).
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error for cases not covered by specific variants
    #[error("{0}")]
    Generic(String),
}

impl Error {
    /// True when this error must abort the whole invocation rather than
    /// fail a single disk's unit of work.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::EntitySource(_) | Error::Checkpoint(_) | Error::InvalidConfig(_)
        )
    }

    /// True when this error is contained at the disk-processing
    /// boundary and recorded as a soft failure.
    #[must_use]
    pub fn is_disk_scoped(&self) -> bool {
        matches!(
            self,
            Error::AnalyzerSubmit(_) | Error::AnalyzerFailure(_) | Error::PollTimeout { .. }
        )
    }
}

/// Checkpoint-specific errors, produced by [`CheckpointStore`] backends
///
/// Backend crates define their own error type and convert into this via
/// `From`, so the core stays independent of any particular store.
///
/// [`CheckpointStore`]: crate::checkpoint::CheckpointStore
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// Backend I/O failed (connection lost, file unreadable, ...)
    #[error("Checkpoint I/O error ({backend}): {reason}")]
    Io {
        /// Backend name, e.g. "file" or "memory"
        backend: String,
        /// Underlying failure description
        reason: String,
    },

    /// Checkpoint payload could not be encoded or decoded
    #[error("Checkpoint serialization failed: {reason}")]
    SerializationFailed {
        /// Underlying failure description
        reason: String,
    },

    /// A loaded checkpoint is inconsistent with the current run
    /// (e.g. its position exceeds the entity count)
    #[error("Checkpoint corrupt: {reason}")]
    Corrupt {
        /// What made the checkpoint unusable
        reason: String,
    },

    /// Other checkpoint error
    #[error("{0}")]
    Other(String),
}
