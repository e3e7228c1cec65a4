//! Disk entities and the entity source seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A monitored disk volume, joined with its owning host.
///
/// Identity is `disk_id`. The entity list is fetched once per
/// invocation and treated as immutable for the run: resumed invocations
/// of the same run must see the same universe or batch slicing would
/// drift against a moving entity set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiskEntity {
    /// Disk entity identifier
    pub disk_id: String,
    /// Disk display name
    #[serde(default)]
    pub disk_name: String,
    /// Owning host entity identifier
    pub host_id: String,
    /// Host display name
    #[serde(default)]
    pub host_name: String,
}

impl DiskEntity {
    /// Create a disk entity.
    pub fn new(
        disk_id: impl Into<String>,
        disk_name: impl Into<String>,
        host_id: impl Into<String>,
        host_name: impl Into<String>,
    ) -> Self {
        Self {
            disk_id: disk_id.into(),
            disk_name: disk_name.into(),
            host_id: host_id.into(),
            host_name: host_name.into(),
        }
    }

    /// A disk without its identifiers cannot be queried or attributed;
    /// the scheduler skips it without counting it analyzed or failed.
    #[must_use]
    pub fn has_required_ids(&self) -> bool {
        !self.disk_id.is_empty() && !self.host_id.is_empty()
    }
}

/// Source of the disk-entity universe for a run.
///
/// Implementations must be idempotent/stable across resumed invocations
/// of the same `run_id`.
#[async_trait]
pub trait EntitySource: Send + Sync {
    /// Fetch the full entity list for this run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EntitySource`](crate::Error::EntitySource) when
    /// the list cannot be produced; this is fatal to the invocation.
    async fn entities(&self, run_id: &str) -> Result<Vec<DiskEntity>>;
}

#[async_trait]
impl<T: EntitySource + ?Sized> EntitySource for std::sync::Arc<T> {
    async fn entities(&self, run_id: &str) -> Result<Vec<DiskEntity>> {
        (**self).entities(run_id).await
    }
}
