//! Entity source backed by a JSON file.

use std::path::PathBuf;

use async_trait::async_trait;
use diskflow::{DiskEntity, EntitySource, Error, Result};

/// Reads the disk universe from a JSON array of entities
/// (`[{"diskId": ..., "hostId": ...}, ...]`), typically exported by an
/// upstream entity query. The file is re-read per invocation but must
/// not change for the lifetime of a run id.
pub struct FileEntitySource {
    path: PathBuf,
}

impl FileEntitySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl EntitySource for FileEntitySource {
    async fn entities(&self, _run_id: &str) -> Result<Vec<DiskEntity>> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|err| {
            Error::EntitySource(format!("cannot read {}: {err}", self.path.display()))
        })?;
        serde_json::from_slice(&bytes).map_err(|err| {
            Error::EntitySource(format!("cannot parse {}: {err}", self.path.display()))
        })
    }
}
