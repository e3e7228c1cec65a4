//! Entity factories and a mock entity source.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use diskflow::{DiskEntity, EntitySource, Error, Result};

/// Deterministic disk entity `n` (`DISK-00n` on `HOST-00n`).
#[must_use]
pub fn disk(n: usize) -> DiskEntity {
    DiskEntity::new(
        format!("DISK-{n:03}"),
        format!("/dev/sd{n}"),
        format!("HOST-{n:03}"),
        format!("host-{n:03}.corp"),
    )
}

/// The first `count` deterministic disk entities.
#[must_use]
pub fn disks(count: usize) -> Vec<DiskEntity> {
    (0..count).map(disk).collect()
}

/// Mock [`EntitySource`] serving a fixed list (or failing).
pub struct MockEntitySource {
    disks: Vec<DiskEntity>,
    fail: bool,
    fetch_count: AtomicU32,
}

impl MockEntitySource {
    /// Source serving `disks` on every fetch.
    #[must_use]
    pub fn with_disks(disks: Vec<DiskEntity>) -> Self {
        Self {
            disks,
            fail: false,
            fetch_count: AtomicU32::new(0),
        }
    }

    /// Source whose fetch always fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            disks: Vec::new(),
            fail: true,
            fetch_count: AtomicU32::new(0),
        }
    }

    /// Fetches served (or refused) so far.
    #[must_use]
    pub fn fetch_count(&self) -> u32 {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntitySource for MockEntitySource {
    async fn entities(&self, _run_id: &str) -> Result<Vec<DiskEntity>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::EntitySource("injected entity query failure".into()));
        }
        Ok(self.disks.clone())
    }
}
