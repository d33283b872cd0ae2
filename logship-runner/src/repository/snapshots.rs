//! Snapshot repository
//!
//! Reads and overwrites the last-seen contents of the remote log file.

use async_trait::async_trait;
use logship_client::{Result, SnapshotBucket};
use logship_core::domain::LogSnapshot;

/// Repository trait for durable snapshot storage
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Fetches the snapshot stored under `key`
    ///
    /// # Returns
    /// `Ok(None)` when no snapshot has been stored yet
    async fn fetch(&self, key: &str) -> Result<Option<LogSnapshot>>;

    /// Overwrites the snapshot stored under `key`
    async fn save(&self, key: &str, snapshot: &LogSnapshot) -> Result<()>;
}

#[async_trait]
impl SnapshotRepository for SnapshotBucket {
    async fn fetch(&self, key: &str) -> Result<Option<LogSnapshot>> {
        self.read(key).await
    }

    async fn save(&self, key: &str, snapshot: &LogSnapshot) -> Result<()> {
        self.write(key, snapshot).await
    }
}
