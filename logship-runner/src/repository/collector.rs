//! Collector repository
//!
//! Delivers new lines to the log collector.

use async_trait::async_trait;
use logship_client::{Result, SyslogClient};
use logship_core::domain::NewLinesBatch;

/// Repository trait for forwarding lines to the collector
#[async_trait]
pub trait CollectorRepository: Send + Sync {
    /// Sends every line of `batch`, in order
    ///
    /// # Returns
    /// The number of lines written
    async fn send(&self, batch: &NewLinesBatch) -> Result<usize>;
}

#[async_trait]
impl CollectorRepository for SyslogClient {
    async fn send(&self, batch: &NewLinesBatch) -> Result<usize> {
        self.send_batch(batch).await
    }
}
