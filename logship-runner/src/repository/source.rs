//! Log source repository

use async_trait::async_trait;
use logship_client::{Result, SftpClient};
use logship_core::domain::RemoteLogSnapshot;

/// Repository trait for reading the current remote log
#[async_trait]
pub trait LogSourceRepository: Send + Sync {
    /// Fetches the full current contents of the remote log file
    async fn fetch(&self) -> Result<RemoteLogSnapshot>;

    /// Where the log is read from, for error messages
    fn location(&self) -> String;
}

#[async_trait]
impl LogSourceRepository for SftpClient {
    async fn fetch(&self) -> Result<RemoteLogSnapshot> {
        SftpClient::fetch(self).await
    }

    fn location(&self) -> String {
        format!(
            "sftp://{}:{}{}",
            self.settings().host,
            self.settings().port,
            self.settings().remote_path
        )
    }
}
