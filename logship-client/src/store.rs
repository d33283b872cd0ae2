//! Snapshot storage using OpenDAL
//!
//! Snapshots are stored as plain UTF-8 objects, one object per remote log file.
//! The same key is used for reads and writes, so every save overwrites the
//! previous snapshot.

use logship_core::domain::LogSnapshot;
use opendal::{Operator, services};
use tracing::debug;

use crate::error::{ClientError, Result};

/// Where snapshots are kept
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// S3 or an S3-compatible endpoint; credentials come from the standard AWS chain
    S3 {
        bucket: String,
        region: String,
        endpoint: Option<String>,
    },
    /// Local directory, for development
    Fs { root: String },
    /// Process memory, for tests
    Memory,
}

impl StoreBackend {
    pub fn short_name(&self) -> &'static str {
        match self {
            StoreBackend::S3 { .. } => "s3",
            StoreBackend::Fs { .. } => "fs",
            StoreBackend::Memory => "memory",
        }
    }
}

/// Builds the storage key for a remote log file
///
/// The key is `{prefix}/{host}/{path}` with empty segments and the leading
/// slash of the path dropped.
pub fn snapshot_key(prefix: &str, host: &str, remote_path: &str) -> String {
    [
        prefix.trim_matches('/'),
        host,
        remote_path.trim_start_matches('/'),
    ]
    .into_iter()
    .filter(|segment| !segment.is_empty())
    .collect::<Vec<_>>()
    .join("/")
}

/// Durable snapshot storage
#[derive(Clone)]
pub struct SnapshotBucket {
    operator: Operator,
    backend: StoreBackend,
}

impl SnapshotBucket {
    /// Create a bucket handle for the given backend
    ///
    /// For S3 no credentials are set here so OpenDAL picks them up from the
    /// environment, shared credentials file or instance role.
    pub fn new(backend: StoreBackend) -> Result<Self> {
        let operator = match &backend {
            StoreBackend::S3 {
                bucket,
                region,
                endpoint,
            } => {
                let mut builder = services::S3::default().bucket(bucket).region(region);
                if let Some(endpoint) = endpoint {
                    builder = builder.endpoint(endpoint);
                }
                Operator::new(builder)?.finish()
            }
            StoreBackend::Fs { root } => {
                Operator::new(services::Fs::default().root(root))?.finish()
            }
            StoreBackend::Memory => Operator::new(services::Memory::default())?.finish(),
        };

        Ok(Self { operator, backend })
    }

    pub fn backend(&self) -> &StoreBackend {
        &self.backend
    }

    /// Read the snapshot stored under `key`
    ///
    /// Returns `Ok(None)` when no object exists yet. Every other failure is
    /// returned as an error so callers can decide how to degrade.
    pub async fn read(&self, key: &str) -> Result<Option<LogSnapshot>> {
        match self.operator.read(key).await {
            Ok(buffer) => {
                let bytes = buffer.to_vec();
                debug!("Read snapshot {} ({} bytes)", key, bytes.len());
                Ok(Some(LogSnapshot::from_bytes(&bytes)))
            }
            Err(e) => {
                let err = ClientError::from(e);
                if err.is_not_found() {
                    Ok(None)
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Overwrite the snapshot stored under `key`
    pub async fn write(&self, key: &str, snapshot: &LogSnapshot) -> Result<()> {
        if key.is_empty() {
            return Err(ClientError::InvalidRequest("snapshot key cannot be empty".to_string()));
        }

        self.operator.write(key, snapshot.as_bytes().to_vec()).await?;
        debug!("Wrote snapshot {} ({} bytes)", key, snapshot.as_bytes().len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_key_layout() {
        assert_eq!(
            snapshot_key("", "sftp.example.com", "/var/log/app.log"),
            "sftp.example.com/var/log/app.log"
        );
        assert_eq!(
            snapshot_key("/snapshots/", "host", "logs/app.log"),
            "snapshots/host/logs/app.log"
        );
    }

    #[tokio::test]
    async fn test_missing_snapshot_reads_as_none() {
        let bucket = SnapshotBucket::new(StoreBackend::Memory).unwrap();
        assert!(bucket.read("host/app.log").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_overwrites_previous_snapshot() {
        let bucket = SnapshotBucket::new(StoreBackend::Memory).unwrap();

        bucket
            .write("host/app.log", &LogSnapshot::new("a\nb"))
            .await
            .unwrap();
        bucket
            .write("host/app.log", &LogSnapshot::new("a\nb\nc"))
            .await
            .unwrap();

        let stored = bucket.read("host/app.log").await.unwrap().unwrap();
        assert_eq!(stored.content(), "a\nb\nc");
    }

    #[tokio::test]
    async fn test_empty_snapshot_is_distinct_from_missing() {
        let bucket = SnapshotBucket::new(StoreBackend::Memory).unwrap();
        bucket.write("k", &LogSnapshot::new("")).await.unwrap();
        assert_eq!(bucket.read("k").await.unwrap(), Some(LogSnapshot::new("")));
    }

    #[tokio::test]
    async fn test_empty_key_is_rejected() {
        let bucket = SnapshotBucket::new(StoreBackend::Memory).unwrap();
        let err = bucket.write("", &LogSnapshot::new("x")).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_fs_backend_creates_nested_keys() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_string_lossy().to_string();
        let bucket = SnapshotBucket::new(StoreBackend::Fs { root }).unwrap();

        let key = snapshot_key("", "host", "/var/log/app.log");
        bucket.write(&key, &LogSnapshot::new("line")).await.unwrap();

        let on_disk = std::fs::read_to_string(dir.path().join("host/var/log/app.log")).unwrap();
        assert_eq!(on_disk, "line");
        assert_eq!(bucket.backend().short_name(), "fs");
    }
}
