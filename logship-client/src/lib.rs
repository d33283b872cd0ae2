//! Logship protocol clients
//!
//! Thin clients for the external systems the shipper talks to. Each client
//! wraps exactly one protocol and knows nothing about when it is called:
//! - [`SnapshotBucket`]: durable snapshot storage (S3 or local directory via OpenDAL)
//! - [`SftpClient`]: full download of the remote log file over SFTP
//! - [`SyslogClient`]: line-by-line forwarding to a syslog collector
//! - [`KmsDecryptor`]: decryption of KMS-encrypted settings
//!
//! # Example
//!
//! ```no_run
//! use logship_client::{SnapshotBucket, StoreBackend, snapshot_key};
//!
//! #[tokio::main]
//! async fn main() -> logship_client::Result<()> {
//!     let bucket = SnapshotBucket::new(StoreBackend::S3 {
//!         bucket: "log-snapshots".to_string(),
//!         region: "us-east-1".to_string(),
//!         endpoint: None,
//!     })?;
//!
//!     let key = snapshot_key("", "sftp.example.com", "/var/log/app.log");
//!     if let Some(snapshot) = bucket.read(&key).await? {
//!         println!("{} lines stored", snapshot.lines().count());
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod secrets;
pub mod sftp;
pub mod store;
pub mod syslog;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use secrets::{KmsDecryptor, running_in_managed_environment};
pub use sftp::{SftpClient, SftpSettings};
pub use store::{SnapshotBucket, StoreBackend, snapshot_key};
pub use syslog::{CollectorSettings, SyslogClient};
