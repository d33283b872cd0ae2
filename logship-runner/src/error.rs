//! Run-level error types

use logship_client::ClientError;
use thiserror::Error;

use crate::config::ConfigError;

/// Fatal failure of a sync invocation
///
/// Snapshot read failures are not listed: they degrade the run to the
/// no-snapshot path instead of failing it.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A required setting is missing or invalid; nothing was attempted
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The SFTP password could not be decrypted; nothing was fetched
    #[error("Failed to decrypt SFTP password: {0}")]
    Decrypt(#[source] ClientError),

    /// The storage client could not be created; nothing was fetched
    ///
    /// Unlike a failed snapshot read this is not degraded to a baseline run:
    /// without a handle the new snapshot could never be saved, so the run
    /// stops before touching the remote log.
    #[error("Failed to initialize snapshot store: {0}")]
    StoreInit(#[source] ClientError),

    /// The remote log could not be read; no diff, save or forward happened
    #[error("Failed to fetch remote log {path}: {source}")]
    Fetch {
        path: String,
        #[source]
        source: ClientError,
    },

    /// The new snapshot could not be persisted
    #[error("Failed to save snapshot {key}: {source}")]
    StoreWrite {
        key: String,
        #[source]
        source: ClientError,
    },

    /// New lines could not be delivered to the collector
    #[error("Failed to forward {lines} line(s) to collector: {source}")]
    Forward {
        lines: usize,
        #[source]
        source: ClientError,
    },
}

pub type Result<T> = std::result::Result<T, SyncError>;
