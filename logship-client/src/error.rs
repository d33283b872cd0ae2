//! Error types for the logship protocol clients

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to an external collaborator
#[derive(Debug, Error)]
pub enum ClientError {
    /// Object storage operation failed
    #[error("Storage operation failed: {0}")]
    Storage(#[from] opendal::Error),

    /// SSH handshake, authentication or SFTP operation failed
    #[error("SSH session error: {0}")]
    Ssh(#[from] ssh2::Error),

    /// Network or file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Ciphertext could not be decoded before decryption
    #[error("Invalid ciphertext encoding: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// Key management service rejected or failed the decrypt call
    #[error("Decrypt failed: {0}")]
    Decrypt(String),

    /// Blocking transfer task panicked or was cancelled
    #[error("Transfer task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Check if this error means the requested object does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Storage(e) => e.kind() == opendal::ErrorKind::NotFound,
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// Check if this error is an access-control rejection
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::Storage(e) => e.kind() == opendal::ErrorKind::PermissionDenied,
            Self::Io(e) => e.kind() == std::io::ErrorKind::PermissionDenied,
            _ => false,
        }
    }
}
