//! Runner configuration
//!
//! All settings come from environment variables and are read fresh at the
//! start of every invocation. Required settings fail fast with a
//! [`ConfigError`] naming the variable.

use logship_client::sftp::{DEFAULT_CHUNK_SIZE, DEFAULT_KEX_ALGORITHMS};
use logship_client::{CollectorSettings, SftpSettings, StoreBackend, snapshot_key};
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_SFTP_PORT: u16 = 22;
pub const DEFAULT_COLLECTOR_PORT: u16 = 514;
pub const DEFAULT_PROGRAM: &str = "logship";
pub const DEFAULT_REGION: &str = "us-east-1";

/// Configuration problems detected before a run starts
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Runner configuration
///
/// Expected environment variables:
/// - SFTP_HOST (required)
/// - SFTP_PORT (optional, default: 22)
/// - SFTP_USERNAME (required)
/// - SFTP_PASSWORD (required)
/// - SFTP_PASSWORD_ENCRYPTED (optional, default: false)
/// - SFTP_PATH (required)
/// - SFTP_KEX_ALGORITHMS (optional, default: modern list plus legacy SHA-1 groups)
/// - SFTP_CHUNK_SIZE (optional, bytes, default: 32768)
/// - SNAPSHOT_BACKEND (optional, `s3` or `fs`, default: s3)
/// - SNAPSHOT_BUCKET (required for s3)
/// - SNAPSHOT_REGION (optional, default: us-east-1)
/// - SNAPSHOT_ENDPOINT (optional)
/// - SNAPSHOT_ROOT (required for fs)
/// - SNAPSHOT_PREFIX (optional)
/// - COLLECTOR_HOST (required)
/// - COLLECTOR_PORT (optional, default: 514)
/// - COLLECTOR_HOSTNAME (optional, default: SFTP_HOST)
/// - COLLECTOR_PROGRAM (optional, default: logship)
#[derive(Debug, Clone)]
pub struct Config {
    /// Remote log settings; the password may still be encrypted
    pub sftp: SftpSettings,

    /// Whether `sftp.password` is a KMS ciphertext
    pub password_encrypted: bool,

    pub store: StoreBackend,

    /// Optional key prefix for snapshots inside the store
    pub snapshot_prefix: String,

    pub collector: CollectorSettings,
}

impl Config {
    /// Creates configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Creates configuration from any variable source
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Vars { lookup };

        let host = env.required("SFTP_HOST")?;
        let sftp = SftpSettings {
            port: env.parse_or("SFTP_PORT", DEFAULT_SFTP_PORT)?,
            username: env.required("SFTP_USERNAME")?,
            password: env.required("SFTP_PASSWORD")?,
            remote_path: env.required("SFTP_PATH")?,
            kex_algorithms: env
                .optional("SFTP_KEX_ALGORITHMS")
                .unwrap_or_else(|| DEFAULT_KEX_ALGORITHMS.to_string()),
            chunk_size: env.parse_or("SFTP_CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
            host: host.clone(),
        };

        let password_encrypted = env.parse_or("SFTP_PASSWORD_ENCRYPTED", false)?;

        let store = match env.optional("SNAPSHOT_BACKEND").as_deref() {
            None | Some("s3") => StoreBackend::S3 {
                bucket: env.required("SNAPSHOT_BUCKET")?,
                region: env
                    .optional("SNAPSHOT_REGION")
                    .unwrap_or_else(|| DEFAULT_REGION.to_string()),
                endpoint: env.optional("SNAPSHOT_ENDPOINT"),
            },
            Some("fs") => StoreBackend::Fs {
                root: env.required("SNAPSHOT_ROOT")?,
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "SNAPSHOT_BACKEND",
                    value: other.to_string(),
                    reason: "expected `s3` or `fs`".to_string(),
                });
            }
        };

        let collector = CollectorSettings {
            host: env.required("COLLECTOR_HOST")?,
            port: env.parse_or("COLLECTOR_PORT", DEFAULT_COLLECTOR_PORT)?,
            hostname: env.optional("COLLECTOR_HOSTNAME").unwrap_or(host),
            program: env
                .optional("COLLECTOR_PROGRAM")
                .unwrap_or_else(|| DEFAULT_PROGRAM.to_string()),
        };

        let config = Self {
            sftp,
            password_encrypted,
            store,
            snapshot_prefix: env.optional("SNAPSHOT_PREFIX").unwrap_or_default(),
            collector,
        };
        config.validate()?;
        Ok(config)
    }

    /// Storage key of the snapshot for the configured remote log file
    pub fn snapshot_key(&self) -> String {
        snapshot_key(
            &self.snapshot_prefix,
            &self.sftp.host,
            &self.sftp.remote_path,
        )
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sftp.port == 0 {
            return Err(invalid("SFTP_PORT", "0", "port must be greater than 0"));
        }

        if self.collector.port == 0 {
            return Err(invalid("COLLECTOR_PORT", "0", "port must be greater than 0"));
        }

        if self.sftp.chunk_size == 0 {
            return Err(invalid(
                "SFTP_CHUNK_SIZE",
                "0",
                "chunk size must be greater than 0",
            ));
        }

        if self.sftp.remote_path.trim_start_matches('/').is_empty() {
            return Err(invalid(
                "SFTP_PATH",
                &self.sftp.remote_path,
                "path must name a file",
            ));
        }

        Ok(())
    }
}

fn invalid(name: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Typed access to a variable source
struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|value| !value.trim().is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.optional(name).ok_or(ConfigError::Missing(name))
    }

    fn parse_or<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(name) {
            None => Ok(default),
            Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
                name,
                value: raw.clone(),
                reason: e.to_string(),
            }),
        }
    }
}
