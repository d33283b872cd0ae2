//! Invocation service
//!
//! One invocation is one complete sync run: read configuration, resolve the
//! SFTP password, build the clients and hand them to the orchestrator.
//! Configuration is never cached between invocations; the storage and KMS
//! clients are, through [`ProcessState`].

use logship_client::{
    ClientError, KmsDecryptor, SftpClient, SnapshotBucket, StoreBackend, SyslogClient,
    running_in_managed_environment,
};
use logship_core::domain::RunResult;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::config::{Config, ConfigError};
use crate::error::{Result, SyncError};
use crate::repository::{PlaintextSecrets, SecretRepository};
use crate::service::SyncOrchestrator;

/// Handles that live for the whole process and are shared by every invocation
///
/// Each handle is created on first use. Runs never overlap within one
/// process, so no further locking is needed.
#[derive(Default)]
pub struct ProcessState {
    store: OnceCell<Arc<SnapshotBucket>>,
    kms: OnceCell<KmsDecryptor>,
}

impl ProcessState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage handle, created from `backend` the first time it is needed
    ///
    /// Later invocations reuse the same handle even if their backend settings
    /// differ; a warning is logged in that case.
    pub async fn store(
        &self,
        backend: &StoreBackend,
    ) -> std::result::Result<Arc<SnapshotBucket>, ClientError> {
        let bucket = self
            .store
            .get_or_try_init(|| async {
                info!("Initializing {} snapshot store", backend.short_name());
                SnapshotBucket::new(backend.clone()).map(Arc::new)
            })
            .await?;

        if bucket.backend() != backend {
            warn!(
                "Snapshot store settings changed; keeping the {} store created first",
                bucket.backend().short_name()
            );
        }

        Ok(Arc::clone(bucket))
    }

    /// KMS client, created from the standard AWS config chain on first use
    pub async fn kms(&self) -> &KmsDecryptor {
        self.kms.get_or_init(KmsDecryptor::from_env).await
    }
}

/// Runs one invocation with configuration read from the environment
pub async fn invoke(state: &ProcessState) -> Result<RunResult> {
    invoke_with(state, Config::from_env).await
}

/// Runs one invocation with configuration produced by `load`
///
/// Configuration errors end the run before any client is created.
async fn invoke_with<L>(state: &ProcessState, load: L) -> Result<RunResult>
where
    L: FnOnce() -> std::result::Result<Config, ConfigError>,
{
    let run_id = Uuid::new_v4();

    async move {
        let config = load()?;
        let secrets = secrets(state, &config).await;
        execute(state, config, secrets).await
    }
    .instrument(info_span!("sync_run", %run_id))
    .await
}

/// Decryptor for the configured SFTP password
///
/// KMS is only used for an encrypted password inside the managed
/// environment; everywhere else the password passes through unchanged.
pub async fn secrets<'a>(state: &'a ProcessState, config: &Config) -> &'a dyn SecretRepository {
    if config.password_encrypted && running_in_managed_environment() {
        return state.kms().await;
    }
    if config.password_encrypted {
        debug!("Not running in the managed environment; using SFTP password as given");
    }
    &PlaintextSecrets
}

/// Runs one invocation with an already loaded configuration
///
/// The password is resolved before the store handle is created or the
/// remote log is touched, so a decrypt failure has no side effects.
pub async fn execute(
    state: &ProcessState,
    mut config: Config,
    secrets: &dyn SecretRepository,
) -> Result<RunResult> {
    if config.password_encrypted {
        resolve_password(&mut config, secrets).await?;
    }

    let store = state
        .store(&config.store)
        .await
        .map_err(SyncError::StoreInit)?;

    let key = config.snapshot_key();
    info!(
        "Syncing sftp://{}{} (snapshot {})",
        config.sftp.host, config.sftp.remote_path, key
    );

    let orchestrator = SyncOrchestrator::new(
        store,
        Arc::new(SftpClient::new(config.sftp)),
        Arc::new(SyslogClient::new(config.collector)),
    );

    orchestrator.run(&key).await
}

/// Replaces the configured SFTP password with its plaintext
pub async fn resolve_password(config: &mut Config, secrets: &dyn SecretRepository) -> Result<()> {
    config.sftp.password = secrets
        .reveal(&config.sftp.password)
        .await
        .map_err(SyncError::Decrypt)?;
    Ok(())
}
