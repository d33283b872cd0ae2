//! Sync service
//!
//! Runs one pass of the shipping pipeline:
//! - fetch the stored snapshot and the remote log concurrently
//! - diff them
//! - save the new snapshot and forward the new lines concurrently, as needed
//!
//! The save decision does not depend on the forward outcome. A save happens
//! whenever new lines were found or no snapshot existed, so the first run
//! stores a baseline without forwarding anything.

use futures::FutureExt;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use logship_client::ClientError;
use logship_core::diff;
use logship_core::domain::{LogSnapshot, NewLinesBatch, RunResult, StepOutcome};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::{Result, SyncError};
use crate::repository::{CollectorRepository, LogSourceRepository, SnapshotRepository};

/// Which side effects a run performs after diffing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub save: bool,
    pub forward: bool,
}

impl Plan {
    /// Save on new lines or when establishing a baseline; forward only new lines
    pub fn decide(baseline: bool, batch: &NewLinesBatch) -> Self {
        Self {
            save: baseline || !batch.is_empty(),
            forward: !batch.is_empty(),
        }
    }
}

/// Settled side effect
enum Step {
    Save(std::result::Result<(), ClientError>),
    Forward(std::result::Result<usize, ClientError>),
}

/// Sequences snapshot storage, the remote log source and the collector
pub struct SyncOrchestrator {
    store: Arc<dyn SnapshotRepository>,
    source: Arc<dyn LogSourceRepository>,
    collector: Arc<dyn CollectorRepository>,
}

impl SyncOrchestrator {
    pub fn new(
        store: Arc<dyn SnapshotRepository>,
        source: Arc<dyn LogSourceRepository>,
        collector: Arc<dyn CollectorRepository>,
    ) -> Self {
        Self {
            store,
            source,
            collector,
        }
    }

    /// Runs one sync pass for the snapshot stored under `key`
    ///
    /// # Returns
    /// What the run did, or the first fatal error. When both the save and the
    /// forward fail, the one that failed first is returned and the other is
    /// logged.
    pub async fn run(&self, key: &str) -> Result<RunResult> {
        let (previous, current) = tokio::join!(self.fetch_previous(key), self.source.fetch());

        let current = current.map_err(|source| SyncError::Fetch {
            path: self.source.location(),
            source,
        })?;

        let baseline = previous.is_none();
        let batch = diff::compute(previous.as_ref(), &current);
        let plan = Plan::decide(baseline, &batch);

        info!(
            "Found {} new line(s) (baseline: {}, save: {}, forward: {})",
            batch.len(),
            baseline,
            plan.save,
            plan.forward
        );

        let snapshot: LogSnapshot = current.into();
        let mut pending: FuturesUnordered<BoxFuture<'_, Step>> = FuturesUnordered::new();

        if plan.save {
            let snapshot = &snapshot;
            pending.push(
                async move { Step::Save(self.store.save(key, snapshot).await) }.boxed(),
            );
        }

        if plan.forward {
            let batch = &batch;
            pending.push(async move { Step::Forward(self.collector.send(batch).await) }.boxed());
        }

        let mut save = StepOutcome::Skipped;
        let mut forward = StepOutcome::Skipped;
        let mut first_error: Option<SyncError> = None;

        while let Some(step) = pending.next().await {
            match step {
                Step::Save(Ok(())) => {
                    debug!("Saved snapshot {}", key);
                    save = StepOutcome::Succeeded;
                }
                Step::Save(Err(source)) => {
                    error!("Failed to save snapshot {}: {}", key, source);
                    save = StepOutcome::Failed(source.to_string());
                    if first_error.is_none() {
                        first_error = Some(SyncError::StoreWrite {
                            key: key.to_string(),
                            source,
                        });
                    }
                }
                Step::Forward(Ok(sent)) => {
                    debug!("Forwarded {} line(s)", sent);
                    forward = StepOutcome::Succeeded;
                }
                Step::Forward(Err(source)) => {
                    error!("Failed to forward {} line(s): {}", batch.len(), source);
                    forward = StepOutcome::Failed(source.to_string());
                    if first_error.is_none() {
                        first_error = Some(SyncError::Forward {
                            lines: batch.len(),
                            source,
                        });
                    }
                }
            }
        }
        drop(pending);

        let result = RunResult {
            baseline,
            new_lines: batch.len(),
            save,
            forward,
        };

        match first_error {
            Some(e) => {
                warn!("Run failed after side effects settled: {:?}", result);
                Err(e)
            }
            None => {
                info!(
                    "Run complete (persisted: {}, forwarded: {})",
                    result.persisted(),
                    result.forwarded()
                );
                Ok(result)
            }
        }
    }

    /// Reads the stored snapshot, degrading every failure to "no snapshot"
    async fn fetch_previous(&self, key: &str) -> Option<LogSnapshot> {
        match self.store.fetch(key).await {
            Ok(Some(snapshot)) => {
                debug!("Loaded snapshot {} ({} bytes)", key, snapshot.as_bytes().len());
                Some(snapshot)
            }
            Ok(None) => {
                warn!(
                    "No snapshot stored at {}; this run only records a baseline",
                    key
                );
                None
            }
            Err(e) if e.is_permission_denied() => {
                warn!(
                    "Access to snapshot {} denied ({}); recording a baseline only",
                    key, e
                );
                None
            }
            Err(e) => {
                warn!(
                    "Could not read snapshot {} ({}); recording a baseline only",
                    key, e
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use logship_core::domain::RemoteLogSnapshot;
    use std::collections::HashMap;
    use std::io::ErrorKind;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const KEY: &str = "sftp.example.com/var/log/app.log";

    fn io_error(kind: ErrorKind) -> ClientError {
        ClientError::Io(std::io::Error::from(kind))
    }

    #[derive(Default)]
    struct MemoryStore {
        snapshots: Mutex<HashMap<String, String>>,
        read_error: Option<ErrorKind>,
        fail_write: bool,
        write_delay: Duration,
        writes: AtomicUsize,
    }

    impl MemoryStore {
        fn with_snapshot(content: &str) -> Self {
            let store = Self::default();
            store
                .snapshots
                .lock()
                .unwrap()
                .insert(KEY.to_string(), content.to_string());
            store
        }

        fn stored(&self) -> Option<String> {
            self.snapshots.lock().unwrap().get(KEY).cloned()
        }
    }

    #[async_trait]
    impl SnapshotRepository for MemoryStore {
        async fn fetch(&self, key: &str) -> logship_client::Result<Option<LogSnapshot>> {
            if let Some(kind) = self.read_error {
                return Err(io_error(kind));
            }
            Ok(self
                .snapshots
                .lock()
                .unwrap()
                .get(key)
                .map(|s| LogSnapshot::new(s.clone())))
        }

        async fn save(&self, key: &str, snapshot: &LogSnapshot) -> logship_client::Result<()> {
            tokio::time::sleep(self.write_delay).await;
            self.writes.fetch_add(1, Ordering::SeqCst);
            if self.fail_write {
                return Err(io_error(ErrorKind::PermissionDenied));
            }
            self.snapshots
                .lock()
                .unwrap()
                .insert(key.to_string(), snapshot.content().to_string());
            Ok(())
        }
    }

    /// Remote log that either returns fixed content or fails
    struct StaticSource {
        content: Option<&'static str>,
    }

    #[async_trait]
    impl LogSourceRepository for StaticSource {
        async fn fetch(&self) -> logship_client::Result<RemoteLogSnapshot> {
            match self.content {
                Some(text) => Ok(RemoteLogSnapshot::from_text(text)),
                None => Err(io_error(ErrorKind::ConnectionRefused)),
            }
        }

        fn location(&self) -> String {
            "sftp://sftp.example.com:22/var/log/app.log".to_string()
        }
    }

    #[derive(Default)]
    struct RecordingCollector {
        batches: Mutex<Vec<String>>,
        fail: bool,
        delay: Duration,
    }

    impl RecordingCollector {
        fn sent(&self) -> Vec<String> {
            self.batches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CollectorRepository for RecordingCollector {
        async fn send(&self, batch: &NewLinesBatch) -> logship_client::Result<usize> {
            tokio::time::sleep(self.delay).await;
            self.batches
                .lock()
                .unwrap()
                .push(batch.as_text().to_string());
            if self.fail {
                return Err(io_error(ErrorKind::ConnectionRefused));
            }
            Ok(batch.len())
        }
    }

    fn orchestrator(
        store: &Arc<MemoryStore>,
        remote: Option<&'static str>,
        collector: &Arc<RecordingCollector>,
    ) -> SyncOrchestrator {
        SyncOrchestrator::new(
            store.clone(),
            Arc::new(StaticSource { content: remote }),
            collector.clone(),
        )
    }

    #[test]
    fn test_plan_decisions() {
        let lines = NewLinesBatch::from_lines(["d"]);
        let empty = NewLinesBatch::empty();

        assert_eq!(
            Plan::decide(false, &lines),
            Plan {
                save: true,
                forward: true
            }
        );
        assert_eq!(
            Plan::decide(true, &empty),
            Plan {
                save: true,
                forward: false
            }
        );
        assert_eq!(
            Plan::decide(false, &empty),
            Plan {
                save: false,
                forward: false
            }
        );
    }

    #[tokio::test]
    async fn test_appended_line_is_saved_and_forwarded() {
        let store = Arc::new(MemoryStore::with_snapshot("a\nb\nc"));
        let collector = Arc::new(RecordingCollector::default());

        let result = orchestrator(&store, Some("a\nb\nc\nd"), &collector)
            .run(KEY)
            .await
            .unwrap();

        assert!(!result.baseline);
        assert_eq!(result.new_lines, 1);
        assert!(result.persisted());
        assert!(result.forwarded());
        assert_eq!(collector.sent(), vec!["d".to_string()]);
        assert_eq!(store.stored().as_deref(), Some("a\nb\nc\nd"));
    }

    #[tokio::test]
    async fn test_first_run_records_baseline_without_forwarding() {
        let store = Arc::new(MemoryStore::default());
        let collector = Arc::new(RecordingCollector::default());

        let result = orchestrator(&store, Some("x\ny"), &collector)
            .run(KEY)
            .await
            .unwrap();

        assert!(result.baseline);
        assert_eq!(result.new_lines, 0);
        assert_eq!(result.save, StepOutcome::Succeeded);
        assert_eq!(result.forward, StepOutcome::Skipped);
        assert!(collector.sent().is_empty());
        assert_eq!(store.stored().as_deref(), Some("x\ny"));
    }

    #[tokio::test]
    async fn test_unchanged_log_does_nothing() {
        let store = Arc::new(MemoryStore::with_snapshot("a\nb"));
        let collector = Arc::new(RecordingCollector::default());

        let result = orchestrator(&store, Some("a\nb"), &collector)
            .run(KEY)
            .await
            .unwrap();

        assert_eq!(result.save, StepOutcome::Skipped);
        assert_eq!(result.forward, StepOutcome::Skipped);
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
        assert!(collector.sent().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_snapshot_untouched() {
        let store = Arc::new(MemoryStore::with_snapshot("a\nb"));
        let collector = Arc::new(RecordingCollector::default());

        let err = orchestrator(&store, None, &collector)
            .run(KEY)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Fetch { .. }));
        assert!(err.to_string().contains("sftp://sftp.example.com:22/var/log/app.log"));
        assert_eq!(store.writes.load(Ordering::SeqCst), 0);
        assert!(collector.sent().is_empty());
        assert_eq!(store.stored().as_deref(), Some("a\nb"));
    }

    #[tokio::test]
    async fn test_unreadable_snapshot_degrades_to_baseline() {
        for kind in [ErrorKind::PermissionDenied, ErrorKind::TimedOut] {
            let store = Arc::new(MemoryStore {
                read_error: Some(kind),
                ..MemoryStore::default()
            });
            let collector = Arc::new(RecordingCollector::default());

            let result = orchestrator(&store, Some("x\ny"), &collector)
                .run(KEY)
                .await
                .unwrap();

            assert!(result.baseline, "{:?}", kind);
            assert!(result.persisted());
            assert!(collector.sent().is_empty());
            assert_eq!(store.stored().as_deref(), Some("x\ny"));
        }
    }

    #[tokio::test]
    async fn test_save_failure_fails_run_after_forwarding() {
        let store = Arc::new(MemoryStore {
            fail_write: true,
            ..MemoryStore::with_snapshot("a")
        });
        let collector = Arc::new(RecordingCollector::default());

        let err = orchestrator(&store, Some("a\nb"), &collector)
            .run(KEY)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::StoreWrite { ref key, .. } if key == KEY));
        assert_eq!(collector.sent(), vec!["b".to_string()]);
    }

    #[tokio::test]
    async fn test_forward_failure_fails_run_after_saving() {
        let store = Arc::new(MemoryStore::with_snapshot("a"));
        let collector = Arc::new(RecordingCollector {
            fail: true,
            ..RecordingCollector::default()
        });

        let err = orchestrator(&store, Some("a\nb\nc"), &collector)
            .run(KEY)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Forward { lines: 2, .. }));
        assert_eq!(store.stored().as_deref(), Some("a\nb\nc"));
    }

    #[tokio::test]
    async fn test_first_failure_to_settle_is_reported() {
        let store = Arc::new(MemoryStore {
            fail_write: true,
            write_delay: Duration::from_millis(50),
            ..MemoryStore::with_snapshot("a")
        });
        let collector = Arc::new(RecordingCollector {
            fail: true,
            ..RecordingCollector::default()
        });

        let err = orchestrator(&store, Some("a\nb"), &collector)
            .run(KEY)
            .await
            .unwrap_err();

        // The slower save still ran to completion
        assert!(matches!(err, SyncError::Forward { .. }));
        assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_consecutive_runs_do_not_resend_lines() {
        let store = Arc::new(MemoryStore::with_snapshot("a"));
        let collector = Arc::new(RecordingCollector::default());

        orchestrator(&store, Some("a\nb"), &collector)
            .run(KEY)
            .await
            .unwrap();
        orchestrator(&store, Some("a\nb\nc"), &collector)
            .run(KEY)
            .await
            .unwrap();
        orchestrator(&store, Some("a\nb\nc"), &collector)
            .run(KEY)
            .await
            .unwrap();

        assert_eq!(collector.sent(), vec!["b".to_string(), "c".to_string()]);
    }
}
