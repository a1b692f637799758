use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use deploy::{
    should_deploy, verify, CommandRunner, DeployError, DeploymentRunId, ExecutionMode,
    PushPayload, Registry, RepositoryConfig, RepositoryId, StatusSnapshot, StatusStore,
    StatusTracker, Timestamp,
};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, info_span, warn, Instrument};

/// What happened to a delivery that passed authentication and validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The payload targets a different branch; nothing ran and no status
    /// changed.
    Ignored,
    /// The deployment started in the background.
    Accepted { run_id: DeploymentRunId },
    /// The deployment ran to completion before returning.
    Completed {
        run_id: DeploymentRunId,
        success: bool,
    },
}

/// Owns the status tracker and the per-repository execution locks.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct Deployer {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Arc<Registry>,
    tracker: StatusTracker,
    store: Arc<dyn StatusStore>,
    runner: Arc<dyn CommandRunner>,
    mode: ExecutionMode,
    // One slot per registered repository; never grows after construction.
    locks: BTreeMap<RepositoryId, Arc<Mutex<()>>>,
    // Orders snapshot writes so an older snapshot never lands after a newer one.
    flush_lock: Mutex<()>,
}

impl Deployer {
    pub fn new(
        registry: Arc<Registry>,
        tracker: StatusTracker,
        store: Arc<dyn StatusStore>,
        runner: Arc<dyn CommandRunner>,
        mode: ExecutionMode,
    ) -> Self {
        let locks = registry
            .ids()
            .map(|id| (id.clone(), Arc::new(Mutex::new(()))))
            .collect();
        Self {
            inner: Arc::new(Inner {
                registry,
                tracker,
                store,
                runner,
                mode,
                locks,
                flush_lock: Mutex::new(()),
            }),
        }
    }

    /// Builds a deployer whose status starts from the store's last snapshot.
    ///
    /// An unreadable or corrupt snapshot is discarded with a warning; startup
    /// never fails because of persisted status.
    pub async fn restore(
        registry: Arc<Registry>,
        store: Arc<dyn StatusStore>,
        runner: Arc<dyn CommandRunner>,
        mode: ExecutionMode,
    ) -> Self {
        let snapshot = match store.load().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable deployment status, starting fresh");
                StatusSnapshot::new()
            }
        };
        let tracker = StatusTracker::from_snapshot(snapshot, &registry);
        info!(
            repositories = registry.len(),
            restored = tracker.snapshot().len(),
            mode = %mode,
            "Deployment status restored"
        );
        Self::new(registry, tracker, store, runner, mode)
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn mode(&self) -> ExecutionMode {
        self.inner.mode
    }

    /// Current status of every repository that has seen a deployment.
    pub fn status(&self) -> StatusSnapshot {
        self.inner.tracker.snapshot()
    }

    /// Runs one webhook delivery through authentication, validation, the
    /// branch filter, and (if all pass) a deployment.
    ///
    /// The signature is checked against the raw body before the body is
    /// parsed and before any status changes.
    pub async fn handle_delivery(
        &self,
        raw_id: &str,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<TriggerOutcome, DeployError> {
        let config = self
            .inner
            .registry
            .find(raw_id)
            .ok_or_else(|| DeployError::UnknownRepository {
                id: raw_id.to_string(),
            })?;

        if !verify(signature, body, &config.secret) {
            warn!(repository = %config.id, "Rejected webhook with invalid signature");
            return Err(DeployError::Unauthorized);
        }

        let payload = PushPayload::from_slice(body)?;
        if !should_deploy(&payload, &config.branch) {
            debug!(
                repository = %config.id,
                git_ref = payload.git_ref.as_deref().unwrap_or_default(),
                branch = %config.branch,
                "Ignoring push to another branch"
            );
            return Ok(TriggerOutcome::Ignored);
        }

        self.deploy(config).await
    }

    /// Starts a deployment of `config`, refusing if one is already running
    /// for the same repository.
    pub async fn deploy(&self, config: &RepositoryConfig) -> Result<TriggerOutcome, DeployError> {
        let lock = self.inner.locks.get(&config.id).cloned().ok_or_else(|| {
            DeployError::UnknownRepository {
                id: config.id.to_string(),
            }
        })?;
        let guard = lock
            .try_lock_owned()
            .map_err(|_| DeployError::DeploymentInProgress {
                id: config.id.clone(),
            })?;

        let run_id = DeploymentRunId::new_random();
        let span = info_span!("deployment", repository = %config.id, run_id = %run_id);

        self.inner.tracker.record_attempt(&config.id, Timestamp::now());

        // No await between taking the lock and handing it to the run: the
        // run owns the lock, so dropping the caller neither cancels the run
        // nor frees the lock early.
        let run = tokio::spawn(
            Arc::clone(&self.inner)
                .supervise(config.clone(), guard)
                .instrument(span),
        );

        match self.inner.mode {
            ExecutionMode::Sync => {
                let success = match run.await {
                    Ok(success) => success,
                    Err(e) => {
                        error!(error = %e, "Deployment supervisor aborted");
                        false
                    }
                };
                Ok(TriggerOutcome::Completed { run_id, success })
            }
            ExecutionMode::Async => Ok(TriggerOutcome::Accepted { run_id }),
        }
    }

    /// Waits until no deployment is running.
    ///
    /// Used on shutdown so background deployments are not cut off mid-run.
    pub async fn drain(&self) {
        for lock in self.inner.locks.values() {
            let _idle = lock.lock().await;
        }
    }
}

impl Inner {
    /// Runs the command and records its result. Returns `true` on success.
    async fn execute(&self, config: &RepositoryConfig) -> bool {
        info!(working_dir = %config.working_dir.display(), "Deployment started");
        let started = Instant::now();

        let success = match self.runner.run(&config.working_dir, &config.command).await {
            Ok(outcome) => {
                self.tracker
                    .record_result(&config.id, &outcome, Timestamp::now());
                if outcome.is_success() {
                    info!(
                        duration_ms = outcome.duration.as_millis() as u64,
                        "Deployment succeeded"
                    );
                } else {
                    warn!(
                        exit_code = ?outcome.exit_code,
                        duration_ms = outcome.duration.as_millis() as u64,
                        "Deployment failed"
                    );
                }
                outcome.is_success()
            }
            Err(e) => {
                error!(error = %e, "Deployment command could not be run");
                self.tracker.record_failure(&config.id, started.elapsed());
                false
            }
        };

        self.flush().await;
        success
    }

    /// Detached half of a deployment. Returns `true` on success.
    ///
    /// The run itself is a separate task so that a panic inside the runner is
    /// still recorded as a failure before the repository lock is released.
    async fn supervise(
        self: Arc<Self>,
        config: RepositoryConfig,
        guard: OwnedMutexGuard<()>,
    ) -> bool {
        self.flush().await;

        let started = Instant::now();
        let run = {
            let inner = Arc::clone(&self);
            let config = config.clone();
            tokio::spawn(async move { inner.execute(&config).await }.in_current_span())
        };

        let success = match run.await {
            Ok(success) => success,
            Err(e) => {
                error!(error = %e, "Deployment task aborted");
                self.tracker.record_failure(&config.id, started.elapsed());
                self.flush().await;
                false
            }
        };
        drop(guard);
        success
    }

    /// Writes the full snapshot. Failures are logged; in-memory status stays
    /// authoritative.
    async fn flush(&self) {
        let _ordered = self.flush_lock.lock().await;
        let snapshot = self.tracker.snapshot();
        if let Err(e) = self.store.save(&snapshot).await {
            warn!(error = %e, "Failed to persist deployment status");
        }
    }
}

#[cfg(test)]
#[path = "deployer_tests.rs"]
mod tests;
