//! In-memory deployment status, one record per repository.
//!
//! The tracker is the single mutation point for status records. Every update
//! swaps one record under a map-wide lock, so readers of [`StatusTracker::snapshot`]
//! never observe a half-written record. Serializing whole deployments per
//! repository (attempt before result, no overlap) is the coordinator's job;
//! the tracker only guarantees that each individual update is atomic.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tracing::debug;

use crate::{
    DeploymentStatus, ExecutionOutcome, Registry, RepositoryId, StatusSnapshot, Timestamp,
};

/// The only error text ever written to status.
///
/// Raw command output may contain credentials, so it never reaches the status
/// feed.
pub const FAILURE_MARKER: &str = "deployment failed";

#[derive(Debug, Default)]
pub struct StatusTracker {
    records: RwLock<StatusSnapshot>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a previously persisted snapshot, dropping records for
    /// repositories that are no longer registered.
    pub fn from_snapshot(mut snapshot: StatusSnapshot, registry: &Registry) -> Self {
        snapshot.retain(|id, _| {
            let registered = registry.contains(id);
            if !registered {
                debug!(repository = %id, "Dropping status of unregistered repository");
            }
            registered
        });
        Self {
            records: RwLock::new(snapshot),
        }
    }

    /// Marks the start of a deployment and clears the previous error.
    pub fn record_attempt(&self, id: &RepositoryId, at: Timestamp) {
        self.update(id, |status| {
            status.last_attempt = Some(at);
            status.last_error = None;
        });
    }

    /// Records the exit of a deployment command.
    ///
    /// `last_success` only moves forward on exit code 0; any other outcome
    /// sets the failure marker and leaves it untouched.
    pub fn record_result(
        &self,
        id: &RepositoryId,
        outcome: &ExecutionOutcome,
        completed_at: Timestamp,
    ) {
        self.update(id, |status| {
            status.last_exit_code = outcome.exit_code;
            status.last_duration = Some(whole_millis(outcome.duration));
            if outcome.is_success() {
                status.last_success = Some(completed_at);
            } else {
                status.last_error = Some(FAILURE_MARKER.to_string());
            }
        });
    }

    /// Records a deployment that could not be launched or waited on.
    pub fn record_failure(&self, id: &RepositoryId, duration: Duration) {
        self.update(id, |status| {
            status.last_exit_code = None;
            status.last_duration = Some(whole_millis(duration));
            status.last_error = Some(FAILURE_MARKER.to_string());
        });
    }

    pub fn get(&self, id: &RepositoryId) -> Option<DeploymentStatus> {
        self.read().get(id).cloned()
    }

    /// A consistent copy of every record.
    pub fn snapshot(&self) -> StatusSnapshot {
        self.read().clone()
    }

    fn update(&self, id: &RepositoryId, apply: impl FnOnce(&mut DeploymentStatus)) {
        let mut records = self.write();
        let mut next = records.get(id).cloned().unwrap_or_default();
        apply(&mut next);
        records.insert(id.clone(), next);
    }

    fn read(&self) -> RwLockReadGuard<'_, StatusSnapshot> {
        self.records.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StatusSnapshot> {
        self.records.write().unwrap_or_else(PoisonError::into_inner)
    }
}

// Durations are held at the millisecond precision they are persisted with.
fn whole_millis(duration: Duration) -> Duration {
    Duration::from_millis(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
