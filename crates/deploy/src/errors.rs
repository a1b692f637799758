//! Error types for the deployhook domain.
//!
//! [`DeployError`] covers every reason a webhook is refused before a
//! deployment starts. [`ExecutionError`] and [`StoreError`] are produced by
//! the infrastructure behind the [`crate::CommandRunner`] and
//! [`crate::StatusStore`] ports.
//!
//! None of these errors are retried. Webhook senders re-deliver on non-2xx
//! responses, which is the only retry mechanism in the system.

use std::path::PathBuf;

use thiserror::Error;

use crate::RepositoryId;

// ---------------------------------------------------------------------------
// Request errors
// ---------------------------------------------------------------------------

/// Reasons a webhook delivery does not start a deployment.
///
/// A branch mismatch is not an error; see [`crate::should_deploy`].
#[derive(Debug, Error)]
pub enum DeployError {
    /// The signature header was absent, malformed, or did not match.
    ///
    /// Deliberately carries no detail so responses cannot be used as an
    /// oracle for guessing the secret.
    #[error("Signature verification failed")]
    Unauthorized,

    /// No repository is registered under the requested identifier.
    #[error("Unknown repository: {id}")]
    UnknownRepository {
        /// The raw path segment from the request.
        id: String,
    },

    /// The verified body could not be parsed into a push payload.
    #[error("Invalid payload: {reason}")]
    InvalidPayload {
        /// Parser diagnostic, for logs only.
        reason: String,
    },

    /// Another deployment for this repository is still running.
    #[error("Deployment in progress for {id}")]
    DeploymentInProgress {
        /// The busy repository.
        id: RepositoryId,
    },
}

// ---------------------------------------------------------------------------
// Infrastructure errors
// ---------------------------------------------------------------------------

/// A deployment command could not be run to completion.
///
/// Recorded in status only as the generic failure marker; the source error
/// is logged but never exposed through the status feed.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The shell process could not be started.
    #[error("failed to spawn deployment command in {}: {source}", .working_dir.display())]
    Spawn {
        working_dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The process started but waiting for it failed.
    #[error("failed to wait for deployment command: {source}")]
    Wait {
        #[source]
        source: std::io::Error,
    },
}

/// The status snapshot could not be read or written.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read status snapshot {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("status snapshot {} is corrupt: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode status snapshot: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to write status snapshot {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
