//! Port traits implemented by infrastructure crates.
//!
//! | Trait | Implemented by |
//! |-------|----------------|
//! | [`CommandRunner`] | `runner::ShellCommandRunner` |
//! | [`StatusStore`] | `store::JsonFileStatusStore` |

use std::path::Path;

use async_trait::async_trait;

use crate::{ExecutionError, ExecutionOutcome, StatusSnapshot, StoreError};

/// Runs a deployment command to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Executes `command` through a shell with `working_dir` as its current
    /// directory.
    ///
    /// Output goes to the host process's stdout/stderr; it is never captured.
    /// A non-zero exit is an `Ok` outcome; only failing to start or wait for
    /// the process is an error.
    async fn run(&self, working_dir: &Path, command: &str)
        -> Result<ExecutionOutcome, ExecutionError>;
}

/// Durable storage for the status snapshot.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Reads the last saved snapshot.
    ///
    /// A store that has never been written returns an empty snapshot, not an
    /// error.
    async fn load(&self) -> Result<StatusSnapshot, StoreError>;

    /// Replaces the stored snapshot with `snapshot`.
    ///
    /// Always called with the complete mapping; saves are whole overwrites.
    async fn save(&self, snapshot: &StatusSnapshot) -> Result<(), StoreError>;
}
