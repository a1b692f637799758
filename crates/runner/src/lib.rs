//! Deployhook command execution adapter.
//!
//! Implements the [`deploy::CommandRunner`] trait by running the configured
//! command line through `sh -c` with the repository checkout as the current
//! directory.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Process spawning, stream wiring, and exit-status
//! decoding live here. The [`deploy`] crate sees only
//! [`deploy::CommandRunner`] and [`deploy::ExecutionOutcome`].
//!
//! ## Output
//!
//! The child's stdout and stderr are inherited from this process, so command
//! output lands in the service's own log stream. Nothing is captured and
//! nothing is returned to the webhook caller. Stdin is closed.

use std::path::Path;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use deploy::{CommandRunner, ExecutionError, ExecutionOutcome};
use tokio::process::Command;
use tracing::debug;

/// Runs deployment commands through a POSIX shell.
#[derive(Debug, Clone)]
pub struct ShellCommandRunner {
    shell: String,
}

impl ShellCommandRunner {
    /// A runner using `sh`.
    pub fn new() -> Self {
        Self::with_shell("sh")
    }

    /// A runner using a specific shell binary, invoked as `<shell> -c <command>`.
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for ShellCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for ShellCommandRunner {
    async fn run(
        &self,
        working_dir: &Path,
        command: &str,
    ) -> Result<ExecutionOutcome, ExecutionError> {
        let started = Instant::now();

        let mut child = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| ExecutionError::Spawn {
                working_dir: working_dir.to_path_buf(),
                source,
            })?;

        debug!(pid = child.id(), "Deployment command spawned");

        let status = child
            .wait()
            .await
            .map_err(|source| ExecutionError::Wait { source })?;

        Ok(ExecutionOutcome {
            exit_code: status.code(),
            duration: started.elapsed(),
        })
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
