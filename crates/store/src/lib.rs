//! Deployhook status persistence adapter.
//!
//! Implements the [`deploy::StatusStore`] trait as a single JSON file holding
//! the whole [`deploy::StatusSnapshot`]: an object mapping repository
//! identifier to its status, in the same shape `/status.json` serves.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** File layout and encoding live here. The coordinator
//! sees only [`deploy::StatusStore`].
//!
//! ## Durability
//!
//! Each save writes the full snapshot to a sibling temporary file and renames
//! it over the target, so a crash mid-write leaves the previous snapshot in
//! place. Writes are not fsynced; losing the most recent update on power loss
//! is acceptable.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use deploy::{StatusSnapshot, StatusStore, StoreError};
use tracing::debug;

/// Stores the status snapshot as pretty-printed JSON at a fixed path.
#[derive(Debug, Clone)]
pub struct JsonFileStatusStore {
    path: PathBuf,
}

impl JsonFileStatusStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("status"));
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl StatusStore for JsonFileStatusStore {
    async fn load(&self) -> Result<StatusSnapshot, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No status snapshot yet");
                return Ok(StatusSnapshot::new());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    async fn save(&self, snapshot: &StatusSnapshot) -> Result<(), StoreError> {
        let encoded = serde_json::to_vec_pretty(snapshot).map_err(StoreError::Encode)?;
        let write_error = |source: std::io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, &encoded).await.map_err(write_error)?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(write_error)?;

        debug!(
            path = %self.path.display(),
            repositories = snapshot.len(),
            "Status snapshot saved"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
