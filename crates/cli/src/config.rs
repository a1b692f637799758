//! Repository registry file.
//!
//! ```json
//! {
//!   "repos": {
//!     "website": {
//!       "secret": "s3cr3t",
//!       "path": "/srv/website",
//!       "cmd": "git pull && npm ci && npm run build",
//!       "branch": "main"
//!     }
//!   }
//! }
//! ```
//!
//! `branch` is optional and defaults to `main`. Relative `path` values are
//! resolved against the process working directory when the command runs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use deploy::{BranchName, Registry, RepositoryConfig, RepositoryId, Secret};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration file {} is not a valid registry", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid repository identifier {id:?}: must be non-empty with no '/' or whitespace")]
    InvalidId { id: String },

    #[error("repository {id}: `{field}` must not be empty")]
    EmptyField { id: String, field: &'static str },
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    repos: BTreeMap<String, RepositoryEntry>,
}

#[derive(Debug, Deserialize)]
struct RepositoryEntry {
    secret: String,
    path: PathBuf,
    cmd: String,
    #[serde(default)]
    branch: Option<String>,
}

/// Reads and validates the registry file at `path`.
pub fn load_registry(path: &Path) -> Result<Registry, ConfigError> {
    let bytes = std::fs::read(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_registry(&bytes, path)
}

/// Validates registry JSON. `origin` is only used in error messages.
pub fn parse_registry(bytes: &[u8], origin: &Path) -> Result<Registry, ConfigError> {
    let file: RegistryFile = serde_json::from_slice(bytes).map_err(|source| ConfigError::Parse {
        path: origin.to_path_buf(),
        source,
    })?;

    let mut configs = Vec::with_capacity(file.repos.len());
    for (raw_id, entry) in file.repos {
        configs.push(validate(raw_id, entry)?);
    }
    Ok(Registry::new(configs))
}

fn validate(raw_id: String, entry: RepositoryEntry) -> Result<RepositoryConfig, ConfigError> {
    let id = RepositoryId::new(raw_id.clone()).ok_or(ConfigError::InvalidId {
        id: raw_id.clone(),
    })?;
    let empty = |field: &'static str| ConfigError::EmptyField {
        id: raw_id.clone(),
        field,
    };

    if entry.secret.is_empty() {
        return Err(empty("secret"));
    }
    if entry.path.as_os_str().is_empty() {
        return Err(empty("path"));
    }
    if entry.cmd.trim().is_empty() {
        return Err(empty("cmd"));
    }
    let branch = match entry.branch {
        None => BranchName::default(),
        Some(name) => BranchName::new(name).ok_or_else(|| empty("branch"))?,
    };

    Ok(RepositoryConfig {
        id,
        secret: Secret::from(entry.secret),
        working_dir: entry.path,
        command: entry.cmd,
        branch,
    })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
