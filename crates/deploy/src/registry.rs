//! The repository registry: which deployment targets exist and how to deploy
//! each one.
//!
//! Built once at startup and shared read-only for the process lifetime.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::{BranchName, RepositoryId, Secret};

/// Everything needed to authenticate and run a deployment for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// The path segment webhooks for this repository are POSTed to.
    pub id: RepositoryId,
    /// Key used to verify the `x-hub-signature-256` header.
    pub secret: Secret,
    /// Checkout the command runs in.
    pub working_dir: PathBuf,
    /// Shell command line executed via `sh -c`.
    pub command: String,
    /// Only pushes to this branch trigger a deployment.
    pub branch: BranchName,
}

/// Immutable map from repository identifier to its configuration.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    repos: BTreeMap<RepositoryId, RepositoryConfig>,
}

impl Registry {
    /// Builds a registry from a set of configurations.
    ///
    /// Identifiers are unique: a later entry with the same identifier replaces
    /// an earlier one.
    pub fn new(configs: impl IntoIterator<Item = RepositoryConfig>) -> Self {
        let repos = configs
            .into_iter()
            .map(|config| (config.id.clone(), config))
            .collect();
        Self { repos }
    }

    /// Looks up a repository by the raw path segment from a request.
    pub fn find(&self, raw_id: &str) -> Option<&RepositoryConfig> {
        RepositoryId::new(raw_id).and_then(|id| self.repos.get(&id))
    }

    pub fn contains(&self, id: &RepositoryId) -> bool {
        self.repos.contains_key(id)
    }

    /// Registered identifiers, in order.
    pub fn ids(&self) -> impl Iterator<Item = &RepositoryId> {
        self.repos.keys()
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
