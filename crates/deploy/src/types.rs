//! Shared value types for the deployhook domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! values with invariants (a secret is never printed, a duration is stored at
//! millisecond precision) and participate in status tracking.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::RepositoryId;

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly. Serializes as an RFC 3339 (ISO-8601) string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

// ---------------------------------------------------------------------------
// Secrets
// ---------------------------------------------------------------------------

/// The shared secret a webhook sender signs deliveries with.
///
/// Opaque bytes. `Debug` is redacted so a registry can be logged without
/// leaking credentials.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub struct Secret(Vec<u8>);

impl Secret {
    /// Creates a secret from raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Returns the raw key material.
    pub fn expose(&self) -> &[u8] {
        &self.0
    }

    /// Returns `true` if the secret has no key material.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value.into_bytes())
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Whether a webhook waits for its deployment to finish.
///
/// This is a deployment-wide policy, not a per-repository setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// The webhook response carries the final result (200 or 500).
    Sync,
    /// The webhook is answered with 202 immediately; the result is only
    /// visible through the status feed.
    #[default]
    Async,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::Sync => write!(f, "sync"),
            ExecutionMode::Async => write!(f, "async"),
        }
    }
}

impl std::str::FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sync" => Ok(ExecutionMode::Sync),
            "async" => Ok(ExecutionMode::Async),
            _ => Err(format!(
                "Invalid execution mode: {}. Use 'sync' or 'async'",
                s
            )),
        }
    }
}

/// What a finished deployment command reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Process exit code. `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Wall-clock time from spawn to exit.
    pub duration: Duration,
}

impl ExecutionOutcome {
    /// Returns `true` only for a clean exit with code 0.
    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// The most recent deployment activity for one repository.
///
/// Serialized in camelCase with `null` for unset fields; this is the shape of
/// each entry in `/status.json` and in the persisted snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStatus {
    /// When the most recent deployment started.
    pub last_attempt: Option<Timestamp>,
    /// When the most recent successful deployment finished.
    pub last_success: Option<Timestamp>,
    /// Exit code of the most recent finished deployment.
    pub last_exit_code: Option<i32>,
    /// Duration of the most recent finished deployment, in milliseconds.
    #[serde(with = "duration_millis", default)]
    pub last_duration: Option<Duration>,
    /// Generic failure marker for the most recent deployment, if it failed.
    pub last_error: Option<String>,
}

/// Every tracked repository's status, ordered by identifier.
pub type StatusSnapshot = BTreeMap<RepositoryId, DeploymentStatus>;

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(d) => serializer.serialize_some(&u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod tests;
