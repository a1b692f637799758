//! Push payload parsing and the branch filter.
//!
//! Only the `ref` field of a notification matters for deciding whether to
//! deploy. Everything else in the payload is ignored, but a `ref` that is
//! present with the wrong type is rejected rather than treated as absent.

use serde::Deserialize;

use crate::{BranchName, DeployError};

/// The narrow view of a webhook payload the branch filter needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PushPayload {
    /// Fully-qualified ref the notification targets (e.g. `refs/heads/main`).
    ///
    /// Absent for manually triggered or ref-less notifications.
    #[serde(rename = "ref", default)]
    pub git_ref: Option<String>,
}

impl PushPayload {
    /// Parses a verified request body.
    ///
    /// The body must be a JSON object; `ref`, when present and not `null`,
    /// must be a string.
    pub fn from_slice(body: &[u8]) -> Result<Self, DeployError> {
        let value: serde_json::Value =
            serde_json::from_slice(body).map_err(|e| DeployError::InvalidPayload {
                reason: e.to_string(),
            })?;
        if !value.is_object() {
            return Err(DeployError::InvalidPayload {
                reason: "payload must be a JSON object".to_string(),
            });
        }
        serde_json::from_value(value).map_err(|e| DeployError::InvalidPayload {
            reason: e.to_string(),
        })
    }
}

/// Decides whether a notification should trigger a deployment of
/// `configured`.
///
/// A payload without a ref always deploys. Otherwise the ref must be exactly
/// `refs/heads/<configured>`.
pub fn should_deploy(payload: &PushPayload, configured: &BranchName) -> bool {
    match payload.git_ref.as_deref() {
        None => true,
        Some(git_ref) => git_ref == configured.as_ref_name(),
    }
}

#[cfg(test)]
#[path = "branch_tests.rs"]
mod tests;
