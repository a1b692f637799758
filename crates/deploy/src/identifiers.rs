//! Newtype domain identifiers.
//!
//! Repository identifiers and branch names are both strings on the wire, but
//! mixing them up would silently deploy the wrong thing. Each gets its own
//! newtype so the compiler keeps them apart.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                $name::new(value.clone())
                    .ok_or_else(|| format!("invalid {}: {:?}", stringify!($name), value))
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers — String-backed (configuration / Git names)
// ---------------------------------------------------------------------------

string_id! {
    /// Names a configured deployment target.
    ///
    /// The identifier is the single path segment a webhook is POSTed to
    /// (`POST /<id>`), so it must be non-empty and must not contain `/`.
    RepositoryId
}

impl RepositoryId {
    /// Creates a repository identifier, returning `None` if the value is empty
    /// or could not be addressed as a single URL path segment.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let v = value.into();
        if v.is_empty() || v.contains('/') || v.chars().any(char::is_whitespace) {
            None
        } else {
            Some(Self(v))
        }
    }
}

string_id! {
    /// A Git branch name (e.g. `"main"`, `"release/2.x"`).
    BranchName
}

impl BranchName {
    /// Creates a branch name, returning `None` if the value is empty.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let v = value.into();
        if v.is_empty() {
            None
        } else {
            Some(Self(v))
        }
    }

    /// The fully-qualified ref a push to this branch carries
    /// (`refs/heads/<name>`).
    pub fn as_ref_name(&self) -> String {
        format!("refs/heads/{}", self.0)
    }
}

impl Default for BranchName {
    fn default() -> Self {
        Self("main".to_string())
    }
}

// ---------------------------------------------------------------------------
// Identifiers — UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies one accepted deployment (one webhook that passed every check).
///
/// Generated fresh per deployment and attached to log spans and webhook
/// responses so a delivery can be correlated with its log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeploymentRunId(Uuid);

impl DeploymentRunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for DeploymentRunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[path = "identifiers_tests.rs"]
mod tests;
