//! Core domain for deployhook.
//!
//! This crate contains every domain concept, newtype identifier, shared value
//! type, and error type used to turn an authenticated webhook into a tracked
//! deployment. Infrastructure crates implement the traits defined here; they
//! never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed (run a command, persist a snapshot);
//! infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`RepositoryId`, `BranchName`, `DeploymentRunId`) |
//! | [`types`] | Value types (`Timestamp`, `Secret`, `DeploymentStatus`, `ExecutionOutcome`, ...) |
//! | [`registry`] | The immutable repository registry |
//! | [`signature`] | HMAC-SHA256 webhook signature verification |
//! | [`branch`] | Push payload parsing and the branch filter |
//! | [`status`] | In-memory per-repository deployment status |
//! | [`ports`] | `CommandRunner` and `StatusStore` traits |
//! | [`errors`] | Request, execution, and persistence error types |

pub mod branch;
pub mod errors;
pub mod identifiers;
pub mod ports;
pub mod registry;
pub mod signature;
pub mod status;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use branch::{should_deploy, PushPayload};
pub use errors::{DeployError, ExecutionError, StoreError};
pub use identifiers::{BranchName, DeploymentRunId, RepositoryId};
pub use ports::{CommandRunner, StatusStore};
pub use registry::{Registry, RepositoryConfig};
pub use signature::{sign, verify, SIGNATURE_HEADER};
pub use status::{StatusTracker, FAILURE_MARKER};
pub use types::{
    DeploymentStatus, ExecutionMode, ExecutionOutcome, Secret, StatusSnapshot, Timestamp,
};
