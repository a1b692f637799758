//! Deployhook deployment coordinator.
//!
//! Sequences one webhook delivery through the domain checks and into a
//! tracked deployment:
//!
//! 1. resolve the repository in the [`deploy::Registry`];
//! 2. verify the signature over the raw body;
//! 3. parse the push payload and apply the branch filter;
//! 4. take the repository's execution lock (or refuse with
//!    [`deploy::DeployError::DeploymentInProgress`]);
//! 5. record the attempt and flush the snapshot;
//! 6. run the command, record the result, flush again, release the lock.
//!
//! In [`deploy::ExecutionMode::Async`] step 6 runs on a spawned task and the
//! caller gets [`TriggerOutcome::Accepted`] as soon as step 5 completes.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** The coordinator sequences calls between the domain
//! crate and the [`deploy::CommandRunner`] / [`deploy::StatusStore`] ports. It
//! contains no domain rules of its own and knows nothing about HTTP.

mod deployer;

pub use deployer::{Deployer, TriggerOutcome};
