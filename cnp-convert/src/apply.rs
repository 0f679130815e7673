//! Cluster-apply seam.
//!
//! The orchestrator never talks to a cluster directly; it hands converted
//! policies to a [`PolicyApplier`] supplied by the caller. This module owns
//! the retry discipline around that call: transient failures are retried
//! with bounded exponential backoff, a conflict means the policy already
//! exists and is recorded as a non-fatal outcome, and anything else fails
//! the apply for that document only.

use std::time::Duration;

use netpol_model::CiliumNetworkPolicy;
use thiserror::Error;
use tracing::warn;

/// Errors an applier implementation can report.
#[derive(Debug, Error)]
pub enum ApplyError {
    /// The target object already exists. Conversion is idempotent, so this
    /// is recorded rather than treated as a hard failure.
    #[error("policy already exists: {0}")]
    Conflict(String),
    /// Rate limiting or a transient server error; worth retrying.
    #[error("transient apply failure: {0}")]
    Transient(String),
    /// A failure retrying will not fix.
    #[error("apply failed: {0}")]
    Fatal(String),
}

/// Applies one converted policy to external cluster state.
///
/// Implementations must not block indefinitely; the call is expected to
/// carry its own timeout.
pub trait PolicyApplier {
    fn apply(&self, policy: &CiliumNetworkPolicy) -> Result<(), ApplyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOptions {
    /// Total attempts, the first call included.
    pub max_attempts: u32,
    /// Backoff before the first retry; doubles per retry.
    pub initial_backoff: Duration,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(200),
        }
    }
}

/// Outcome of one apply, after retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Conflict: the object was already present.
    AlreadyExists(String),
    Failed(String),
}

/// Apply one policy, retrying transient failures.
pub fn apply_with_retry(
    applier: &dyn PolicyApplier,
    policy: &CiliumNetworkPolicy,
    options: ApplyOptions,
) -> ApplyOutcome {
    let mut backoff = options.initial_backoff;
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match applier.apply(policy) {
            Ok(()) => return ApplyOutcome::Applied,
            Err(ApplyError::Conflict(message)) => return ApplyOutcome::AlreadyExists(message),
            Err(ApplyError::Transient(message)) if attempt < options.max_attempts => {
                warn!(
                    policy = %policy.metadata.name,
                    attempt,
                    "transient apply failure, retrying: {message}"
                );
                std::thread::sleep(backoff);
                backoff *= 2;
            }
            Err(err) => return ApplyOutcome::Failed(err.to_string()),
        }
    }
}
