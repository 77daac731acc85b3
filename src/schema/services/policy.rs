//! Conflict and not-found tolerance for mutating calls.

use super::ReconcileError;
use crate::schema::ports::{SchemaClientError, SchemaClientResult};
use std::future::Future;
use tracing::{debug, error};

/// Whether a class of remote error is treated as success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tolerance {
    /// Treat the error as success-equivalent.
    #[default]
    Skip,
    /// Surface the error.
    Propagate,
}

/// Classification of remote errors raised by mutating calls.
///
/// The default policy skips both already-exists (409) and not-found (404):
/// a create racing another writer and a delete of an object that is already
/// gone both leave the remote store in the desired state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TolerancePolicy {
    on_exists: Tolerance,
    on_not_found: Tolerance,
}

impl TolerancePolicy {
    /// Creates a policy from explicit tolerances.
    #[must_use]
    pub const fn new(on_exists: Tolerance, on_not_found: Tolerance) -> Self {
        Self {
            on_exists,
            on_not_found,
        }
    }

    /// Creates a policy that propagates every error.
    #[must_use]
    pub const fn strict() -> Self {
        Self::new(Tolerance::Propagate, Tolerance::Propagate)
    }

    /// Sets the tolerance for already-exists errors.
    #[must_use]
    pub const fn with_on_exists(mut self, tolerance: Tolerance) -> Self {
        self.on_exists = tolerance;
        self
    }

    /// Sets the tolerance for not-found errors.
    #[must_use]
    pub const fn with_on_not_found(mut self, tolerance: Tolerance) -> Self {
        self.on_not_found = tolerance;
        self
    }

    /// Returns whether `err` counts as success under this policy.
    #[must_use]
    pub fn tolerates(&self, err: &SchemaClientError) -> bool {
        (err.is_conflict() && self.on_exists == Tolerance::Skip)
            || (err.is_not_found() && self.on_not_found == Tolerance::Skip)
    }

    /// Runs a mutating call under this policy.
    ///
    /// Returns `Ok(Some(value))` on success and `Ok(None)` when the error was
    /// tolerated.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] for every error the policy does not
    /// tolerate, after logging it with `label`.
    pub async fn guard<T, F, Fut>(&self, label: &str, op: F) -> Result<Option<T>, ReconcileError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SchemaClientResult<T>>,
    {
        match op().await {
            Ok(value) => Ok(Some(value)),
            Err(err) if self.tolerates(&err) => {
                debug!(label, error = %err, "tolerated remote error");
                Ok(None)
            }
            Err(err) => {
                error!(label, error = %err, "remote call failed");
                Err(ReconcileError::from_client(label, err))
            }
        }
    }
}
