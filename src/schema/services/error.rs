//! Failure taxonomy shared by reconciliation services.

use crate::schema::{
    domain::{RemoteObjectStatus, SchemaDomainError, SchemaObjectRef},
    ports::{SchemaClientError, SchemaMethod},
};
use std::time::Duration;
use thiserror::Error;

/// Errors that abort a reconciliation step.
///
/// Not-found and already-exists answers never appear here under the default
/// tolerance policy; everything that does appear propagates to the script and
/// aborts the run.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A desired shape failed validation before any remote call.
    #[error(transparent)]
    Domain(#[from] SchemaDomainError),

    /// The backend rejected a call the policy does not tolerate.
    #[error("{label}: {source}")]
    Remote {
        /// Operation label naming the object involved.
        label: String,
        /// Underlying client error.
        #[source]
        source: SchemaClientError,
    },

    /// The schema client lacks a method the engine needs.
    #[error("{label}: schema client has no method {method}; the SDK version does not match")]
    AdapterMismatch {
        /// Operation label naming the object involved.
        label: String,
        /// Missing method.
        method: SchemaMethod,
    },

    /// The backend settled the object in a state that cannot become ready.
    #[error("{object} reached terminal status {status}: {message}")]
    TerminalFailure {
        /// Failed object.
        object: SchemaObjectRef,
        /// Terminal status reported by the backend.
        status: RemoteObjectStatus,
        /// Backend diagnostic.
        message: String,
    },

    /// The object did not settle within the polling budget.
    #[error(
        "timed out after {}ms waiting for {} (last error: {})",
        .elapsed.as_millis(),
        .label,
        .last_error.as_deref().unwrap_or("none")
    )]
    ConvergenceTimeout {
        /// Wait label.
        label: String,
        /// Time spent waiting.
        elapsed: Duration,
        /// Most recent transient error observed while polling.
        last_error: Option<String>,
    },

    /// The backend reported a conflict for an object that cannot be found
    /// afterwards.
    #[error("{label} was reported as existing but could not be found")]
    MissingAfterConflict {
        /// Operation label naming the object involved.
        label: String,
    },
}

impl ReconcileError {
    /// Classifies a client error raised by the operation named `label`.
    #[must_use]
    pub fn from_client(label: impl Into<String>, source: SchemaClientError) -> Self {
        match source {
            SchemaClientError::MethodNotFound(method) => Self::AdapterMismatch {
                label: label.into(),
                method,
            },
            other => Self::Remote {
                label: label.into(),
                source: other,
            },
        }
    }
}
