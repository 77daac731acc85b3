//! Reconciliation services.
//!
//! [`SchemaEnsurer`] drives one remote object at a time toward its desired
//! shape using the [`ExistenceProbe`], [`TolerancePolicy`], and
//! [`ConvergencePoller`]; [`MigrationRunner`] applies ordered scripts built
//! from ensurer calls.

mod ensure;
mod error;
mod poller;
mod policy;
mod probe;
mod runner;

pub use ensure::{EnsureOutcome, RemovalOutcome, SchemaEnsurer, Supersession};
pub use error::ReconcileError;
pub use poller::{
    BackoffSchedule, ConvergencePoller, PollFailure, PollSettings, PollSettingsError,
};
pub use policy::{Tolerance, TolerancePolicy};
pub use probe::{ExistenceProbe, ParseProbeModeError, ProbeMode};
pub use runner::{
    MigrationContext, MigrationRunError, MigrationRunner, MigrationScript, RunReport,
};
