//! Ordered migration and seed script execution.

use super::{ReconcileError, SchemaEnsurer};
use crate::schema::{
    domain::{DatabaseId, LedgerEntry, RunId, ScriptOutcome},
    ports::{AccountDirectory, RunLedger},
};
use async_trait::async_trait;
use mockable::Clock;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// One ordered unit of migration or seed work.
///
/// Scripts must be idempotent: the runner re-applies every script on every
/// run and relies on the ensurers to skip converged objects.
#[async_trait]
pub trait MigrationScript: Send + Sync {
    /// Stable script identifier, unique within a runner.
    fn id(&self) -> &str;

    /// Applies the script.
    ///
    /// # Errors
    ///
    /// Returns the first [`ReconcileError`] raised by the script's steps.
    async fn apply(&self, context: &MigrationContext) -> Result<(), ReconcileError>;
}

/// Shared handles passed to every script.
#[derive(Clone)]
pub struct MigrationContext {
    schema: SchemaEnsurer,
    accounts: Arc<dyn AccountDirectory>,
}

impl MigrationContext {
    /// Creates a context from an ensurer and an account directory.
    #[must_use]
    pub fn new(schema: SchemaEnsurer, accounts: Arc<dyn AccountDirectory>) -> Self {
        Self { schema, accounts }
    }

    /// Returns the schema ensurer.
    #[must_use]
    pub const fn schema(&self) -> &SchemaEnsurer {
        &self.schema
    }

    /// Returns the account directory used by seed scripts.
    #[must_use]
    pub fn accounts(&self) -> &dyn AccountDirectory {
        self.accounts.as_ref()
    }

    /// Returns the target database.
    #[must_use]
    pub const fn database_id(&self) -> &DatabaseId {
        self.schema.database_id()
    }
}

/// Errors raised by [`MigrationRunner`].
#[derive(Debug, Error)]
pub enum MigrationRunError {
    /// Two scripts share an identifier.
    #[error("duplicate script id: {0}")]
    DuplicateScriptId(String),

    /// A script failed and the run stopped.
    #[error("script {script_id} failed: {source}")]
    Script {
        /// Identifier of the failed script.
        script_id: String,
        /// Failure raised by the script.
        #[source]
        source: ReconcileError,
    },
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Identifier of this run.
    pub run_id: RunId,
    /// Scripts applied, in order.
    pub applied: Vec<String>,
}

/// Applies scripts one at a time in declaration order.
///
/// The first failure aborts the run. No "applied" state is consulted; a
/// re-run starts from the first script again.
pub struct MigrationRunner<C>
where
    C: Clock + Send + Sync,
{
    scripts: Vec<Box<dyn MigrationScript>>,
    clock: Arc<C>,
    ledger: Option<Arc<dyn RunLedger>>,
}

impl<C> MigrationRunner<C>
where
    C: Clock + Send + Sync,
{
    /// Creates a runner over `scripts`.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationRunError::DuplicateScriptId`] when two scripts share
    /// an identifier.
    pub fn new(
        scripts: Vec<Box<dyn MigrationScript>>,
        clock: Arc<C>,
    ) -> Result<Self, MigrationRunError> {
        let mut seen = HashSet::new();
        for script in &scripts {
            if !seen.insert(script.id()) {
                return Err(MigrationRunError::DuplicateScriptId(script.id().to_owned()));
            }
        }
        Ok(Self {
            scripts,
            clock,
            ledger: None,
        })
    }

    /// Records script outcomes in `ledger`.
    #[must_use]
    pub fn with_ledger(mut self, ledger: Arc<dyn RunLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Returns script identifiers in execution order.
    pub fn script_ids(&self) -> impl Iterator<Item = &str> {
        self.scripts.iter().map(|script| script.id())
    }

    /// Applies every script in order.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationRunError::Script`] for the first script that fails;
    /// later scripts are not attempted.
    pub async fn run(&self, context: &MigrationContext) -> Result<RunReport, MigrationRunError> {
        let run_id = RunId::new();
        let mut applied = Vec::with_capacity(self.scripts.len());
        info!(
            %run_id,
            scripts = self.scripts.len(),
            database = %context.database_id(),
            "migration run started"
        );

        for script in &self.scripts {
            let script_id = script.id();
            info!(%run_id, script = script_id, "applying script");
            match script.apply(context).await {
                Ok(()) => {
                    self.record(run_id, script_id, ScriptOutcome::Applied).await;
                    info!(%run_id, script = script_id, "script applied");
                    applied.push(script_id.to_owned());
                }
                Err(err) => {
                    error!(%run_id, script = script_id, error = %err, "script failed; aborting run");
                    let outcome = ScriptOutcome::Failed {
                        message: err.to_string(),
                    };
                    self.record(run_id, script_id, outcome).await;
                    return Err(MigrationRunError::Script {
                        script_id: script_id.to_owned(),
                        source: err,
                    });
                }
            }
        }

        info!(%run_id, applied = applied.len(), "migration run finished");
        Ok(RunReport { run_id, applied })
    }

    async fn record(&self, run_id: RunId, script_id: &str, outcome: ScriptOutcome) {
        let Some(ledger) = &self.ledger else {
            return;
        };
        let entry = LedgerEntry {
            run_id,
            script_id: script_id.to_owned(),
            outcome,
            recorded_at: self.clock.utc(),
        };
        if let Err(err) = ledger.append(&entry).await {
            warn!(%run_id, script = script_id, error = %err, "failed to record ledger entry");
        }
    }
}
