//! Shared world state for schema migration BDD scenarios.

use mockable::DefaultClock;
use rstest::fixture;
use std::sync::Arc;
use std::time::Duration;
use strata::schema::{
    adapters::{
        RemoteSchema,
        memory::{InMemoryAccountDirectory, InMemorySchemaBackend},
    },
    domain::DatabaseId,
    ports::CallingConvention,
    services::{
        MigrationContext, MigrationRunError, MigrationRunner, MigrationScript, PollSettings,
        RunReport, SchemaEnsurer,
    },
};

/// Scenario world for schema migration behaviour tests.
pub struct MigrationWorld {
    /// Simulated remote backend.
    pub backend: InMemorySchemaBackend,
    /// Context handed to scripts.
    pub context: MigrationContext,
    /// Reports from successful runs, oldest first.
    pub reports: Vec<RunReport>,
    /// Error from the last failed run.
    pub last_error: Option<MigrationRunError>,
    /// Mutating calls observed during the most recent replay.
    pub replay_mutations: Option<usize>,
}

impl MigrationWorld {
    /// Creates a world over an empty object-convention backend.
    #[must_use]
    pub fn new() -> Self {
        let backend = InMemorySchemaBackend::new(CallingConvention::Object);
        let database_id = DatabaseId::new("academics").expect("fixed database id is valid");
        let schema = SchemaEnsurer::new(
            RemoteSchema::new(Arc::new(backend.clone()), backend.convention()),
            database_id,
        )
        .with_poll_settings(
            PollSettings::default()
                .with_timeout(Duration::from_millis(500))
                .with_delays(Duration::from_millis(1), Duration::from_millis(10))
                .with_settle_delay(Duration::ZERO),
        );
        let context = MigrationContext::new(schema, Arc::new(InMemoryAccountDirectory::new()));
        Self {
            backend,
            context,
            reports: Vec::new(),
            last_error: None,
            replay_mutations: None,
        }
    }

    /// Runs `scripts` once, recording the report or the failure.
    pub fn run(&mut self, scripts: Vec<Box<dyn MigrationScript>>) -> Result<(), eyre::Report> {
        let runner = MigrationRunner::new(scripts, Arc::new(DefaultClock))?;
        match run_async(runner.run(&self.context)) {
            Ok(report) => self.reports.push(report),
            Err(err) => self.last_error = Some(err),
        }
        Ok(())
    }
}

impl Default for MigrationWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> MigrationWorld {
    MigrationWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
