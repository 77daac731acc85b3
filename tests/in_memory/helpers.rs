//! Shared test helpers for in-memory migration integration tests.

use mockable::DefaultClock;
use rstest::fixture;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use strata::config::AdminBootstrapConfig;
use strata::schema::{
    adapters::{
        RemoteSchema,
        memory::{InMemoryAccountDirectory, InMemoryRunLedger, InMemorySchemaBackend},
    },
    domain::{CollectionId, DatabaseId, IndexKey},
    ports::CallingConvention,
    services::{
        MigrationContext, MigrationRunError, MigrationRunner, MigrationScript, PollSettings,
        SchemaEnsurer,
    },
};
use tokio::runtime::Runtime;

/// Boxed error type returned by integration tests.
pub type TestResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Provides a tokio runtime for async operations in tests.
///
/// # Errors
///
/// Returns an error if the runtime cannot be created.
#[fixture]
pub fn runtime() -> io::Result<Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

/// Simulated backend, account directory, and the context wired to them.
pub struct Store {
    /// Simulated schema backend.
    pub backend: InMemorySchemaBackend,
    /// Simulated auth identities and documents.
    pub accounts: InMemoryAccountDirectory,
    /// Context handed to scripts.
    pub context: MigrationContext,
}

impl Store {
    /// Wires a context to `backend` using the backend's own convention.
    pub fn over(backend: InMemorySchemaBackend) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let accounts = InMemoryAccountDirectory::new();
        let schema = SchemaEnsurer::new(
            RemoteSchema::new(Arc::new(backend.clone()), backend.convention()),
            DatabaseId::new("academics")?,
        )
        .with_poll_settings(
            PollSettings::default()
                .with_timeout(Duration::from_millis(500))
                .with_delays(Duration::from_millis(1), Duration::from_millis(10))
                .with_settle_delay(Duration::ZERO),
        );
        let context = MigrationContext::new(schema, Arc::new(accounts.clone()));
        Ok(Self {
            backend,
            accounts,
            context,
        })
    }

    /// Returns the database the context targets.
    pub fn database(&self) -> &DatabaseId {
        self.context.database_id()
    }
}

/// Provides a fresh in-memory store for each test.
///
/// # Errors
///
/// Returns an error if the database identifier is rejected.
#[fixture]
pub fn store() -> Result<Store, Box<dyn std::error::Error + Send + Sync>> {
    Store::over(InMemorySchemaBackend::new(CallingConvention::Object))
}

/// Provides the administrator identity used by seed tests.
#[fixture]
pub fn admin() -> AdminBootstrapConfig {
    AdminBootstrapConfig::new("registrar@example.edu", "correct-horse-battery", "Registrar")
}

/// Builds a runner over `scripts` recording into `ledger`.
///
/// # Errors
///
/// Returns an error when two scripts share an identifier.
pub fn runner(
    scripts: Vec<Box<dyn MigrationScript>>,
    ledger: &InMemoryRunLedger,
) -> Result<MigrationRunner<DefaultClock>, MigrationRunError> {
    Ok(MigrationRunner::new(scripts, Arc::new(DefaultClock))?.with_ledger(Arc::new(ledger.clone())))
}

/// Builds a collection identifier.
///
/// # Errors
///
/// Returns an error if the identifier is invalid.
pub fn collection(id: &str) -> Result<CollectionId, Box<dyn std::error::Error + Send + Sync>> {
    Ok(CollectionId::new(id)?)
}

/// Builds an index key.
///
/// # Errors
///
/// Returns an error if the key is invalid.
pub fn index(key: &str) -> Result<IndexKey, Box<dyn std::error::Error + Send + Sync>> {
    Ok(IndexKey::new(key)?)
}
