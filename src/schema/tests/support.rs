//! Shared fixtures for schema unit tests.

use crate::schema::{
    adapters::{
        RemoteSchema,
        memory::{InMemoryAccountDirectory, InMemorySchemaBackend},
    },
    domain::{AttributeKey, CollectionId, DatabaseId, IndexKey},
    ports::CallingConvention,
    services::{MigrationContext, PollSettings, SchemaEnsurer},
};
use rstest::fixture;
use std::sync::Arc;
use std::time::Duration;

pub(super) fn fast_poll() -> PollSettings {
    PollSettings::default()
        .with_timeout(Duration::from_millis(250))
        .with_delays(Duration::from_millis(1), Duration::from_millis(5))
        .with_settle_delay(Duration::ZERO)
}

pub(super) fn database() -> DatabaseId {
    DatabaseId::new("main").expect("valid database id")
}

pub(super) fn collection(id: &str) -> CollectionId {
    CollectionId::new(id).expect("valid collection id")
}

pub(super) fn attribute(key: &str) -> AttributeKey {
    AttributeKey::new(key).expect("valid attribute key")
}

pub(super) fn index(key: &str) -> IndexKey {
    IndexKey::new(key).expect("valid index key")
}

pub(super) struct Harness {
    pub backend: InMemorySchemaBackend,
    pub accounts: InMemoryAccountDirectory,
    pub ensurer: SchemaEnsurer,
}

impl Harness {
    pub fn with_backend(backend: InMemorySchemaBackend) -> Self {
        let ensurer = SchemaEnsurer::new(
            RemoteSchema::new(Arc::new(backend.clone()), backend.convention()),
            database(),
        )
        .with_poll_settings(fast_poll());
        Self {
            backend,
            accounts: InMemoryAccountDirectory::new(),
            ensurer,
        }
    }

    pub fn context(&self) -> MigrationContext {
        MigrationContext::new(self.ensurer.clone(), Arc::new(self.accounts.clone()))
    }
}

#[fixture]
pub(super) fn harness() -> Harness {
    Harness::with_backend(InMemorySchemaBackend::new(CallingConvention::Object))
}
