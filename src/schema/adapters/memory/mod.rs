//! In-memory adapters for tests and local runs.
//!
//! [`InMemorySchemaBackend`] imitates the asynchronous behaviour of the
//! hosted backend: new objects report `processing` for a configurable number
//! of reads before they settle, and deleted objects linger as `deleting`.

mod accounts;
mod backend;
mod ledger;

pub use accounts::InMemoryAccountDirectory;
pub use backend::{InMemorySchemaBackend, RecordedCall};
pub use ledger::InMemoryRunLedger;
