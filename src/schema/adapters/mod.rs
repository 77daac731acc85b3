//! Adapter implementations for schema reconciliation ports.

pub mod ledger_file;
pub mod memory;
pub mod remote;
pub mod rest;

pub use ledger_file::JsonLinesRunLedger;
pub use remote::RemoteSchema;
pub use rest::{RestBackendClient, RestClientSettings};
