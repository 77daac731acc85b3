//! Declarative schema reconciliation for a managed document database.
//!
//! The remote backend owns every collection, attribute, and index; this module
//! drives those objects toward a desired shape through idempotent
//! create-if-absent calls and waits out the backend's asynchronous processing.
//! The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Reconciliation services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
