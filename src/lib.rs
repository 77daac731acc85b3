//! Strata: declarative schema reconciliation for a hosted document backend.
//!
//! The crate drives collections, attributes, and indexes on a remote backend
//! toward desired shapes declared in code, then seeds baseline data rows.
//! Remote schema operations are asynchronous: objects report `processing`
//! until the backend settles them, so every mutation is followed by bounded
//! polling.
//!
//! # Architecture
//!
//! Strata follows hexagonal architecture principles:
//!
//! - **Domain**: desired shapes, identifiers, and remote snapshots
//! - **Ports**: the raw schema client, account directory, and run ledger
//! - **Adapters**: the calling-convention adapter, HTTP client, file ledger,
//!   and in-memory doubles
//! - **Services**: probing, polling, tolerance, ensurers, and the runner
//!
//! # Modules
//!
//! - [`schema`]: the reconciliation engine
//! - [`migrations`]: the ordered schema migrations and data seeds
//! - [`config`]: environment-driven configuration
//! - [`telemetry`]: logging setup

pub mod config;
pub mod migrations;
pub mod schema;
pub mod telemetry;
