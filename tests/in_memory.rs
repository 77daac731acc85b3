//! End-to-end migration runs against the in-memory backend.
//!
//! Tests are organized into modules by functionality:
//! - `migration_flow_tests`: schema scripts on fresh and converged databases
//! - `seed_tests`: administrator bootstrap and its conflict handling

mod in_memory {
    pub mod helpers;

    mod migration_flow_tests;
    mod seed_tests;
}
