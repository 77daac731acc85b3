//! Unit tests for the schema reconciliation engine.

mod adapter_tests;
mod support;
