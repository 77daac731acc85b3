//! Step definitions for schema migration scenarios.

pub mod world;

mod given;
mod then;
mod when;
