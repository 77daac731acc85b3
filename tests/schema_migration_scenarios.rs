//! Behaviour tests for ordered schema migration runs.

mod schema_migration_steps;

use rstest_bdd_macros::scenario;
use schema_migration_steps::world::{MigrationWorld, world};

#[scenario(
    path = "tests/features/schema_migration.feature",
    name = "Fresh database converges and replays without mutation"
)]
#[tokio::test(flavor = "multi_thread")]
async fn fresh_database_converges(world: MigrationWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/schema_migration.feature",
    name = "Old unique index is superseded"
)]
#[tokio::test(flavor = "multi_thread")]
async fn old_index_superseded(world: MigrationWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/schema_migration.feature",
    name = "Superseding tolerates an already removed index"
)]
#[tokio::test(flavor = "multi_thread")]
async fn supersede_after_manual_removal(world: MigrationWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/schema_migration.feature",
    name = "Terminal attribute failure aborts the run"
)]
#[tokio::test(flavor = "multi_thread")]
async fn terminal_failure_aborts(world: MigrationWorld) {
    let _ = world;
}
