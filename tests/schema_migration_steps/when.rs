//! When steps for schema migration BDD scenarios.

use super::world::MigrationWorld;
use rstest_bdd_macros::when;
use strata::migrations::schema_scripts;

#[when("the schema scripts are run")]
fn scripts_run(world: &mut MigrationWorld) -> Result<(), eyre::Report> {
    world.run(schema_scripts())
}

#[when("the schema scripts are run twice")]
fn scripts_run_twice(world: &mut MigrationWorld) -> Result<(), eyre::Report> {
    world.run(schema_scripts())?;
    world.backend.clear_calls();
    world.run(schema_scripts())?;
    world.replay_mutations = Some(world.backend.mutating_calls().len());
    Ok(())
}

#[when(r#"the script "{script_id}" is run"#)]
fn single_script_run(world: &mut MigrationWorld, script_id: String) -> Result<(), eyre::Report> {
    let scripts: Vec<_> = schema_scripts()
        .into_iter()
        .filter(|script| script.id() == script_id)
        .collect();
    if scripts.is_empty() {
        return Err(eyre::eyre!("unknown script {script_id}"));
    }
    world.run(scripts)
}
