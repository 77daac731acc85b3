//! Given steps for schema migration BDD scenarios.

use super::world::{MigrationWorld, run_async};
use eyre::{WrapErr, eyre};
use rstest_bdd_macros::given;
use strata::migrations::schema_scripts;
use strata::schema::domain::{AttributeKey, CollectionId, IndexKey, RemoteObjectStatus};

#[given("an empty remote database")]
fn empty_database(world: &mut MigrationWorld) -> Result<(), eyre::Report> {
    if !world.backend.calls().is_empty() {
        return Err(eyre!("backend already received calls"));
    }
    Ok(())
}

#[given(r#"a remote database migrated through "{script_id}""#)]
fn migrated_through(world: &mut MigrationWorld, script_id: String) -> Result<(), eyre::Report> {
    let mut scripts = schema_scripts();
    let position = scripts
        .iter()
        .position(|script| script.id() == script_id)
        .ok_or_else(|| eyre!("unknown script {script_id}"))?;
    scripts.truncate(position + 1);
    world.run(scripts)?;
    if let Some(err) = world.last_error.take() {
        return Err(eyre!("partial migration failed: {err}"));
    }
    world.reports.clear();
    world.backend.clear_calls();
    Ok(())
}

#[given(r#"the index "{index}" on "{collection}" exists"#)]
fn index_exists(
    world: &mut MigrationWorld,
    index: String,
    collection: String,
) -> Result<(), eyre::Report> {
    let collection_id = CollectionId::new(collection)?;
    let key = IndexKey::new(index)?;
    let exists = run_async(world.context.schema().index_exists(&collection_id, &key))
        .wrap_err("probe index")?;
    if !exists {
        return Err(eyre!("index {key} is missing"));
    }
    Ok(())
}

#[given(r#"the index "{index}" on "{collection}" was already deleted"#)]
fn index_already_deleted(
    world: &mut MigrationWorld,
    index: String,
    collection: String,
) -> Result<(), eyre::Report> {
    let collection_id = CollectionId::new(collection)?;
    let key = IndexKey::new(index)?;
    run_async(
        world
            .context
            .schema()
            .delete_index_if_present(&collection_id, &key),
    )
    .wrap_err("delete index ahead of the run")?;
    Ok(())
}

#[given(r#"the backend fails attribute "{key}" on "{collection}" with "{message}""#)]
fn backend_fails_attribute(
    world: &mut MigrationWorld,
    key: String,
    collection: String,
    message: String,
) -> Result<(), eyre::Report> {
    world.backend.fail_attribute(
        &CollectionId::new(collection)?,
        &AttributeKey::new(key)?,
        RemoteObjectStatus::Failed,
        message,
    );
    Ok(())
}
