//! Then steps for schema migration BDD scenarios.

use super::world::{MigrationWorld, run_async};
use eyre::eyre;
use rstest_bdd_macros::then;
use strata::schema::{
    domain::{CollectionId, IndexKey},
    services::MigrationRunError,
};

#[then("each run applied {count:usize} scripts")]
fn each_run_applied(world: &mut MigrationWorld, count: usize) -> Result<(), eyre::Report> {
    if let Some(err) = &world.last_error {
        return Err(eyre!("a run failed: {err}"));
    }
    if world.reports.is_empty() {
        return Err(eyre!("no run completed"));
    }
    for report in &world.reports {
        if report.applied.len() != count {
            return Err(eyre!(
                "expected {count} scripts, run {} applied {}",
                report.run_id,
                report.applied.len()
            ));
        }
    }
    Ok(())
}

#[then(r#"the run applied "{script_id}""#)]
fn run_applied(world: &mut MigrationWorld, script_id: String) -> Result<(), eyre::Report> {
    if let Some(err) = &world.last_error {
        return Err(eyre!("run failed: {err}"));
    }
    let report = world
        .reports
        .last()
        .ok_or_else(|| eyre!("no run completed"))?;
    if report.applied != [script_id.clone()] {
        return Err(eyre!("expected only {script_id}, applied {:?}", report.applied));
    }
    Ok(())
}

#[then(r#"the collections "{first}", "{second}", "{third}" and "{fourth}" exist"#)]
fn collections_exist(
    world: &mut MigrationWorld,
    first: String,
    second: String,
    third: String,
    fourth: String,
) -> Result<(), eyre::Report> {
    for id in [first, second, third, fourth] {
        let collection_id = CollectionId::new(id)?;
        if !world
            .backend
            .has_collection(world.context.database_id(), &collection_id)
        {
            return Err(eyre!("collection {collection_id} is missing"));
        }
    }
    Ok(())
}

#[then("the replay made no mutating calls")]
fn replay_read_only(world: &mut MigrationWorld) -> Result<(), eyre::Report> {
    match world.replay_mutations {
        Some(0) => Ok(()),
        Some(count) => Err(eyre!("replay made {count} mutating calls")),
        None => Err(eyre!("no replay was recorded")),
    }
}

#[then(r#"the index "{index}" on "{collection}" is absent"#)]
fn index_absent(
    world: &mut MigrationWorld,
    index: String,
    collection: String,
) -> Result<(), eyre::Report> {
    let collection_id = CollectionId::new(collection)?;
    let key = IndexKey::new(index)?;
    let schema = world.context.schema();
    match run_async(
        schema
            .remote()
            .get_index(schema.database_id(), &collection_id, &key),
    ) {
        Err(err) if err.is_not_found() => Ok(()),
        Err(err) => Err(eyre!("index lookup failed: {err}")),
        Ok(found) => Err(eyre!("index {key} still present as {}", found.status)),
    }
}

#[then(r#"the index "{index}" on "{collection}" is available"#)]
fn index_available(
    world: &mut MigrationWorld,
    index: String,
    collection: String,
) -> Result<(), eyre::Report> {
    let collection_id = CollectionId::new(collection)?;
    let key = IndexKey::new(index)?;
    let schema = world.context.schema();
    let found = run_async(
        schema
            .remote()
            .get_index(schema.database_id(), &collection_id, &key),
    )
    .map_err(|err| eyre!("index lookup failed: {err}"))?;
    if !found.status.is_available() {
        return Err(eyre!("index {key} is {}", found.status));
    }
    Ok(())
}

#[then(r#"the run failed in script "{script_id}""#)]
fn run_failed_in(world: &mut MigrationWorld, script_id: String) -> Result<(), eyre::Report> {
    match &world.last_error {
        Some(MigrationRunError::Script { script_id: failed, .. }) if *failed == script_id => Ok(()),
        Some(other) => Err(eyre!("run failed differently: {other}")),
        None => Err(eyre!("run did not fail")),
    }
}
