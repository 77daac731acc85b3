//! Schema script runs against fresh and already-converged databases.

use crate::in_memory::helpers::{Store, TestResult, collection, index, runtime, runner, store};
use rstest::rstest;
use std::io;
use strata::migrations::{
    DEPARTMENTS, PROFILES, SECTIONS, SECTIONS_SCOPED_INDEX, SECTIONS_TERM_NAME_INDEX, TERMS,
    schema_scripts,
};
use strata::schema::{
    adapters::memory::{InMemoryRunLedger, InMemorySchemaBackend},
    domain::{AttributeKey, RemoteObjectStatus},
    ports::{CallingConvention, RemoteError, SchemaMethod},
    services::{MigrationRunError, ReconcileError},
};
use tokio::runtime::Runtime;

/// A fresh database converges to the declared schema in script order.
#[rstest]
fn fresh_database_converges(
    runtime: io::Result<Runtime>,
    store: Result<Store, Box<dyn std::error::Error + Send + Sync>>,
) -> TestResult {
    let rt = runtime?;
    let db = store?;
    let ledger = InMemoryRunLedger::new();

    let report = rt.block_on(runner(schema_scripts(), &ledger)?.run(&db.context))?;

    assert_eq!(
        report.applied,
        vec!["0001_academic_core", "0002_user_profiles", "0003_section_scope"]
    );
    for id in [DEPARTMENTS, TERMS, SECTIONS, PROFILES] {
        assert!(db.backend.has_collection(db.database(), &collection(id)?), "{id} exists");
    }
    let sections = collection(SECTIONS)?;
    assert!(
        db.backend
            .index_attributes(db.database(), &sections, &index(SECTIONS_TERM_NAME_INDEX)?)
            .is_none(),
        "legacy index retired"
    );
    assert_eq!(
        db.backend
            .index_attributes(db.database(), &sections, &index(SECTIONS_SCOPED_INDEX)?),
        Some(vec![
            "termId".to_owned(),
            "departmentId".to_owned(),
            "yearLevel".to_owned(),
            "name".to_owned(),
        ])
    );
    assert_eq!(
        db.backend.attribute_status(
            db.database(),
            &sections,
            &AttributeKey::new("yearLevel")?
        ),
        Some(RemoteObjectStatus::Available)
    );
    assert_eq!(ledger.entries().len(), 3);
    Ok(())
}

/// Replaying the scripts against a converged database mutates nothing.
#[rstest]
fn replay_is_read_only(
    runtime: io::Result<Runtime>,
    store: Result<Store, Box<dyn std::error::Error + Send + Sync>>,
) -> TestResult {
    let rt = runtime?;
    let db = store?;
    let ledger = InMemoryRunLedger::new();
    rt.block_on(runner(schema_scripts(), &ledger)?.run(&db.context))?;
    db.backend.clear_calls();

    let report = rt.block_on(runner(schema_scripts(), &ledger)?.run(&db.context))?;

    assert_eq!(report.applied.len(), 3);
    assert!(db.backend.mutating_calls().is_empty());
    assert!(!db.backend.calls().is_empty(), "replay still probes every object");
    Ok(())
}

/// The positional calling convention reaches the same end state.
#[rstest]
fn positional_clients_converge(runtime: io::Result<Runtime>) -> TestResult {
    let rt = runtime?;
    let db = Store::over(InMemorySchemaBackend::new(CallingConvention::Positional))?;
    let ledger = InMemoryRunLedger::new();

    rt.block_on(runner(schema_scripts(), &ledger)?.run(&db.context))?;

    assert!(
        db.backend
            .index_attributes(
                db.database(),
                &collection(SECTIONS)?,
                &index(SECTIONS_SCOPED_INDEX)?
            )
            .is_some()
    );
    Ok(())
}

/// A terminal attribute failure aborts the run before the old index is
/// retired.
#[rstest]
fn failed_attribute_aborts_before_superseding(runtime: io::Result<Runtime>) -> TestResult {
    let rt = runtime?;
    let db = Store::over(InMemorySchemaBackend::new(CallingConvention::Object))?;
    let ledger = InMemoryRunLedger::new();
    let sections = collection(SECTIONS)?;
    db.backend.fail_attribute(
        &sections,
        &AttributeKey::new("yearLevel")?,
        RemoteObjectStatus::Failed,
        "Attribute limit exceeded",
    );

    let failed = rt.block_on(runner(schema_scripts(), &ledger)?.run(&db.context));

    let Err(MigrationRunError::Script { script_id, source }) = failed else {
        return Err("expected the section scope script to fail".into());
    };
    assert_eq!(script_id, "0003_section_scope");
    assert!(matches!(source, ReconcileError::TerminalFailure { .. }));
    assert!(
        db.backend
            .index_attributes(db.database(), &sections, &index(SECTIONS_TERM_NAME_INDEX)?)
            .is_some(),
        "legacy index untouched when the run aborts before superseding"
    );
    Ok(())
}

/// A replay after section scoping stopped between dropping the term-name
/// index and creating its replacement finishes the scoping instead of
/// restoring the term-name index.
#[rstest]
fn interrupted_scoping_resumes_without_the_legacy_index(
    runtime: io::Result<Runtime>,
    store: Result<Store, Box<dyn std::error::Error + Send + Sync>>,
) -> TestResult {
    let rt = runtime?;
    let db = store?;
    let ledger = InMemoryRunLedger::new();
    let sections = collection(SECTIONS)?;
    let legacy = index(SECTIONS_TERM_NAME_INDEX)?;
    rt.block_on(runner(schema_scripts().into_iter().take(2).collect(), &ledger)?.run(&db.context))?;
    db.backend.fail_next(
        SchemaMethod::CreateIndex,
        RemoteError::new(500, "Internal server error"),
    );

    let interrupted = rt.block_on(runner(schema_scripts(), &ledger)?.run(&db.context));

    let Err(MigrationRunError::Script { script_id, .. }) = interrupted else {
        return Err("expected the section scope script to fail".into());
    };
    assert_eq!(script_id, "0003_section_scope");
    assert!(
        db.backend
            .index_attributes(db.database(), &sections, &legacy)
            .is_none(),
        "legacy index dropped before the replacement failed"
    );

    // Rows duplicated under the old constraint would now reject it.
    db.backend.fail_index(
        &sections,
        &legacy,
        RemoteObjectStatus::Failed,
        "Duplicate entries for the index",
    );
    db.backend.clear_calls();

    let report = rt.block_on(runner(schema_scripts(), &ledger)?.run(&db.context))?;

    assert_eq!(report.applied.len(), 3);
    assert!(
        db.backend
            .index_attributes(db.database(), &sections, &legacy)
            .is_none(),
        "legacy index stays retired"
    );
    assert!(
        db.backend
            .index_attributes(db.database(), &sections, &index(SECTIONS_SCOPED_INDEX)?)
            .is_some()
    );
    assert_eq!(
        db.backend
            .methods()
            .into_iter()
            .filter(|method| *method == SchemaMethod::CreateIndex)
            .count(),
        1,
        "only the scoped index is created"
    );
    Ok(())
}
