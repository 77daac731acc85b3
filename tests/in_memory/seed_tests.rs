//! Administrator bootstrap against the in-memory account directory.

use crate::in_memory::helpers::{Store, TestResult, admin, collection, runtime, runner, store};
use rstest::rstest;
use serde_json::Value;
use std::io;
use strata::config::AdminBootstrapConfig;
use strata::migrations::{PROFILES, seed_scripts};
use strata::schema::{
    adapters::memory::InMemoryRunLedger,
    domain::ScriptOutcome,
    ports::RemoteError,
    services::{MigrationRunError, ReconcileError},
};
use tokio::runtime::Runtime;

fn profiles(db: &Store) -> Result<Vec<Value>, Box<dyn std::error::Error + Send + Sync>> {
    Ok(db.accounts.documents(db.database(), &collection(PROFILES)?))
}

/// The seed creates the identity and its profile once.
#[rstest]
fn seed_creates_identity_and_profile(
    runtime: io::Result<Runtime>,
    store: Result<Store, Box<dyn std::error::Error + Send + Sync>>,
    admin: AdminBootstrapConfig,
) -> TestResult {
    let rt = runtime?;
    let db = store?;
    let ledger = InMemoryRunLedger::new();

    rt.block_on(runner(seed_scripts(admin.clone()), &ledger)?.run(&db.context))?;
    rt.block_on(runner(seed_scripts(admin), &ledger)?.run(&db.context))?;

    assert_eq!(db.accounts.created_user_count(), 1);
    assert_eq!(db.accounts.created_document_count(), 1);
    let users = db.accounts.users();
    let profile = profiles(&db)?.into_iter().next().ok_or("profile missing")?;
    assert_eq!(
        profile.get("userId").and_then(Value::as_str),
        users.first().map(|user| user.id.as_str())
    );
    assert_eq!(profile.get("role").and_then(Value::as_str), Some("admin"));
    assert_eq!(
        profile.get("mustChangePassword").and_then(Value::as_bool),
        Some(true)
    );
    assert!(
        ledger
            .entries()
            .iter()
            .all(|entry| entry.outcome == ScriptOutcome::Applied)
    );
    Ok(())
}

/// An identity left behind by an earlier partial run gets its profile.
#[rstest]
fn existing_identity_only_gains_a_profile(
    runtime: io::Result<Runtime>,
    store: Result<Store, Box<dyn std::error::Error + Send + Sync>>,
    admin: AdminBootstrapConfig,
) -> TestResult {
    let rt = runtime?;
    let db = store?;
    let existing = db.accounts.insert_user("Registrar@Example.edu", "Registrar");

    rt.block_on(runner(seed_scripts(admin), &InMemoryRunLedger::new())?.run(&db.context))?;

    assert_eq!(db.accounts.created_user_count(), 0);
    let stored = profiles(&db)?;
    assert_eq!(stored.len(), 1);
    assert_eq!(
        stored.first().and_then(|profile| profile.get("userId")).and_then(Value::as_str),
        Some(existing.id.as_str())
    );
    Ok(())
}

/// A concurrent writer creating the identity first is not an error.
#[rstest]
fn lost_creation_race_is_tolerated(
    runtime: io::Result<Runtime>,
    store: Result<Store, Box<dyn std::error::Error + Send + Sync>>,
    admin: AdminBootstrapConfig,
) -> TestResult {
    let rt = runtime?;
    let db = store?;
    db.accounts.lose_next_user_creation_race();

    rt.block_on(runner(seed_scripts(admin), &InMemoryRunLedger::new())?.run(&db.context))?;

    let users = db.accounts.users();
    assert_eq!(users.len(), 1);
    assert_eq!(profiles(&db)?.len(), 1);
    Ok(())
}

/// A conflict for an identity that cannot be found afterwards aborts the run.
#[rstest]
fn unexplained_conflict_aborts(
    runtime: io::Result<Runtime>,
    store: Result<Store, Box<dyn std::error::Error + Send + Sync>>,
    admin: AdminBootstrapConfig,
) -> TestResult {
    let rt = runtime?;
    let db = store?;
    db.accounts
        .reject_next_user_creation(RemoteError::conflict("A user with the same email already exists."));

    let result = rt.block_on(runner(seed_scripts(admin), &InMemoryRunLedger::new())?.run(&db.context));

    assert!(matches!(
        result,
        Err(MigrationRunError::Script {
            source: ReconcileError::MissingAfterConflict { .. },
            ..
        })
    ));
    assert!(profiles(&db)?.is_empty());
    Ok(())
}

/// Errors other than conflicts propagate.
#[rstest]
fn rejected_identity_creation_propagates(
    runtime: io::Result<Runtime>,
    store: Result<Store, Box<dyn std::error::Error + Send + Sync>>,
    admin: AdminBootstrapConfig,
) -> TestResult {
    let rt = runtime?;
    let db = store?;
    db.accounts
        .reject_next_user_creation(RemoteError::new(400, "Password must be at least 8 characters"));

    let result = rt.block_on(runner(seed_scripts(admin), &InMemoryRunLedger::new())?.run(&db.context));

    assert!(matches!(
        result,
        Err(MigrationRunError::Script {
            source: ReconcileError::Remote { .. },
            ..
        })
    ));
    Ok(())
}
