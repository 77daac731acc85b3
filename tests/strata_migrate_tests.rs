//! Behavioural tests for the `strata_migrate` binary.
//!
//! Every case fails before a remote call is attempted, so no backend is
//! needed.

use eyre::{Result, ensure, eyre};
use std::path::PathBuf;
use std::process::{Command, Output};

fn migrate_path() -> Result<PathBuf> {
    std::env::var_os("CARGO_BIN_EXE_strata_migrate")
        .map(PathBuf::from)
        .ok_or_else(|| {
            eyre!("CARGO_BIN_EXE_strata_migrate is not set; ensure the binary is built")
        })
}

fn run_migrate(args: &[&str], vars: &[(&str, &str)]) -> Result<Output> {
    let path = migrate_path()?;
    Command::new(&path)
        .args(args)
        .env_clear()
        .envs(vars.iter().copied())
        .output()
        .map_err(|err| eyre!(err))
}

fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));
    text
}

const REMOTE_VARS: [(&str, &str); 4] = [
    ("STRATA_ENDPOINT", "http://127.0.0.1:9/v1"),
    ("STRATA_PROJECT_ID", "academics"),
    ("STRATA_API_KEY", "secret-key"),
    ("STRATA_DATABASE_ID", "main"),
];

#[test]
fn rejects_unknown_phase() -> Result<()> {
    let output = run_migrate(&["sideways"], &[])?;
    ensure!(!output.status.success(), "expected failure status");
    ensure!(
        combined_output(&output).contains("unknown phase 'sideways'"),
        "expected unknown phase error"
    );
    Ok(())
}

#[test]
fn rejects_extra_arguments() -> Result<()> {
    let output = run_migrate(&["schema", "seed"], &[])?;
    ensure!(!output.status.success(), "expected failure status");
    ensure!(
        combined_output(&output).contains("unexpected extra argument"),
        "expected extra argument error"
    );
    Ok(())
}

#[test]
fn fails_fast_without_endpoint() -> Result<()> {
    let output = run_migrate(&["schema"], &[])?;
    ensure!(!output.status.success(), "expected failure status");
    ensure!(
        combined_output(&output).contains("STRATA_ENDPOINT"),
        "expected the missing endpoint to be named"
    );
    Ok(())
}

#[test]
fn seeding_requires_administrator_identity() -> Result<()> {
    let output = run_migrate(&["seed"], &REMOTE_VARS)?;
    ensure!(!output.status.success(), "expected failure status");
    let text = combined_output(&output);
    ensure!(
        text.contains("STRATA_ADMIN_EMAIL"),
        "expected the missing administrator email to be named"
    );
    ensure!(!text.contains("secret-key"), "api key must not be logged");
    Ok(())
}

#[test]
fn rejects_unknown_calling_convention() -> Result<()> {
    let mut vars = REMOTE_VARS.to_vec();
    vars.push(("STRATA_CALLING_CONVENTION", "keyword"));
    let output = run_migrate(&["schema"], &vars)?;
    ensure!(!output.status.success(), "expected failure status");
    ensure!(
        combined_output(&output).contains("STRATA_CALLING_CONVENTION"),
        "expected the invalid convention to be named"
    );
    Ok(())
}
