//! Applies schema migrations and data seeds to the configured backend.
//!
//! Usage:
//!
//! ```text
//! strata_migrate [schema|seed|all]
//! ```
//!
//! The phase defaults to `all`, which runs schema migrations and then seeds.
//! Connection details come from `STRATA_*` environment variables; seeding
//! additionally requires `STRATA_ADMIN_EMAIL` and `STRATA_ADMIN_PASSWORD`.
//! The process exits with status 0 on success and 1 on any failure.

use mockable::DefaultClock;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use strata::config::{AdminBootstrapConfig, ConfigError, EngineConfig, RemoteConfig};
use strata::migrations::{schema_scripts, seed_scripts};
use strata::schema::{
    adapters::{JsonLinesRunLedger, RemoteSchema, RestBackendClient},
    ports::{LedgerError, SchemaClientError},
    services::{
        ExistenceProbe, MigrationContext, MigrationRunError, MigrationRunner, MigrationScript,
        SchemaEnsurer,
    },
};
use thiserror::Error;
use tokio::runtime::Builder;
use tracing::{error, info};

/// Errors that stop the migration process.
#[derive(Debug, Error)]
enum AppError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to build backend client: {0}")]
    Client(#[source] SchemaClientError),
    #[error("failed to open run ledger: {0}")]
    Ledger(#[from] LedgerError),
    #[error("runtime init failed: {0}")]
    RuntimeInit(#[source] std::io::Error),
    #[error(transparent)]
    Run(#[from] MigrationRunError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Schema,
    Seed,
    All,
}

impl Phase {
    fn parse(arg: &str) -> Result<Self, AppError> {
        match arg {
            "schema" => Ok(Self::Schema),
            "seed" => Ok(Self::Seed),
            "all" => Ok(Self::All),
            other => Err(AppError::InvalidArgs(format!(
                "unknown phase '{other}'; expected schema, seed, or all"
            ))),
        }
    }

    const fn includes_schema(self) -> bool {
        matches!(self, Self::Schema | Self::All)
    }

    const fn includes_seed(self) -> bool {
        matches!(self, Self::Seed | Self::All)
    }
}

fn main() -> ExitCode {
    strata::telemetry::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "migration failed");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), AppError> {
    let phase = parse_args(env::args().skip(1))?;

    let remote = RemoteConfig::from_env()?;
    let engine = EngineConfig::from_env()?;
    let admin = if phase.includes_seed() {
        Some(AdminBootstrapConfig::from_env()?)
    } else {
        None
    };

    let client = Arc::new(
        RestBackendClient::new(remote.client_settings()).map_err(AppError::Client)?,
    );
    let schema = SchemaEnsurer::new(
        RemoteSchema::new(client.clone(), engine.convention()),
        remote.database_id().clone(),
    )
    .with_probe(ExistenceProbe::new(engine.probe_mode()))
    .with_poll_settings(*engine.poll());
    let context = MigrationContext::new(schema, client);

    let mut scripts: Vec<Box<dyn MigrationScript>> = Vec::new();
    if phase.includes_schema() {
        scripts.extend(schema_scripts());
    }
    if let Some(admin) = admin {
        scripts.extend(seed_scripts(admin));
    }

    let mut runner = MigrationRunner::new(scripts, Arc::new(DefaultClock))?;
    if let Some(dir) = engine.ledger_dir() {
        runner = runner.with_ledger(Arc::new(JsonLinesRunLedger::open(dir)?));
    }

    info!(
        endpoint = remote.endpoint(),
        project = remote.project_id(),
        database = %remote.database_id(),
        convention = %engine.convention(),
        probe_mode = %engine.probe_mode(),
        ?phase,
        "starting migration"
    );

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(AppError::RuntimeInit)?;
    let report = runtime.block_on(runner.run(&context))?;
    info!(run_id = %report.run_id, applied = ?report.applied, "migration complete");
    Ok(())
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Phase, AppError> {
    let phase = args.next().map_or(Ok(Phase::All), |arg| Phase::parse(&arg))?;
    if let Some(extra) = args.next() {
        return Err(AppError::InvalidArgs(format!(
            "unexpected extra argument: {extra}"
        )));
    }
    Ok(phase)
}
