//! Environment-driven configuration.
//!
//! Every value is read through an injectable lookup so tests can supply a
//! map instead of mutating the process environment. Loading fails fast,
//! before any remote call, when a required value is missing or malformed.

use crate::schema::{
    adapters::RestClientSettings,
    domain::{DatabaseId, SchemaDomainError},
    ports::CallingConvention,
    services::{PollSettings, PollSettingsError, ProbeMode},
};
use camino::Utf8PathBuf;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Backend API endpoint, e.g. `https://cloud.example.com/v1`.
pub const ENDPOINT_VAR: &str = "STRATA_ENDPOINT";
/// Backend project identifier.
pub const PROJECT_ID_VAR: &str = "STRATA_PROJECT_ID";
/// Server API key.
pub const API_KEY_VAR: &str = "STRATA_API_KEY";
/// Target database identifier.
pub const DATABASE_ID_VAR: &str = "STRATA_DATABASE_ID";
/// SDK calling convention: `object` or `positional`.
pub const CALLING_CONVENTION_VAR: &str = "STRATA_CALLING_CONVENTION";
/// Existence probe mode: `lenient` or `strict`.
pub const PROBE_MODE_VAR: &str = "STRATA_PROBE_MODE";
/// Per-wait convergence budget in milliseconds.
pub const POLL_TIMEOUT_MS_VAR: &str = "STRATA_POLL_TIMEOUT_MS";
/// Directory for the optional run ledger.
pub const LEDGER_DIR_VAR: &str = "STRATA_LEDGER_DIR";
/// Administrator login email.
pub const ADMIN_EMAIL_VAR: &str = "STRATA_ADMIN_EMAIL";
/// Administrator initial password.
pub const ADMIN_PASSWORD_VAR: &str = "STRATA_ADMIN_PASSWORD";
/// Administrator display name.
pub const ADMIN_NAME_VAR: &str = "STRATA_ADMIN_NAME";

const DEFAULT_ADMIN_NAME: &str = "Administrator";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set to a value that cannot be used.
    #[error("invalid value for {key}: {reason}")]
    Invalid {
        /// Offending variable.
        key: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl fmt::Display) -> Self {
        Self::Invalid {
            key,
            reason: reason.to_string(),
        }
    }
}

impl From<PollSettingsError> for ConfigError {
    fn from(err: PollSettingsError) -> Self {
        Self::invalid(POLL_TIMEOUT_MS_VAR, err)
    }
}

/// Connection details for the hosted backend.
#[derive(Clone)]
pub struct RemoteConfig {
    endpoint: String,
    project_id: String,
    api_key: String,
    database_id: DatabaseId,
}

impl RemoteConfig {
    /// Loads the remote configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    /// Loads the remote configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let endpoint = required(&lookup, ENDPOINT_VAR)?;
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::invalid(
                ENDPOINT_VAR,
                "endpoint must start with http:// or https://",
            ));
        }
        let database_id = DatabaseId::new(required(&lookup, DATABASE_ID_VAR)?)
            .map_err(|err: SchemaDomainError| ConfigError::invalid(DATABASE_ID_VAR, err))?;
        Ok(Self {
            endpoint,
            project_id: required(&lookup, PROJECT_ID_VAR)?,
            api_key: required(&lookup, API_KEY_VAR)?,
            database_id,
        })
    }

    /// Returns the API endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the project identifier.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Returns the target database.
    #[must_use]
    pub const fn database_id(&self) -> &DatabaseId {
        &self.database_id
    }

    /// Builds HTTP client settings from this configuration.
    #[must_use]
    pub fn client_settings(&self) -> RestClientSettings {
        RestClientSettings::new(&self.endpoint, &self.project_id, &self.api_key)
    }
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("endpoint", &self.endpoint)
            .field("project_id", &self.project_id)
            .field("api_key", &"<redacted>")
            .field("database_id", &self.database_id)
            .finish()
    }
}

/// Engine behaviour switches.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineConfig {
    convention: CallingConvention,
    probe_mode: ProbeMode,
    poll: PollSettings,
    ledger_dir: Option<Utf8PathBuf>,
}

impl EngineConfig {
    /// Loads engine settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a variable is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    /// Loads engine settings through `lookup`; unset variables keep their
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a variable is malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = optional(&lookup, CALLING_CONVENTION_VAR) {
            config.convention = CallingConvention::try_from(raw.as_str())
                .map_err(|err| ConfigError::invalid(CALLING_CONVENTION_VAR, err))?;
        }
        if let Some(raw) = optional(&lookup, PROBE_MODE_VAR) {
            config.probe_mode = ProbeMode::try_from(raw.as_str())
                .map_err(|err| ConfigError::invalid(PROBE_MODE_VAR, err))?;
        }
        if let Some(raw) = optional(&lookup, POLL_TIMEOUT_MS_VAR) {
            let millis: u64 = raw
                .parse()
                .map_err(|err| ConfigError::invalid(POLL_TIMEOUT_MS_VAR, err))?;
            config.poll = config.poll.with_timeout(Duration::from_millis(millis));
        }
        config.poll.validate()?;
        config.ledger_dir = optional(&lookup, LEDGER_DIR_VAR).map(Utf8PathBuf::from);

        Ok(config)
    }

    /// Returns the SDK calling convention.
    #[must_use]
    pub const fn convention(&self) -> CallingConvention {
        self.convention
    }

    /// Returns the existence probe mode.
    #[must_use]
    pub const fn probe_mode(&self) -> ProbeMode {
        self.probe_mode
    }

    /// Returns the poll settings.
    #[must_use]
    pub const fn poll(&self) -> &PollSettings {
        &self.poll
    }

    /// Returns the run ledger directory, when one is configured.
    #[must_use]
    pub fn ledger_dir(&self) -> Option<&camino::Utf8Path> {
        self.ledger_dir.as_deref()
    }
}

/// Identity of the administrator created by the bootstrap seed.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminBootstrapConfig {
    email: String,
    password: String,
    name: String,
}

impl AdminBootstrapConfig {
    /// Creates an administrator identity.
    #[must_use]
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            name: name.into(),
        }
    }

    /// Loads the administrator identity from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the email or password is missing or
    /// invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    /// Loads the administrator identity through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the email or password is missing or
    /// invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let email = required(&lookup, ADMIN_EMAIL_VAR)?;
        if !email.contains('@') {
            return Err(ConfigError::invalid(ADMIN_EMAIL_VAR, "not an email address"));
        }
        let password = required(&lookup, ADMIN_PASSWORD_VAR)?;
        if password.chars().count() < 8 {
            return Err(ConfigError::invalid(
                ADMIN_PASSWORD_VAR,
                "password must contain at least 8 characters",
            ));
        }
        let name =
            optional(&lookup, ADMIN_NAME_VAR).unwrap_or_else(|| DEFAULT_ADMIN_NAME.to_owned());
        Ok(Self {
            email,
            password,
            name,
        })
    }

    /// Returns the login email.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the initial password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for AdminBootstrapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminBootstrapConfig")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .finish()
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Option<String> {
    lookup(key)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<String, ConfigError> {
    optional(lookup, key).ok_or(ConfigError::Missing(key))
}
