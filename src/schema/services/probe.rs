//! Read-only existence probing.

use super::ReconcileError;
use crate::schema::ports::{SchemaClientError, SchemaClientResult};
use std::fmt;
use std::future::Future;
use thiserror::Error;
use tracing::warn;

/// How the probe treats lookup errors other than not-found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProbeMode {
    /// Every remote error reads as "absent". An outage then looks like a
    /// missing object and the following create call surfaces the real
    /// failure.
    #[default]
    Lenient,
    /// Only not-found reads as "absent"; other errors propagate.
    Strict,
}

impl ProbeMode {
    /// Returns the canonical configuration representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lenient => "lenient",
            Self::Strict => "strict",
        }
    }
}

impl fmt::Display for ProbeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned while parsing a probe mode name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown probe mode: {0}")]
pub struct ParseProbeModeError(pub String);

impl TryFrom<&str> for ProbeMode {
    type Error = ParseProbeModeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            _ => Err(ParseProbeModeError(value.to_owned())),
        }
    }
}

/// Maps lookups onto "present or absent".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExistenceProbe {
    mode: ProbeMode,
}

impl ExistenceProbe {
    /// Creates a probe with the given mode.
    #[must_use]
    pub const fn new(mode: ProbeMode) -> Self {
        Self { mode }
    }

    /// Returns the probe mode.
    #[must_use]
    pub const fn mode(&self) -> ProbeMode {
        self.mode
    }

    /// Executes `lookup`, mapping not-found onto `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::AdapterMismatch`] when the client lacks the
    /// lookup method, and in [`ProbeMode::Strict`] returns
    /// [`ReconcileError::Remote`] for errors other than not-found.
    pub async fn try_get<T, F, Fut>(&self, label: &str, lookup: F) -> Result<Option<T>, ReconcileError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = SchemaClientResult<T>>,
    {
        match lookup().await {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err @ SchemaClientError::MethodNotFound(_)) => {
                Err(ReconcileError::from_client(label, err))
            }
            Err(err) => match self.mode {
                ProbeMode::Lenient => {
                    warn!(label, error = %err, "existence probe failed; treating object as absent");
                    Ok(None)
                }
                ProbeMode::Strict => Err(ReconcileError::from_client(label, err)),
            },
        }
    }
}
