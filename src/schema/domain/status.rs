//! Remote object processing status.

use super::ParseRemoteObjectStatusError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Processing status of a remote collection, attribute, or index.
///
/// Every ensurer drives its object through this state machine:
/// `missing → processing` on a successful create, then `processing →
/// available` (success) or `processing → failed | stuck` (terminal failure,
/// usually carrying a diagnostic message).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum RemoteObjectStatus {
    /// The object does not exist remotely.
    Missing,
    /// The backend accepted the object and is still building it.
    Processing,
    /// The object is ready for use.
    Available,
    /// The backend is removing the object.
    Deleting,
    /// The backend gave up building the object.
    Failed,
    /// The backend stopped making progress on the object.
    Stuck,
}

impl RemoteObjectStatus {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Processing => "processing",
            Self::Available => "available",
            Self::Deleting => "deleting",
            Self::Failed => "failed",
            Self::Stuck => "stuck",
        }
    }

    /// Returns `true` when the object is ready for use.
    #[must_use]
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Available)
    }

    /// Returns `true` for statuses that can never turn into `available`.
    #[must_use]
    pub const fn is_terminal_failure(self) -> bool {
        matches!(self, Self::Failed | Self::Stuck)
    }
}

impl fmt::Display for RemoteObjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RemoteObjectStatus> for &'static str {
    fn from(value: RemoteObjectStatus) -> Self {
        value.as_str()
    }
}

impl TryFrom<&str> for RemoteObjectStatus {
    type Error = ParseRemoteObjectStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "missing" => Ok(Self::Missing),
            "processing" => Ok(Self::Processing),
            "available" => Ok(Self::Available),
            "deleting" => Ok(Self::Deleting),
            "failed" => Ok(Self::Failed),
            "stuck" => Ok(Self::Stuck),
            _ => Err(ParseRemoteObjectStatusError(value.to_owned())),
        }
    }
}

impl TryFrom<String> for RemoteObjectStatus {
    type Error = ParseRemoteObjectStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}
