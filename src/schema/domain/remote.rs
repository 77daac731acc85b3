//! Snapshots of remote objects as reported by the backend.

use super::RemoteObjectStatus;
use serde::Deserialize;

/// Remote collection as returned by a collection lookup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteCollection {
    /// Collection identifier.
    #[serde(rename = "$id")]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// Remote attribute with its processing status.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteAttribute {
    /// Attribute key.
    pub key: String,
    /// Attribute type as reported by the backend.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Processing status.
    pub status: RemoteObjectStatus,
    /// Diagnostic message attached to failed or stuck attributes.
    #[serde(default)]
    pub error: Option<String>,
}

/// Remote index with its processing status.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteIndex {
    /// Index key.
    pub key: String,
    /// Index type as reported by the backend.
    #[serde(rename = "type", default)]
    pub index_type: String,
    /// Processing status.
    pub status: RemoteObjectStatus,
    /// Indexed attribute keys.
    #[serde(default)]
    pub attributes: Vec<String>,
    /// Sort direction per indexed attribute; `None` means ascending.
    #[serde(default)]
    pub orders: Vec<Option<String>>,
    /// Diagnostic message attached to failed or stuck indexes.
    #[serde(default)]
    pub error: Option<String>,
}

impl RemoteAttribute {
    /// Returns the diagnostic message when one is present and non-blank.
    #[must_use]
    pub fn diagnostic(&self) -> Option<&str> {
        diagnostic(self.error.as_deref())
    }
}

impl RemoteIndex {
    /// Returns the diagnostic message when one is present and non-blank.
    #[must_use]
    pub fn diagnostic(&self) -> Option<&str> {
        diagnostic(self.error.as_deref())
    }
}

fn diagnostic(error: Option<&str>) -> Option<&str> {
    error.map(str::trim).filter(|message| !message.is_empty())
}
