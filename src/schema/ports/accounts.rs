//! Account directory port used by seed scripts.
//!
//! Seed scripts work at the data-row level: they look up an auth identity by
//! its natural key and a profile document by field value, creating only what
//! is missing.

use super::SchemaClientResult;
use crate::schema::domain::{CollectionId, DatabaseId};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;

/// Auth identity as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    /// Backend-assigned user identifier.
    pub id: String,
    /// Login email.
    pub email: String,
    /// Display name.
    pub name: String,
}

/// Auth identity to create.
#[derive(Clone, PartialEq, Eq)]
pub struct NewUserAccount {
    /// Login email.
    pub email: String,
    /// Initial password.
    pub password: String,
    /// Display name.
    pub name: String,
}

impl fmt::Debug for NewUserAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUserAccount")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .finish()
    }
}

/// Auth identities and document rows consulted by seed scripts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Finds an auth identity by email.
    ///
    /// Returns `None` when no identity uses the email.
    async fn find_user_by_email(&self, email: &str) -> SchemaClientResult<Option<UserAccount>>;

    /// Creates an auth identity.
    ///
    /// # Errors
    ///
    /// Returns a remote conflict (409) when the email is already taken.
    async fn create_user(&self, account: &NewUserAccount) -> SchemaClientResult<UserAccount>;

    /// Finds the first document whose `field` equals `value`.
    async fn find_document(
        &self,
        database_id: &DatabaseId,
        collection_id: &CollectionId,
        field: &str,
        value: &str,
    ) -> SchemaClientResult<Option<Value>>;

    /// Creates a document with a backend-assigned identifier.
    async fn create_document(
        &self,
        database_id: &DatabaseId,
        collection_id: &CollectionId,
        data: &Map<String, Value>,
    ) -> SchemaClientResult<Value>;
}
