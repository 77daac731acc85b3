//! Seeds the first administrator account.

use super::PROFILES;
use crate::config::AdminBootstrapConfig;
use crate::schema::{
    domain::CollectionId,
    ports::{NewUserAccount, UserAccount},
    services::{MigrationContext, MigrationScript, ReconcileError},
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::info;

/// Ensures an administrator auth identity and its profile document exist.
///
/// The identity is looked up by email and the profile by `userId`; only the
/// missing parts are created, so a re-run after a partial failure finishes
/// the job without duplicating either record.
#[derive(Debug, Clone)]
pub struct BootstrapAdministrator {
    admin: AdminBootstrapConfig,
}

impl BootstrapAdministrator {
    /// Creates the seed for the configured administrator.
    #[must_use]
    pub const fn new(admin: AdminBootstrapConfig) -> Self {
        Self { admin }
    }

    async fn ensure_identity(
        &self,
        context: &MigrationContext,
    ) -> Result<UserAccount, ReconcileError> {
        let accounts = context.accounts();
        let email = self.admin.email();
        let label = format!("user {email}");

        let existing = context
            .schema()
            .probe()
            .try_get(&label, move || accounts.find_user_by_email(email))
            .await?
            .flatten();
        if let Some(user) = existing {
            info!(user_id = %user.id, "administrator identity already present");
            return Ok(user);
        }

        let account = &NewUserAccount {
            email: email.to_owned(),
            password: self.admin.password().to_owned(),
            name: self.admin.name().to_owned(),
        };
        let created = context
            .schema()
            .policy()
            .guard(&label, move || accounts.create_user(account))
            .await?;
        if let Some(user) = created {
            info!(user_id = %user.id, "administrator identity created");
            return Ok(user);
        }

        let user = accounts
            .find_user_by_email(email)
            .await
            .map_err(|err| ReconcileError::from_client(label.as_str(), err))?
            .ok_or_else(|| ReconcileError::MissingAfterConflict {
                label: label.clone(),
            })?;
        info!(user_id = %user.id, "administrator identity created concurrently");
        Ok(user)
    }

    async fn ensure_profile(
        &self,
        context: &MigrationContext,
        user: &UserAccount,
    ) -> Result<(), ReconcileError> {
        let accounts = context.accounts();
        let database_id = context.database_id();
        let profiles = &CollectionId::new(PROFILES)?;
        let label = format!("profile for user {}", user.id);

        let existing = context
            .schema()
            .probe()
            .try_get(&label, move || {
                accounts.find_document(database_id, profiles, "userId", &user.id)
            })
            .await?
            .flatten();
        if existing.is_some() {
            info!(user_id = %user.id, "administrator profile already present");
            return Ok(());
        }

        let data = &profile_data(user);
        let created = context
            .schema()
            .policy()
            .guard(&label, move || {
                accounts.create_document(database_id, profiles, data)
            })
            .await?;
        if created.is_some() {
            info!(user_id = %user.id, "administrator profile created");
        } else {
            info!(user_id = %user.id, "administrator profile created concurrently");
        }
        Ok(())
    }
}

#[async_trait]
impl MigrationScript for BootstrapAdministrator {
    fn id(&self) -> &str {
        "seed_0001_bootstrap_admin"
    }

    async fn apply(&self, context: &MigrationContext) -> Result<(), ReconcileError> {
        let user = self.ensure_identity(context).await?;
        self.ensure_profile(context, &user).await
    }
}

fn profile_data(user: &UserAccount) -> Map<String, Value> {
    let mut data = Map::new();
    data.insert("userId".to_owned(), Value::String(user.id.clone()));
    data.insert("email".to_owned(), Value::String(user.email.clone()));
    data.insert("name".to_owned(), Value::String(user.name.clone()));
    data.insert("role".to_owned(), Value::String("admin".to_owned()));
    data.insert("mustChangePassword".to_owned(), Value::Bool(true));
    data
}
