//! Profiles linked to auth identities.

use super::PROFILES;
use crate::schema::{
    domain::{
        AttributeDefault, AttributeKey, AttributeSpec, CollectionId, CollectionSpec, IndexKey,
        IndexSpec,
    },
    services::{MigrationContext, MigrationScript, ReconcileError},
};
use async_trait::async_trait;

/// Creates the `profiles` collection.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserProfiles;

#[async_trait]
impl MigrationScript for UserProfiles {
    fn id(&self) -> &str {
        "0002_user_profiles"
    }

    async fn apply(&self, context: &MigrationContext) -> Result<(), ReconcileError> {
        let schema = context.schema();
        let profiles = CollectionId::new(PROFILES)?;

        schema
            .ensure_collection(
                &CollectionSpec::new(profiles.clone(), "Profiles").with_document_security(),
            )
            .await?;
        for attribute in [
            AttributeSpec::string(AttributeKey::new("userId")?, 36).required(),
            AttributeSpec::string(AttributeKey::new("email")?, 320).required(),
            AttributeSpec::string(AttributeKey::new("name")?, 128).required(),
            AttributeSpec::string(AttributeKey::new("role")?, 32)
                .with_default(AttributeDefault::String("student".to_owned())),
            AttributeSpec::boolean(AttributeKey::new("mustChangePassword")?)
                .with_default(AttributeDefault::Boolean(false)),
            AttributeSpec::datetime(AttributeKey::new("lastLoginAt")?),
        ] {
            schema.ensure_attribute(&profiles, &attribute).await?;
        }
        schema
            .ensure_index(
                &profiles,
                &IndexSpec::unique(IndexKey::new("uniq_profiles_user_id")?)
                    .on(AttributeKey::new("userId")?),
            )
            .await?;

        Ok(())
    }
}
