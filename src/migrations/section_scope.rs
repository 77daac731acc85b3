//! Scopes section names by department and year level.

use super::{SECTIONS, SECTIONS_SCOPED_INDEX, SECTIONS_TERM_NAME_INDEX};
use crate::schema::{
    domain::{AttributeKey, AttributeSpec, CollectionId, IndexKey, IndexSpec},
    services::{MigrationContext, MigrationScript, ReconcileError},
};
use async_trait::async_trait;
use tracing::info;

/// Adds `departmentId` and `yearLevel` to sections and widens the section
/// uniqueness constraint to include them.
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionScope;

#[async_trait]
impl MigrationScript for SectionScope {
    fn id(&self) -> &str {
        "0003_section_scope"
    }

    async fn apply(&self, context: &MigrationContext) -> Result<(), ReconcileError> {
        let schema = context.schema();
        let sections = CollectionId::new(SECTIONS)?;

        schema
            .ensure_attribute(
                &sections,
                &AttributeSpec::string(AttributeKey::new("departmentId")?, 36),
            )
            .await?;
        schema
            .ensure_attribute(
                &sections,
                &AttributeSpec::integer(AttributeKey::new("yearLevel")?).with_range(1, 12),
            )
            .await?;

        let replacement = IndexSpec::unique(IndexKey::new(SECTIONS_SCOPED_INDEX)?)
            .on(AttributeKey::new("termId")?)
            .on(AttributeKey::new("departmentId")?)
            .on(AttributeKey::new("yearLevel")?)
            .on(AttributeKey::new("name")?);
        let outcome = schema
            .supersede_index(
                &sections,
                &IndexKey::new(SECTIONS_TERM_NAME_INDEX)?,
                &replacement,
            )
            .await?;
        info!(
            removed = ?outcome.removed,
            ensured = ?outcome.ensured,
            "section uniqueness scoped by department and year level"
        );

        Ok(())
    }
}
