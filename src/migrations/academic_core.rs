//! Departments, terms, and sections.

use super::{DEPARTMENTS, SECTIONS, SECTIONS_SCOPED_INDEX, SECTIONS_TERM_NAME_INDEX, TERMS};
use crate::schema::{
    domain::{
        AttributeDefault, AttributeKey, AttributeSpec, CollectionId, CollectionSpec, IndexKey,
        IndexSpec, SortOrder,
    },
    services::{MigrationContext, MigrationScript, ReconcileError},
};
use async_trait::async_trait;
use tracing::debug;

/// Creates the core academic collections.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcademicCore;

#[async_trait]
impl MigrationScript for AcademicCore {
    fn id(&self) -> &str {
        "0001_academic_core"
    }

    async fn apply(&self, context: &MigrationContext) -> Result<(), ReconcileError> {
        let schema = context.schema();

        let departments = CollectionId::new(DEPARTMENTS)?;
        schema
            .ensure_collection(&CollectionSpec::new(departments.clone(), "Departments"))
            .await?;
        for attribute in [
            AttributeSpec::string(AttributeKey::new("name")?, 128).required(),
            AttributeSpec::string(AttributeKey::new("code")?, 16).required(),
            AttributeSpec::boolean(AttributeKey::new("active")?)
                .with_default(AttributeDefault::Boolean(true)),
        ] {
            schema.ensure_attribute(&departments, &attribute).await?;
        }
        schema
            .ensure_index(
                &departments,
                &IndexSpec::unique(IndexKey::new("uniq_departments_code")?)
                    .on(AttributeKey::new("code")?),
            )
            .await?;

        let terms = CollectionId::new(TERMS)?;
        schema
            .ensure_collection(&CollectionSpec::new(terms.clone(), "Terms"))
            .await?;
        for attribute in [
            AttributeSpec::string(AttributeKey::new("name")?, 64).required(),
            AttributeSpec::datetime(AttributeKey::new("startsAt")?).required(),
            AttributeSpec::datetime(AttributeKey::new("endsAt")?).required(),
            AttributeSpec::boolean(AttributeKey::new("isCurrent")?)
                .with_default(AttributeDefault::Boolean(false)),
        ] {
            schema.ensure_attribute(&terms, &attribute).await?;
        }
        schema
            .ensure_index(
                &terms,
                &IndexSpec::key_index(IndexKey::new("idx_terms_starts_at")?)
                    .on_ordered(AttributeKey::new("startsAt")?, SortOrder::Desc),
            )
            .await?;

        let sections = CollectionId::new(SECTIONS)?;
        schema
            .ensure_collection(&CollectionSpec::new(sections.clone(), "Sections"))
            .await?;
        for attribute in [
            AttributeSpec::string(AttributeKey::new("termId")?, 36).required(),
            AttributeSpec::string(AttributeKey::new("name")?, 64).required(),
            AttributeSpec::integer(AttributeKey::new("capacity")?)
                .with_range(1, 500)
                .with_default(AttributeDefault::Integer(40)),
        ] {
            schema.ensure_attribute(&sections, &attribute).await?;
        }
        // Once section scoping has started, the term-name index is its to remove.
        let scoped = schema
            .index_exists(&sections, &IndexKey::new(SECTIONS_SCOPED_INDEX)?)
            .await?
            || schema
                .attribute_exists(&sections, &AttributeKey::new("departmentId")?)
                .await?;
        if scoped {
            debug!("section scoping already started; not restoring the term-name index");
        } else {
            schema
                .ensure_index(
                    &sections,
                    &IndexSpec::unique(IndexKey::new(SECTIONS_TERM_NAME_INDEX)?)
                        .on(AttributeKey::new("termId")?)
                        .on(AttributeKey::new("name")?),
                )
                .await?;
        }

        Ok(())
    }
}
