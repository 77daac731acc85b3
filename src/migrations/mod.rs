//! Concrete schema migrations and data seeds for the academic records store.
//!
//! Scripts run in declaration order and every one of them is safe to re-run:
//! each step is an ensurer call that skips objects already in their desired
//! state.

mod academic_core;
mod bootstrap_admin;
mod section_scope;
mod user_profiles;

pub use academic_core::AcademicCore;
pub use bootstrap_admin::BootstrapAdministrator;
pub use section_scope::SectionScope;
pub use user_profiles::UserProfiles;

use crate::config::AdminBootstrapConfig;
use crate::schema::services::MigrationScript;

/// Collection holding academic departments.
pub const DEPARTMENTS: &str = "departments";
/// Collection holding academic terms.
pub const TERMS: &str = "terms";
/// Collection holding class sections.
pub const SECTIONS: &str = "sections";
/// Collection holding user profiles linked to auth identities.
pub const PROFILES: &str = "profiles";

/// Unique index on sections retired by [`SectionScope`].
pub const SECTIONS_TERM_NAME_INDEX: &str = "uniq_sections_term_name";
/// Unique index on sections introduced by [`SectionScope`].
pub const SECTIONS_SCOPED_INDEX: &str = "uniq_sections_term_dept_year_name";

/// Returns the ordered schema migrations.
#[must_use]
pub fn schema_scripts() -> Vec<Box<dyn MigrationScript>> {
    vec![
        Box::new(AcademicCore),
        Box::new(UserProfiles),
        Box::new(SectionScope),
    ]
}

/// Returns the ordered data seeds.
#[must_use]
pub fn seed_scripts(admin: AdminBootstrapConfig) -> Vec<Box<dyn MigrationScript>> {
    vec![Box::new(BootstrapAdministrator::new(admin))]
}
