//! Desired collection shape.

use super::{CollectionId, SchemaDomainError};

/// Desired collection identity and display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSpec {
    id: CollectionId,
    name: String,
    document_security: bool,
}

impl CollectionSpec {
    /// Creates a collection spec with document-level security disabled.
    #[must_use]
    pub fn new(id: CollectionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into().trim().to_owned(),
            document_security: false,
        }
    }

    /// Enables document-level permissions on the collection.
    #[must_use]
    pub const fn with_document_security(mut self) -> Self {
        self.document_security = true;
        self
    }

    /// Returns the collection identifier.
    #[must_use]
    pub const fn id(&self) -> &CollectionId {
        &self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether document-level security is enabled.
    #[must_use]
    pub const fn document_security(&self) -> bool {
        self.document_security
    }

    /// Checks that the display name is present.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaDomainError::EmptyCollectionName`] when the name is
    /// blank.
    pub fn validate(&self) -> Result<(), SchemaDomainError> {
        if self.name.is_empty() {
            return Err(SchemaDomainError::EmptyCollectionName(
                self.id.as_str().to_owned(),
            ));
        }
        Ok(())
    }
}
