//! Desired index shapes.

use super::{AttributeKey, IndexKey, SchemaDomainError};
use std::collections::HashSet;
use std::fmt;

/// Index kind supported by the remote backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    /// Plain lookup index.
    Key,
    /// Uniqueness constraint over the indexed attributes.
    Unique,
}

impl IndexType {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Key => "key",
            Self::Unique => "unique",
        }
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction of one indexed attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    /// Ascending order.
    #[default]
    Asc,
    /// Descending order.
    Desc,
}

impl SortOrder {
    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One attribute of an index together with its sort direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexColumn {
    attribute: AttributeKey,
    order: SortOrder,
}

impl IndexColumn {
    /// Returns the indexed attribute key.
    #[must_use]
    pub const fn attribute(&self) -> &AttributeKey {
        &self.attribute
    }

    /// Returns the sort direction.
    #[must_use]
    pub const fn order(&self) -> SortOrder {
        self.order
    }
}

/// Desired shape of one index.
///
/// Attributes and their orders are kept pairwise, so the two ordered
/// sequences the backend expects always have equal length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    key: IndexKey,
    index_type: IndexType,
    columns: Vec<IndexColumn>,
}

impl IndexSpec {
    /// Creates an index spec without columns.
    #[must_use]
    pub const fn new(key: IndexKey, index_type: IndexType) -> Self {
        Self {
            key,
            index_type,
            columns: Vec::new(),
        }
    }

    /// Creates a unique index spec.
    #[must_use]
    pub const fn unique(key: IndexKey) -> Self {
        Self::new(key, IndexType::Unique)
    }

    /// Creates a plain key index spec.
    #[must_use]
    pub const fn key_index(key: IndexKey) -> Self {
        Self::new(key, IndexType::Key)
    }

    /// Appends an attribute in ascending order.
    #[must_use]
    pub fn on(self, attribute: AttributeKey) -> Self {
        self.on_ordered(attribute, SortOrder::Asc)
    }

    /// Appends an attribute with an explicit sort direction.
    #[must_use]
    pub fn on_ordered(mut self, attribute: AttributeKey, order: SortOrder) -> Self {
        self.columns.push(IndexColumn { attribute, order });
        self
    }

    /// Returns the index key.
    #[must_use]
    pub const fn key(&self) -> &IndexKey {
        &self.key
    }

    /// Returns the index type.
    #[must_use]
    pub const fn index_type(&self) -> IndexType {
        self.index_type
    }

    /// Returns the indexed columns in declaration order.
    #[must_use]
    pub fn columns(&self) -> &[IndexColumn] {
        &self.columns
    }

    /// Returns the indexed attribute keys in declaration order.
    pub fn attributes(&self) -> impl Iterator<Item = &AttributeKey> {
        self.columns.iter().map(IndexColumn::attribute)
    }

    /// Returns the sort directions in declaration order.
    pub fn orders(&self) -> impl Iterator<Item = SortOrder> + '_ {
        self.columns.iter().map(IndexColumn::order)
    }

    /// Checks that the index covers at least one attribute, each once.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaDomainError::EmptyIndex`] or
    /// [`SchemaDomainError::DuplicateIndexAttribute`].
    pub fn validate(&self) -> Result<(), SchemaDomainError> {
        if self.columns.is_empty() {
            return Err(SchemaDomainError::EmptyIndex(self.key.as_str().to_owned()));
        }

        let mut seen = HashSet::with_capacity(self.columns.len());
        for attribute in self.attributes() {
            if !seen.insert(attribute) {
                return Err(SchemaDomainError::DuplicateIndexAttribute {
                    index: self.key.as_str().to_owned(),
                    attribute: attribute.as_str().to_owned(),
                });
            }
        }
        Ok(())
    }
}
