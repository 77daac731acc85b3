//! References to remote schema objects.

use super::{AttributeKey, CollectionId, IndexKey};
use std::fmt;

/// Kind of a referenced remote object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaObjectKind {
    /// A collection.
    Collection,
    /// An attribute inside a collection.
    Attribute,
    /// An index inside a collection.
    Index,
}

impl SchemaObjectKind {
    /// Returns the kind name used in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Attribute => "attribute",
            Self::Index => "index",
        }
    }
}

/// Identity of a collection, attribute, or index.
///
/// Attributes and indexes always carry a key; collections never do. The
/// constructors are the only way to build a reference, so the pairing holds
/// by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaObjectRef {
    kind: SchemaObjectKind,
    collection_id: CollectionId,
    key: Option<String>,
}

impl SchemaObjectRef {
    /// References a collection.
    #[must_use]
    pub const fn collection(collection_id: CollectionId) -> Self {
        Self {
            kind: SchemaObjectKind::Collection,
            collection_id,
            key: None,
        }
    }

    /// References an attribute.
    #[must_use]
    pub fn attribute(collection_id: CollectionId, key: &AttributeKey) -> Self {
        Self {
            kind: SchemaObjectKind::Attribute,
            collection_id,
            key: Some(key.as_str().to_owned()),
        }
    }

    /// References an index.
    #[must_use]
    pub fn index(collection_id: CollectionId, key: &IndexKey) -> Self {
        Self {
            kind: SchemaObjectKind::Index,
            collection_id,
            key: Some(key.as_str().to_owned()),
        }
    }

    /// Returns the referenced object kind.
    #[must_use]
    pub const fn kind(&self) -> SchemaObjectKind {
        self.kind
    }

    /// Returns the owning collection.
    #[must_use]
    pub const fn collection_id(&self) -> &CollectionId {
        &self.collection_id
    }

    /// Returns the attribute or index key, absent for collections.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

impl fmt::Display for SchemaObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{} {}.{}", self.kind.as_str(), self.collection_id, key),
            None => write!(f, "{} {}", self.kind.as_str(), self.collection_id),
        }
    }
}
