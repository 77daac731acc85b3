//! Error types for schema domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing or validating schema domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaDomainError {
    /// An identifier is empty after trimming.
    #[error("{kind} must not be empty")]
    EmptyIdentifier {
        /// Identifier kind, for example `collection id`.
        kind: &'static str,
    },

    /// An identifier exceeds the remote identifier length limit.
    #[error("{kind} '{value}' exceeds the {limit} character identifier limit")]
    IdentifierTooLong {
        /// Identifier kind.
        kind: &'static str,
        /// Offending value.
        value: String,
        /// Maximum accepted length.
        limit: usize,
    },

    /// An identifier contains characters the remote backend rejects.
    #[error(
        "{kind} '{value}' is invalid (allowed: a-z, A-Z, 0-9, '.', '-', '_'; must not start with a special character)"
    )]
    InvalidIdentifier {
        /// Identifier kind.
        kind: &'static str,
        /// Offending value.
        value: String,
    },

    /// A collection display name is empty after trimming.
    #[error("collection '{0}' must have a display name")]
    EmptyCollectionName(String),

    /// A string attribute was declared with a zero size.
    #[error("string attribute '{0}' must have a size greater than zero")]
    ZeroStringSize(String),

    /// An integer attribute declares `min > max`.
    #[error("integer attribute '{key}' has min {min} greater than max {max}")]
    InvalidIntegerRange {
        /// Attribute key.
        key: String,
        /// Declared lower bound.
        min: i64,
        /// Declared upper bound.
        max: i64,
    },

    /// A default value does not match the attribute kind.
    #[error("default for attribute '{key}' is a {default_kind} but the attribute is {attribute_kind}")]
    DefaultKindMismatch {
        /// Attribute key.
        key: String,
        /// Kind of the attribute.
        attribute_kind: &'static str,
        /// Kind of the supplied default.
        default_kind: &'static str,
    },

    /// An integer default falls outside the declared bounds.
    #[error("default {value} for attribute '{key}' is outside its declared range")]
    DefaultOutOfRange {
        /// Attribute key.
        key: String,
        /// Supplied default.
        value: i64,
    },

    /// An index was declared without any attributes.
    #[error("index '{0}' must reference at least one attribute")]
    EmptyIndex(String),

    /// An index references the same attribute more than once.
    #[error("index '{index}' references attribute '{attribute}' more than once")]
    DuplicateIndexAttribute {
        /// Index key.
        index: String,
        /// Repeated attribute key.
        attribute: String,
    },
}

/// Error returned while parsing a remote object status string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown remote object status: {0}")]
pub struct ParseRemoteObjectStatusError(pub String);
