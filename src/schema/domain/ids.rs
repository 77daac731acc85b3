//! Validated identifiers for remote schema objects.
//!
//! The remote backend applies one identifier grammar to databases,
//! collections, attribute keys, and index keys: at most
//! [`IDENTIFIER_MAX_LENGTH`] characters drawn from `[A-Za-z0-9._-]`, never
//! starting with a special character.

use super::SchemaDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum identifier length accepted by the remote backend.
pub const IDENTIFIER_MAX_LENGTH: usize = 36;

fn validate_identifier(kind: &'static str, raw: String) -> Result<String, SchemaDomainError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(SchemaDomainError::EmptyIdentifier { kind });
    }

    if trimmed.chars().count() > IDENTIFIER_MAX_LENGTH {
        return Err(SchemaDomainError::IdentifierTooLong {
            kind,
            value: trimmed.to_owned(),
            limit: IDENTIFIER_MAX_LENGTH,
        });
    }

    let starts_alphanumeric = trimmed
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric());
    let is_valid = trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));

    if !starts_alphanumeric || !is_valid {
        return Err(SchemaDomainError::InvalidIdentifier {
            kind,
            value: trimmed.to_owned(),
        });
    }

    Ok(trimmed.to_owned())
}

macro_rules! schema_identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a validated identifier.
            ///
            /// # Errors
            ///
            /// Returns [`SchemaDomainError`] when the value is empty, longer
            /// than [`IDENTIFIER_MAX_LENGTH`], or contains characters the
            /// remote backend rejects.
            pub fn new(value: impl Into<String>) -> Result<Self, SchemaDomainError> {
                validate_identifier($kind, value.into()).map(Self)
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = SchemaDomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

schema_identifier!(
    /// Identifier of the target remote database.
    DatabaseId,
    "database id"
);

schema_identifier!(
    /// Identifier of a remote collection.
    CollectionId,
    "collection id"
);

schema_identifier!(
    /// Key of an attribute within a collection.
    AttributeKey,
    "attribute key"
);

schema_identifier!(
    /// Key of an index within a collection.
    ///
    /// Keys longer than the remote identifier limit are rejected rather than
    /// truncated; callers choose short keys up front.
    IndexKey,
    "index key"
);
