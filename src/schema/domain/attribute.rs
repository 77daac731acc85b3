//! Desired attribute shapes.

use super::{AttributeKey, SchemaDomainError};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Kind of a remote attribute together with its kind-specific bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    /// UTF-8 string with a maximum size in characters.
    String {
        /// Maximum size accepted by the backend.
        size: u32,
    },
    /// Boolean flag.
    Boolean,
    /// Signed 64-bit integer with optional inclusive bounds.
    Integer {
        /// Inclusive lower bound.
        min: Option<i64>,
        /// Inclusive upper bound.
        max: Option<i64>,
    },
    /// ISO 8601 timestamp.
    Datetime,
}

impl AttributeKind {
    /// Returns the kind name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String { .. } => "string",
            Self::Boolean => "boolean",
            Self::Integer { .. } => "integer",
            Self::Datetime => "datetime",
        }
    }
}

/// Default value for an optional attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeDefault {
    /// String default.
    String(String),
    /// Boolean default.
    Boolean(bool),
    /// Integer default.
    Integer(i64),
    /// Timestamp default.
    Datetime(DateTime<Utc>),
}

impl AttributeDefault {
    const fn kind_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Datetime(_) => "datetime",
        }
    }

    /// Renders the default as the JSON value submitted to the backend.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(value) => Value::from(value.as_str()),
            Self::Boolean(value) => Value::from(*value),
            Self::Integer(value) => Value::from(*value),
            Self::Datetime(value) => {
                Value::from(value.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
        }
    }
}

/// Desired shape of one attribute.
///
/// A required attribute never carries a default: the backend rejects
/// defaults on required fields, so [`AttributeSpec::effective_default`]
/// reports `None` whenever `required` is set, whatever the caller supplied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSpec {
    key: AttributeKey,
    kind: AttributeKind,
    required: bool,
    default: Option<AttributeDefault>,
    array: bool,
}

impl AttributeSpec {
    /// Creates an optional, scalar attribute of the given kind.
    #[must_use]
    pub const fn new(key: AttributeKey, kind: AttributeKind) -> Self {
        Self {
            key,
            kind,
            required: false,
            default: None,
            array: false,
        }
    }

    /// Creates a string attribute with the given maximum size.
    #[must_use]
    pub const fn string(key: AttributeKey, size: u32) -> Self {
        Self::new(key, AttributeKind::String { size })
    }

    /// Creates a boolean attribute.
    #[must_use]
    pub const fn boolean(key: AttributeKey) -> Self {
        Self::new(key, AttributeKind::Boolean)
    }

    /// Creates an unbounded integer attribute.
    #[must_use]
    pub const fn integer(key: AttributeKey) -> Self {
        Self::new(key, AttributeKind::Integer { min: None, max: None })
    }

    /// Creates a datetime attribute.
    #[must_use]
    pub const fn datetime(key: AttributeKey) -> Self {
        Self::new(key, AttributeKind::Datetime)
    }

    /// Sets inclusive integer bounds. Has no effect on other kinds.
    #[must_use]
    pub const fn with_range(mut self, min: i64, max: i64) -> Self {
        if let AttributeKind::Integer { .. } = self.kind {
            self.kind = AttributeKind::Integer {
                min: Some(min),
                max: Some(max),
            };
        }
        self
    }

    /// Marks the attribute as required.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the attribute as an array of its kind.
    #[must_use]
    pub const fn array(mut self) -> Self {
        self.array = true;
        self
    }

    /// Supplies a default value.
    ///
    /// The value is kept for diagnostics but never submitted when the
    /// attribute is required.
    #[must_use]
    pub fn with_default(mut self, default: AttributeDefault) -> Self {
        self.default = Some(default);
        self
    }

    /// Returns the attribute key.
    #[must_use]
    pub const fn key(&self) -> &AttributeKey {
        &self.key
    }

    /// Returns the attribute kind.
    #[must_use]
    pub const fn kind(&self) -> AttributeKind {
        self.kind
    }

    /// Returns whether the attribute is required.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Returns whether the attribute holds an array.
    #[must_use]
    pub const fn is_array(&self) -> bool {
        self.array
    }

    /// Returns the default to submit: always `None` for required attributes.
    #[must_use]
    pub const fn effective_default(&self) -> Option<&AttributeDefault> {
        if self.required {
            return None;
        }
        self.default.as_ref()
    }

    /// Checks kind-specific bounds and default compatibility.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaDomainError`] when a string size is zero, an integer
    /// range is inverted, or the effective default does not fit the kind or
    /// range.
    pub fn validate(&self) -> Result<(), SchemaDomainError> {
        let key = self.key.as_str();
        match self.kind {
            AttributeKind::String { size: 0 } => {
                return Err(SchemaDomainError::ZeroStringSize(key.to_owned()));
            }
            AttributeKind::Integer {
                min: Some(min),
                max: Some(max),
            } if min > max => {
                return Err(SchemaDomainError::InvalidIntegerRange {
                    key: key.to_owned(),
                    min,
                    max,
                });
            }
            _ => {}
        }

        let Some(default) = self.effective_default() else {
            return Ok(());
        };

        match (self.kind, default) {
            (AttributeKind::String { .. }, AttributeDefault::String(_))
            | (AttributeKind::Boolean, AttributeDefault::Boolean(_))
            | (AttributeKind::Datetime, AttributeDefault::Datetime(_)) => Ok(()),
            (AttributeKind::Integer { min, max }, AttributeDefault::Integer(value)) => {
                let below = min.is_some_and(|bound| *value < bound);
                let above = max.is_some_and(|bound| *value > bound);
                if below || above {
                    return Err(SchemaDomainError::DefaultOutOfRange {
                        key: key.to_owned(),
                        value: *value,
                    });
                }
                Ok(())
            }
            (kind, other) => Err(SchemaDomainError::DefaultKindMismatch {
                key: key.to_owned(),
                attribute_kind: kind.name(),
                default_kind: other.kind_name(),
            }),
        }
    }
}
