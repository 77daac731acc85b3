//! Raw remote schema SDK port.
//!
//! SDK releases disagree on argument shape: older ones take positional
//! parameters, newer ones a single named-parameter object. [`CallParams`]
//! captures the named values once and renders either shape, and the
//! [`CallingConvention`] to use is chosen when the adapter is built.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Result type for raw schema client operations.
pub type SchemaClientResult<T> = Result<T, SchemaClientError>;

/// Remote status code meaning the object does not exist.
const NOT_FOUND: u16 = 404;

/// Remote status code meaning the object already exists.
const CONFLICT: u16 = 409;

/// Remote schema operations the engine relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaMethod {
    /// Fetches a collection.
    GetCollection,
    /// Creates a collection.
    CreateCollection,
    /// Fetches an attribute with its status.
    GetAttribute,
    /// Creates a string attribute.
    CreateStringAttribute,
    /// Creates a boolean attribute.
    CreateBooleanAttribute,
    /// Creates an integer attribute.
    CreateIntegerAttribute,
    /// Creates a datetime attribute.
    CreateDatetimeAttribute,
    /// Deletes an attribute.
    DeleteAttribute,
    /// Fetches an index with its status.
    GetIndex,
    /// Creates an index.
    CreateIndex,
    /// Deletes an index.
    DeleteIndex,
}

impl SchemaMethod {
    /// Every method, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::GetCollection,
        Self::CreateCollection,
        Self::GetAttribute,
        Self::CreateStringAttribute,
        Self::CreateBooleanAttribute,
        Self::CreateIntegerAttribute,
        Self::CreateDatetimeAttribute,
        Self::DeleteAttribute,
        Self::GetIndex,
        Self::CreateIndex,
        Self::DeleteIndex,
    ];

    /// Returns the SDK method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GetCollection => "getCollection",
            Self::CreateCollection => "createCollection",
            Self::GetAttribute => "getAttribute",
            Self::CreateStringAttribute => "createStringAttribute",
            Self::CreateBooleanAttribute => "createBooleanAttribute",
            Self::CreateIntegerAttribute => "createIntegerAttribute",
            Self::CreateDatetimeAttribute => "createDatetimeAttribute",
            Self::DeleteAttribute => "deleteAttribute",
            Self::GetIndex => "getIndex",
            Self::CreateIndex => "createIndex",
            Self::DeleteIndex => "deleteIndex",
        }
    }

    /// Returns the positional parameter order of the SDK signature.
    #[must_use]
    pub const fn parameters(self) -> &'static [&'static str] {
        match self {
            Self::GetCollection => &["databaseId", "collectionId"],
            Self::CreateCollection => &[
                "databaseId",
                "collectionId",
                "name",
                "permissions",
                "documentSecurity",
            ],
            Self::GetAttribute | Self::DeleteAttribute | Self::GetIndex | Self::DeleteIndex => {
                &["databaseId", "collectionId", "key"]
            }
            Self::CreateStringAttribute => &[
                "databaseId",
                "collectionId",
                "key",
                "size",
                "required",
                "default",
                "array",
            ],
            Self::CreateBooleanAttribute | Self::CreateDatetimeAttribute => &[
                "databaseId",
                "collectionId",
                "key",
                "required",
                "default",
                "array",
            ],
            Self::CreateIntegerAttribute => &[
                "databaseId",
                "collectionId",
                "key",
                "required",
                "min",
                "max",
                "default",
                "array",
            ],
            Self::CreateIndex => &[
                "databaseId",
                "collectionId",
                "key",
                "type",
                "attributes",
                "orders",
            ],
        }
    }

    /// Returns `true` for methods that change remote state.
    #[must_use]
    pub const fn is_mutating(self) -> bool {
        !matches!(
            self,
            Self::GetCollection | Self::GetAttribute | Self::GetIndex
        )
    }
}

impl fmt::Display for SchemaMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Argument shape an SDK release expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CallingConvention {
    /// A single object of named parameters.
    #[default]
    Object,
    /// Parameters in signature order.
    Positional,
}

impl CallingConvention {
    /// Returns the canonical configuration representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Positional => "positional",
        }
    }
}

impl fmt::Display for CallingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned while parsing a calling convention name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown calling convention: {0}")]
pub struct ParseCallingConventionError(pub String);

impl TryFrom<&str> for CallingConvention {
    type Error = ParseCallingConventionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "object" => Ok(Self::Object),
            "positional" => Ok(Self::Positional),
            _ => Err(ParseCallingConventionError(value.to_owned())),
        }
    }
}

/// Named parameter values for one method call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallParams {
    method: SchemaMethod,
    values: Map<String, Value>,
}

impl CallParams {
    /// Starts an empty parameter set for `method`.
    #[must_use]
    pub fn new(method: SchemaMethod) -> Self {
        Self {
            method,
            values: Map::new(),
        }
    }

    /// Sets a named parameter.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.values.insert(name.to_owned(), value.into());
        self
    }

    /// Returns the method these parameters belong to.
    #[must_use]
    pub const fn method(&self) -> SchemaMethod {
        self.method
    }

    /// Renders the parameters in the requested shape.
    ///
    /// The object shape lists every signature parameter, with `null` for
    /// parameters that were never set. The positional shape follows
    /// [`SchemaMethod::parameters`].
    #[must_use]
    pub fn into_args(mut self, convention: CallingConvention) -> CallArgs {
        let ordered = self.method.parameters().iter().map(|name| {
            let value = self.values.remove(*name).unwrap_or(Value::Null);
            ((*name).to_owned(), value)
        });
        match convention {
            CallingConvention::Object => CallArgs::Object(ordered.collect()),
            CallingConvention::Positional => {
                CallArgs::Positional(ordered.map(|(_, value)| value).collect())
            }
        }
    }
}

/// Arguments as handed to the SDK.
#[derive(Debug, Clone, PartialEq)]
pub enum CallArgs {
    /// A single object of named parameters.
    Object(Map<String, Value>),
    /// Parameters in signature order.
    Positional(Vec<Value>),
}

impl CallArgs {
    /// Returns the argument shape.
    #[must_use]
    pub const fn convention(&self) -> CallingConvention {
        match self {
            Self::Object(_) => CallingConvention::Object,
            Self::Positional(_) => CallingConvention::Positional,
        }
    }

    /// Looks up a named parameter, resolving positions through the method
    /// signature.
    #[must_use]
    pub fn get(&self, method: SchemaMethod, name: &str) -> Option<&Value> {
        match self {
            Self::Object(values) => values.get(name),
            Self::Positional(values) => method
                .parameters()
                .iter()
                .position(|parameter| *parameter == name)
                .and_then(|index| values.get(index)),
        }
    }

    /// Looks up a named string parameter.
    #[must_use]
    pub fn get_str(&self, method: SchemaMethod, name: &str) -> Option<&str> {
        self.get(method, name).and_then(Value::as_str)
    }
}

/// Error raised by the remote backend, tagged with its numeric code.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("remote error{}: {message}", .code.map(|code| format!(" {code}")).unwrap_or_default())]
pub struct RemoteError {
    code: Option<u16>,
    message: String,
}

impl RemoteError {
    /// Creates an error carrying a remote status code.
    #[must_use]
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }

    /// Creates an error without a status code.
    #[must_use]
    pub fn uncoded(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(NOT_FOUND, message)
    }

    /// Creates an already-exists error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(CONFLICT, message)
    }

    /// Returns the remote status code, if any.
    #[must_use]
    pub const fn code(&self) -> Option<u16> {
        self.code
    }

    /// Returns the remote message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` for code 404.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.code, Some(NOT_FOUND))
    }

    /// Returns `true` for code 409.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self.code, Some(CONFLICT))
    }
}

/// Errors returned by raw schema client implementations.
#[derive(Debug, Clone, Error)]
pub enum SchemaClientError {
    /// The backend rejected the call.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The client does not expose the method at all.
    #[error("schema client has no method {0}")]
    MethodNotFound(SchemaMethod),

    /// The backend answered with a payload the engine cannot decode.
    #[error("malformed response from {operation}: {reason}")]
    MalformedResponse {
        /// Operation whose response failed to decode.
        operation: String,
        /// Decoding failure.
        reason: String,
    },

    /// The request never produced a remote answer.
    #[error("transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl SchemaClientError {
    /// Wraps a transport-level failure.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }

    /// Returns the remote error when the backend answered.
    #[must_use]
    pub const fn remote(&self) -> Option<&RemoteError> {
        match self {
            Self::Remote(err) => Some(err),
            _ => None,
        }
    }

    /// Returns `true` when the backend reported code 404.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.remote().is_some_and(RemoteError::is_not_found)
    }

    /// Returns `true` when the backend reported code 409.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.remote().is_some_and(RemoteError::is_conflict)
    }
}

/// Raw remote schema SDK.
///
/// Implementations receive arguments already shaped for the convention the
/// adapter was configured with.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SchemaClient: Send + Sync {
    /// Returns whether the client exposes `method`.
    fn supports(&self, method: SchemaMethod) -> bool;

    /// Invokes `method` and returns the raw JSON response.
    async fn call(&self, method: SchemaMethod, args: CallArgs) -> SchemaClientResult<Value>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn positional_args_follow_signature_order() {
        let args = CallParams::new(SchemaMethod::CreateIntegerAttribute)
            .with("array", false)
            .with("key", "yearLevel")
            .with("collectionId", "sections")
            .with("databaseId", "main")
            .with("required", false)
            .with("min", 1)
            .with("max", 12)
            .into_args(CallingConvention::Positional);

        assert_eq!(
            args,
            CallArgs::Positional(vec![
                json!("main"),
                json!("sections"),
                json!("yearLevel"),
                json!(false),
                json!(1),
                json!(12),
                Value::Null,
                json!(false),
            ])
        );
    }

    #[test]
    fn object_args_include_unset_parameters_as_null() {
        let args = CallParams::new(SchemaMethod::GetCollection)
            .with("databaseId", "main")
            .into_args(CallingConvention::Object);

        assert_eq!(args.get(SchemaMethod::GetCollection, "collectionId"), Some(&Value::Null));
        assert_eq!(args.get_str(SchemaMethod::GetCollection, "databaseId"), Some("main"));
    }

    #[test]
    fn positional_lookup_resolves_names() {
        let args = CallParams::new(SchemaMethod::GetIndex)
            .with("databaseId", "main")
            .with("collectionId", "sections")
            .with("key", "idx")
            .into_args(CallingConvention::Positional);

        assert_eq!(args.get_str(SchemaMethod::GetIndex, "key"), Some("idx"));
        assert_eq!(args.get(SchemaMethod::GetIndex, "missing"), None);
    }

    #[test]
    fn every_method_has_database_and_collection_first() {
        for method in SchemaMethod::ALL {
            assert_eq!(
                method.parameters().get(..2),
                Some(["databaseId", "collectionId"].as_slice()),
                "{method} should lead with database and collection"
            );
        }
    }

    #[test]
    fn remote_error_codes_classify() {
        assert!(RemoteError::not_found("gone").is_not_found());
        assert!(RemoteError::conflict("exists").is_conflict());
        assert!(!RemoteError::uncoded("reset").is_conflict());
        assert_eq!(RemoteError::new(500, "boom").to_string(), "remote error 500: boom");
        assert_eq!(RemoteError::uncoded("reset").to_string(), "remote error: reset");
    }

    #[test]
    fn calling_convention_parses() {
        assert_eq!(CallingConvention::try_from("Positional"), Ok(CallingConvention::Positional));
        assert!(CallingConvention::try_from("tuple").is_err());
    }
}
