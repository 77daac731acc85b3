//! HTTP client for the hosted backend's REST surface.
//!
//! The REST surface has no calling-convention split; both argument shapes
//! resolve to the same named parameters through [`CallArgs::get`], which is
//! how one client serves either convention.

use crate::schema::{
    domain::{CollectionId, DatabaseId},
    ports::{
        AccountDirectory, CallArgs, NewUserAccount, RemoteError, SchemaClient, SchemaClientError,
        SchemaClientResult, SchemaMethod, UserAccount,
    },
};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, header};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const PROJECT_HEADER: &str = "X-Appwrite-Project";
const KEY_HEADER: &str = "X-Appwrite-Key";
const UNIQUE_ID: &str = "unique()";

/// Connection settings for [`RestBackendClient`].
#[derive(Clone)]
pub struct RestClientSettings {
    endpoint: String,
    project_id: String,
    api_key: String,
    request_timeout: Duration,
}

impl RestClientSettings {
    /// Creates settings for the given endpoint and credentials.
    #[must_use]
    pub fn new(
        endpoint: impl Into<String>,
        project_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_owned(),
            project_id: project_id.into(),
            api_key: api_key.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Returns the API endpoint without a trailing slash.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the project identifier.
    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}

impl fmt::Debug for RestClientSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClientSettings")
            .field("endpoint", &self.endpoint)
            .field("project_id", &self.project_id)
            .field("api_key", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Schema client and account directory backed by HTTP calls.
#[derive(Clone)]
pub struct RestBackendClient {
    http: Client,
    settings: Arc<RestClientSettings>,
}

impl fmt::Debug for RestBackendClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestBackendClient")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    #[serde(rename = "$id")]
    id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    name: String,
}

impl From<UserRecord> for UserAccount {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            name: record.name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserList {
    #[serde(default)]
    users: Vec<UserRecord>,
}

#[derive(Debug, Deserialize)]
struct DocumentList {
    #[serde(default)]
    documents: Vec<Value>,
}

struct Route {
    verb: Method,
    path: String,
    body: Option<Value>,
}

impl RestBackendClient {
    /// Builds a client from `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaClientError::Transport`] when the HTTP client cannot
    /// be constructed.
    pub fn new(settings: RestClientSettings) -> SchemaClientResult<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(SchemaClientError::transport)?;
        Ok(Self {
            http,
            settings: Arc::new(settings),
        })
    }

    /// Returns the connection settings.
    #[must_use]
    pub fn settings(&self) -> &RestClientSettings {
        &self.settings
    }

    async fn send(
        &self,
        operation: &str,
        verb: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> SchemaClientResult<Value> {
        let url = format!("{}{path}", self.settings.endpoint);
        debug!(operation, %verb, url = %url, "sending backend request");

        let mut request = self
            .http
            .request(verb, &url)
            .header(PROJECT_HEADER, &self.settings.project_id)
            .header(KEY_HEADER, &self.settings.api_key)
            .header(header::ACCEPT, "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(SchemaClientError::transport)?;
        let status = response.status();
        let text = response.text().await.map_err(SchemaClientError::transport)?;

        if !status.is_success() {
            return Err(remote_error(status, &text).into());
        }
        if status == StatusCode::NO_CONTENT || text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|err| SchemaClientError::MalformedResponse {
            operation: operation.to_owned(),
            reason: err.to_string(),
        })
    }
}

#[async_trait]
impl SchemaClient for RestBackendClient {
    fn supports(&self, _method: SchemaMethod) -> bool {
        true
    }

    async fn call(&self, method: SchemaMethod, args: CallArgs) -> SchemaClientResult<Value> {
        let route = route(method, &args)?;
        self.send(method.as_str(), route.verb, &route.path, &[], route.body.as_ref())
            .await
    }
}

#[async_trait]
impl AccountDirectory for RestBackendClient {
    async fn find_user_by_email(&self, email: &str) -> SchemaClientResult<Option<UserAccount>> {
        let query = [("queries[]", equal_query("email", email))];
        let response = self
            .send("listUsers", Method::GET, "/users", &query, None)
            .await?;
        let list: UserList = decode("listUsers", response)?;
        Ok(list.users.into_iter().next().map(UserAccount::from))
    }

    async fn create_user(&self, account: &NewUserAccount) -> SchemaClientResult<UserAccount> {
        let body = json!({
            "userId": UNIQUE_ID,
            "email": account.email,
            "password": account.password,
            "name": account.name,
        });
        let response = self
            .send("createUser", Method::POST, "/users", &[], Some(&body))
            .await?;
        decode::<UserRecord>("createUser", response).map(UserAccount::from)
    }

    async fn find_document(
        &self,
        database_id: &DatabaseId,
        collection_id: &CollectionId,
        field: &str,
        value: &str,
    ) -> SchemaClientResult<Option<Value>> {
        let path = documents_path(database_id.as_str(), collection_id.as_str());
        let query = [
            ("queries[]", equal_query(field, value)),
            ("queries[]", json!({ "method": "limit", "values": [1] }).to_string()),
        ];
        let response = self
            .send("listDocuments", Method::GET, &path, &query, None)
            .await?;
        let list: DocumentList = decode("listDocuments", response)?;
        Ok(list.documents.into_iter().next())
    }

    async fn create_document(
        &self,
        database_id: &DatabaseId,
        collection_id: &CollectionId,
        data: &Map<String, Value>,
    ) -> SchemaClientResult<Value> {
        let path = documents_path(database_id.as_str(), collection_id.as_str());
        let body = json!({ "documentId": UNIQUE_ID, "data": data });
        self.send("createDocument", Method::POST, &path, &[], Some(&body))
            .await
    }
}

fn route(method: SchemaMethod, args: &CallArgs) -> SchemaClientResult<Route> {
    let database_id = param(args, method, "databaseId")?;
    let collection_id = param(args, method, "collectionId")?;
    let collections = format!("/databases/{database_id}/collections");
    let collection = format!("{collections}/{collection_id}");

    let (verb, path) = match method {
        SchemaMethod::GetCollection => (Method::GET, collection),
        SchemaMethod::CreateCollection => (Method::POST, collections),
        SchemaMethod::GetAttribute => (
            Method::GET,
            format!("{collection}/attributes/{}", param(args, method, "key")?),
        ),
        SchemaMethod::DeleteAttribute => (
            Method::DELETE,
            format!("{collection}/attributes/{}", param(args, method, "key")?),
        ),
        SchemaMethod::CreateStringAttribute => {
            (Method::POST, format!("{collection}/attributes/string"))
        }
        SchemaMethod::CreateBooleanAttribute => {
            (Method::POST, format!("{collection}/attributes/boolean"))
        }
        SchemaMethod::CreateIntegerAttribute => {
            (Method::POST, format!("{collection}/attributes/integer"))
        }
        SchemaMethod::CreateDatetimeAttribute => {
            (Method::POST, format!("{collection}/attributes/datetime"))
        }
        SchemaMethod::GetIndex => (
            Method::GET,
            format!("{collection}/indexes/{}", param(args, method, "key")?),
        ),
        SchemaMethod::DeleteIndex => (
            Method::DELETE,
            format!("{collection}/indexes/{}", param(args, method, "key")?),
        ),
        SchemaMethod::CreateIndex => (Method::POST, format!("{collection}/indexes")),
    };

    Ok(Route {
        verb,
        path,
        body: request_body(method, args),
    })
}

/// Collects the non-path parameters of a create call, skipping unset ones.
fn request_body(method: SchemaMethod, args: &CallArgs) -> Option<Value> {
    if !method.is_mutating()
        || matches!(
            method,
            SchemaMethod::DeleteAttribute | SchemaMethod::DeleteIndex
        )
    {
        return None;
    }
    let fields: Map<String, Value> = method
        .parameters()
        .iter()
        .filter(|name| {
            **name != "databaseId"
                && (**name != "collectionId" || method == SchemaMethod::CreateCollection)
        })
        .filter_map(|name| {
            args.get(method, name)
                .filter(|value| !value.is_null())
                .map(|value| ((*name).to_owned(), value.clone()))
        })
        .collect();
    Some(Value::Object(fields))
}

fn param<'a>(args: &'a CallArgs, method: SchemaMethod, name: &str) -> SchemaClientResult<&'a str> {
    args.get_str(method, name).ok_or_else(|| {
        RemoteError::new(400, format!("Param \"{name}\" is not optional.")).into()
    })
}

fn remote_error(status: StatusCode, body: &str) -> RemoteError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|parsed| parsed.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| body.trim().to_owned());
    RemoteError::new(status.as_u16(), message)
}

fn equal_query(attribute: &str, value: &str) -> String {
    json!({ "method": "equal", "attribute": attribute, "values": [value] }).to_string()
}

fn documents_path(database_id: &str, collection_id: &str) -> String {
    format!("/databases/{database_id}/collections/{collection_id}/documents")
}

fn decode<T: serde::de::DeserializeOwned>(operation: &str, value: Value) -> SchemaClientResult<T> {
    serde_json::from_value(value).map_err(|err| SchemaClientError::MalformedResponse {
        operation: operation.to_owned(),
        reason: err.to_string(),
    })
}
