//! Calling-convention adapter over a raw schema client.
//!
//! [`RemoteSchema`] is the only place that builds SDK arguments. It renders
//! every call in the convention fixed at construction and decodes responses
//! into domain snapshots.

use crate::schema::{
    domain::{
        AttributeKey, AttributeKind, AttributeSpec, CollectionId, CollectionSpec, DatabaseId,
        IndexKey, IndexSpec, RemoteAttribute, RemoteCollection, RemoteIndex,
    },
    ports::{
        CallParams, CallingConvention, SchemaClient, SchemaClientError, SchemaClientResult,
        SchemaMethod,
    },
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

/// Typed façade over a [`SchemaClient`] with a fixed calling convention.
#[derive(Clone)]
pub struct RemoteSchema {
    client: Arc<dyn SchemaClient>,
    convention: CallingConvention,
}

impl RemoteSchema {
    /// Creates an adapter that renders every call in `convention`.
    #[must_use]
    pub fn new(client: Arc<dyn SchemaClient>, convention: CallingConvention) -> Self {
        Self { client, convention }
    }

    /// Returns the configured calling convention.
    #[must_use]
    pub const fn convention(&self) -> CallingConvention {
        self.convention
    }

    /// Invokes a method with the given parameters.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaClientError::MethodNotFound`] when the client does not
    /// expose the method, or the client's own error.
    pub async fn invoke(&self, params: CallParams) -> SchemaClientResult<Value> {
        let method = params.method();
        if !self.client.supports(method) {
            return Err(SchemaClientError::MethodNotFound(method));
        }
        trace!(method = %method, convention = %self.convention, "invoking schema method");
        self.client
            .call(method, params.into_args(self.convention))
            .await
    }

    /// Fetches a collection.
    ///
    /// # Errors
    ///
    /// Returns client errors, including not-found when the collection is
    /// absent.
    pub async fn get_collection(
        &self,
        database_id: &DatabaseId,
        collection_id: &CollectionId,
    ) -> SchemaClientResult<RemoteCollection> {
        let method = SchemaMethod::GetCollection;
        let response = self
            .invoke(scoped(method, database_id, collection_id))
            .await?;
        decode(method, response)
    }

    /// Creates a collection.
    ///
    /// # Errors
    ///
    /// Returns client errors, including already-exists.
    pub async fn create_collection(
        &self,
        database_id: &DatabaseId,
        spec: &CollectionSpec,
    ) -> SchemaClientResult<Value> {
        let params = scoped(SchemaMethod::CreateCollection, database_id, spec.id())
            .with("name", spec.name())
            .with("documentSecurity", spec.document_security());
        self.invoke(params).await
    }

    /// Fetches an attribute with its processing status.
    ///
    /// # Errors
    ///
    /// Returns client errors, including not-found when the attribute is
    /// absent.
    pub async fn get_attribute(
        &self,
        database_id: &DatabaseId,
        collection_id: &CollectionId,
        key: &AttributeKey,
    ) -> SchemaClientResult<RemoteAttribute> {
        let method = SchemaMethod::GetAttribute;
        let params = scoped(method, database_id, collection_id).with("key", key.as_str());
        let response = self.invoke(params).await?;
        decode(method, response)
    }

    /// Creates an attribute using the create method matching its kind.
    ///
    /// The submitted `default` is always
    /// [`AttributeSpec::effective_default`], so required attributes are sent
    /// with a `null` default.
    ///
    /// # Errors
    ///
    /// Returns client errors, including already-exists.
    pub async fn create_attribute(
        &self,
        database_id: &DatabaseId,
        collection_id: &CollectionId,
        spec: &AttributeSpec,
    ) -> SchemaClientResult<Value> {
        let default = spec
            .effective_default()
            .map_or(Value::Null, |value| value.to_json());

        let params = match spec.kind() {
            AttributeKind::String { size } => {
                scoped(SchemaMethod::CreateStringAttribute, database_id, collection_id)
                    .with("size", size)
            }
            AttributeKind::Boolean => {
                scoped(SchemaMethod::CreateBooleanAttribute, database_id, collection_id)
            }
            AttributeKind::Integer { min, max } => {
                scoped(SchemaMethod::CreateIntegerAttribute, database_id, collection_id)
                    .with("min", min)
                    .with("max", max)
            }
            AttributeKind::Datetime => {
                scoped(SchemaMethod::CreateDatetimeAttribute, database_id, collection_id)
            }
        };

        let params = params
            .with("key", spec.key().as_str())
            .with("required", spec.is_required())
            .with("default", default)
            .with("array", spec.is_array());
        self.invoke(params).await
    }

    /// Deletes an attribute.
    ///
    /// # Errors
    ///
    /// Returns client errors, including not-found.
    pub async fn delete_attribute(
        &self,
        database_id: &DatabaseId,
        collection_id: &CollectionId,
        key: &AttributeKey,
    ) -> SchemaClientResult<Value> {
        let params = scoped(SchemaMethod::DeleteAttribute, database_id, collection_id)
            .with("key", key.as_str());
        self.invoke(params).await
    }

    /// Fetches an index with its processing status.
    ///
    /// # Errors
    ///
    /// Returns client errors, including not-found when the index is absent.
    pub async fn get_index(
        &self,
        database_id: &DatabaseId,
        collection_id: &CollectionId,
        key: &IndexKey,
    ) -> SchemaClientResult<RemoteIndex> {
        let method = SchemaMethod::GetIndex;
        let params = scoped(method, database_id, collection_id).with("key", key.as_str());
        let response = self.invoke(params).await?;
        decode(method, response)
    }

    /// Creates an index.
    ///
    /// # Errors
    ///
    /// Returns client errors, including already-exists.
    pub async fn create_index(
        &self,
        database_id: &DatabaseId,
        collection_id: &CollectionId,
        spec: &IndexSpec,
    ) -> SchemaClientResult<Value> {
        let attributes: Vec<Value> = spec
            .attributes()
            .map(|attribute| Value::from(attribute.as_str()))
            .collect();
        let orders: Vec<Value> = spec
            .orders()
            .map(|order| Value::from(order.as_str()))
            .collect();

        let params = scoped(SchemaMethod::CreateIndex, database_id, collection_id)
            .with("key", spec.key().as_str())
            .with("type", spec.index_type().as_str())
            .with("attributes", attributes)
            .with("orders", orders);
        self.invoke(params).await
    }

    /// Deletes an index.
    ///
    /// # Errors
    ///
    /// Returns client errors, including not-found.
    pub async fn delete_index(
        &self,
        database_id: &DatabaseId,
        collection_id: &CollectionId,
        key: &IndexKey,
    ) -> SchemaClientResult<Value> {
        let params =
            scoped(SchemaMethod::DeleteIndex, database_id, collection_id).with("key", key.as_str());
        self.invoke(params).await
    }
}

fn scoped(
    method: SchemaMethod,
    database_id: &DatabaseId,
    collection_id: &CollectionId,
) -> CallParams {
    CallParams::new(method)
        .with("databaseId", database_id.as_str())
        .with("collectionId", collection_id.as_str())
}

fn decode<T: DeserializeOwned>(method: SchemaMethod, response: Value) -> SchemaClientResult<T> {
    serde_json::from_value(response).map_err(|err| SchemaClientError::MalformedResponse {
        operation: method.as_str().to_owned(),
        reason: err.to_string(),
    })
}
