//! Simulated schema backend.

use crate::schema::{
    domain::{
        AttributeKey, CollectionId, DatabaseId, IDENTIFIER_MAX_LENGTH, IndexKey, IndexType,
        RemoteObjectStatus,
    },
    ports::{
        CallArgs, CallingConvention, RemoteError, SchemaClient, SchemaClientError,
        SchemaClientResult, SchemaMethod,
    },
};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, PoisonError, RwLock};

type CollectionKey = (String, String);
type ObjectKey = (String, String, String);
type OutcomeKey = (String, String);

/// One call observed by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Invoked method.
    pub method: SchemaMethod,
    /// Arguments as received.
    pub args: CallArgs,
}

/// Thread-safe simulated schema backend.
///
/// The backend accepts exactly one calling convention and rejects the other
/// the way a mismatched SDK would: the required parameters appear to be
/// missing.
#[derive(Debug, Clone)]
pub struct InMemorySchemaBackend {
    convention: CallingConvention,
    settle_reads: u32,
    unsupported: HashSet<SchemaMethod>,
    state: Arc<RwLock<BackendState>>,
}

#[derive(Debug, Default)]
struct BackendState {
    collections: HashMap<CollectionKey, StoredCollection>,
    attributes: HashMap<ObjectKey, StoredObject>,
    indexes: HashMap<ObjectKey, StoredObject>,
    calls: Vec<RecordedCall>,
    pending_failures: HashMap<SchemaMethod, VecDeque<RemoteError>>,
    attribute_outcomes: HashMap<OutcomeKey, Settlement>,
    index_outcomes: HashMap<OutcomeKey, Settlement>,
}

#[derive(Debug, Clone)]
struct StoredCollection {
    name: String,
    hidden_reads: u32,
}

#[derive(Debug, Clone)]
struct StoredObject {
    kind: String,
    status: RemoteObjectStatus,
    error: Option<String>,
    pending_reads: u32,
    settle_into: Settlement,
    required: bool,
    array: bool,
    default: Value,
    attributes: Vec<String>,
    orders: Vec<Value>,
}

#[derive(Debug, Clone)]
struct Settlement {
    status: RemoteObjectStatus,
    error: Option<String>,
}

impl Settlement {
    const fn available() -> Self {
        Self {
            status: RemoteObjectStatus::Available,
            error: None,
        }
    }
}

impl StoredObject {
    fn settled(kind: impl Into<String>, status: RemoteObjectStatus) -> Self {
        Self {
            kind: kind.into(),
            status,
            error: None,
            pending_reads: 0,
            settle_into: Settlement::available(),
            required: false,
            array: false,
            default: Value::Null,
            attributes: Vec::new(),
            orders: Vec::new(),
        }
    }

    /// Advances the simulated state machine by one read.
    ///
    /// Returns `false` once a deleting object has gone.
    fn read(&mut self) -> bool {
        if self.pending_reads > 0 {
            self.pending_reads -= 1;
            return true;
        }
        match self.status {
            RemoteObjectStatus::Processing => {
                self.status = self.settle_into.status;
                self.error.clone_from(&self.settle_into.error);
                true
            }
            RemoteObjectStatus::Deleting => false,
            _ => true,
        }
    }

    fn attribute_json(&self, key: &str) -> Value {
        json!({
            "key": key,
            "type": self.kind,
            "status": self.status.as_str(),
            "error": self.error.clone().unwrap_or_default(),
            "required": self.required,
            "array": self.array,
            "default": self.default,
        })
    }

    fn index_json(&self, key: &str) -> Value {
        json!({
            "key": key,
            "type": self.kind,
            "status": self.status.as_str(),
            "error": self.error.clone().unwrap_or_default(),
            "attributes": self.attributes,
            "orders": self.orders,
        })
    }
}

impl Default for InMemorySchemaBackend {
    fn default() -> Self {
        Self::new(CallingConvention::default())
    }
}

impl InMemorySchemaBackend {
    /// Creates an empty backend accepting `convention`.
    #[must_use]
    pub fn new(convention: CallingConvention) -> Self {
        Self {
            convention,
            settle_reads: 1,
            unsupported: HashSet::new(),
            state: Arc::default(),
        }
    }

    /// Sets how many reads report a transitional state after a mutation.
    #[must_use]
    pub const fn with_settle_reads(mut self, reads: u32) -> Self {
        self.settle_reads = reads;
        self
    }

    /// Removes `method` from the client surface.
    #[must_use]
    pub fn without_method(mut self, method: SchemaMethod) -> Self {
        self.unsupported.insert(method);
        self
    }

    /// Returns the accepted calling convention.
    #[must_use]
    pub const fn convention(&self) -> CallingConvention {
        self.convention
    }

    /// Makes the next call to `method` fail with `error`.
    pub fn fail_next(&self, method: SchemaMethod, error: RemoteError) {
        self.write_state()
            .pending_failures
            .entry(method)
            .or_default()
            .push_back(error);
    }

    /// Makes the attribute settle into `status` with `message` once created.
    pub fn fail_attribute(
        &self,
        collection_id: &CollectionId,
        key: &AttributeKey,
        status: RemoteObjectStatus,
        message: impl Into<String>,
    ) {
        let settlement = Settlement {
            status,
            error: Some(message.into()),
        };
        self.write_state()
            .attribute_outcomes
            .insert(outcome_key(collection_id, key.as_str()), settlement);
    }

    /// Makes the index settle into `status` with `message` once created.
    pub fn fail_index(
        &self,
        collection_id: &CollectionId,
        key: &IndexKey,
        status: RemoteObjectStatus,
        message: impl Into<String>,
    ) {
        let settlement = Settlement {
            status,
            error: Some(message.into()),
        };
        self.write_state()
            .index_outcomes
            .insert(outcome_key(collection_id, key.as_str()), settlement);
    }

    /// Seeds a visible collection.
    pub fn insert_collection(
        &self,
        database_id: &DatabaseId,
        collection_id: &CollectionId,
        name: impl Into<String>,
    ) {
        self.write_state().collections.insert(
            (database_id.to_string(), collection_id.to_string()),
            StoredCollection {
                name: name.into(),
                hidden_reads: 0,
            },
        );
    }

    /// Seeds an attribute in the given status.
    ///
    /// An attribute seeded as deleting stays visible for the configured
    /// number of reads before it disappears.
    pub fn insert_attribute(
        &self,
        database_id: &DatabaseId,
        collection_id: &CollectionId,
        key: &AttributeKey,
        kind: &str,
        status: RemoteObjectStatus,
    ) {
        let attribute = self.seeded(StoredObject::settled(kind, status));
        self.write_state().attributes.insert(
            object_key(database_id.as_str(), collection_id.as_str(), key.as_str()),
            attribute,
        );
    }

    fn seeded(&self, mut object: StoredObject) -> StoredObject {
        if object.status == RemoteObjectStatus::Deleting {
            object.pending_reads = self.settle_reads;
        }
        object
    }

    /// Seeds an index in the given status.
    ///
    /// Like attributes, an index seeded as deleting lingers for the
    /// configured number of reads.
    pub fn insert_index(
        &self,
        database_id: &DatabaseId,
        collection_id: &CollectionId,
        key: &IndexKey,
        index_type: IndexType,
        attributes: &[&str],
        status: RemoteObjectStatus,
    ) {
        let mut index = self.seeded(StoredObject::settled(index_type.as_str(), status));
        index.attributes = attributes.iter().map(|&key| key.to_owned()).collect();
        index.orders = attributes.iter().map(|_| json!("ASC")).collect();
        self.write_state().indexes.insert(
            object_key(database_id.as_str(), collection_id.as_str(), key.as_str()),
            index,
        );
    }

    /// Returns whether a collection exists, visible or not.
    #[must_use]
    pub fn has_collection(&self, database_id: &DatabaseId, collection_id: &CollectionId) -> bool {
        self.read_state()
            .collections
            .contains_key(&(database_id.to_string(), collection_id.to_string()))
    }

    /// Returns the stored status of an attribute without advancing it.
    #[must_use]
    pub fn attribute_status(
        &self,
        database_id: &DatabaseId,
        collection_id: &CollectionId,
        key: &AttributeKey,
    ) -> Option<RemoteObjectStatus> {
        self.read_state()
            .attributes
            .get(&object_key(database_id.as_str(), collection_id.as_str(), key.as_str()))
            .map(|attribute| attribute.status)
    }

    /// Returns the stored default of an attribute without advancing it.
    #[must_use]
    pub fn attribute_default(
        &self,
        database_id: &DatabaseId,
        collection_id: &CollectionId,
        key: &AttributeKey,
    ) -> Option<Value> {
        self.read_state()
            .attributes
            .get(&object_key(database_id.as_str(), collection_id.as_str(), key.as_str()))
            .map(|attribute| attribute.default.clone())
    }

    /// Returns the attributes covered by an index without advancing it.
    #[must_use]
    pub fn index_attributes(
        &self,
        database_id: &DatabaseId,
        collection_id: &CollectionId,
        key: &IndexKey,
    ) -> Option<Vec<String>> {
        self.read_state()
            .indexes
            .get(&object_key(database_id.as_str(), collection_id.as_str(), key.as_str()))
            .map(|index| index.attributes.clone())
    }

    /// Returns every call received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.read_state().calls.clone()
    }

    /// Returns the mutating calls received so far.
    #[must_use]
    pub fn mutating_calls(&self) -> Vec<RecordedCall> {
        self.read_state()
            .calls
            .iter()
            .filter(|call| call.method.is_mutating())
            .cloned()
            .collect()
    }

    /// Returns the methods invoked so far, in order.
    #[must_use]
    pub fn methods(&self) -> Vec<SchemaMethod> {
        self.read_state().calls.iter().map(|call| call.method).collect()
    }

    /// Forgets recorded calls.
    pub fn clear_calls(&self) {
        self.write_state().calls.clear();
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, BackendState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, BackendState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(
        &self,
        state: &mut BackendState,
        method: SchemaMethod,
        args: &CallArgs,
    ) -> Result<Value, RemoteError> {
        let database_id = required_str(args, method, "databaseId")?;
        let collection_id = required_str(args, method, "collectionId")?;
        let collection_key = (database_id.to_owned(), collection_id.to_owned());

        match method {
            SchemaMethod::GetCollection => {
                let collection = state
                    .collections
                    .get_mut(&collection_key)
                    .ok_or_else(collection_not_found)?;
                if collection.hidden_reads > 0 {
                    collection.hidden_reads -= 1;
                    return Err(collection_not_found());
                }
                Ok(json!({ "$id": collection_id, "name": collection.name }))
            }
            SchemaMethod::CreateCollection => {
                check_identifier(collection_id)?;
                if state.collections.contains_key(&collection_key) {
                    return Err(RemoteError::conflict(
                        "Collection with the requested ID already exists.",
                    ));
                }
                let name = required_str(args, method, "name")?.to_owned();
                let response = json!({ "$id": collection_id, "name": name });
                state.collections.insert(
                    collection_key,
                    StoredCollection {
                        name,
                        hidden_reads: self.settle_reads,
                    },
                );
                Ok(response)
            }
            SchemaMethod::GetAttribute => {
                ensure_collection(state, &collection_key)?;
                let key = required_str(args, method, "key")?;
                let object = object_key(database_id, collection_id, key);
                read_object(&mut state.attributes, &object, attribute_not_found)
                    .map(|attribute| attribute.attribute_json(key))
            }
            SchemaMethod::CreateStringAttribute
            | SchemaMethod::CreateBooleanAttribute
            | SchemaMethod::CreateIntegerAttribute
            | SchemaMethod::CreateDatetimeAttribute => {
                ensure_collection(state, &collection_key)?;
                let key = required_str(args, method, "key")?;
                check_identifier(key)?;
                let object = object_key(database_id, collection_id, key);
                if state.attributes.contains_key(&object) {
                    return Err(RemoteError::conflict(
                        "Attribute with the requested key already exists.",
                    ));
                }
                let attribute = self.new_attribute(state, method, args, &object)?;
                let response = attribute.attribute_json(key);
                state.attributes.insert(object, attribute);
                Ok(response)
            }
            SchemaMethod::DeleteAttribute => {
                ensure_collection(state, &collection_key)?;
                let key = required_str(args, method, "key")?;
                let object = object_key(database_id, collection_id, key);
                self.begin_removal(&mut state.attributes, &object, attribute_not_found)
            }
            SchemaMethod::GetIndex => {
                ensure_collection(state, &collection_key)?;
                let key = required_str(args, method, "key")?;
                let object = object_key(database_id, collection_id, key);
                read_object(&mut state.indexes, &object, index_not_found)
                    .map(|index| index.index_json(key))
            }
            SchemaMethod::CreateIndex => {
                ensure_collection(state, &collection_key)?;
                let key = required_str(args, method, "key")?;
                check_identifier(key)?;
                let object = object_key(database_id, collection_id, key);
                if state.indexes.contains_key(&object) {
                    return Err(RemoteError::conflict(
                        "Index with the requested key already exists.",
                    ));
                }
                let index = self.new_index(state, method, args, &object)?;
                let response = index.index_json(key);
                state.indexes.insert(object, index);
                Ok(response)
            }
            SchemaMethod::DeleteIndex => {
                ensure_collection(state, &collection_key)?;
                let key = required_str(args, method, "key")?;
                let object = object_key(database_id, collection_id, key);
                self.begin_removal(&mut state.indexes, &object, index_not_found)
            }
        }
    }

    fn new_attribute(
        &self,
        state: &BackendState,
        method: SchemaMethod,
        args: &CallArgs,
        object: &ObjectKey,
    ) -> Result<StoredObject, RemoteError> {
        let kind = match method {
            SchemaMethod::CreateStringAttribute => "string",
            SchemaMethod::CreateBooleanAttribute => "boolean",
            SchemaMethod::CreateIntegerAttribute => "integer",
            SchemaMethod::CreateDatetimeAttribute => "datetime",
            other => {
                return Err(RemoteError::new(
                    400,
                    format!("{other} does not create an attribute"),
                ));
            }
        };
        let required = args
            .get(method, "required")
            .and_then(Value::as_bool)
            .ok_or_else(|| missing_param("required"))?;
        let default = args.get(method, "default").cloned().unwrap_or(Value::Null);
        if required && !default.is_null() {
            return Err(RemoteError::new(
                400,
                "Cannot set default value for required attribute",
            ));
        }
        if method == SchemaMethod::CreateIntegerAttribute
            && let Some(value) = default.as_i64()
        {
            let min = args.get(method, "min").and_then(Value::as_i64);
            let max = args.get(method, "max").and_then(Value::as_i64);
            if min.is_some_and(|min| value < min) || max.is_some_and(|max| value > max) {
                return Err(RemoteError::new(
                    400,
                    "Default value should be between min and max",
                ));
            }
        }

        Ok(StoredObject {
            kind: kind.to_owned(),
            status: RemoteObjectStatus::Processing,
            error: None,
            pending_reads: self.settle_reads,
            settle_into: state
                .attribute_outcomes
                .get(&(object.1.clone(), object.2.clone()))
                .cloned()
                .unwrap_or_else(Settlement::available),
            required,
            array: args
                .get(method, "array")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            default,
            attributes: Vec::new(),
            orders: Vec::new(),
        })
    }

    fn new_index(
        &self,
        state: &BackendState,
        method: SchemaMethod,
        args: &CallArgs,
        object: &ObjectKey,
    ) -> Result<StoredObject, RemoteError> {
        let index_type = required_str(args, method, "type")?.to_owned();
        let attributes: Vec<String> = args
            .get(method, "attributes")
            .and_then(Value::as_array)
            .ok_or_else(|| missing_param("attributes"))?
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect();
        for attribute in &attributes {
            let available = state
                .attributes
                .get(&object_key(&object.0, &object.1, attribute))
                .is_some_and(|stored| stored.status.is_available());
            if !available {
                return Err(RemoteError::new(
                    400,
                    format!("Attribute not available: {attribute}"),
                ));
            }
        }
        let orders = args
            .get(method, "orders")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(StoredObject {
            kind: index_type,
            status: RemoteObjectStatus::Processing,
            error: None,
            pending_reads: self.settle_reads,
            settle_into: state
                .index_outcomes
                .get(&(object.1.clone(), object.2.clone()))
                .cloned()
                .unwrap_or_else(Settlement::available),
            required: false,
            array: false,
            default: Value::Null,
            attributes,
            orders,
        })
    }

    fn begin_removal(
        &self,
        objects: &mut HashMap<ObjectKey, StoredObject>,
        object: &ObjectKey,
        not_found: fn() -> RemoteError,
    ) -> Result<Value, RemoteError> {
        let stored = objects.get_mut(object).ok_or_else(not_found)?;
        if stored.status == RemoteObjectStatus::Deleting {
            return Err(not_found());
        }
        stored.status = RemoteObjectStatus::Deleting;
        stored.pending_reads = self.settle_reads;
        Ok(Value::Null)
    }
}

#[async_trait]
impl SchemaClient for InMemorySchemaBackend {
    fn supports(&self, method: SchemaMethod) -> bool {
        !self.unsupported.contains(&method)
    }

    async fn call(&self, method: SchemaMethod, args: CallArgs) -> SchemaClientResult<Value> {
        let mut state = self.state.write().map_err(|err| {
            SchemaClientError::transport(std::io::Error::other(err.to_string()))
        })?;
        state.calls.push(RecordedCall {
            method,
            args: args.clone(),
        });

        if args.convention() != self.convention {
            return Err(missing_param("databaseId").into());
        }
        if let Some(error) = state
            .pending_failures
            .get_mut(&method)
            .and_then(VecDeque::pop_front)
        {
            return Err(error.into());
        }

        self.dispatch(&mut state, method, &args)
            .map_err(SchemaClientError::from)
    }
}

fn read_object<'a>(
    objects: &'a mut HashMap<ObjectKey, StoredObject>,
    object: &ObjectKey,
    not_found: fn() -> RemoteError,
) -> Result<&'a StoredObject, RemoteError> {
    let gone = match objects.get_mut(object) {
        None => return Err(not_found()),
        Some(stored) => !stored.read(),
    };
    if gone {
        objects.remove(object);
        return Err(not_found());
    }
    objects.get(object).ok_or_else(not_found)
}

fn ensure_collection(state: &BackendState, key: &CollectionKey) -> Result<(), RemoteError> {
    if state.collections.contains_key(key) {
        Ok(())
    } else {
        Err(collection_not_found())
    }
}

fn required_str<'a>(
    args: &'a CallArgs,
    method: SchemaMethod,
    name: &str,
) -> Result<&'a str, RemoteError> {
    args.get_str(method, name).ok_or_else(|| missing_param(name))
}

fn check_identifier(value: &str) -> Result<(), RemoteError> {
    if value.chars().count() > IDENTIFIER_MAX_LENGTH {
        return Err(RemoteError::new(
            400,
            format!("Invalid key: must contain at most {IDENTIFIER_MAX_LENGTH} chars"),
        ));
    }
    Ok(())
}

fn missing_param(name: &str) -> RemoteError {
    RemoteError::new(400, format!("Param \"{name}\" is not optional."))
}

fn collection_not_found() -> RemoteError {
    RemoteError::not_found("Collection with the requested ID could not be found.")
}

fn attribute_not_found() -> RemoteError {
    RemoteError::not_found("Attribute with the requested ID could not be found.")
}

fn index_not_found() -> RemoteError {
    RemoteError::not_found("Index not found")
}

fn object_key(database_id: &str, collection_id: &str, key: &str) -> ObjectKey {
    (database_id.to_owned(), collection_id.to_owned(), key.to_owned())
}

fn outcome_key(collection_id: &CollectionId, key: &str) -> OutcomeKey {
    (collection_id.to_string(), key.to_owned())
}
