//! In-memory account directory.

use crate::schema::{
    domain::{CollectionId, DatabaseId},
    ports::{
        AccountDirectory, NewUserAccount, RemoteError, SchemaClientError, SchemaClientResult,
        UserAccount,
    },
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

/// Thread-safe in-memory auth identities and document rows.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccountDirectory {
    state: Arc<RwLock<DirectoryState>>,
}

#[derive(Debug, Default)]
struct DirectoryState {
    users: Vec<UserAccount>,
    documents: HashMap<(String, String), Vec<Value>>,
    created_users: usize,
    created_documents: usize,
    next_user_creation: Option<UserCreationFault>,
}

#[derive(Debug)]
enum UserCreationFault {
    Reject(RemoteError),
    LoseRace,
}

impl InMemoryAccountDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an existing user and returns it.
    pub fn insert_user(&self, email: &str, name: &str) -> UserAccount {
        let user = UserAccount {
            id: Uuid::new_v4().simple().to_string(),
            email: email.to_owned(),
            name: name.to_owned(),
        };
        self.write_state().users.push(user.clone());
        user
    }

    /// Seeds an existing document and returns it with its identifier.
    pub fn insert_document(
        &self,
        database_id: &DatabaseId,
        collection_id: &CollectionId,
        data: Map<String, Value>,
    ) -> Value {
        let document = with_document_id(data);
        self.write_state()
            .documents
            .entry(document_key(database_id, collection_id))
            .or_default()
            .push(document.clone());
        document
    }

    /// Makes the next user creation fail with `error`.
    pub fn reject_next_user_creation(&self, error: RemoteError) {
        self.write_state().next_user_creation = Some(UserCreationFault::Reject(error));
    }

    /// Makes the next user creation store the user and still report a
    /// conflict, as if a concurrent writer got there first.
    pub fn lose_next_user_creation_race(&self) {
        self.write_state().next_user_creation = Some(UserCreationFault::LoseRace);
    }

    /// Returns every stored user.
    #[must_use]
    pub fn users(&self) -> Vec<UserAccount> {
        self.read_state().users.clone()
    }

    /// Returns every document stored in a collection.
    #[must_use]
    pub fn documents(&self, database_id: &DatabaseId, collection_id: &CollectionId) -> Vec<Value> {
        self.read_state()
            .documents
            .get(&document_key(database_id, collection_id))
            .cloned()
            .unwrap_or_default()
    }

    /// Returns how many users were created through the port.
    #[must_use]
    pub fn created_user_count(&self) -> usize {
        self.read_state().created_users
    }

    /// Returns how many documents were created through the port.
    #[must_use]
    pub fn created_document_count(&self) -> usize {
        self.read_state().created_documents
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, DirectoryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, DirectoryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock(&self) -> SchemaClientResult<std::sync::RwLockWriteGuard<'_, DirectoryState>> {
        self.state
            .write()
            .map_err(|err| SchemaClientError::transport(std::io::Error::other(err.to_string())))
    }
}

#[async_trait]
impl AccountDirectory for InMemoryAccountDirectory {
    async fn find_user_by_email(&self, email: &str) -> SchemaClientResult<Option<UserAccount>> {
        let state = self.lock()?;
        Ok(state
            .users
            .iter()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create_user(&self, account: &NewUserAccount) -> SchemaClientResult<UserAccount> {
        let mut state = self.lock()?;
        let user = UserAccount {
            id: Uuid::new_v4().simple().to_string(),
            email: account.email.clone(),
            name: account.name.clone(),
        };
        match state.next_user_creation.take() {
            Some(UserCreationFault::Reject(error)) => return Err(error.into()),
            Some(UserCreationFault::LoseRace) => {
                state.users.push(user);
                return Err(user_conflict().into());
            }
            None => {}
        }
        if state
            .users
            .iter()
            .any(|existing| existing.email.eq_ignore_ascii_case(&account.email))
        {
            return Err(user_conflict().into());
        }
        state.users.push(user.clone());
        state.created_users += 1;
        Ok(user)
    }

    async fn find_document(
        &self,
        database_id: &DatabaseId,
        collection_id: &CollectionId,
        field: &str,
        value: &str,
    ) -> SchemaClientResult<Option<Value>> {
        let state = self.lock()?;
        Ok(state
            .documents
            .get(&document_key(database_id, collection_id))
            .and_then(|documents| {
                documents
                    .iter()
                    .find(|document| document.get(field).and_then(Value::as_str) == Some(value))
            })
            .cloned())
    }

    async fn create_document(
        &self,
        database_id: &DatabaseId,
        collection_id: &CollectionId,
        data: &Map<String, Value>,
    ) -> SchemaClientResult<Value> {
        let mut state = self.lock()?;
        let document = with_document_id(data.clone());
        state
            .documents
            .entry(document_key(database_id, collection_id))
            .or_default()
            .push(document.clone());
        state.created_documents += 1;
        Ok(document)
    }
}

fn with_document_id(mut data: Map<String, Value>) -> Value {
    data.insert(
        "$id".to_owned(),
        Value::String(Uuid::new_v4().simple().to_string()),
    );
    Value::Object(data)
}

fn document_key(database_id: &DatabaseId, collection_id: &CollectionId) -> (String, String) {
    (database_id.to_string(), collection_id.to_string())
}

fn user_conflict() -> RemoteError {
    RemoteError::conflict("A user with the same id, email, or phone already exists.")
}
