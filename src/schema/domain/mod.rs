//! Domain model for schema reconciliation.
//!
//! Types here describe remote objects; nothing is persisted locally. The
//! remote backend is the source of truth and these values are either desired
//! shapes (specs) or decoded snapshots of what the backend reports.

mod attribute;
mod collection;
mod error;
mod ids;
mod index;
mod object_ref;
mod remote;
mod run;
mod status;

pub use attribute::{AttributeDefault, AttributeKind, AttributeSpec};
pub use collection::CollectionSpec;
pub use error::{ParseRemoteObjectStatusError, SchemaDomainError};
pub use ids::{AttributeKey, CollectionId, DatabaseId, IDENTIFIER_MAX_LENGTH, IndexKey};
pub use index::{IndexColumn, IndexSpec, IndexType, SortOrder};
pub use object_ref::{SchemaObjectKind, SchemaObjectRef};
pub use remote::{RemoteAttribute, RemoteCollection, RemoteIndex};
pub use run::{LedgerEntry, RunId, ScriptOutcome};
pub use status::RemoteObjectStatus;
