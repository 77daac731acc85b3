//! Idempotent create-if-absent ensurers.
//!
//! Every ensurer follows the same template: probe for the object, create it
//! through the tolerance policy when absent, poll until the backend reports
//! it ready (or terminally failed), then pause briefly so the backend's read
//! path catches up. Objects that are already available short-circuit after
//! the probe, so re-running an ensurer against converged state issues no
//! mutating calls.

use super::{
    ConvergencePoller, ExistenceProbe, PollFailure, PollSettings, ReconcileError, TolerancePolicy,
};
use crate::schema::{
    adapters::RemoteSchema,
    domain::{
        AttributeKey, AttributeSpec, CollectionId, CollectionSpec, DatabaseId, IndexKey,
        IndexSpec, RemoteAttribute, RemoteIndex, RemoteObjectStatus, SchemaObjectRef, SortOrder,
    },
    ports::SchemaClientError,
};
use tracing::{debug, info, warn};

/// Result of an ensure call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnsureOutcome {
    /// This call created the object.
    Created,
    /// The object already existed, or a concurrent writer created it first.
    AlreadyPresent,
}

/// Result of a delete-if-present call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemovalOutcome {
    /// This call deleted the object.
    Deleted,
    /// The object was already gone.
    AlreadyAbsent,
}

/// Result of replacing one index with another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Supersession {
    /// What happened to the old index.
    pub removed: RemovalOutcome,
    /// What happened to the replacement index.
    pub ensured: EnsureOutcome,
}

/// Drives remote schema objects toward their desired shapes.
#[derive(Clone)]
pub struct SchemaEnsurer {
    remote: RemoteSchema,
    database_id: DatabaseId,
    probe: ExistenceProbe,
    policy: TolerancePolicy,
    poller: ConvergencePoller,
}

impl SchemaEnsurer {
    /// Creates an ensurer with the default probe, policy, and poll settings.
    #[must_use]
    pub fn new(remote: RemoteSchema, database_id: DatabaseId) -> Self {
        Self {
            remote,
            database_id,
            probe: ExistenceProbe::default(),
            policy: TolerancePolicy::default(),
            poller: ConvergencePoller::default(),
        }
    }

    /// Replaces the existence probe.
    #[must_use]
    pub fn with_probe(mut self, probe: ExistenceProbe) -> Self {
        self.probe = probe;
        self
    }

    /// Replaces the tolerance policy applied to mutating calls.
    #[must_use]
    pub fn with_policy(mut self, policy: TolerancePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the poll settings.
    #[must_use]
    pub fn with_poll_settings(mut self, settings: PollSettings) -> Self {
        self.poller = ConvergencePoller::new(settings);
        self
    }

    /// Returns the target database.
    #[must_use]
    pub const fn database_id(&self) -> &DatabaseId {
        &self.database_id
    }

    /// Returns the existence probe.
    #[must_use]
    pub const fn probe(&self) -> &ExistenceProbe {
        &self.probe
    }

    /// Returns the tolerance policy applied to mutating calls.
    #[must_use]
    pub const fn policy(&self) -> &TolerancePolicy {
        &self.policy
    }

    /// Returns the underlying remote adapter.
    #[must_use]
    pub const fn remote(&self) -> &RemoteSchema {
        &self.remote
    }

    /// Ensures a collection exists.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when validation fails, the create call is
    /// rejected, or the collection never becomes visible.
    pub async fn ensure_collection(
        &self,
        spec: &CollectionSpec,
    ) -> Result<EnsureOutcome, ReconcileError> {
        spec.validate()?;
        let label = SchemaObjectRef::collection(spec.id().clone()).to_string();

        let existing = self
            .probe
            .try_get(&label, move || {
                self.remote.get_collection(&self.database_id, spec.id())
            })
            .await?;
        if existing.is_some() {
            debug!(collection = %spec.id(), "collection already present");
            return Ok(EnsureOutcome::AlreadyPresent);
        }

        let created = self
            .policy
            .guard(&label, move || {
                self.remote.create_collection(&self.database_id, spec)
            })
            .await?;
        self.wait_for_collection_ready(spec.id()).await?;
        self.poller.settle().await;

        let outcome = creation_outcome(created.is_some());
        info!(collection = %spec.id(), ?outcome, "collection ensured");
        Ok(outcome)
    }

    /// Ensures an attribute exists and is available.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::TerminalFailure`] when the backend fails the
    /// attribute, [`ReconcileError::ConvergenceTimeout`] when it never
    /// settles, and other [`ReconcileError`] variants for rejected calls.
    pub async fn ensure_attribute(
        &self,
        collection_id: &CollectionId,
        spec: &AttributeSpec,
    ) -> Result<EnsureOutcome, ReconcileError> {
        spec.validate()?;
        let object = SchemaObjectRef::attribute(collection_id.clone(), spec.key());
        let label = object.to_string();

        let existing = self
            .probe
            .try_get(&label, move || {
                self.remote
                    .get_attribute(&self.database_id, collection_id, spec.key())
            })
            .await?;
        match existing {
            Some(attribute) if attribute.status == RemoteObjectStatus::Deleting => {
                debug!(%object, "attribute is being deleted; recreating once it is gone");
                self.wait_for_attribute_removed(collection_id, spec.key())
                    .await?;
            }
            Some(attribute) => {
                if attribute.status.is_available() {
                    debug!(%object, "attribute already available");
                    return Ok(EnsureOutcome::AlreadyPresent);
                }
                reject_terminal(&object, attribute.status, attribute.diagnostic())?;
                self.wait_for_attribute_ready(collection_id, spec.key())
                    .await?;
                self.poller.settle().await;
                return Ok(EnsureOutcome::AlreadyPresent);
            }
            None => {}
        }

        let created = self
            .policy
            .guard(&label, move || {
                self.remote
                    .create_attribute(&self.database_id, collection_id, spec)
            })
            .await?;
        self.wait_for_attribute_ready(collection_id, spec.key())
            .await?;
        self.poller.settle().await;

        let outcome = creation_outcome(created.is_some());
        info!(%object, kind = spec.kind().name(), ?outcome, "attribute ensured");
        Ok(outcome)
    }

    /// Ensures an index exists and is available.
    ///
    /// Before the create call every indexed attribute must be observed as
    /// available; the backend rejects indexes over attributes that are still
    /// processing.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when an indexed attribute or the index
    /// itself fails or never settles, or when a call is rejected.
    pub async fn ensure_index(
        &self,
        collection_id: &CollectionId,
        spec: &IndexSpec,
    ) -> Result<EnsureOutcome, ReconcileError> {
        spec.validate()?;
        let object = SchemaObjectRef::index(collection_id.clone(), spec.key());
        let label = object.to_string();

        let existing = self.probe_index(&label, collection_id, spec.key()).await?;
        match existing {
            Some(index) if index.status == RemoteObjectStatus::Deleting => {
                debug!(%object, "index is being deleted; recreating once it is gone");
                self.wait_for_index_removed(collection_id, spec.key()).await?;
            }
            Some(index) => {
                if index.status.is_available() {
                    debug!(%object, "index already available");
                    return Ok(EnsureOutcome::AlreadyPresent);
                }
                reject_terminal(&object, index.status, index.diagnostic())?;
                self.wait_for_index_ready(collection_id, spec.key()).await?;
                self.poller.settle().await;
                return Ok(EnsureOutcome::AlreadyPresent);
            }
            None => {}
        }

        for attribute in spec.attributes() {
            self.wait_for_attribute_ready(collection_id, attribute)
                .await?;
        }

        let created = self
            .policy
            .guard(&label, move || {
                self.remote
                    .create_index(&self.database_id, collection_id, spec)
            })
            .await?;
        self.wait_for_index_ready(collection_id, spec.key()).await?;
        self.poller.settle().await;

        let outcome = creation_outcome(created.is_some());
        info!(%object, index_type = %spec.index_type(), ?outcome, "index ensured");
        Ok(outcome)
    }

    /// Deletes an index when present and waits for it to disappear.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when the delete call is rejected or the
    /// index never disappears.
    pub async fn delete_index_if_present(
        &self,
        collection_id: &CollectionId,
        key: &IndexKey,
    ) -> Result<RemovalOutcome, ReconcileError> {
        let label = SchemaObjectRef::index(collection_id.clone(), key).to_string();
        if self.probe_index(&label, collection_id, key).await?.is_none() {
            debug!(index = %label, "index already absent");
            return Ok(RemovalOutcome::AlreadyAbsent);
        }

        let deleted = self
            .policy
            .guard(&label, move || {
                self.remote.delete_index(&self.database_id, collection_id, key)
            })
            .await?;
        self.wait_for_index_removed(collection_id, key).await?;

        let outcome = removal_outcome(deleted.is_some());
        info!(index = %label, ?outcome, "index removed");
        Ok(outcome)
    }

    /// Deletes an attribute when present and waits for it to disappear.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when the delete call is rejected or the
    /// attribute never disappears.
    pub async fn delete_attribute_if_present(
        &self,
        collection_id: &CollectionId,
        key: &AttributeKey,
    ) -> Result<RemovalOutcome, ReconcileError> {
        let label = SchemaObjectRef::attribute(collection_id.clone(), key).to_string();
        let existing = self
            .probe
            .try_get(&label, move || {
                self.remote
                    .get_attribute(&self.database_id, collection_id, key)
            })
            .await?;
        if existing.is_none() {
            debug!(attribute = %label, "attribute already absent");
            return Ok(RemovalOutcome::AlreadyAbsent);
        }

        let deleted = self
            .policy
            .guard(&label, move || {
                self.remote
                    .delete_attribute(&self.database_id, collection_id, key)
            })
            .await?;
        self.wait_for_attribute_removed(collection_id, key).await?;

        let outcome = removal_outcome(deleted.is_some());
        info!(attribute = %label, ?outcome, "attribute removed");
        Ok(outcome)
    }

    /// Replaces `old_key` with the index described by `replacement`.
    ///
    /// The old index is deleted before the replacement is created; the two
    /// calls are not atomic, so a uniqueness constraint carried by the old
    /// index is absent until the replacement becomes available. When the
    /// keys match and the existing index already has the replacement's type
    /// and columns nothing is deleted.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] from the removal or the ensure step.
    pub async fn supersede_index(
        &self,
        collection_id: &CollectionId,
        old_key: &IndexKey,
        replacement: &IndexSpec,
    ) -> Result<Supersession, ReconcileError> {
        replacement.validate()?;

        if old_key == replacement.key() {
            let label = SchemaObjectRef::index(collection_id.clone(), old_key).to_string();
            let existing = self.probe_index(&label, collection_id, old_key).await?;
            if existing.is_some_and(|index| covers(&index, replacement)) {
                let ensured = self.ensure_index(collection_id, replacement).await?;
                return Ok(Supersession {
                    removed: RemovalOutcome::AlreadyAbsent,
                    ensured,
                });
            }
        }

        let removed = self.delete_index_if_present(collection_id, old_key).await?;
        if removed == RemovalOutcome::Deleted {
            warn!(
                collection = %collection_id,
                old_index = %old_key,
                new_index = %replacement.key(),
                "old index removed; its constraint is absent until the replacement is available"
            );
        }
        let ensured = self.ensure_index(collection_id, replacement).await?;
        Ok(Supersession { removed, ensured })
    }

    /// Reports whether an index exists in any status.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when the lookup fails under a strict probe
    /// or the client lacks the lookup method.
    pub async fn index_exists(
        &self,
        collection_id: &CollectionId,
        key: &IndexKey,
    ) -> Result<bool, ReconcileError> {
        let label = SchemaObjectRef::index(collection_id.clone(), key).to_string();
        Ok(self.probe_index(&label, collection_id, key).await?.is_some())
    }

    /// Reports whether an attribute exists in any status.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError`] when the lookup fails under a strict probe
    /// or the client lacks the lookup method.
    pub async fn attribute_exists(
        &self,
        collection_id: &CollectionId,
        key: &AttributeKey,
    ) -> Result<bool, ReconcileError> {
        let label = SchemaObjectRef::attribute(collection_id.clone(), key).to_string();
        let existing = self
            .probe
            .try_get(&label, move || {
                self.remote
                    .get_attribute(&self.database_id, collection_id, key)
            })
            .await?;
        Ok(existing.is_some())
    }

    /// Waits until a collection lookup succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::ConvergenceTimeout`] when the collection
    /// never becomes visible.
    pub async fn wait_for_collection_ready(
        &self,
        collection_id: &CollectionId,
    ) -> Result<(), ReconcileError> {
        let label = SchemaObjectRef::collection(collection_id.clone()).to_string();
        let label_ref = label.as_str();
        self.poller
            .wait_until(label_ref, move || async move {
                match self
                    .remote
                    .get_collection(&self.database_id, collection_id)
                    .await
                {
                    Ok(_) => Ok(Some(())),
                    Err(err) if err.is_not_found() => Ok(None),
                    Err(err) => Err(classify_poll_error(label_ref, err)),
                }
            })
            .await
    }

    /// Waits until an attribute reports `available`.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::TerminalFailure`] as soon as the attribute
    /// is failed or stuck with a diagnostic, or
    /// [`ReconcileError::ConvergenceTimeout`].
    pub async fn wait_for_attribute_ready(
        &self,
        collection_id: &CollectionId,
        key: &AttributeKey,
    ) -> Result<RemoteAttribute, ReconcileError> {
        let object = SchemaObjectRef::attribute(collection_id.clone(), key);
        let label = object.to_string();
        let (object_ref, label_ref) = (&object, label.as_str());
        self.poller
            .wait_until(label_ref, move || async move {
                match self
                    .remote
                    .get_attribute(&self.database_id, collection_id, key)
                    .await
                {
                    Ok(attribute) => {
                        readiness(object_ref, attribute.status, attribute.diagnostic())
                            .map(|ready| ready.then_some(attribute))
                    }
                    Err(err) => Err(classify_poll_error(label_ref, err)),
                }
            })
            .await
    }

    /// Waits until an index reports `available`.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::TerminalFailure`] as soon as the index is
    /// failed or stuck with a diagnostic, or
    /// [`ReconcileError::ConvergenceTimeout`].
    pub async fn wait_for_index_ready(
        &self,
        collection_id: &CollectionId,
        key: &IndexKey,
    ) -> Result<RemoteIndex, ReconcileError> {
        let object = SchemaObjectRef::index(collection_id.clone(), key);
        let label = object.to_string();
        let (object_ref, label_ref) = (&object, label.as_str());
        self.poller
            .wait_until(label_ref, move || async move {
                match self
                    .remote
                    .get_index(&self.database_id, collection_id, key)
                    .await
                {
                    Ok(index) => readiness(object_ref, index.status, index.diagnostic())
                        .map(|ready| ready.then_some(index)),
                    Err(err) => Err(classify_poll_error(label_ref, err)),
                }
            })
            .await
    }

    /// Waits until an index lookup reports not-found.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::ConvergenceTimeout`] when the index lingers.
    pub async fn wait_for_index_removed(
        &self,
        collection_id: &CollectionId,
        key: &IndexKey,
    ) -> Result<(), ReconcileError> {
        let label = format!(
            "removal of {}",
            SchemaObjectRef::index(collection_id.clone(), key)
        );
        let label_ref = label.as_str();
        self.poller
            .wait_until(label_ref, move || async move {
                match self
                    .remote
                    .get_index(&self.database_id, collection_id, key)
                    .await
                {
                    Ok(_) => Ok(None),
                    Err(err) if err.is_not_found() => Ok(Some(())),
                    Err(err) => Err(classify_poll_error(label_ref, err)),
                }
            })
            .await
    }

    /// Waits until an attribute lookup reports not-found.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::ConvergenceTimeout`] when the attribute
    /// lingers.
    pub async fn wait_for_attribute_removed(
        &self,
        collection_id: &CollectionId,
        key: &AttributeKey,
    ) -> Result<(), ReconcileError> {
        let label = format!(
            "removal of {}",
            SchemaObjectRef::attribute(collection_id.clone(), key)
        );
        let label_ref = label.as_str();
        self.poller
            .wait_until(label_ref, move || async move {
                match self
                    .remote
                    .get_attribute(&self.database_id, collection_id, key)
                    .await
                {
                    Ok(_) => Ok(None),
                    Err(err) if err.is_not_found() => Ok(Some(())),
                    Err(err) => Err(classify_poll_error(label_ref, err)),
                }
            })
            .await
    }

    async fn probe_index(
        &self,
        label: &str,
        collection_id: &CollectionId,
        key: &IndexKey,
    ) -> Result<Option<RemoteIndex>, ReconcileError> {
        self.probe
            .try_get(label, move || {
                self.remote.get_index(&self.database_id, collection_id, key)
            })
            .await
    }
}

const fn creation_outcome(created: bool) -> EnsureOutcome {
    if created {
        EnsureOutcome::Created
    } else {
        EnsureOutcome::AlreadyPresent
    }
}

const fn removal_outcome(deleted: bool) -> RemovalOutcome {
    if deleted {
        RemovalOutcome::Deleted
    } else {
        RemovalOutcome::AlreadyAbsent
    }
}

/// Maps a polled status onto "ready", "not yet", or a terminal failure.
///
/// Failed or stuck objects without a diagnostic keep polling; only a
/// diagnosed terminal status short-circuits the wait.
fn readiness(
    object: &SchemaObjectRef,
    status: RemoteObjectStatus,
    diagnostic: Option<&str>,
) -> Result<bool, PollFailure> {
    if status.is_available() {
        return Ok(true);
    }
    match (status.is_terminal_failure(), diagnostic) {
        (true, Some(message)) => Err(PollFailure::Terminal(ReconcileError::TerminalFailure {
            object: object.clone(),
            status,
            message: message.to_owned(),
        })),
        (true, None) => Err(PollFailure::Transient(format!(
            "{object} is {status} without a diagnostic"
        ))),
        (false, _) => Ok(false),
    }
}

fn reject_terminal(
    object: &SchemaObjectRef,
    status: RemoteObjectStatus,
    diagnostic: Option<&str>,
) -> Result<(), ReconcileError> {
    match readiness(object, status, diagnostic) {
        Err(PollFailure::Terminal(err)) => Err(err),
        _ => Ok(()),
    }
}

fn classify_poll_error(label: &str, err: SchemaClientError) -> PollFailure {
    match err {
        SchemaClientError::MethodNotFound(_) => {
            PollFailure::Terminal(ReconcileError::from_client(label, err))
        }
        other => PollFailure::Transient(other.to_string()),
    }
}

fn covers(index: &RemoteIndex, spec: &IndexSpec) -> bool {
    index.index_type == spec.index_type().as_str()
        && index.attributes.len() == spec.columns().len()
        && spec.columns().iter().enumerate().all(|(position, column)| {
            let order = index
                .orders
                .get(position)
                .and_then(Option::as_deref)
                .unwrap_or(SortOrder::Asc.as_str());
            index
                .attributes
                .get(position)
                .is_some_and(|remote| remote == column.attribute().as_str())
                && order.eq_ignore_ascii_case(column.order().as_str())
        })
}
