//! Identity-keyed persistence over the generic engine.
//!
//! [`IdentifiablePersistence`] wraps a [`Persistence`] engine and adds the
//! operations that only make sense for records with a string identity:
//! fetch, replace, patch, and delete keyed by `id`, plus an upsert-style
//! `set`. Identity lives in the public `id` field and is stored under
//! `_id`; when a caller creates or sets a record without one, a fresh
//! UUID-shaped identity is assigned before the write.
//!
//! # Example
//!
//! ```ignore
//! use docbase::identifiable::IdentifiablePersistence;
//! use docbase::memory::MemoryConnection;
//!
//! let mut dummies: IdentifiablePersistence<MemoryConnection, Dummy> =
//!     IdentifiablePersistence::new("dummies");
//! dummies.open(None).await?;
//!
//! let created = dummies.create(None, &Dummy::named("one")).await?;
//! let found = dummies.get_one_by_id(None, created.id().unwrap_or_default()).await?;
//! ```

use bson::{Bson, Document, doc};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;

use crate::{
    config::PersistenceConfig,
    connection::StoreConnection,
    error::{StoreError, StoreResult},
    page::{DataPage, PagingParams},
    persistence::Persistence,
    query::Query,
    record::{Identifiable, RecordSchema, SerdeSchema, generate_id},
    references::References,
};

/// Persistence for records with a string identity.
///
/// Everything the engine offers is still available, either through the
/// delegating methods or through [`inner`](Self::inner); the identity
/// operations come on top.
pub struct IdentifiablePersistence<C: StoreConnection, T: Identifiable> {
    engine: Persistence<C, T>,
}

impl<C: StoreConnection, T> IdentifiablePersistence<C, T>
where
    T: Identifiable + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Creates a component over the serde-backed schema.
    pub fn new(collection: &str) -> Self {
        Self::with_schema(collection, Arc::new(SerdeSchema::new()))
    }
}

impl<C: StoreConnection, T: Identifiable> IdentifiablePersistence<C, T> {
    /// Creates a component with an explicit record schema.
    pub fn with_schema(collection: &str, schema: Arc<dyn RecordSchema<T>>) -> Self {
        Self {
            engine: Persistence::new(Some(collection), Some(schema)),
        }
    }

    /// Returns the underlying engine.
    pub fn inner(&self) -> &Persistence<C, T> {
        &self.engine
    }

    /// Returns the underlying engine mutably.
    pub fn inner_mut(&mut self) -> &mut Persistence<C, T> {
        &mut self.engine
    }

    pub fn configure(&mut self, config: PersistenceConfig) {
        self.engine.configure(config);
    }

    pub fn set_references(&mut self, references: &References) {
        self.engine.set_references(references);
    }

    pub fn unset_references(&mut self) {
        self.engine.unset_references();
    }

    pub fn is_open(&self) -> bool {
        self.engine.is_open()
    }

    pub async fn open(&mut self, trace_id: Option<&str>) -> StoreResult<()> {
        self.engine.open(trace_id).await
    }

    pub async fn close(&mut self, trace_id: Option<&str>) -> StoreResult<()> {
        self.engine.close(trace_id).await
    }

    pub async fn clear(&self, trace_id: Option<&str>) -> StoreResult<()> {
        self.engine.clear(trace_id).await
    }

    pub async fn ensure_index(
        &self,
        trace_id: Option<&str>,
        keys: Document,
        unique: bool,
    ) -> StoreResult<()> {
        self.engine.ensure_index(trace_id, keys, unique).await
    }

    pub async fn get_page_by_filter(
        &self,
        trace_id: Option<&str>,
        filter: Document,
        paging: Option<PagingParams>,
        sort: Option<Document>,
        projection: Option<Document>,
    ) -> StoreResult<DataPage<T>> {
        self.engine
            .get_page_by_filter(trace_id, filter, paging, sort, projection)
            .await
    }

    pub async fn get_count_by_filter(
        &self,
        trace_id: Option<&str>,
        filter: Document,
    ) -> StoreResult<u64> {
        self.engine.get_count_by_filter(trace_id, filter).await
    }

    pub async fn get_list_by_filter(
        &self,
        trace_id: Option<&str>,
        filter: Document,
        sort: Option<Document>,
        projection: Option<Document>,
    ) -> StoreResult<Vec<T>> {
        self.engine
            .get_list_by_filter(trace_id, filter, sort, projection)
            .await
    }

    pub async fn get_one_random(
        &self,
        trace_id: Option<&str>,
        filter: Document,
    ) -> StoreResult<Option<T>> {
        self.engine.get_one_random(trace_id, filter).await
    }

    pub async fn delete_by_filter(
        &self,
        trace_id: Option<&str>,
        filter: Document,
    ) -> StoreResult<()> {
        self.engine.delete_by_filter(trace_id, filter).await
    }

    /// Retrieves one record by identity, or `None` when no record has it.
    pub async fn get_one_by_id(&self, trace_id: Option<&str>, id: &str) -> StoreResult<Option<T>> {
        let binding = self.engine.binding()?;
        let schema = self.engine.schema()?;

        let docs = binding.find(Query::new(doc! { "_id": id }).limit(1)).await?;
        match docs.into_iter().next() {
            Some(doc) => {
                tracing::trace!(
                    trace_id = trace_id.unwrap_or("-"),
                    "retrieved from {} with id = {}",
                    binding.name(),
                    id
                );
                Ok(Some(schema.to_public(doc)?))
            }
            None => {
                tracing::trace!(
                    trace_id = trace_id.unwrap_or("-"),
                    "nothing found from {} with id = {}",
                    binding.name(),
                    id
                );
                Ok(None)
            }
        }
    }

    /// Retrieves the records whose identity is in the given list.
    ///
    /// Missing identities are skipped silently; the result order is the
    /// store's, not the list's.
    pub async fn get_list_by_ids(
        &self,
        trace_id: Option<&str>,
        ids: &[String],
    ) -> StoreResult<Vec<T>> {
        let filter = doc! { "_id": { "$in": ids.to_vec() } };
        self.engine
            .get_list_by_filter(trace_id, filter, None, None)
            .await
    }

    /// Creates a record, assigning a fresh identity when the caller left
    /// it unset. Returns the stored post-image.
    pub async fn create(&self, trace_id: Option<&str>, item: &T) -> StoreResult<T> {
        let binding = self.engine.binding()?;
        let schema = self.engine.schema()?;

        let mut doc = schema.to_internal(item)?;
        let id = ensure_identity(&mut doc);
        schema.validate(&doc)?;

        let created = binding.insert_one(doc).await?;
        tracing::trace!(
            trace_id = trace_id.unwrap_or("-"),
            "created item in {} with id = {}",
            binding.name(),
            id_text(&id)
        );
        schema.to_public(created)
    }

    /// Stores a record under its identity, replacing any previous version
    /// and inserting when none exists. A record without an identity gets a
    /// fresh one. Returns the stored post-image.
    pub async fn set(&self, trace_id: Option<&str>, item: &T) -> StoreResult<T> {
        let binding = self.engine.binding()?;
        let schema = self.engine.schema()?;

        let mut doc = schema.to_internal(item)?;
        let id = ensure_identity(&mut doc);
        schema.validate(&doc)?;

        let stored = binding
            .replace_one(doc! { "_id": id.clone() }, doc, true)
            .await?
            .ok_or_else(|| StoreError::connection("Set returned no stored document"))?;

        tracing::trace!(
            trace_id = trace_id.unwrap_or("-"),
            "set item in {} with id = {}",
            binding.name(),
            id_text(&id)
        );
        schema.to_public(stored)
    }

    /// Replaces the record carrying the item's identity. Returns the
    /// updated post-image, or `None` when the item has no identity or no
    /// record carries it.
    pub async fn update(&self, trace_id: Option<&str>, item: &T) -> StoreResult<Option<T>> {
        let Some(id) = item.id() else {
            return Ok(None);
        };
        let binding = self.engine.binding()?;
        let schema = self.engine.schema()?;

        let doc = schema.to_internal(item)?;
        schema.validate(&doc)?;

        match binding.replace_one(doc! { "_id": id }, doc, false).await? {
            Some(updated) => {
                tracing::trace!(
                    trace_id = trace_id.unwrap_or("-"),
                    "updated in {} with id = {}",
                    binding.name(),
                    id
                );
                Ok(Some(schema.to_public(updated)?))
            }
            None => {
                tracing::trace!(
                    trace_id = trace_id.unwrap_or("-"),
                    "nothing found from {} with id = {}",
                    binding.name(),
                    id
                );
                Ok(None)
            }
        }
    }

    /// Applies a partial field update to the record with the given
    /// identity. Identity fields are stripped from the patch; a patch with
    /// nothing left is a no-op returning `None`. Returns the updated
    /// post-image, or `None` when no record carries the identity.
    pub async fn update_partially(
        &self,
        trace_id: Option<&str>,
        id: &str,
        fields: Document,
    ) -> StoreResult<Option<T>> {
        let binding = self.engine.binding()?;
        let schema = self.engine.schema()?;

        let mut patch = schema.to_internal_partial(fields)?;
        patch.remove("_id");
        if patch.is_empty() {
            return Ok(None);
        }

        match binding.patch_one(doc! { "_id": id }, patch).await? {
            Some(updated) => {
                tracing::trace!(
                    trace_id = trace_id.unwrap_or("-"),
                    "updated partially in {} with id = {}",
                    binding.name(),
                    id
                );
                Ok(Some(schema.to_public(updated)?))
            }
            None => {
                tracing::trace!(
                    trace_id = trace_id.unwrap_or("-"),
                    "nothing found from {} with id = {}",
                    binding.name(),
                    id
                );
                Ok(None)
            }
        }
    }

    /// Deletes the record with the given identity. Returns the deleted
    /// pre-image, or `None` when no record carries it.
    pub async fn delete_by_id(&self, trace_id: Option<&str>, id: &str) -> StoreResult<Option<T>> {
        let binding = self.engine.binding()?;
        let schema = self.engine.schema()?;

        match binding.remove_one(doc! { "_id": id }).await? {
            Some(deleted) => {
                tracing::trace!(
                    trace_id = trace_id.unwrap_or("-"),
                    "deleted from {} with id = {}",
                    binding.name(),
                    id
                );
                Ok(Some(schema.to_public(deleted)?))
            }
            None => {
                tracing::trace!(
                    trace_id = trace_id.unwrap_or("-"),
                    "nothing found from {} with id = {}",
                    binding.name(),
                    id
                );
                Ok(None)
            }
        }
    }

    /// Deletes every record whose identity is in the given list.
    pub async fn delete_by_ids(&self, trace_id: Option<&str>, ids: &[String]) -> StoreResult<()> {
        self.engine
            .delete_by_filter(trace_id, doc! { "_id": { "$in": ids.to_vec() } })
            .await
    }
}

/// Makes sure the internal document carries an identity, assigning a
/// generated one for missing, null, or empty-string identities. Returns
/// the effective identity.
fn ensure_identity(doc: &mut Document) -> Bson {
    match doc.get("_id") {
        Some(Bson::String(id)) if !id.is_empty() => Bson::String(id.clone()),
        // Non-string identities from custom schemas pass through untouched.
        Some(other) if !matches!(other, Bson::Null | Bson::String(_)) => other.clone(),
        _ => {
            let id = generate_id();
            doc.insert("_id", id.clone());
            Bson::String(id)
        }
    }
}

fn id_text(id: &Bson) -> String {
    match id {
        Bson::String(id) => id.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_caller_assigned_identity() {
        let mut doc = doc! { "_id": "given", "name": "x" };
        let id = ensure_identity(&mut doc);
        assert_eq!(id, Bson::String("given".into()));
        assert_eq!(doc.get_str("_id").ok(), Some("given"));
    }

    #[test]
    fn assigns_identity_when_missing() {
        let mut doc = doc! { "name": "x" };
        let id = ensure_identity(&mut doc);
        let assigned = doc.get_str("_id").unwrap_or_default().to_string();
        assert_eq!(assigned.len(), 32);
        assert_eq!(id, Bson::String(assigned));
    }

    #[test]
    fn replaces_null_and_empty_identities() {
        let mut with_null = doc! { "_id": Bson::Null };
        ensure_identity(&mut with_null);
        assert!(with_null.get_str("_id").is_ok_and(|id| id.len() == 32));

        let mut with_empty = doc! { "_id": "" };
        ensure_identity(&mut with_empty);
        assert!(with_empty.get_str("_id").is_ok_and(|id| id.len() == 32));
    }

    #[test]
    fn passes_non_string_identity_through() {
        let mut doc = doc! { "_id": 42_i64 };
        let id = ensure_identity(&mut doc);
        assert_eq!(id, Bson::Int64(42));
        assert_eq!(doc.get_i64("_id").ok(), Some(42));
    }
}
