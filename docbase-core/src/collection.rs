//! A bound query surface for one collection.
//!
//! A [`CollectionBinding`] pairs a collection name with the connection
//! manager serving it. Persistence components build one at open time and
//! drop it at close, so holding a binding implies the component went through
//! a successful open.

use bson::Document;
use std::sync::Arc;

use crate::{connection::StoreConnection, error::StoreResult, query::Query};

/// A collection name bound to a live connection manager.
///
/// All operations delegate to the manager with the bound name filled in.
/// The binding shares the manager (`Arc`), so it stays valid while the
/// owning component keeps it, regardless of who else uses the manager.
#[derive(Debug)]
pub struct CollectionBinding<C: StoreConnection> {
    name: String,
    connection: Arc<C>,
}

impl<C: StoreConnection> CollectionBinding<C> {
    pub(crate) fn new(name: String, connection: Arc<C>) -> Self {
        Self { name, connection }
    }

    /// Returns the bound collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the connection manager serving this binding.
    pub fn connection(&self) -> &Arc<C> {
        &self.connection
    }

    /// Runs a query against the bound collection.
    pub async fn find(&self, query: Query) -> StoreResult<Vec<Document>> {
        self.connection.find(&self.name, query).await
    }

    /// Counts the documents matching a filter.
    pub async fn count(&self, filter: Document) -> StoreResult<u64> {
        self.connection.count(&self.name, filter).await
    }

    /// Inserts one document, returning the stored post-image.
    pub async fn insert_one(&self, doc: Document) -> StoreResult<Document> {
        self.connection.insert_one(&self.name, doc).await
    }

    /// Replaces the first matching document, optionally inserting it when
    /// absent. Returns the post-image.
    pub async fn replace_one(
        &self,
        filter: Document,
        replacement: Document,
        upsert: bool,
    ) -> StoreResult<Option<Document>> {
        self.connection
            .replace_one(&self.name, filter, replacement, upsert)
            .await
    }

    /// Applies a partial field update to the first matching document.
    /// Returns the post-image.
    pub async fn patch_one(
        &self,
        filter: Document,
        fields: Document,
    ) -> StoreResult<Option<Document>> {
        self.connection
            .patch_one(&self.name, filter, fields)
            .await
    }

    /// Removes the first matching document, returning the pre-image.
    pub async fn remove_one(&self, filter: Document) -> StoreResult<Option<Document>> {
        self.connection.remove_one(&self.name, filter).await
    }

    /// Removes every matching document, returning the removed count.
    pub async fn remove_many(&self, filter: Document) -> StoreResult<u64> {
        self.connection.remove_many(&self.name, filter).await
    }

    /// Creates an index over the given keys when the backend supports it.
    pub async fn ensure_index(&self, keys: Document, unique: bool) -> StoreResult<()> {
        self.connection
            .ensure_index(&self.name, keys, unique)
            .await
    }
}
