//! The in-memory connection manager.
//!
//! [`MemoryConnection`] implements the connection seam over plain vectors
//! behind an async-aware read-write lock. Documents in a collection keep
//! their insertion order, so unsorted reads page deterministically. Data
//! survives a close and reopen of the same instance; a fresh instance
//! always starts empty.

use async_trait::async_trait;
use bson::Document;
use mea::rwlock::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use docbase_core::{
    config::ConnectionSettings,
    connection::StoreConnection,
    error::{StoreError, StoreResult, codes},
    query::Query,
    record::generate_id,
};

use crate::evaluator;

type CollectionVec = Vec<Document>;
type StoreMap = HashMap<String, CollectionVec>;

/// Thread-safe in-memory connection manager.
///
/// Queries scan every document in a collection; there is no indexing.
/// For the datasets this backend is meant for, development fixtures and
/// tests, that is fine.
#[derive(Debug)]
pub struct MemoryConnection {
    settings: ConnectionSettings,
    data: Arc<RwLock<StoreMap>>,
    open: AtomicBool,
}

impl MemoryConnection {
    /// Creates a closed manager with default settings.
    pub fn new() -> Self {
        Self::create(ConnectionSettings::default())
    }
}

impl Default for MemoryConnection {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryConnection {
    fn guard_open(&self) -> StoreResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(StoreError::invalid_state(
                codes::NOT_OPENED,
                "Memory store is not open",
            ))
        }
    }
}

#[async_trait]
impl StoreConnection for MemoryConnection {
    fn create(settings: ConnectionSettings) -> Self {
        Self {
            settings,
            data: Arc::new(RwLock::new(StoreMap::new())),
            open: AtomicBool::new(false),
        }
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn open(&self, _trace_id: Option<&str>) -> StoreResult<()> {
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self, _trace_id: Option<&str>) -> StoreResult<()> {
        self.open.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn database_name(&self) -> Option<String> {
        Some(
            self.settings
                .connection
                .database
                .clone()
                .unwrap_or_else(|| "test".to_string()),
        )
    }

    async fn find(&self, collection: &str, query: Query) -> StoreResult<Vec<Document>> {
        self.guard_open()?;
        let data = self.data.read().await;
        let Some(docs) = data.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matched = Vec::new();
        for doc in docs {
            if evaluator::matches(doc, &query.filter)? {
                matched.push(doc.clone());
            }
        }

        if let Some(sort) = &query.sort {
            evaluator::sort_documents(&mut matched, sort);
        }

        let skip = usize::try_from(query.skip.unwrap_or(0)).unwrap_or(usize::MAX);
        let mut selected: Vec<Document> = matched.into_iter().skip(skip).collect();
        if let Some(limit) = query.limit {
            selected.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }

        match &query.projection {
            Some(projection) if !projection.is_empty() => Ok(selected
                .iter()
                .map(|doc| evaluator::project(doc, projection))
                .collect()),
            _ => Ok(selected),
        }
    }

    async fn count(&self, collection: &str, filter: Document) -> StoreResult<u64> {
        self.guard_open()?;
        let data = self.data.read().await;
        let Some(docs) = data.get(collection) else {
            return Ok(0);
        };

        let mut count = 0_u64;
        for doc in docs {
            if evaluator::matches(doc, &filter)? {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn insert_one(&self, collection: &str, doc: Document) -> StoreResult<Document> {
        self.guard_open()?;
        let mut doc = doc;
        if !doc.contains_key("_id") {
            doc.insert("_id", generate_id());
        }

        let mut data = self.data.write().await;
        let docs = data.entry(collection.to_string()).or_default();

        if docs
            .iter()
            .any(|existing| existing.get("_id") == doc.get("_id"))
        {
            return Err(StoreError::connection(format!(
                "Duplicate id in collection {collection}"
            )));
        }

        docs.push(doc.clone());
        Ok(doc)
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
        upsert: bool,
    ) -> StoreResult<Option<Document>> {
        self.guard_open()?;
        let mut replacement = replacement;
        let mut data = self.data.write().await;
        let docs = data.entry(collection.to_string()).or_default();

        let mut position = None;
        for (index, doc) in docs.iter().enumerate() {
            if evaluator::matches(doc, &filter)? {
                position = Some(index);
                break;
            }
        }

        match position {
            Some(index) => {
                // The replacement keeps the matched document's identity.
                if let Some(id) = docs[index].get("_id").cloned() {
                    replacement.insert("_id", id);
                }
                docs[index] = replacement;
                Ok(Some(docs[index].clone()))
            }
            None if upsert => {
                if !replacement.contains_key("_id") {
                    replacement.insert("_id", generate_id());
                }
                docs.push(replacement.clone());
                Ok(Some(replacement))
            }
            None => Ok(None),
        }
    }

    async fn patch_one(
        &self,
        collection: &str,
        filter: Document,
        fields: Document,
    ) -> StoreResult<Option<Document>> {
        self.guard_open()?;
        let mut data = self.data.write().await;
        let Some(docs) = data.get_mut(collection) else {
            return Ok(None);
        };

        let mut position = None;
        for (index, doc) in docs.iter().enumerate() {
            if evaluator::matches(doc, &filter)? {
                position = Some(index);
                break;
            }
        }
        let Some(index) = position else {
            return Ok(None);
        };

        for (field, value) in fields {
            docs[index].insert(field, value);
        }
        Ok(Some(docs[index].clone()))
    }

    async fn remove_one(
        &self,
        collection: &str,
        filter: Document,
    ) -> StoreResult<Option<Document>> {
        self.guard_open()?;
        let mut data = self.data.write().await;
        let Some(docs) = data.get_mut(collection) else {
            return Ok(None);
        };

        let mut position = None;
        for (index, doc) in docs.iter().enumerate() {
            if evaluator::matches(doc, &filter)? {
                position = Some(index);
                break;
            }
        }
        match position {
            Some(index) => Ok(Some(docs.remove(index))),
            None => Ok(None),
        }
    }

    async fn remove_many(&self, collection: &str, filter: Document) -> StoreResult<u64> {
        self.guard_open()?;
        let mut data = self.data.write().await;
        let Some(docs) = data.get_mut(collection) else {
            return Ok(0);
        };

        let mut kept = Vec::with_capacity(docs.len());
        let mut removed = 0_u64;
        for doc in docs.drain(..) {
            if evaluator::matches(&doc, &filter)? {
                removed += 1;
            } else {
                kept.push(doc);
            }
        }
        *docs = kept;
        Ok(removed)
    }

    async fn ensure_index(
        &self,
        _collection: &str,
        _keys: Document,
        _unique: bool,
    ) -> StoreResult<()> {
        // The memory store does not index.
        Ok(())
    }
}
