//! The generic persistence engine.
//!
//! [`Persistence`] binds one collection on one connection manager and offers
//! filter-based operations over it: paged reads, counts, unpaged lists,
//! random sampling, create, and bulk delete. It is domain-free: filters,
//! sort orders, and projections are opaque documents in store notation, and
//! concrete stores are expected to wrap these primitives with typed filter
//! methods of their own.
//!
//! # Lifecycle
//!
//! A component is constructed, configured, referenced, then opened:
//!
//! ```ignore
//! use std::sync::Arc;
//! use docbase::persistence::Persistence;
//! use docbase::record::SerdeSchema;
//! use docbase::config::PersistenceConfig;
//! use docbase::memory::MemoryConnection;
//!
//! let mut persistence: Persistence<MemoryConnection, Dummy> =
//!     Persistence::new(Some("dummies"), Some(Arc::new(SerdeSchema::new())));
//! persistence.configure(PersistenceConfig::default().collection("dummies"));
//! persistence.open(None).await?;
//! ```
//!
//! [`set_references`](Persistence::set_references) resolves a shared
//! connection manager from a [`References`] registry; without one (or when
//! the registry has none under the configured tag) the component creates
//! and exclusively owns a private manager from its retained settings. Owned
//! managers are opened and closed by the component; shared managers are
//! left to their owner and only checked for readiness.

use bson::Document;
use rand::Rng;
use std::sync::Arc;

use crate::{
    collection::CollectionBinding,
    config::{ConnectionOptions, ConnectionSettings, Dependencies, PersistenceConfig},
    connection::StoreConnection,
    error::{StoreError, StoreResult, codes},
    page::{DataPage, PagingParams},
    query::Query,
    record::RecordSchema,
    references::References,
};

struct ConnectionSlot<C> {
    manager: Arc<C>,
    owned: bool,
}

/// A generic, collection-bound persistence component.
///
/// `C` is the connection manager backend, `T` the public record shape. The
/// component converts between the two worlds through its
/// [`RecordSchema`]; stored documents never leak to callers and public
/// records never reach the backend unconverted.
pub struct Persistence<C: StoreConnection, T> {
    collection: Option<String>,
    schema: Option<Arc<dyn RecordSchema<T>>>,
    settings: ConnectionSettings,
    dependency_tag: String,
    slot: Option<ConnectionSlot<C>>,
    binding: Option<CollectionBinding<C>>,
    database: Option<String>,
    max_page_size: u64,
    opened: bool,
}

impl<C: StoreConnection, T> Persistence<C, T> {
    /// Creates an unconfigured component.
    ///
    /// Both the collection name and the schema may also arrive later, the
    /// name through [`configure`](Self::configure); both are checked at
    /// open time.
    pub fn new(collection: Option<&str>, schema: Option<Arc<dyn RecordSchema<T>>>) -> Self {
        Self {
            collection: collection.map(str::to_string),
            schema,
            settings: ConnectionSettings::default(),
            dependency_tag: Dependencies::default().connection,
            slot: None,
            binding: None,
            database: None,
            max_page_size: u64::from(ConnectionOptions::default().max_page_size),
            opened: false,
        }
    }

    /// Applies configuration: collection name, dependency tag, connection
    /// settings, and the page size bound.
    ///
    /// Reconfiguring before open re-resolves everything; a collection name
    /// given at construction survives a config without one.
    pub fn configure(&mut self, config: PersistenceConfig) {
        if config.collection.is_some() {
            self.collection = config.collection;
        }
        self.dependency_tag = config.dependencies.connection;
        self.max_page_size = u64::from(config.settings.options.max_page_size);
        self.settings = config.settings;
    }

    /// Resolves the connection manager to use.
    ///
    /// When the registry holds a manager of type `C` under the configured
    /// dependency tag, it is shared from there. Otherwise a private one is
    /// created from the retained settings and owned exclusively.
    pub fn set_references(&mut self, references: &References) {
        self.slot = match references.get::<C>(&self.dependency_tag) {
            Some(manager) => Some(ConnectionSlot {
                manager,
                owned: false,
            }),
            None => Some(ConnectionSlot {
                manager: Arc::new(C::create(self.settings.clone())),
                owned: true,
            }),
        };
    }

    /// Drops the resolved connection manager.
    pub fn unset_references(&mut self) {
        self.slot = None;
    }

    /// Returns `true` after a successful open and before close.
    pub fn is_open(&self) -> bool {
        self.opened
    }

    /// Returns the bound collection name, once known.
    pub fn collection_name(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    /// Returns the logical database name, once open.
    pub fn database_name(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// Returns the resolved connection manager, once referenced.
    pub fn connection(&self) -> Option<&Arc<C>> {
        self.slot.as_ref().map(|slot| &slot.manager)
    }

    /// Returns the effective page size bound.
    pub fn max_page_size(&self) -> u64 {
        self.max_page_size
    }

    /// Opens the component: checks its configuration, brings up the
    /// connection manager, and builds the collection binding.
    ///
    /// Opening an open component is a no-op success. Guards, in order: a
    /// collection name must be configured (`NO_COLLECTION`), a record
    /// schema must be set (`NO_SCHEMA`). A private manager is created here
    /// when [`set_references`](Self::set_references) never ran. Owned
    /// managers are opened; shared managers must already be open
    /// (`CONNECT_FAILED`). A failed open leaves the component in its
    /// pre-open state.
    pub async fn open(&mut self, trace_id: Option<&str>) -> StoreResult<()> {
        if self.opened {
            return Ok(());
        }

        let Some(collection) = self.collection.clone() else {
            return Err(StoreError::config(
                codes::NO_COLLECTION,
                "Collection name is not set",
            ));
        };
        if self.schema.is_none() {
            return Err(StoreError::invalid_state(
                codes::NO_SCHEMA,
                "Record schema is not set",
            ));
        }

        let settings = self.settings.clone();
        let (manager, owned) = {
            let slot = self.slot.get_or_insert_with(|| ConnectionSlot {
                manager: Arc::new(C::create(settings)),
                owned: true,
            });
            (slot.manager.clone(), slot.owned)
        };

        if owned {
            manager.open(trace_id).await?;
        } else if !manager.is_open() {
            return Err(StoreError::connection(
                "Shared connection manager is not open",
            ));
        }

        self.database = manager.database_name();
        self.binding = Some(CollectionBinding::new(collection.clone(), manager));
        self.opened = true;

        tracing::debug!(
            trace_id = trace_id.unwrap_or("-"),
            "connected to database {}, collection {}",
            self.database.as_deref().unwrap_or("-"),
            collection
        );
        Ok(())
    }

    /// Closes the component, tearing down its binding.
    ///
    /// Closing a closed component is a no-op success. An owned manager is
    /// closed for real; a shared one is left open for its other users.
    /// Local state is torn down even when the physical close fails, and
    /// the failure propagates.
    pub async fn close(&mut self, trace_id: Option<&str>) -> StoreResult<()> {
        if !self.opened {
            return Ok(());
        }

        let Some(slot) = self.slot.as_ref() else {
            return Err(StoreError::invalid_state(
                codes::NO_CONNECTION,
                "Connection manager is missing",
            ));
        };

        let result = if slot.owned {
            slot.manager.close(trace_id).await
        } else {
            Ok(())
        };
        if let Err(err) = &result {
            tracing::warn!(
                trace_id = trace_id.unwrap_or("-"),
                "closing the connection manager failed: {}",
                err
            );
        }

        self.opened = false;
        self.binding = None;
        self.database = None;

        tracing::debug!(
            trace_id = trace_id.unwrap_or("-"),
            "disconnected from collection {}",
            self.collection.as_deref().unwrap_or("-")
        );
        result
    }

    /// Deletes every document in the bound collection.
    pub async fn clear(&self, trace_id: Option<&str>) -> StoreResult<()> {
        if self.collection.is_none() {
            return Err(StoreError::config(
                codes::NO_COLLECTION,
                "Collection name is not defined",
            ));
        }
        let binding = self.binding()?;

        let removed = match binding.remove_many(Document::new()).await {
            Ok(removed) => removed,
            Err(err @ StoreError::Connection { .. }) => return Err(err),
            Err(err) => {
                return Err(StoreError::connection_from("Clearing collection failed", err));
            }
        };

        tracing::trace!(
            trace_id = trace_id.unwrap_or("-"),
            "cleared {} items from {}",
            removed,
            binding.name()
        );
        Ok(())
    }

    /// Creates an index over the given keys, where the backend supports
    /// indexes.
    pub async fn ensure_index(
        &self,
        trace_id: Option<&str>,
        keys: Document,
        unique: bool,
    ) -> StoreResult<()> {
        let binding = self.binding()?;
        binding.ensure_index(keys, unique).await?;
        tracing::debug!(
            trace_id = trace_id.unwrap_or("-"),
            "ensured index on {}",
            binding.name()
        );
        Ok(())
    }

    /// Retrieves one page of records matching the filter.
    ///
    /// The skip comes from the paging parameters (absent means no skip);
    /// the take is clamped to `1..=max_page_size`. A total count is
    /// computed, with a second query, only when the paging parameters ask
    /// for it.
    pub async fn get_page_by_filter(
        &self,
        trace_id: Option<&str>,
        filter: Document,
        paging: Option<PagingParams>,
        sort: Option<Document>,
        projection: Option<Document>,
    ) -> StoreResult<DataPage<T>> {
        let binding = self.binding()?;
        let schema = self.schema()?;

        let paging = paging.unwrap_or_default();
        let take = paging.take_clamped(self.max_page_size);

        let mut query = Query::new(filter.clone()).shaped(sort, projection).limit(take);
        query.skip = paging.skip;

        let docs = binding.find(query).await?;
        tracing::trace!(
            trace_id = trace_id.unwrap_or("-"),
            "retrieved {} from {}",
            docs.len(),
            binding.name()
        );

        let mut data = Vec::with_capacity(docs.len());
        for doc in docs {
            data.push(schema.to_public(doc)?);
        }

        let total = if paging.total {
            Some(binding.count(filter).await?)
        } else {
            None
        };

        Ok(DataPage::new(data, total))
    }

    /// Counts the records matching the filter.
    pub async fn get_count_by_filter(
        &self,
        trace_id: Option<&str>,
        filter: Document,
    ) -> StoreResult<u64> {
        let binding = self.binding()?;
        let count = binding.count(filter).await?;
        tracing::trace!(
            trace_id = trace_id.unwrap_or("-"),
            "counted {} in {}",
            count,
            binding.name()
        );
        Ok(count)
    }

    /// Retrieves every record matching the filter, unpaged.
    pub async fn get_list_by_filter(
        &self,
        trace_id: Option<&str>,
        filter: Document,
        sort: Option<Document>,
        projection: Option<Document>,
    ) -> StoreResult<Vec<T>> {
        let binding = self.binding()?;
        let schema = self.schema()?;

        let docs = binding.find(Query::new(filter).shaped(sort, projection)).await?;
        tracing::trace!(
            trace_id = trace_id.unwrap_or("-"),
            "retrieved {} from {}",
            docs.len(),
            binding.name()
        );

        let mut items = Vec::with_capacity(docs.len());
        for doc in docs {
            items.push(schema.to_public(doc)?);
        }
        Ok(items)
    }

    /// Retrieves one record picked uniformly at random from the filter
    /// matches, or `None` when nothing matches.
    pub async fn get_one_random(
        &self,
        trace_id: Option<&str>,
        filter: Document,
    ) -> StoreResult<Option<T>> {
        let binding = self.binding()?;
        let schema = self.schema()?;

        let count = binding.count(filter.clone()).await?;
        if count == 0 {
            tracing::trace!(
                trace_id = trace_id.unwrap_or("-"),
                "nothing found from {}",
                binding.name()
            );
            return Ok(None);
        }

        let pos = if count <= 1 {
            0
        } else {
            rand::thread_rng().gen_range(0..count)
        };

        let mut query = Query::new(filter).limit(1);
        query.skip = Some(pos);

        let docs = binding.find(query).await?;
        match docs.into_iter().next() {
            Some(doc) => {
                tracing::trace!(
                    trace_id = trace_id.unwrap_or("-"),
                    "retrieved a random item from {}",
                    binding.name()
                );
                Ok(Some(schema.to_public(doc)?))
            }
            // The collection shrank between the count and the fetch.
            None => Ok(None),
        }
    }

    /// Creates a record, returning the stored post-image.
    pub async fn create(&self, trace_id: Option<&str>, item: &T) -> StoreResult<T> {
        let binding = self.binding()?;
        let schema = self.schema()?;

        let doc = schema.to_internal(item)?;
        schema.validate(&doc)?;

        let created = binding.insert_one(doc).await?;
        tracing::trace!(
            trace_id = trace_id.unwrap_or("-"),
            "created item in {} with id = {}",
            binding.name(),
            created.get("_id").map(ToString::to_string).unwrap_or_default()
        );
        schema.to_public(created)
    }

    /// Deletes every record matching the filter.
    ///
    /// The removed count is reported through logging only; callers that do
    /// not care about completion may drop or spawn the future.
    pub async fn delete_by_filter(
        &self,
        trace_id: Option<&str>,
        filter: Document,
    ) -> StoreResult<()> {
        let binding = self.binding()?;
        let removed = binding.remove_many(filter).await?;
        tracing::trace!(
            trace_id = trace_id.unwrap_or("-"),
            "deleted {} items from {}",
            removed,
            binding.name()
        );
        Ok(())
    }

    pub(crate) fn binding(&self) -> StoreResult<&CollectionBinding<C>> {
        self.binding.as_ref().ok_or_else(|| {
            StoreError::invalid_state(
                codes::NOT_OPENED,
                "Operation requires an opened persistence component",
            )
        })
    }

    pub(crate) fn schema(&self) -> StoreResult<&Arc<dyn RecordSchema<T>>> {
        self.schema.as_ref().ok_or_else(|| {
            StoreError::invalid_state(codes::NO_SCHEMA, "Record schema is not set")
        })
    }
}
