//! The MongoDB connection manager.

use async_trait::async_trait;
use bson::{Document, doc};
use futures::TryStreamExt;
use mongodb::{
    Client, IndexModel,
    options::{ClientOptions, FindOptions, IndexOptions, ReturnDocument},
};
use parking_lot::RwLock;
use std::time::Duration;

use docbase_core::{
    config::ConnectionSettings,
    connection::{StoreConnection, UriResolver},
    error::{StoreError, StoreResult, codes},
    query::Query,
};

use crate::resolver::StaticUriResolver;

/// Connection manager over one MongoDB deployment.
///
/// By defining a connection and sharing it through multiple persistence
/// components you can reduce the number of used database connections. The
/// manager holds at most one live client; `open` on an open manager is a
/// no-op, and a failed open leaves it closed so the caller may retry.
#[derive(Debug)]
pub struct MongoConnection {
    settings: ConnectionSettings,
    resolver: Box<dyn UriResolver>,
    client: RwLock<Option<Client>>,
    database: RwLock<Option<String>>,
}

impl MongoConnection {
    /// Creates a closed manager that resolves its URI through a custom
    /// resolver instead of the built-in static one.
    pub fn with_resolver(settings: ConnectionSettings, resolver: Box<dyn UriResolver>) -> Self {
        Self {
            settings,
            resolver,
            client: RwLock::new(None),
            database: RwLock::new(None),
        }
    }

    /// Returns a clone of the live client, once open.
    pub fn client(&self) -> Option<Client> {
        self.client.read().clone()
    }

    fn apply_settings(&self, options: &mut ClientOptions) {
        let opts = &self.settings.options;
        options.max_pool_size = Some(opts.max_pool_size);
        options.connect_timeout = Some(Duration::from_millis(opts.connect_timeout));
        // The connect timeout bounds server selection as well, so an
        // unreachable deployment fails within it instead of hanging on
        // the driver's 30s default.
        options.server_selection_timeout = Some(Duration::from_millis(opts.connect_timeout));
    }

    fn collection(&self, name: &str) -> StoreResult<mongodb::Collection<Document>> {
        let guard = self.client.read();
        let Some(client) = guard.as_ref() else {
            return Err(StoreError::invalid_state(
                codes::NOT_OPENED,
                "Mongodb connection is not open",
            ));
        };
        let Some(database) = self.database.read().clone() else {
            return Err(StoreError::invalid_state(
                codes::NOT_OPENED,
                "Mongodb connection is not open",
            ));
        };
        Ok(client.database(&database).collection::<Document>(name))
    }
}

#[async_trait]
impl StoreConnection for MongoConnection {
    fn create(settings: ConnectionSettings) -> Self {
        let resolver = StaticUriResolver::new(settings.clone());
        Self::with_resolver(settings, Box::new(resolver))
    }

    fn is_open(&self) -> bool {
        self.client.read().is_some()
    }

    async fn open(&self, trace_id: Option<&str>) -> StoreResult<()> {
        if self.is_open() {
            return Ok(());
        }

        let uri = match self.resolver.resolve(trace_id).await {
            Ok(uri) => uri,
            Err(err @ StoreError::Connection { .. }) => return Err(err),
            Err(err) => {
                return Err(StoreError::connection_from(
                    "Failed to resolve mongodb connection",
                    err,
                ));
            }
        };

        tracing::debug!(trace_id = trace_id.unwrap_or("-"), "Connecting to mongodb");

        let mut options = ClientOptions::parse(&uri)
            .await
            .map_err(|e| StoreError::connection_from("Connection to mongodb failed", e))?;
        self.apply_settings(&mut options);

        let client = Client::with_options(options)
            .map_err(|e| StoreError::connection_from("Connection to mongodb failed", e))?;

        let database = client
            .default_database()
            .map(|db| db.name().to_string())
            .or_else(|| self.settings.connection.database.clone())
            .unwrap_or_else(|| "test".to_string());

        // The driver connects lazily; a ping proves the deployment is
        // actually reachable before the manager reports open.
        if let Err(err) = client
            .database(&database)
            .run_command(doc! { "ping": 1 })
            .await
        {
            tracing::warn!(
                trace_id = trace_id.unwrap_or("-"),
                "Connection to mongodb failed: {}",
                err
            );
            return Err(StoreError::connection_from(
                "Connection to mongodb failed",
                err,
            ));
        }

        *self.client.write() = Some(client);
        *self.database.write() = Some(database.clone());

        tracing::debug!(
            trace_id = trace_id.unwrap_or("-"),
            "Connected to mongodb database {}",
            database
        );
        Ok(())
    }

    async fn close(&self, trace_id: Option<&str>) -> StoreResult<()> {
        let Some(client) = self.client.write().take() else {
            return Ok(());
        };
        let database = self.database.write().take();

        client.shutdown().await;

        tracing::debug!(
            trace_id = trace_id.unwrap_or("-"),
            "Disconnected from mongodb database {}",
            database.as_deref().unwrap_or("-")
        );
        Ok(())
    }

    fn database_name(&self) -> Option<String> {
        self.database.read().clone()
    }

    async fn find(&self, collection: &str, query: Query) -> StoreResult<Vec<Document>> {
        let Query {
            filter,
            sort,
            projection,
            skip,
            limit,
        } = query;

        let mut options = FindOptions::default();
        options.sort = sort;
        options.projection = projection;
        options.skip = skip;
        if let Some(limit) = limit {
            options.limit = Some(limit as i64);
        }

        self.collection(collection)?
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| StoreError::connection_from("Query to mongodb failed", e))?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(|e| StoreError::connection_from("Query to mongodb failed", e))
    }

    async fn count(&self, collection: &str, filter: Document) -> StoreResult<u64> {
        self.collection(collection)?
            .count_documents(filter)
            .await
            .map_err(|e| StoreError::connection_from("Count in mongodb failed", e))
    }

    async fn insert_one(&self, collection: &str, doc: Document) -> StoreResult<Document> {
        let mut doc = doc;
        let result = self
            .collection(collection)?
            .insert_one(doc.clone())
            .await
            .map_err(|e| StoreError::connection_from("Insert into mongodb failed", e))?;

        // The post-image carries the identity the server assigned.
        if !doc.contains_key("_id") {
            doc.insert("_id", result.inserted_id);
        }
        Ok(doc)
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
        upsert: bool,
    ) -> StoreResult<Option<Document>> {
        self.collection(collection)?
            .find_one_and_replace(filter, replacement)
            .upsert(upsert)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| StoreError::connection_from("Update in mongodb failed", e))
    }

    async fn patch_one(
        &self,
        collection: &str,
        filter: Document,
        fields: Document,
    ) -> StoreResult<Option<Document>> {
        self.collection(collection)?
            .find_one_and_update(filter, doc! { "$set": fields })
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| StoreError::connection_from("Update in mongodb failed", e))
    }

    async fn remove_one(
        &self,
        collection: &str,
        filter: Document,
    ) -> StoreResult<Option<Document>> {
        self.collection(collection)?
            .find_one_and_delete(filter)
            .await
            .map_err(|e| StoreError::connection_from("Delete in mongodb failed", e))
    }

    async fn remove_many(&self, collection: &str, filter: Document) -> StoreResult<u64> {
        Ok(self
            .collection(collection)?
            .delete_many(filter)
            .await
            .map_err(|e| StoreError::connection_from("Delete in mongodb failed", e))?
            .deleted_count)
    }

    async fn ensure_index(
        &self,
        collection: &str,
        keys: Document,
        unique: bool,
    ) -> StoreResult<()> {
        self.collection(collection)?
            .create_index(
                IndexModel::builder()
                    .keys(keys)
                    .options(IndexOptions::builder().unique(unique).build())
                    .build(),
            )
            .await
            .map_err(|e| StoreError::connection_from("Creating mongodb index failed", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_starts_closed() {
        let connection = MongoConnection::create(ConnectionSettings::default().host("localhost"));
        assert!(!connection.is_open());
        assert_eq!(connection.database_name(), None);
        assert!(connection.client().is_none());
    }

    #[tokio::test]
    async fn operations_before_open_report_not_opened() {
        let connection = MongoConnection::create(ConnectionSettings::default().host("localhost"));
        let err = connection.count("things", doc! {}).await.unwrap_err();
        assert_eq!(err.code(), Some(codes::NOT_OPENED));
    }

    #[tokio::test]
    async fn close_before_open_is_a_noop() {
        let connection = MongoConnection::create(ConnectionSettings::default().host("localhost"));
        connection.close(None).await.unwrap();
        assert!(!connection.is_open());
    }

    #[tokio::test]
    async fn open_without_target_fails_with_connection_error() {
        let connection = MongoConnection::create(ConnectionSettings::default());
        let err = connection.open(None).await.unwrap_err();
        assert_eq!(err.code(), Some(codes::CONNECT_FAILED));
        assert!(err.cause().is_some_and(|cause| cause.contains("NO_HOST")));
        assert!(!connection.is_open());
    }

    #[tokio::test]
    async fn settings_shape_the_client_options() {
        let connection = MongoConnection::create(ConnectionSettings::default().host("localhost"));
        let mut options = ClientOptions::parse("mongodb://localhost:27017/test")
            .await
            .unwrap();
        connection.apply_settings(&mut options);

        assert_eq!(options.max_pool_size, Some(2));
        assert_eq!(options.connect_timeout, Some(Duration::from_millis(5_000)));
        assert_eq!(
            options.server_selection_timeout,
            Some(Duration::from_millis(5_000))
        );
    }
}
