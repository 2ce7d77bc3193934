//! The connection manager seam implemented by storage backends.
//!
//! A connection manager owns one live store session: it resolves the
//! connection target from its settings, opens and closes the session, and
//! executes the document operations that collection bindings delegate to it.
//!
//! # Traits
//!
//! - [`StoreConnection`]: lifecycle plus document operations, implemented
//!   per backend
//! - [`UriResolver`]: the external discovery seam that produces the final
//!   connection URI
//!
//! # Lifecycle
//!
//! A manager starts unopened. [`open`](StoreConnection::open) transitions it
//! to open, verifying the session in the process; a failed open leaves it
//! unopened. [`close`](StoreConnection::close) tears the session down and is
//! a silent no-op on an unopened manager. Reopening after close is
//! supported.
//!
//! Implementations are shared across tasks (`Send + Sync`), so lifecycle
//! methods take `&self` and use interior mutability for the session slot.

use async_trait::async_trait;
use bson::Document;
use std::fmt::Debug;

use crate::{config::ConnectionSettings, error::StoreResult, query::Query};

/// Abstract interface for store connection managers.
///
/// Implementers hold the live session to one logical database and expose
/// the document operations of the layer. All errors are
/// [`StoreError`](crate::error::StoreError) values; connectivity problems
/// surface as `Connection` failures with the backend's own error as cause.
///
/// The `trace_id` threaded through lifecycle methods is an opaque
/// correlation token used only for logging; `None` is always acceptable.
#[async_trait]
pub trait StoreConnection: Send + Sync + Debug + 'static {
    /// Constructs an unopened manager from the given settings.
    ///
    /// Used by persistence components that own a private manager. No IO
    /// happens here; the target is resolved at open time.
    fn create(settings: ConnectionSettings) -> Self
    where
        Self: Sized;

    /// Returns `true` while a live session is held.
    ///
    /// Readiness is derived from the session slot itself, not from a
    /// separately tracked flag. A session that drops silently surfaces on
    /// the next operation rather than here.
    fn is_open(&self) -> bool;

    /// Resolves the connection target and establishes the session.
    ///
    /// Opening an already-open manager is a no-op success. On failure the
    /// manager stays unopened and the error carries the underlying cause;
    /// a failed target resolution fails the same way, before any connect
    /// attempt.
    async fn open(&self, trace_id: Option<&str>) -> StoreResult<()>;

    /// Tears the session down.
    ///
    /// Closing an unopened manager succeeds silently.
    async fn close(&self, trace_id: Option<&str>) -> StoreResult<()>;

    /// Returns the logical database name once open.
    fn database_name(&self) -> Option<String>;

    /// Runs a query against a collection and returns the matching documents.
    async fn find(&self, collection: &str, query: Query) -> StoreResult<Vec<Document>>;

    /// Counts the documents matching a filter.
    async fn count(&self, collection: &str, filter: Document) -> StoreResult<u64>;

    /// Inserts one document and returns the stored post-image.
    ///
    /// When the document carries no `_id`, the backend assigns one; the
    /// post-image always has it.
    async fn insert_one(&self, collection: &str, doc: Document) -> StoreResult<Document>;

    /// Replaces the first document matching the filter, returning the
    /// post-image.
    ///
    /// With `upsert` set, a missing match inserts the replacement instead
    /// and the post-image is always present. Without it, a missing match
    /// returns `None`.
    async fn replace_one(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
        upsert: bool,
    ) -> StoreResult<Option<Document>>;

    /// Applies a partial field update to the first document matching the
    /// filter, returning the post-image, or `None` when nothing matched.
    async fn patch_one(
        &self,
        collection: &str,
        filter: Document,
        fields: Document,
    ) -> StoreResult<Option<Document>>;

    /// Removes the first document matching the filter, returning the
    /// pre-image, or `None` when nothing matched.
    async fn remove_one(&self, collection: &str, filter: Document)
    -> StoreResult<Option<Document>>;

    /// Removes every document matching the filter, returning the removed
    /// count.
    async fn remove_many(&self, collection: &str, filter: Document) -> StoreResult<u64>;

    /// Creates an index over the given key document when the backend
    /// supports indexes; otherwise a no-op.
    async fn ensure_index(&self, collection: &str, keys: Document, unique: bool)
    -> StoreResult<()>;
}

/// Produces the final connection URI for a manager.
///
/// The default implementation in each backend composes the URI from static
/// settings. Deployments with service discovery or external credential
/// stores swap in their own resolver.
#[async_trait]
pub trait UriResolver: Send + Sync + Debug {
    /// Resolves the ready-to-use connection URI.
    ///
    /// Fails when no target can be determined; managers surface that at
    /// open time as a connection failure with this error as the cause.
    async fn resolve(&self, trace_id: Option<&str>) -> StoreResult<String>;
}
