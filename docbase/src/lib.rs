//! Main docbase crate providing a reusable persistence layer for document
//! databases.
//!
//! This crate is the primary entry point for users of the docbase framework.
//! It re-exports the core types from the sub-crates and provides convenient
//! access to the storage backends.
//!
//! The layer splits persistence into two halves. A **connection manager**
//! owns one database handle: it resolves where to connect, opens and closes
//! the handle, and reports readiness. A **persistence component** binds one
//! collection on a connection manager and runs filtered, paged, and sorted
//! operations over it; the identifiable layer on top adds CRUD keyed by a
//! string `id`. Concrete data stores specialize a persistence component by
//! supplying a collection name, a record shape, and their own typed filter
//! methods.
//!
//! # Features
//!
//! - **Typed records** - Define record shapes with Serde and convert them to stored documents automatically
//! - **Multiple backends** - In-memory and MongoDB connection managers behind one seam
//! - **Store-notation queries** - Filters, sorts, and projections are plain BSON documents
//! - **Shared connections** - Many persistence components can share one connection manager
//!
//! # Quick Start
//!
//! ```ignore
//! use docbase::prelude::*;
//! use docbase::memory::MemoryConnection;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Dummy {
//!     pub id: Option<String>,
//!     pub key: String,
//!     pub content: String,
//! }
//!
//! impl Identifiable for Dummy {
//!     fn id(&self) -> Option<&str> { self.id.as_deref() }
//! }
//!
//! #[tokio::main]
//! async fn main() -> StoreResult<()> {
//!     // An identifiable persistence component over the in-memory backend
//!     let mut dummies: IdentifiablePersistence<MemoryConnection, Dummy> =
//!         IdentifiablePersistence::new("dummies");
//!     dummies.open(None).await?;
//!
//!     // Create assigns an id when the caller left it unset
//!     let created = dummies
//!         .create(None, &Dummy { id: None, key: "1".into(), content: "first".into() })
//!         .await?;
//!
//!     // Fetch it back by id
//!     let found = dummies
//!         .get_one_by_id(None, created.id.as_deref().unwrap_or_default())
//!         .await?;
//!     println!("found {:?}", found);
//!
//!     dummies.close(None).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Shared connections
//!
//! By defining a connection manager once and sharing it through a
//! [`References`](references::References) registry, multiple persistence
//! components reuse the same database handle:
//!
//! ```ignore
//! use std::sync::Arc;
//! use docbase::prelude::*;
//! use docbase::memory::MemoryConnection;
//!
//! let connection = Arc::new(MemoryConnection::new());
//! connection.open(None).await?;
//!
//! let mut references = References::new();
//! references.put("connection", connection.clone());
//!
//! let mut dummies: IdentifiablePersistence<MemoryConnection, Dummy> =
//!     IdentifiablePersistence::new("dummies");
//! dummies.set_references(&references);
//! dummies.open(None).await?;
//!
//! // Closing the component leaves the shared manager open for others.
//! dummies.close(None).await?;
//! assert!(connection.is_open());
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory storage for development and testing
//! - [`mongodb`] - Persistent MongoDB backend (requires the `mongodb` feature)

pub mod prelude;

pub use docbase_core::{
    collection, config, connection, error, identifiable, page, persistence, query, record,
    references,
};

// Re-export BSON types for convenience
pub use bson;

/// In-memory backend implementations.
pub mod memory {
    pub use docbase_memory::MemoryConnection;
}

/// MongoDB backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docbase_mongodb::{MongoConnection, StaticUriResolver};
}
