//! In-memory connection manager for docbase.
//!
//! This crate provides a thread-safe, in-memory implementation of the
//! `StoreConnection` trait. It keeps documents in plain vectors behind an
//! async-aware read-write lock and interprets a practical subset of store
//! filter notation, which makes it ideal for development, testing, and
//! small-scale deployments.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using an async-aware RwLock
//! - **Store-notation filters** - Equality, comparisons, `$in`/`$nin`, `$exists`, `$not`, `$and`/`$or`
//! - **Stable ordering** - Unsorted reads come back in insertion order, so paging is predictable
//! - **Zero setup** - No server, no configuration required
//!
//! # Quick Start
//!
//! ```ignore
//! use docbase::identifiable::IdentifiablePersistence;
//! use docbase::memory::MemoryConnection;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct User {
//!     pub id: Option<String>,
//!     pub name: String,
//! }
//!
//! impl docbase::record::Identifiable for User {
//!     fn id(&self) -> Option<&str> {
//!         self.id.as_deref()
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut users: IdentifiablePersistence<MemoryConnection, User> =
//!         IdentifiablePersistence::new("users");
//!     users.open(None).await?;
//!
//!     let created = users.create(None, &User { id: None, name: "Alice".into() }).await?;
//!     println!("created {:?}", created.id);
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docbase_memory;

pub mod connection;
pub mod evaluator;

pub use connection::MemoryConnection;
