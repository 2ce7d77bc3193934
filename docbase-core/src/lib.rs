//! A reusable persistence layer for document databases.
//!
//! This crate is the core of the docbase project and provides:
//!
//! - **Configuration** ([`config`]) - Settings structs for connections and persistence components
//! - **Connection seam** ([`connection`]) - Traits implemented by storage backends
//! - **Collection bindings** ([`collection`]) - A bound query surface for one collection
//! - **Persistence engine** ([`persistence`]) - Generic collection-bound CRUD and query operations
//! - **Identity overlay** ([`identifiable`]) - Id-keyed operations for records with a logical id
//! - **Record conversion** ([`record`]) - Public/internal record form conversion
//! - **Reference registry** ([`references`]) - By-tag lookup of shared components
//! - **Paging** ([`page`]) - Paging parameters and result pages
//! - **Error handling** ([`error`]) - Error taxonomy and result types
//!
//! # Example
//!
//! ```ignore
//! use docbase::prelude::*;
//! use docbase::memory::MemoryConnection;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Dummy {
//!     #[serde(default)]
//!     pub id: Option<String>,
//!     pub key: String,
//!     pub content: String,
//! }
//!
//! impl Identifiable for Dummy {
//!     fn id(&self) -> Option<&str> {
//!         self.id.as_deref()
//!     }
//! }
//!
//! let mut store: IdentifiablePersistence<MemoryConnection, Dummy> =
//!     IdentifiablePersistence::new("dummies");
//! ```

#[allow(unused_extern_crates)]
extern crate self as docbase_core;

pub mod collection;
pub mod config;
pub mod connection;
pub mod error;
pub mod identifiable;
pub mod page;
pub mod persistence;
pub mod query;
pub mod record;
pub mod references;
