//! Convenient re-exports of commonly used types from docbase.
//!
//! Import this prelude module to quickly access the most frequently used
//! types and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use docbase::prelude::*;
//! ```
//!
//! This provides access to:
//! - The persistence engine and the identifiable layer on top
//! - Connection seam traits and configuration types
//! - Paging, query, and record conversion types
//! - Error types and stable error codes

pub use docbase_core::{
    collection::CollectionBinding,
    config::{
        ConnectionOptions, ConnectionSettings, ConnectionTarget, Dependencies, PersistenceConfig,
    },
    connection::{StoreConnection, UriResolver},
    error::{StoreError, StoreResult, codes},
    identifiable::IdentifiablePersistence,
    page::{DataPage, PagingParams},
    persistence::Persistence,
    query::Query,
    record::{DocumentSchema, Identifiable, RecordSchema, SerdeSchema, generate_id},
    references::References,
};
