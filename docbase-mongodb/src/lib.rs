//! MongoDB connection manager for docbase.
//!
//! This crate provides a MongoDB-based implementation of the
//! `StoreConnection` trait, enabling persistent document storage with the
//! store's own filter, sort, and projection notation passed straight
//! through to the server.
//!
//! To use this backend through the facade, include the `mongodb` feature
//! in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! docbase = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Features
//!
//! - **Persistent storage** - Data is persisted to MongoDB Atlas or self-hosted MongoDB
//! - **Native queries** - Filters, sorts, and projections run on the server
//! - **Async/await** - Fully asynchronous API built on MongoDB's async driver
//! - **Indexing** - Support for ensuring indexes on bound collections
//!
//! # Connection
//!
//! The manager needs one final connection URI. By default it composes one
//! from its static settings through [`StaticUriResolver`]; deployments
//! with service discovery or credential stores can supply their own
//! [`UriResolver`](docbase_core::connection::UriResolver) instead.
//!
//! # Example
//!
//! ```ignore
//! use docbase_core::config::ConnectionSettings;
//! use docbase_core::connection::StoreConnection;
//! use docbase_mongodb::MongoConnection;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let connection = MongoConnection::create(
//!         ConnectionSettings::default()
//!             .host("localhost")
//!             .database("my_database"),
//!     );
//!     connection.open(None).await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docbase_mongodb;

pub mod connection;
pub mod resolver;

pub use connection::MongoConnection;
pub use resolver::StaticUriResolver;
