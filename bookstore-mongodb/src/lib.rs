//! MongoDB backend for the bookstore runner.
//!
//! This crate provides a MongoDB-based implementation of the `BookstoreBackend`
//! trait. Filters and aggregation pipelines are translated into MongoDB's native
//! BSON syntax and executed by the server; explain output is condensed into an
//! `ExplainSummary`.
//!
//! # Features
//!
//! - **Query translation** - Filters, projections, sort keys, skip and limit map onto `find` options
//! - **Aggregation** - Pipelines are rendered stage by stage and run with `aggregate`
//! - **Indexing** - Named single-field and compound indexes, and dropping all indexes
//! - **Explain** - `executionStats` explain output for both classic and slot-based plans
//!
//! # Connection
//!
//! The builder takes a MongoDB connection string and a database name. Building
//! pings the server, so an unreachable deployment fails fast.
//!
//! # Example
//!
//! ```ignore
//! use bookstore_core::backend::{BookstoreBackend, BookstoreBackendBuilder};
//! use bookstore_mongodb::MongoDbBookstore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MongoDbBookstore::builder("mongodb://localhost:27017", "plp_bookstore")
//!         .build()
//!         .await?;
//!
//!     store.shutdown().await?;
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as bookstore_mongodb;

pub mod store;
pub(crate) mod explain;
pub(crate) mod query;

pub use store::{MongoDbBookstore, MongoDbBookstoreBuilder};
