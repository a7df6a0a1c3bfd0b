//! # bookstore
//!
//! A scripted query runner for a bookstore collection. It connects to a
//! document database, runs four ordered groups of operations against the
//! `books` collection and prints a readable summary of each:
//!
//! - **Basic CRUD** - Equality and range reads, one price update and one delete
//! - **Advanced queries** - Compound filters, projections, sorting and pagination
//! - **Aggregation pipelines** - Averages by genre, the top author and books per decade
//! - **Indexing and explain** - Query plans before and after single-field and compound indexes
//!
//! Each group runs on its own connection, which is released when the group
//! finishes. A failing group stops the run.
//!
//! # Example
//!
//! ```ignore
//! use bookstore::{prelude::*, memory::InMemoryBookstore};
//!
//! #[tokio::main]
//! async fn main() -> BookstoreResult<()> {
//!     let store = InMemoryBookstore::new();
//!     let mut report = Report::stdout();
//!
//!     Runner::new(store.connector(), RunnerConfig::default())
//!         .run(&mut report)
//!         .await
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-memory backend for development and testing
//! - [`mongodb`] - MongoDB backend (requires `mongodb` feature)

pub mod collection;
pub mod config;
pub mod prelude;
pub mod report;
pub mod runner;
pub mod tasks;

pub use bookstore_core::{backend, book, error, explain, index, page, pipeline, query};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend.
pub mod memory {
    pub use bookstore_memory::{InMemoryBookstore, InMemoryBookstoreBuilder, SessionStats};
}

/// MongoDB storage backend.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use bookstore_mongodb::{MongoDbBookstore, MongoDbBookstoreBuilder};
}
