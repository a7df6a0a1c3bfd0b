//! In-memory bookstore backend.
//!
//! This crate provides a thread-safe, in-memory implementation of the
//! `BookstoreBackend` trait. It evaluates the same filters, projections, sorts
//! and aggregation pipelines the runner sends to MongoDB, so the runner can be
//! exercised end to end without a database server.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using an async-aware RwLock
//! - **Full query support** - Filtering, projection, multi-key sorting, skip and limit
//! - **Aggregation** - Group (`$sum`, `$avg`), project, sort and limit stages
//! - **Explain** - Plan summaries that reflect the index definitions created on a collection
//! - **Session accounting** - Counts connections opened and shut down through builders
//!
//! # Quick Start
//!
//! ```ignore
//! use bookstore_memory::InMemoryBookstore;
//! use bookstore_core::backend::{BookstoreBackend, BookstoreBackendBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = InMemoryBookstore::new();
//!     let session = store.connector().build().await?;
//!
//!     session.drop_indexes("books").await.ok();
//!     session.shutdown().await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as bookstore_memory;

pub mod store;
pub(crate) mod aggregate;
pub(crate) mod evaluator;
pub(crate) mod planner;

pub use store::{InMemoryBookstore, InMemoryBookstoreBuilder, SessionStats};
