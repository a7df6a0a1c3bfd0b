//! Storage backend abstraction for the bookstore runner.
//!
//! This module defines the traits that abstract over the database the runner
//! talks to, so the same task groups can run against MongoDB or against the
//! in-memory backend used in tests.
//!
//! # Overview
//!
//! The [`BookstoreBackend`] trait exposes the handful of collection operations
//! the runner performs: find, update, delete, aggregate, index management and
//! explain. It is object safe, so task groups receive a `&dyn BookstoreBackend`.
//!
//! A [`BookstoreBackendBuilder`] opens one connection. The runner clones its
//! builder for every task group, builds a backend, and shuts it down once the
//! group finishes.
//!
//! # Examples
//!
//! ```ignore
//! use bookstore_core::{backend::BookstoreBackend, query::{Filter, Query}};
//!
//! let fiction = backend
//!     .find("books", Query::filtered(Filter::eq("genre", "Fiction")))
//!     .await?;
//! ```

use async_trait::async_trait;
use bson::Document;
use std::fmt::Debug;

use crate::{
    error::BookstoreResult,
    explain::ExplainSummary,
    index::IndexSpec,
    pipeline::Pipeline,
    query::{Expr, Query, Update, UpdateOutcome},
};

/// Abstract interface for the database behind the runner.
///
/// # Error Handling
///
/// Operations return [`BookstoreResult<T>`](crate::error::BookstoreResult).
/// Backends report a missing index as
/// [`BookstoreError::IndexNotFound`](crate::error::BookstoreError::IndexNotFound)
/// and any other failure of the underlying store as
/// [`BookstoreError::Backend`](crate::error::BookstoreError::Backend).
#[async_trait]
pub trait BookstoreBackend: Send + Sync + Debug {
    /// Returns every document matching the query, honoring its projection, sort
    /// keys, offset and limit.
    async fn find(&self, collection: &str, query: Query) -> BookstoreResult<Vec<Document>>;

    /// Returns the first document matching the filter, if any.
    async fn find_one(&self, collection: &str, filter: Expr) -> BookstoreResult<Option<Document>>;

    /// Applies `update` to the first document matching the filter.
    ///
    /// `modified` is zero when no document matched or when the update left the
    /// matched document unchanged.
    async fn update_one(
        &self,
        collection: &str,
        filter: Expr,
        update: Update,
    ) -> BookstoreResult<UpdateOutcome>;

    /// Deletes the first document matching the filter and returns how many were deleted.
    async fn delete_one(&self, collection: &str, filter: Expr) -> BookstoreResult<u64>;

    /// Runs an aggregation pipeline over the collection.
    async fn aggregate(&self, collection: &str, pipeline: Pipeline) -> BookstoreResult<Vec<Document>>;

    /// Creates an index and returns its name.
    async fn create_index(&self, collection: &str, index: IndexSpec) -> BookstoreResult<String>;

    /// Drops every index on the collection except the one on `_id`.
    async fn drop_indexes(&self, collection: &str) -> BookstoreResult<()>;

    /// Reports how the backend would execute `query`, with execution statistics.
    async fn explain(&self, collection: &str, query: Query) -> BookstoreResult<ExplainSummary>;

    /// Cleanly shuts down the backend, releasing its connection.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> BookstoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

/// Factory trait for opening a backend connection.
#[async_trait]
pub trait BookstoreBackendBuilder {
    type Backend: BookstoreBackend;

    async fn build(self) -> BookstoreResult<Self::Backend>;
}
