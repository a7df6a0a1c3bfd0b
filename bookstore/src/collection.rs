//! A named collection bound to an open backend.
//!
//! [`BookCollection`] is the handle task groups work with: it forwards every
//! call to the backend with its collection name. Results stay raw documents,
//! so a book missing a field or storing a decimal price still prints.

use bson::Document;

use bookstore_core::{
    backend::BookstoreBackend,
    error::BookstoreResult,
    explain::ExplainSummary,
    index::IndexSpec,
    pipeline::Pipeline,
    query::{Expr, Query, Update, UpdateOutcome},
};

/// A collection reference over a dynamically dispatched backend.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the backend reference
#[derive(Debug, Clone, Copy)]
pub struct BookCollection<'a> {
    name: &'a str,
    backend: &'a dyn BookstoreBackend,
}

impl<'a> BookCollection<'a> {
    pub fn new(name: &'a str, backend: &'a dyn BookstoreBackend) -> Self {
        Self { name, backend }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        self.name
    }

    /// Finds every document matching `filter`, in storage order.
    pub async fn find_matching(&self, filter: Expr) -> BookstoreResult<Vec<Document>> {
        self.backend.find(self.name, Query::filtered(filter)).await
    }

    pub async fn find(&self, query: Query) -> BookstoreResult<Vec<Document>> {
        self.backend.find(self.name, query).await
    }

    pub async fn find_one(&self, filter: Expr) -> BookstoreResult<Option<Document>> {
        self.backend.find_one(self.name, filter).await
    }

    pub async fn update_one(&self, filter: Expr, update: Update) -> BookstoreResult<UpdateOutcome> {
        self.backend.update_one(self.name, filter, update).await
    }

    pub async fn delete_one(&self, filter: Expr) -> BookstoreResult<u64> {
        self.backend.delete_one(self.name, filter).await
    }

    pub async fn aggregate(&self, pipeline: Pipeline) -> BookstoreResult<Vec<Document>> {
        self.backend.aggregate(self.name, pipeline).await
    }

    pub async fn create_index(&self, index: IndexSpec) -> BookstoreResult<String> {
        self.backend.create_index(self.name, index).await
    }

    pub async fn drop_indexes(&self) -> BookstoreResult<()> {
        self.backend.drop_indexes(self.name).await
    }

    pub async fn explain(&self, query: Query) -> BookstoreResult<ExplainSummary> {
        self.backend.explain(self.name, query).await
    }
}
