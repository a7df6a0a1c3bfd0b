//! In-memory storage implementation of the bookstore backend.
//!
//! Documents are kept per collection in insertion order behind an async-aware
//! read-write lock. Index definitions are recorded per collection and only
//! feed the query planner used by `explain`.

use std::{
    collections::HashMap,
    sync::{Arc, atomic::{AtomicUsize, Ordering}},
};
use async_trait::async_trait;
use mea::rwlock::RwLock;
use bson::{Document, oid::ObjectId};

use bookstore_core::{
    backend::{BookstoreBackend, BookstoreBackendBuilder},
    error::{BookstoreError, BookstoreResult},
    explain::ExplainSummary,
    index::IndexSpec,
    pipeline::Pipeline,
    query::{Expr, Query, Update, UpdateOutcome},
};

use crate::{
    aggregate::run_pipeline,
    evaluator::{DocumentEvaluator, sort_documents},
    planner::QueryPlan,
};

#[derive(Debug, Default, Clone)]
struct CollectionState {
    documents: Vec<Document>,
    indexes: Vec<IndexSpec>,
}

type StoreMap = HashMap<String, CollectionState>;

/// Number of connections opened and shut down against a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub opened: usize,
    pub closed: usize,
}

/// Thread-safe in-memory bookstore backend.
///
/// `InMemoryBookstore` is cloneable and every clone shares the same underlying
/// data, so a store seeded by a test can be handed to the runner through
/// [`InMemoryBookstore::connector`] and inspected afterwards.
///
/// # Example
///
/// ```ignore
/// use bookstore_memory::InMemoryBookstore;
/// use bookstore_core::{backend::BookstoreBackend, query::{Filter, Query}};
/// use bson::doc;
///
/// let store = InMemoryBookstore::new();
/// store.insert_many("books", vec![doc! { "title": "Dune", "genre": "Fiction" }]).await?;
///
/// let fiction = store.find("books", Query::filtered(Filter::eq("genre", "Fiction"))).await?;
/// assert_eq!(fiction.len(), 1);
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryBookstore {
    /// collection_name -> documents and index definitions
    store: Arc<RwLock<StoreMap>>,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl InMemoryBookstore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder whose connections all share this store's data.
    pub fn connector(&self) -> InMemoryBookstoreBuilder {
        InMemoryBookstoreBuilder { store: self.clone() }
    }

    /// Inserts documents into a collection, creating the collection if needed.
    ///
    /// Documents without an `_id` are given a fresh `ObjectId`.
    pub async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> BookstoreResult<()> {
        let mut store = self.store.write().await;
        let state = store
            .entry(collection.to_string())
            .or_default();

        for mut document in documents {
            if !document.contains_key("_id") {
                document.insert("_id", ObjectId::new());
            }
            state.documents.push(document);
        }

        Ok(())
    }

    /// Connections opened through builders and released through `shutdown`.
    pub fn session_stats(&self) -> SessionStats {
        SessionStats {
            opened: self.opened.load(Ordering::SeqCst),
            closed: self.closed.load(Ordering::SeqCst),
        }
    }

    /// Names of the indexes currently defined on `collection`.
    pub async fn index_names(&self, collection: &str) -> Vec<String> {
        self.store
            .read()
            .await
            .get(collection)
            .map(|state| state.indexes.iter().map(|index| index.name.clone()).collect())
            .unwrap_or_default()
    }

    fn first_match(documents: &[Document], filter: &Expr) -> BookstoreResult<Option<usize>> {
        for (position, document) in documents.iter().enumerate() {
            if DocumentEvaluator::new(document).evaluate(filter)? {
                return Ok(Some(position));
            }
        }

        Ok(None)
    }

    /// Filters, sorts, and pages `documents` without projecting them.
    fn select(documents: &[Document], query: &Query) -> BookstoreResult<Vec<Document>> {
        let mut selected = Vec::new();
        for document in documents {
            if DocumentEvaluator::matches(document, query.filter.as_ref())? {
                selected.push(document.clone());
            }
        }

        sort_documents(&mut selected, &query.sort);

        Ok(selected
            .into_iter()
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .collect())
    }
}


#[async_trait]
impl BookstoreBackend for InMemoryBookstore {
    async fn find(&self, collection: &str, query: Query) -> BookstoreResult<Vec<Document>> {
        let store = self.store.read().await;
        let state = match store.get(collection) {
            Some(state) => state,
            None => return Ok(vec![]),
        };

        let selected = Self::select(&state.documents, &query)?;

        Ok(match &query.projection {
            Some(projection) => selected.iter().map(|document| projection.apply(document)).collect(),
            None => selected,
        })
    }

    async fn find_one(&self, collection: &str, filter: Expr) -> BookstoreResult<Option<Document>> {
        let store = self.store.read().await;
        let state = match store.get(collection) {
            Some(state) => state,
            None => return Ok(None),
        };

        Ok(Self::first_match(&state.documents, &filter)?
            .map(|position| state.documents[position].clone()))
    }

    async fn update_one(&self, collection: &str, filter: Expr, update: Update) -> BookstoreResult<UpdateOutcome> {
        let mut store = self.store.write().await;
        let state = match store.get_mut(collection) {
            Some(state) => state,
            None => return Ok(UpdateOutcome::default()),
        };

        let Some(position) = Self::first_match(&state.documents, &filter)? else {
            return Ok(UpdateOutcome::default());
        };

        if update.set.iter().any(|(field, _)| field == "_id") {
            return Err(BookstoreError::InvalidDocument(
                "the _id field cannot be modified".to_string(),
            ));
        }

        let document = &mut state.documents[position];
        let mut modified = false;
        for (field, value) in update.set {
            if document.get(&field) != Some(&value) {
                document.insert(field, value);
                modified = true;
            }
        }

        Ok(UpdateOutcome { matched: 1, modified: u64::from(modified) })
    }

    async fn delete_one(&self, collection: &str, filter: Expr) -> BookstoreResult<u64> {
        let mut store = self.store.write().await;
        let state = match store.get_mut(collection) {
            Some(state) => state,
            None => return Ok(0),
        };

        match Self::first_match(&state.documents, &filter)? {
            Some(position) => {
                state.documents.remove(position);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn aggregate(&self, collection: &str, pipeline: Pipeline) -> BookstoreResult<Vec<Document>> {
        let documents = self.store
            .read()
            .await
            .get(collection)
            .map(|state| state.documents.clone())
            .unwrap_or_default();

        run_pipeline(documents, &pipeline)
    }

    async fn create_index(&self, collection: &str, index: IndexSpec) -> BookstoreResult<String> {
        if index.keys.is_empty() {
            return Err(BookstoreError::InvalidQuery(format!(
                "index {} must have at least one key",
                index.name
            )));
        }

        let mut store = self.store.write().await;
        let state = store
            .entry(collection.to_string())
            .or_default();

        if let Some(existing) = state.indexes.iter().find(|existing| existing.name == index.name) {
            if existing.keys != index.keys {
                return Err(BookstoreError::Backend(format!(
                    "an index named {} already exists with a different key pattern",
                    index.name
                )));
            }
            return Ok(index.name);
        }

        let name = index.name.clone();
        state.indexes.push(index);

        Ok(name)
    }

    async fn drop_indexes(&self, collection: &str) -> BookstoreResult<()> {
        let mut store = self.store.write().await;

        match store.get_mut(collection) {
            Some(state) => {
                state.indexes.clear();
                Ok(())
            }
            None => Err(BookstoreError::CollectionNotFound(collection.to_string())),
        }
    }

    async fn explain(&self, collection: &str, query: Query) -> BookstoreResult<ExplainSummary> {
        let store = self.store.read().await;
        let state = store.get(collection).cloned().unwrap_or_default();

        let returned = Self::select(&state.documents, &query)?.len() as u64;

        QueryPlan::choose(&state.indexes, &query).explain(&state.documents, &query, returned)
    }

    async fn shutdown(self) -> BookstoreResult<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);

        Ok(())
    }
}


/// Builder for opening [`InMemoryBookstore`] connections.
///
/// Created with [`InMemoryBookstore::connector`], it reopens the store it was
/// created from. Every `build` counts as one opened session.
#[derive(Clone, Debug)]
pub struct InMemoryBookstoreBuilder {
    store: InMemoryBookstore,
}

#[async_trait]
impl BookstoreBackendBuilder for InMemoryBookstoreBuilder {
    type Backend = InMemoryBookstore;

    async fn build(self) -> BookstoreResult<Self::Backend> {
        self.store.opened.fetch_add(1, Ordering::SeqCst);

        Ok(self.store)
    }
}
