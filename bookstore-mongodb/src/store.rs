use async_trait::async_trait;
use futures::TryStreamExt;
use bson::{Document, doc};
use mongodb::{
    Client, Collection as MongoCollection, IndexModel,
    error::{Error as MongoError, ErrorKind},
    options::{ClientOptions, FindOptions, IndexOptions},
};
use bookstore_core::{
    backend::{BookstoreBackend, BookstoreBackendBuilder},
    error::{BookstoreError, BookstoreResult},
    explain::ExplainSummary,
    index::IndexSpec,
    pipeline::{Pipeline, Stage},
    query::{Expr, Query, Update, UpdateOutcome, sort_document},
};

use crate::{explain::summarize, query::MongoQueryTranslator};

/// Server error code reported when a named index does not exist.
const INDEX_NOT_FOUND: i32 = 27;


/// Maps a driver error onto the bookstore error type, singling out missing indexes.
fn backend_error(err: MongoError) -> BookstoreError {
    match err.kind.as_ref() {
        ErrorKind::Command(command)
            if command.code == INDEX_NOT_FOUND || command.code_name == "IndexNotFound" =>
        {
            BookstoreError::IndexNotFound(command.message.clone())
        }
        _ => BookstoreError::Backend(err.to_string()),
    }
}

fn find_options(query: &Query) -> FindOptions {
    let mut options = FindOptions::default();

    if let Some(projection) = &query.projection {
        options.projection = Some(projection.to_document());
    }
    if !query.sort.is_empty() {
        options.sort = Some(sort_document(&query.sort));
    }
    if let Some(skip) = query.offset {
        options.skip = Some(skip as u64);
    }
    if let Some(limit) = query.limit {
        options.limit = Some(limit as i64);
    }

    options
}

#[derive(Debug)]
pub struct MongoDbBookstore {
    client: Client,
    database: String,
}

impl MongoDbBookstore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbBookstoreBuilder {
        MongoDbBookstoreBuilder::new(dsn, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }

    /// Renders a find command for `explain`.
    fn find_command(collection: &str, query: &Query) -> BookstoreResult<Document> {
        let mut command = doc! {
            "find": collection,
            "filter": MongoQueryTranslator::translate(query.filter.as_ref())?,
        };

        if let Some(projection) = &query.projection {
            command.insert("projection", projection.to_document());
        }
        if !query.sort.is_empty() {
            command.insert("sort", sort_document(&query.sort));
        }
        if let Some(skip) = query.offset {
            command.insert("skip", skip as i64);
        }
        if let Some(limit) = query.limit {
            command.insert("limit", limit as i64);
        }

        Ok(command)
    }

    /// Closes the client, waiting for in-flight operations to finish.
    pub async fn shutdown(self) -> BookstoreResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

#[async_trait]
impl BookstoreBackend for MongoDbBookstore {

    async fn find(&self, collection: &str, query: Query) -> BookstoreResult<Vec<Document>> {
        self.get_collection(collection)
            .find(MongoQueryTranslator::translate(query.filter.as_ref())?)
            .with_options(find_options(&query))
            .await
            .map_err(backend_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(backend_error)
    }

    async fn find_one(&self, collection: &str, filter: Expr) -> BookstoreResult<Option<Document>> {
        self.get_collection(collection)
            .find_one(MongoQueryTranslator::translate(Some(&filter))?)
            .await
            .map_err(backend_error)
    }

    async fn update_one(&self, collection: &str, filter: Expr, update: Update) -> BookstoreResult<UpdateOutcome> {
        let result = self.get_collection(collection)
            .update_one(
                MongoQueryTranslator::translate(Some(&filter))?,
                update.to_document(),
            )
            .await
            .map_err(backend_error)?;

        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn delete_one(&self, collection: &str, filter: Expr) -> BookstoreResult<u64> {
        Ok(
            self.get_collection(collection)
                .delete_one(MongoQueryTranslator::translate(Some(&filter))?)
                .await
                .map_err(backend_error)?
                .deleted_count
        )
    }

    async fn aggregate(&self, collection: &str, pipeline: Pipeline) -> BookstoreResult<Vec<Document>> {
        let stages: Vec<Document> = pipeline.stages.iter().map(Stage::to_document).collect();

        self.get_collection(collection)
            .aggregate(stages)
            .await
            .map_err(backend_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(backend_error)
    }

    async fn create_index(&self, collection: &str, index: IndexSpec) -> BookstoreResult<String> {
        Ok(
            self.get_collection(collection)
                .create_index(
                    IndexModel::builder()
                    .keys(index.key_document())
                    .options(
                        IndexOptions::builder()
                        .name(index.name.clone())
                        .build()
                    )
                    .build()
                )
                .await
                .map_err(backend_error)?
                .index_name
        )
    }

    async fn drop_indexes(&self, collection: &str) -> BookstoreResult<()> {
        self.get_collection(collection)
            .drop_indexes()
            .await
            .map_err(backend_error)?;

        Ok(())
    }

    async fn explain(&self, collection: &str, query: Query) -> BookstoreResult<ExplainSummary> {
        let explain = self.client
            .database(&self.database)
            .run_command(doc! {
                "explain": Self::find_command(collection, &query)?,
                "verbosity": "executionStats",
            })
            .await
            .map_err(backend_error)?;

        Ok(summarize(&explain))
    }

    async fn shutdown(self) -> BookstoreResult<()> {
        self.shutdown().await
    }
}

#[derive(Debug, Clone)]
pub struct MongoDbBookstoreBuilder {
    dsn: String,
    database: String,
}

impl MongoDbBookstoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl BookstoreBackendBuilder for MongoDbBookstoreBuilder {
    type Backend = MongoDbBookstore;

    /// Parses the connection string, creates a client and pings the server so
    /// connection problems surface before the first query.
    async fn build(self) -> BookstoreResult<Self::Backend> {
        let client = Client::with_options(
            ClientOptions::parse(&self.dsn)
                .await
                .map_err(|e| BookstoreError::Initialization(e.to_string()))?,
        )
        .map_err(|e| BookstoreError::Initialization(e.to_string()))?;

        client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| BookstoreError::Initialization(e.to_string()))?;

        log::debug!("connected to MongoDB, using database {}", self.database);

        Ok(MongoDbBookstore::new(client, self.database))
    }
}

#[cfg(test)]
mod tests {
    use mongodb::error::CommandError;

    use bookstore_core::query::{Filter, Projection, SortDirection};

    use super::*;

    fn command_error(reply: Document) -> MongoError {
        let command: CommandError = bson::de::deserialize_from_document(reply).unwrap();
        MongoError::from(ErrorKind::Command(command))
    }

    #[test]
    fn missing_index_reply_maps_to_index_not_found() {
        let err = backend_error(command_error(doc! {
            "code": 27,
            "codeName": "IndexNotFound",
            "errmsg": "index not found with name [idx_title]",
        }));

        assert!(err.is_index_not_found());
        assert!(matches!(
            err,
            BookstoreError::IndexNotFound(message) if message == "index not found with name [idx_title]"
        ));
    }

    #[test]
    fn code_name_alone_identifies_missing_index() {
        let err = backend_error(command_error(doc! { "code": 0, "codeName": "IndexNotFound" }));

        assert!(err.is_index_not_found());
    }

    #[test]
    fn other_command_errors_stay_backend_errors() {
        let err = backend_error(command_error(doc! {
            "code": 26,
            "codeName": "NamespaceNotFound",
            "errmsg": "ns not found",
        }));

        assert!(matches!(err, BookstoreError::Backend(_)));
    }

    #[test]
    fn find_options_carry_projection_sort_and_window() {
        let query = Query::builder()
            .projection(Projection::fields(["title"]))
            .sort("title", SortDirection::Asc)
            .offset(5)
            .limit(5)
            .build();

        let options = find_options(&query);

        assert_eq!(options.projection, Some(doc! { "_id": 0, "title": 1 }));
        assert_eq!(options.sort, Some(doc! { "title": 1 }));
        assert_eq!(options.skip, Some(5));
        assert_eq!(options.limit, Some(5));
    }

    #[test]
    fn explain_command_wraps_translated_find() {
        let query = Query::builder()
            .filter(Filter::and([
                Filter::eq("author", "J.R.R. Tolkien"),
                Filter::gte("published_year", 1900),
            ]))
            .sort("published_year", SortDirection::Desc)
            .build();

        let command = MongoDbBookstore::find_command("books", &query).unwrap();

        assert_eq!(
            command,
            doc! {
                "find": "books",
                "filter": {
                    "author": { "$eq": "J.R.R. Tolkien" },
                    "published_year": { "$gte": 1900 },
                },
                "sort": { "published_year": -1 },
            }
        );
    }
}
