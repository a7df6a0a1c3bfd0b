//! Error types and result types for bookstore operations.
//!
//! Every backend maps its native failures onto [`BookstoreError`], so the runner
//! only ever has to reason about one error type. Use [`BookstoreResult<T>`] as the
//! return type for fallible operations.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;
use thiserror::Error;

/// Represents all possible errors that can occur while running bookstore operations.
#[derive(Error, Debug)]
pub enum BookstoreError {
    /// Serialization/deserialization error when converting between document formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during backend initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// A document does not have the shape an operation expected.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// A query could not be translated or evaluated.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    /// An aggregation pipeline could not be translated or evaluated.
    #[error("Invalid pipeline: {0}")]
    InvalidPipeline(String),
    /// The requested collection does not exist in the store.
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),
    /// The index an operation referred to does not exist.
    #[error("Index not found: {0}")]
    IndexNotFound(String),
    /// An error occurred in the underlying storage backend.
    #[error("Backend error: {0}")]
    Backend(String),
    /// Writing the report failed.
    #[error("Output error: {0}")]
    Output(String),
}

/// A specialized `Result` type for bookstore operations.
pub type BookstoreResult<T> = Result<T, BookstoreError>;

impl BookstoreError {
    /// Returns `true` when the error reports a missing index.
    pub fn is_index_not_found(&self) -> bool {
        matches!(self, BookstoreError::IndexNotFound(_))
    }
}

impl From<BsonError> for BookstoreError {
    fn from(err: BsonError) -> Self {
        BookstoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for BookstoreError {
    fn from(err: SerdeJsonError) -> Self {
        BookstoreError::Serialization(err.to_string())
    }
}

impl From<IoError> for BookstoreError {
    fn from(err: IoError) -> Self {
        BookstoreError::Output(err.to_string())
    }
}
