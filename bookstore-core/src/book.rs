//! The `Book` document model.
//!
//! Books are owned by the external database; this type only describes the shape
//! the runner reads and writes. Fields that are not listed here (such as `_id`,
//! `pages` or `publisher`) are ignored when a document is decoded.

use bson::{Document, de::deserialize_from_document, ser::serialize_to_document};
use serde::{Deserialize, Serialize};

use crate::error::BookstoreResult;

/// A single book in the bookstore collection.
///
/// # Example
///
/// ```ignore
/// use bookstore_core::book::Book;
///
/// let book = Book::new("1984", "George Orwell", "Dystopian", 1949, 10.99, true);
/// let document = book.to_document()?;
/// assert_eq!(Book::from_document(document)?, book);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub published_year: i32,
    pub price: f64,
    pub in_stock: bool,
}

impl Book {
    pub const TITLE: &'static str = "title";
    pub const AUTHOR: &'static str = "author";
    pub const GENRE: &'static str = "genre";
    pub const PUBLISHED_YEAR: &'static str = "published_year";
    pub const PRICE: &'static str = "price";
    pub const IN_STOCK: &'static str = "in_stock";

    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        genre: impl Into<String>,
        published_year: i32,
        price: f64,
        in_stock: bool,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            genre: genre.into(),
            published_year,
            price,
            in_stock,
        }
    }

    /// Decodes a book from a raw BSON document.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if a required field is missing or has the wrong type.
    pub fn from_document(document: Document) -> BookstoreResult<Self> {
        Ok(deserialize_from_document(document)?)
    }

    /// Encodes this book as a BSON document (without an `_id`).
    pub fn to_document(&self) -> BookstoreResult<Document> {
        Ok(serialize_to_document(self)?)
    }
}
