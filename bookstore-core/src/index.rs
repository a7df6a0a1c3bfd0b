//! Index definitions.

use bson::Document;

use crate::query::{Sort, SortDirection, sort_document};

/// A named, possibly compound, index definition.
///
/// Keys are listed most significant first, each with its direction.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    pub name: String,
    pub keys: Vec<Sort>,
}

impl IndexSpec {
    pub fn new(name: impl Into<String>) -> Self {
        IndexSpec { name: name.into(), keys: Vec::new() }
    }

    /// Appends a key to the index.
    pub fn key(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.keys.push(Sort::new(field, direction));
        self
    }

    /// Renders the key pattern (`{ author: 1, published_year: -1 }`).
    pub fn key_document(&self) -> Document {
        sort_document(&self.keys)
    }
}
