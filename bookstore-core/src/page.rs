//! Skip/limit pagination.
//!
//! A [`PageRequest`] names a 1-indexed page of a fixed size and turns it into
//! the skip and limit of a [`Query`].

use crate::query::Query;

/// Parameters for retrieving one page of a sorted result set.
///
/// Pages are 1-indexed (page 1 is the first page).
///
/// # Example
///
/// ```ignore
/// use bookstore_core::page::PageRequest;
///
/// let request = PageRequest::new(2, 5);
/// // Skip (2-1) * 5 = 5 documents, return at most 5
/// assert_eq!(request.offset(), 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// The page number (1-indexed).
    pub page: usize,
    /// Number of documents per page.
    pub per_page: usize,
}

impl PageRequest {
    /// Creates a page request. A page number of zero is treated as page 1.
    pub fn new(page: usize, per_page: usize) -> Self {
        Self { page: page.max(1), per_page }
    }

    /// The first `count` pages of size `per_page`, in order.
    pub fn first_pages(per_page: usize, count: usize) -> impl Iterator<Item = PageRequest> {
        (1..=count).map(move |page| PageRequest::new(page, per_page))
    }

    /// Number of documents to skip to reach this page.
    pub fn offset(&self) -> usize {
        (self.page - 1) * self.per_page
    }

    /// Restricts `query` to this page's window.
    pub fn apply(&self, mut query: Query) -> Query {
        query.offset = Some(self.offset());
        query.limit = Some(self.per_page);
        query
    }
}
