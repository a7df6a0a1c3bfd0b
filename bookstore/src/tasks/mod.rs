//! The ordered groups of operations the runner performs.
//!
//! Each group writes its results into a [`Report`] and sees whatever state the
//! groups before it left in the collection.

use async_trait::async_trait;

use bookstore_core::error::BookstoreResult;

use crate::{collection::BookCollection, report::Report};

pub mod aggregation;
pub mod crud;
pub mod indexing;
pub mod queries;

pub use aggregation::AggregationPipelines;
pub use crud::BasicCrud;
pub use indexing::IndexingAndExplain;
pub use queries::AdvancedQueries;

pub const FICTION: &str = "Fiction";
pub const PUBLISHED_AFTER: i32 = 1950;
pub const ORWELL: &str = "George Orwell";
pub const REPRICED_TITLE: &str = "1984";
pub const NEW_PRICE: f64 = 15.99;
pub const DELETED_TITLE: &str = "Moby Dick";
pub const IN_STOCK_AFTER: i32 = 2010;
pub const PAGE_SIZE: usize = 5;
/// Number of pages shown by the pagination demo, regardless of collection size.
pub const PAGES_SHOWN: usize = 2;
pub const TOLKIEN: &str = "J.R.R. Tolkien";
pub const TOLKIEN_FROM_YEAR: i32 = 1900;
pub const TITLE_INDEX: &str = "idx_title";
pub const AUTHOR_YEAR_INDEX: &str = "idx_author_year";

/// One banner-introduced group of operations run on its own connection.
#[async_trait]
pub trait TaskGroup: Send + Sync {
    /// Banner printed before the group runs.
    fn title(&self) -> &'static str;

    async fn run(&self, books: BookCollection<'_>, report: &mut Report) -> BookstoreResult<()>;
}

/// The four groups in the order the runner executes them.
pub fn default_groups() -> Vec<Box<dyn TaskGroup>> {
    vec![
        Box::new(BasicCrud),
        Box::new(AdvancedQueries),
        Box::new(AggregationPipelines),
        Box::new(IndexingAndExplain),
    ]
}
