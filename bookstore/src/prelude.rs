//! Convenient re-exports of commonly used bookstore types.
//!
//! ```ignore
//! use bookstore::prelude::*;
//! ```

pub use bookstore_core::{
    backend::{BookstoreBackend, BookstoreBackendBuilder},
    book::Book,
    query::{Query, QueryBuilder, Expr, Filter, Projection, Sort, SortDirection, Update},
    pipeline::{Pipeline, Expression, Accumulator},
    index::IndexSpec,
    explain::ExplainSummary,
    error::{BookstoreError, BookstoreResult},
};

pub use crate::{
    collection::BookCollection,
    config::RunnerConfig,
    report::{Report, Section, Table},
    runner::Runner,
    tasks::TaskGroup,
};
