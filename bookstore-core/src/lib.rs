//! Core types for the bookstore query runner.
//!
//! This crate holds everything the runner and its backends share:
//!
//! - **Book model** ([`book`]) - The serde model of a bookstore document
//! - **Store backend abstraction** ([`backend`]) - Traits implemented by the MongoDB and in-memory backends
//! - **Query and filtering API** ([`query`]) - Filters, projections, sort keys and updates
//! - **Pagination** ([`page`]) - Skip/limit page windows
//! - **Aggregation pipelines** ([`pipeline`]) - Group, project, sort and limit stages
//! - **Indexes** ([`index`]) - Named single-field and compound index definitions
//! - **Explain summaries** ([`explain`]) - Winning plan stages and execution counters
//! - **Error handling** ([`error`]) - The shared error and result types
//!
//! # Example
//!
//! ```ignore
//! use bookstore_core::query::{Filter, Query, SortDirection};
//!
//! let query = Query::builder()
//!     .filter(Filter::gt("published_year", 1950))
//!     .sort("title", SortDirection::Asc)
//!     .build();
//! ```

#[allow(unused_extern_crates)]
extern crate self as bookstore_core;

pub mod backend;
pub mod book;
pub mod error;
pub mod explain;
pub mod index;
pub mod page;
pub mod pipeline;
pub mod query;
