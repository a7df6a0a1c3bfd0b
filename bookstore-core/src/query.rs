//! Query construction and filtering API for the bookstore collection.
//!
//! This module provides type-safe construction of the filters, projections, sorts
//! and paging windows the runner issues, and a visitor that backends use to
//! translate or evaluate filter expressions.
//!
//! # Query Building
//!
//! ```ignore
//! use bookstore_core::query::{Query, Filter, Projection, SortDirection};
//!
//! let query = Query::builder()
//!     .filter(Filter::eq("genre", "Fiction"))
//!     .projection(Projection::fields(["title", "price"]))
//!     .sort("price", SortDirection::Asc)
//!     .offset(5)
//!     .limit(5)
//!     .build();
//! ```
//!
//! # Filter Expression API
//!
//! The [`Filter`] struct provides static methods for building filter expressions:
//!
//! - Comparison: `eq`, `ne`, `gt`, `gte`, `lt`
//! - Logical: `and`, `or`
//!
//! Expressions can be combined using chainable methods for more complex queries.

use bson::{Bson, Document};

use crate::error::BookstoreError;

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9).
    Asc,
    /// Descending order (Z to A, 9 to 0).
    Desc,
}

impl SortDirection {
    /// The numeric form used in key documents (`1` or `-1`).
    pub fn as_i32(self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }

    pub fn reverse(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// One key of a sort specification.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    /// The field name to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Sort { field: field.into(), direction }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Sort::new(field, SortDirection::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Sort::new(field, SortDirection::Desc)
    }
}

/// Renders an ordered list of sort keys as a key document (`{ field: 1|-1, ... }`).
pub fn sort_document(sorts: &[Sort]) -> Document {
    sorts
        .iter()
        .map(|sort| (sort.field.clone(), Bson::Int32(sort.direction.as_i32())))
        .collect()
}

/// Field comparison operators for filter expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    /// Equal to (exact match).
    Eq,
    /// Not equal to.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal to.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal to.
    Lte,
}

impl FieldOp {
    /// The query operator name (`$eq`, `$gt`, ...).
    pub fn operator(self) -> &'static str {
        match self {
            FieldOp::Eq => "$eq",
            FieldOp::Ne => "$ne",
            FieldOp::Gt => "$gt",
            FieldOp::Gte => "$gte",
            FieldOp::Lt => "$lt",
            FieldOp::Lte => "$lte",
        }
    }

    /// Whether the operator restricts a field to a contiguous range of values.
    pub fn is_range(self) -> bool {
        matches!(self, FieldOp::Gt | FieldOp::Gte | FieldOp::Lt | FieldOp::Lte)
    }
}

/// A filter expression for querying documents.
///
/// # Example
///
/// ```ignore
/// use bookstore_core::query::Filter;
///
/// let in_stock_recent = Filter::and([
///     Filter::eq("in_stock", true),
///     Filter::gt("published_year", 2010),
/// ]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Logical AND of multiple expressions (all must match).
    And(Vec<Expr>),
    /// Logical OR of multiple expressions (any must match).
    Or(Vec<Expr>),
    /// Logical NOT of an expression (inverts the result).
    Not(Box<Expr>),
    /// Field comparison expression.
    Field {
        /// The field name to compare.
        field: String,
        /// The comparison operator.
        op: FieldOp,
        /// The value to compare against.
        value: Bson,
    },
}

impl Expr {
    /// Creates a field comparison expression.
    pub fn field(field: String, op: FieldOp, value: Bson) -> Self {
        Expr::Field { field, op, value }
    }

    /// Combines this expression with another using logical AND.
    ///
    /// If this expression is already an AND, the other expression is appended
    /// to the list. Otherwise, a new AND expression is created.
    pub fn and(self, other: Expr) -> Self {
        match self {
            Expr::And(mut list) => {
                list.push(other);
                Expr::And(list)
            }
            _ => Expr::And(vec![self, other]),
        }
    }

    /// Combines this expression with another using logical OR.
    pub fn or(self, other: Expr) -> Self {
        match self {
            Expr::Or(mut list) => {
                list.push(other);
                Expr::Or(list)
            }
            _ => Expr::Or(vec![self, other]),
        }
    }

    /// Negates this expression (logical NOT).
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    /// Returns the top-level field predicates that every match must satisfy.
    ///
    /// A bare field comparison yields itself, a conjunction yields the field
    /// comparisons among its direct children. Disjunctions and negations yield
    /// nothing, since they cannot narrow an index range on their own.
    pub fn conjuncts(&self) -> Vec<(&str, FieldOp, &Bson)> {
        match self {
            Expr::Field { field, op, value } => vec![(field.as_str(), *op, value)],
            Expr::And(exprs) => exprs
                .iter()
                .flat_map(|expr| match expr {
                    Expr::Field { .. } | Expr::And(_) => expr.conjuncts(),
                    _ => Vec::new(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Helper struct for constructing filter expressions.
pub struct Filter;

impl Filter {
    /// Matches documents where the field equals the specified value.
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Eq, value.into())
    }

    /// Matches documents where the field does not equal the specified value.
    pub fn ne(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Ne, value.into())
    }

    /// Matches documents where the field is greater than the specified value.
    pub fn gt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gt, value.into())
    }

    /// Matches documents where the field is greater than or equal to the specified value.
    pub fn gte(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Gte, value.into())
    }

    /// Matches documents where the field is less than the specified value.
    pub fn lt(field: impl Into<String>, value: impl Into<Bson>) -> Expr {
        Expr::field(field.into(), FieldOp::Lt, value.into())
    }

    /// Combines multiple expressions such that all must match.
    pub fn and(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::And(exprs.into_iter().collect())
    }

    /// Combines multiple expressions such that any can match.
    pub fn or(exprs: impl IntoIterator<Item = Expr>) -> Expr {
        Expr::Or(exprs.into_iter().collect())
    }
}

/// Inclusion projection applied to query results.
///
/// Only the listed fields are returned, in the order they were listed. The
/// `_id` field is always excluded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Projection {
    pub fields: Vec<String>,
}

impl Projection {
    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Renders the projection as a key document (`{ _id: 0, title: 1, ... }`).
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        document.insert("_id", 0);
        for field in &self.fields {
            document.insert(field.clone(), 1);
        }
        document
    }

    /// Applies the projection to a full document.
    pub fn apply(&self, document: &Document) -> Document {
        let mut projected = Document::new();
        for field in &self.fields {
            if let Some(value) = document.get(field) {
                projected.insert(field.clone(), value.clone());
            }
        }
        projected
    }
}

/// A structured query for retrieving documents.
///
/// This struct encapsulates the filter, projection, sort keys and paging window
/// for a find operation. Use [`QueryBuilder`] for ergonomic construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    /// Optional filter expression to match documents.
    pub filter: Option<Expr>,
    /// Optional projection applied to every returned document.
    pub projection: Option<Projection>,
    /// Sort keys, most significant first.
    pub sort: Vec<Sort>,
    /// Number of documents to skip (for pagination).
    pub offset: Option<usize>,
    /// Maximum number of documents to return.
    pub limit: Option<usize>,
}

impl Query {
    /// Creates a new empty query that matches the whole collection.
    pub fn new() -> Self {
        Query::default()
    }

    /// Creates a query that only filters.
    pub fn filtered(filter: Expr) -> Self {
        Query { filter: Some(filter), ..Query::default() }
    }

    /// Creates a new query builder for fluent construction.
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    query: Query,
}

impl QueryBuilder {
    /// Creates a new query builder.
    pub fn new() -> Self {
        QueryBuilder { query: Query::default() }
    }

    /// Sets the filter expression for this query.
    pub fn filter(mut self, filter: Expr) -> Self {
        self.query.filter = Some(filter);
        self
    }

    /// Sets the projection for this query.
    pub fn projection(mut self, projection: Projection) -> Self {
        self.query.projection = Some(projection);
        self
    }

    /// Appends a sort key. Keys added first take precedence.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.query.sort.push(Sort::new(field, direction));
        self
    }

    /// Sets the number of documents to skip.
    pub fn offset(mut self, offset: usize) -> Self {
        self.query.offset = Some(offset);
        self
    }

    /// Sets the maximum number of documents to return.
    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    /// Builds and returns the final query.
    pub fn build(self) -> Query {
        self.query
    }
}

/// A `$set` style update: assigns each listed field a new value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    pub set: Vec<(String, Bson)>,
}

impl Update {
    pub fn set(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Update { set: vec![(field.into(), value.into())] }
    }

    pub fn and_set(mut self, field: impl Into<String>, value: impl Into<Bson>) -> Self {
        self.set.push((field.into(), value.into()));
        self
    }

    /// Renders the update as an update document (`{ $set: { ... } }`).
    pub fn to_document(&self) -> Document {
        let assignments: Document = self.set.iter().cloned().collect();
        let mut document = Document::new();
        document.insert("$set", assignments);
        document
    }
}

/// Counts reported by a single-document update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

pub trait QueryVisitor {
    type Output;
    type Error: Into<BookstoreError>;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error>;
    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error>;
    fn visit_field(
        &mut self,
        field: &str,
        op: FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        match expr {
            Expr::And(exprs) => self.visit_and(exprs),
            Expr::Or(exprs) => self.visit_or(exprs),
            Expr::Not(expr) => self.visit_not(expr),
            Expr::Field { field, op, value } => self.visit_field(field, *op, value),
        }
    }
}
