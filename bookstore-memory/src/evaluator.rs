//! Query expression evaluation for in-memory document filtering.
//!
//! This module provides the evaluation engine for filter expressions and the
//! ordering used when sorting, so queries and pipeline stages behave the same
//! way on every code path of the in-memory backend.

use std::{cmp::Ordering, collections::HashMap};
use bson::{Bson, Document, datetime::DateTime};

use bookstore_core::{
    query::{QueryVisitor, Expr, FieldOp, Sort, SortDirection},
    error::{BookstoreError, BookstoreResult},
};


/// Type-erased, comparable representation of BSON values.
///
/// It normalizes numeric types to f64 so that `1950`, `1950_i64` and `1950.0`
/// compare equal.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    /// Null or missing value
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (all integers and floats normalized to f64)
    Number(f64),
    /// DateTime value
    DateTime(DateTime),
    /// String value
    String(&'a str),
    /// Array of comparable values
    Array(Vec<Comparable<'a>>),
    /// Map/Object of comparable values
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<HashMap<_, _>>()
            ),
            _ => Comparable::Null, // Other types are not comparable
        }
    }
}

impl<'a> Comparable<'a> {
    /// Rank of the value's type in the cross-type sort order.
    fn type_rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Number(_) => 1,
            Comparable::String(_) => 2,
            Comparable::Map(_) => 3,
            Comparable::Array(_) => 4,
            Comparable::Bool(_) => 5,
            Comparable::DateTime(_) => 6,
        }
    }

    /// Total ordering used for sorting: values of different types order by
    /// type rank, values of the same type by value.
    pub(crate) fn sort_cmp(&self, other: &Self) -> Ordering {
        match self.partial_cmp(other) {
            Some(ordering) => ordering,
            None => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => Some(Ordering::Equal),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Compares the value of `field` in two documents; a missing field sorts as null.
pub(crate) fn compare_field(left: &Document, right: &Document, field: &str) -> Ordering {
    let left = left.get(field).map(Comparable::from).unwrap_or(Comparable::Null);
    let right = right.get(field).map(Comparable::from).unwrap_or(Comparable::Null);

    left.sort_cmp(&right)
}

/// Stable multi-key sort, most significant key first.
pub(crate) fn sort_documents(documents: &mut [Document], keys: &[Sort]) {
    if keys.is_empty() {
        return;
    }

    documents.sort_by(|a, b| {
        keys.iter()
            .map(|key| match key.direction {
                SortDirection::Asc => compare_field(a, b, &key.field),
                SortDirection::Desc => compare_field(b, a, &key.field),
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}


pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> BookstoreResult<bool> {
        self.visit_expr(expr)
    }

    /// Evaluates `expr` against `document`; a missing filter matches everything.
    pub fn matches(document: &Document, expr: Option<&Expr>) -> BookstoreResult<bool> {
        match expr {
            Some(expr) => DocumentEvaluator::new(document).evaluate(expr),
            None => Ok(true),
        }
    }
}

impl<'a> QueryVisitor for DocumentEvaluator<'a> {
    type Output = bool;
    type Error = BookstoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(!self.visit_expr(expr)?)
    }

    fn visit_field(&mut self, field: &str, op: FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        let expected = Comparable::from(value);

        match self.document.get(field) {
            Some(field_value) => {
                let actual = Comparable::from(field_value);

                Ok(match op {
                    FieldOp::Eq => actual == expected,
                    FieldOp::Ne => actual != expected,
                    FieldOp::Gt | FieldOp::Gte | FieldOp::Lt | FieldOp::Lte => {
                        match actual.partial_cmp(&expected) {
                            Some(ordering) => match op {
                                FieldOp::Gt => ordering == Ordering::Greater,
                                FieldOp::Gte => ordering != Ordering::Less,
                                FieldOp::Lt => ordering == Ordering::Less,
                                FieldOp::Lte => ordering != Ordering::Greater,
                                FieldOp::Eq | FieldOp::Ne => unreachable!(),
                            },
                            None => false,
                        }
                    }
                })
            }
            // A missing field equals null and differs from everything else.
            None => Ok(match op {
                FieldOp::Eq => expected == Comparable::Null,
                FieldOp::Ne => expected != Comparable::Null,
                _ => false,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use bookstore_core::query::Filter;

    use super::*;

    fn matches(document: &Document, expr: &Expr) -> bool {
        DocumentEvaluator::new(document).evaluate(expr).unwrap()
    }

    #[test]
    fn numbers_compare_across_integer_and_double() {
        let book = doc! { "published_year": 1954, "price": 15 };

        assert!(matches(&book, &Filter::eq("price", 15.0)));
        assert!(matches(&book, &Filter::gt("published_year", 1950_i64)));
        assert!(!matches(&book, &Filter::gt("published_year", 1954)));
        assert!(matches(&book, &Filter::gte("published_year", 1954)));
    }

    #[test]
    fn range_on_mismatched_type_never_matches() {
        let book = doc! { "published_year": "1954" };

        assert!(!matches(&book, &Filter::gt("published_year", 1950)));
        assert!(!matches(&book, &Filter::lt("published_year", 1950)));
    }

    #[test]
    fn missing_field_only_equals_null() {
        let book = doc! { "title": "Dune" };

        assert!(matches(&book, &Filter::eq("genre", Bson::Null)));
        assert!(!matches(&book, &Filter::eq("genre", "Fiction")));
        assert!(matches(&book, &Filter::ne("genre", "Fiction")));
    }

    #[test]
    fn sort_orders_by_keys_in_precedence() {
        let mut books = vec![
            doc! { "author": "B", "books": 2 },
            doc! { "author": "C", "books": 3 },
            doc! { "author": "A", "books": 2 },
        ];

        sort_documents(&mut books, &[Sort::desc("books"), Sort::asc("author")]);

        let authors: Vec<_> = books.iter().map(|b| b.get_str("author").unwrap()).collect();
        assert_eq!(authors, vec!["C", "A", "B"]);
    }

    #[test]
    fn missing_values_sort_first_ascending() {
        let mut books = vec![doc! { "price": 5 }, doc! {}, doc! { "price": "n/a" }];

        sort_documents(&mut books, &[Sort::asc("price")]);

        assert_eq!(books[0], doc! {});
        assert_eq!(books[1], doc! { "price": 5 });
        assert_eq!(books[2], doc! { "price": "n/a" });
    }
}
