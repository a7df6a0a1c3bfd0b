//! Aggregation pipeline construction.
//!
//! A [`Pipeline`] is an ordered list of [`Stage`]s. Backends either translate it
//! into their native pipeline syntax or evaluate it directly. Only the stages and
//! expressions the runner needs are modelled: group, project, sort and
//! limit, with field references, literals and the arithmetic needed to bucket
//! values.
//!
//! ```ignore
//! use bookstore_core::pipeline::{Accumulator, Expression, Pipeline};
//! use bookstore_core::query::Sort;
//!
//! let avg_by_genre = Pipeline::new()
//!     .group(
//!         Expression::field("genre"),
//!         [
//!             ("avgPrice", Accumulator::Avg(Expression::field("price"))),
//!             ("count", Accumulator::count()),
//!         ],
//!     )
//!     .sort([Sort::asc("_id")]);
//! ```

use bson::{Bson, Document, doc};

use crate::query::{Sort, sort_document};

/// Name of the key field produced by a group stage.
pub const GROUP_KEY: &str = "_id";

/// A computed value inside a pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// The value of a document field (`"$field"`).
    Field(String),
    /// A constant.
    Literal(Bson),
    /// Product of all operands.
    Multiply(Vec<Expression>),
    /// Quotient of two operands.
    Divide(Box<Expression>, Box<Expression>),
    /// Largest integer not greater than the operand.
    Floor(Box<Expression>),
}

impl Expression {
    pub fn field(name: impl Into<String>) -> Self {
        Expression::Field(name.into())
    }

    pub fn literal(value: impl Into<Bson>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn multiply(operands: impl IntoIterator<Item = Expression>) -> Self {
        Expression::Multiply(operands.into_iter().collect())
    }

    pub fn divide(dividend: Expression, divisor: Expression) -> Self {
        Expression::Divide(Box::new(dividend), Box::new(divisor))
    }

    pub fn floor(operand: Expression) -> Self {
        Expression::Floor(Box::new(operand))
    }

    /// `floor(field / width) * width`, the start of the bucket `field` falls into.
    pub fn bucket_start(field: impl Into<String>, width: i32) -> Self {
        Expression::multiply([
            Expression::floor(Expression::divide(
                Expression::field(field),
                Expression::literal(width),
            )),
            Expression::literal(width),
        ])
    }

    /// Renders the expression in aggregation-expression syntax.
    pub fn to_bson(&self) -> Bson {
        match self {
            Expression::Field(name) => Bson::String(format!("${name}")),
            Expression::Literal(value) => match value {
                Bson::String(s) if s.starts_with('$') => Bson::Document(doc! { "$literal": s }),
                other => other.clone(),
            },
            Expression::Multiply(operands) => Bson::Document(doc! {
                "$multiply": operands.iter().map(Expression::to_bson).collect::<Vec<_>>(),
            }),
            Expression::Divide(dividend, divisor) => Bson::Document(doc! {
                "$divide": [dividend.to_bson(), divisor.to_bson()],
            }),
            Expression::Floor(operand) => Bson::Document(doc! { "$floor": operand.to_bson() }),
        }
    }
}

/// A group-stage accumulator.
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    /// Sum of the expression over the group.
    Sum(Expression),
    /// Arithmetic mean of the numeric values of the expression over the group.
    Avg(Expression),
}

impl Accumulator {
    /// Counts the documents in the group (`{ $sum: 1 }`).
    pub fn count() -> Self {
        Accumulator::Sum(Expression::literal(1))
    }

    pub fn to_bson(&self) -> Bson {
        match self {
            Accumulator::Sum(expr) => Bson::Document(doc! { "$sum": expr.to_bson() }),
            Accumulator::Avg(expr) => Bson::Document(doc! { "$avg": expr.to_bson() }),
        }
    }
}

/// A single pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// Groups documents by `key`, emitting `_id` plus one field per accumulator.
    Group {
        key: Expression,
        accumulators: Vec<(String, Accumulator)>,
    },
    /// Replaces each document with the listed computed fields. `_id` is carried
    /// over when present.
    Project(Vec<(String, Expression)>),
    /// Orders documents by the sort keys, most significant first.
    Sort(Vec<Sort>),
    /// Keeps only the first `n` documents.
    Limit(usize),
}

/// An ordered list of aggregation stages.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Pipeline::default()
    }

    pub fn group<I, S>(mut self, key: Expression, accumulators: I) -> Self
    where
        I: IntoIterator<Item = (S, Accumulator)>,
        S: Into<String>,
    {
        self.stages.push(Stage::Group {
            key,
            accumulators: accumulators
                .into_iter()
                .map(|(name, acc)| (name.into(), acc))
                .collect(),
        });
        self
    }

    pub fn project<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (S, Expression)>,
        S: Into<String>,
    {
        self.stages.push(Stage::Project(
            fields
                .into_iter()
                .map(|(name, expr)| (name.into(), expr))
                .collect(),
        ));
        self
    }

    pub fn sort(mut self, keys: impl IntoIterator<Item = Sort>) -> Self {
        self.stages.push(Stage::Sort(keys.into_iter().collect()));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.stages.push(Stage::Limit(n));
        self
    }
}

impl Stage {
    /// Renders the stage as a pipeline document.
    pub fn to_document(&self) -> Document {
        match self {
            Stage::Group { key, accumulators } => {
                let mut group = doc! { GROUP_KEY: key.to_bson() };
                for (name, acc) in accumulators {
                    group.insert(name.clone(), acc.to_bson());
                }
                doc! { "$group": group }
            }
            Stage::Project(fields) => doc! {
                "$project": fields
                    .iter()
                    .map(|(name, expr)| (name.clone(), expr.to_bson()))
                    .collect::<Document>(),
            },
            Stage::Sort(keys) => doc! { "$sort": sort_document(keys) },
            Stage::Limit(n) => doc! { "$limit": *n as i64 },
        }
    }
}
