//! Aggregation pipeline execution over in-memory documents.

use bson::{Bson, Document};

use bookstore_core::{
    error::{BookstoreError, BookstoreResult},
    pipeline::{Accumulator, Expression, GROUP_KEY, Pipeline, Stage},
};

use crate::evaluator::{Comparable, sort_documents};

/// Runs every stage of `pipeline` over `documents`, in order.
pub(crate) fn run_pipeline(documents: Vec<Document>, pipeline: &Pipeline) -> BookstoreResult<Vec<Document>> {
    pipeline
        .stages
        .iter()
        .try_fold(documents, |documents, stage| run_stage(documents, stage))
}

fn run_stage(documents: Vec<Document>, stage: &Stage) -> BookstoreResult<Vec<Document>> {
    match stage {
        Stage::Group { key, accumulators } => group(documents, key, accumulators),
        Stage::Project(fields) => documents
            .iter()
            .map(|document| {
                let mut projected = Document::new();
                if let Some(id) = document.get(GROUP_KEY) {
                    projected.insert(GROUP_KEY, id.clone());
                }
                for (name, expr) in fields {
                    projected.insert(name.clone(), evaluate(expr, document)?);
                }
                Ok(projected)
            })
            .collect(),
        Stage::Sort(keys) => {
            let mut documents = documents;
            sort_documents(&mut documents, keys);
            Ok(documents)
        }
        Stage::Limit(n) => Ok(documents.into_iter().take(*n).collect()),
    }
}

/// Numeric view of a BSON value used by arithmetic and accumulators.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn from_bson(value: &Bson) -> Option<Number> {
        match value {
            Bson::Int32(v) => Some(Number::Int(*v as i64)),
            Bson::Int64(v) => Some(Number::Int(*v)),
            Bson::Double(v) => Some(Number::Float(*v)),
            _ => None,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Number::Int(v) => v as f64,
            Number::Float(v) => v,
        }
    }

    fn into_bson(self) -> Bson {
        match self {
            Number::Int(v) => match i32::try_from(v) {
                Ok(small) => Bson::Int32(small),
                Err(_) => Bson::Int64(v),
            },
            Number::Float(v) => Bson::Double(v),
        }
    }

    fn checked_mul(self, other: Number) -> Number {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => match a.checked_mul(b) {
                Some(product) => Number::Int(product),
                None => Number::Float(a as f64 * b as f64),
            },
            (a, b) => Number::Float(a.as_f64() * b.as_f64()),
        }
    }

    fn checked_add(self, other: Number) -> Number {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => match a.checked_add(b) {
                Some(sum) => Number::Int(sum),
                None => Number::Float(a as f64 + b as f64),
            },
            (a, b) => Number::Float(a.as_f64() + b.as_f64()),
        }
    }
}

/// Evaluates a pipeline expression against one document.
///
/// Arithmetic on a null or missing operand yields null.
pub(crate) fn evaluate(expr: &Expression, document: &Document) -> BookstoreResult<Bson> {
    match expr {
        Expression::Field(name) => Ok(document.get(name).cloned().unwrap_or(Bson::Null)),
        Expression::Literal(value) => Ok(value.clone()),
        Expression::Multiply(operands) => {
            let mut product = Number::Int(1);
            for operand in operands {
                match numeric_operand(evaluate(operand, document)?, "$multiply")? {
                    Some(number) => product = product.checked_mul(number),
                    None => return Ok(Bson::Null),
                }
            }
            Ok(product.into_bson())
        }
        Expression::Divide(dividend, divisor) => {
            let dividend = numeric_operand(evaluate(dividend, document)?, "$divide")?;
            let divisor = numeric_operand(evaluate(divisor, document)?, "$divide")?;
            match (dividend, divisor) {
                (Some(_), Some(divisor)) if divisor.as_f64() == 0.0 => Err(
                    BookstoreError::InvalidPipeline("can't $divide by zero".to_string()),
                ),
                (Some(dividend), Some(divisor)) => Ok(Bson::Double(dividend.as_f64() / divisor.as_f64())),
                _ => Ok(Bson::Null),
            }
        }
        Expression::Floor(operand) => match numeric_operand(evaluate(operand, document)?, "$floor")? {
            Some(Number::Float(v)) => Ok(Bson::Double(v.floor())),
            Some(int) => Ok(int.into_bson()),
            None => Ok(Bson::Null),
        },
    }
}

fn numeric_operand(value: Bson, operator: &str) -> BookstoreResult<Option<Number>> {
    match value {
        Bson::Null => Ok(None),
        other => Number::from_bson(&other).map(Some).ok_or_else(|| {
            BookstoreError::InvalidPipeline(format!(
                "{operator} only supports numeric types, not {:?}",
                other.element_type()
            ))
        }),
    }
}

/// Running state of one accumulator within one group.
#[derive(Debug, Clone)]
enum AccumulatorState {
    Sum(Number),
    Avg { total: f64, count: u64 },
}

impl AccumulatorState {
    fn new(accumulator: &Accumulator) -> Self {
        match accumulator {
            Accumulator::Sum(_) => AccumulatorState::Sum(Number::Int(0)),
            Accumulator::Avg(_) => AccumulatorState::Avg { total: 0.0, count: 0 },
        }
    }

    /// Folds one value in; non-numeric values are ignored.
    fn push(&mut self, value: &Bson) {
        let Some(number) = Number::from_bson(value) else {
            return;
        };

        match self {
            AccumulatorState::Sum(sum) => *sum = sum.checked_add(number),
            AccumulatorState::Avg { total, count } => {
                *total += number.as_f64();
                *count += 1;
            }
        }
    }

    fn finish(self) -> Bson {
        match self {
            AccumulatorState::Sum(sum) => sum.into_bson(),
            AccumulatorState::Avg { count: 0, .. } => Bson::Null,
            AccumulatorState::Avg { total, count } => Bson::Double(total / count as f64),
        }
    }
}

fn group(
    documents: Vec<Document>,
    key: &Expression,
    accumulators: &[(String, Accumulator)],
) -> BookstoreResult<Vec<Document>> {
    // Groups keep first-seen order; keys are compared with numeric normalization.
    let mut groups: Vec<(Bson, Vec<AccumulatorState>)> = Vec::new();

    for document in &documents {
        let group_key = evaluate(key, document)?;
        let position = match groups
            .iter()
            .position(|(existing, _)| Comparable::from(existing) == Comparable::from(&group_key))
        {
            Some(position) => position,
            None => {
                groups.push((
                    group_key,
                    accumulators.iter().map(|(_, acc)| AccumulatorState::new(acc)).collect(),
                ));
                groups.len() - 1
            }
        };

        for ((_, accumulator), state) in accumulators.iter().zip(groups[position].1.iter_mut()) {
            let input = match accumulator {
                Accumulator::Sum(expr) | Accumulator::Avg(expr) => evaluate(expr, document)?,
            };
            state.push(&input);
        }
    }

    Ok(groups
        .into_iter()
        .map(|(group_key, states)| {
            let mut output = Document::new();
            output.insert(GROUP_KEY, group_key);
            for ((name, _), state) in accumulators.iter().zip(states) {
                output.insert(name.clone(), state.finish());
            }
            output
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use bookstore_core::query::Sort;

    use super::*;

    fn books() -> Vec<Document> {
        vec![
            doc! { "author": "Orwell", "genre": "Dystopian", "price": 10.0, "published_year": 1949 },
            doc! { "author": "Tolkien", "genre": "Fantasy", "price": 14.0, "published_year": 1954 },
            doc! { "author": "Orwell", "genre": "Dystopian", "price": 7, "published_year": 1945 },
            doc! { "author": "Tolkien", "genre": "Fantasy", "price": 20.5, "published_year": 1937 },
            doc! { "author": "Austen", "genre": "Romance", "price": 8.99, "published_year": 1813 },
        ]
    }

    #[test]
    fn average_and_count_per_group() {
        let pipeline = Pipeline::new()
            .group(
                Expression::field("genre"),
                [
                    ("avgPrice", Accumulator::Avg(Expression::field("price"))),
                    ("count", Accumulator::count()),
                ],
            )
            .sort([Sort::asc("_id")]);

        let result = run_pipeline(books(), &pipeline).unwrap();

        assert_eq!(
            result,
            vec![
                doc! { "_id": "Dystopian", "avgPrice": 8.5, "count": 2 },
                doc! { "_id": "Fantasy", "avgPrice": 17.25, "count": 2 },
                doc! { "_id": "Romance", "avgPrice": 8.99, "count": 1 },
            ]
        );
    }

    #[test]
    fn top_author_breaks_ties_by_name() {
        let pipeline = Pipeline::new()
            .group(Expression::field("author"), [("books", Accumulator::count())])
            .sort([Sort::desc("books"), Sort::asc("_id")])
            .limit(1);

        let result = run_pipeline(books(), &pipeline).unwrap();

        assert_eq!(result, vec![doc! { "_id": "Orwell", "books": 2 }]);
    }

    #[test]
    fn decade_bucket_floors_year() {
        let decade = Expression::bucket_start("published_year", 10);

        assert_eq!(
            evaluate(&decade, &doc! { "published_year": 1954 }).unwrap(),
            Bson::Double(1950.0)
        );
        assert_eq!(
            evaluate(&decade, &doc! { "published_year": 1949 }).unwrap(),
            Bson::Double(1940.0)
        );
        assert_eq!(evaluate(&decade, &doc! {}).unwrap(), Bson::Null);
    }

    #[test]
    fn project_then_group_counts_by_decade() {
        let pipeline = Pipeline::new()
            .project([("decade", Expression::bucket_start("published_year", 10))])
            .group(Expression::field("decade"), [("count", Accumulator::count())])
            .sort([Sort::asc("_id")]);

        let result = run_pipeline(books(), &pipeline).unwrap();

        assert_eq!(
            result,
            vec![
                doc! { "_id": 1810.0, "count": 1 },
                doc! { "_id": 1930.0, "count": 1 },
                doc! { "_id": 1940.0, "count": 2 },
                doc! { "_id": 1950.0, "count": 1 },
            ]
        );
    }

    #[test]
    fn arithmetic_on_strings_is_rejected() {
        let result = evaluate(
            &Expression::bucket_start("published_year", 10),
            &doc! { "published_year": "1954" },
        );

        assert!(matches!(result, Err(BookstoreError::InvalidPipeline(_))));
    }
}
