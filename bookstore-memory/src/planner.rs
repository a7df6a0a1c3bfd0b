//! Plan selection and explain summaries for the in-memory backend.
//!
//! The in-memory backend always scans, but it keeps the index definitions it was
//! given and reports the plan a document database would pick for them: the
//! index whose key prefix is bounded by the most filter predicates wins, an
//! index that already yields the requested order avoids a separate sort, and
//! without a usable index the plan is a collection scan.

use bson::Document;

use bookstore_core::{
    error::BookstoreResult,
    explain::{COLLECTION_SCAN, ExplainSummary, FETCH, INDEX_SCAN, SORT},
    index::IndexSpec,
    query::{Expr, FieldOp, Query, Sort},
};

use crate::evaluator::DocumentEvaluator;

/// The access path chosen for a query.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct QueryPlan<'a> {
    /// Index scanned, or `None` for a collection scan.
    pub index: Option<&'a IndexSpec>,
    /// Number of leading index keys bounded by the filter.
    pub bounded_keys: usize,
    /// Whether the scan already returns documents in the requested order.
    pub provides_sort: bool,
}

impl<'a> QueryPlan<'a> {
    /// Picks the best index for `query`, preferring the longest bounded key
    /// prefix and, among equals, the index created first.
    pub fn choose(indexes: &'a [IndexSpec], query: &Query) -> Self {
        let conjuncts = query
            .filter
            .as_ref()
            .map(Expr::conjuncts)
            .unwrap_or_default();

        let mut best = QueryPlan {
            index: None,
            bounded_keys: 0,
            provides_sort: query.sort.is_empty(),
        };

        for index in indexes {
            let (bounded_keys, equality_keys) = bounded_prefix(index, &conjuncts);
            if bounded_keys > best.bounded_keys {
                best = QueryPlan {
                    index: Some(index),
                    bounded_keys,
                    provides_sort: sort_follows_index(index, equality_keys, &query.sort),
                };
            }
        }

        best
    }

    /// Stage names of the plan, root first.
    pub fn stages(&self) -> Vec<String> {
        let mut stages = Vec::new();
        if !self.provides_sort {
            stages.push(SORT.to_string());
        }
        match self.index {
            Some(_) => {
                stages.push(FETCH.to_string());
                stages.push(INDEX_SCAN.to_string());
            }
            None => stages.push(COLLECTION_SCAN.to_string()),
        }
        stages
    }

    /// Fields whose predicates bound the index scan.
    fn bounded_fields(&self) -> Vec<&str> {
        self.index
            .map(|index| {
                index.keys
                    .iter()
                    .take(self.bounded_keys)
                    .map(|key| key.field.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Produces execution statistics for running the plan over `documents`.
    ///
    /// `returned` is the number of documents the query itself returned.
    pub fn explain(&self, documents: &[Document], query: &Query, returned: u64) -> BookstoreResult<ExplainSummary> {
        let (docs_examined, keys_examined) = match self.index {
            None => (documents.len() as u64, 0),
            Some(_) => {
                let fields = self.bounded_fields();
                let bounds = Expr::And(
                    query
                        .filter
                        .as_ref()
                        .map(Expr::conjuncts)
                        .unwrap_or_default()
                        .into_iter()
                        .filter(|(field, op, _)| *op != FieldOp::Ne && fields.contains(field))
                        .map(|(field, op, value)| Expr::field(field.to_string(), op, value.clone()))
                        .collect(),
                );

                let mut in_bounds = 0;
                for document in documents {
                    if DocumentEvaluator::new(document).evaluate(&bounds)? {
                        in_bounds += 1;
                    }
                }
                (in_bounds, in_bounds)
            }
        };

        Ok(ExplainSummary {
            stages: self.stages(),
            index_name: self.index.map(|index| index.name.clone()),
            docs_examined,
            keys_examined,
            returned,
        })
    }
}

/// Returns `(bounded, equality)`: how many leading keys of `index` the filter
/// bounds, and how many of those are bounded by equality. Bounding stops after
/// the first range predicate.
fn bounded_prefix(index: &IndexSpec, conjuncts: &[(&str, FieldOp, &bson::Bson)]) -> (usize, usize) {
    let mut bounded = 0;
    let mut equality = 0;

    for key in &index.keys {
        let ops: Vec<FieldOp> = conjuncts
            .iter()
            .filter(|(field, _, _)| *field == key.field)
            .map(|(_, op, _)| *op)
            .collect();

        if ops.contains(&FieldOp::Eq) {
            bounded += 1;
            equality += 1;
        } else if ops.iter().any(|op| op.is_range()) {
            bounded += 1;
            break;
        } else {
            break;
        }
    }

    (bounded, equality)
}

/// Whether scanning `index` (forwards or backwards) yields `sort` order once the
/// first `equality_keys` keys are pinned to single values.
fn sort_follows_index(index: &IndexSpec, equality_keys: usize, sort: &[Sort]) -> bool {
    if sort.is_empty() {
        return true;
    }

    let remaining = &index.keys[equality_keys.min(index.keys.len())..];
    if sort.len() > remaining.len() {
        return false;
    }

    let same_fields = sort
        .iter()
        .zip(remaining)
        .all(|(wanted, key)| wanted.field == key.field);
    let forward = sort
        .iter()
        .zip(remaining)
        .all(|(wanted, key)| wanted.direction == key.direction);
    let backward = sort
        .iter()
        .zip(remaining)
        .all(|(wanted, key)| wanted.direction == key.direction.reverse());

    same_fields && (forward || backward)
}
