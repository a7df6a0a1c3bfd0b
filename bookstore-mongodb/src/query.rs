//! Query translation from bookstore filter expressions to MongoDB query syntax.
//!
//! This module translates the abstract filter expressions of `bookstore-core`
//! into BSON documents for execution by the MongoDB query engine.

use bson::{Document, Bson, doc};

use bookstore_core::{
    query::{QueryVisitor, Expr, FieldOp},
    error::BookstoreError,
};


/// Translates filter expressions into MongoDB query documents.
///
/// Conjunctions of plain field comparisons are rendered in the implicit form
/// (`{ in_stock: { $eq: true }, published_year: { $gt: 2010 } }`), which the
/// query planner treats exactly like `$and` but keeps explain output readable.
pub(crate) struct MongoQueryTranslator;

impl MongoQueryTranslator {
    pub(crate) fn translate(expr: Option<&Expr>) -> Result<Document, BookstoreError> {
        match expr {
            Some(expr) => MongoQueryTranslator.visit_expr(expr),
            None => Ok(doc! {}),
        }
    }
}

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = BookstoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        let translated = exprs
            .iter()
            .map(|expr| self.visit_expr(expr))
            .collect::<Result<Vec<_>, _>>()?;

        let mut merged = Document::new();
        for part in &translated {
            for (field, condition) in part {
                if field.starts_with('$') || merged.contains_key(field) {
                    return Ok(doc! { "$and": translated });
                }
                merged.insert(field.clone(), condition.clone());
            }
        }

        Ok(merged)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$or": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$nor": [self.visit_expr(expr)?],
        })
    }

    fn visit_field(&mut self, field: &str, op: FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        if field.is_empty() {
            return Err(BookstoreError::InvalidQuery("field name must not be empty".to_string()));
        }

        let operator = op.operator();

        Ok(doc! {
            field: { operator: value.clone() },
        })
    }
}

#[cfg(test)]
mod tests {
    use bookstore_core::query::Filter;

    use super::*;

    #[test]
    fn single_comparison() {
        let query = MongoQueryTranslator::translate(Some(&Filter::gt("published_year", 1950))).unwrap();

        assert_eq!(query, doc! { "published_year": { "$gt": 1950 } });
    }

    #[test]
    fn conjunction_of_distinct_fields_is_implicit() {
        let query = MongoQueryTranslator::translate(Some(&Filter::and([
            Filter::eq("in_stock", true),
            Filter::gt("published_year", 2010),
        ])))
        .unwrap();

        assert_eq!(
            query,
            doc! { "in_stock": { "$eq": true }, "published_year": { "$gt": 2010 } }
        );
    }

    #[test]
    fn conjunction_on_repeated_field_uses_and() {
        let query = MongoQueryTranslator::translate(Some(&Filter::and([
            Filter::gte("published_year", 1900),
            Filter::lt("published_year", 2000),
        ])))
        .unwrap();

        assert_eq!(
            query,
            doc! { "$and": [
                { "published_year": { "$gte": 1900 } },
                { "published_year": { "$lt": 2000 } },
            ] }
        );
    }

    #[test]
    fn negation_and_disjunction() {
        let query = MongoQueryTranslator::translate(Some(
            &Filter::eq("genre", "Fiction").or(Filter::eq("genre", "Fantasy")).not(),
        ))
        .unwrap();

        assert_eq!(
            query,
            doc! { "$nor": [{ "$or": [
                { "genre": { "$eq": "Fiction" } },
                { "genre": { "$eq": "Fantasy" } },
            ] }] }
        );
    }

    #[test]
    fn missing_filter_matches_everything() {
        assert_eq!(MongoQueryTranslator::translate(None).unwrap(), doc! {});
    }
}
