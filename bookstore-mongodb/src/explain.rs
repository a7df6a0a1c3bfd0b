//! Parsing of MongoDB `explain` output into an [`ExplainSummary`].
//!
//! Classic engine plans put the stage tree directly under
//! `queryPlanner.winningPlan`; slot-based engine plans nest it one level deeper
//! under `winningPlan.queryPlan`. Both shapes are accepted.

use bson::{Bson, Document};

use bookstore_core::explain::ExplainSummary;

/// Builds a summary from an `explain` command reply run with `executionStats` verbosity.
pub(crate) fn summarize(explain: &Document) -> ExplainSummary {
    let mut summary = ExplainSummary::default();

    if let Some(plan) = winning_plan(explain) {
        collect_stages(plan, &mut summary);
    }

    if let Ok(stats) = explain.get_document("executionStats") {
        summary.docs_examined = read_u64(stats, "totalDocsExamined").unwrap_or(0);
        summary.keys_examined = read_u64(stats, "totalKeysExamined").unwrap_or(0);
        summary.returned = read_u64(stats, "nReturned").unwrap_or(0);
    }

    summary
}

fn winning_plan(explain: &Document) -> Option<&Document> {
    let plan = explain
        .get_document("queryPlanner")
        .ok()?
        .get_document("winningPlan")
        .ok()?;

    match plan.get_document("queryPlan") {
        Ok(query_plan) => Some(query_plan),
        Err(_) => Some(plan),
    }
}

/// Walks the `inputStage` chain from the root, recording stage names and the
/// first index name encountered.
fn collect_stages(plan: &Document, summary: &mut ExplainSummary) {
    let mut current = Some(plan);

    while let Some(stage) = current {
        if let Ok(name) = stage.get_str("stage") {
            summary.stages.push(name.to_string());
        }
        if summary.index_name.is_none() {
            if let Ok(index_name) = stage.get_str("indexName") {
                summary.index_name = Some(index_name.to_string());
            }
        }

        current = stage.get_document("inputStage").ok().or_else(|| {
            stage
                .get_array("inputStages")
                .ok()
                .and_then(|inputs| inputs.first())
                .and_then(Bson::as_document)
        });
    }
}

fn read_u64(doc: &Document, key: &str) -> Option<u64> {
    match doc.get(key)? {
        Bson::Int32(v) if *v >= 0 => Some(*v as u64),
        Bson::Int64(v) if *v >= 0 => Some(*v as u64),
        Bson::Double(v) if *v >= 0.0 => Some(*v as u64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::*;

    #[test]
    fn classic_collection_scan() {
        let summary = summarize(&doc! {
            "queryPlanner": {
                "winningPlan": { "stage": "COLLSCAN", "filter": { "title": { "$eq": "1984" } } }
            },
            "executionStats": {
                "nReturned": 1,
                "totalKeysExamined": 0,
                "totalDocsExamined": 12,
            }
        });

        assert_eq!(summary.stages, vec!["COLLSCAN".to_string()]);
        assert!(summary.is_collection_scan());
        assert_eq!(summary.docs_examined, 12);
        assert_eq!(summary.index_name, None);
    }

    #[test]
    fn classic_fetch_over_index_scan() {
        let summary = summarize(&doc! {
            "queryPlanner": {
                "winningPlan": {
                    "stage": "FETCH",
                    "inputStage": {
                        "stage": "IXSCAN",
                        "keyPattern": { "title": 1 },
                        "indexName": "idx_title",
                    }
                }
            },
            "executionStats": {
                "nReturned": 1,
                "totalKeysExamined": 1,
                "totalDocsExamined": 1_i64,
            }
        });

        assert_eq!(summary.winning_stage(), Some("FETCH"));
        assert_eq!(summary.input_stage(), Some("IXSCAN"));
        assert_eq!(summary.index_name.as_deref(), Some("idx_title"));
        assert_eq!((summary.keys_examined, summary.docs_examined), (1, 1));
    }

    #[test]
    fn slot_based_plan_is_unwrapped() {
        let summary = summarize(&doc! {
            "queryPlanner": {
                "winningPlan": {
                    "queryPlan": {
                        "stage": "FETCH",
                        "inputStage": { "stage": "IXSCAN", "indexName": "idx_author_year" }
                    },
                    "slotBasedPlan": { "stages": "omitted" }
                }
            },
            "executionStats": { "nReturned": 2, "totalKeysExamined": 2, "totalDocsExamined": 2 }
        });

        assert!(summary.uses_index());
        assert_eq!(summary.index_name.as_deref(), Some("idx_author_year"));
        assert_eq!(summary.returned, 2);
    }

    #[test]
    fn missing_sections_yield_empty_summary() {
        assert_eq!(summarize(&doc! { "ok": 1 }), ExplainSummary::default());
    }
}
