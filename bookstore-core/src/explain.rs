//! Query plan summaries.
//!
//! Backends report how a find was executed as an [`ExplainSummary`]: the chain of
//! plan stages from the root of the winning plan down to the leaf, the index the
//! leaf scanned (if any) and the execution counters.

use serde_json::{Value, json};

/// Stage name of a full collection scan.
pub const COLLECTION_SCAN: &str = "COLLSCAN";
/// Stage name of an index scan.
pub const INDEX_SCAN: &str = "IXSCAN";
/// Stage name of the document fetch that follows an index scan.
pub const FETCH: &str = "FETCH";
/// Stage name of an in-memory sort.
pub const SORT: &str = "SORT";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExplainSummary {
    /// Winning plan stages, root first.
    pub stages: Vec<String>,
    /// Name of the index scanned by the plan, if any.
    pub index_name: Option<String>,
    pub docs_examined: u64,
    pub keys_examined: u64,
    pub returned: u64,
}

impl ExplainSummary {
    /// The root stage of the winning plan.
    pub fn winning_stage(&self) -> Option<&str> {
        self.stages.first().map(String::as_str)
    }

    /// The stage directly below the root, if the plan has one.
    pub fn input_stage(&self) -> Option<&str> {
        self.stages.get(1).map(String::as_str)
    }

    pub fn uses_index(&self) -> bool {
        self.stages.iter().any(|stage| stage == INDEX_SCAN)
    }

    pub fn is_collection_scan(&self) -> bool {
        self.stages.iter().any(|stage| stage == COLLECTION_SCAN)
    }

    /// The condensed form printed by the runner.
    pub fn to_json(&self) -> Value {
        json!({
            "winningPlan": self.winning_stage(),
            "inputStage": self.input_stage(),
            "indexName": self.index_name,
            "totalDocsExamined": self.docs_examined,
            "totalKeysExamined": self.keys_examined,
            "nReturned": self.returned,
        })
    }
}
