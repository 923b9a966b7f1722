//! Query responses and opaque POI records

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single POI exactly as the API returned it.
///
/// The sweep never interprets the payload; only the output writers look inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoiRecord(Value);

impl PoiRecord {
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The record's `id` field, when it is a string
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    #[must_use]
    pub fn as_json(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for PoiRecord {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Counts reported alongside the records of one query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySummary {
    /// Records actually returned
    pub num_results: u64,
    /// Records that exist in the queried region
    pub total_results: u64,
}

/// Response of one region query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub summary: QuerySummary,
    #[serde(default)]
    pub results: Vec<PoiRecord>,
}

impl QueryResult {
    #[must_use]
    pub fn new(num_results: u64, total_results: u64, results: Vec<PoiRecord>) -> Self {
        Self {
            summary: QuerySummary {
                num_results,
                total_results,
            },
            results,
        }
    }

    /// Every match in the region came back in this single response.
    #[must_use]
    pub fn is_fully_covered(&self) -> bool {
        self.summary.num_results == self.summary.total_results
    }
}
