//! Quadrant-splitting sweep over a bounding box
//!
//! The search API returns at most `limit` records per call and reports how
//! many exist in the queried region. A region whose response already holds
//! every match is a leaf; any other region is split into four quadrants that
//! are searched in turn. Pending regions live on an explicit stack, so the
//! visiting order is the depth-first order of the quadrant split without
//! growing the call stack.
//!
//! Sibling quadrants share their edges. Providers that treat a box as closed
//! return a POI on a split line once per quadrant touching it, so records are
//! kept only for the first occurrence of their `id`.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, instrument, warn};

use super::{Progress, QueryClient};
use crate::error::QueryError;
use crate::models::{BoundingBox, PoiRecord, SearchFilter};
use crate::rate_limiter::RateLimiter;

/// Default smallest span (degrees) that is still split, roughly one metre
pub const DEFAULT_MIN_SPAN_DEGREES: f64 = 1e-5;

/// Default maximum number of subdivision levels below the root
pub const DEFAULT_MAX_DEPTH: u32 = 32;

/// Limits that stop subdivision of regions that never become fully covered
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepOptions {
    /// Regions whose both spans are at or below this are accepted as they are
    pub min_span_degrees: f64,
    /// Regions at this depth are accepted as they are
    pub max_depth: u32,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            min_span_degrees: DEFAULT_MIN_SPAN_DEGREES,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// A region whose query failed and which contributed no records
#[derive(Debug, Clone, PartialEq)]
pub struct FailedRegion {
    pub bbox: BoundingBox,
    pub error: QueryError,
}

/// Outcome of one sweep
#[derive(Debug, Clone)]
pub struct SweepReport {
    /// Collected records in quadrant order
    pub records: Vec<PoiRecord>,
    /// Match count reported for the root region, if its query succeeded
    pub root_total: Option<u64>,
    /// Number of queries issued
    pub queries: u64,
    /// Deepest subdivision level visited
    pub max_depth_reached: u32,
    pub failed_regions: Vec<FailedRegion>,
    /// Under-covered regions accepted with partial results
    pub truncated_regions: Vec<BoundingBox>,
    /// Records dropped because their `id` was already collected
    pub duplicates_dropped: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SweepReport {
    /// No failures, no truncation, and the record count matches the root total.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed_regions.is_empty()
            && self.truncated_regions.is_empty()
            && self.root_total == Some(self.records.len() as u64)
    }

    /// Records the root total promised but the sweep did not deliver
    #[must_use]
    pub fn missing(&self) -> Option<u64> {
        self.root_total
            .map(|total| total.saturating_sub(self.records.len() as u64))
    }

    #[must_use]
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

/// Searches a region exhaustively by recursive quadrant splitting
pub struct RegionSearcher<C> {
    client: C,
    rate_limiter: Arc<RateLimiter>,
    options: SweepOptions,
}

impl<C: QueryClient> RegionSearcher<C> {
    /// Create a searcher that gates every query of `client` through `rate_limiter`
    pub fn new(client: C, rate_limiter: Arc<RateLimiter>) -> Self {
        Self {
            client,
            rate_limiter,
            options: SweepOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: SweepOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &SweepOptions {
        &self.options
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Collect every record matching `filter` inside `bbox`.
    ///
    /// Failed regions contribute nothing; see [`RegionSearcher::sweep`] for the
    /// bookkeeping behind the returned records.
    pub async fn search(&self, bbox: &BoundingBox, filter: &SearchFilter) -> Vec<PoiRecord> {
        self.sweep(bbox, filter).await.records
    }

    /// Sweep `root` and report what was collected, what failed, and what was truncated.
    #[instrument(name = "sweep", level = "info", skip_all, fields(root = %root, country = %filter.country, category = filter.category))]
    pub async fn sweep(&self, root: &BoundingBox, filter: &SearchFilter) -> SweepReport {
        let started_at = Utc::now();
        let progress = Progress::new();

        let mut records = Vec::new();
        let mut seen_ids = HashSet::new();
        let mut duplicates_dropped = 0_u64;
        let mut failed_regions = Vec::new();
        let mut truncated_regions = Vec::new();
        let mut queries = 0_u64;
        let mut max_depth_reached = 0_u32;

        let mut pending = vec![(*root, 0_u32)];

        while let Some((bbox, depth)) = pending.pop() {
            max_depth_reached = max_depth_reached.max(depth);

            self.rate_limiter.acquire().await;
            queries += 1;

            let result = match self.client.query(&bbox, filter).await {
                Ok(result) => result,
                Err(err) => {
                    error!("Query failed for region {bbox} at depth {depth}: {err}");
                    failed_regions.push(FailedRegion { bbox, error: err });
                    continue;
                }
            };

            if depth == 0 {
                info!(
                    "Root region holds {} matches",
                    result.summary.total_results
                );
                progress.set_root_total(result.summary.total_results);
            }

            if result.is_fully_covered() {
                debug!(
                    "Region {bbox} fully covered with {} records",
                    result.results.len()
                );
                duplicates_dropped +=
                    collect_unique(result.results, &mut records, &mut seen_ids, &progress);
                continue;
            }

            if depth >= self.options.max_depth || bbox.is_at_resolution(self.options.min_span_degrees)
            {
                warn!(
                    "Region {bbox} still under-covered at depth {depth} ({} of {} returned); accepting partial results",
                    result.summary.num_results, result.summary.total_results
                );
                truncated_regions.push(bbox);
                duplicates_dropped +=
                    collect_unique(result.results, &mut records, &mut seen_ids, &progress);
                continue;
            }

            debug!(
                "Region {bbox} under-covered ({} of {}), splitting",
                result.summary.num_results, result.summary.total_results
            );
            // Reversed so the first quadrant is popped first.
            for quadrant in bbox.split().into_iter().rev() {
                pending.push((quadrant, depth + 1));
            }
        }

        let report = SweepReport {
            records,
            root_total: progress.root_total(),
            queries,
            max_depth_reached,
            failed_regions,
            truncated_regions,
            duplicates_dropped,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            "Sweep finished: {} records, {} queries, depth {}, {} failed, {} truncated, {} duplicates dropped",
            report.records.len(),
            report.queries,
            report.max_depth_reached,
            report.failed_regions.len(),
            report.truncated_regions.len(),
            report.duplicates_dropped
        );

        report
    }
}

/// Append the records whose `id` has not been seen yet and return how many were dropped.
///
/// Records without an `id` cannot be compared and are always kept.
fn collect_unique(
    results: Vec<PoiRecord>,
    records: &mut Vec<PoiRecord>,
    seen_ids: &mut HashSet<String>,
    progress: &Progress,
) -> u64 {
    let before = records.len();
    let mut dropped = 0_u64;

    for record in results {
        let is_new = record.id().is_none_or(|id| seen_ids.insert(id.to_string()));
        if is_new {
            records.push(record);
        } else {
            dropped += 1;
        }
    }

    if dropped > 0 {
        debug!("Dropped {dropped} records already collected from a neighbouring region");
    }
    let kept = (records.len() - before) as u64;
    if kept > 0 {
        progress.record(kept);
    }
    dropped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QueryResult;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replays canned responses in call order and records the queried boxes.
    struct ScriptedClient {
        responses: Mutex<Vec<Result<QueryResult, QueryError>>>,
        seen: Mutex<Vec<BoundingBox>>,
    }

    impl ScriptedClient {
        fn new(mut responses: Vec<Result<QueryResult, QueryError>>) -> Self {
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl QueryClient for ScriptedClient {
        async fn query(
            &self,
            bbox: &BoundingBox,
            _filter: &SearchFilter,
        ) -> Result<QueryResult, QueryError> {
            self.seen.lock().unwrap().push(*bbox);
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok(QueryResult::new(0, 0, vec![])))
        }
    }

    fn records(ids: &[&str]) -> Vec<PoiRecord> {
        ids.iter().map(|id| PoiRecord::new(json!({ "id": id }))).collect()
    }

    fn searcher(client: ScriptedClient) -> RegionSearcher<ScriptedClient> {
        RegionSearcher::new(client, Arc::new(RateLimiter::new(Duration::ZERO)))
    }

    fn unit_box() -> BoundingBox {
        BoundingBox::new(1.0, 0.0, 0.0, 1.0).unwrap()
    }

    #[tokio::test]
    async fn test_fully_covered_root_is_single_query() {
        let searcher = searcher(ScriptedClient::new(vec![Ok(QueryResult::new(
            2,
            2,
            records(&["a", "b"]),
        ))]));

        let report = searcher.sweep(&unit_box(), &SearchFilter::default()).await;

        assert_eq!(report.queries, 1);
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.root_total, Some(2));
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn test_under_covered_root_visits_quadrants_in_order() {
        let searcher = searcher(ScriptedClient::new(vec![
            Ok(QueryResult::new(1, 4, records(&["x"]))),
            Ok(QueryResult::new(1, 1, records(&["bl"]))),
            Ok(QueryResult::new(1, 1, records(&["tl"]))),
            Ok(QueryResult::new(1, 1, records(&["tr"]))),
            Ok(QueryResult::new(1, 1, records(&["br"]))),
        ]));

        let report = searcher.sweep(&unit_box(), &SearchFilter::default()).await;

        let ids: Vec<_> = report.records.iter().filter_map(PoiRecord::id).collect();
        assert_eq!(ids, vec!["bl", "tl", "tr", "br"]);

        let seen = searcher.client().seen.lock().unwrap().clone();
        assert_eq!(seen[0], unit_box());
        assert_eq!(&seen[1..], &unit_box().split());
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn test_empty_root_returns_nothing() {
        let searcher = searcher(ScriptedClient::new(vec![Ok(QueryResult::new(0, 0, vec![]))]));
        let report = searcher.sweep(&unit_box(), &SearchFilter::default()).await;
        assert!(report.records.is_empty());
        assert_eq!(report.queries, 1);
        assert_eq!(report.root_total, Some(0));
    }

    #[tokio::test]
    async fn test_failed_root_yields_empty_report() {
        let failing = || {
            ScriptedClient::new(vec![Err(QueryError::Network("connection reset".into()))])
        };

        let records = searcher(failing())
            .search(&unit_box(), &SearchFilter::default())
            .await;
        assert!(records.is_empty());

        let report = searcher(failing())
            .sweep(&unit_box(), &SearchFilter::default())
            .await;
        assert_eq!(report.root_total, None);
        assert_eq!(report.failed_regions.len(), 1);
        assert_eq!(report.failed_regions[0].bbox, unit_box());
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn test_max_depth_truncates() {
        let searcher = searcher(ScriptedClient::new(vec![Ok(QueryResult::new(
            1,
            5,
            records(&["only"]),
        ))]))
        .with_options(SweepOptions {
            min_span_degrees: DEFAULT_MIN_SPAN_DEGREES,
            max_depth: 0,
        });

        let report = searcher.sweep(&unit_box(), &SearchFilter::default()).await;

        assert_eq!(report.queries, 1);
        assert_eq!(report.truncated_regions, vec![unit_box()]);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.missing(), Some(4));
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn test_repeated_ids_are_kept_once() {
        let anonymous = PoiRecord::new(json!({ "name": "no id" }));
        let searcher = searcher(ScriptedClient::new(vec![
            Ok(QueryResult::new(1, 4, records(&["x"]))),
            Ok(QueryResult::new(2, 2, records(&["edge", "a"]))),
            Ok(QueryResult::new(1, 1, records(&["edge"]))),
            Ok(QueryResult::new(2, 2, vec![anonymous.clone(), anonymous.clone()])),
            Ok(QueryResult::new(2, 2, records(&["edge", "b"]))),
        ]));

        let report = searcher.sweep(&unit_box(), &SearchFilter::default()).await;

        let ids: Vec<_> = report.records.iter().filter_map(PoiRecord::id).collect();
        assert_eq!(ids, vec!["edge", "a", "b"]);
        assert_eq!(report.records.len(), 5);
        assert_eq!(report.duplicates_dropped, 2);
    }
}
