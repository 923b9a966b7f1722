//! Adaptive region search
//!
//! This module holds the sweep itself:
//! - [`QueryClient`], the one capability the sweep needs from the outside world
//! - [`RegionSearcher`], which splits under-covered regions into quadrants until
//!   every region's matches fit into one response
//! - [`Progress`], the running total used for progress logging

pub mod progress;
pub mod region_searcher;

pub use progress::Progress;
pub use region_searcher::{RegionSearcher, SweepOptions, SweepReport};

use crate::error::QueryError;
use crate::models::{BoundingBox, QueryResult, SearchFilter};

/// Issues one search query for a region.
///
/// Implementations return up to `filter.limit` records inside `bbox`, together
/// with the number returned and the number that exist. A transport failure is
/// an `Err`, never an empty `Ok`.
pub trait QueryClient {
    async fn query(
        &self,
        bbox: &BoundingBox,
        filter: &SearchFilter,
    ) -> Result<QueryResult, QueryError>;
}
