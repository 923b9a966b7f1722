//! `poi-sweep` - exhaustive point-of-interest enumeration
//!
//! The search API behind this crate returns at most a fixed number of results
//! per query and has no pagination. This library sweeps a bounding box by
//! splitting every region whose matches do not fit into one response into
//! quadrants, throttled by a process-wide rate limiter, and collects the
//! complete result set.

pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod rate_limiter;
pub mod search;
pub mod telemetry;
pub mod tomtom;

// Re-export core types for public API
pub use config::SweepConfig;
pub use error::{QueryError, SweepError};
pub use models::{BoundingBox, PoiRecord, QueryResult, QuerySummary, SearchFilter};
pub use rate_limiter::RateLimiter;
pub use search::{Progress, QueryClient, RegionSearcher, SweepOptions, SweepReport};
pub use tomtom::TomTomClient;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, SweepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
