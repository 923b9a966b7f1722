//! Data models for the POI sweep

pub mod bounding_box;
pub mod filter;
pub mod poi;

pub use bounding_box::BoundingBox;
pub use filter::{EV_CHARGING_CATEGORY, SearchFilter};
pub use poi::{PoiRecord, QueryResult, QuerySummary};
