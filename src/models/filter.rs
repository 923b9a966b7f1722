//! Search filter shared by every query of one sweep

use serde::{Deserialize, Serialize};

/// Category id of electric vehicle charging stations
pub const EV_CHARGING_CATEGORY: u32 = 7309;

/// Constant filter for one full sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Country code (ISO 3166-1 alpha-2), e.g. `DE`
    pub country: String,
    /// POI category id
    pub category: u32,
    /// Minimum connector power in kW
    pub min_power_kw: f64,
    /// Maximum number of results the API returns per query
    pub limit: u32,
}

impl SearchFilter {
    #[must_use]
    pub fn new(country: impl Into<String>, category: u32, min_power_kw: f64, limit: u32) -> Self {
        Self {
            country: country.into(),
            category,
            min_power_kw,
            limit,
        }
    }
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self::new("DE", EV_CHARGING_CATEGORY, 0.0, 100)
    }
}
