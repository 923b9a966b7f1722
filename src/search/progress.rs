use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

/// Running total of collected POIs for one sweep.
///
/// Only feeds progress logging; nothing in the sweep depends on its value.
#[derive(Debug, Default)]
pub struct Progress {
    collected: AtomicU64,
    root_total: OnceLock<u64>,
}

impl Progress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the root region's match count. Later calls are ignored.
    pub fn set_root_total(&self, total: u64) {
        let _ = self.root_total.set(total);
    }

    #[must_use]
    pub fn root_total(&self) -> Option<u64> {
        self.root_total.get().copied()
    }

    #[must_use]
    pub fn collected(&self) -> u64 {
        self.collected.load(Ordering::Relaxed)
    }

    /// Add `count` records and log the new position. Returns the new total.
    pub fn record(&self, count: u64) -> u64 {
        let collected = self.collected.fetch_add(count, Ordering::Relaxed) + count;
        match (self.root_total(), self.percent()) {
            (Some(total), Some(percent)) => info!("{collected}/{total} = {percent:.3}%"),
            _ => info!("{collected} collected"),
        }
        collected
    }

    /// Percentage of the root total collected so far
    #[must_use]
    pub fn percent(&self) -> Option<f64> {
        self.root_total()
            .filter(|&total| total > 0)
            .map(|total| self.collected() as f64 * 100.0 / total as f64)
    }
}
