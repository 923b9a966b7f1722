//! Synthetic search API used by the sweep behaviour tests

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use poi_sweep::{BoundingBox, PoiRecord, QueryClient, QueryError, QueryResult, SearchFilter};
use serde_json::json;

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticPoi {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
}

impl SyntheticPoi {
    fn record(&self) -> PoiRecord {
        PoiRecord::new(json!({
            "id": self.id,
            "poi": { "name": format!("Station {}", self.id) },
            "position": { "lat": self.lat, "lon": self.lon }
        }))
    }
}

/// Answers every box with the true match count and at most `filter.limit` records.
pub struct SyntheticClient {
    pois: Vec<SyntheticPoi>,
    failing: Vec<BoundingBox>,
    closed_edges: bool,
    queried: Mutex<Vec<BoundingBox>>,
}

impl SyntheticClient {
    pub fn new(pois: Vec<SyntheticPoi>) -> Self {
        Self {
            pois,
            failing: Vec::new(),
            closed_edges: false,
            queried: Mutex::new(Vec::new()),
        }
    }

    /// Make queries for exactly `bbox` fail with a server error
    pub fn failing_on(mut self, bbox: BoundingBox) -> Self {
        self.failing.push(bbox);
        self
    }

    /// Count POIs on any edge of a box as inside it, so shared split lines match twice
    pub fn with_closed_edges(mut self) -> Self {
        self.closed_edges = true;
        self
    }

    fn covers(&self, bbox: &BoundingBox, poi: &SyntheticPoi) -> bool {
        if self.closed_edges {
            (bbox.south()..=bbox.north()).contains(&poi.lat)
                && (bbox.west()..=bbox.east()).contains(&poi.lon)
        } else {
            bbox.contains(poi.lat, poi.lon)
        }
    }

    pub fn queried(&self) -> Vec<BoundingBox> {
        self.queried.lock().unwrap().clone()
    }

    pub fn ids_in(&self, bbox: &BoundingBox) -> HashSet<String> {
        self.pois
            .iter()
            .filter(|poi| self.covers(bbox, poi))
            .map(|poi| poi.id.clone())
            .collect()
    }
}

impl QueryClient for SyntheticClient {
    async fn query(
        &self,
        bbox: &BoundingBox,
        filter: &SearchFilter,
    ) -> Result<QueryResult, QueryError> {
        self.queried.lock().unwrap().push(*bbox);

        if self.failing.contains(bbox) {
            return Err(QueryError::Api {
                status: 500,
                body: "synthetic failure".to_string(),
            });
        }

        let matching: Vec<&SyntheticPoi> = self
            .pois
            .iter()
            .filter(|poi| self.covers(bbox, poi))
            .collect();

        let records: Vec<PoiRecord> = matching
            .iter()
            .take(filter.limit as usize)
            .map(|poi| poi.record())
            .collect();

        Ok(QueryResult::new(
            records.len() as u64,
            matching.len() as u64,
            records,
        ))
    }
}

/// Small deterministic generator so distributions are reproducible
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Uniform value in `[0, 1)`
    pub fn next_unit(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 11) as f64 / (1_u64 << 53) as f64
    }
}

/// `count` POIs spread uniformly over `bbox`
pub fn uniform(bbox: &BoundingBox, count: usize, seed: u64) -> Vec<SyntheticPoi> {
    let mut rng = Lcg::new(seed);
    (0..count)
        .map(|i| SyntheticPoi {
            id: format!("u{i}"),
            lat: bbox.south() + rng.next_unit() * bbox.lat_span(),
            lon: bbox.west() + rng.next_unit() * bbox.lon_span(),
        })
        .collect()
}

/// `count` POIs packed into a square of `radius` degrees around `(lat, lon)`
pub fn cluster(
    prefix: &str,
    lat: f64,
    lon: f64,
    radius: f64,
    count: usize,
    seed: u64,
) -> Vec<SyntheticPoi> {
    let mut rng = Lcg::new(seed);
    (0..count)
        .map(|i| SyntheticPoi {
            id: format!("{prefix}{i}"),
            lat: lat + (rng.next_unit() * 2.0 - 1.0) * radius,
            lon: lon + (rng.next_unit() * 2.0 - 1.0) * radius,
        })
        .collect()
}

pub fn record_ids(records: &[PoiRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.id().expect("synthetic records carry ids").to_string())
        .collect()
}

/// `rows * cols` POIs on a regular grid starting at `(lat, lon)`
pub fn grid(prefix: &str, lat: f64, lon: f64, rows: usize, cols: usize, spacing: f64) -> Vec<SyntheticPoi> {
    (0..rows)
        .flat_map(|row| (0..cols).map(move |col| (row, col)))
        .map(|(row, col)| SyntheticPoi {
            id: format!("{prefix}{row}_{col}"),
            lat: lat + row as f64 * spacing,
            lon: lon + col as f64 * spacing,
        })
        .collect()
}
