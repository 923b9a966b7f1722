//! Bounding box model for rectangular search regions

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::SweepError;

/// Rectangular search region in decimal degrees.
///
/// Boxes are immutable: splitting derives four new boxes and never touches
/// the parent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    north: f64,
    west: f64,
    south: f64,
    east: f64,
}

impl BoundingBox {
    /// Bounds of Germany, the default sweep region
    pub const GERMANY: BoundingBox = BoundingBox {
        north: 55.215,
        west: 5.050,
        south: 47.604,
        east: 14.388,
    };

    /// Create a validated bounding box from its four edges
    pub fn new(north: f64, west: f64, south: f64, east: f64) -> crate::Result<Self> {
        if ![north, west, south, east].iter().all(|c| c.is_finite()) {
            return Err(SweepError::validation(format!(
                "Bounding box coordinates must be finite: [{north}, {west}, {south}, {east}]"
            )));
        }
        if !(-90.0..=90.0).contains(&north) || !(-90.0..=90.0).contains(&south) {
            return Err(SweepError::validation(format!(
                "Latitudes must be within -90..=90, got north={north}, south={south}"
            )));
        }
        if !(-180.0..=180.0).contains(&west) || !(-180.0..=180.0).contains(&east) {
            return Err(SweepError::validation(format!(
                "Longitudes must be within -180..=180, got west={west}, east={east}"
            )));
        }
        if north < south {
            return Err(SweepError::validation(format!(
                "North edge {north} lies below south edge {south}"
            )));
        }
        if east < west {
            return Err(SweepError::validation(format!(
                "East edge {east} lies west of west edge {west}"
            )));
        }
        Ok(Self {
            north,
            west,
            south,
            east,
        })
    }

    #[must_use]
    pub fn north(&self) -> f64 {
        self.north
    }

    #[must_use]
    pub fn west(&self) -> f64 {
        self.west
    }

    #[must_use]
    pub fn south(&self) -> f64 {
        self.south
    }

    #[must_use]
    pub fn east(&self) -> f64 {
        self.east
    }

    /// `(lat, lon)` of the north-west corner
    #[must_use]
    pub fn top_left(&self) -> (f64, f64) {
        (self.north, self.west)
    }

    /// `(lat, lon)` of the south-east corner
    #[must_use]
    pub fn bottom_right(&self) -> (f64, f64) {
        (self.south, self.east)
    }

    /// `(lat, lon)` of the midpoint of both spans
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        ((self.north + self.south) / 2.0, (self.west + self.east) / 2.0)
    }

    #[must_use]
    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    #[must_use]
    pub fn lon_span(&self) -> f64 {
        self.east - self.west
    }

    /// Both spans are at or below `min_span_degrees`, so splitting further is pointless.
    #[must_use]
    pub fn is_at_resolution(&self, min_span_degrees: f64) -> bool {
        self.lat_span() <= min_span_degrees && self.lon_span() <= min_span_degrees
    }

    /// Point membership, half-open on the north and east edges.
    ///
    /// The four quadrants of a split therefore claim every point of the parent
    /// exactly once.
    #[must_use]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.south <= lat && lat < self.north && self.west <= lon && lon < self.east
    }

    /// Bisect both spans and return the quadrants as
    /// bottom-left, top-left, top-right, bottom-right.
    ///
    /// The quadrants share the parent's midpoint exactly, so together they tile
    /// the parent with no gap and no overlap.
    #[must_use]
    pub fn split(&self) -> [BoundingBox; 4] {
        let (center_lat, center_lon) = self.center();
        [
            BoundingBox {
                north: center_lat,
                west: self.west,
                south: self.south,
                east: center_lon,
            },
            BoundingBox {
                north: self.north,
                west: self.west,
                south: center_lat,
                east: center_lon,
            },
            BoundingBox {
                north: self.north,
                west: center_lon,
                south: center_lat,
                east: self.east,
            },
            BoundingBox {
                north: center_lat,
                west: center_lon,
                south: self.south,
                east: self.east,
            },
        ]
    }
}

impl TryFrom<[f64; 4]> for BoundingBox {
    type Error = SweepError;

    fn try_from([north, west, south, east]: [f64; 4]) -> Result<Self, Self::Error> {
        Self::new(north, west, south, east)
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(bbox: BoundingBox) -> Self {
        [bbox.north, bbox.west, bbox.south, bbox.east]
    }
}

/// Parses `north,west,south,east`
impl FromStr for BoundingBox {
    type Err = SweepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|part| {
                part.trim().parse::<f64>().map_err(|_| {
                    SweepError::validation(format!("Invalid coordinate '{}' in bounds '{s}'", part.trim()))
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;

        let edges: [f64; 4] = parts.try_into().map_err(|_| {
            SweepError::validation(format!(
                "Bounds must have four values north,west,south,east, got '{s}'"
            ))
        })?;
        Self::try_from(edges)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.6}, {:.6}, {:.6}, {:.6}]",
            self.north, self.west, self.south, self.east
        )
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::GERMANY
    }
}
