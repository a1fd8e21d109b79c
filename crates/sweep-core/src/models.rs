//! Core data models for area-coverage planning.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hex colors cycled by sector id, used by external visualizers.
pub const SECTOR_PALETTE: [&str; 8] = [
    "#ffff00", // yellow
    "#00ff00", // green
    "#ff00ff", // magenta
    "#00ffff", // cyan
    "#ff0000", // red
    "#0000ff", // blue
    "#ffffff", // white
    "#808080", // gray
];

/// Geographic bounding rectangle in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, max_lat: f64, min_lng: f64, max_lng: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        }
    }

    /// Smallest box enclosing a set of (lng, lat) corners.
    pub fn enclosing(corners: &[(f64, f64)]) -> Option<Self> {
        let first = corners.first()?;
        let mut bbox = Self::new(first.1, first.1, first.0, first.0);
        for &(lng, lat) in &corners[1..] {
            bbox.min_lat = bbox.min_lat.min(lat);
            bbox.max_lat = bbox.max_lat.max(lat);
            bbox.min_lng = bbox.min_lng.min(lng);
            bbox.max_lng = bbox.max_lng.max(lng);
        }
        Some(bbox)
    }

    pub fn lat_range(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lng_range(&self) -> f64 {
        self.max_lng - self.min_lng
    }
}

/// One rectangular sub-region of the coverage area, assigned to one agent.
///
/// A partition of N sectors tiles the bounding box exactly: sector
/// interiors are pairwise disjoint and adjacent sectors share only
/// boundary edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sector {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
    pub id: u32,
    pub color: String,
}

impl Sector {
    pub fn width(&self) -> f64 {
        self.max_lng - self.min_lng
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Center point as (lng, lat).
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lng + self.max_lng) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    pub fn contains(&self, lng: f64, lat: f64) -> bool {
        lng >= self.min_lng && lng <= self.max_lng && lat >= self.min_lat && lat <= self.max_lat
    }
}

/// A target point an agent travels to, in (lng, lat) degree order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub lng: f64,
    pub lat: f64,
}

impl Waypoint {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Straight-line distance in degree space (no meter correction).
    pub fn distance_deg(&self, lng: f64, lat: f64) -> f64 {
        let dlng = self.lng - lng;
        let dlat = self.lat - lat;
        (dlng * dlng + dlat * dlat).sqrt()
    }
}

/// Coverage dedup key: a waypoint quantized to 5 decimal places.
///
/// Membership-only, no payload. Two waypoints that round to the same
/// 5-decimal coordinates count as one covered cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellKey {
    lng_q: i64,
    lat_q: i64,
}

impl CellKey {
    const SCALE: f64 = 1e5;

    pub fn new(lng: f64, lat: f64) -> Self {
        Self {
            lng_q: (lng * Self::SCALE).round() as i64,
            lat_q: (lat * Self::SCALE).round() as i64,
        }
    }
}

impl From<Waypoint> for CellKey {
    fn from(wp: Waypoint) -> Self {
        Self::new(wp.lng, wp.lat)
    }
}

/// Coverage path generation algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    /// Back-and-forth parallel sweep (boustrophedon).
    Lawnmower,
    /// Rectangular rings from the boundary inward.
    Spiral,
    /// Concentric square rings growing from the centroid.
    ExpandingSquare,
    /// Budgeted random grid walk from the centroid.
    RandomWalk,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Algorithm::Lawnmower => "lawnmower",
            Algorithm::Spiral => "spiral",
            Algorithm::ExpandingSquare => "expanding-square",
            Algorithm::RandomWalk => "random-walk",
        };
        f.write_str(name)
    }
}

impl FromStr for Algorithm {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lawnmower" => Ok(Algorithm::Lawnmower),
            "spiral" => Ok(Algorithm::Spiral),
            "expanding-square" => Ok(Algorithm::ExpandingSquare),
            "random-walk" => Ok(Algorithm::RandomWalk),
            other => Err(CoreError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Errors from the planning kernel. All are invalid-input rejections;
/// degenerate geometry is not an error and flows through as empty output.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("sector count must be a positive integer")]
    InvalidSectorCount,
    #[error("path spacing must be positive degrees, got {0}")]
    InvalidSpacing(f64),
    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),
}
