//! Coverage path generation.
//!
//! Four algorithms produce an ordered waypoint sequence inside one sector.
//! All of them operate on the sector inset by `spacing / 2` on every side
//! to keep waypoints off the sector boundary.

use crate::models::{Algorithm, CoreError, Sector, Waypoint};
use rand::Rng;
use std::collections::HashSet;

/// Step budget for the random walk before it gives up on full coverage.
const RANDOM_WALK_MAX_STEPS: usize = 500;

/// Quantization scale for the random walk's visited-cell keys (6 decimals,
/// finer than the 5-decimal coverage cells so adjacent steps stay distinct).
const VISITED_SCALE: f64 = 1e6;

/// Generate a coverage path for `sector` with the given algorithm.
///
/// `spacing` is the track separation in degrees and must be positive.
/// Only `RandomWalk` consumes the random source; the other algorithms are
/// deterministic over their inputs. An empty result for a sector smaller
/// than the spacing is normal, not an error.
pub fn generate<R: Rng>(
    sector: &Sector,
    algorithm: Algorithm,
    spacing: f64,
    rng: &mut R,
) -> Result<Vec<Waypoint>, CoreError> {
    if !(spacing > 0.0) || !spacing.is_finite() {
        return Err(CoreError::InvalidSpacing(spacing));
    }

    let path = match algorithm {
        Algorithm::Lawnmower => lawnmower(sector, spacing),
        Algorithm::Spiral => spiral(sector, spacing),
        Algorithm::ExpandingSquare => expanding_square(sector, spacing),
        Algorithm::RandomWalk => random_walk(sector, spacing, rng),
    };
    Ok(path)
}

/// Boustrophedon sweep: vertical columns every `spacing`, alternating
/// direction so consecutive columns are flown bottom-up then top-down.
fn lawnmower(sector: &Sector, spacing: f64) -> Vec<Waypoint> {
    let mut waypoints = Vec::new();
    let buffer = spacing * 0.5;
    let lat_lo = sector.min_lat + buffer;
    let lat_hi = sector.max_lat - buffer;

    let mut going_up = true;
    // Accumulated rather than recomputed per column; the column count near
    // the boundary depends on this exact float behavior.
    let mut lng = sector.min_lng + buffer;

    while lng <= sector.max_lng - buffer {
        if going_up {
            waypoints.push(Waypoint::new(lng, lat_lo));
            waypoints.push(Waypoint::new(lng, lat_hi));
        } else {
            waypoints.push(Waypoint::new(lng, lat_hi));
            waypoints.push(Waypoint::new(lng, lat_lo));
        }
        going_up = !going_up;
        lng += spacing;
    }

    waypoints
}

/// Inward rectangular spiral: each ring is the 4 corners of the current
/// bounds plus one point `spacing` up the first edge that seeds the next
/// ring, then all four bounds shrink by `spacing`.
fn spiral(sector: &Sector, spacing: f64) -> Vec<Waypoint> {
    let mut waypoints = Vec::new();
    let buf = spacing * 0.5;

    let mut min_lat = sector.min_lat + buf;
    let mut max_lat = sector.max_lat - buf;
    let mut min_lng = sector.min_lng + buf;
    let mut max_lng = sector.max_lng - buf;

    while min_lat < max_lat && min_lng < max_lng {
        waypoints.push(Waypoint::new(min_lng, min_lat));
        waypoints.push(Waypoint::new(max_lng, min_lat));
        waypoints.push(Waypoint::new(max_lng, max_lat));
        waypoints.push(Waypoint::new(min_lng, max_lat));
        waypoints.push(Waypoint::new(min_lng, min_lat + spacing));

        min_lat += spacing;
        max_lat -= spacing;
        min_lng += spacing;
        max_lng -= spacing;
    }

    waypoints
}

/// Concentric closed square loops growing outward from the centroid until
/// the ring would leave the inset sector.
fn expanding_square(sector: &Sector, spacing: f64) -> Vec<Waypoint> {
    let mut waypoints = Vec::new();
    let (center_lng, center_lat) = sector.center();

    let max_radius = (sector.width() / 2.0).min(sector.height() / 2.0) - spacing * 0.5;
    let mut radius = spacing;

    while radius <= max_radius {
        waypoints.push(Waypoint::new(center_lng - radius, center_lat - radius));
        waypoints.push(Waypoint::new(center_lng + radius, center_lat - radius));
        waypoints.push(Waypoint::new(center_lng + radius, center_lat + radius));
        waypoints.push(Waypoint::new(center_lng - radius, center_lat + radius));
        // Close the loop back to the first corner.
        waypoints.push(Waypoint::new(center_lng - radius, center_lat - radius));
        radius += spacing;
    }

    waypoints
}

fn visited_key(lng: f64, lat: f64) -> (i64, i64) {
    (
        (lng * VISITED_SCALE).round() as i64,
        (lat * VISITED_SCALE).round() as i64,
    )
}

/// Random grid walk from the centroid. Prefers an unvisited in-bounds
/// neighbor chosen uniformly at random; falls back to the first in-bounds
/// neighbor (possibly visited) rather than deadlocking; stops after the
/// step budget or when boxed in on all four sides. Already-emitted cells
/// are not re-emitted on revisit.
fn random_walk<R: Rng>(sector: &Sector, spacing: f64, rng: &mut R) -> Vec<Waypoint> {
    let mut waypoints = Vec::new();
    let mut visited: HashSet<(i64, i64)> = HashSet::new();

    let buf = spacing * 0.5;
    let min_lat = sector.min_lat + buf;
    let max_lat = sector.max_lat - buf;
    let min_lng = sector.min_lng + buf;
    let max_lng = sector.max_lng - buf;
    let in_bounds =
        |lng: f64, lat: f64| lng >= min_lng && lng <= max_lng && lat >= min_lat && lat <= max_lat;

    let (mut lng, mut lat) = sector.center();

    // (dlng, dlat) neighbor offsets; the fallback scan uses this fixed order.
    let directions = [
        (0.0, spacing),
        (0.0, -spacing),
        (spacing, 0.0),
        (-spacing, 0.0),
    ];

    for _ in 0..RANDOM_WALK_MAX_STEPS {
        if visited.insert(visited_key(lng, lat)) {
            waypoints.push(Waypoint::new(lng, lat));
        }

        let unvisited: Vec<usize> = directions
            .iter()
            .enumerate()
            .filter(|(_, (dlng, dlat))| {
                let (nlng, nlat) = (lng + dlng, lat + dlat);
                in_bounds(nlng, nlat) && !visited.contains(&visited_key(nlng, nlat))
            })
            .map(|(i, _)| i)
            .collect();

        if !unvisited.is_empty() {
            let choice = unvisited[rng.random_range(0..unvisited.len())];
            lng += directions[choice].0;
            lat += directions[choice].1;
        } else {
            // Every neighbor visited: take the first in-bounds one anyway to
            // avoid a permanent deadlock; if boxed in entirely, stop.
            let Some((dlng, dlat)) = directions
                .iter()
                .find(|(dlng, dlat)| in_bounds(lng + dlng, lat + dlat))
            else {
                break;
            };
            lng += dlng;
            lat += dlat;
        }
    }

    waypoints
}
