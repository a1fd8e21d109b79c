//! Geodesy collaborator: geographic to local rendering-frame conversion.
//!
//! Mission logic runs entirely in degree space; this pair exists only so a
//! renderer can place agents in a local metric frame.

const METERS_PER_DEG_LAT: f64 = 111_320.0;

/// Pure conversion pair between (lng, lat, alt) and a local frame position.
pub trait Geodesy: Send + Sync {
    /// Geographic coordinates to a local `[x, y, z]` frame position.
    fn geo_to_local(&self, lng: f64, lat: f64, alt: f64) -> [f64; 3];

    /// Local frame position back to (lng, lat, alt).
    fn local_to_geo(&self, local: [f64; 3]) -> (f64, f64, f64);
}

/// Local tangent plane around a fixed origin: x east, y up, z north,
/// meters. Good enough for rendering small coverage areas; not geodesic.
#[derive(Debug, Clone, Copy)]
pub struct FlatProjection {
    pub origin_lng: f64,
    pub origin_lat: f64,
}

impl FlatProjection {
    pub fn new(origin_lng: f64, origin_lat: f64) -> Self {
        Self {
            origin_lng,
            origin_lat,
        }
    }

    fn meters_per_deg_lng(&self) -> f64 {
        METERS_PER_DEG_LAT * self.origin_lat.to_radians().cos()
    }
}

impl Geodesy for FlatProjection {
    fn geo_to_local(&self, lng: f64, lat: f64, alt: f64) -> [f64; 3] {
        [
            (lng - self.origin_lng) * self.meters_per_deg_lng(),
            alt,
            (lat - self.origin_lat) * METERS_PER_DEG_LAT,
        ]
    }

    fn local_to_geo(&self, local: [f64; 3]) -> (f64, f64, f64) {
        let meters_lng = self.meters_per_deg_lng();
        let lng = if meters_lng.abs() > f64::EPSILON {
            self.origin_lng + local[0] / meters_lng
        } else {
            self.origin_lng
        };
        (lng, self.origin_lat + local[2] / METERS_PER_DEG_LAT, local[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_through_local_frame() {
        let geo = FlatProjection::new(-117.0, 33.0);
        let local = geo.geo_to_local(-116.99, 33.01, 150.0);
        let (lng, lat, alt) = geo.local_to_geo(local);
        assert!((lng - (-116.99)).abs() < 1e-9);
        assert!((lat - 33.01).abs() < 1e-9);
        assert!((alt - 150.0).abs() < 1e-9);
    }

    #[test]
    fn origin_maps_to_frame_origin() {
        let geo = FlatProjection::new(-117.0, 33.0);
        let local = geo.geo_to_local(-117.0, 33.0, 0.0);
        assert_eq!(local, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn one_degree_lat_is_about_111_km() {
        let geo = FlatProjection::new(0.0, 0.0);
        let local = geo.geo_to_local(0.0, 1.0, 0.0);
        assert!((local[2] - 111_320.0).abs() < 1.0);
    }
}
