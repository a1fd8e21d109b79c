//! Range sensor collaborator.
//!
//! Invoked once per waypoint arrival. Detections are forwarded outward
//! (and logged); mission logic never branches on them.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// A single detection event reported by a sensor scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub lng: f64,
    pub lat: f64,
    pub label: String,
}

/// Sensor collaborator: scan the surroundings of a position.
pub trait RangeSensor: Send + Sync {
    fn scan(&self, lng: f64, lat: f64, alt: f64) -> Vec<Detection>;
}

/// Sensor that never detects anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSensor;

impl RangeSensor for NullSensor {
    fn scan(&self, _lng: f64, _lat: f64, _alt: f64) -> Vec<Detection> {
        Vec::new()
    }
}

/// A fixed obstacle detectable within `range_deg` of a scan position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub lng: f64,
    pub lat: f64,
    pub label: String,
}

/// Simulated sensor over a static obstacle list.
///
/// Stands in for ray casting against a 3D scene: an obstacle within range
/// of the scan position is detected, and each obstacle is reported at most
/// once over the sensor's lifetime, like a real mapper accumulating finds.
pub struct ObstacleField {
    obstacles: Vec<Obstacle>,
    range_deg: f64,
    reported: Mutex<Vec<bool>>,
}

impl ObstacleField {
    pub fn new(obstacles: Vec<Obstacle>, range_deg: f64) -> Self {
        let reported = Mutex::new(vec![false; obstacles.len()]);
        Self {
            obstacles,
            range_deg,
            reported,
        }
    }
}

impl RangeSensor for ObstacleField {
    fn scan(&self, lng: f64, lat: f64, _alt: f64) -> Vec<Detection> {
        let mut reported = match self.reported.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut detections = Vec::new();
        for (i, obstacle) in self.obstacles.iter().enumerate() {
            if reported[i] {
                continue;
            }
            let dlng = obstacle.lng - lng;
            let dlat = obstacle.lat - lat;
            if (dlng * dlng + dlat * dlat).sqrt() <= self.range_deg {
                reported[i] = true;
                detections.push(Detection {
                    lng: obstacle.lng,
                    lat: obstacle.lat,
                    label: obstacle.label.clone(),
                });
            }
        }
        detections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field() -> ObstacleField {
        ObstacleField::new(
            vec![
                Obstacle {
                    lng: 0.0005,
                    lat: 0.0005,
                    label: "tower".to_string(),
                },
                Obstacle {
                    lng: 0.5,
                    lat: 0.5,
                    label: "far".to_string(),
                },
            ],
            0.001,
        )
    }

    #[test]
    fn detects_obstacle_in_range_once() {
        let sensor = field();
        let first = sensor.scan(0.0, 0.0, 150.0);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].label, "tower");

        // Same position again: already reported.
        assert!(sensor.scan(0.0, 0.0, 150.0).is_empty());
    }

    #[test]
    fn out_of_range_obstacle_is_not_detected() {
        let sensor = field();
        let hits = sensor.scan(-0.1, -0.1, 150.0);
        assert!(hits.is_empty());
    }

    #[test]
    fn null_sensor_is_silent() {
        assert!(NullSensor.scan(0.0, 0.0, 0.0).is_empty());
    }
}
