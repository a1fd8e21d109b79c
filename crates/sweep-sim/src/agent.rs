//! Per-agent mission execution.
//!
//! A [`MissionController`] runs one agent's mission as a resumable state
//! machine: each `tick(dt)` advances takeoff or waypoint traversal one
//! step and returns. State lives between calls, so an external driver can
//! interleave any number of agents within one simulation step.

use crate::config::AgentConfig;
use crate::geodesy::Geodesy;
use crate::sensor::{Detection, RangeSensor};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use sweep_core::{CellKey, Sector, Waypoint};

/// Coordination role within the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    /// Monitors followers and may reassign their remaining work.
    Leader,
    /// Flies its own path; may be re-tasked by the leader.
    Follower,
}

/// Mission state machine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionPhase {
    /// Initialized but not launched.
    Idle,
    /// Climbing to cruise altitude.
    TakingOff,
    /// Moving toward the current waypoint.
    EnRoute,
    /// At a waypoint, running the sensor; transient within the arrival tick.
    Scanning,
    /// Queue exhausted. Terminal until a new queue is assigned.
    Complete,
}

/// Executes a planned waypoint path for one agent.
pub struct MissionController {
    id: u32,
    role: AgentRole,
    config: AgentConfig,
    geodesy: Arc<dyn Geodesy>,
    sensor: Arc<dyn RangeSensor>,

    sector: Option<Sector>,
    queue: Vec<Waypoint>,
    current_index: usize,
    covered: HashSet<CellKey>,
    total_cells: usize,
    coverage_percent: f64,
    mission_complete: bool,

    phase: MissionPhase,
    started: bool,
    lng: f64,
    lat: f64,
    alt: f64,
    target_alt: f64,

    // Stuck detection state: raw degree deltas, same scale quirk as the
    // rest of the kernel.
    last_lng: f64,
    last_lat: f64,
    stuck_timer: f64,

    detections: Vec<Detection>,
}

impl MissionController {
    pub fn new(
        id: u32,
        role: AgentRole,
        config: AgentConfig,
        geodesy: Arc<dyn Geodesy>,
        sensor: Arc<dyn RangeSensor>,
    ) -> Self {
        Self {
            id,
            role,
            config,
            geodesy,
            sensor,
            sector: None,
            queue: Vec::new(),
            current_index: 0,
            covered: HashSet::new(),
            total_cells: 0,
            coverage_percent: 0.0,
            mission_complete: false,
            phase: MissionPhase::Idle,
            started: false,
            lng: 0.0,
            lat: 0.0,
            alt: 0.0,
            target_alt: config.cruise_altitude,
            last_lng: 0.0,
            last_lat: 0.0,
            stuck_timer: 0.0,
            detections: Vec::new(),
        }
    }

    /// Store the planned path and spawn the agent at the sector's
    /// center-longitude / min-latitude edge. Idempotent: a second call
    /// while already initialized is a no-op.
    pub fn initialize(&mut self, sector: Sector, planned_path: Vec<Waypoint>) {
        if self.sector.is_some() {
            tracing::warn!(agent = self.id, "already initialized, ignoring");
            return;
        }

        let (center_lng, _) = sector.center();
        self.lng = center_lng;
        self.lat = sector.min_lat;
        self.alt = self.config.cruise_altitude;
        self.last_lng = self.lng;
        self.last_lat = self.lat;

        self.total_cells = planned_path.len();
        self.covered.clear();
        self.coverage_percent = if self.total_cells == 0 { 100.0 } else { 0.0 };
        self.current_index = 0;
        self.mission_complete = false;

        tracing::info!(
            agent = self.id,
            sector = sector.id,
            waypoints = planned_path.len(),
            "agent initialized"
        );
        self.queue = planned_path;
        self.sector = Some(sector);
    }

    /// Begin the mission: `Idle -> TakingOff`. Idempotent; a no-op before
    /// `initialize` or after a previous start. An empty planned path
    /// completes immediately (coverage is vacuously 100%).
    pub fn start_mission(&mut self) {
        if self.sector.is_none() {
            tracing::warn!(agent = self.id, "start before initialize, ignoring");
            return;
        }
        if self.started {
            return;
        }
        self.started = true;

        if self.queue.is_empty() {
            self.finish();
            return;
        }

        self.target_alt = self.config.cruise_altitude;
        self.alt = self.target_alt - self.config.takeoff_drop;
        self.phase = MissionPhase::TakingOff;
        tracing::info!(agent = self.id, "taking off");
    }

    /// Advance the simulation by `dt` time units.
    pub fn tick(&mut self, dt: f64) {
        let was_en_route = matches!(self.phase, MissionPhase::EnRoute | MissionPhase::Scanning);
        match self.phase {
            MissionPhase::Idle | MissionPhase::Complete => {}
            MissionPhase::TakingOff => self.tick_takeoff(dt),
            MissionPhase::EnRoute | MissionPhase::Scanning => self.tick_en_route(dt),
        }
        self.track_stuck(dt, was_en_route);
    }

    fn tick_takeoff(&mut self, dt: f64) {
        self.alt += self.config.takeoff_rate * dt;
        if self.alt >= self.target_alt - self.config.altitude_tolerance {
            self.alt = self.target_alt;
            self.phase = MissionPhase::EnRoute;
        }
    }

    fn tick_en_route(&mut self, dt: f64) {
        let Some(&target) = self.queue.get(self.current_index) else {
            self.finish();
            return;
        };

        let dist = target.distance_deg(self.lng, self.lat);
        if dist < self.config.arrival_epsilon_deg {
            self.arrive(target);
            return;
        }

        let step = self.config.speed * dt * self.config.speed_scale_deg;
        let ratio = (step / dist).min(1.0);
        self.lng += (target.lng - self.lng) * ratio;
        self.lat += (target.lat - self.lat) * ratio;
    }

    /// Waypoint arrival: snap, record coverage, scan, move on.
    fn arrive(&mut self, target: Waypoint) {
        self.lng = target.lng;
        self.lat = target.lat;
        self.phase = MissionPhase::Scanning;

        self.covered.insert(CellKey::from(target));
        self.coverage_percent = if self.total_cells == 0 {
            100.0
        } else {
            self.covered.len() as f64 / self.total_cells as f64 * 100.0
        };

        let found = self.sensor.scan(self.lng, self.lat, self.alt);
        for detection in &found {
            tracing::info!(
                agent = self.id,
                lng = detection.lng,
                lat = detection.lat,
                label = %detection.label,
                "sensor detection"
            );
        }
        self.detections.extend(found);

        self.current_index += 1;
        if self.current_index >= self.queue.len() {
            self.finish();
        } else {
            self.phase = MissionPhase::EnRoute;
        }
    }

    fn finish(&mut self) {
        self.mission_complete = true;
        self.phase = MissionPhase::Complete;
        tracing::info!(
            agent = self.id,
            coverage = format!("{:.1}%", self.coverage_percent),
            "mission complete"
        );
    }

    /// Accumulate stationary time for ticks spent en route; any movement
    /// beyond the epsilon resets the timer and the reference position.
    fn track_stuck(&mut self, dt: f64, was_en_route: bool) {
        let dlng = self.lng - self.last_lng;
        let dlat = self.lat - self.last_lat;
        let moved = (dlng * dlng + dlat * dlat).sqrt();

        if moved > self.config.stuck_epsilon_deg {
            self.stuck_timer = 0.0;
            self.last_lng = self.lng;
            self.last_lat = self.lat;
        } else if was_en_route {
            self.stuck_timer += dt;
        }
    }

    /// True once the agent has sat still longer than the stuck threshold
    /// with its mission incomplete.
    pub fn is_stuck(&self) -> bool {
        self.stuck_timer > self.config.stuck_threshold && !self.mission_complete
    }

    pub fn remaining_waypoints(&self) -> usize {
        self.queue.len() - self.current_index
    }

    /// Remove and return the second half of the remaining queue, keeping
    /// the first half. Does not touch the current index or coverage.
    pub fn split_remaining_waypoints(&mut self) -> Vec<Waypoint> {
        let remaining = self.remaining_waypoints();
        let split_point = self.current_index + remaining / 2;
        self.queue.split_off(split_point)
    }

    /// Atomically replace the queue: index back to 0, coverage reset to
    /// track the new path, completion flag cleared. A completed agent goes
    /// straight back en route (it is already airborne); a rescued agent
    /// also gets a fresh stuck window. The sole mutation entry point
    /// usable from outside the agent's own tick.
    pub fn assign_new_waypoints(&mut self, new_path: Vec<Waypoint>) {
        self.total_cells = new_path.len();
        self.queue = new_path;
        self.current_index = 0;
        self.covered.clear();
        self.mission_complete = false;
        self.stuck_timer = 0.0;
        self.last_lng = self.lng;
        self.last_lat = self.lat;

        if self.total_cells == 0 {
            self.coverage_percent = 100.0;
            if self.started {
                self.finish();
            }
            return;
        }
        self.coverage_percent = 0.0;
        if self.started && self.phase == MissionPhase::Complete {
            self.phase = MissionPhase::EnRoute;
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub(crate) fn set_role(&mut self, role: AgentRole) {
        self.role = role;
    }

    pub fn phase(&self) -> MissionPhase {
        self.phase
    }

    pub fn mission_complete(&self) -> bool {
        self.mission_complete
    }

    pub fn mission_started(&self) -> bool {
        self.started
    }

    /// Current (lng, lat) in degrees.
    pub fn position(&self) -> (f64, f64) {
        (self.lng, self.lat)
    }

    pub fn altitude(&self) -> f64 {
        self.alt
    }

    /// Position in the local rendering frame, via the geodesy collaborator.
    pub fn render_position(&self) -> [f64; 3] {
        self.geodesy.geo_to_local(self.lng, self.lat, self.alt)
    }

    pub fn coverage_percent(&self) -> f64 {
        self.coverage_percent
    }

    pub fn sector(&self) -> Option<&Sector> {
        self.sector.as_ref()
    }

    /// Every detection reported so far, in arrival order.
    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    /// The not-yet-visited tail of the queue, for visualization.
    pub fn remaining_path(&self) -> &[Waypoint] {
        &self.queue[self.current_index..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geodesy::FlatProjection;
    use crate::sensor::NullSensor;

    fn test_sector() -> Sector {
        Sector {
            min_lat: 0.0,
            max_lat: 0.001,
            min_lng: 0.0,
            max_lng: 0.001,
            id: 0,
            color: "#00ff00".to_string(),
        }
    }

    fn controller(path: Vec<Waypoint>) -> MissionController {
        let mut agent = MissionController::new(
            1,
            AgentRole::Follower,
            AgentConfig::default(),
            Arc::new(FlatProjection::new(0.0, 0.0)),
            Arc::new(NullSensor),
        );
        agent.initialize(test_sector(), path);
        agent
    }

    fn straight_path(n: usize) -> Vec<Waypoint> {
        (0..n)
            .map(|i| Waypoint::new(0.0005, i as f64 * 0.0001))
            .collect()
    }

    /// Tick until the takeoff climb hands over to waypoint traversal.
    fn tick_through_takeoff(agent: &mut MissionController) {
        for _ in 0..200 {
            if agent.phase() != MissionPhase::TakingOff {
                break;
            }
            agent.tick(0.1);
        }
        assert_ne!(agent.phase(), MissionPhase::TakingOff);
    }

    #[test]
    fn initialize_is_idempotent() {
        let mut agent = controller(straight_path(4));
        assert_eq!(agent.remaining_waypoints(), 4);
        agent.initialize(test_sector(), straight_path(9));
        assert_eq!(agent.remaining_waypoints(), 4);
    }

    #[test]
    fn start_is_idempotent_and_takes_off() {
        let mut agent = controller(straight_path(4));
        assert_eq!(agent.phase(), MissionPhase::Idle);
        agent.start_mission();
        assert_eq!(agent.phase(), MissionPhase::TakingOff);
        let alt_before = agent.altitude();
        agent.start_mission();
        assert_eq!(agent.altitude(), alt_before);
    }

    #[test]
    fn takeoff_climbs_to_cruise_then_goes_en_route() {
        let mut agent = controller(straight_path(4));
        agent.start_mission();
        let cruise = AgentConfig::default().cruise_altitude;
        assert!(agent.altitude() < cruise);
        tick_through_takeoff(&mut agent);
        assert_eq!(agent.altitude(), cruise);
        assert_eq!(agent.phase(), MissionPhase::EnRoute);
    }

    #[test]
    fn traversal_visits_waypoints_in_order_and_completes() {
        let mut agent = controller(straight_path(3));
        agent.start_mission();
        tick_through_takeoff(&mut agent);

        let mut last_remaining = agent.remaining_waypoints();
        let mut last_coverage = agent.coverage_percent();
        for _ in 0..10_000 {
            if agent.mission_complete() {
                break;
            }
            agent.tick(0.1);

            // Remaining only ever steps down by one; coverage never drops.
            let remaining = agent.remaining_waypoints();
            assert!(remaining == last_remaining || remaining + 1 == last_remaining);
            assert!(agent.coverage_percent() >= last_coverage);
            last_remaining = remaining;
            last_coverage = agent.coverage_percent();
        }

        assert!(agent.mission_complete());
        assert_eq!(agent.phase(), MissionPhase::Complete);
        assert_eq!(agent.remaining_waypoints(), 0);
        assert!((agent.coverage_percent() - 100.0).abs() < 1e-9);

        // Position snapped exactly onto the final waypoint.
        let last = straight_path(3)[2];
        assert_eq!(agent.position(), (last.lng, last.lat));
    }

    #[test]
    fn empty_path_completes_immediately_at_full_coverage() {
        let mut agent = controller(Vec::new());
        agent.start_mission();
        assert!(agent.mission_complete());
        assert_eq!(agent.phase(), MissionPhase::Complete);
        assert_eq!(agent.coverage_percent(), 100.0);
    }

    #[test]
    fn split_keeps_first_half_and_returns_second() {
        let mut agent = controller(straight_path(10));
        let transferred = agent.split_remaining_waypoints();
        assert_eq!(transferred.len(), 5);
        assert_eq!(agent.remaining_waypoints(), 5);
        // Conservation: nothing lost, nothing duplicated.
        assert_eq!(agent.remaining_waypoints() + transferred.len(), 10);
        // The transferred segment is the tail, in order.
        assert_eq!(transferred, straight_path(10)[5..].to_vec());
    }

    #[test]
    fn assign_resets_queue_index_and_coverage() {
        let mut agent = controller(straight_path(4));
        agent.start_mission();
        tick_through_takeoff(&mut agent);
        for _ in 0..10_000 {
            if agent.mission_complete() {
                break;
            }
            agent.tick(0.1);
        }
        assert!(agent.mission_complete());

        agent.assign_new_waypoints(straight_path(6));
        assert!(!agent.mission_complete());
        assert_eq!(agent.phase(), MissionPhase::EnRoute);
        assert_eq!(agent.remaining_waypoints(), 6);
        assert_eq!(agent.coverage_percent(), 0.0);
    }

    #[test]
    fn assign_empty_path_completes_started_agent() {
        let mut agent = controller(straight_path(4));
        agent.start_mission();
        agent.assign_new_waypoints(Vec::new());
        assert!(agent.mission_complete());
        assert_eq!(agent.coverage_percent(), 100.0);
    }

    #[test]
    fn stuck_only_after_threshold_strictly_exceeded() {
        // A target far outside the move-per-tick range with zero speed
        // leaves the agent stationary en route.
        let mut agent = MissionController::new(
            2,
            AgentRole::Follower,
            AgentConfig {
                speed: 0.0,
                ..AgentConfig::default()
            },
            Arc::new(FlatProjection::new(0.0, 0.0)),
            Arc::new(NullSensor),
        );
        agent.initialize(test_sector(), vec![Waypoint::new(0.001, 0.001)]);
        agent.start_mission();
        tick_through_takeoff(&mut agent);

        // Exactly at the 5.0 threshold: not stuck yet (strict comparison).
        for _ in 0..50 {
            agent.tick(0.1);
        }
        assert!(!agent.is_stuck());

        agent.tick(0.1);
        assert!(agent.is_stuck());
    }

    #[test]
    fn movement_resets_the_stuck_timer() {
        let mut agent = controller(straight_path(40));
        agent.start_mission();
        tick_through_takeoff(&mut agent);

        // Long idle first: force the timer past the threshold.
        for _ in 0..60 {
            agent.track_stuck(0.1, true);
        }
        assert!(agent.is_stuck());

        // First tick arrives at the co-located first waypoint (no motion);
        // the second actually moves and clears the timer.
        agent.tick(1.0);
        agent.tick(1.0);
        assert!(!agent.is_stuck());
        assert_eq!(agent.stuck_timer, 0.0);
    }
}
