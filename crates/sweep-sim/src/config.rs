//! Simulation configuration and fleet setup errors.
//!
//! Everything is an explicit value passed at construction; there is no
//! global settings object and no environment lookup inside the kernel.

use crate::agent::MissionController;
use serde::{Deserialize, Serialize};
use sweep_core::{Algorithm, CoreError};

/// Per-agent flight tuning. Distances are degrees, times are simulation
/// time units; the speed scale converts speed units into degrees per tick
/// second (raw degree deltas, deliberately not meter-corrected).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Agent speed in abstract speed units.
    pub speed: f64,
    /// Degrees traveled per speed unit per time unit.
    pub speed_scale_deg: f64,
    /// Cruise altitude reached after takeoff.
    pub cruise_altitude: f64,
    /// How far below cruise altitude an agent starts its takeoff.
    pub takeoff_drop: f64,
    /// Climb rate during takeoff, altitude units per time unit.
    pub takeoff_rate: f64,
    /// Altitude tolerance ending the takeoff climb.
    pub altitude_tolerance: f64,
    /// Distance under which a waypoint counts as reached.
    pub arrival_epsilon_deg: f64,
    /// Movement under this distance counts as stationary.
    pub stuck_epsilon_deg: f64,
    /// Stationary duration after which an agent is stuck.
    pub stuck_threshold: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            speed: 10.0,
            speed_scale_deg: 1e-5,
            cruise_altitude: 150.0,
            takeoff_drop: 50.0,
            takeoff_rate: 5.0,
            altitude_tolerance: 0.01,
            arrival_epsilon_deg: 5e-6,
            stuck_epsilon_deg: 1e-6,
            stuck_threshold: 5.0,
        }
    }
}

/// Leader monitor tuning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Time units between monitor passes.
    pub poll_interval: f64,
    /// A stuck follower is rescued only from a donor holding more than
    /// this many remaining waypoints.
    pub stuck_rescue_min_remaining: usize,
    /// An idle follower assists only a donor holding more than this many
    /// remaining waypoints.
    pub idle_assist_min_remaining: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: 1.0,
            stuck_rescue_min_remaining: 10,
            idle_assist_min_remaining: 20,
        }
    }
}

/// How the leader is chosen at fleet assembly. Decided once; the roster
/// never re-elects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeaderPolicy {
    /// Lowest agent id leads.
    LowestId,
    /// The agent with the longest planned path leads.
    LargestQueue,
    /// A specific agent id leads; assembly fails if it is not in the roster.
    Explicit(u32),
}

impl LeaderPolicy {
    pub fn choose(&self, agents: &[MissionController]) -> Option<u32> {
        match self {
            LeaderPolicy::LowestId => agents.iter().map(|a| a.id()).min(),
            LeaderPolicy::LargestQueue => agents
                .iter()
                .max_by_key(|a| a.remaining_waypoints())
                .map(|a| a.id()),
            LeaderPolicy::Explicit(id) => agents.iter().find(|a| a.id() == *id).map(|a| a.id()),
        }
    }
}

/// Fleet-level configuration handed to [`crate::Fleet::assemble`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FleetConfig {
    /// Number of sectors, one agent each. Must be positive.
    pub sector_count: usize,
    /// Coverage track spacing in degrees. Must be positive.
    pub spacing: f64,
    pub algorithm: Algorithm,
    /// Time units between successive agent activations at launch.
    pub stagger_interval: f64,
    pub leader_policy: LeaderPolicy,
    pub agent: AgentConfig,
    pub monitor: MonitorConfig,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            sector_count: 4,
            spacing: 0.0001,
            algorithm: Algorithm::Lawnmower,
            stagger_interval: 3.0,
            leader_policy: LeaderPolicy::LowestId,
            agent: AgentConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }
}

/// Fatal setup and coordination errors. Setup errors abort assembly with
/// nothing half-built; at runtime only roster violations surface here.
#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("leader policy selected no agent")]
    NoLeader,
    #[error("agent {0} is not in the coordinator's roster")]
    UnknownAgent(u32),
    #[error("agent {0} cannot donate waypoints to itself")]
    SelfReassignment(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fleet_config_round_trips_through_json() {
        let config = FleetConfig {
            leader_policy: LeaderPolicy::Explicit(2),
            algorithm: Algorithm::Spiral,
            ..FleetConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"spiral\""));
        let back: FleetConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.leader_policy, LeaderPolicy::Explicit(2));
        assert_eq!(back.sector_count, config.sector_count);
        assert_eq!(back.agent.speed, config.agent.speed);
    }
}
