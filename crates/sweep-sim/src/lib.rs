//! Tick-driven coverage mission simulation.
//!
//! One [`MissionController`] per agent executes a planned waypoint path as
//! a resumable state machine; the [`FleetCoordinator`] staggers launches
//! and lets the leader re-task followers that stall or finish early. An
//! external driver calls [`Fleet::tick`] once per simulation step; nothing
//! here blocks or spawns threads.

pub mod agent;
pub mod config;
pub mod coordinator;
pub mod fleet;
pub mod geodesy;
pub mod sensor;

pub use agent::{AgentRole, MissionController, MissionPhase};
pub use config::{AgentConfig, FleetConfig, FleetError, LeaderPolicy, MonitorConfig};
pub use coordinator::FleetCoordinator;
pub use fleet::Fleet;
pub use geodesy::{FlatProjection, Geodesy};
pub use sensor::{Detection, NullSensor, Obstacle, ObstacleField, RangeSensor};
