//! Fleet assembly and the top-level tick.
//!
//! Assembly is the only place configuration can fail: partitioning, path
//! planning, agent construction and leader selection either all succeed
//! or nothing is built.

use crate::agent::{AgentRole, MissionController};
use crate::config::{FleetConfig, FleetError};
use crate::coordinator::FleetCoordinator;
use crate::geodesy::Geodesy;
use crate::sensor::RangeSensor;
use rand::Rng;
use std::sync::Arc;
use sweep_core::{partition, planner, BoundingBox, Sector};

/// A fully wired coverage fleet: one mission controller per sector plus
/// the coordinator driving launches and reassignment.
pub struct Fleet {
    agents: Vec<MissionController>,
    sectors: Vec<Sector>,
    coordinator: FleetCoordinator,
    elapsed: f64,
}

impl Fleet {
    /// Partition `bbox`, plan one coverage path per sector, and build the
    /// fleet. The random source only matters for the random-walk planner;
    /// a seeded rng makes the whole fleet reproducible.
    pub fn assemble<R: Rng>(
        bbox: &BoundingBox,
        config: &FleetConfig,
        geodesy: Arc<dyn Geodesy>,
        sensor: Arc<dyn RangeSensor>,
        rng: &mut R,
    ) -> Result<Self, FleetError> {
        let sectors = partition(bbox, config.sector_count)?;

        let mut agents = Vec::with_capacity(sectors.len());
        for sector in &sectors {
            let path = planner::generate(sector, config.algorithm, config.spacing, rng)?;
            let mut agent = MissionController::new(
                sector.id,
                AgentRole::Follower,
                config.agent,
                Arc::clone(&geodesy),
                Arc::clone(&sensor),
            );
            agent.initialize(sector.clone(), path);
            agents.push(agent);
        }

        let leader_id = config
            .leader_policy
            .choose(&agents)
            .ok_or(FleetError::NoLeader)?;
        for agent in &mut agents {
            let role = if agent.id() == leader_id {
                AgentRole::Leader
            } else {
                AgentRole::Follower
            };
            agent.set_role(role);
        }

        let roster = agents.iter().map(|a| a.id()).collect();
        let coordinator =
            FleetCoordinator::new(roster, leader_id, config.stagger_interval, config.monitor);

        tracing::info!(
            sectors = sectors.len(),
            leader = leader_id,
            algorithm = %config.algorithm,
            "fleet assembled"
        );

        Ok(Self {
            agents,
            sectors,
            coordinator,
            elapsed: 0.0,
        })
    }

    /// One simulation step: every controller ticks first, then the
    /// coordinator, so reassignment decisions see post-movement state.
    pub fn tick(&mut self, dt: f64) {
        for agent in &mut self.agents {
            agent.tick(dt);
        }
        self.coordinator.tick(dt, &mut self.agents);
        self.elapsed += dt;
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn agents(&self) -> &[MissionController] {
        &self.agents
    }

    pub fn agents_mut(&mut self) -> &mut [MissionController] {
        &mut self.agents
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    pub fn coordinator(&self) -> &FleetCoordinator {
        &self.coordinator
    }

    pub fn leader_id(&self) -> u32 {
        self.coordinator.leader_id()
    }

    pub fn all_complete(&self) -> bool {
        self.agents.iter().all(|a| a.mission_complete())
    }

    /// Mean coverage percent across the fleet.
    pub fn mean_coverage(&self) -> f64 {
        if self.agents.is_empty() {
            return 0.0;
        }
        self.agents.iter().map(|a| a.coverage_percent()).sum::<f64>() / self.agents.len() as f64
    }
}
