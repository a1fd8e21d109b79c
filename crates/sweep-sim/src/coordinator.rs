//! Leader-side fleet coordination.
//!
//! The coordinator owns the launch stagger schedule and the leader's
//! periodic monitor. Each monitor pass scans the followers in roster
//! order: a stuck follower is rescued with half of the busiest donor's
//! remaining queue; a finished follower takes half of the first
//! sufficiently loaded donor's queue and goes back to work. Transfers are
//! the only cross-agent mutation and always run through [`reassign`],
//! which enforces roster ownership.
//!
//! [`reassign`]: FleetCoordinator::reassign

use crate::agent::MissionController;
use crate::config::{FleetError, MonitorConfig};
use sweep_core::Waypoint;

/// One planned activation in the launch stagger sequence.
#[derive(Debug, Clone, Copy)]
struct LaunchEntry {
    at: f64,
    agent_id: u32,
    done: bool,
}

/// Runs the launch schedule and the leader's monitor over a roster of
/// mission controllers. The leader itself flies a mission like everyone
/// else; it is excluded from donor/recipient scans. A stuck or failed
/// leader is not handled (single point of failure).
pub struct FleetCoordinator {
    roster: Vec<u32>,
    leader_id: u32,
    config: MonitorConfig,
    schedule: Vec<LaunchEntry>,
    clock: f64,
    poll_timer: f64,
    leader_active: bool,
}

impl FleetCoordinator {
    /// Build a coordinator for the given roster. The stagger schedule
    /// activates agents in roster order, `stagger_interval` apart,
    /// starting at time 0.
    pub fn new(roster: Vec<u32>, leader_id: u32, stagger_interval: f64, config: MonitorConfig) -> Self {
        let schedule = roster
            .iter()
            .enumerate()
            .map(|(i, &agent_id)| LaunchEntry {
                at: i as f64 * stagger_interval,
                agent_id,
                done: false,
            })
            .collect();

        Self {
            roster,
            leader_id,
            config,
            schedule,
            clock: 0.0,
            poll_timer: 0.0,
            leader_active: false,
        }
    }

    pub fn leader_id(&self) -> u32 {
        self.leader_id
    }

    pub fn roster(&self) -> &[u32] {
        &self.roster
    }

    /// Advance the coordinator by `dt`: fire due launches, then run the
    /// monitor for every elapsed poll interval. Call after all agents
    /// have ticked so the monitor sees post-movement state.
    pub fn tick(&mut self, dt: f64, agents: &mut [MissionController]) {
        self.clock += dt;

        for entry in &mut self.schedule {
            if !entry.done && self.clock >= entry.at {
                entry.done = true;
                if let Some(agent) = agents.iter_mut().find(|a| a.id() == entry.agent_id) {
                    tracing::info!(agent = entry.agent_id, t = self.clock, "launch");
                    agent.start_mission();
                    if entry.agent_id == self.leader_id {
                        self.leader_active = true;
                    }
                }
            }
        }

        // The monitor only runs once the leader itself is airborne.
        if !self.leader_active {
            return;
        }
        self.poll_timer += dt;
        while self.poll_timer >= self.config.poll_interval {
            self.poll_timer -= self.config.poll_interval;
            self.monitor_followers(agents);
        }
    }

    /// One monitor pass over the followers, in roster order.
    fn monitor_followers(&mut self, agents: &mut [MissionController]) {
        let follower_ids: Vec<u32> = self
            .roster
            .iter()
            .copied()
            .filter(|&id| id != self.leader_id)
            .collect();

        for &id in &follower_ids {
            let Some(follower) = agents.iter().find(|a| a.id() == id) else {
                continue;
            };

            if follower.is_stuck() {
                self.rescue_stuck(id, &follower_ids, agents);
            } else if follower.mission_complete() {
                self.assist_idle(id, &follower_ids, agents);
            }
        }
    }

    /// Take half of the busiest other follower's queue for a stuck agent,
    /// provided that donor holds more than the rescue threshold.
    fn rescue_stuck(&mut self, stuck_id: u32, follower_ids: &[u32], agents: &mut [MissionController]) {
        let mut donor: Option<u32> = None;
        let mut most_remaining = 0usize;
        for &id in follower_ids {
            if id == stuck_id {
                continue;
            }
            let Some(candidate) = agents.iter().find(|a| a.id() == id) else {
                continue;
            };
            if candidate.mission_complete() {
                continue;
            }
            let remaining = candidate.remaining_waypoints();
            if remaining > most_remaining {
                most_remaining = remaining;
                donor = Some(id);
            }
        }

        let Some(donor_id) = donor.filter(|_| most_remaining > self.config.stuck_rescue_min_remaining)
        else {
            tracing::warn!(agent = stuck_id, "stuck, but no donor has enough work to share");
            return;
        };

        match self.reassign(agents, donor_id, stuck_id) {
            Ok(moved) => tracing::info!(
                from = donor_id,
                to = stuck_id,
                waypoints = moved,
                "rescued stuck follower"
            ),
            Err(err) => tracing::warn!(agent = stuck_id, %err, "rescue failed"),
        }
    }

    /// Put a finished follower back to work on half of the first donor
    /// queue exceeding the assist threshold. First match wins this pass.
    fn assist_idle(&mut self, idle_id: u32, follower_ids: &[u32], agents: &mut [MissionController]) {
        for &id in follower_ids {
            if id == idle_id {
                continue;
            }
            let Some(candidate) = agents.iter().find(|a| a.id() == id) else {
                continue;
            };
            if candidate.mission_complete()
                || candidate.remaining_waypoints() <= self.config.idle_assist_min_remaining
            {
                continue;
            }

            match self.reassign(agents, id, idle_id) {
                Ok(moved) => {
                    if let Some(idle) = agents.iter_mut().find(|a| a.id() == idle_id) {
                        idle.start_mission();
                    }
                    tracing::info!(
                        from = id,
                        to = idle_id,
                        waypoints = moved,
                        "idle follower assisting"
                    );
                }
                Err(err) => tracing::warn!(agent = idle_id, %err, "assist failed"),
            }
            return;
        }
    }

    /// Transfer the second half of `from`'s remaining queue to `to`.
    /// Both ids must be in the roster and distinct; anything else is
    /// rejected before any mutation. Returns the number of waypoints moved.
    pub fn reassign(
        &mut self,
        agents: &mut [MissionController],
        from: u32,
        to: u32,
    ) -> Result<usize, FleetError> {
        if from == to {
            return Err(FleetError::SelfReassignment(from));
        }
        if !self.roster.contains(&from) {
            return Err(FleetError::UnknownAgent(from));
        }
        if !self.roster.contains(&to) {
            return Err(FleetError::UnknownAgent(to));
        }

        let from_idx = agents
            .iter()
            .position(|a| a.id() == from)
            .ok_or(FleetError::UnknownAgent(from))?;
        let to_idx = agents
            .iter()
            .position(|a| a.id() == to)
            .ok_or(FleetError::UnknownAgent(to))?;
        let (donor, recipient) = pair_mut(agents, from_idx, to_idx);

        let segment: Vec<Waypoint> = donor.split_remaining_waypoints();
        let moved = segment.len();
        recipient.assign_new_waypoints(segment);
        Ok(moved)
    }
}

/// Disjoint mutable access to two agents of one slice.
fn pair_mut(
    agents: &mut [MissionController],
    a: usize,
    b: usize,
) -> (&mut MissionController, &mut MissionController) {
    assert_ne!(a, b, "cannot reassign an agent to itself");
    if a < b {
        let (left, right) = agents.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = agents.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}
