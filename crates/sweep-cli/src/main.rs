//! Coverage mission scenario driver.
//!
//! Assembles a fleet over a bounding box, drives the tick loop (fast or
//! paced to wall time), and optionally dumps the scenario as JSON for an
//! external visualizer.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use sweep_core::{Algorithm, BoundingBox, Sector, Waypoint};
use sweep_sim::{FlatProjection, Fleet, FleetConfig, NullSensor, Obstacle, ObstacleField, RangeSensor};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "sweep", about = "Multi-agent area coverage simulator")]
struct Args {
    /// Bounding box as min_lat,max_lat,min_lng,max_lng
    #[arg(long, default_value = "33.6400,33.6500,-117.8400,-117.8300")]
    bbox: String,

    /// Number of sectors / agents
    #[arg(long, default_value_t = 4)]
    drones: usize,

    /// Coverage track spacing in degrees
    #[arg(long, default_value_t = 0.0001)]
    spacing: f64,

    /// Coverage algorithm: lawnmower, spiral, expanding-square, random-walk
    #[arg(long, default_value = "lawnmower")]
    algorithm: Algorithm,

    /// Seed for the random-walk planner
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Simulation step size in time units
    #[arg(long, default_value_t = 0.1)]
    dt: f64,

    /// Give up after this many ticks
    #[arg(long, default_value_t = 200_000)]
    max_ticks: u64,

    /// Pace ticks to wall-clock time instead of running flat out
    #[arg(long)]
    real_time: bool,

    /// Scatter this many synthetic obstacles for the range sensor
    #[arg(long, default_value_t = 0)]
    obstacles: usize,

    /// Write a JSON snapshot of sectors, paths and final state here
    #[arg(long)]
    dump_json: Option<PathBuf>,
}

/// Scenario snapshot for external visualization.
#[derive(Serialize)]
struct ScenarioDump {
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    elapsed_time_units: f64,
    algorithm: String,
    sectors: Vec<Sector>,
    agents: Vec<AgentDump>,
}

#[derive(Serialize)]
struct AgentDump {
    id: u32,
    role: String,
    position: [f64; 2],
    render_position: [f64; 3],
    coverage_percent: f64,
    mission_complete: bool,
    remaining_path: Vec<Waypoint>,
    detections: usize,
}

fn parse_bbox(raw: &str) -> Result<BoundingBox> {
    let parts: Vec<f64> = raw
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .with_context(|| format!("invalid bbox: {raw}"))?;
    anyhow::ensure!(parts.len() == 4, "bbox needs 4 numbers, got {}", parts.len());
    Ok(BoundingBox::new(parts[0], parts[1], parts[2], parts[3]))
}

/// Scatter obstacles across the box for the sensor to find.
fn obstacle_field(bbox: &BoundingBox, count: usize, spacing: f64, rng: &mut StdRng) -> ObstacleField {
    use rand::Rng;
    let obstacles = (0..count)
        .map(|i| Obstacle {
            lng: rng.random_range(bbox.min_lng..=bbox.max_lng),
            lat: rng.random_range(bbox.min_lat..=bbox.max_lat),
            label: format!("obstacle-{i}"),
        })
        .collect();
    ObstacleField::new(obstacles, spacing * 2.0)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sweep=info".parse()?)
                .add_directive("sweep_sim=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let bbox = parse_bbox(&args.bbox)?;
    let started_at = Utc::now();

    let config = FleetConfig {
        sector_count: args.drones,
        spacing: args.spacing,
        algorithm: args.algorithm,
        ..FleetConfig::default()
    };

    let mut rng = StdRng::seed_from_u64(args.seed);
    let origin_lng = (bbox.min_lng + bbox.max_lng) / 2.0;
    let origin_lat = (bbox.min_lat + bbox.max_lat) / 2.0;
    let geodesy = Arc::new(FlatProjection::new(origin_lng, origin_lat));
    let sensor: Arc<dyn RangeSensor> = if args.obstacles > 0 {
        Arc::new(obstacle_field(&bbox, args.obstacles, args.spacing, &mut rng))
    } else {
        Arc::new(NullSensor)
    };

    let mut fleet = Fleet::assemble(&bbox, &config, geodesy, sensor, &mut rng)
        .context("fleet assembly failed")?;

    tracing::info!(
        drones = args.drones,
        algorithm = %args.algorithm,
        spacing = args.spacing,
        "mission start"
    );

    let mut pacer = args
        .real_time
        .then(|| tokio::time::interval(Duration::from_secs_f64(args.dt)));

    let mut ticks = 0u64;
    while !fleet.all_complete() && ticks < args.max_ticks {
        if let Some(pacer) = pacer.as_mut() {
            pacer.tick().await;
        }
        fleet.tick(args.dt);
        ticks += 1;

        if ticks % 1000 == 0 {
            for agent in fleet.agents() {
                tracing::info!(
                    t = fleet.elapsed(),
                    agent = agent.id(),
                    phase = ?agent.phase(),
                    coverage = format!("{:.1}%", agent.coverage_percent()),
                    "progress"
                );
            }
        }
    }

    if fleet.all_complete() {
        tracing::info!(
            t = fleet.elapsed(),
            coverage = format!("{:.1}%", fleet.mean_coverage()),
            "all missions complete"
        );
    } else {
        tracing::warn!(ticks, "tick budget exhausted before completion");
    }

    for agent in fleet.agents() {
        let (lng, lat) = agent.position();
        tracing::info!(
            agent = agent.id(),
            role = ?agent.role(),
            coverage = format!("{:.1}%", agent.coverage_percent()),
            lng,
            lat,
            detections = agent.detections().len(),
            "final state"
        );
    }

    if let Some(path) = args.dump_json {
        let dump = ScenarioDump {
            started_at,
            finished_at: Utc::now(),
            elapsed_time_units: fleet.elapsed(),
            algorithm: args.algorithm.to_string(),
            sectors: fleet.sectors().to_vec(),
            agents: fleet
                .agents()
                .iter()
                .map(|a| {
                    let (lng, lat) = a.position();
                    AgentDump {
                        id: a.id(),
                        role: format!("{:?}", a.role()).to_lowercase(),
                        position: [lng, lat],
                        render_position: a.render_position(),
                        coverage_percent: a.coverage_percent(),
                        mission_complete: a.mission_complete(),
                        remaining_path: a.remaining_path().to_vec(),
                        detections: a.detections().len(),
                    }
                })
                .collect(),
        };
        let json = serde_json::to_string_pretty(&dump)?;
        std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(path = %path.display(), "scenario dump written");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_valid_bbox() {
        let bbox = parse_bbox("33.64, 33.65, -117.84, -117.83").unwrap();
        assert_eq!(bbox.min_lat, 33.64);
        assert_eq!(bbox.max_lng, -117.83);
    }

    #[test]
    fn rejects_malformed_bbox() {
        assert!(parse_bbox("1,2,3").is_err());
        assert!(parse_bbox("a,b,c,d").is_err());
    }
}
