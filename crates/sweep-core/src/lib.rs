pub mod models;
pub mod partition;
pub mod planner;

pub use models::{Algorithm, BoundingBox, CellKey, CoreError, Sector, Waypoint, SECTOR_PALETTE};
pub use partition::{best_grid, partition};
pub use planner::generate;
