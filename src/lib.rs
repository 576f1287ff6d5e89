//! nh_planning - nonholonomic wall-following path planning
//!
//! This crate provides a best-first planner for car-like robots that
//! negotiates obstacles by following their boundary, together with the
//! occupancy grid, Reeds-Shepp steering and plotting utilities it uses.

// Core modules
pub mod common;
pub mod utils;

// Algorithm modules
pub mod path_planning;

// Re-export common types for convenience
pub use common::{Point2D, Pose2D, Path2D, Pose, PoseStamped, Header};
pub use common::{OccupancyMap, PathPlanner};
pub use common::{PlanningError, RoboticsError, RoboticsResult};
pub use path_planning::nh_planner::{NHPlanner, NHPlannerConfig, Plan, PlanStats};
