//! Nonholonomic Wall-Following Planner Module
//!
//! Best-first search for a car-like robot that negotiates obstacles by
//! following their boundary. When a target cannot be steered to, the
//! planner proposes the tangent exit points around the blocking obstacle
//! on either side and records the explored free space as triangles, which
//! prune later candidates.
//!
//! # Components
//!
//! - `distance`: position, heading and combined configuration metrics
//! - `free_space`: segment collision points, obstacle following, exit points, corners
//! - `corner_index`: deduplication of discovered corners
//! - `extender`: Reeds-Shepp steering with collision checking
//! - `sampling`: heading and corner-position perturbation
//! - `search`: actions, tree nodes and triangular regions
//! - `open_list`: priority frontier
//! - `config`: planner parameters
//! - `planner`: the search loop
//!
//! # Example
//!
//! ```no_run
//! use nh_planning::common::PoseStamped;
//! use nh_planning::path_planning::nh_planner::{NHPlanner, NHPlannerConfig};
//! use nh_planning::utils::GridMap;
//! use nh_planning::Pose2D;
//!
//! let mut map = GridMap::new(0.0, 0.0, 20.0, 10.0, 0.1, 0.2).unwrap();
//! map.add_rectangle(9.0, 3.0, 11.0, 7.0);
//!
//! let planner = NHPlanner::new(&map, NHPlannerConfig::default().with_seed(7)).unwrap();
//! let start = PoseStamped::from_pose2d(Pose2D::new(2.0, 5.0, 0.0), 0.0);
//! let goal = PoseStamped::from_pose2d(Pose2D::new(18.0, 5.0, 0.0), 0.0);
//! let plan = planner.make_plan(&start, &goal).unwrap();
//! println!("{} poses, length {:.2}", plan.poses.len(), plan.stats.path_length);
//! ```

pub mod config;
pub mod corner_index;
pub mod distance;
pub mod extender;
pub mod free_space;
pub mod open_list;
pub mod planner;
pub mod sampling;
pub mod search;

pub use config::NHPlannerConfig;
pub use corner_index::{CornerIndex, CornerKey};
pub use distance::{Distance, L2Distance, L2ThetaDistance, ThetaDistance};
pub use extender::{Extender, ExtenderConfig, Steer};
pub use free_space::{Follow, FreeSpaceConfig, FreeSpaceMap, LineOfSight};
pub use planner::{NHPlanner, Plan, PlanStats};
pub use sampling::{AngleSampling, PositionSampling};
pub use search::{Action, NodeId, SearchTree, Triangle, TreeNode};
