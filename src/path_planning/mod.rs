// Path Planning algorithms module

pub mod nh_planner;
pub mod reeds_shepp_path;

pub use nh_planner::*;
pub use reeds_shepp_path::*;
