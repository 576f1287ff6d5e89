//! Error types for nh_planning

use std::time::Duration;

use thiserror::Error;

use crate::common::types::Pose2D;
use crate::path_planning::nh_planner::PlanStats;

/// Failures of a single planning request
#[derive(Debug, Error)]
pub enum PlanningError {
    /// Start configuration is not in free space; no search was performed
    #[error("invalid start configuration {0}: not in free space")]
    InvalidStart(Pose2D),
    /// Goal configuration is not in free space; no search was performed
    #[error("invalid goal configuration {0}: not in free space")]
    InvalidGoal(Pose2D),
    /// Frontier exhausted before the goal was reached
    #[error("no plan found: search exhausted after {} iterations", .stats.iterations)]
    NoPath { stats: PlanStats },
    /// Deadline elapsed before the goal was reached
    #[error("no plan found: deadline of {deadline:?} exceeded after {:?}", .stats.elapsed)]
    Timeout { deadline: Duration, stats: PlanStats },
}

impl PlanningError {
    /// Search diagnostics, if a search was started
    pub fn stats(&self) -> Option<&PlanStats> {
        match self {
            PlanningError::NoPath { stats } | PlanningError::Timeout { stats, .. } => Some(stats),
            _ => None,
        }
    }

    /// Both exhaustion and timeout are reported as "no plan found"
    pub fn is_no_plan(&self) -> bool {
        matches!(self, PlanningError::NoPath { .. } | PlanningError::Timeout { .. })
    }
}

/// Main error type for nh_planning
#[derive(Debug, Error)]
pub enum RoboticsError {
    /// Path planning failed
    #[error("Planning error: {0}")]
    Planning(#[from] PlanningError),
    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// Malformed configuration document
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for robotics operations
pub type RoboticsResult<T> = Result<T, RoboticsError>;
