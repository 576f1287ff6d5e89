//! Closeness scores between planar configurations

use crate::common::{normalize_angle, Pose2D};

/// Scores how far apart two configurations are
pub trait Distance {
    fn distance(&self, a: &Pose2D, b: &Pose2D) -> f64;
}

/// Euclidean distance between positions, heading ignored
#[derive(Debug, Clone, Copy, Default)]
pub struct L2Distance;

impl Distance for L2Distance {
    fn distance(&self, a: &Pose2D, b: &Pose2D) -> f64 {
        (a.x - b.x).hypot(a.y - b.y)
    }
}

/// Absolute wrapped heading difference in [0, pi]
#[derive(Debug, Clone, Copy, Default)]
pub struct ThetaDistance;

impl Distance for ThetaDistance {
    fn distance(&self, a: &Pose2D, b: &Pose2D) -> f64 {
        normalize_angle(a.yaw - b.yaw).abs()
    }
}

/// Position distance plus weighted heading distance
#[derive(Debug, Clone, Copy)]
pub struct L2ThetaDistance {
    pub theta_weight: f64,
}

impl Default for L2ThetaDistance {
    fn default() -> Self {
        Self { theta_weight: 1.0 }
    }
}

impl Distance for L2ThetaDistance {
    fn distance(&self, a: &Pose2D, b: &Pose2D) -> f64 {
        L2Distance.distance(a, b) + self.theta_weight * ThetaDistance.distance(a, b)
    }
}
