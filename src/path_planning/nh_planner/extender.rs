//! Nonholonomic steering between configurations using Reeds-Shepp curves

use serde::Deserialize;

use super::distance::{Distance, L2ThetaDistance};
use crate::common::{OccupancyMap, Pose2D};
use crate::path_planning::reeds_shepp_path::calc_paths;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExtenderConfig {
    /// Inverse of the minimum turning radius [1/m]
    pub max_curvature: f64,
    /// Arc length between collision-checked samples [m]
    pub step_size: f64,
}

impl Default for ExtenderConfig {
    fn default() -> Self {
        Self {
            max_curvature: 2.0,
            step_size: 0.05,
        }
    }
}

/// A feasible connection found by [`Extender::steer`]
#[derive(Debug, Clone)]
pub struct Steer {
    /// Reached configuration
    pub state: Pose2D,
    /// Samples strictly between the start and `state`
    pub primitives: Vec<Pose2D>,
    /// Arc length of the connection
    pub cost: f64,
}

#[derive(Debug, Clone)]
pub struct Extender {
    config: ExtenderConfig,
    metric: L2ThetaDistance,
}

impl Extender {
    /// Largest mismatch between a curve's end and its target
    const ARRIVAL_TOLERANCE: f64 = 1e-3;

    pub fn new(config: ExtenderConfig) -> Self {
        Self {
            config,
            metric: L2ThetaDistance::default(),
        }
    }

    pub fn config(&self) -> &ExtenderConfig {
        &self.config
    }

    /// Shortest collision-free curve from `from` to `to`
    pub fn steer<M: OccupancyMap>(&self, map: &M, from: &Pose2D, to: &Pose2D) -> Option<Steer> {
        if self.metric.distance(from, to) < Self::ARRIVAL_TOLERANCE {
            return None;
        }
        let mut paths = calc_paths(from, to, self.config.max_curvature, self.config.step_size);
        paths.sort_by(|a, b| a.l.total_cmp(&b.l));

        paths
            .into_iter()
            .filter(|path| {
                path.poses
                    .last()
                    .map_or(false, |end| self.metric.distance(end, to) < Self::ARRIVAL_TOLERANCE)
            })
            .find(|path| {
                path.poses
                    .iter()
                    .all(|p| map.inside_bounds(p.position()) && map.is_free_pose(p))
            })
            .map(|path| {
                let n = path.poses.len();
                let primitives = if n > 2 { path.poses[1..n - 1].to_vec() } else { Vec::new() };
                Steer {
                    state: *to,
                    primitives,
                    cost: path.l,
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::GridMap;
    use approx::assert_relative_eq;

    #[test]
    fn test_straight_steer() {
        let map = GridMap::new(-2.0, -5.0, 12.0, 5.0, 0.1, 0.2).unwrap();
        let extender = Extender::new(ExtenderConfig::default());
        let from = Pose2D::new(0.0, 0.0, 0.0);
        let to = Pose2D::new(10.0, 0.0, 0.0);

        let steer = extender.steer(&map, &from, &to).unwrap();
        assert_eq!(steer.state, to);
        assert_relative_eq!(steer.cost, 10.0, epsilon = 1e-9);
        assert!(!steer.primitives.is_empty());
        assert!(steer.primitives.iter().all(|p| p.x > 0.0 && p.x < 10.0));
    }

    #[test]
    fn test_samples_are_dense() {
        let map = GridMap::new(-5.0, -5.0, 5.0, 5.0, 0.1, 0.2).unwrap();
        let config = ExtenderConfig::default();
        let extender = Extender::new(config);
        let from = Pose2D::new(0.0, 0.0, 0.0);
        let to = Pose2D::new(1.0, 2.0, 1.5);

        let steer = extender.steer(&map, &from, &to).unwrap();
        let mut all = vec![from];
        all.extend(steer.primitives.iter().copied());
        all.push(steer.state);
        for w in all.windows(2) {
            assert!(w[0].position().distance(&w[1].position()) <= config.step_size + 1e-9);
        }
        assert!(steer.cost >= from.position().distance(&to.position()));
    }

    #[test]
    fn test_blocked_steer_fails() {
        let mut map = GridMap::new(0.0, 0.0, 20.0, 10.0, 0.1, 0.2).unwrap();
        map.add_rectangle(9.0, 0.0, 11.0, 10.0);
        let extender = Extender::new(ExtenderConfig::default());

        let steer = extender.steer(&map, &Pose2D::new(2.0, 5.0, 0.0), &Pose2D::new(18.0, 5.0, 0.0));
        assert!(steer.is_none());
    }

    #[test]
    fn test_identical_configurations_do_not_steer() {
        let map = GridMap::new(0.0, 0.0, 5.0, 5.0, 0.1, 0.2).unwrap();
        let extender = Extender::new(ExtenderConfig::default());
        let p = Pose2D::new(2.0, 2.0, 0.3);
        assert!(extender.steer(&map, &p, &p).is_none());
    }
}
