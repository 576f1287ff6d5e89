//! Nearest-neighbour index over discovered corners

use super::distance::Distance;
use crate::common::Pose2D;

/// Quantized planar key of a corner, used to cache samples around it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CornerKey(i64, i64);

impl CornerKey {
    const QUANTUM: f64 = 1e-6;
}

impl From<&Pose2D> for CornerKey {
    fn from(p: &Pose2D) -> Self {
        CornerKey(
            (p.x / Self::QUANTUM).round() as i64,
            (p.y / Self::QUANTUM).round() as i64,
        )
    }
}

/// Linear-scan index; a search registers at most a few hundred corners
#[derive(Debug, Clone)]
pub struct CornerIndex<D: Distance> {
    metric: D,
    points: Vec<Pose2D>,
}

impl<D: Distance> CornerIndex<D> {
    pub fn new(metric: D) -> Self {
        Self { metric, points: Vec::new() }
    }

    pub fn insert(&mut self, point: Pose2D) {
        self.points.push(point);
    }

    /// Closest registered point and its distance to `query`
    pub fn nearest(&self, query: &Pose2D) -> Option<(Pose2D, f64)> {
        self.points
            .iter()
            .map(|p| (*p, self.metric.distance(p, query)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Registered point within `tolerance` of `query`, if any
    pub fn find_within(&self, query: &Pose2D, tolerance: f64) -> Option<Pose2D> {
        self.nearest(query).filter(|(_, d)| *d < tolerance).map(|(p, _)| p)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_planning::nh_planner::distance::L2Distance;
    use approx::assert_relative_eq;

    #[test]
    fn test_nearest_neighbour() {
        let mut index = CornerIndex::new(L2Distance);
        assert!(index.nearest(&Pose2D::origin()).is_none());

        index.insert(Pose2D::new(10.0, 0.0, 0.0));
        index.insert(Pose2D::new(2.0, 2.0, 1.0));
        index.insert(Pose2D::new(-3.0, 0.0, 0.0));

        let (p, d) = index.nearest(&Pose2D::new(2.0, 1.0, 0.0)).unwrap();
        assert_eq!(p, Pose2D::new(2.0, 2.0, 1.0));
        assert_relative_eq!(d, 1.0);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_dedup_within_tolerance() {
        let mut index = CornerIndex::new(L2Distance);
        index.insert(Pose2D::new(1.0, 1.0, 0.0));

        assert!(index.find_within(&Pose2D::new(1.2, 1.0, 2.0), 0.5).is_some());
        assert!(index.find_within(&Pose2D::new(1.6, 1.0, 0.0), 0.5).is_none());
    }

    #[test]
    fn test_corner_key_ignores_heading() {
        let a = CornerKey::from(&Pose2D::new(1.5, -2.25, 0.0));
        let b = CornerKey::from(&Pose2D::new(1.5, -2.25, 3.0));
        let c = CornerKey::from(&Pose2D::new(1.5001, -2.25, 0.0));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
