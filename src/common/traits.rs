//! Common traits defining interfaces for planning collaborators

use crate::common::error::RoboticsResult;
use crate::common::types::*;

/// Read-only free-space provider queried by the planners.
///
/// Queries take `&self`; a map shared between planners on several
/// threads additionally needs to be `Sync`.
pub trait OccupancyMap {
    /// Whether the robot fits at `point`
    fn is_free(&self, point: Point2D) -> bool;

    /// Whether `point` lies inside the mapped workspace
    fn inside_bounds(&self, point: Point2D) -> bool;

    /// Smallest distinguishable distance of the map [m]
    fn resolution(&self) -> f64;

    /// Free-space test for a full configuration; heading is irrelevant
    /// for a circular footprint
    fn is_free_pose(&self, pose: &Pose2D) -> bool {
        self.is_free(pose.position())
    }
}

impl<M: OccupancyMap + ?Sized> OccupancyMap for &M {
    fn is_free(&self, point: Point2D) -> bool {
        (**self).is_free(point)
    }

    fn inside_bounds(&self, point: Point2D) -> bool {
        (**self).inside_bounds(point)
    }

    fn resolution(&self) -> f64 {
        (**self).resolution()
    }
}

/// Trait for path planning algorithms over planar configurations
pub trait PathPlanner {
    /// Plan a path from start to goal
    fn plan(&self, start: Pose2D, goal: Pose2D) -> RoboticsResult<Path2D>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test that traits compile correctly
    struct DummyPlanner;

    impl PathPlanner for DummyPlanner {
        fn plan(&self, start: Pose2D, goal: Pose2D) -> RoboticsResult<Path2D> {
            Ok(Path2D::from_poses(vec![start, goal]))
        }
    }

    struct HalfPlane;

    impl OccupancyMap for HalfPlane {
        fn is_free(&self, point: Point2D) -> bool {
            point.x < 0.0
        }

        fn inside_bounds(&self, _point: Point2D) -> bool {
            true
        }

        fn resolution(&self) -> f64 {
            0.1
        }
    }

    #[test]
    fn test_path_planner_trait() {
        let planner = DummyPlanner;
        let result = planner.plan(Pose2D::origin(), Pose2D::new(1.0, 1.0, 0.0));
        assert_eq!(result.unwrap().len(), 2);
    }

    #[test]
    fn test_pose_free_ignores_heading() {
        let map = HalfPlane;
        assert!(map.is_free_pose(&Pose2D::new(-1.0, 0.0, 3.0)));
        assert!(!(&map).is_free_pose(&Pose2D::new(1.0, 0.0, 0.0)));
    }
}
