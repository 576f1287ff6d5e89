//! Common types used throughout nh_planning

use std::f64::consts::PI;
use std::fmt;
use std::ops::{Add, Mul, Sub};

use itertools::Itertools;
use nalgebra::{Point3, UnitQuaternion, Vector2, Vector3};

/// Wrap an angle to [-pi, pi]
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % (2.0 * PI);
    if a > PI {
        a -= 2.0 * PI;
    } else if a < -PI {
        a += 2.0 * PI;
    }
    a
}

/// 2D point representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn distance(&self, other: &Point2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn norm(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Bearing of `other` as seen from this point
    pub fn bearing_to(&self, other: &Point2D) -> f64 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    /// Midpoint of the segment between two points
    pub fn midpoint(&self, other: &Point2D) -> Point2D {
        Point2D::new(0.5 * (self.x + other.x), 0.5 * (self.y + other.y))
    }

    pub fn to_vector(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from(tuple: (f64, f64)) -> Self {
        Self { x: tuple.0, y: tuple.1 }
    }
}

impl From<Vector2<f64>> for Point2D {
    fn from(v: Vector2<f64>) -> Self {
        Self { x: v[0], y: v[1] }
    }
}

impl Add for Point2D {
    type Output = Point2D;

    fn add(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2D {
    type Output = Point2D;

    fn sub(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point2D {
    type Output = Point2D;

    fn mul(self, rhs: f64) -> Point2D {
        Point2D::new(self.x * rhs, self.y * rhs)
    }
}

/// Planar configuration: position plus heading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub yaw: f64,
}

impl Pose2D {
    pub fn new(x: f64, y: f64, yaw: f64) -> Self {
        Self { x, y, yaw }
    }

    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0, yaw: 0.0 }
    }

    pub fn from_point(point: Point2D, yaw: f64) -> Self {
        Self { x: point.x, y: point.y, yaw }
    }

    pub fn position(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }

    /// Same position, different heading
    pub fn with_yaw(&self, yaw: f64) -> Self {
        Self { yaw, ..*self }
    }

    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.yaw)
    }

    /// Normalize yaw to [-pi, pi]
    pub fn normalize_yaw(&mut self) {
        self.yaw = normalize_angle(self.yaw);
    }
}

impl From<Vector3<f64>> for Pose2D {
    fn from(v: Vector3<f64>) -> Self {
        Self { x: v[0], y: v[1], yaw: v[2] }
    }
}

impl fmt::Display for Pose2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.yaw)
    }
}

/// Path represented as a dense sequence of configurations
#[derive(Debug, Clone, Default)]
pub struct Path2D {
    pub poses: Vec<Pose2D>,
}

impl Path2D {
    pub fn new() -> Self {
        Self { poses: Vec::new() }
    }

    pub fn from_poses(poses: Vec<Pose2D>) -> Self {
        Self { poses }
    }

    pub fn push(&mut self, pose: Pose2D) {
        self.poses.push(pose);
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    pub fn first(&self) -> Option<&Pose2D> {
        self.poses.first()
    }

    pub fn last(&self) -> Option<&Pose2D> {
        self.poses.last()
    }

    pub fn x_coords(&self) -> Vec<f64> {
        self.poses.iter().map(|p| p.x).collect()
    }

    pub fn y_coords(&self) -> Vec<f64> {
        self.poses.iter().map(|p| p.y).collect()
    }

    /// Sum of the straight-line gaps between consecutive poses
    pub fn total_length(&self) -> f64 {
        self.poses
            .iter()
            .tuple_windows()
            .map(|(a, b)| a.position().distance(&b.position()))
            .sum()
    }

    /// Sum of squared heading changes per unit length
    pub fn roughness(&self) -> f64 {
        let length = self.total_length();
        if self.poses.len() < 2 || length <= 0.0 {
            return 0.0;
        }
        let turning: f64 = self
            .poses
            .iter()
            .tuple_windows()
            .map(|(a, b)| normalize_angle(b.yaw - a.yaw).powi(2))
            .sum();
        turning / length
    }
}

/// Message header: timestamp in seconds and reference frame
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub stamp: f64,
    pub frame_id: String,
}

impl Default for Header {
    fn default() -> Self {
        Self { stamp: 0.0, frame_id: "map".to_string() }
    }
}

/// 3D pose as exchanged with the surrounding navigation stack
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    pub position: Point3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl Pose {
    pub fn new(position: Point3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self { position, orientation }
    }

    /// Planar pose with a rotation of `yaw` about Z
    pub fn planar(x: f64, y: f64, yaw: f64) -> Self {
        Self {
            position: Point3::new(x, y, 0.0),
            orientation: UnitQuaternion::from_euler_angles(0.0, 0.0, yaw),
        }
    }

    pub fn yaw(&self) -> f64 {
        self.orientation.euler_angles().2
    }

    pub fn to_pose2d(&self) -> Pose2D {
        Pose2D::new(self.position.x, self.position.y, self.yaw())
    }
}

impl From<Pose2D> for Pose {
    fn from(p: Pose2D) -> Self {
        Pose::planar(p.x, p.y, p.yaw)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoseStamped {
    pub header: Header,
    pub pose: Pose,
}

impl PoseStamped {
    pub fn new(header: Header, pose: Pose) -> Self {
        Self { header, pose }
    }

    pub fn from_pose2d(pose: Pose2D, stamp: f64) -> Self {
        Self {
            header: Header { stamp, ..Header::default() },
            pose: pose.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_point2d_distance() {
        let p1 = Point2D::new(0.0, 0.0);
        let p2 = Point2D::new(3.0, 4.0);
        assert_relative_eq!(p1.distance(&p2), 5.0, epsilon = 1e-10);
    }

    #[test]
    fn test_pose2d_normalize_yaw() {
        let mut pose = Pose2D::new(0.0, 0.0, 4.0);
        pose.normalize_yaw();
        assert!(pose.yaw >= -PI && pose.yaw <= PI);
        assert_relative_eq!(pose.yaw, 4.0 - 2.0 * PI, epsilon = 1e-12);
    }

    #[test]
    fn test_path2d_total_length() {
        let path = Path2D::from_poses(vec![
            Pose2D::new(0.0, 0.0, 0.0),
            Pose2D::new(1.0, 0.0, 0.0),
            Pose2D::new(1.0, 1.0, 0.0),
        ]);
        assert_relative_eq!(path.total_length(), 2.0, epsilon = 1e-10);
    }

    #[test]
    fn test_straight_path_has_no_roughness() {
        let path = Path2D::from_poses((0..5).map(|i| Pose2D::new(i as f64, 0.0, 0.0)).collect());
        assert_eq!(path.roughness(), 0.0);

        let turning = Path2D::from_poses(vec![
            Pose2D::new(0.0, 0.0, 0.0),
            Pose2D::new(1.0, 0.0, 0.5),
        ]);
        assert_relative_eq!(turning.roughness(), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_pose_yaw_round_trip() {
        let pose = Pose::planar(1.0, 2.0, 0.7);
        assert_relative_eq!(pose.yaw(), 0.7, epsilon = 1e-12);

        let flat = pose.to_pose2d();
        assert_relative_eq!(flat.x, 1.0);
        assert_relative_eq!(flat.y, 2.0);
    }

    #[test]
    fn test_stamped_pose_uses_map_frame() {
        let stamped = PoseStamped::from_pose2d(Pose2D::new(1.0, 1.0, -0.3), 12.5);
        assert_eq!(stamped.header.frame_id, "map");
        assert_eq!(stamped.header.stamp, 12.5);
        assert_relative_eq!(stamped.pose.yaw(), -0.3, epsilon = 1e-12);
    }
}
