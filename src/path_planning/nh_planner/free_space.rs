//! Geometric queries over an occupancy collaborator: segment collision
//! points, obstacle following, tangent exit points and corner detection.
//!
//! Segments are marched at half the map resolution. Anything outside the
//! map bounds counts as occupied.

use std::f64::consts::PI;

use serde::Deserialize;

use crate::common::{OccupancyMap, Point2D};

/// Result of a straight-line visibility query from `a` to `b`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineOfSight {
    Clear,
    /// `entry` is the last free point before the first blocked sample, as
    /// seen from `a`; `exit` is the first free point after the last blocked
    /// sample, or `b` when the segment ends inside the obstacle
    Blocked { entry: Point2D, exit: Point2D },
}

impl LineOfSight {
    pub fn is_clear(&self) -> bool {
        matches!(self, LineOfSight::Clear)
    }

    /// The two boundary crossings, if blocked
    pub fn points(&self) -> Option<(Point2D, Point2D)> {
        match *self {
            LineOfSight::Clear => None,
            LineOfSight::Blocked { entry, exit } => Some((entry, exit)),
        }
    }
}

/// Outcome of continuing past a visible target along the approach ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Follow {
    /// Nothing ahead; the robot can keep going to this point
    Clear(Point2D),
    /// The continuation hits an obstacle with these boundary crossings
    Blocked { entry: Point2D, exit: Point2D },
    /// No approach direction can be defined
    Lost,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct FreeSpaceConfig {
    /// Clearance kept from an obstacle edge by exit points [m]
    pub exit_margin: f64,
    /// Probe radius of the corner test [m]
    pub corner_radius: f64,
    /// How far past a visible target the approach ray is continued [m]
    pub follow_distance: f64,
}

impl Default for FreeSpaceConfig {
    fn default() -> Self {
        Self {
            exit_margin: 0.2,
            corner_radius: 0.35,
            follow_distance: 1.0,
        }
    }
}

pub struct FreeSpaceMap<M: OccupancyMap> {
    map: M,
    config: FreeSpaceConfig,
}

impl<M: OccupancyMap> FreeSpaceMap<M> {
    const CORNER_PROBES: usize = 16;

    pub fn new(map: M, config: FreeSpaceConfig) -> Self {
        Self { map, config }
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn config(&self) -> &FreeSpaceConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: FreeSpaceConfig) {
        self.config = config;
    }

    pub fn is_free(&self, p: Point2D) -> bool {
        self.map.inside_bounds(p) && self.map.is_free(p)
    }

    pub fn inside_bounds(&self, p: Point2D) -> bool {
        self.map.inside_bounds(p)
    }

    fn step(&self) -> f64 {
        (0.5 * self.map.resolution()).max(1e-3)
    }

    /// Boundary crossings of the segment `a`-`b`
    pub fn collision_points(&self, a: Point2D, b: Point2D) -> LineOfSight {
        let length = a.distance(&b);
        let n = (length / self.step()).ceil().max(1.0) as usize;
        let sample = |i: usize| a + (b - a) * (i as f64 / n as f64);

        let mut first_blocked = None;
        let mut last_blocked = None;
        for i in 0..=n {
            if !self.is_free(sample(i)) {
                first_blocked.get_or_insert(i);
                last_blocked = Some(i);
            }
        }

        match (first_blocked, last_blocked) {
            (Some(first), Some(last)) => LineOfSight::Blocked {
                entry: if first == 0 { a } else { sample(first - 1) },
                exit: if last == n { b } else { sample(last + 1) },
            },
            _ => LineOfSight::Clear,
        }
    }

    pub fn line_of_sight(&self, a: Point2D, b: Point2D) -> bool {
        self.collision_points(a, b).is_clear()
    }

    /// Continue the ray `from` -> `to` past `to` by the follow distance
    pub fn follow_obstacle(&self, from: Point2D, to: Point2D) -> Follow {
        let d = to - from;
        let length = d.norm();
        if length < 1e-9 {
            return Follow::Lost;
        }
        let end = to + d * (self.config.follow_distance / length);
        match self.collision_points(to, end) {
            LineOfSight::Clear => Follow::Clear(end),
            LineOfSight::Blocked { entry, exit } => Follow::Blocked { entry, exit },
        }
    }

    pub fn compute_middle(&self, p: Point2D, q: Point2D) -> Point2D {
        p.midpoint(&q)
    }

    /// Tangent point around the obstacle covering `pivot`, seen from
    /// `origin`, found by sweeping the ray `origin` -> `pivot` clockwise or
    /// counter-clockwise until it clears. The point is pushed off the last
    /// blocked ray by the exit margin. `None` when the sweep never clears or
    /// no candidate near the tangent is free and visible.
    pub fn exit_point(&self, origin: Point2D, pivot: Point2D, clockwise: bool) -> Option<Point2D> {
        let length = origin.distance(&pivot);
        if length < 1e-9 {
            return None;
        }
        let base = origin.bearing_to(&pivot);
        let sign = if clockwise { -1.0 } else { 1.0 };
        let delta = (self.map.resolution() / length).clamp(1e-3, 0.1);
        let steps = (PI / delta).ceil() as usize;

        let mut last_entry = None;
        for i in 0..=steps {
            let angle = base + sign * delta * i as f64;
            let dir = Point2D::new(angle.cos(), angle.sin());
            match self.collision_points(origin, origin + dir * length) {
                LineOfSight::Blocked { entry, .. } => last_entry = Some(entry),
                LineOfSight::Clear => {
                    let Some(entry) = last_entry else {
                        return self.is_free(pivot).then_some(pivot);
                    };
                    let normal = Point2D::new(-angle.sin(), angle.cos()) * sign;
                    let margin = self.config.exit_margin;
                    let on_ray = origin + dir * origin.distance(&entry);
                    return [entry + normal * margin, entry + normal * (0.5 * margin), on_ray]
                        .into_iter()
                        .find(|c| self.is_free(*c) && self.line_of_sight(origin, *c));
                }
            }
        }
        None
    }

    /// A free point with obstacles over a narrow arc around it. Probes on
    /// a circle; a straight wall fills about half of them, a convex corner
    /// at most a quarter.
    pub fn is_corner(&self, p: Point2D) -> bool {
        if !self.is_free(p) {
            return false;
        }
        let r = self.config.corner_radius;
        let occupied = (0..Self::CORNER_PROBES)
            .map(|i| 2.0 * PI * i as f64 / Self::CORNER_PROBES as f64)
            .filter(|a| !self.is_free(p + Point2D::new(a.cos(), a.sin()) * r))
            .count();
        occupied > 0 && occupied <= Self::CORNER_PROBES / 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::GridMap;
    use approx::assert_relative_eq;

    /// 20 x 10 field with a 2 x 4 block in the middle
    fn block_map() -> GridMap {
        let mut map = GridMap::new(0.0, 0.0, 20.0, 10.0, 0.1, 0.2).unwrap();
        map.add_rectangle(9.0, 3.0, 11.0, 7.0);
        map
    }

    #[test]
    fn test_clear_line_of_sight() {
        let map = block_map();
        let fs = FreeSpaceMap::new(&map, FreeSpaceConfig::default());
        assert_eq!(
            fs.collision_points(Point2D::new(2.0, 1.0), Point2D::new(18.0, 1.0)),
            LineOfSight::Clear
        );
        assert!(fs.line_of_sight(Point2D::new(2.0, 5.0), Point2D::new(8.0, 5.0)));
    }

    #[test]
    fn test_collision_points_bracket_the_obstacle() {
        let map = block_map();
        let fs = FreeSpaceMap::new(&map, FreeSpaceConfig::default());
        let los = fs.collision_points(Point2D::new(18.0, 5.0), Point2D::new(2.0, 5.0));
        let (entry, exit) = los.points().unwrap();

        // inflated block spans x in [8.8, 11.2]
        assert!(entry.x > 11.2 && entry.x < 11.3, "entry {:?}", entry);
        assert!(exit.x < 8.8 && exit.x > 8.7, "exit {:?}", exit);
        assert_relative_eq!(entry.y, 5.0);
        assert!(fs.is_free(entry) && fs.is_free(exit));
    }

    #[test]
    fn test_out_of_bounds_blocks() {
        let map = block_map();
        let fs = FreeSpaceMap::new(&map, FreeSpaceConfig::default());
        let los = fs.collision_points(Point2D::new(18.0, 5.0), Point2D::new(21.0, 5.0));
        let (entry, exit) = los.points().unwrap();
        assert!(entry.x < 20.0);
        assert_eq!(exit, Point2D::new(21.0, 5.0));
    }

    #[test]
    fn test_follow_obstacle() {
        let map = block_map();
        let fs = FreeSpaceMap::new(&map, FreeSpaceConfig::default());

        match fs.follow_obstacle(Point2D::new(2.0, 1.0), Point2D::new(5.0, 1.0)) {
            Follow::Clear(p) => assert_relative_eq!(p.x, 6.0, epsilon = 1e-9),
            other => panic!("expected clear follow, got {:?}", other),
        }
        assert!(matches!(
            fs.follow_obstacle(Point2D::new(2.0, 5.0), Point2D::new(8.5, 5.0)),
            Follow::Blocked { .. }
        ));
        assert_eq!(
            fs.follow_obstacle(Point2D::new(2.0, 5.0), Point2D::new(2.0, 5.0)),
            Follow::Lost
        );
    }

    #[test]
    fn test_exit_points_pass_the_block_on_both_sides() {
        let map = block_map();
        let fs = FreeSpaceMap::new(&map, FreeSpaceConfig::default());
        let origin = Point2D::new(2.0, 5.0);
        let pivot = Point2D::new(10.0, 5.0);

        let cw = fs.exit_point(origin, pivot, true).unwrap();
        let ccw = fs.exit_point(origin, pivot, false).unwrap();

        assert!(cw.y < 2.8 && cw.y > 2.4, "cw {:?}", cw);
        assert!(ccw.y > 7.2 && ccw.y < 7.6, "ccw {:?}", ccw);
        assert!(cw.x > 8.0 && cw.x < 9.0);
        assert!(ccw.x > 8.0 && ccw.x < 9.0);
        assert!(fs.line_of_sight(origin, cw) && fs.line_of_sight(origin, ccw));
    }

    #[test]
    fn test_exit_point_of_visible_pivot_is_pivot() {
        let map = block_map();
        let fs = FreeSpaceMap::new(&map, FreeSpaceConfig::default());
        let pivot = Point2D::new(6.0, 5.0);
        assert_eq!(fs.exit_point(Point2D::new(2.0, 5.0), pivot, true), Some(pivot));
        assert_eq!(fs.exit_point(pivot, pivot, true), None);
    }

    #[test]
    fn test_corner_detection() {
        let map = block_map();
        let fs = FreeSpaceMap::new(&map, FreeSpaceConfig::default());

        assert!(fs.is_corner(Point2D::new(8.7, 2.7)));
        assert!(fs.is_corner(Point2D::new(11.3, 7.3)));
        // beside a straight edge
        assert!(!fs.is_corner(Point2D::new(8.7, 5.0)));
        // open space and inside the obstacle
        assert!(!fs.is_corner(Point2D::new(4.0, 5.0)));
        assert!(!fs.is_corner(Point2D::new(10.0, 5.0)));
    }
}
