//! Reeds-Shepp curves
//!
//! Shortest paths for a car-like robot that may drive forward and backward
//! with a bounded curvature. Every candidate word (LSL, LSR, L|R|L, ...) is
//! generated together with its time-flipped and reflected variants and
//! sampled into dense poses.
//!
//! Reference: J. A. Reeds and L. A. Shepp, "Optimal paths for a car that
//! goes both forwards and backwards", 1990. Ported from PythonRobotics.

use std::f64::consts::PI;

use crate::common::{normalize_angle, Pose2D};

/// Motion along one segment of a Reeds-Shepp word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Steering {
    Left,
    Straight,
    Right,
}

impl Steering {
    fn reflected(self) -> Self {
        match self {
            Steering::Left => Steering::Right,
            Steering::Right => Steering::Left,
            Steering::Straight => Steering::Straight,
        }
    }
}

use Steering::{Left as L, Right as R, Straight as S};

/// A sampled Reeds-Shepp path in world coordinates
#[derive(Debug, Clone)]
pub struct ReedsSheppPath {
    /// Signed segment lengths [m]; negative means driving backward
    pub lengths: Vec<f64>,
    pub ctypes: Vec<Steering>,
    /// Total length [m]
    pub l: f64,
    /// Sampled poses, first one at the start configuration
    pub poses: Vec<Pose2D>,
    /// +1 forward / -1 backward for each sampled pose
    pub directions: Vec<i32>,
}

impl ReedsSheppPath {
    fn new(lengths: Vec<f64>, ctypes: Vec<Steering>) -> Self {
        let l = lengths.iter().map(|x| x.abs()).sum();
        ReedsSheppPath {
            lengths,
            ctypes,
            l,
            poses: Vec::new(),
            directions: Vec::new(),
        }
    }
}

type Word = Option<(Vec<f64>, Vec<Steering>)>;

fn mod2pi(x: f64) -> f64 {
    let v = x % (2.0 * PI);
    if v < -PI {
        v + 2.0 * PI
    } else if v > PI {
        v - 2.0 * PI
    } else {
        v
    }
}

fn polar(x: f64, y: f64) -> (f64, f64) {
    let r = (x * x + y * y).sqrt();
    let theta = y.atan2(x);
    (r, theta)
}

fn left_straight_left(x: f64, y: f64, phi: f64) -> Word {
    let (u, t) = polar(x - phi.sin(), y - 1.0 + phi.cos());
    if (0.0..=PI).contains(&t) {
        let v = mod2pi(phi - t);
        if (0.0..=PI).contains(&v) {
            return Some((vec![t, u, v], vec![L, S, L]));
        }
    }
    None
}

fn left_straight_right(x: f64, y: f64, phi: f64) -> Word {
    let (u1, t1) = polar(x + phi.sin(), y - 1.0 - phi.cos());
    let u1_sq = u1 * u1;
    if u1_sq >= 4.0 {
        let u = (u1_sq - 4.0).sqrt();
        let theta = 2.0_f64.atan2(u);
        let t = mod2pi(t1 + theta);
        let v = mod2pi(t - phi);
        if t >= 0.0 && v >= 0.0 {
            return Some((vec![t, u, v], vec![L, S, R]));
        }
    }
    None
}

fn left_x_right_x_left(x: f64, y: f64, phi: f64) -> Word {
    let (u1, theta) = polar(x - phi.sin(), y - 1.0 + phi.cos());
    if u1 <= 4.0 {
        let a = (0.25 * u1).acos();
        let t = mod2pi(a + theta + PI / 2.0);
        let u = mod2pi(PI - 2.0 * a);
        let v = mod2pi(phi - t - u);
        return Some((vec![t, -u, v], vec![L, R, L]));
    }
    None
}

fn left_x_right_left(x: f64, y: f64, phi: f64) -> Word {
    let (u1, theta) = polar(x - phi.sin(), y - 1.0 + phi.cos());
    if u1 <= 4.0 {
        let a = (0.25 * u1).acos();
        let t = mod2pi(a + theta + PI / 2.0);
        let u = mod2pi(PI - 2.0 * a);
        let v = mod2pi(-phi + t + u);
        return Some((vec![t, -u, -v], vec![L, R, L]));
    }
    None
}

fn left_right_x_left(x: f64, y: f64, phi: f64) -> Word {
    let (u1, theta) = polar(x - phi.sin(), y - 1.0 + phi.cos());
    if u1 <= 4.0 {
        let u = (1.0 - u1 * u1 * 0.125).acos();
        let a = (2.0 * u.sin() / u1).asin();
        let t = mod2pi(-a + theta + PI / 2.0);
        let v = mod2pi(t - u - phi);
        return Some((vec![t, u, -v], vec![L, R, L]));
    }
    None
}

fn left_right_x_left_right(x: f64, y: f64, phi: f64) -> Word {
    let (u1, theta) = polar(x + phi.sin(), y - 1.0 - phi.cos());
    if u1 <= 2.0 {
        let a = ((u1 + 2.0) * 0.25).acos();
        let t = mod2pi(theta + a + PI / 2.0);
        let u = mod2pi(a);
        let v = mod2pi(phi - t + 2.0 * u);
        if t >= 0.0 && u >= 0.0 && v >= 0.0 {
            return Some((vec![t, u, -u, -v], vec![L, R, L, R]));
        }
    }
    None
}

fn left_x_right_left_x_right(x: f64, y: f64, phi: f64) -> Word {
    let (u1, theta) = polar(x + phi.sin(), y - 1.0 - phi.cos());
    let u2 = (20.0 - u1 * u1) / 16.0;
    if (0.0..=1.0).contains(&u2) {
        let u = u2.acos();
        let a = (2.0 * u.sin() / u1).asin();
        let t = mod2pi(theta + a + PI / 2.0);
        let v = mod2pi(t - phi);
        if t >= 0.0 && v >= 0.0 {
            return Some((vec![t, -u, -u, v], vec![L, R, L, R]));
        }
    }
    None
}

fn left_x_right90_straight_left(x: f64, y: f64, phi: f64) -> Word {
    let (u1, theta) = polar(x - phi.sin(), y - 1.0 + phi.cos());
    if u1 >= 2.0 {
        let u = (u1 * u1 - 4.0).sqrt() - 2.0;
        let a = 2.0_f64.atan2((u1 * u1 - 4.0).sqrt());
        let t = mod2pi(theta + a + PI / 2.0);
        let v = mod2pi(t - phi + PI / 2.0);
        if t >= 0.0 && v >= 0.0 {
            return Some((vec![t, -PI / 2.0, -u, -v], vec![L, R, S, L]));
        }
    }
    None
}

fn left_straight_right90_x_left(x: f64, y: f64, phi: f64) -> Word {
    let (u1, theta) = polar(x - phi.sin(), y - 1.0 + phi.cos());
    if u1 >= 2.0 {
        let u = (u1 * u1 - 4.0).sqrt() - 2.0;
        let a = (u1 * u1 - 4.0).sqrt().atan2(2.0);
        let t = mod2pi(theta - a + PI / 2.0);
        let v = mod2pi(t - phi - PI / 2.0);
        if t >= 0.0 && v >= 0.0 {
            return Some((vec![t, u, PI / 2.0, -v], vec![L, S, R, L]));
        }
    }
    None
}

fn left_x_right90_straight_right(x: f64, y: f64, phi: f64) -> Word {
    let (u1, theta) = polar(x + phi.sin(), y - 1.0 - phi.cos());
    if u1 >= 2.0 {
        let t = mod2pi(theta + PI / 2.0);
        let u = u1 - 2.0;
        let v = mod2pi(phi - t - PI / 2.0);
        if t >= 0.0 && v >= 0.0 {
            return Some((vec![t, -PI / 2.0, -u, -v], vec![L, R, S, R]));
        }
    }
    None
}

fn left_straight_left90_x_right(x: f64, y: f64, phi: f64) -> Word {
    let (u1, theta) = polar(x + phi.sin(), y - 1.0 - phi.cos());
    if u1 >= 2.0 {
        let t = mod2pi(theta);
        let u = u1 - 2.0;
        let v = mod2pi(phi - t - PI / 2.0);
        if t >= 0.0 && v >= 0.0 {
            return Some((vec![t, u, PI / 2.0, -v], vec![L, S, L, R]));
        }
    }
    None
}

fn left_x_right90_straight_left90_x_right(x: f64, y: f64, phi: f64) -> Word {
    let (u1, theta) = polar(x + phi.sin(), y - 1.0 - phi.cos());
    if u1 >= 4.0 {
        let u = (u1 * u1 - 4.0).sqrt() - 4.0;
        let a = 2.0_f64.atan2((u1 * u1 - 4.0).sqrt());
        let t = mod2pi(theta + a + PI / 2.0);
        let v = mod2pi(t - phi);
        if t >= 0.0 && v >= 0.0 {
            return Some((vec![t, -PI / 2.0, -u, -PI / 2.0, v], vec![L, R, S, L, R]));
        }
    }
    None
}

fn timeflip(travel_distances: Vec<f64>) -> Vec<f64> {
    travel_distances.iter().map(|x| -x).collect()
}

fn reflect(steering_directions: Vec<Steering>) -> Vec<Steering> {
    steering_directions.into_iter().map(Steering::reflected).collect()
}

fn set_path(paths: &mut Vec<ReedsSheppPath>, lengths: Vec<f64>, ctypes: Vec<Steering>, step_size: f64) {
    let path = ReedsSheppPath::new(lengths, ctypes);

    // Check if same path exists
    let duplicate = paths
        .iter()
        .any(|p| p.ctypes == path.ctypes && (p.l - path.l).abs() <= step_size);
    if duplicate {
        return;
    }

    // Check path is long enough
    if path.l <= step_size {
        return;
    }

    paths.push(path);
}

/// Candidate words in the start frame, normalized by the curvature
fn generate_path(q0: &Pose2D, q1: &Pose2D, max_curvature: f64, step_size: f64) -> Vec<ReedsSheppPath> {
    let dx = q1.x - q0.x;
    let dy = q1.y - q0.y;
    let dth = q1.yaw - q0.yaw;
    let c = q0.yaw.cos();
    let s = q0.yaw.sin();
    let x = (c * dx + s * dy) * max_curvature;
    let y = (-s * dx + c * dy) * max_curvature;
    let step_size = step_size * max_curvature;

    let mut paths = Vec::new();

    let path_functions: [fn(f64, f64, f64) -> Word; 12] = [
        left_straight_left,
        left_straight_right,
        left_x_right_x_left,
        left_x_right_left,
        left_right_x_left,
        left_right_x_left_right,
        left_x_right_left_x_right,
        left_x_right90_straight_left,
        left_x_right90_straight_right,
        left_straight_right90_x_left,
        left_straight_left90_x_right,
        left_x_right90_straight_left90_x_right,
    ];

    for path_func in path_functions {
        if let Some((lengths, ctypes)) = path_func(x, y, dth) {
            set_path(&mut paths, lengths, ctypes, step_size);
        }
        if let Some((lengths, ctypes)) = path_func(-x, y, -dth) {
            set_path(&mut paths, timeflip(lengths), ctypes, step_size);
        }
        if let Some((lengths, ctypes)) = path_func(x, -y, -dth) {
            set_path(&mut paths, lengths, reflect(ctypes), step_size);
        }
        if let Some((lengths, ctypes)) = path_func(-x, -y, dth) {
            set_path(&mut paths, timeflip(lengths), reflect(ctypes), step_size);
        }
    }

    paths.retain(|p| p.lengths.iter().all(|l| l.is_finite()));
    paths
}

fn calc_interpolate_dists_list(lengths: &[f64], step_size: f64) -> Vec<Vec<f64>> {
    lengths
        .iter()
        .map(|&length| {
            let d_dist = if length >= 0.0 { step_size } else { -step_size };
            let mut interp_dists = Vec::new();
            let mut current = 0.0;
            while (length >= 0.0 && current < length) || (length < 0.0 && current > length) {
                interp_dists.push(current);
                current += d_dist;
            }
            interp_dists.push(length);
            interp_dists
        })
        .collect()
}

fn interpolate(dist: f64, length: f64, mode: Steering, max_curvature: f64, origin: &Pose2D) -> (Pose2D, i32) {
    let direction = if length >= 0.0 { 1 } else { -1 };

    if mode == Steering::Straight {
        let x = origin.x + dist / max_curvature * origin.yaw.cos();
        let y = origin.y + dist / max_curvature * origin.yaw.sin();
        return (Pose2D::new(x, y, origin.yaw), direction);
    }

    let ldx = dist.sin() / max_curvature;
    let (ldy, yaw) = match mode {
        Steering::Left => ((1.0 - dist.cos()) / max_curvature, origin.yaw + dist),
        _ => ((1.0 - dist.cos()) / -max_curvature, origin.yaw - dist),
    };

    let gdx = (-origin.yaw).cos() * ldx + (-origin.yaw).sin() * ldy;
    let gdy = -(-origin.yaw).sin() * ldx + (-origin.yaw).cos() * ldy;

    (Pose2D::new(origin.x + gdx, origin.y + gdy, yaw), direction)
}

fn generate_local_course(
    lengths: &[f64],
    modes: &[Steering],
    max_curvature: f64,
    step_size: f64,
) -> (Vec<Pose2D>, Vec<i32>) {
    let interpolate_dists_list = calc_interpolate_dists_list(lengths, step_size * max_curvature);

    let mut origin = Pose2D::origin();
    let mut poses: Vec<Pose2D> = Vec::new();
    let mut directions = Vec::new();

    for ((interp_dists, &mode), &length) in interpolate_dists_list.iter().zip(modes).zip(lengths) {
        for &dist in interp_dists {
            let (pose, direction) = interpolate(dist, length, mode, max_curvature, &origin);
            poses.push(pose);
            directions.push(direction);
        }
        if let Some(last) = poses.last() {
            origin = *last;
        }
    }

    (poses, directions)
}

/// All Reeds-Shepp paths from `start` to `goal`, sampled every `step_size`
/// metres of arc length, in world coordinates.
///
/// Consecutive duplicate samples at segment junctions are removed. Coinciding
/// start and goal give no path.
pub fn calc_paths(start: &Pose2D, goal: &Pose2D, max_curvature: f64, step_size: f64) -> Vec<ReedsSheppPath> {
    if start.position().distance(&goal.position()) < 1e-9 && normalize_angle(goal.yaw - start.yaw).abs() < 1e-9 {
        return Vec::new();
    }
    let mut paths = generate_path(start, goal, max_curvature, step_size);
    let (c, s) = (start.yaw.cos(), start.yaw.sin());

    for path in &mut paths {
        let (local, directions) = generate_local_course(&path.lengths, &path.ctypes, max_curvature, step_size);

        // Convert to global coordinate
        let mut poses: Vec<Pose2D> = Vec::with_capacity(local.len());
        let mut dirs = Vec::with_capacity(local.len());
        for (p, d) in local.into_iter().zip(directions) {
            let pose = Pose2D::new(
                c * p.x - s * p.y + start.x,
                s * p.x + c * p.y + start.y,
                normalize_angle(p.yaw + start.yaw),
            );
            let repeated = poses
                .last()
                .map_or(false, |q| q.position().distance(&pose.position()) < 1e-9);
            if !repeated {
                poses.push(pose);
                dirs.push(d);
            }
        }

        path.poses = poses;
        path.directions = dirs;
        path.lengths = path.lengths.iter().map(|&length| length / max_curvature).collect();
        path.l /= max_curvature;
    }

    paths
}

/// Shortest Reeds-Shepp path, if any
pub fn reeds_shepp_path_planning(
    start: &Pose2D,
    goal: &Pose2D,
    max_curvature: f64,
    step_size: f64,
) -> Option<ReedsSheppPath> {
    calc_paths(start, goal, max_curvature, step_size)
        .into_iter()
        .min_by(|a, b| a.l.total_cmp(&b.l))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ends_at(path: &ReedsSheppPath, goal: &Pose2D) -> bool {
        path.poses.last().map_or(false, |p| {
            p.position().distance(&goal.position()) < 1e-6
                && normalize_angle(p.yaw - goal.yaw).abs() < 1e-6
        })
    }

    #[test]
    fn test_straight_line_is_shortest() {
        let start = Pose2D::new(0.0, 0.0, 0.0);
        let goal = Pose2D::new(10.0, 0.0, 0.0);
        let path = reeds_shepp_path_planning(&start, &goal, 1.0, 0.1).unwrap();

        assert_relative_eq!(path.l, 10.0, epsilon = 1e-6);
        assert!(ends_at(&path, &goal));
        assert!(path.directions.iter().all(|&d| d == 1));
    }

    #[test]
    fn test_samples_are_dense() {
        let start = Pose2D::new(1.0, 2.0, 0.3);
        let goal = Pose2D::new(-3.0, 5.0, 2.0);
        let step = 0.05;
        let path = reeds_shepp_path_planning(&start, &goal, 2.0, step).unwrap();

        assert_relative_eq!(path.poses[0].x, start.x, epsilon = 1e-9);
        assert_relative_eq!(path.poses[0].y, start.y, epsilon = 1e-9);
        for w in path.poses.windows(2) {
            assert!(w[0].position().distance(&w[1].position()) <= step + 1e-9);
        }
    }

    #[test]
    fn test_shortest_path_reaches_goal_pose() {
        let start = Pose2D::new(0.0, 0.0, 0.0);
        for goal in [
            Pose2D::new(5.0, 3.0, 1.0),
            Pose2D::new(-2.0, 1.0, -2.5),
            Pose2D::new(0.5, -4.0, PI / 2.0),
        ] {
            let path = reeds_shepp_path_planning(&start, &goal, 1.0, 0.1).unwrap();
            assert!(ends_at(&path, &goal), "path to {} ends at {:?}", goal, path.poses.last());
        }
    }

    #[test]
    fn test_identical_poses_have_no_path() {
        let pose = Pose2D::new(1.0, 1.0, 0.5);
        assert!(reeds_shepp_path_planning(&pose, &pose, 1.0, 0.1).is_none());
        assert!(calc_paths(&pose, &pose, 2.0, 0.05).is_empty());
    }
}
