//! Best-first wall-following search
//!
//! The frontier holds (node, action) pairs ordered by
//! `h(node, action) + h(action, goal) + cost(node)`. An action that can be
//! steered to grows the tree; one that cannot is split into tangent exit
//! points around the blocking obstacle, which are tried on later
//! iterations. Explored wedges are recorded as triangles: per node to
//! avoid re-proposing the same directions, and globally to prune any
//! candidate in space that has already been negotiated.

use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::config::NHPlannerConfig;
use super::corner_index::{CornerIndex, CornerKey};
use super::distance::{Distance, L2Distance, ThetaDistance};
use super::extender::Extender;
use super::free_space::{Follow, FreeSpaceMap, LineOfSight};
use super::open_list::OpenList;
use super::search::{Action, NodeId, SearchTree, StateKey, Triangle};
use crate::common::{
    OccupancyMap, Path2D, PathPlanner, PlanningError, Point2D, Pose2D, PoseStamped, RoboticsResult,
};

/// Diagnostics of a single planning request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanStats {
    /// Wall-clock time spent searching
    pub elapsed: Duration,
    /// Frontier pops
    pub iterations: usize,
    pub frontier_insertions: usize,
    /// Actions produced by splitting unreachable ones
    pub generated_actions: usize,
    /// Generated actions lying on an obstacle corner
    pub corner_actions: usize,
    /// Globally closed triangles
    pub global_regions: usize,
    pub tree_size: usize,
    /// Cost-to-come of the goal node
    pub path_length: f64,
    /// Squared heading change per unit length along the path
    pub roughness: f64,
}

/// A successful plan
#[derive(Debug, Clone)]
pub struct Plan {
    /// Dense path, every pose stamped with the request's start stamp
    pub poses: Vec<PoseStamped>,
    pub path: Path2D,
    pub stats: PlanStats,
}

/// Nonholonomic wall-following planner over a read-only occupancy map
pub struct NHPlanner<M: OccupancyMap> {
    free_space: FreeSpaceMap<M>,
    extender: Extender,
    config: NHPlannerConfig,
}

impl<M: OccupancyMap> NHPlanner<M> {
    pub fn new(map: M, config: NHPlannerConfig) -> RoboticsResult<Self> {
        config.validate()?;
        Ok(Self {
            free_space: FreeSpaceMap::new(map, config.free_space),
            extender: Extender::new(config.extender),
            config,
        })
    }

    pub fn with_defaults(map: M) -> Self {
        let config = NHPlannerConfig::default();
        Self {
            free_space: FreeSpaceMap::new(map, config.free_space),
            extender: Extender::new(config.extender),
            config,
        }
    }

    /// Replace the configuration; the old one is kept if `config` is invalid
    pub fn initialize(&mut self, config: NHPlannerConfig) -> RoboticsResult<()> {
        config.validate()?;
        self.free_space.set_config(config.free_space);
        self.extender = Extender::new(config.extender);
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &NHPlannerConfig {
        &self.config
    }

    pub fn free_space(&self) -> &FreeSpaceMap<M> {
        &self.free_space
    }

    /// Plan between two stamped poses; the returned poses carry the start
    /// stamp and the `map` frame
    pub fn make_plan(&self, start: &PoseStamped, goal: &PoseStamped) -> RoboticsResult<Plan> {
        let (path, stats) = self.search(start.pose.to_pose2d(), goal.pose.to_pose2d())?;
        let poses = path
            .poses
            .iter()
            .map(|p| PoseStamped::from_pose2d(*p, start.header.stamp))
            .collect();
        Ok(Plan { poses, path, stats })
    }

    fn search(&self, start: Pose2D, goal: Pose2D) -> Result<(Path2D, PlanStats), PlanningError> {
        if !self.free_space.is_free(start.position()) {
            tracing::warn!("Invalid start configuration {}", start);
            return Err(PlanningError::InvalidStart(start));
        }
        if !self.free_space.is_free(goal.position()) {
            tracing::warn!("Invalid goal configuration {}", goal);
            return Err(PlanningError::InvalidGoal(goal));
        }

        tracing::info!("Planning from {} to {}", start, goal);
        let t0 = Instant::now();
        let deadline = self.config.deadline();

        let mut session = SearchSession::new(self, start, goal);
        let outcome = session.run(t0 + deadline);
        session.stats.elapsed = t0.elapsed();
        session.stats.tree_size = session.tree.len();

        match outcome {
            Outcome::Reached(node) => {
                let path = Path2D::from_poses(session.tree.path_to(node));
                session.stats.path_length = session.tree[node].cost;
                session.stats.roughness = path.roughness();
                tracing::info!(
                    "Plan found: length {:.3} m, {} iterations, {} actions, {:?}",
                    session.stats.path_length,
                    session.stats.iterations,
                    session.stats.generated_actions,
                    session.stats.elapsed
                );
                Ok((path, session.stats))
            }
            Outcome::TimedOut => {
                tracing::warn!(
                    "Deadline of {:?} exceeded after {} iterations",
                    deadline,
                    session.stats.iterations
                );
                Err(PlanningError::Timeout { deadline, stats: session.stats })
            }
            Outcome::Exhausted => {
                tracing::debug!("Frontier exhausted after {} iterations", session.stats.iterations);
                Err(PlanningError::NoPath { stats: session.stats })
            }
        }
    }
}

impl<M: OccupancyMap> PathPlanner for NHPlanner<M> {
    fn plan(&self, start: Pose2D, goal: Pose2D) -> RoboticsResult<Path2D> {
        Ok(self.search(start, goal)?.0)
    }
}

enum Outcome {
    Reached(NodeId),
    Exhausted,
    TimedOut,
}

/// Mutable state of one planning request, dropped when it returns
struct SearchSession<'a, M: OccupancyMap> {
    free_space: &'a FreeSpaceMap<M>,
    extender: &'a Extender,
    config: &'a NHPlannerConfig,
    target: Action,
    tree: SearchTree,
    open: OpenList,
    reached: HashMap<StateKey, NodeId>,
    global_closed: Vec<Triangle>,
    corners: CornerIndex<L2Distance>,
    corner_samples: HashMap<CornerKey, Vec<Pose2D>>,
    rng: StdRng,
    stats: PlanStats,
}

impl<'a, M: OccupancyMap> SearchSession<'a, M> {
    fn new(planner: &'a NHPlanner<M>, start: Pose2D, goal: Pose2D) -> Self {
        let rng = match planner.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut session = Self {
            free_space: &planner.free_space,
            extender: &planner.extender,
            config: &planner.config,
            target: Action::goal(goal),
            tree: SearchTree::new(),
            open: OpenList::new(),
            reached: HashMap::new(),
            global_closed: Vec::new(),
            corners: CornerIndex::new(L2Distance),
            corner_samples: HashMap::new(),
            rng,
            stats: PlanStats::default(),
        };

        let root = session.tree.add_root(start);
        session.add_open(root, session.target.clone());
        session.tree[root].add_subgoal(&goal);
        session.reached.insert(StateKey::from(&start), root);
        session.corners.insert(goal);
        session
    }

    fn goal(&self) -> Pose2D {
        self.target.state
    }

    fn run(&mut self, deadline: Instant) -> Outcome {
        while !self.open.is_empty() {
            if Instant::now() >= deadline {
                return Outcome::TimedOut;
            }
            let Some((node, action)) = self.open.pop() else {
                break;
            };
            self.stats.iterations += 1;

            if self.is_reached(&self.tree[node].state) {
                return Outcome::Reached(node);
            }
            tracing::trace!(
                iteration = self.stats.iterations,
                node = node.index(),
                "expanding towards {}",
                action.state
            );
            self.expand(node, action);
        }
        Outcome::Exhausted
    }

    fn is_reached(&self, state: &Pose2D) -> bool {
        let goal = self.goal();
        L2Distance.distance(state, &goal) < self.config.delta_x
            && ThetaDistance.distance(state, &goal) < self.config.delta_theta
    }

    fn expand(&mut self, node: NodeId, action: Action) {
        let goal = self.goal();
        let current = self.tree[node].state;

        let mut theta = action.state.yaw;
        let samples = if action.state == goal {
            vec![goal]
        } else if action.corner {
            theta = current.position().bearing_to(&action.state.position());
            self.corner_samples
                .get(&CornerKey::from(&action.state))
                .cloned()
                .unwrap_or_else(|| vec![action.state])
        } else {
            vec![action.state]
        };

        let mut improve = true;
        for c in samples {
            let sample = if c == goal {
                c
            } else {
                c.with_yaw(self.config.angle_sampling.sample(theta, &mut self.rng))
            };
            if let Some(new_node) = self.reach(node, &sample) {
                let p = action.parent_or_self();
                if !self.tree[new_node].contains(&p.state) {
                    let parent = p.as_subgoal();
                    let state = parent.state;
                    self.add_open(new_node, parent);
                    self.tree[new_node].add_subgoal(&state);
                }
                improve = false;
            }
        }

        if improve {
            let mut triangles = Vec::new();
            let actions = self.find_action(node, &action, &mut triangles);
            for a in actions {
                if a.state == action.state {
                    continue;
                }
                self.stats.generated_actions += 1;
                self.add_open(node, a.clone());

                if a.corner {
                    self.stats.corner_actions += 1;
                    let corner = match self.corners.find_within(&a.state, self.config.delta_x) {
                        Some(nearest) => a.with_state(nearest),
                        None => {
                            self.corners.insert(a.state);
                            let bearing = current.position().bearing_to(&a.state.position());
                            self.sample_corner(a.state.with_yaw(bearing), a.clockwise);
                            a
                        }
                    };
                    self.add_subgoal(node, &corner);
                }
            }
            for t in triangles {
                self.tree[node].add_triangle(t);
            }
        } else {
            let parent = action.parent_or_self();
            self.add_global(current.position(), action.state.position(), parent.state.position());
            self.tree[node].add_subgoal(&action.state);
        }
    }

    /// Steer from `node` to `sample`, growing the tree unless the reached
    /// configuration is already known
    fn reach(&mut self, node: NodeId, sample: &Pose2D) -> Option<NodeId> {
        let steer = self.extender.steer(self.free_space.map(), &self.tree[node].state, sample)?;
        let key = StateKey::from(&steer.state);
        if let Some(&existing) = self.reached.get(&key) {
            return Some(existing);
        }

        let goal = self.goal();
        let id = self.tree.add_child(node, steer.state, steer.cost, steer.primitives);
        self.reached.insert(key, id);
        self.add_open(id, self.target.clone());
        self.tree[id].add_subgoal(&goal);
        Some(id)
    }

    fn push(&mut self, node: NodeId, action: Action) {
        let goal = self.goal();
        let n = &self.tree[node];
        let h = L2Distance.distance(&n.state, &action.state) + L2Distance.distance(&action.state, &goal);
        let priority = h + n.cost;
        self.open.insert(node, action, priority);
        self.stats.frontier_insertions += 1;
    }

    /// Frontier insertion, skipping targets in explored space
    fn add_open(&mut self, node: NodeId, action: Action) {
        if action.state != self.goal() && self.inside_global(&action.state) {
            return;
        }
        if self.tree[node].inside_area(&action.state) {
            return;
        }
        self.push(node, action);
    }

    /// Offer `action` to up to `k_ancestors` ancestors of `node`
    fn add_subgoal(&mut self, node: NodeId, action: &Action) {
        if self.inside_global(&action.state) {
            return;
        }
        let subgoal = action.as_subgoal();
        let mut ancestor = self.tree.parent_of(node);
        for _ in 0..self.config.k_ancestors {
            if self.tree[ancestor].contains(&subgoal.state) {
                break;
            }
            if !self.tree[ancestor].inside_area(&subgoal.state) {
                self.push(ancestor, subgoal.clone());
            }
            self.tree[ancestor].add_subgoal(&subgoal.state);
            ancestor = self.tree.parent_of(ancestor);
        }
    }

    fn inside_global(&self, state: &Pose2D) -> bool {
        let p = state.position();
        self.global_closed.iter().any(|t| t.contains(p))
    }

    /// Close the wedge between a node, the action it reached and that
    /// action's parent
    fn add_global(&mut self, node: Point2D, action: Point2D, parent: Point2D) {
        if let LineOfSight::Blocked { exit, .. } = self.free_space.collision_points(node, action) {
            if exit.distance(&action) > self.config.delta_x {
                return;
            }
        }
        let p = match self.free_space.collision_points(node, parent) {
            LineOfSight::Blocked { entry, exit } => self.free_space.compute_middle(entry, exit),
            LineOfSight::Clear => parent,
        };
        self.global_closed.push(Triangle::new(node, action, p));
        self.stats.global_regions += 1;
    }

    fn create_triangle(&self, action: &Action, n: Point2D) -> Triangle {
        let mut p = action.parent_or_self().state.position();
        if let LineOfSight::Blocked { entry, exit } = self.free_space.collision_points(n, p) {
            p = self.free_space.compute_middle(entry, exit);
        }
        Triangle::new(action.state.position(), n, p)
    }

    /// Split an unreachable action into the tangent exit points of the
    /// obstacle between `node` and the action's target
    fn find_action(&self, node: NodeId, action: &Action, triangles: &mut Vec<Triangle>) -> Vec<Action> {
        let fs = self.free_space;
        let n = self.tree[node].state.position();
        let a = action.state.position();

        let mut follow = false;
        let (entry, exit) = match fs.collision_points(a, n) {
            LineOfSight::Blocked { entry, exit } => (entry, exit),
            LineOfSight::Clear => {
                triangles.push(self.create_triangle(action, n));
                match fs.follow_obstacle(n, a) {
                    Follow::Clear(p) => {
                        let state = Pose2D::from_point(p, n.bearing_to(&p));
                        return vec![Action::new(state, action.clockwise, false, true, action.parent_link())];
                    }
                    Follow::Blocked { entry, exit } => {
                        follow = true;
                        (entry, exit)
                    }
                    Follow::Lost => return Vec::new(),
                }
            }
        };

        let step = self.config.resample_step;
        let mut sample = action.subgoal;
        if !follow && entry.distance(&a) > step && exit.distance(&a) > step {
            sample = true;
        }
        let middle = fs.compute_middle(entry, exit);
        let parent = if sample { Some(Rc::new(action.clone())) } else { action.parent_link() };

        let mut actions = Vec::new();
        let mut vertices = Vec::new();
        for clockwise in [true, false] {
            if action.clockwise != clockwise && !sample {
                continue;
            }
            let Some(p) = fs.exit_point(n, middle, clockwise) else {
                continue;
            };
            vertices.push(p);
            if fs.inside_bounds(p) {
                let state = Pose2D::from_point(p, n.bearing_to(&p));
                actions.push(Action::new(state, clockwise, false, fs.is_corner(p), parent.clone()));
            }
        }

        if sample && vertices.len() == 2 && vertices[0] != vertices[1] {
            triangles.push(Triangle::new(a, vertices[0], vertices[1]));
        }
        actions
    }

    /// Cache up to `k` free configurations around a new corner. Whatever was
    /// found within the retry cap is kept; the bare corner only when nothing was.
    fn sample_corner(&mut self, corner: Pose2D, clockwise: bool) {
        let k = self.config.k;
        let mut samples = Vec::with_capacity(k);
        for _ in 0..self.config.max_corner_retries {
            if samples.len() >= k {
                break;
            }
            let s = self.config.position_sampling.sample(&corner, clockwise, &mut self.rng);
            if self.free_space.is_free(s.position()) {
                samples.push(s);
            }
        }
        if samples.is_empty() {
            tracing::debug!("No free sample around corner {}, using the corner itself", corner);
            samples.push(corner);
        }
        self.corner_samples.insert(CornerKey::from(&corner), samples);
    }
}
