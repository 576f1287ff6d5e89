//! Search data model: proposed actions, reached tree nodes and the
//! triangular free-space regions used for pruning.
//!
//! Tree nodes live in an arena ([`SearchTree`]) and refer to their parent by
//! index. Actions form converging ancestry chains, so their parent links are
//! shared through `Rc`.

use std::collections::HashSet;
use std::ops::{Index, IndexMut};
use std::rc::Rc;

use ordered_float::OrderedFloat;

use crate::common::{Point2D, Pose2D};

/// Exact lookup key of a configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateKey([OrderedFloat<f64>; 3]);

impl From<&Pose2D> for StateKey {
    fn from(p: &Pose2D) -> Self {
        StateKey([OrderedFloat(p.x), OrderedFloat(p.y), OrderedFloat(p.yaw)])
    }
}

/// A target configuration the search wants to connect to
#[derive(Debug, Clone)]
pub struct Action {
    pub state: Pose2D,
    /// Wall-following side
    pub clockwise: bool,
    /// Re-offered after being pruned or propagated
    pub subgoal: bool,
    /// Lies on a detected obstacle corner
    pub corner: bool,
    parent: Option<Rc<Action>>,
}

impl Action {
    pub fn new(
        state: Pose2D,
        clockwise: bool,
        subgoal: bool,
        corner: bool,
        parent: Option<Rc<Action>>,
    ) -> Self {
        Self { state, clockwise, subgoal, corner, parent }
    }

    /// Terminal action wrapping the goal configuration. Both wall-following
    /// sides are explored around the first obstacle met on the way.
    pub fn goal(state: Pose2D) -> Self {
        Self::new(state, true, true, false, None)
    }

    pub fn parent(&self) -> Option<&Rc<Action>> {
        self.parent.as_ref()
    }

    /// Shared link to this action's parent, to hand to a derived action
    pub fn parent_link(&self) -> Option<Rc<Action>> {
        self.parent.clone()
    }

    /// The parent action, or this action when it has no ancestor
    pub fn parent_or_self(&self) -> Action {
        match &self.parent {
            Some(p) => (**p).clone(),
            None => self.clone(),
        }
    }

    /// Same target, side and ancestry, re-offered as a subgoal
    pub fn as_subgoal(&self) -> Action {
        Action { subgoal: true, ..self.clone() }
    }

    pub fn with_state(&self, state: Pose2D) -> Action {
        Action { state, ..self.clone() }
    }

    /// Number of ancestors above this action
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent.as_deref();
        while let Some(p) = current {
            depth += 1;
            current = p.parent.as_deref();
        }
        depth
    }
}

/// Three points delimiting a wedge of free space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: Point2D,
    pub b: Point2D,
    pub c: Point2D,
}

impl Triangle {
    const EPS: f64 = 1e-9;

    pub fn new(a: Point2D, b: Point2D, c: Point2D) -> Self {
        Self { a, b, c }
    }

    fn cross(o: Point2D, p: Point2D, q: Point2D) -> f64 {
        (p.x - o.x) * (q.y - o.y) - (p.y - o.y) * (q.x - o.x)
    }

    pub fn area(&self) -> f64 {
        0.5 * Self::cross(self.a, self.b, self.c).abs()
    }

    /// Strict interior test; points on an edge and degenerate triangles
    /// contain nothing
    pub fn contains(&self, p: Point2D) -> bool {
        let d1 = Self::cross(self.a, self.b, p);
        let d2 = Self::cross(self.b, self.c, p);
        let d3 = Self::cross(self.c, self.a, p);
        (d1 > Self::EPS && d2 > Self::EPS && d3 > Self::EPS)
            || (d1 < -Self::EPS && d2 < -Self::EPS && d3 < -Self::EPS)
    }
}

/// Index of a node in its [`SearchTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A configuration reached by a feasible steer
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub state: Pose2D,
    /// Cost-to-come from the root
    pub cost: f64,
    parent: Option<NodeId>,
    /// Intermediate configurations of the steer from the parent, excluding
    /// both endpoints
    pub primitives: Vec<Pose2D>,
    subgoals: HashSet<StateKey>,
    triangles: Vec<Triangle>,
}

impl TreeNode {
    fn new(state: Pose2D, cost: f64, parent: Option<NodeId>, primitives: Vec<Pose2D>) -> Self {
        Self {
            state,
            cost,
            parent,
            primitives,
            subgoals: HashSet::new(),
            triangles: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Whether `state` was already proposed from this node
    pub fn contains(&self, state: &Pose2D) -> bool {
        self.subgoals.contains(&StateKey::from(state))
    }

    pub fn add_subgoal(&mut self, state: &Pose2D) {
        self.subgoals.insert(StateKey::from(state));
    }

    /// Whether `state` falls in space already explored around this node
    pub fn inside_area(&self, state: &Pose2D) -> bool {
        let p = state.position();
        self.triangles.iter().any(|t| t.contains(p))
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }
}

/// Arena owning every node reached during one search
#[derive(Debug, Default)]
pub struct SearchTree {
    nodes: Vec<TreeNode>,
}

impl SearchTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the zero-cost root
    pub fn add_root(&mut self, state: Pose2D) -> NodeId {
        self.push(TreeNode::new(state, 0.0, None, Vec::new()))
    }

    /// Insert a node reached from `parent` at `cost_increment` more cost
    pub fn add_child(
        &mut self,
        parent: NodeId,
        state: Pose2D,
        cost_increment: f64,
        primitives: Vec<Pose2D>,
    ) -> NodeId {
        let cost = self[parent].cost + cost_increment.max(0.0);
        self.push(TreeNode::new(state, cost, Some(parent), primitives))
    }

    fn push(&mut self, node: TreeNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn root(&self) -> Option<NodeId> {
        (!self.nodes.is_empty()).then_some(NodeId(0))
    }

    /// Parent of `id`; the root is its own parent
    pub fn parent_of(&self, id: NodeId) -> NodeId {
        self[id].parent.unwrap_or(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &TreeNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Dense root-to-`id` sequence of configurations including the motion
    /// primitives between nodes
    pub fn path_to(&self, id: NodeId) -> Vec<Pose2D> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self[current].parent {
            let node = &self[current];
            path.push(node.state);
            path.extend(node.primitives.iter().rev().copied());
            current = parent;
        }
        path.push(self[current].state);
        path.reverse();
        path
    }
}

impl Index<NodeId> for SearchTree {
    type Output = TreeNode;

    fn index(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }
}

impl IndexMut<NodeId> for SearchTree {
    fn index_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_goal_action_is_its_own_parent() {
        let goal = Action::goal(Pose2D::new(5.0, 0.0, 0.0));
        assert!(goal.parent().is_none());
        assert!(goal.clockwise && goal.subgoal && !goal.corner);
        assert_eq!(goal.parent_or_self().state, goal.state);
        assert_eq!(goal.depth(), 0);
    }

    #[test]
    fn test_actions_share_ancestry() {
        let root = Rc::new(Action::goal(Pose2D::new(5.0, 0.0, 0.0)));
        let a = Action::new(Pose2D::new(1.0, 1.0, 0.0), true, false, true, Some(Rc::clone(&root)));
        let b = Action::new(Pose2D::new(1.0, -1.0, 0.0), false, false, true, a.parent_link());
        assert_eq!(Rc::strong_count(&root), 3);
        assert_eq!(b.parent_or_self().state, root.state);

        let c = Action::new(Pose2D::new(2.0, 1.0, 0.0), true, false, false, Some(Rc::new(a.clone())));
        assert_eq!(c.depth(), 2);
        assert!(c.as_subgoal().subgoal);
        assert_eq!(c.as_subgoal().depth(), 2);

        // snapping a corner onto a known one keeps side, flags and ancestry
        let snapped = a.with_state(Pose2D::new(1.1, 0.9, 0.0));
        assert_eq!(snapped.state, Pose2D::new(1.1, 0.9, 0.0));
        assert!(snapped.clockwise && snapped.corner && !snapped.subgoal);
        assert_eq!(Rc::strong_count(&root), 5);
    }

    #[test]
    fn test_triangle_contains_interior_only() {
        let t = Triangle::new(Point2D::new(0.0, 0.0), Point2D::new(4.0, 0.0), Point2D::new(0.0, 4.0));
        assert_relative_eq!(t.area(), 8.0);
        assert!(t.contains(Point2D::new(1.0, 1.0)));
        assert!(!t.contains(Point2D::new(2.0, 0.0)));
        assert!(!t.contains(Point2D::new(3.0, 3.0)));

        // clockwise vertex order works too
        let r = Triangle::new(Point2D::new(0.0, 0.0), Point2D::new(0.0, 4.0), Point2D::new(4.0, 0.0));
        assert!(r.contains(Point2D::new(1.0, 1.0)));
    }

    #[test]
    fn test_degenerate_triangle_contains_nothing() {
        let p = Point2D::new(1.0, 1.0);
        let t = Triangle::new(Point2D::new(0.0, 0.0), Point2D::new(2.0, 2.0), p);
        assert!(!t.contains(Point2D::new(0.5, 0.5)));
        assert!(!t.contains(p));
    }

    #[test]
    fn test_tree_costs_and_path_reconstruction() {
        let mut tree = SearchTree::new();
        let root = tree.add_root(Pose2D::new(0.0, 0.0, 0.0));
        let a = tree.add_child(
            root,
            Pose2D::new(1.0, 0.0, 0.0),
            1.0,
            vec![Pose2D::new(0.5, 0.0, 0.0)],
        );
        let b = tree.add_child(
            a,
            Pose2D::new(2.0, 0.0, 0.0),
            1.0,
            vec![Pose2D::new(1.25, 0.0, 0.0), Pose2D::new(1.5, 0.0, 0.0)],
        );

        assert_eq!(tree.root(), Some(root));
        assert_eq!(tree.parent_of(root), root);
        assert_eq!(tree.parent_of(b), a);
        assert_relative_eq!(tree[b].cost, 2.0);
        assert!(tree[root].is_root() && !tree[b].is_root());

        let xs: Vec<f64> = tree.path_to(b).iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 0.5, 1.0, 1.25, 1.5, 2.0]);
        assert_eq!(tree.path_to(root).len(), 1);
    }

    #[test]
    fn test_node_subgoals_and_area() {
        let mut tree = SearchTree::new();
        let root = tree.add_root(Pose2D::origin());
        let sub = Pose2D::new(3.0, 1.0, 0.2);
        tree[root].add_subgoal(&sub);
        assert!(tree[root].contains(&sub));
        assert!(!tree[root].contains(&sub.with_yaw(0.3)));

        tree[root].add_triangle(Triangle::new(
            Point2D::new(0.0, 0.0),
            Point2D::new(4.0, 0.0),
            Point2D::new(0.0, 4.0),
        ));
        assert!(tree[root].inside_area(&Pose2D::new(1.0, 1.0, 2.0)));
        assert!(!tree[root].inside_area(&Pose2D::new(5.0, 1.0, 0.0)));
        assert_eq!(tree[root].triangles().len(), 1);
    }
}
