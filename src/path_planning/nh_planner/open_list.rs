//! Priority frontier of (node, action) pairs

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use super::search::{Action, NodeId};

/// Frontier entry; ties on priority pop in insertion order
#[derive(Debug)]
struct Entry {
    priority: OrderedFloat<f64>,
    seq: u64,
    node: NodeId,
    action: Action,
}

impl Eq for Entry {}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Default)]
pub struct OpenList {
    heap: BinaryHeap<Entry>,
    seq: u64,
}

impl OpenList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: NodeId, action: Action, priority: f64) {
        self.heap.push(Entry {
            priority: OrderedFloat(priority),
            seq: self.seq,
            node,
            action,
        });
        self.seq += 1;
    }

    /// Remove the lowest-priority pair
    pub fn pop(&mut self) -> Option<(NodeId, Action)> {
        self.heap.pop().map(|e| (e.node, e.action))
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Number of insertions since creation
    pub fn insertions(&self) -> u64 {
        self.seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Pose2D;
    use crate::path_planning::nh_planner::search::SearchTree;

    fn action(x: f64) -> Action {
        Action::new(Pose2D::new(x, 0.0, 0.0), true, false, false, None)
    }

    #[test]
    fn test_pops_lowest_priority_first() {
        let mut tree = SearchTree::new();
        let root = tree.add_root(Pose2D::origin());
        let mut open = OpenList::new();
        open.insert(root, action(3.0), 3.0);
        open.insert(root, action(1.0), 1.0);
        open.insert(root, action(2.0), 2.0);

        let order: Vec<f64> = std::iter::from_fn(|| open.pop()).map(|(_, a)| a.state.x).collect();
        assert_eq!(order, vec![1.0, 2.0, 3.0]);
        assert!(open.is_empty());
        assert_eq!(open.insertions(), 3);
    }

    #[test]
    fn test_ties_are_fifo() {
        let mut tree = SearchTree::new();
        let root = tree.add_root(Pose2D::origin());
        let mut open = OpenList::new();
        for x in [5.0, 6.0, 7.0] {
            open.insert(root, action(x), 1.0);
        }
        assert_eq!(open.len(), 3);
        assert_eq!(open.pop().map(|(_, a)| a.state.x), Some(5.0));
        assert_eq!(open.pop().map(|(_, a)| a.state.x), Some(6.0));

        open.clear();
        assert!(open.is_empty());
        assert!(open.pop().is_none());
    }
}
