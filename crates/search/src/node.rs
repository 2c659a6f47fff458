//! UCT node types for tree storage.
//!
//! Uses arena allocation with indices for cache locality and simpler memory management.

use std::hash::Hash;

/// Index into the node arena.
///
/// This is a lightweight handle that references a node in the tree.
/// Using indices instead of pointers avoids Rc/RefCell overhead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The root node is always at index 0.
    pub const ROOT: NodeId = NodeId(0);
}

/// Statistics for a single tree position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeStats {
    /// Number of simulations that passed through this position.
    pub visit_count: u32,

    /// Sum of rewards from all visits, from the point of view of the player
    /// who moved into this position.
    pub total_reward: f64,
}

impl NodeStats {
    /// Average reward for this position.
    ///
    /// Returns exactly 0.0 if the position has never been visited.
    pub fn average_reward(&self) -> f64 {
        if self.visit_count == 0 {
            0.0
        } else {
            self.total_reward / self.visit_count as f64
        }
    }

    /// Count one visit with the given reward.
    pub fn record(&mut self, reward: f64) {
        self.visit_count += 1;
        self.total_reward += reward;
    }
}

/// A node in the UCT tree.
///
/// Each node is identified by the path of actions leading to it from the
/// root. Children are created lazily, the first time a simulation descends
/// into them.
#[derive(Clone, Debug)]
pub struct Node<A: Clone + Copy + Eq + Hash> {
    /// Visit and reward statistics.
    pub stats: NodeStats,

    /// Children: (action, node_id) pairs, in creation order.
    pub children: Vec<(A, NodeId)>,
}

impl<A: Clone + Copy + Eq + Hash> Node<A> {
    /// Create a new unvisited node.
    pub fn new() -> Self {
        Self {
            stats: NodeStats::default(),
            children: Vec::new(),
        }
    }

    /// Find the child reached by `action`, if it has been created.
    pub fn child(&self, action: A) -> Option<NodeId> {
        self.children
            .iter()
            .find(|(a, _)| *a == action)
            .map(|(_, id)| *id)
    }
}

impl<A: Clone + Copy + Eq + Hash> Default for Node<A> {
    fn default() -> Self {
        Self::new()
    }
}
