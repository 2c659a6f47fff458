//! Arena-allocated UCT tree.
//!
//! Using a Vec<Node> with indices provides better cache locality
//! and simpler ownership compared to Rc<RefCell<Node>>.

use crate::node::{Node, NodeId, NodeStats};
use std::hash::Hash;

/// Arena-allocated UCT tree.
///
/// Nodes are stored in a contiguous vector and referenced by index.
/// A node is keyed by the path of actions from the root; the whole tree is
/// cleared at the start of every decision.
#[derive(Debug)]
pub struct Tree<A: Clone + Copy + Eq + Hash> {
    nodes: Vec<Node<A>>,
}

impl<A: Clone + Copy + Eq + Hash> Tree<A> {
    /// Create a new tree with an empty root node.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new()],
        }
    }

    /// Get a reference to a node by ID.
    ///
    /// # Panics
    /// Panics if the NodeId is invalid.
    pub fn get(&self, id: NodeId) -> &Node<A> {
        &self.nodes[id.0]
    }

    /// Get a mutable reference to a node by ID.
    ///
    /// # Panics
    /// Panics if the NodeId is invalid.
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node<A> {
        &mut self.nodes[id.0]
    }

    /// Statistics of the child of `parent` reached by `action`.
    ///
    /// A child that has not been created yet reports unvisited stats.
    pub fn child_stats(&self, parent: NodeId, action: A) -> NodeStats {
        self.get(parent)
            .child(action)
            .map(|id| self.get(id).stats.clone())
            .unwrap_or_default()
    }

    /// Return the child of `parent` reached by `action`, creating it if it
    /// does not exist yet.
    pub fn child_or_insert(&mut self, parent: NodeId, action: A) -> NodeId {
        if let Some(id) = self.get(parent).child(action) {
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new());
        self.get_mut(parent).children.push((action, id));
        id
    }

    /// Count one visit with `reward` at the given node.
    pub fn record(&mut self, id: NodeId, reward: f64) {
        self.get_mut(id).stats.record(reward);
    }

    /// Clear the tree for reuse, keeping only a fresh root.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(Node::new());
    }

    /// Get the number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree is empty (should never be true as root always exists).
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get the root node.
    pub fn root(&self) -> &Node<A> {
        self.get(NodeId::ROOT)
    }
}

impl<A: Clone + Copy + Eq + Hash> Default for Tree<A> {
    fn default() -> Self {
        Self::new()
    }
}
