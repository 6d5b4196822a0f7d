//! The graph reachable from a root node.
//!
//! Nodes can only reference nodes that existed before them, so the graph is
//! acyclic by construction and a single visited mark per node is enough.

use crate::graph::node::Node;
use std::collections::HashSet;

/// A root node together with its reachable nodes, ordered once at
/// construction.
#[derive(Debug, Clone)]
pub struct Graph {
    root: Node,
    order: Vec<Node>,
}

impl Graph {
    pub fn new(root: Node) -> Self {
        // Visits are keyed by the shared node, not its run-local id.
        fn visit(node: &Node, marks: &mut HashSet<*const ()>, out: &mut Vec<Node>) {
            if marks.contains(&node.key()) {
                return;
            }
            for dep in node.deps() {
                visit(dep, marks, out);
            }
            marks.insert(node.key());
            out.push(node.clone());
        }

        let mut marks = HashSet::new();
        let mut order = Vec::new();
        visit(&root, &mut marks, &mut order);
        Self { root, order }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Every reachable node exactly once, dependencies before dependents.
    pub fn topological(&self) -> &[Node] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, node: &Node) -> bool {
        self.order.contains(node)
    }
}
