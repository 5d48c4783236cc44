use std::fmt::Display;

use crate::network::edge::{Edge, UndirectedEdgeKey};
use crate::network::node::NodeId;

/// An ordered, non-empty sequence of node ids returned by an optimizer.
///
/// A single-node path (source == destination) is valid and has no steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    nodes: Vec<NodeId>,
}

impl Path {
    /// Returns `None` for an empty sequence.
    pub fn new(nodes: Vec<NodeId>) -> Option<Self> {
        if nodes.is_empty() {
            None
        } else {
            Some(Self { nodes })
        }
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn source(&self) -> NodeId {
        self.nodes[0]
    }

    pub fn destination(&self) -> NodeId {
        self.nodes[self.nodes.len() - 1]
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    /// Consecutive node pairs, in path order.
    pub fn steps(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.nodes.windows(2).map(|w| (w[0], w[1]))
    }

    /// True if `{a, b}` equals some consecutive pair of the path. Linear in the path length.
    pub fn has_step(&self, a: NodeId, b: NodeId) -> bool {
        let key = UndirectedEdgeKey::new(a, b);
        self.steps().any(|(x, y)| UndirectedEdgeKey::new(x, y) == key)
    }

    pub fn is_path_edge(&self, edge: &Edge) -> bool {
        self.steps().any(|(a, b)| edge.connects(a, b))
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for id in &self.nodes {
            if !first {
                write!(f, " → ")?;
            }
            write!(f, "{id}")?;
            first = false;
        }
        Ok(())
    }
}
