use std::collections::{BTreeSet, HashMap};

use petgraph::graphmap::UnGraphMap;
use thiserror::Error;

use crate::network::{
    edge::Edge,
    node::{Node, NodeId},
    path::Path,
};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GraphError {
    #[error("Duplicate node id: {0}")]
    DuplicateNode(NodeId),
}

/// The network currently loaded for visualization and optimization.
///
/// Nodes keep backend insertion order. Edges may reference ids that are not in the node set;
/// such edges are kept as received and skipped by the renderer.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    node_id_to_index_map: HashMap<NodeId, usize>,
    adjacency: UnGraphMap<NodeId, ()>,
}

impl Graph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, GraphError> {
        let mut node_id_to_index_map = HashMap::with_capacity(nodes.len());
        let mut adjacency = UnGraphMap::with_capacity(nodes.len(), edges.len());
        for (index, node) in nodes.iter().enumerate() {
            if node_id_to_index_map.insert(node.id, index).is_some() {
                return Err(GraphError::DuplicateNode(node.id));
            }
            adjacency.add_node(node.id);
        }
        // Only wire edges whose endpoints both exist
        for edge in &edges {
            if node_id_to_index_map.contains_key(&edge.source)
                && node_id_to_index_map.contains_key(&edge.target)
            {
                adjacency.add_edge(edge.source, edge.target, ());
            }
        }
        Ok(Self {
            nodes,
            edges,
            node_id_to_index_map,
            adjacency,
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.node_id_to_index_map
            .get(&id)
            .and_then(|&index| self.nodes.get(index))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node_id_to_index_map.contains_key(&id)
    }

    /// Largest node id, used to bound the source/destination inputs.
    pub fn max_node_id(&self) -> Option<NodeId> {
        self.nodes.iter().map(|n| n.id).max()
    }

    /// Both endpoints of an edge, or `None` if either is missing from the node set.
    pub fn endpoints(&self, edge: &Edge) -> Option<(&Node, &Node)> {
        Some((self.node(edge.source)?, self.node(edge.target)?))
    }

    /// True if every consecutive pair of the path is joined by an edge of this graph.
    pub fn is_connected_path(&self, path: &Path) -> bool {
        path.nodes().iter().all(|id| self.contains(*id))
            && path
                .steps()
                .all(|(a, b)| self.adjacency.contains_edge(a, b))
    }
}

/// Holds the last fetched network and the user's node selection.
#[derive(Debug, Default)]
pub struct GraphStore {
    graph: Option<Graph>,
    selection: BTreeSet<NodeId>,
    generation: u64,
}

impl GraphStore {
    /// Replaces the live graph. The selection belongs to the old graph and is cleared.
    pub fn replace(&mut self, graph: Graph) {
        self.graph = Some(graph);
        self.selection.clear();
        self.generation += 1;
    }

    /// Bumped by every `replace`; identifies which graph a request was made against.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn graph(&self) -> Option<&Graph> {
        self.graph.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.graph.is_some()
    }

    /// Flips membership of `id`. Returns true if the id is now selected.
    pub fn toggle_selection(&mut self, id: NodeId) -> bool {
        if self.selection.remove(&id) {
            false
        } else {
            self.selection.insert(id);
            true
        }
    }

    pub fn selection(&self) -> &BTreeSet<NodeId> {
        &self.selection
    }

    /// Lowest and highest selected ids, once at least two nodes are selected.
    pub fn selection_endpoints(&self) -> Option<(NodeId, NodeId)> {
        let first = *self.selection.first()?;
        let last = *self.selection.last()?;
        (first != last).then_some((first, last))
    }

    /// Selected nodes in graph insertion order.
    pub fn selected_nodes(&self) -> Vec<&Node> {
        match &self.graph {
            Some(graph) => graph
                .nodes()
                .iter()
                .filter(|node| self.selection.contains(&node.id))
                .collect(),
            None => Vec::new(),
        }
    }
}
