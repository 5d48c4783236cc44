/*!
Render pipeline

Turns the graph store and optimizer paths into the point, arc and label data bound to the globe.

- `render_graph`: base styling for every node, sampled background arcs, no highlighted path.
- `render_path`: styling against a path, path arcs always kept and drawn above the sampled
  background, camera recentred on the path source.
- `set_selection`: toggles a node and rebuilds the visible labels.

Edges and path steps that reference unknown node ids are skipped and only logged.
*/

use std::time::Duration;

use crate::gui::edge_sampler::{EdgeSampler, SampledEdges};
use crate::gui::style::{self, EdgeStyle};
use crate::gui::surface::{ArcDatum, GlobeSurface, LabelDatum, PointDatum, PointOfView};
use crate::network::{
    edge::Edge,
    network_graph::{Graph, GraphStore},
    node::{Node, NodeId},
    path::Path,
};

pub const DEFAULT_FOCUS_ALTITUDE: f64 = 1.5;
pub const DEFAULT_FOCUS_TRANSITION: Duration = Duration::from_millis(1000);

/// Link details; delay and reliability only when the backend reported them.
pub fn edge_label(edge: &Edge) -> String {
    let mut label = format!("{} ↔ {}: {:.0} Mbps", edge.source, edge.target, edge.bandwidth);
    if let Some(delay) = edge.delay {
        label.push_str(&format!(", {delay:.2} ms"));
    }
    if let Some(reliability) = edge.reliability {
        label.push_str(&format!(", reliability {reliability:.3}"));
    }
    label
}

/// Hover text installed for every point.
pub fn node_label(node: &Node) -> String {
    format!(
        "Node {}\nReliability: {:.3}\nProcessing delay: {:.2} ms",
        node.id, node.reliability, node.processing_delay
    )
}

/// Text of the persistent label shown for selected nodes.
pub fn selection_label(node: &Node) -> String {
    format!("Node {}", node.id)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusSettings {
    pub altitude: f64,
    pub transition: Duration,
}

impl Default for FocusSettings {
    fn default() -> Self {
        Self {
            altitude: DEFAULT_FOCUS_ALTITUDE,
            transition: DEFAULT_FOCUS_TRANSITION,
        }
    }
}

/// Counts from the last render, shown in the status bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub points: usize,
    pub path_arcs: usize,
    pub background_arcs: usize,
    pub sampled_out: usize,
    pub skipped: usize,
}

#[derive(Default)]
pub struct RenderPipeline {
    sampler: EdgeSampler,
    focus: FocusSettings,
    highlighted: Option<Path>,
    stats: RenderStats,
}

impl RenderPipeline {
    pub fn new(sampler: EdgeSampler, focus: FocusSettings) -> Self {
        Self {
            sampler,
            focus,
            highlighted: None,
            stats: RenderStats::default(),
        }
    }

    pub fn highlighted_path(&self) -> Option<&Path> {
        self.highlighted.as_ref()
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn render_graph(&mut self, graph: &Graph, surface: &mut dyn GlobeSurface) {
        self.highlighted = None;
        self.draw(graph, None, surface);
    }

    pub fn render_path(&mut self, graph: &Graph, path: &Path, surface: &mut dyn GlobeSurface) {
        if !graph.is_connected_path(path) {
            tracing::debug!("[render] path {path} is not fully connected in the current graph");
        }
        self.draw(graph, Some(path), surface);
        self.highlighted = Some(path.clone());

        match graph.node(path.source()) {
            Some(source) => surface.point_of_view(PointOfView {
                lat: source.lat,
                lng: source.lng,
                altitude: self.focus.altitude,
                transition: self.focus.transition,
            }),
            None => tracing::debug!(
                "[render] path source {} not in graph, keeping camera",
                path.source()
            ),
        }
    }

    /// Toggles `id` in the store's selection and rebuilds the label set.
    pub fn set_selection(
        &mut self,
        store: &mut GraphStore,
        id: NodeId,
        surface: &mut dyn GlobeSurface,
    ) {
        let selected = store.toggle_selection(id);
        tracing::debug!("[render] node {id} selected: {selected}");
        self.refresh_labels(store, surface);
    }

    /// Labels for the selected nodes, in graph insertion order.
    pub fn refresh_labels(&self, store: &GraphStore, surface: &mut dyn GlobeSurface) {
        let labels = store
            .selected_nodes()
            .into_iter()
            .map(|node| LabelDatum {
                id: node.id,
                lat: node.lat,
                lng: node.lng,
                text: selection_label(node),
            })
            .collect();
        surface.set_labels(labels);
    }

    fn draw(&mut self, graph: &Graph, path: Option<&Path>, surface: &mut dyn GlobeSurface) {
        let points: Vec<PointDatum> = graph
            .nodes()
            .iter()
            .map(|node| {
                let node_style = style::node_style(node, path);
                PointDatum {
                    id: node.id,
                    lat: node.lat,
                    lng: node.lng,
                    color: node_style.color,
                    radius: node_style.radius,
                    altitude: node_style.altitude,
                    role: node_style.role,
                    label: node_label(node),
                }
            })
            .collect();

        // Dangling edges are dropped before sampling so they never take a slot under the cap
        let mut skipped = 0;
        let drawable = graph.edges().iter().filter(|edge| {
            let ok = graph.endpoints(edge).is_some();
            if !ok {
                skipped += 1;
                tracing::debug!(
                    "[render] skipping edge {}-{}: unknown endpoint",
                    edge.source,
                    edge.target
                );
            }
            ok
        });
        let SampledEdges {
            path_edges,
            background,
            dropped,
        } = self.sampler.partition(drawable, path);

        // The globe layers later arcs above earlier ones, so the path goes last
        let mut arcs: Vec<ArcDatum> = Vec::with_capacity(background.len() + path_edges.len());
        arcs.extend(
            background
                .iter()
                .chain(path_edges.iter())
                .filter_map(|edge| arc(graph, edge, style::edge_style(edge, path))),
        );

        self.stats = RenderStats {
            points: points.len(),
            path_arcs: path_edges.len(),
            background_arcs: background.len(),
            sampled_out: dropped,
            skipped,
        };
        tracing::debug!("[render] {:?}", self.stats);

        surface.set_points(points);
        surface.set_arcs(arcs);
    }
}

fn arc(graph: &Graph, edge: &Edge, style: EdgeStyle) -> Option<ArcDatum> {
    let (source, target) = graph.endpoints(edge)?;
    Some(ArcDatum {
        source: source.id,
        target: target.id,
        start: (source.lat, source.lng),
        end: (target.lat, target.lng),
        style,
        label: edge_label(edge),
    })
}
