//! Maps nodes and edges to their visual attributes on the globe.
//!
//! Everything here is a pure function of the node or edge and the highlighted path.

use catppuccin_egui::MOCHA;
use egui::Color32;

use crate::network::{edge::Edge, node::Node, path::Path};

pub const TIER_A_COLOR: Color32 = MOCHA.green;
pub const TIER_B_COLOR: Color32 = MOCHA.yellow;
pub const TIER_C_COLOR: Color32 = MOCHA.red;
pub const PATH_COLOR: Color32 = MOCHA.peach;
pub const SOURCE_COLOR: Color32 = MOCHA.sky;
pub const DESTINATION_COLOR: Color32 = MOCHA.mauve;
pub const PATH_EDGE_COLOR: Color32 = MOCHA.peach;

const BASE_ALTITUDE: f32 = 0.01;
const BASE_RADIUS: f32 = 0.5;
const PATH_ALTITUDE: f32 = 0.04;
const PATH_RADIUS: f32 = 0.8;
const ENDPOINT_ALTITUDE: f32 = 0.06;
const ENDPOINT_RADIUS: f32 = 1.2;

const PATH_EDGE_STROKE: f32 = 1.5;
const PATH_EDGE_DASH: f32 = 0.4;
const PATH_EDGE_GAP: f32 = 0.2;
const PATH_EDGE_ANIMATE_MS: u32 = 1500;
const PATH_EDGE_ALTITUDE: f32 = 0.3;

const BACKGROUND_EDGE_DASH: f32 = 0.9;
const BACKGROUND_EDGE_GAP: f32 = 0.1;
const BACKGROUND_EDGE_ANIMATE_MS: u32 = 4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReliabilityTier {
    /// r > 0.99
    High,
    /// 0.97 < r <= 0.99
    Medium,
    Low,
}

impl ReliabilityTier {
    pub fn of(reliability: f64) -> Self {
        if reliability > 0.99 {
            ReliabilityTier::High
        } else if reliability > 0.97 {
            ReliabilityTier::Medium
        } else {
            ReliabilityTier::Low
        }
    }

    pub fn color(&self) -> Color32 {
        match self {
            ReliabilityTier::High => TIER_A_COLOR,
            ReliabilityTier::Medium => TIER_B_COLOR,
            ReliabilityTier::Low => TIER_C_COLOR,
        }
    }
}

pub fn color_for_reliability(reliability: f64) -> Color32 {
    ReliabilityTier::of(reliability).color()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    Background,
    Interior,
    Source,
    Destination,
}

impl NodeRole {
    /// Source is checked first, so a single-node path styles its node as the source.
    pub fn of(node: &Node, path: Option<&Path>) -> Self {
        match path {
            Some(path) if path.source() == node.id => NodeRole::Source,
            Some(path) if path.destination() == node.id => NodeRole::Destination,
            Some(path) if path.contains(node.id) => NodeRole::Interior,
            _ => NodeRole::Background,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeStyle {
    pub role: NodeRole,
    pub color: Color32,
    pub radius: f32,
    pub altitude: f32,
}

pub fn node_style(node: &Node, path: Option<&Path>) -> NodeStyle {
    let role = NodeRole::of(node, path);
    let (color, radius, altitude) = match role {
        NodeRole::Background => (
            color_for_reliability(node.reliability),
            BASE_RADIUS,
            BASE_ALTITUDE,
        ),
        NodeRole::Interior => (PATH_COLOR, PATH_RADIUS, PATH_ALTITUDE),
        NodeRole::Source => (SOURCE_COLOR, ENDPOINT_RADIUS, ENDPOINT_ALTITUDE),
        NodeRole::Destination => (DESTINATION_COLOR, ENDPOINT_RADIUS, ENDPOINT_ALTITUDE),
    };
    NodeStyle {
        role,
        color,
        radius,
        altitude,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeStyle {
    pub on_path: bool,
    pub color: Color32,
    pub stroke: f32,
    /// Dash and gap lengths, relative to the full arc length.
    pub dash_length: f32,
    pub dash_gap: f32,
    /// Time for a dash to travel the whole arc.
    pub animate_ms: u32,
    pub altitude: f32,
}

pub fn path_edge_style() -> EdgeStyle {
    EdgeStyle {
        on_path: true,
        color: PATH_EDGE_COLOR,
        stroke: PATH_EDGE_STROKE,
        dash_length: PATH_EDGE_DASH,
        dash_gap: PATH_EDGE_GAP,
        animate_ms: PATH_EDGE_ANIMATE_MS,
        altitude: PATH_EDGE_ALTITUDE,
    }
}

pub fn background_edge_style(bandwidth: f64) -> EdgeStyle {
    EdgeStyle {
        on_path: false,
        color: background_edge_color(),
        stroke: (bandwidth.max(0.0).sqrt() / 200.0) as f32,
        dash_length: BACKGROUND_EDGE_DASH,
        dash_gap: BACKGROUND_EDGE_GAP,
        animate_ms: BACKGROUND_EDGE_ANIMATE_MS,
        altitude: 0.0,
    }
}

pub fn background_edge_color() -> Color32 {
    MOCHA.overlay1.gamma_multiply(0.35)
}

pub fn edge_style(edge: &Edge, path: Option<&Path>) -> EdgeStyle {
    match path {
        Some(path) if path.is_path_edge(edge) => path_edge_style(),
        _ => background_edge_style(edge.bandwidth),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: u32, reliability: f64) -> Node {
        Node::new(id, 0.0, 0.0, 1.0, reliability)
    }

    #[test]
    fn test_reliability_tiers() {
        assert_eq!(ReliabilityTier::of(0.999), ReliabilityTier::High);
        assert_eq!(ReliabilityTier::of(0.98), ReliabilityTier::Medium);
        assert_eq!(ReliabilityTier::of(0.5), ReliabilityTier::Low);
        // Boundaries are exclusive
        assert_eq!(ReliabilityTier::of(0.99), ReliabilityTier::Medium);
        assert_eq!(ReliabilityTier::of(0.97), ReliabilityTier::Low);
        assert_eq!(color_for_reliability(0.999), TIER_A_COLOR);
        assert_eq!(color_for_reliability(0.98), TIER_B_COLOR);
        assert_eq!(color_for_reliability(0.5), TIER_C_COLOR);
    }

    #[test]
    fn test_tier_colors_distinct() {
        assert_ne!(TIER_A_COLOR, TIER_B_COLOR);
        assert_ne!(TIER_B_COLOR, TIER_C_COLOR);
        assert_ne!(TIER_A_COLOR, TIER_C_COLOR);
    }

    #[test]
    fn test_node_roles_along_path() {
        let path = Path::new(vec![0, 1, 2]).unwrap();
        let source = node_style(&node(0, 0.5), Some(&path));
        assert_eq!(source.role, NodeRole::Source);
        assert_eq!((source.radius, source.altitude), (1.2, 0.06));
        assert_eq!(source.color, SOURCE_COLOR);

        let interior = node_style(&node(1, 0.5), Some(&path));
        assert_eq!(interior.role, NodeRole::Interior);
        assert_eq!((interior.radius, interior.altitude), (0.8, 0.04));

        let destination = node_style(&node(2, 0.5), Some(&path));
        assert_eq!(destination.role, NodeRole::Destination);
        assert_eq!(destination.color, DESTINATION_COLOR);

        let off = node_style(&node(3, 0.995), Some(&path));
        assert_eq!(off.role, NodeRole::Background);
        assert_eq!((off.radius, off.altitude), (0.5, 0.01));
        assert_eq!(off.color, TIER_A_COLOR);
    }

    #[test]
    fn test_single_node_path_styles_source() {
        let path = Path::new(vec![5]).unwrap();
        assert_eq!(node_style(&node(5, 0.9), Some(&path)).role, NodeRole::Source);
    }

    #[test]
    fn test_no_path_means_base_styling() {
        let style = node_style(&node(0, 0.98), None);
        assert_eq!(style.role, NodeRole::Background);
        assert_eq!(style.color, TIER_B_COLOR);
    }

    #[test]
    fn test_edge_styles() {
        let path = Path::new(vec![0, 1, 2]).unwrap();
        let on = edge_style(&Edge::new(1, 0, 400.0), Some(&path));
        assert!(on.on_path);
        assert_eq!(on, path_edge_style());

        let off = edge_style(&Edge::new(0, 2, 40_000.0), Some(&path));
        assert!(!off.on_path);
        assert_eq!(off.stroke, 1.0);
        assert_eq!(off.altitude, 0.0);
        assert!(off.dash_length > on.dash_length);
        assert!(off.animate_ms > on.animate_ms);
    }
}
