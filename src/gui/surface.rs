/*!
Data bound to the globe and the trait through which the render pipeline drives it.

Every setter replaces the previously bound data set, so repeated renders never accumulate.
*/

use std::time::Duration;

use egui::Color32;

use crate::gui::style::{EdgeStyle, NodeRole};
use crate::network::node::NodeId;

#[derive(Debug, Clone, PartialEq)]
pub struct PointDatum {
    pub id: NodeId,
    pub lat: f64,
    pub lng: f64,
    pub color: Color32,
    /// Radius in degrees of arc.
    pub radius: f32,
    /// Height above the surface, in globe radii.
    pub altitude: f32,
    pub role: NodeRole,
    /// Hover text produced by the label template.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArcDatum {
    pub source: NodeId,
    pub target: NodeId,
    pub start: (f64, f64),
    pub end: (f64, f64),
    pub style: EdgeStyle,
    /// Link details shown alongside the hovered endpoint.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelDatum {
    pub id: NodeId,
    pub lat: f64,
    pub lng: f64,
    pub text: String,
}

/// Where the camera looks and how long it takes to get there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointOfView {
    pub lat: f64,
    pub lng: f64,
    /// Camera distance above the surface, in globe radii.
    pub altitude: f64,
    pub transition: Duration,
}

pub trait GlobeSurface {
    fn set_points(&mut self, points: Vec<PointDatum>);
    /// Arcs are drawn in order; later arcs are layered above earlier ones.
    fn set_arcs(&mut self, arcs: Vec<ArcDatum>);
    fn set_labels(&mut self, labels: Vec<LabelDatum>);
    fn point_of_view(&mut self, pov: PointOfView);
}
