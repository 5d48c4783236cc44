use serde::{Deserialize, Serialize};

pub type NodeId = u32;

/// A network node as reported by the backend. Visual attributes are never stored here,
/// they are derived per render by the style resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub lat: f64,
    pub lng: f64,
    /// Processing delay in milliseconds.
    pub processing_delay: f64,
    /// Probability that the node forwards correctly, in (0, 1].
    pub reliability: f64,
}

impl Node {
    pub fn new(id: NodeId, lat: f64, lng: f64, processing_delay: f64, reliability: f64) -> Self {
        Self {
            id,
            lat,
            lng,
            processing_delay,
            reliability,
        }
    }

    /// Checks the value ranges the rest of the client relies on.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.lat.is_finite() && (-90.0..=90.0).contains(&self.lat)) {
            return Err(format!("node {}: latitude {} out of range", self.id, self.lat));
        }
        if !(self.lng.is_finite() && (-180.0..=180.0).contains(&self.lng)) {
            return Err(format!("node {}: longitude {} out of range", self.id, self.lng));
        }
        if !(self.reliability > 0.0 && self.reliability <= 1.0) {
            return Err(format!(
                "node {}: reliability {} not in (0, 1]",
                self.id, self.reliability
            ));
        }
        if !(self.processing_delay.is_finite() && self.processing_delay >= 0.0) {
            return Err(format!(
                "node {}: negative or invalid processing delay {}",
                self.id, self.processing_delay
            ));
        }
        Ok(())
    }
}
