use serde::{Deserialize, Serialize};

use crate::network::node::NodeId;

/// A link between two nodes. Direction is irrelevant for path membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    /// Link bandwidth in Mbps, always positive.
    pub bandwidth: f64,
    /// Link delay in milliseconds, when the backend reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<f64>,
    /// Link reliability, when the backend reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reliability: Option<f64>,
}

impl Edge {
    pub fn new(source: NodeId, target: NodeId, bandwidth: f64) -> Self {
        Self {
            source,
            target,
            bandwidth,
            delay: None,
            reliability: None,
        }
    }

    pub fn key(&self) -> UndirectedEdgeKey {
        UndirectedEdgeKey::new(self.source, self.target)
    }

    /// True if this edge joins `a` and `b` in either direction.
    pub fn connects(&self, a: NodeId, b: NodeId) -> bool {
        self.key() == UndirectedEdgeKey::new(a, b)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.bandwidth.is_finite() && self.bandwidth > 0.0) {
            return Err(format!(
                "edge {}-{}: bandwidth {} must be positive",
                self.source, self.target, self.bandwidth
            ));
        }
        if let Some(r) = self.reliability {
            if !(0.0..=1.0).contains(&r) {
                return Err(format!(
                    "edge {}-{}: reliability {} not in [0, 1]",
                    self.source, self.target, r
                ));
            }
        }
        Ok(())
    }
}

/// Order-independent identity of an edge's endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UndirectedEdgeKey {
    a: NodeId,
    b: NodeId,
}

impl UndirectedEdgeKey {
    pub fn new(a: NodeId, b: NodeId) -> Self {
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        UndirectedEdgeKey { a, b }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_connects_in_both_directions() {
        let edge = Edge::new(3, 9, 100.0);
        assert!(edge.connects(3, 9));
        assert!(edge.connects(9, 3));
        assert!(!edge.connects(3, 4));
    }

    #[test]
    fn test_edge_optional_fields() {
        let edge: Edge =
            serde_json::from_str(r#"{"source": 1, "target": 2, "bandwidth": 500.0}"#).unwrap();
        assert_eq!(edge.delay, None);
        let edge: Edge = serde_json::from_str(
            r#"{"source": 1, "target": 2, "bandwidth": 500.0, "delay": 4.5, "reliability": 0.98}"#,
        )
        .unwrap();
        assert_eq!(edge.delay, Some(4.5));
        assert_eq!(edge.reliability, Some(0.98));
    }

    #[test]
    fn test_edge_validation() {
        assert!(Edge::new(0, 1, 0.0).validate().is_err());
        assert!(Edge::new(0, 1, -3.0).validate().is_err());
        assert!(Edge::new(0, 1, 10.0).validate().is_ok());
    }
}
