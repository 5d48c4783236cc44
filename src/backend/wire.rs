/*!
JSON contract with the backend.

Request bodies serialize to the exact field names the backend expects. Responses go through
an explicit parse step: the `success` envelope is checked first, then the body is deserialized
into wire structs and validated into the entities of `crate::network`. Anything that does not
match is a `RequestError::Schema`, so no partially valid data reaches the renderer.
*/

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::backend::source::{BackendResult, RequestError};
use crate::network::{
    edge::Edge,
    network_graph::Graph,
    node::{Node, NodeId},
    path::Path,
    results::{
        AlgorithmStatistics, ComparisonResult, OptimizationResult, PathMetrics, TestStatistics,
        Weights,
    },
};

pub const GENERATE_ENDPOINT: &str = "/api/generate_network";
pub const OPTIMIZE_ENDPOINT: &str = "/api/optimize";
pub const COMPARE_ENDPOINT: &str = "/api/compare_algorithms";
pub const RUN_TESTS_ENDPOINT: &str = "/api/run_tests";

// Tolerance for min <= mean <= max on statistics computed server side
const STATS_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GenerateRequest {
    Random {
        num_nodes: u32,
        connection_prob: f64,
        seed: Option<u64>,
    },
    /// Ask the backend for its fixed, pre-loaded dataset.
    Dataset { use_dataset: bool },
}

impl GenerateRequest {
    pub fn random(num_nodes: u32, connection_prob: f64, seed: Option<u64>) -> Self {
        GenerateRequest::Random {
            num_nodes,
            connection_prob,
            seed,
        }
    }

    pub fn dataset() -> Self {
        GenerateRequest::Dataset { use_dataset: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizeRequest {
    pub source: NodeId,
    pub destination: NodeId,
    pub algorithm: String,
    pub weights: Weights,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompareRequest {
    pub source: NodeId,
    pub destination: NodeId,
    pub weights: Weights,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunTestsRequest {
    pub num_tests: u32,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateWire {
    num_nodes: usize,
    num_edges: usize,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

#[derive(Debug, Deserialize)]
struct MetricsWire {
    total_delay: f64,
    total_reliability: f64,
    resource_cost: f64,
}

#[derive(Debug, Deserialize)]
struct OptimizeWire {
    #[serde(default)]
    algorithm: Option<String>,
    path: Vec<NodeId>,
    #[serde(default)]
    path_length: Option<usize>,
    cost: f64,
    metrics: MetricsWire,
    execution_time: f64,
}

#[derive(Debug, Deserialize)]
struct CompareWire {
    results: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct StatisticsWire {
    mean_cost: f64,
    std_cost: f64,
    min_cost: f64,
    max_cost: f64,
    mean_time: f64,
    #[serde(default)]
    std_time: f64,
    mean_reliability: f64,
    mean_delay: f64,
}

#[derive(Debug, Deserialize)]
struct RunTestsWire {
    num_tests: usize,
    statistics: Map<String, Value>,
    #[serde(default)]
    results: Option<Map<String, Value>>,
}

/// Checks the `success` discriminator and returns the body on success.
fn unwrap_envelope(value: Value) -> BackendResult<Value> {
    let envelope: Envelope = serde_json::from_value(value.clone())
        .map_err(|e| RequestError::Schema(format!("missing success envelope: {e}")))?;
    if envelope.success {
        Ok(value)
    } else {
        Err(RequestError::Backend(
            envelope
                .error
                .unwrap_or_else(|| "The server reported an unspecified error".to_string()),
        ))
    }
}

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> BackendResult<T> {
    serde_json::from_value(value).map_err(|e| RequestError::Schema(format!("{what}: {e}")))
}

pub fn parse_generate_response(value: Value) -> BackendResult<Graph> {
    let wire: GenerateWire = decode(unwrap_envelope(value)?, "network")?;
    if wire.num_nodes != wire.nodes.len() || wire.num_edges != wire.edges.len() {
        return Err(RequestError::Schema(format!(
            "network counts ({} nodes, {} edges) do not match payload ({} nodes, {} edges)",
            wire.num_nodes,
            wire.num_edges,
            wire.nodes.len(),
            wire.edges.len()
        )));
    }
    for node in &wire.nodes {
        node.validate().map_err(RequestError::Schema)?;
    }
    for edge in &wire.edges {
        edge.validate().map_err(RequestError::Schema)?;
    }
    Graph::new(wire.nodes, wire.edges).map_err(|e| RequestError::Schema(e.to_string()))
}

fn validate_optimization(
    wire: OptimizeWire,
    fallback_name: &str,
) -> BackendResult<OptimizationResult> {
    let algorithm = wire.algorithm.unwrap_or_else(|| fallback_name.to_string());
    if let Some(len) = wire.path_length {
        if len != wire.path.len() {
            return Err(RequestError::Schema(format!(
                "{algorithm}: path_length {len} does not match path of {} nodes",
                wire.path.len()
            )));
        }
    }
    let path = Path::new(wire.path)
        .ok_or_else(|| RequestError::Schema(format!("{algorithm}: empty path")))?;
    if !wire.cost.is_finite() {
        return Err(RequestError::Schema(format!("{algorithm}: cost is not finite")));
    }
    if !(wire.execution_time.is_finite() && wire.execution_time >= 0.0) {
        return Err(RequestError::Schema(format!(
            "{algorithm}: invalid execution time {}",
            wire.execution_time
        )));
    }
    let reliability = wire.metrics.total_reliability;
    if !(reliability > 0.0 && reliability <= 1.0) {
        return Err(RequestError::Schema(format!(
            "{algorithm}: total reliability {reliability} not in (0, 1]"
        )));
    }
    Ok(OptimizationResult {
        algorithm,
        path,
        cost: wire.cost,
        metrics: PathMetrics {
            total_delay: wire.metrics.total_delay,
            total_reliability: reliability,
            resource_cost: wire.metrics.resource_cost,
        },
        execution_time: wire.execution_time,
    })
}

pub fn parse_optimize_response(value: Value, requested: &str) -> BackendResult<OptimizationResult> {
    let wire: OptimizeWire = decode(unwrap_envelope(value)?, "optimization result")?;
    validate_optimization(wire, requested)
}

pub fn parse_compare_response(value: Value) -> BackendResult<ComparisonResult> {
    let wire: CompareWire = decode(unwrap_envelope(value)?, "comparison")?;
    let mut entries = Vec::with_capacity(wire.results.len());
    for (name, entry) in wire.results {
        let entry: OptimizeWire = decode(entry, &name)?;
        entries.push(validate_optimization(entry, &name)?);
    }
    Ok(ComparisonResult::new(entries))
}

fn validate_statistics(name: &str, wire: StatisticsWire) -> BackendResult<AlgorithmStatistics> {
    if wire.std_cost < 0.0 || wire.std_time < 0.0 {
        return Err(RequestError::Schema(format!("{name}: negative standard deviation")));
    }
    if wire.min_cost > wire.mean_cost + STATS_EPSILON
        || wire.mean_cost > wire.max_cost + STATS_EPSILON
    {
        return Err(RequestError::Schema(format!(
            "{name}: expected min <= mean <= max, got {} / {} / {}",
            wire.min_cost, wire.mean_cost, wire.max_cost
        )));
    }
    Ok(AlgorithmStatistics {
        mean_cost: wire.mean_cost,
        std_cost: wire.std_cost,
        min_cost: wire.min_cost,
        max_cost: wire.max_cost,
        mean_time: wire.mean_time,
        std_time: wire.std_time,
        mean_reliability: wire.mean_reliability,
        mean_delay: wire.mean_delay,
    })
}

pub fn parse_run_tests_response(value: Value) -> BackendResult<TestStatistics> {
    let wire: RunTestsWire = decode(unwrap_envelope(value)?, "test statistics")?;
    let mut entries = Vec::with_capacity(wire.statistics.len());
    for (name, stats) in wire.statistics {
        let stats: StatisticsWire = decode(stats, &name)?;
        let stats = validate_statistics(&name, stats)?;
        entries.push((name, stats));
    }
    let runs_per_algorithm = wire
        .results
        .unwrap_or_default()
        .into_iter()
        .map(|(name, runs)| {
            let count = runs.as_array().map(Vec::len).unwrap_or(0);
            (name, count)
        })
        .collect();
    Ok(TestStatistics {
        num_tests: wire.num_tests,
        entries,
        runs_per_algorithm,
    })
}
