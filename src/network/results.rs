/*!
Optimizer inputs and outputs exchanged with the backend.

- `Weights`: the delay/reliability/resource coefficients of the cost function.
- `Algorithm`: the optimizers the backend knows about.
- `OptimizationResult`, `ComparisonResult`, `TestStatistics`: validated results.
*/

use std::collections::HashMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::network::path::Path;

/// Tolerance applied when checking that the weights sum to one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub delay: f64,
    pub reliability: f64,
    pub resource: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            delay: 0.33,
            reliability: 0.33,
            resource: 0.34,
        }
    }
}

impl Weights {
    pub fn new(delay: f64, reliability: f64, resource: f64) -> Self {
        Self {
            delay,
            reliability,
            resource,
        }
    }

    pub fn sum(&self) -> f64 {
        self.delay + self.reliability + self.resource
    }

    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() <= WEIGHT_SUM_TOLERANCE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Algorithm {
    #[default]
    Genetic,
    AntColony,
    ParticleSwarm,
    SimulatedAnnealing,
}

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [
        Algorithm::Genetic,
        Algorithm::AntColony,
        Algorithm::ParticleSwarm,
        Algorithm::SimulatedAnnealing,
    ];

    /// Identifier used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            Algorithm::Genetic => "GA",
            Algorithm::AntColony => "ACO",
            Algorithm::ParticleSwarm => "PSO",
            Algorithm::SimulatedAnnealing => "SA",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Algorithm::Genetic => "Genetic Algorithm",
            Algorithm::AntColony => "Ant Colony Optimization",
            Algorithm::ParticleSwarm => "Particle Swarm Optimization",
            Algorithm::SimulatedAnnealing => "Simulated Annealing",
        }
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathMetrics {
    pub total_delay: f64,
    /// Product of node and link reliabilities along the path, in (0, 1].
    pub total_reliability: f64,
    pub resource_cost: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationResult {
    pub algorithm: String,
    pub path: Path,
    pub cost: f64,
    pub metrics: PathMetrics,
    /// Seconds spent by the optimizer.
    pub execution_time: f64,
}

/// Results of running every algorithm on the same request, in server order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonResult {
    entries: Vec<OptimizationResult>,
}

impl ComparisonResult {
    pub fn new(entries: Vec<OptimizationResult>) -> Self {
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &OptimizationResult> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_cost(&self) -> f64 {
        self.entries.iter().map(|e| e.cost).fold(0.0, f64::max)
    }

    /// Lowest cost entry; ties go to the earliest.
    pub fn best(&self) -> Option<&OptimizationResult> {
        self.entries.iter().fold(None, |best, e| match best {
            Some(b) if b.cost <= e.cost => Some(b),
            _ => Some(e),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlgorithmStatistics {
    pub mean_cost: f64,
    pub std_cost: f64,
    pub min_cost: f64,
    pub max_cost: f64,
    pub mean_time: f64,
    pub std_time: f64,
    pub mean_reliability: f64,
    pub mean_delay: f64,
}

/// Aggregated batch test results per algorithm, in server order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestStatistics {
    /// Number of test cases the backend actually ran.
    pub num_tests: usize,
    pub entries: Vec<(String, AlgorithmStatistics)>,
    /// Individual runs reported per algorithm, when the backend includes them.
    pub runs_per_algorithm: HashMap<String, usize>,
}
