//! Bounds the number of background arcs drawn on the globe.
//!
//! Without a seed, every call draws a fresh random subset, so two renders of the same graph
//! usually show different background edges. Path edges are never sampled away.

use rand::{SeedableRng, rngs::StdRng, seq::index};

use crate::network::{edge::Edge, path::Path};

pub const DEFAULT_EDGE_CAP: usize = 300;

pub struct EdgeSampler {
    cap: usize,
    rng: StdRng,
}

/// Edges split by path membership, background already sampled down to the cap.
#[derive(Debug, Default)]
pub struct SampledEdges<'a> {
    pub path_edges: Vec<&'a Edge>,
    pub background: Vec<&'a Edge>,
    /// Background edges that were dropped by sampling.
    pub dropped: usize,
}

impl Default for EdgeSampler {
    fn default() -> Self {
        Self::new(DEFAULT_EDGE_CAP, None)
    }
}

impl EdgeSampler {
    /// A `seed` makes every subsequent sample reproducible.
    pub fn new(cap: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { cap, rng }
    }

    /// Returns `items` unchanged when within the cap, otherwise a uniformly random subset of
    /// exactly `cap` items in their original relative order.
    pub fn sample<T>(&mut self, items: Vec<T>) -> Vec<T> {
        if items.len() <= self.cap {
            return items;
        }
        let mut keep = index::sample(&mut self.rng, items.len(), self.cap).into_vec();
        keep.sort_unstable();
        let mut keep = keep.into_iter().peekable();
        items
            .into_iter()
            .enumerate()
            .filter_map(|(i, item)| {
                if keep.peek() == Some(&i) {
                    keep.next();
                    Some(item)
                } else {
                    None
                }
            })
            .collect()
    }

    /// Keeps every edge on `path` and samples only the remaining edges down to the cap.
    pub fn partition<'a, I>(&mut self, edges: I, path: Option<&Path>) -> SampledEdges<'a>
    where
        I: IntoIterator<Item = &'a Edge>,
    {
        let (path_edges, background): (Vec<&Edge>, Vec<&Edge>) = edges
            .into_iter()
            .partition(|edge| path.is_some_and(|p| p.is_path_edge(edge)));
        let total = background.len();
        let background = self.sample(background);
        SampledEdges {
            path_edges,
            dropped: total - background.len(),
            background,
        }
    }
}
