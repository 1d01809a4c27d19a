//! Neighbor sampling for GraphSAGE-style mini-batches.
//!
//! # Key Types
//!
//! - [`Sampler`] - A sampling strategy: `n_samples` neighbor ids per input id
//! - [`BoundSampler`] - A strategy bound to a fixed per-layer sample count
//! - [`UniformSampler`] - Uniform sampling with replacement (seeded)
//! - [`FirstNeighborsSampler`] - Deterministic cyclic sampling in stored order
//!
//! # Output Contract
//!
//! Every strategy returns a flat list of exactly `ids.len() * n_samples` ids,
//! grouped by input id: entries `[i * n_samples, (i + 1) * n_samples)` are the
//! neighbors drawn for `ids[i]`. Sampling with replacement keeps the contract
//! even when a node's degree is below `n_samples`.

use crate::{Adjacency, NodeId, Result, SamplingError};
use rand::prelude::*;
use rand_xorshift::XorShiftRng;
use std::fmt;
use std::sync::{Mutex, PoisonError};

/// A neighbor-sampling strategy.
pub trait Sampler: Send + Sync {
    /// Draw `n_samples` neighbors for each id in `ids`.
    ///
    /// Errors raised here propagate to the caller unchanged.
    fn sample(&self, ids: &[NodeId], adj: &dyn Adjacency, n_samples: usize) -> Result<Vec<NodeId>>;

    /// Short name used in logs and `Debug` output.
    fn name(&self) -> &'static str {
        "custom"
    }
}

/// A sampling strategy closed over a fixed sample count.
///
/// One `BoundSampler` exists per model layer. It forwards to the wrapped
/// strategy and checks the output-length contract, so a misbehaving strategy
/// fails here instead of producing a malformed feature level.
pub struct BoundSampler {
    strategy: Box<dyn Sampler>,
    n_samples: usize,
}

impl BoundSampler {
    /// Bind `strategy` to `n_samples` draws per node.
    pub fn new(strategy: Box<dyn Sampler>, n_samples: usize) -> Result<Self> {
        if n_samples == 0 {
            return Err(SamplingError::InvalidSampleCount(n_samples));
        }
        Ok(Self { strategy, n_samples })
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Sample `n_samples` neighbors per id, flattened.
    ///
    /// # Returns
    /// Exactly `ids.len() * n_samples` ids.
    pub fn sample(&self, ids: &[NodeId], adj: &dyn Adjacency) -> Result<Vec<NodeId>> {
        let sampled = self.strategy.sample(ids, adj, self.n_samples)?;
        let expected = ids.len() * self.n_samples;
        if sampled.len() != expected {
            return Err(SamplingError::SampleCount {
                expected,
                got: sampled.len(),
            });
        }
        Ok(sampled)
    }
}

impl fmt::Debug for BoundSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundSampler")
            .field("strategy", &self.strategy.name())
            .field("n_samples", &self.n_samples)
            .finish()
    }
}

/// Uniform neighbor sampling with replacement.
///
/// One `XorShiftRng` stream is seeded at construction and advanced by every
/// call: successive forward passes see different neighborhoods, and a new
/// sampler with the same seed replays the same sequence. Samplers with
/// different seeds never share a stream, even at later calls.
///
/// # Example
///
/// ```rust
/// use graphsage_core::{AdjacencyList, BoundSampler, UniformSampler};
///
/// let adj = AdjacencyList::from_edges(3, &[(0, 1), (0, 2)], true).unwrap();
/// let sampler = BoundSampler::new(Box::new(UniformSampler::new(42)), 4).unwrap();
///
/// let sampled = sampler.sample(&[0, 1], &adj).unwrap();
/// assert_eq!(sampled.len(), 8);
/// assert!(sampled[4..].iter().all(|&n| n == 0));
/// ```
#[derive(Debug)]
pub struct UniformSampler {
    seed: u64,
    rng: Mutex<XorShiftRng>,
    self_loop_fallback: bool,
}

impl UniformSampler {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Mutex::new(XorShiftRng::seed_from_u64(seed)),
            self_loop_fallback: false,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Let isolated nodes sample themselves instead of failing.
    pub fn with_self_loop_fallback(mut self) -> Self {
        self.self_loop_fallback = true;
        self
    }
}

impl Sampler for UniformSampler {
    fn sample(&self, ids: &[NodeId], adj: &dyn Adjacency, n_samples: usize) -> Result<Vec<NodeId>> {
        // a panic while holding the lock cannot leave the rng invalid
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let mut sampled = Vec::with_capacity(ids.len() * n_samples);

        for &id in ids {
            let neighbors = adj.neighbors(id).ok_or(SamplingError::MissingNode(id))?;

            if neighbors.is_empty() {
                if !self.self_loop_fallback {
                    return Err(SamplingError::NoNeighbors(id));
                }
                sampled.extend(std::iter::repeat(id).take(n_samples));
                continue;
            }

            sampled.extend((0..n_samples).map(|_| neighbors[rng.gen_range(0..neighbors.len())]));
        }

        Ok(sampled)
    }

    fn name(&self) -> &'static str {
        "uniform"
    }
}

/// Deterministic sampler: takes neighbors cyclically in stored order.
///
/// Node `v` with neighbors `[a, b]` and `n_samples = 3` yields `[a, b, a]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstNeighborsSampler;

impl Sampler for FirstNeighborsSampler {
    fn sample(&self, ids: &[NodeId], adj: &dyn Adjacency, n_samples: usize) -> Result<Vec<NodeId>> {
        let mut sampled = Vec::with_capacity(ids.len() * n_samples);
        for &id in ids {
            let neighbors = adj.neighbors(id).ok_or(SamplingError::MissingNode(id))?;
            if neighbors.is_empty() {
                return Err(SamplingError::NoNeighbors(id));
            }
            sampled.extend(neighbors.iter().copied().cycle().take(n_samples));
        }
        Ok(sampled)
    }

    fn name(&self) -> &'static str {
        "first_neighbors"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AdjacencyList;

    fn star() -> AdjacencyList {
        // 0 is the hub; 1, 2, 3 are leaves; 4 is isolated
        AdjacencyList::from_edges(5, &[(0, 1), (0, 2), (0, 3)], true).unwrap()
    }

    #[test]
    fn test_uniform_output_length() {
        let adj = star();
        let sampler = UniformSampler::new(7);

        let sampled = sampler.sample(&[0, 1, 2], &adj, 5).unwrap();
        assert_eq!(sampled.len(), 15);
    }

    #[test]
    fn test_uniform_grouped_by_input() {
        let adj = star();
        let sampler = UniformSampler::new(7);

        let sampled = sampler.sample(&[1, 0], &adj, 3).unwrap();
        // leaf 1 only has the hub
        assert_eq!(&sampled[..3], &[0, 0, 0]);
        for n in &sampled[3..] {
            assert!([1, 2, 3].contains(n));
        }
    }

    #[test]
    fn test_uniform_with_replacement_below_degree() {
        let adj = star();
        let sampler = UniformSampler::new(1);

        // k=10 but only 3 neighbors: replacement keeps the length
        let sampled = sampler.sample(&[0], &adj, 10).unwrap();
        assert_eq!(sampled.len(), 10);
        assert!(sampled.iter().all(|n| [1, 2, 3].contains(n)));
    }

    #[test]
    fn test_uniform_reproducible_per_seed() {
        let adj = star();
        let a = UniformSampler::new(99);
        let b = UniformSampler::new(99);

        for _ in 0..3 {
            assert_eq!(
                a.sample(&[0, 0], &adj, 8).unwrap(),
                b.sample(&[0, 0], &adj, 8).unwrap()
            );
        }
    }

    #[test]
    fn test_uniform_adjacent_seeds_do_not_share_stream() {
        let adj = AdjacencyList::from_edges(64, &(1..64).map(|i| (0, i)).collect::<Vec<_>>(), true).unwrap();
        let layer0 = UniformSampler::new(0);
        let layer1 = UniformSampler::new(1);

        let first = layer0.sample(&[0; 4], &adj, 5).unwrap();
        let second = layer0.sample(&[0; 4], &adj, 5).unwrap();
        let other = layer1.sample(&[0; 4], &adj, 5).unwrap();

        assert_ne!(first, second);
        assert_ne!(second, other);
    }

    #[test]
    fn test_uniform_missing_node() {
        let adj = star();
        let sampler = UniformSampler::new(0);

        let err = sampler.sample(&[0, 17], &adj, 2).unwrap_err();
        assert_eq!(err, SamplingError::MissingNode(17));
    }

    #[test]
    fn test_uniform_isolated_node() {
        let adj = star();

        let err = UniformSampler::new(0).sample(&[4], &adj, 2).unwrap_err();
        assert_eq!(err, SamplingError::NoNeighbors(4));

        let sampled = UniformSampler::new(0)
            .with_self_loop_fallback()
            .sample(&[4], &adj, 2)
            .unwrap();
        assert_eq!(sampled, vec![4, 4]);
    }

    #[test]
    fn test_first_neighbors_cycles() {
        let adj = star();
        let sampled = FirstNeighborsSampler.sample(&[0, 2], &adj, 4).unwrap();
        assert_eq!(sampled, vec![1, 2, 3, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn test_bound_sampler_rejects_zero() {
        let err = BoundSampler::new(Box::new(FirstNeighborsSampler), 0).unwrap_err();
        assert_eq!(err, SamplingError::InvalidSampleCount(0));
    }

    struct ShortSampler;

    impl Sampler for ShortSampler {
        fn sample(&self, ids: &[NodeId], _adj: &dyn Adjacency, _n: usize) -> Result<Vec<NodeId>> {
            Ok(ids.to_vec())
        }
    }

    #[test]
    fn test_bound_sampler_checks_contract() {
        let adj = star();
        let bound = BoundSampler::new(Box::new(ShortSampler), 3).unwrap();

        let err = bound.sample(&[0, 1], &adj).unwrap_err();
        assert_eq!(err, SamplingError::SampleCount { expected: 6, got: 2 });
    }

    #[test]
    fn test_bound_sampler_propagates_strategy_error() {
        let adj = star();
        let bound = BoundSampler::new(Box::new(FirstNeighborsSampler), 2).unwrap();

        let err = bound.sample(&[42], &adj).unwrap_err();
        assert_eq!(err, SamplingError::MissingNode(42));
        assert_eq!(bound.n_samples(), 2);
        assert!(format!("{:?}", bound).contains("first_neighbors"));
    }
}
