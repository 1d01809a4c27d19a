//! Layer specs, the aggregator stack and the telescoping reduction.
//!
//! After sampling, the model holds one feature level per hop:
//!
//! ```text
//! [ h(ids), h(hop 1), h(hop 2), ..., h(hop L) ]      L + 1 levels
//! ```
//!
//! Each reduction round applies one aggregator to every adjacent pair of
//! levels and yields a list one shorter. After `L` rounds a single level
//! remains: one embedding per query id.
//!
//! ```text
//! round 1 (stack[0]):  [agg(h0, h1), agg(h1, h2)]     L = 2
//! round 2 (stack[1]):  [agg(.., ..)]
//! ```
//!
//! The same aggregator serves every pair within a round, so its weights are
//! shared across hop positions.

use crate::activation::Activation;
use crate::aggregator::{CombinePolicy, MeanAggregator};
use crate::error::{Error, Result};
use candle_core::Tensor;
use candle_nn::VarBuilder;
use graphsage_core::Sampler;
use std::fmt;
use tracing::trace;

/// One hop of the model: how to sample it and how to aggregate it.
pub struct LayerSpec {
    /// Neighbor-sampling strategy for this hop.
    pub sampler: Box<dyn Sampler>,
    /// Neighbors drawn per node.
    pub n_samples: usize,
    /// Nominal projection width. The effective width depends on `combine`.
    pub output_dim: usize,
    pub activation: Option<Activation>,
    pub combine: CombinePolicy,
}

impl LayerSpec {
    /// Spec with ReLU activation and concatenation.
    pub fn new(sampler: impl Sampler + 'static, n_samples: usize, output_dim: usize) -> Self {
        Self {
            sampler: Box::new(sampler),
            n_samples,
            output_dim,
            activation: Some(Activation::Relu),
            combine: CombinePolicy::default(),
        }
    }

    pub fn with_activation(mut self, activation: Option<Activation>) -> Self {
        self.activation = activation;
        self
    }

    pub fn with_combine(mut self, combine: CombinePolicy) -> Self {
        self.combine = combine;
        self
    }
}

impl fmt::Debug for LayerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerSpec")
            .field("sampler", &self.sampler.name())
            .field("n_samples", &self.n_samples)
            .field("output_dim", &self.output_dim)
            .field("activation", &self.activation)
            .field("combine", &self.combine)
            .finish()
    }
}

/// Ordered aggregators, one per hop.
///
/// Layer `i + 1` consumes the effective output width of layer `i`.
pub struct LayerStack {
    layers: Vec<MeanAggregator>,
    input_dim: usize,
}

impl LayerStack {
    /// Build the stack, wiring each layer's input width from the previous
    /// layer's effective output width.
    pub fn new(input_dim: usize, specs: &[LayerSpec], vb: VarBuilder) -> Result<Self> {
        if input_dim == 0 {
            return Err(Error::InvalidConfig("input_dim must be positive".into()));
        }

        let mut layers = Vec::with_capacity(specs.len());
        let mut dim = input_dim;
        for (i, spec) in specs.iter().enumerate() {
            if spec.output_dim == 0 {
                return Err(Error::InvalidConfig(format!("layer {i}: output_dim must be positive")));
            }
            let agg = MeanAggregator::new(
                dim,
                spec.output_dim,
                spec.activation,
                spec.combine,
                vb.pp(format!("agg_{i}")),
            )?;
            dim = agg.output_dim();
            layers.push(agg);
        }

        Ok(Self { layers, input_dim })
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    /// Width of the terminal embedding (the input width for an empty stack).
    pub fn output_dim(&self) -> usize {
        self.layers.last().map_or(self.input_dim, MeanAggregator::output_dim)
    }

    pub fn layers(&self) -> &[MeanAggregator] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Run every reduction round and return the single remaining level.
    ///
    /// # Errors
    /// [`Error::ReductionInvariant`] if the level count does not match the
    /// number of layers (anything other than one level left at the end).
    pub fn reduce(&self, levels: Vec<Tensor>) -> Result<Tensor> {
        let mut levels = levels;
        for (round, agg) in self.layers.iter().enumerate() {
            let before = levels.len();
            levels = reduce_levels(&levels, agg)?;
            trace!(round, before, after = levels.len(), "reduction round");
        }

        let remaining = levels.len();
        match levels.pop() {
            Some(out) if remaining == 1 => Ok(out),
            _ => Err(Error::ReductionInvariant { remaining }),
        }
    }
}

/// One reduction round: aggregate every adjacent pair of levels.
///
/// Returns a list exactly one element shorter than `levels`.
pub fn reduce_levels(levels: &[Tensor], agg: &MeanAggregator) -> Result<Vec<Tensor>> {
    if levels.is_empty() {
        return Err(Error::ReductionInvariant { remaining: 0 });
    }
    levels
        .windows(2)
        .map(|pair| agg.aggregate(&pair[0], &pair[1]))
        .collect()
}
