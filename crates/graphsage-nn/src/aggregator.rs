//! Mean aggregator: the per-hop GraphSAGE layer.
//!
//! A node's new representation combines its own features with a summary of
//! its sampled neighbors:
//!
//! ```text
//! x_emb   = W_self  * h_v
//! neib    = W_neib  * mean({h_u : u in Sample(N(v))})
//! h_v'    = sigma(COMBINE(x_emb, neib))
//! ```
//!
//! Neighbors arrive as a flat batch grouped by node (`N * k` rows for `N`
//! nodes), so pooling is a reshape to `(N, k, D)` followed by a mean over
//! the sample axis.
//!
//! # Reference
//!
//! Hamilton et al., "Inductive Representation Learning on Large Graphs",
//! NeurIPS 2017.

use crate::activation::Activation;
use crate::error::{Error, Result};
use candle_core::{Tensor, D};
use candle_nn::{linear_no_bias, Linear, Module, VarBuilder};
use serde::{Deserialize, Serialize};

/// How the self and neighbor projections are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombinePolicy {
    /// `[x_emb | neib_emb]` along the feature axis.
    #[default]
    Concatenate,
    /// `x_emb + neib_emb`
    Sum,
}

impl CombinePolicy {
    /// Width produced when both inputs have width `dim`.
    pub fn output_dim(self, dim: usize) -> usize {
        match self {
            CombinePolicy::Concatenate => 2 * dim,
            CombinePolicy::Sum => dim,
        }
    }

    pub fn combine(self, x_emb: &Tensor, neib_emb: &Tensor) -> Result<Tensor> {
        let out = match self {
            CombinePolicy::Concatenate => Tensor::cat(&[x_emb, neib_emb], D::Minus1)?,
            CombinePolicy::Sum => (x_emb + neib_emb)?,
        };
        Ok(out)
    }
}

/// GraphSAGE mean aggregator.
///
/// Holds two bias-free projections (`fc_x` for the node itself, `fc_neib`
/// for the pooled neighbors), an optional activation and a combine policy.
pub struct MeanAggregator {
    fc_x: Linear,
    fc_neib: Linear,
    activation: Option<Activation>,
    combine: CombinePolicy,
    input_dim: usize,
    hidden_dim: usize,
}

impl MeanAggregator {
    /// Create a new mean aggregator.
    ///
    /// # Arguments
    /// - `input_dim`: Width of incoming features
    /// - `hidden_dim`: Width of each projection (the layer's nominal `output_dim`)
    /// - `activation`: Applied after combining, if any
    /// - `combine`: Merge policy; decides the effective output width
    /// - `vb`: Variable builder for parameter initialization
    pub fn new(
        input_dim: usize,
        hidden_dim: usize,
        activation: Option<Activation>,
        combine: CombinePolicy,
        vb: VarBuilder,
    ) -> Result<Self> {
        let fc_x = linear_no_bias(input_dim, hidden_dim, vb.pp("fc_x"))?;
        let fc_neib = linear_no_bias(input_dim, hidden_dim, vb.pp("fc_neib"))?;

        Ok(Self {
            fc_x,
            fc_neib,
            activation,
            combine,
            input_dim,
            hidden_dim,
        })
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    /// Effective output width after combining.
    ///
    /// Twice the nominal width under [`CombinePolicy::Concatenate`].
    pub fn output_dim(&self) -> usize {
        self.combine.output_dim(self.hidden_dim)
    }

    pub fn combine_policy(&self) -> CombinePolicy {
        self.combine
    }

    pub fn activation(&self) -> Option<Activation> {
        self.activation
    }

    /// Aggregate one level into the level above it.
    ///
    /// # Arguments
    /// - `x`: Self features (N x input_dim)
    /// - `neibs`: Sampled neighbor features ((N * k) x input_dim), grouped by node
    ///
    /// # Returns
    /// - Embeddings (N x output_dim)
    pub fn aggregate(&self, x: &Tensor, neibs: &Tensor) -> Result<Tensor> {
        let (self_rows, x_dim) = x.dims2()?;
        let (neighbor_rows, neib_dim) = neibs.dims2()?;

        // k must be a positive integer: no truncation, no padding
        if self_rows == 0 || neighbor_rows == 0 || neighbor_rows % self_rows != 0 {
            return Err(Error::ShapeMismatch {
                self_rows,
                neighbor_rows,
            });
        }
        for got in [x_dim, neib_dim] {
            if got != self.input_dim {
                return Err(Error::DimensionMismatch {
                    expected: self.input_dim,
                    got,
                });
            }
        }

        let x_emb = self.fc_x.forward(x)?;

        let k = neighbor_rows / self_rows;
        let pooled = neibs.reshape((self_rows, k, neib_dim))?.mean(1)?;
        let neib_emb = self.fc_neib.forward(&pooled)?;

        let out = self.combine.combine(&x_emb, &neib_emb)?;
        match &self.activation {
            Some(act) => Ok(act.apply(&out)?),
            None => Ok(out),
        }
    }
}
