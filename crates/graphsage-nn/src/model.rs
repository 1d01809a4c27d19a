//! Supervised GraphSAGE for multi-label node classification.
//!
//! A forward pass has three stages:
//!
//! 1. **Sample**: starting from the query ids, each layer's sampler expands
//!    the current frontier by `n_samples` neighbors per node. Features are
//!    gathered for every frontier, giving `L + 1` feature levels.
//! 2. **Reduce**: the layer stack telescopes the levels down to one
//!    embedding per query id (see [`crate::layer`]).
//! 3. **Classify**: embeddings are L2-normalized row-wise and projected to
//!    one logit per class.
//!
//! With no layers the model is a linear classifier on normalized raw
//! features.

use crate::error::{Error, Result};
use crate::layer::{LayerSpec, LayerStack};
use candle_core::{DType, Device, Tensor, Var, D};
use candle_nn::{linear, Linear, Module, VarBuilder, VarMap};
use graphsage_core::{Adjacency, BoundSampler, NodeId};
use tracing::debug;

/// Floor on the row norm in [`l2_normalize`].
const NORM_EPS: f64 = 1e-12;

/// Scale every row of `x` to unit Euclidean norm.
///
/// Computes `x / max(||x||, 1e-12)`, so all-zero rows stay zero.
pub fn l2_normalize(x: &Tensor) -> candle_core::Result<Tensor> {
    let norm = x.sqr()?.sum_keepdim(D::Minus1)?.sqrt()?.maximum(NORM_EPS)?;
    x.broadcast_div(&norm)
}

/// Row count of every feature level, query level first.
fn level_rows(levels: &[Tensor]) -> Vec<usize> {
    levels.iter().map(|l| l.dims()[0]).collect()
}

/// GraphSAGE model with a linear multi-label classifier on top.
///
/// Owns every learnable parameter through its [`VarMap`]; optimizers are
/// built from [`SupervisedGraphSage::parameters`].
pub struct SupervisedGraphSage {
    samplers: Vec<BoundSampler>,
    stack: LayerStack,
    fc: Linear,
    varmap: VarMap,
    num_classes: usize,
}

impl SupervisedGraphSage {
    /// Build the model.
    ///
    /// # Arguments
    /// - `input_dim`: Feature width
    /// - `num_classes`: Number of labels
    /// - `layer_specs`: One spec per hop, closest hop first
    /// - `device`: Where parameters live (features must be on the same device)
    pub fn new(input_dim: usize, num_classes: usize, layer_specs: Vec<LayerSpec>, device: &Device) -> Result<Self> {
        if num_classes == 0 {
            return Err(Error::InvalidConfig("num_classes must be positive".into()));
        }

        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);

        let stack = LayerStack::new(input_dim, &layer_specs, vb.pp("layers"))?;
        let fc = linear(stack.output_dim(), num_classes, vb.pp("fc"))?;

        let samplers = layer_specs
            .into_iter()
            .map(|spec| BoundSampler::new(spec.sampler, spec.n_samples))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            samplers,
            stack,
            fc,
            varmap,
            num_classes,
        })
    }

    pub fn input_dim(&self) -> usize {
        self.stack.input_dim()
    }

    /// Width of the embedding fed to the classifier.
    pub fn output_dim(&self) -> usize {
        self.stack.output_dim()
    }

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn num_layers(&self) -> usize {
        self.stack.len()
    }

    pub fn layers(&self) -> &LayerStack {
        &self.stack
    }

    /// All learnable parameters.
    pub fn parameters(&self) -> Vec<Var> {
        self.varmap.all_vars()
    }

    /// Gather feature rows for `ids`.
    fn gather(&self, features: &Tensor, ids: &[NodeId]) -> Result<Tensor> {
        let (num_nodes, dim) = features.dims2()?;
        if dim != self.input_dim() {
            return Err(Error::DimensionMismatch {
                expected: self.input_dim(),
                got: dim,
            });
        }
        if let Some(&id) = ids.iter().find(|&&id| id as usize >= num_nodes) {
            return Err(Error::NodeOutOfRange { id, num_nodes });
        }

        let index = Tensor::from_slice(ids, ids.len(), features.device())?;
        Ok(features.index_select(&index, 0)?)
    }

    /// Sample every hop and gather the feature levels.
    ///
    /// # Returns
    /// `num_layers + 1` tensors; level `k` has `ids.len() * n_1 * ... * n_k` rows.
    pub fn sample_levels(&self, ids: &[NodeId], features: &Tensor, adj: &dyn Adjacency) -> Result<Vec<Tensor>> {
        if ids.is_empty() {
            return Err(Error::EmptyBatch);
        }

        let mut levels = Vec::with_capacity(self.samplers.len() + 1);
        levels.push(self.gather(features, ids)?);

        let mut frontier = ids.to_vec();
        for sampler in &self.samplers {
            frontier = sampler.sample(&frontier, adj)?;
            levels.push(self.gather(features, &frontier)?);
        }

        Ok(levels)
    }

    /// Normalized embeddings for `ids` (N x output_dim).
    pub fn embed(&self, ids: &[NodeId], features: &Tensor, adj: &dyn Adjacency) -> Result<Tensor> {
        let levels = self.sample_levels(ids, features, adj)?;
        debug!(
            batch = ids.len(),
            levels = levels.len(),
            rows = ?level_rows(&levels),
            "sampled feature levels"
        );

        let out = self.stack.reduce(levels)?;
        Ok(l2_normalize(&out)?)
    }

    /// Class logits for `ids` (N x num_classes).
    pub fn forward(&self, ids: &[NodeId], features: &Tensor, adj: &dyn Adjacency) -> Result<Tensor> {
        let embedding = self.embed(ids, features, adj)?;
        self.classify(&embedding)
    }

    /// Apply the classifier to precomputed embeddings.
    pub fn classify(&self, embedding: &Tensor) -> Result<Tensor> {
        Ok(self.fc.forward(embedding)?)
    }

    /// 0/1 label predictions (`u8`, N x num_classes): a label is on when its
    /// logit is positive, i.e. its probability exceeds 0.5.
    pub fn predict(&self, ids: &[NodeId], features: &Tensor, adj: &dyn Adjacency) -> Result<Tensor> {
        let logits = self.forward(ids, features, adj)?;
        Ok(logits.gt(0f32)?)
    }
}
