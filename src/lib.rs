//! Supervised GraphSAGE for multi-label node classification.
//!
//! `graphsage` bundles the two workspace crates:
//!
//! - Sample a fixed fanout of neighbors per hop
//! - Telescope the sampled feature levels into one embedding per node
//! - Classify embeddings with one logit per label
//! - Train with multi-label soft-margin loss, gradient clipping and Adam
//!
//! # Crate Structure
//!
//! - [`graphsage_core`] - Adjacency, samplers and node ids
//! - [`graphsage_nn`] - Aggregators, model, loss, training step
//!
//! # Example
//!
//! ```rust
//! use candle_core::{Device, Tensor};
//! use graphsage::{AdjacencyList, LayerSpec, ModelConfig, Trainer, UniformSampler};
//!
//! let device = Device::Cpu;
//! let adj = AdjacencyList::from_edges(6, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)], true).unwrap();
//! let features = Tensor::randn(0f32, 1f32, (6, 4), &device).unwrap();
//! let labels = Tensor::from_slice(&[1f32, 0.0, 0.0, 1.0], (2, 2), &device).unwrap();
//!
//! let config = ModelConfig::new(4, 2);
//! let specs = vec![
//!     LayerSpec::new(UniformSampler::new(0), 3, 8),
//!     LayerSpec::new(UniformSampler::new(1), 3, 8),
//! ];
//! let mut trainer = Trainer::new(&config, specs, &device).unwrap();
//!
//! for _ in 0..5 {
//!     let (_, loss) = trainer.train_step(&[0, 3], &features, &adj, &labels).unwrap();
//!     println!("loss {loss:.4}");
//! }
//! ```

pub use graphsage_core;
pub use graphsage_nn;

// Graph structure and sampling
pub use graphsage_core::{
    Adjacency, AdjacencyList, BoundSampler, FirstNeighborsSampler, NodeId, Result as SamplingResult, Sampler,
    SamplingError, UniformSampler,
};

// Model and training
pub use graphsage_nn::{
    l2_normalize, macro_f1, micro_f1, multilabel_soft_margin_loss, Activation, AutodiffContext, CombinePolicy,
    Error, LayerSpec, LayerStack, MeanAggregator, ModelConfig, OptimizerState, Result, SupervisedGraphSage,
    Trainer,
};
