#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::neg_cmp_op_on_partial_ord)]

//! Supervised GraphSAGE on candle.
//!
//! `graphsage-nn` turns the sampled neighborhoods of `graphsage-core` into
//! node embeddings and multi-label class scores, and trains the whole thing
//! end to end.
//!
//! # Modules
//!
//! - [`aggregator`]: Mean aggregator and combine policies
//! - [`layer`]: Layer specs, the aggregator stack, telescoping reduction
//! - [`model`]: [`SupervisedGraphSage`] forward pass
//! - [`train`]: Training step with gradient clipping and Adam
//! - [`loss`], [`metrics`]: Multi-label loss and F1 scores
//!
//! # Example: Forward Pass
//!
//! ```rust
//! use candle_core::{Device, Tensor};
//! use graphsage_core::{AdjacencyList, UniformSampler};
//! use graphsage_nn::{LayerSpec, SupervisedGraphSage};
//!
//! let device = Device::Cpu;
//! let adj = AdjacencyList::from_edges(5, &[(0, 1), (1, 2), (2, 3), (3, 4)], true).unwrap();
//! let features = Tensor::randn(0f32, 1f32, (5, 8), &device).unwrap();
//!
//! let specs = vec![
//!     LayerSpec::new(UniformSampler::new(7), 2, 4),
//!     LayerSpec::new(UniformSampler::new(8), 4, 4),
//! ];
//! let model = SupervisedGraphSage::new(8, 3, specs, &device).unwrap();
//!
//! let logits = model.forward(&[0, 2, 4], &features, &adj).unwrap();
//! assert_eq!(logits.dims(), &[3, 3]);
//! ```
//!
//! # Reference
//!
//! Hamilton, Ying & Leskovec, "Inductive Representation Learning on Large
//! Graphs", NeurIPS 2017.

pub mod activation;
pub mod aggregator;
mod config;
mod error;
pub mod layer;
pub mod loss;
pub mod metrics;
pub mod model;
pub mod train;

pub use activation::Activation;
pub use aggregator::{CombinePolicy, MeanAggregator};
pub use config::ModelConfig;
pub use error::{Error, Result};
pub use layer::{reduce_levels, LayerSpec, LayerStack};
pub use loss::multilabel_soft_margin_loss;
pub use metrics::{macro_f1, micro_f1};
pub use model::{l2_normalize, SupervisedGraphSage};
pub use train::{clip_grad_norm, grad_norm, AutodiffContext, OptimizerState, Trainer};
