#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::doc_markdown)]

//! Graph structure and neighbor sampling for GraphSAGE.
//!
//! GraphSAGE never looks at a full neighborhood. For each query node it draws
//! a fixed number of neighbors per hop, so the cost of a mini-batch is
//! bounded by the fanout rather than by node degree:
//!
//! ```text
//! hop 0:  ids                         (N)
//! hop 1:  sample(ids, k1)             (N * k1)
//! hop 2:  sample(hop 1, k2)           (N * k1 * k2)
//! ```
//!
//! This crate provides the pieces the model consumes:
//!
//! - [`Adjacency`] - Read-only neighbor lookup
//! - [`AdjacencyList`] - In-memory adjacency lists
//! - [`Sampler`] - Pluggable sampling strategy
//! - [`BoundSampler`] - A strategy bound to a per-layer sample count
//! - [`UniformSampler`], [`FirstNeighborsSampler`] - Reference strategies
//!
//! # Example
//!
//! ```rust
//! use graphsage_core::{AdjacencyList, BoundSampler, FirstNeighborsSampler};
//!
//! let adj = AdjacencyList::from_edges(4, &[(0, 1), (1, 2), (2, 3)], true).unwrap();
//! let hop1 = BoundSampler::new(Box::new(FirstNeighborsSampler), 2).unwrap();
//! let hop2 = BoundSampler::new(Box::new(FirstNeighborsSampler), 2).unwrap();
//!
//! let frontier = hop1.sample(&[1], &adj).unwrap();
//! assert_eq!(frontier, vec![0, 2]);
//!
//! let frontier = hop2.sample(&frontier, &adj).unwrap();
//! assert_eq!(frontier, vec![1, 1, 1, 3]);
//! ```
//!
//! # Reference
//!
//! Hamilton, Ying & Leskovec, "Inductive Representation Learning on Large
//! Graphs", NeurIPS 2017.

mod error;
mod graph;
pub mod sampling;

pub use error::{Result, SamplingError};
pub use graph::{Adjacency, AdjacencyList};
pub use sampling::{BoundSampler, FirstNeighborsSampler, Sampler, UniformSampler};

/// Node identifier. Also the row index into the feature matrix.
pub type NodeId = u32;
