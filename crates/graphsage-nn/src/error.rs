//! Error types for graphsage-nn.

use graphsage_core::{NodeId, SamplingError};
use thiserror::Error;

/// GraphSAGE model error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Candle tensor error.
    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    /// Neighbor rows are not a positive multiple of self rows.
    #[error("shape mismatch: {neighbor_rows} neighbor rows for {self_rows} self rows")]
    ShapeMismatch { self_rows: usize, neighbor_rows: usize },

    /// Reduction did not end with exactly one feature level.
    #[error("reduction ended with {remaining} feature levels, expected 1")]
    ReductionInvariant { remaining: usize },

    /// Error raised by a neighbor sampler, passed through unchanged.
    #[error(transparent)]
    Sampling(#[from] SamplingError),

    /// Dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Node id has no row in the feature matrix.
    #[error("node {id} out of range for {num_nodes} feature rows")]
    NodeOutOfRange { id: NodeId, num_nodes: usize },

    /// Forward pass called with no query ids.
    #[error("empty batch: at least one query id is required")]
    EmptyBatch,

    /// Invalid configuration.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
