//! Error types for graphsage-core.

use crate::NodeId;
use thiserror::Error;

/// Error raised while building adjacency or sampling neighborhoods.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SamplingError {
    /// The adjacency structure has no entry for this node.
    #[error("node {0} has no adjacency entry")]
    MissingNode(NodeId),

    /// The node exists but has no neighbors to draw from.
    #[error("node {0} has no neighbors to sample")]
    NoNeighbors(NodeId),

    /// A sampler was bound with a sample count of zero.
    #[error("invalid sample count: {0} (must be positive)")]
    InvalidSampleCount(usize),

    /// A sampling strategy returned the wrong number of ids.
    #[error("sampler returned {got} ids, expected {expected}")]
    SampleCount { expected: usize, got: usize },

    /// An edge endpoint lies outside the node range.
    #[error("edge ({src}, {dst}) out of range for {num_nodes} nodes")]
    InvalidEdge {
        src: NodeId,
        dst: NodeId,
        num_nodes: usize,
    },
}

/// Result type for sampling operations.
pub type Result<T> = std::result::Result<T, SamplingError>;
