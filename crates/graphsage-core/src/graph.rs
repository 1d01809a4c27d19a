use crate::{NodeId, Result, SamplingError};
use serde::{Deserialize, Serialize};

/// Read-only neighbor lookup consumed by samplers.
///
/// Implementations map a node id to the ids of its neighbors. The trait is
/// object safe so samplers can be written against `&dyn Adjacency`.
pub trait Adjacency {
    /// Neighbors of `id`, or `None` if the structure has no entry for it.
    fn neighbors(&self, id: NodeId) -> Option<&[NodeId]>;

    /// Number of nodes with an entry.
    fn num_nodes(&self) -> usize;
}

/// In-memory adjacency lists indexed by node id.
///
/// # Example
///
/// ```rust
/// use graphsage_core::{Adjacency, AdjacencyList};
///
/// let adj = AdjacencyList::from_edges(3, &[(0, 1), (1, 2)], true).unwrap();
///
/// assert_eq!(adj.neighbors(1), Some(&[0, 2][..]));
/// assert_eq!(adj.num_edges(), 4);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacencyList {
    rows: Vec<Vec<NodeId>>,
}

impl AdjacencyList {
    /// Create an adjacency with `num_nodes` isolated nodes.
    pub fn new(num_nodes: usize) -> Self {
        Self {
            rows: vec![Vec::new(); num_nodes],
        }
    }

    /// Build from per-node neighbor rows. Row `i` lists the neighbors of node `i`.
    pub fn from_rows(rows: Vec<Vec<NodeId>>) -> Result<Self> {
        let num_nodes = rows.len();
        for (src, row) in rows.iter().enumerate() {
            if let Some(&dst) = row.iter().find(|&&dst| dst as usize >= num_nodes) {
                return Err(SamplingError::InvalidEdge {
                    src: src as NodeId,
                    dst,
                    num_nodes,
                });
            }
        }
        Ok(Self { rows })
    }

    /// Build from an edge list.
    ///
    /// With `undirected`, every edge `(a, b)` also inserts `(b, a)`.
    /// Neighbor order follows edge order.
    pub fn from_edges(num_nodes: usize, edges: &[(NodeId, NodeId)], undirected: bool) -> Result<Self> {
        let mut adj = Self::new(num_nodes);
        for &(src, dst) in edges {
            adj.add_edge(src, dst)?;
            if undirected && src != dst {
                adj.add_edge(dst, src)?;
            }
        }
        Ok(adj)
    }

    /// Add a directed edge `src -> dst`.
    pub fn add_edge(&mut self, src: NodeId, dst: NodeId) -> Result<()> {
        let num_nodes = self.rows.len();
        if src as usize >= num_nodes || dst as usize >= num_nodes {
            return Err(SamplingError::InvalidEdge { src, dst, num_nodes });
        }
        self.rows[src as usize].push(dst);
        Ok(())
    }

    /// Out-degree of `id` (0 for unknown nodes).
    pub fn degree(&self, id: NodeId) -> usize {
        self.rows.get(id as usize).map_or(0, Vec::len)
    }

    /// Total number of directed edges.
    pub fn num_edges(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        (id as usize) < self.rows.len()
    }

    /// Largest out-degree in the graph.
    pub fn max_degree(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

impl Adjacency for AdjacencyList {
    fn neighbors(&self, id: NodeId) -> Option<&[NodeId]> {
        self.rows.get(id as usize).map(Vec::as_slice)
    }

    fn num_nodes(&self) -> usize {
        self.rows.len()
    }
}
