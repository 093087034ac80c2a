//! Disjoint-union batching.
//!
//! [`GraphBatch`] concatenates a sequence of [`GraphData`] into one large
//! graph: node- and edge-indexed attributes are concatenated along their
//! leading dimension, graph-level attributes are stacked, and `edge_index`
//! columns are shifted by the running node count so node ids stay globally
//! unique. The batch keeps enough bookkeeping to slice any member graph back
//! out bit-identically.
//!
//! # Example
//!
//! ```rust
//! use candle_core::{Device, Tensor};
//! use grafo::{batch, GraphData};
//!
//! # fn main() -> grafo::Result<()> {
//! let device = Device::Cpu;
//! let g = GraphData::new(Tensor::new(&[[0u32, 1, 2], [1, 2, 0]], &device)?)?;
//!
//! let batch = batch(&[g.clone(), g.clone()])?;
//! assert_eq!(batch.num_nodes(), 6);
//! assert_eq!(batch.num_edges(), 6);
//!
//! let restored = batch.get(1)?;
//! assert!(restored.content_eq(&g)?);
//! # Ok(())
//! # }
//! ```

use crate::data::graph::AttrKind;
use crate::{Error, GraphData, Result};
use candle_core::{Device, Tensor};
use std::ops::{Deref, Range};

/// A disjoint union of graphs, usable anywhere a single graph is.
#[derive(Debug, Clone)]
pub struct GraphBatch {
    data: GraphData,
    /// Prefix sums of member node counts, length `num_graphs + 1`.
    cumulative_nodes: Vec<usize>,
    /// Prefix sums of member edge counts, length `num_graphs + 1`.
    cumulative_edges: Vec<usize>,
    /// `(N_total,)` u32 tensor mapping each node to its source graph.
    batch_indices: Tensor,
}

/// Batch a sequence of graphs into their disjoint union.
///
/// Convenience wrapper over [`GraphBatch::from_graphs`].
pub fn batch(graphs: &[GraphData]) -> Result<GraphBatch> {
    let refs: Vec<&GraphData> = graphs.iter().collect();
    GraphBatch::from_graphs(&refs)
}

impl GraphBatch {
    /// Build a batch from graph references (the loader batches shuffled,
    /// non-contiguous selections this way).
    ///
    /// All graphs must carry identical attribute sets; a graph missing an
    /// attribute the first graph has (or vice versa) is rejected rather than
    /// filled with defaults.
    pub fn from_graphs(graphs: &[&GraphData]) -> Result<Self> {
        let first = *graphs.first().ok_or(Error::EmptyBatch)?;
        for (i, g) in graphs.iter().enumerate().skip(1) {
            check_same_attributes(first, g, i)?;
        }

        let mut cumulative_nodes = Vec::with_capacity(graphs.len() + 1);
        let mut cumulative_edges = Vec::with_capacity(graphs.len() + 1);
        cumulative_nodes.push(0);
        cumulative_edges.push(0);
        for g in graphs {
            cumulative_nodes.push(cumulative_nodes.last().unwrap() + g.num_nodes());
            cumulative_edges.push(cumulative_edges.last().unwrap() + g.num_edges());
        }
        let total_nodes = *cumulative_nodes.last().unwrap();
        let device = device_of(first);

        let mut data = GraphData::empty()
            .with_num_nodes(total_nodes)?
            .with_graph_rows(graphs.len())?;

        if first.edge_index().is_some() {
            let mut shifted = Vec::with_capacity(graphs.len());
            for (k, g) in graphs.iter().enumerate() {
                let ei = g.edge_index().ok_or(Error::EmptyBatch)?;
                let offset = Tensor::new(cumulative_nodes[k] as u32, ei.device())?;
                shifted.push(ei.broadcast_add(&offset)?);
            }
            let refs: Vec<&Tensor> = shifted.iter().collect();
            data = data.with_edge_index(Tensor::cat(&refs, 1)?)?;
        }

        if let Some(t) = cat_field(graphs, |g| g.node_features())? {
            data = data.with_node_features(t)?;
        }
        if let Some(t) = cat_field(graphs, |g| g.edge_features())? {
            data = data.with_edge_features(t)?;
        }
        if let Some(t) = cat_field(graphs, |g| g.graph_features())? {
            data = data.with_graph_features(t)?;
        }
        if let Some(t) = cat_field(graphs, |g| g.node_labels())? {
            data = data.with_node_labels(t)?;
        }
        if let Some(t) = cat_field(graphs, |g| g.edge_labels())? {
            data = data.with_edge_labels(t)?;
        }
        if let Some(t) = cat_field(graphs, |g| g.graph_labels())? {
            data = data.with_graph_labels(t)?;
        }
        for (name, kind, _) in first.extra_attrs() {
            let parts: Vec<&Tensor> = graphs
                .iter()
                .enumerate()
                .map(|(i, g)| {
                    g.attr(name).ok_or(Error::AttributeMismatch {
                        attribute: name.to_string(),
                        graph: i,
                    })
                })
                .collect::<Result<_>>()?;
            data = data.with_attr(name, kind, Tensor::cat(&parts, 0)?)?;
        }

        let owners: Vec<u32> = graphs
            .iter()
            .enumerate()
            .flat_map(|(k, g)| std::iter::repeat(k as u32).take(g.num_nodes()))
            .collect();
        let batch_indices = Tensor::from_vec(owners, total_nodes, &device)?;

        Ok(Self {
            data,
            cumulative_nodes,
            cumulative_edges,
            batch_indices,
        })
    }

    /// Number of member graphs.
    pub fn num_graphs(&self) -> usize {
        self.cumulative_nodes.len() - 1
    }

    /// Per-node owning-graph index tensor, shape `(num_nodes,)`.
    pub fn batch_indices(&self) -> &Tensor {
        &self.batch_indices
    }

    /// Node-count prefix sums (length `num_graphs + 1`).
    pub fn cumulative_nodes(&self) -> &[usize] {
        &self.cumulative_nodes
    }

    /// Edge-count prefix sums (length `num_graphs + 1`).
    pub fn cumulative_edges(&self) -> &[usize] {
        &self.cumulative_edges
    }

    /// The concatenated graph.
    pub fn data(&self) -> &GraphData {
        &self.data
    }

    /// Reconstruct member graph `k` exactly as it was passed in.
    pub fn get(&self, k: usize) -> Result<GraphData> {
        let len = self.num_graphs();
        if k >= len {
            return Err(Error::IndexOutOfBounds { index: k, len });
        }
        let node_start = self.cumulative_nodes[k];
        let num_nodes = self.cumulative_nodes[k + 1] - node_start;
        let edge_start = self.cumulative_edges[k];
        let num_edges = self.cumulative_edges[k + 1] - edge_start;

        let mut g = GraphData::empty().with_num_nodes(num_nodes)?;

        if let Some(ei) = self.data.edge_index() {
            let slice = ei.narrow(1, edge_start, num_edges)?;
            let offset = Tensor::new(node_start as u32, ei.device())?;
            g = g.with_edge_index(slice.broadcast_sub(&offset)?)?;
        }
        if let Some(t) = self.data.node_features() {
            g = g.with_node_features(t.narrow(0, node_start, num_nodes)?)?;
        }
        if let Some(t) = self.data.edge_features() {
            g = g.with_edge_features(t.narrow(0, edge_start, num_edges)?)?;
        }
        if let Some(t) = self.data.graph_features() {
            g = g.with_graph_features(t.narrow(0, k, 1)?)?;
        }
        if let Some(t) = self.data.node_labels() {
            g = g.with_node_labels(t.narrow(0, node_start, num_nodes)?)?;
        }
        if let Some(t) = self.data.edge_labels() {
            g = g.with_edge_labels(t.narrow(0, edge_start, num_edges)?)?;
        }
        if let Some(t) = self.data.graph_labels() {
            g = g.with_graph_labels(t.narrow(0, k, 1)?)?;
        }
        for (name, kind, t) in self.data.extra_attrs() {
            let slice = match kind {
                AttrKind::Node => t.narrow(0, node_start, num_nodes)?,
                AttrKind::Edge => t.narrow(0, edge_start, num_edges)?,
                AttrKind::Graph => t.narrow(0, k, 1)?,
            };
            g = g.with_attr(name, kind, slice)?;
        }

        Ok(g)
    }

    /// Reconstruct a contiguous range of member graphs.
    pub fn get_range(&self, range: Range<usize>) -> Result<Vec<GraphData>> {
        range.map(|k| self.get(k)).collect()
    }
}

impl Deref for GraphBatch {
    type Target = GraphData;

    fn deref(&self) -> &GraphData {
        &self.data
    }
}

/// Concatenate one conventional attribute across graphs along dim 0.
fn cat_field<'a>(
    graphs: &'a [&'a GraphData],
    field: impl Fn(&'a GraphData) -> Option<&'a Tensor>,
) -> Result<Option<Tensor>> {
    if field(graphs[0]).is_none() {
        return Ok(None);
    }
    let parts: Vec<&Tensor> = graphs
        .iter()
        .map(|&g| field(g).ok_or(Error::EmptyBatch))
        .collect::<Result<_>>()?;
    Ok(Some(Tensor::cat(&parts, 0)?))
}

fn check_same_attributes(first: &GraphData, other: &GraphData, index: usize) -> Result<()> {
    let names = [
        "edge_index",
        "node_features",
        "edge_features",
        "graph_features",
        "node_labels",
        "edge_labels",
        "graph_labels",
    ];
    for name in names {
        if first.attr(name).is_some() != other.attr(name).is_some() {
            return Err(Error::AttributeMismatch {
                attribute: name.to_string(),
                graph: index,
            });
        }
    }
    let first_extra: Vec<_> = first.extra_attrs().map(|(n, k, _)| (n, k)).collect();
    let other_extra: Vec<_> = other.extra_attrs().map(|(n, k, _)| (n, k)).collect();
    if first_extra != other_extra {
        let attribute = first_extra
            .iter()
            .map(|(n, _)| *n)
            .find(|n| !other_extra.iter().any(|(m, _)| m == n))
            .unwrap_or_else(|| other_extra.first().map(|(n, _)| *n).unwrap_or("<extra>"))
            .to_string();
        return Err(Error::AttributeMismatch {
            attribute,
            graph: index,
        });
    }
    Ok(())
}

fn device_of(g: &GraphData) -> Device {
    g.conventional()
        .iter()
        .flatten()
        .next()
        .map(|t| t.device().clone())
        .unwrap_or(Device::Cpu)
}
