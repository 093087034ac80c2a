//! Message-passing convolutional layers.
//!
//! Implements standard GNN architectures:
//! - [`GCNConv`]: Graph Convolutional Network (Kipf & Welling, 2017)
//! - [`SAGEConv`]: GraphSAGE (Hamilton et al., 2017)
//!
//! All layers follow the message-passing paradigm:
//!
//! 1. **Message**: Compute messages from neighbors
//! 2. **Aggregate**: Combine messages (sum, mean, max)
//! 3. **Update**: Transform aggregated messages
//!
//! ```text
//! h_i^{(l+1)} = UPDATE(h_i^{(l)}, AGGREGATE({MESSAGE(h_j^{(l)}) : j in N(i)}))
//! ```
//!
//! Aggregation runs over the COO edge index directly, so a batched disjoint
//! union behaves exactly like its member graphs side by side.

use crate::utils::{add_self_loops, degree, scatter, Aggregation};
use crate::{Error, GnnModule, Result};
use candle_core::{IndexOp, Tensor};
use candle_nn::{linear, linear_no_bias, Linear, Module, VarBuilder};

/// Graph Convolutional Network layer.
///
/// Implements: H' = D^{-1/2} A D^{-1/2} H W, with self-loops added to A.
///
/// # Reference
///
/// Kipf & Welling, "Semi-Supervised Classification with Graph Convolutional
/// Networks", ICLR 2017.
pub struct GCNConv {
    linear: Linear,
}

impl GCNConv {
    /// Create a new GCN layer.
    ///
    /// # Arguments
    /// - `in_features`: Input feature dimension
    /// - `out_features`: Output feature dimension
    /// - `bias`: Whether to include a bias term
    /// - `vb`: Variable builder for parameter initialization
    pub fn new(in_features: usize, out_features: usize, bias: bool, vb: VarBuilder) -> Result<Self> {
        let linear = if bias {
            linear(in_features, out_features, vb)?
        } else {
            linear_no_bias(in_features, out_features, vb)?
        };
        Ok(Self { linear })
    }

    /// Build from an existing projection.
    pub fn from_linear(linear: Linear) -> Self {
        Self { linear }
    }
}

impl GnnModule for GCNConv {
    /// # Arguments
    /// - `x`: Node features (N x in_features)
    /// - `edge_index`: COO edge list, (2 x E) u32
    ///
    /// # Returns
    /// - Node embeddings (N x out_features)
    fn forward(&self, x: &Tensor, edge_index: &Tensor) -> Result<Tensor> {
        let num_nodes = x.dim(0)?;

        let ei = add_self_loops(edge_index, num_nodes)?;
        let src = ei.i(0)?;
        let dst = ei.i(1)?;

        // Symmetric normalization: deg^{-1/2}[src] * deg^{-1/2}[dst] per edge.
        // Self-loops guarantee deg >= 1.
        let inv_sqrt = degree(&dst, num_nodes)?.sqrt()?.recip()?;
        let norm = (inv_sqrt.index_select(&src, 0)? * inv_sqrt.index_select(&dst, 0)?)?;

        let h = self.linear.forward(x)?;
        let norm = norm.to_dtype(h.dtype())?.unsqueeze(1)?;
        let messages = h.index_select(&src, 0)?.broadcast_mul(&norm)?;

        let out = Tensor::zeros((num_nodes, h.dim(1)?), h.dtype(), h.device())?
            .index_add(&dst, &messages, 0)?;
        Ok(out)
    }
}

/// GraphSAGE convolutional layer.
///
/// Implements: h_i' = W_self h_i + W_nbr AGG({h_j : j -> i})
///
/// with AGG one of mean, sum, or element-wise max, and optional L2
/// normalization of the output.
///
/// # Reference
///
/// Hamilton et al., "Inductive Representation Learning on Large Graphs",
/// NeurIPS 2017.
pub struct SAGEConv {
    lin_self: Linear,
    lin_neighbor: Linear,
    aggregation: Aggregation,
    normalize: bool,
}

impl SAGEConv {
    /// Create a new GraphSAGE layer.
    pub fn new(
        in_features: usize,
        out_features: usize,
        aggregation: Aggregation,
        normalize: bool,
        vb: VarBuilder,
    ) -> Result<Self> {
        let lin_self = linear(in_features, out_features, vb.pp("lin_self"))?;
        let lin_neighbor = linear(in_features, out_features, vb.pp("lin_neighbor"))?;
        Self::from_linears(lin_self, lin_neighbor, aggregation, normalize)
    }

    /// Build from existing projections.
    pub fn from_linears(
        lin_self: Linear,
        lin_neighbor: Linear,
        aggregation: Aggregation,
        normalize: bool,
    ) -> Result<Self> {
        if aggregation == Aggregation::Softmax {
            return Err(Error::InvalidConfig(
                "SAGEConv aggregation must be one of sum/mean/max".to_string(),
            ));
        }
        Ok(Self {
            lin_self,
            lin_neighbor,
            aggregation,
            normalize,
        })
    }
}

impl GnnModule for SAGEConv {
    /// # Arguments
    /// - `x`: Node features (N x in_features)
    /// - `edge_index`: COO edge list, (2 x E) u32
    ///
    /// # Returns
    /// - Node embeddings (N x out_features)
    fn forward(&self, x: &Tensor, edge_index: &Tensor) -> Result<Tensor> {
        let num_nodes = x.dim(0)?;
        let src = edge_index.i(0)?;
        let dst = edge_index.i(1)?;

        // Messages are the raw source features; aggregation happens per
        // destination node.
        let messages = x.index_select(&src, 0)?;
        let aggregated = scatter(&messages, &dst, Some(num_nodes), self.aggregation)?;

        let h_self = self.lin_self.forward(x)?;
        let h_neighbor = self.lin_neighbor.forward(&aggregated)?;
        let out = (h_self + h_neighbor)?;

        if self.normalize {
            let norm = out.sqr()?.sum_keepdim(1)?.sqrt()?;
            let norm = (norm + 1e-6)?;
            Ok(out.broadcast_div(&norm)?)
        } else {
            Ok(out)
        }
    }
}
