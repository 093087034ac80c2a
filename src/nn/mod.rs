//! Graph neural network layers.
//!
//! Layers are thin wrappers over `candle_nn` parameters plus a COO
//! aggregation step from [`crate::utils::scatter`]; all learned math and
//! autograd stay inside candle.

mod conv;

pub use conv::{GCNConv, SAGEConv};

use crate::Result;
use candle_core::Tensor;

/// A module whose forward pass is driven by graph topology.
///
/// `x` is `(N, F)` node features, `edge_index` a `(2, E)` u32 COO edge list.
pub trait GnnModule {
    /// Compute new node embeddings.
    fn forward(&self, x: &Tensor, edge_index: &Tensor) -> Result<Tensor>;
}
