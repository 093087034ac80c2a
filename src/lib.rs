//! Graph containers, batching, datasets, loaders and GNN layers on candle.
//!
//! `grafo` provides the data plumbing around graph neural networks while
//! leaving every tensor operation (and all autograd) to
//! [`candle_core`]/[`candle_nn`]:
//!
//! - [`GraphData`] - a single graph as named tensors in COO format
//! - [`GraphBatch`] / [`batch`] - disjoint-union batching with exact
//!   round-trip slicing
//! - [`datasets`] - the [`Dataset`] trait plus bundled datasets
//! - [`Dataloader`] - shuffled, restartable batch iteration
//! - [`nn`] - message-passing layers ([`GCNConv`], [`SAGEConv`])
//! - [`transforms`] - graph-to-graph mappings ([`NormalizeFeatures`])
//!
//! # Example
//!
//! ```rust
//! use candle_core::{Device, Tensor};
//! use grafo::{Dataloader, GraphData};
//!
//! # fn main() -> grafo::Result<()> {
//! let device = Device::Cpu;
//! let triangle = |base: u32| -> grafo::Result<GraphData> {
//!     let ei = Tensor::new(&[[0u32, 1, 2], [1, 2, 0]], &device)?;
//!     let y = Tensor::new(&[[base]], &device)?;
//!     GraphData::new(ei)?.with_graph_labels(y)
//! };
//!
//! let graphs = vec![triangle(0)?, triangle(1)?, triangle(2)?];
//! let loader = Dataloader::new(&graphs, 2)?;
//!
//! let mut total_edges = 0;
//! for batch in loader {
//!     total_edges += batch?.num_edges();
//! }
//! assert_eq!(total_edges, 9);
//! # Ok(())
//! # }
//! ```

pub mod data;
pub mod datasets;
mod error;
pub mod loader;
pub mod nn;
pub mod transforms;
pub mod utils;

pub use data::{batch, AttrKind, GraphBatch, GraphData};
pub use datasets::{Dataset, EdgeListConfig, EdgeListDataset, KarateClubDataset};
pub use error::{Error, Result};
pub use loader::Dataloader;
pub use nn::{GCNConv, GnnModule, SAGEConv};
pub use transforms::{NormalizeFeatures, Transform};
pub use utils::Aggregation;

// Re-export petgraph for advanced graph operations on exported topologies.
pub use petgraph;
