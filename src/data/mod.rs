//! Graph containers: single graphs and disjoint-union batches.

mod batch;
mod graph;

pub use batch::{batch, GraphBatch};
pub use graph::{AttrKind, GraphData};
