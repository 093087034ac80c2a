//! Graph transforms applied when datasets materialize their graphs.

use crate::{Error, GraphData, Result};
use std::fmt;

/// A pure graph-to-graph mapping.
///
/// Implementors render their configuration through `Display` (e.g.
/// `NormalizeFeatures()`) so dataset logs can name the applied transform.
pub trait Transform: fmt::Display {
    /// Apply the transform, producing a new graph.
    fn apply(&self, data: GraphData) -> Result<GraphData>;
}

/// Row-normalizes node features so each row sums to 1.
///
/// Rows summing to zero are left at zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeFeatures;

impl fmt::Display for NormalizeFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NormalizeFeatures()")
    }
}

impl Transform for NormalizeFeatures {
    fn apply(&self, data: GraphData) -> Result<GraphData> {
        let Some(x) = data.node_features() else {
            return Ok(data);
        };
        if x.rank() != 2 {
            return Err(Error::InvalidConfig(format!(
                "NormalizeFeatures expects (N, F) node features, got {:?}",
                x.dims()
            )));
        }
        // Clamping the row sum keeps all-zero rows at exactly zero.
        let sums = x.sum_keepdim(1)?.maximum(1e-12)?;
        let normalized = x.broadcast_div(&sums)?;
        data.with_node_features(normalized)
    }
}
