//! Single-graph container.
//!
//! [`GraphData`] holds a graph as a set of named candle tensors in COO
//! format, similar to PyTorch Geometric's `Data`. The conventional
//! attributes (`edge_index`, `node_features`, ...) are first-class fields;
//! anything else goes through [`GraphData::with_attr`] tagged with the
//! entity it indexes so batching knows which dimension to offset.
//!
//! # Example
//!
//! ```rust
//! use candle_core::{Device, Tensor};
//! use grafo::GraphData;
//!
//! # fn main() -> grafo::Result<()> {
//! let device = Device::Cpu;
//!
//! // 3 nodes, 3 directed edges: 0->1, 1->0, 1->2
//! let edge_index = Tensor::new(&[[0u32, 1, 1], [1, 0, 2]], &device)?;
//! let x = Tensor::new(&[[1f32, 0.], [0., 1.], [1., 1.]], &device)?;
//!
//! let graph = GraphData::new(edge_index)?.with_node_features(x)?;
//!
//! assert_eq!(graph.num_nodes(), 3);
//! assert_eq!(graph.num_edges(), 3);
//! assert_eq!(graph.num_node_features(), 2);
//! # Ok(())
//! # }
//! ```

use crate::{Error, Result};
use candle_core::{DType, Tensor};
use petgraph::graph::DiGraph;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which entity an attribute's leading dimension indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttrKind {
    /// Leading dimension indexes nodes (must equal `num_nodes`).
    Node,
    /// Leading dimension indexes edges (must equal `num_edges`).
    Edge,
    /// Whole-graph attribute (leading dimension 1).
    Graph,
}

/// A single graph: edge index plus named feature/label tensors.
///
/// Immutable by convention: built once through the `with_*` methods (each of
/// which re-validates shape consistency) and read thereafter.
#[derive(Debug, Clone, Default)]
pub struct GraphData {
    edge_index: Option<Tensor>,
    node_features: Option<Tensor>,
    edge_features: Option<Tensor>,
    graph_features: Option<Tensor>,
    node_labels: Option<Tensor>,
    edge_labels: Option<Tensor>,
    graph_labels: Option<Tensor>,
    extra: BTreeMap<String, (AttrKind, Tensor)>,

    /// Node count override for graphs with trailing isolated nodes.
    explicit_num_nodes: Option<usize>,

    /// Expected leading dimension of graph-level attributes. 1 for a single
    /// graph; a batch sets it to its member count.
    graph_rows: Option<usize>,

    // Derived counts, refreshed by `validate`.
    num_nodes: usize,
    num_edges: usize,
}

impl GraphData {
    /// Create a graph from its edge index.
    ///
    /// `edge_index` must be a `(2, E)` `u32` tensor: row 0 holds source node
    /// ids, row 1 destination node ids.
    pub fn new(edge_index: Tensor) -> Result<Self> {
        Self::default().with_edge_index(edge_index)
    }

    /// Create an empty graph, to be filled via the `with_*` methods.
    ///
    /// Useful for graphs carrying features but no edges.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Attach or replace the edge index.
    pub fn with_edge_index(mut self, edge_index: Tensor) -> Result<Self> {
        self.edge_index = Some(edge_index);
        self.validate()?;
        Ok(self)
    }

    /// Attach node features, shape `(N, F_n)`.
    pub fn with_node_features(mut self, node_features: Tensor) -> Result<Self> {
        self.node_features = Some(node_features);
        self.validate()?;
        Ok(self)
    }

    /// Attach edge features, shape `(E, F_e)`, row `i` aligned with column
    /// `i` of the edge index.
    pub fn with_edge_features(mut self, edge_features: Tensor) -> Result<Self> {
        self.edge_features = Some(edge_features);
        self.validate()?;
        Ok(self)
    }

    /// Attach whole-graph features, shape `(1, F_g)`.
    pub fn with_graph_features(mut self, graph_features: Tensor) -> Result<Self> {
        self.graph_features = Some(graph_features);
        self.validate()?;
        Ok(self)
    }

    /// Attach per-node labels, leading dimension `N`.
    pub fn with_node_labels(mut self, node_labels: Tensor) -> Result<Self> {
        self.node_labels = Some(node_labels);
        self.validate()?;
        Ok(self)
    }

    /// Attach per-edge labels, leading dimension `E`.
    pub fn with_edge_labels(mut self, edge_labels: Tensor) -> Result<Self> {
        self.edge_labels = Some(edge_labels);
        self.validate()?;
        Ok(self)
    }

    /// Attach whole-graph labels, leading dimension 1.
    pub fn with_graph_labels(mut self, graph_labels: Tensor) -> Result<Self> {
        self.graph_labels = Some(graph_labels);
        self.validate()?;
        Ok(self)
    }

    /// Override the inferred node count (for trailing isolated nodes).
    pub fn with_num_nodes(mut self, num_nodes: usize) -> Result<Self> {
        self.explicit_num_nodes = Some(num_nodes);
        self.validate()?;
        Ok(self)
    }

    /// Batches stack graph-level attributes to `(B, ...)`.
    pub(crate) fn with_graph_rows(mut self, rows: usize) -> Result<Self> {
        self.graph_rows = Some(rows);
        self.validate()?;
        Ok(self)
    }

    /// Attach an arbitrary named attribute.
    ///
    /// The conventional names (`edge_index`, `node_features`, ...) are
    /// reserved for their dedicated fields.
    pub fn with_attr(mut self, name: impl Into<String>, kind: AttrKind, value: Tensor) -> Result<Self> {
        let name = name.into();
        if CONVENTIONAL_NAMES.contains(&name.as_str()) {
            return Err(Error::InvalidConfig(format!(
                "`{name}` is a conventional attribute, use its dedicated setter"
            )));
        }
        self.extra.insert(name, (kind, value));
        self.validate()?;
        Ok(self)
    }

    /// Number of nodes: explicit override, else leading dimension of any
    /// node-indexed tensor, else `edge_index.max() + 1`.
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Number of edges (columns of the edge index).
    pub fn num_edges(&self) -> usize {
        self.num_edges
    }

    /// Node feature dimensionality (0 when absent).
    pub fn num_node_features(&self) -> usize {
        feature_dim(self.node_features.as_ref())
    }

    /// Edge feature dimensionality (0 when absent).
    pub fn num_edge_features(&self) -> usize {
        feature_dim(self.edge_features.as_ref())
    }

    /// Graph feature dimensionality (0 when absent).
    pub fn num_graph_features(&self) -> usize {
        feature_dim(self.graph_features.as_ref())
    }

    /// Number of node label classes, `node_labels.max() + 1`.
    pub fn num_node_classes(&self) -> Result<usize> {
        num_classes(self.node_labels.as_ref())
    }

    /// Number of graph label classes, `graph_labels.max() + 1`.
    pub fn num_graph_classes(&self) -> Result<usize> {
        num_classes(self.graph_labels.as_ref())
    }

    /// Edge index tensor, `(2, E)` `u32`.
    pub fn edge_index(&self) -> Option<&Tensor> {
        self.edge_index.as_ref()
    }

    /// Node feature tensor.
    pub fn node_features(&self) -> Option<&Tensor> {
        self.node_features.as_ref()
    }

    /// Edge feature tensor.
    pub fn edge_features(&self) -> Option<&Tensor> {
        self.edge_features.as_ref()
    }

    /// Graph feature tensor.
    pub fn graph_features(&self) -> Option<&Tensor> {
        self.graph_features.as_ref()
    }

    /// Node label tensor.
    pub fn node_labels(&self) -> Option<&Tensor> {
        self.node_labels.as_ref()
    }

    /// Edge label tensor.
    pub fn edge_labels(&self) -> Option<&Tensor> {
        self.edge_labels.as_ref()
    }

    /// Graph label tensor.
    pub fn graph_labels(&self) -> Option<&Tensor> {
        self.graph_labels.as_ref()
    }

    /// Look up any attribute by name, conventional or extra.
    pub fn attr(&self, name: &str) -> Option<&Tensor> {
        match name {
            "edge_index" => self.edge_index.as_ref(),
            "node_features" => self.node_features.as_ref(),
            "edge_features" => self.edge_features.as_ref(),
            "graph_features" => self.graph_features.as_ref(),
            "node_labels" => self.node_labels.as_ref(),
            "edge_labels" => self.edge_labels.as_ref(),
            "graph_labels" => self.graph_labels.as_ref(),
            _ => self.extra.get(name).map(|(_, t)| t),
        }
    }

    /// Iterate over the extra (non-conventional) attributes in name order.
    pub fn extra_attrs(&self) -> impl Iterator<Item = (&str, AttrKind, &Tensor)> {
        self.extra.iter().map(|(k, (kind, t))| (k.as_str(), *kind, t))
    }

    /// Export the topology as a petgraph `DiGraph` for algorithms this crate
    /// does not provide. Node weights are the node ids.
    pub fn to_petgraph(&self) -> Result<DiGraph<u32, ()>> {
        let mut graph = DiGraph::with_capacity(self.num_nodes, self.num_edges);
        let indices: Vec<_> = (0..self.num_nodes as u32).map(|i| graph.add_node(i)).collect();
        if let Some(ei) = &self.edge_index {
            let rows = ei.to_vec2::<u32>()?;
            for (&src, &dst) in rows[0].iter().zip(rows[1].iter()) {
                graph.add_edge(indices[src as usize], indices[dst as usize], ());
            }
        }
        Ok(graph)
    }

    /// Exact content equality: same derived counts, same attribute sets,
    /// element-wise identical tensors.
    pub fn content_eq(&self, other: &Self) -> Result<bool> {
        if self.num_nodes != other.num_nodes || self.num_edges != other.num_edges {
            return Ok(false);
        }
        for (a, b) in self.conventional().iter().zip(other.conventional().iter()) {
            match (a, b) {
                (None, None) => {}
                (Some(a), Some(b)) if tensors_equal(a, b)? => {}
                _ => return Ok(false),
            }
        }
        if self.extra.len() != other.extra.len() {
            return Ok(false);
        }
        for ((ka, (kind_a, ta)), (kb, (kind_b, tb))) in self.extra.iter().zip(other.extra.iter()) {
            if ka != kb || kind_a != kind_b || !tensors_equal(ta, tb)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub(crate) fn conventional(&self) -> [Option<&Tensor>; 7] {
        [
            self.edge_index.as_ref(),
            self.node_features.as_ref(),
            self.edge_features.as_ref(),
            self.graph_features.as_ref(),
            self.node_labels.as_ref(),
            self.edge_labels.as_ref(),
            self.graph_labels.as_ref(),
        ]
    }

    /// Re-derive counts and check every attribute against them.
    fn validate(&mut self) -> Result<()> {
        if let Some(ei) = &self.edge_index {
            if ei.rank() != 2 || ei.dim(0)? != 2 {
                return Err(Error::InvalidConfig(format!(
                    "edge_index must have shape (2, E), got {:?}",
                    ei.dims()
                )));
            }
            if ei.dtype() != DType::U32 {
                return Err(Error::InvalidConfig(format!(
                    "edge_index must be u32, got {:?}",
                    ei.dtype()
                )));
            }
        }

        self.num_edges = match &self.edge_index {
            Some(ei) => ei.dim(1)?,
            None => self
                .edge_indexed()
                .next()
                .map(|(_, t)| t.dim(0))
                .transpose()?
                .unwrap_or(0),
        };

        // Node count: explicit beats node-indexed leading dim beats max id + 1.
        let from_tensor = self
            .node_indexed()
            .next()
            .map(|(_, t)| t.dim(0))
            .transpose()?;
        let from_edges = match &self.edge_index {
            Some(ei) if self.num_edges > 0 => {
                Some(ei.flatten_all()?.max(0)?.to_scalar::<u32>()? as usize + 1)
            }
            _ => None,
        };
        self.num_nodes = self
            .explicit_num_nodes
            .or(from_tensor)
            .or(from_edges)
            .unwrap_or(0);

        for (name, t) in self.node_indexed() {
            let got = t.dim(0)?;
            if got != self.num_nodes {
                return Err(Error::ShapeMismatch {
                    attribute: name.to_string(),
                    expected: self.num_nodes,
                    got,
                });
            }
        }
        for (name, t) in self.edge_indexed() {
            let got = t.dim(0)?;
            if got != self.num_edges {
                return Err(Error::ShapeMismatch {
                    attribute: name.to_string(),
                    expected: self.num_edges,
                    got,
                });
            }
        }
        let graph_rows = self.graph_rows.unwrap_or(1);
        for (name, t) in self.graph_level() {
            let got = t.dim(0)?;
            if got != graph_rows {
                return Err(Error::ShapeMismatch {
                    attribute: name.to_string(),
                    expected: graph_rows,
                    got,
                });
            }
        }

        // Edge endpoints must stay inside the node range.
        if let Some(max_id) = from_edges {
            if max_id > self.num_nodes {
                return Err(Error::ShapeMismatch {
                    attribute: "edge_index".to_string(),
                    expected: self.num_nodes,
                    got: max_id,
                });
            }
        }

        Ok(())
    }

    fn node_indexed(&self) -> impl Iterator<Item = (&str, &Tensor)> {
        self.node_features
            .iter()
            .map(|t| ("node_features", t))
            .chain(self.node_labels.iter().map(|t| ("node_labels", t)))
            .chain(self.extra.iter().filter_map(|(k, (kind, t))| {
                (*kind == AttrKind::Node).then_some((k.as_str(), t))
            }))
    }

    fn edge_indexed(&self) -> impl Iterator<Item = (&str, &Tensor)> {
        self.edge_features
            .iter()
            .map(|t| ("edge_features", t))
            .chain(self.edge_labels.iter().map(|t| ("edge_labels", t)))
            .chain(self.extra.iter().filter_map(|(k, (kind, t))| {
                (*kind == AttrKind::Edge).then_some((k.as_str(), t))
            }))
    }

    fn graph_level(&self) -> impl Iterator<Item = (&str, &Tensor)> {
        self.graph_features
            .iter()
            .map(|t| ("graph_features", t))
            .chain(self.graph_labels.iter().map(|t| ("graph_labels", t)))
            .chain(self.extra.iter().filter_map(|(k, (kind, t))| {
                (*kind == AttrKind::Graph).then_some((k.as_str(), t))
            }))
    }
}

const CONVENTIONAL_NAMES: [&str; 7] = [
    "edge_index",
    "node_features",
    "edge_features",
    "graph_features",
    "node_labels",
    "edge_labels",
    "graph_labels",
];

fn feature_dim(t: Option<&Tensor>) -> usize {
    match t {
        Some(t) if t.rank() >= 2 => t.dims()[1],
        _ => 0,
    }
}

fn num_classes(labels: Option<&Tensor>) -> Result<usize> {
    match labels {
        Some(t) if t.elem_count() > 0 => {
            let max = t
                .flatten_all()?
                .to_dtype(DType::U32)?
                .max(0)?
                .to_scalar::<u32>()?;
            Ok(max as usize + 1)
        }
        _ => Ok(0),
    }
}

/// Element-wise exact tensor comparison (same shape, same dtype, same values).
pub(crate) fn tensors_equal(a: &Tensor, b: &Tensor) -> Result<bool> {
    if a.dims() != b.dims() || a.dtype() != b.dtype() {
        return Ok(false);
    }
    if a.elem_count() == 0 {
        return Ok(true);
    }
    // Widening to f64 is exact for u32/f32 payloads.
    let av = a.flatten_all()?.to_dtype(DType::F64)?.to_vec1::<f64>()?;
    let bv = b.flatten_all()?.to_dtype(DType::F64)?.to_vec1::<f64>()?;
    Ok(av == bv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    fn triangle(device: &Device) -> GraphData {
        let ei = Tensor::new(&[[0u32, 1, 2], [1, 2, 0]], device).unwrap();
        GraphData::new(ei).unwrap()
    }

    #[test]
    fn test_counts_inferred_from_edge_index() {
        let g = triangle(&Device::Cpu);
        assert_eq!(g.num_nodes(), 3);
        assert_eq!(g.num_edges(), 3);
        assert_eq!(g.num_node_features(), 0);
    }

    #[test]
    fn test_node_features_set_node_count() {
        let device = Device::Cpu;
        let ei = Tensor::new(&[[0u32], [1]], &device).unwrap();
        let x = Tensor::zeros((4, 8), DType::F32, &device).unwrap();
        // 4 feature rows beat the max-id-plus-one inference.
        let g = GraphData::new(ei).unwrap().with_node_features(x).unwrap();
        assert_eq!(g.num_nodes(), 4);
        assert_eq!(g.num_node_features(), 8);
    }

    #[test]
    fn test_explicit_num_nodes() {
        let g = triangle(&Device::Cpu).with_num_nodes(5).unwrap();
        assert_eq!(g.num_nodes(), 5);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let device = Device::Cpu;
        let x = Tensor::zeros((2, 4), DType::F32, &device).unwrap();
        let err = triangle(&device).with_node_features(x).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { ref attribute, expected: 3, got: 2 } if attribute == "node_features"));
    }

    #[test]
    fn test_edge_feature_mismatch_rejected() {
        let device = Device::Cpu;
        let ef = Tensor::zeros((5, 2), DType::F32, &device).unwrap();
        let err = triangle(&device).with_edge_features(ef).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { expected: 3, got: 5, .. }));
    }

    #[test]
    fn test_edge_ids_must_fit_node_count() {
        let device = Device::Cpu;
        let ei = Tensor::new(&[[0u32, 5], [1, 0]], &device).unwrap();
        let x = Tensor::zeros((3, 1), DType::F32, &device).unwrap();
        let err = GraphData::new(ei).unwrap().with_node_features(x).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_edge_index_dtype_checked() {
        let device = Device::Cpu;
        let ei = Tensor::new(&[[0i64, 1], [1, 0]], &device).unwrap();
        assert!(matches!(GraphData::new(ei), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_extra_attr_roundtrip_and_validation() {
        let device = Device::Cpu;
        let mask = Tensor::zeros((3, 1), DType::F32, &device).unwrap();
        let g = triangle(&device)
            .with_attr("train_mask", AttrKind::Node, mask)
            .unwrap();
        assert!(g.attr("train_mask").is_some());

        let bad = Tensor::zeros((7, 1), DType::F32, &device).unwrap();
        let err = triangle(&device)
            .with_attr("train_mask", AttrKind::Node, bad)
            .unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_conventional_name_reserved() {
        let device = Device::Cpu;
        let t = Tensor::zeros((3, 1), DType::F32, &device).unwrap();
        let err = triangle(&device)
            .with_attr("node_features", AttrKind::Node, t)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_features_without_edges() {
        let device = Device::Cpu;
        let x = Tensor::zeros((3, 2), DType::F32, &device).unwrap();
        let g = GraphData::empty().with_node_features(x).unwrap();
        assert_eq!(g.num_nodes(), 3);
        assert_eq!(g.num_edges(), 0);
    }

    #[test]
    fn test_num_node_classes() {
        let device = Device::Cpu;
        let y = Tensor::new(&[0u32, 1, 1], &device).unwrap();
        let g = triangle(&device).with_node_labels(y).unwrap();
        assert_eq!(g.num_node_classes().unwrap(), 2);
    }

    #[test]
    fn test_content_eq() {
        let device = Device::Cpu;
        let a = triangle(&device);
        let b = triangle(&device);
        assert!(a.content_eq(&b).unwrap());

        let c = triangle(&device).with_num_nodes(4).unwrap();
        assert!(!a.content_eq(&c).unwrap());
    }

    #[test]
    fn test_to_petgraph() {
        let g = triangle(&Device::Cpu);
        let pg = g.to_petgraph().unwrap();
        assert_eq!(pg.node_count(), 3);
        assert_eq!(pg.edge_count(), 3);
    }
}
