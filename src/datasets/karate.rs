//! Zachary's karate club.

use crate::datasets::Dataset;
use crate::transforms::Transform;
use crate::{GraphData, Result};
use candle_core::{DType, Device, Tensor};

/// The 78 undirected friendships of Zachary's karate club study (1977).
const EDGES: [(u32, u32); 78] = [
    (0, 1), (0, 2), (0, 3), (0, 4), (0, 5), (0, 6), (0, 7), (0, 8), (0, 10),
    (0, 11), (0, 12), (0, 13), (0, 17), (0, 19), (0, 21), (0, 31),
    (1, 2), (1, 3), (1, 7), (1, 13), (1, 17), (1, 19), (1, 21), (1, 30),
    (2, 3), (2, 7), (2, 8), (2, 9), (2, 13), (2, 27), (2, 28), (2, 32),
    (3, 7), (3, 12), (3, 13),
    (4, 6), (4, 10),
    (5, 6), (5, 10), (5, 16),
    (6, 16),
    (8, 30), (8, 32), (8, 33),
    (9, 33),
    (13, 33),
    (14, 32), (14, 33),
    (15, 32), (15, 33),
    (18, 32), (18, 33),
    (19, 33),
    (20, 32), (20, 33),
    (22, 32), (22, 33),
    (23, 25), (23, 27), (23, 29), (23, 32), (23, 33),
    (24, 25), (24, 27), (24, 31),
    (25, 31),
    (26, 29), (26, 33),
    (27, 33),
    (28, 31), (28, 33),
    (29, 32), (29, 33),
    (30, 32), (30, 33),
    (31, 32), (31, 33),
    (32, 33),
];

/// Members who stayed with the instructor ("Mr. Hi") after the split; the
/// rest joined the club officer.
const MR_HI: [u32; 17] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 10, 11, 12, 13, 16, 17, 19, 21];

const NUM_NODES: usize = 34;

/// The karate club social network: one graph, 34 nodes, 156 directed edges.
///
/// Node features are one-hot node ids (the graph has no measured features);
/// node labels are the post-split faction (0 = Mr. Hi, 1 = Officer).
/// Entirely in-memory, no download step.
pub struct KarateClubDataset {
    graphs: Vec<GraphData>,
}

impl KarateClubDataset {
    /// Build the dataset on `device`.
    pub fn new(device: &Device) -> Result<Self> {
        Self::with_transform(device, None)
    }

    /// Build the dataset, applying `transform` to the graph.
    pub fn with_transform(device: &Device, transform: Option<&dyn Transform>) -> Result<Self> {
        let mut src = Vec::with_capacity(EDGES.len() * 2);
        let mut dst = Vec::with_capacity(EDGES.len() * 2);
        for &(a, b) in &EDGES {
            src.push(a);
            dst.push(b);
            src.push(b);
            dst.push(a);
        }
        let num_edges = src.len();
        let src = Tensor::from_vec(src, num_edges, device)?;
        let dst = Tensor::from_vec(dst, num_edges, device)?;
        let edge_index = Tensor::stack(&[&src, &dst], 0)?;

        let labels: Vec<u32> = (0..NUM_NODES as u32)
            .map(|n| u32::from(!MR_HI.contains(&n)))
            .collect();
        let labels = Tensor::from_vec(labels, NUM_NODES, device)?;

        let features = Tensor::eye(NUM_NODES, DType::F32, device)?;

        let mut graph = GraphData::new(edge_index)?
            .with_node_features(features)?
            .with_node_labels(labels)?;
        if let Some(t) = transform {
            graph = t.apply(graph)?;
        }

        Ok(Self { graphs: vec![graph] })
    }
}

impl Dataset for KarateClubDataset {
    fn name(&self) -> &str {
        "karate_club"
    }

    fn graphs(&self) -> &[GraphData] {
        &self.graphs
    }
}
