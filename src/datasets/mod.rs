//! Dataset abstraction and bundled datasets.
//!
//! A dataset materializes a list of [`GraphData`] once (downloading raw files
//! into a local cache if needed) and exposes derived summary properties over
//! that list. Concrete datasets follow the two-step acquisition pattern:
//! fetch raw data into `<base_dir>/<name>/raw`, then process it into graphs.

mod download;
mod edgelist;
mod karate;

pub use download::download_file;
pub use edgelist::{EdgeListConfig, EdgeListDataset};
pub use karate::KarateClubDataset;

use crate::{GraphData, Result};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::PathBuf;

/// A materialized list of graphs with derived summary properties.
pub trait Dataset {
    /// Dataset name, also the cache subdirectory for downloaded data.
    fn name(&self) -> &str;

    /// The processed graphs.
    fn graphs(&self) -> &[GraphData];

    /// Number of graphs.
    fn num_graphs(&self) -> usize {
        self.graphs().len()
    }

    /// Graph at `index`.
    fn get(&self, index: usize) -> Option<&GraphData> {
        self.graphs().get(index)
    }

    /// Contiguous sub-range of graphs.
    fn get_range(&self, range: Range<usize>) -> Option<&[GraphData]> {
        self.graphs().get(range)
    }

    /// Node feature dimensionality of the first graph (0 when absent).
    fn num_node_features(&self) -> usize {
        self.graphs().first().map_or(0, GraphData::num_node_features)
    }

    /// Edge feature dimensionality of the first graph (0 when absent).
    fn num_edge_features(&self) -> usize {
        self.graphs().first().map_or(0, GraphData::num_edge_features)
    }

    /// Number of node label classes across all graphs.
    fn num_node_classes(&self) -> Result<usize> {
        let mut classes = 0;
        for g in self.graphs() {
            classes = classes.max(g.num_node_classes()?);
        }
        Ok(classes)
    }

    /// Number of graph label classes across all graphs.
    fn num_graph_classes(&self) -> Result<usize> {
        let mut classes = 0;
        for g in self.graphs() {
            classes = classes.max(g.num_graph_classes()?);
        }
        Ok(classes)
    }
}

/// Cache layout for datasets with on-disk raw data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetPaths {
    base_dir: PathBuf,
    name: String,
}

impl DatasetPaths {
    /// Lay out `<base_dir>/<name>/{raw,processed}`.
    pub fn new(base_dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            name: name.into(),
        }
    }

    /// Directory for downloaded raw files.
    pub fn raw_dir(&self) -> PathBuf {
        self.base_dir.join(&self.name).join("raw")
    }

    /// Directory for processed artifacts.
    pub fn processed_dir(&self) -> PathBuf {
        self.base_dir.join(&self.name).join("processed")
    }

    /// Dataset root directory.
    pub fn root(&self) -> PathBuf {
        self.base_dir.join(&self.name)
    }

    /// Create the raw directory if missing and return it.
    pub fn ensure_raw_dir(&self) -> std::io::Result<PathBuf> {
        let dir = self.raw_dir();
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}
