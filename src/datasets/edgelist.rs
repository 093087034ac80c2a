//! Generic CSV edge-list dataset.

use crate::datasets::{download_file, Dataset, DatasetPaths};
use crate::transforms::Transform;
use crate::{Error, GraphData, Result};
use candle_core::{Device, Tensor};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where an edge-list dataset lives and comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeListConfig {
    /// Dataset name; becomes the cache subdirectory.
    pub name: String,
    /// Cache root; raw data lands in `<base_dir>/<name>/raw`.
    pub base_dir: PathBuf,
    /// Remote file to fetch when the raw file is absent. With `None` the raw
    /// file must already be in place.
    pub url: Option<String>,
}

/// A single graph read from a headerless `src,dst` CSV file.
///
/// Download is idempotent: a present raw file is never re-fetched.
#[derive(Debug)]
pub struct EdgeListDataset {
    name: String,
    graphs: Vec<GraphData>,
}

impl EdgeListDataset {
    /// Raw file name inside the dataset's raw directory.
    pub const RAW_FILE: &'static str = "edges.csv";

    /// Acquire (if needed) and process the edge list.
    pub fn new(config: EdgeListConfig, device: &Device) -> Result<Self> {
        Self::with_transform(config, device, None)
    }

    /// Acquire and process, applying `transform` to the graph.
    pub fn with_transform(
        config: EdgeListConfig,
        device: &Device,
        transform: Option<&dyn Transform>,
    ) -> Result<Self> {
        let paths = DatasetPaths::new(&config.base_dir, &config.name);
        let raw = paths.ensure_raw_dir()?.join(Self::RAW_FILE);

        if let Some(url) = &config.url {
            download_file(url, &raw)?;
        }
        if !raw.exists() {
            return Err(Error::MalformedData {
                path: raw.display().to_string(),
                reason: "raw edge list missing and no url configured".to_string(),
            });
        }

        let mut graph = Self::process(&raw, device)?;
        if let Some(t) = transform {
            info!("applying {t} to {}", config.name);
            graph = t.apply(graph)?;
        }
        info!(
            "{}: {} nodes, {} edges",
            config.name,
            graph.num_nodes(),
            graph.num_edges()
        );

        Ok(Self {
            name: config.name,
            graphs: vec![graph],
        })
    }

    fn process(path: &Path, device: &Device) -> Result<GraphData> {
        let malformed = |reason: String| Error::MalformedData {
            path: path.display().to_string(),
            reason,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .map_err(|e| malformed(e.to_string()))?;

        let mut src: Vec<u32> = Vec::new();
        let mut dst: Vec<u32> = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record.map_err(|e| malformed(e.to_string()))?;
            if record.len() < 2 {
                return Err(malformed(format!("line {}: expected src,dst", line + 1)));
            }
            let parse = |field: &str| {
                field
                    .trim()
                    .parse::<u32>()
                    .map_err(|e| malformed(format!("line {}: {e}", line + 1)))
            };
            src.push(parse(&record[0])?);
            dst.push(parse(&record[1])?);
        }
        if src.is_empty() {
            return Err(malformed("no edges".to_string()));
        }

        let num_edges = src.len();
        let src = Tensor::from_vec(src, num_edges, device)?;
        let dst = Tensor::from_vec(dst, num_edges, device)?;
        GraphData::new(Tensor::stack(&[&src, &dst], 0)?)
    }
}

impl Dataset for EdgeListDataset {
    fn name(&self) -> &str {
        &self.name
    }

    fn graphs(&self) -> &[GraphData] {
        &self.graphs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_raw(base: &Path, name: &str, contents: &str) {
        let raw_dir = base.join(name).join("raw");
        fs::create_dir_all(&raw_dir).unwrap();
        fs::write(raw_dir.join(EdgeListDataset::RAW_FILE), contents).unwrap();
    }

    #[test]
    fn test_local_edge_list() {
        let dir = tempfile::tempdir().unwrap();
        write_raw(dir.path(), "toy", "0,1\n1,2\n2,0\n");

        let ds = EdgeListDataset::new(
            EdgeListConfig {
                name: "toy".to_string(),
                base_dir: dir.path().to_path_buf(),
                url: None,
            },
            &Device::Cpu,
        )
        .unwrap();

        assert_eq!(ds.num_graphs(), 1);
        let g = ds.get(0).unwrap();
        assert_eq!(g.num_nodes(), 3);
        assert_eq!(g.num_edges(), 3);
    }

    #[test]
    fn test_whitespace_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        write_raw(dir.path(), "toy", "0, 1\n1, 0\n");

        let ds = EdgeListDataset::new(
            EdgeListConfig {
                name: "toy".to_string(),
                base_dir: dir.path().to_path_buf(),
                url: None,
            },
            &Device::Cpu,
        )
        .unwrap();
        assert_eq!(ds.get(0).unwrap().num_edges(), 2);
    }

    #[test]
    fn test_missing_raw_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = EdgeListDataset::new(
            EdgeListConfig {
                name: "absent".to_string(),
                base_dir: dir.path().to_path_buf(),
                url: None,
            },
            &Device::Cpu,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedData { .. }));
    }

    #[test]
    fn test_bad_rows_rejected() {
        let dir = tempfile::tempdir().unwrap();
        write_raw(dir.path(), "bad", "0,1\nnot,a number\n");

        let err = EdgeListDataset::new(
            EdgeListConfig {
                name: "bad".to_string(),
                base_dir: dir.path().to_path_buf(),
                url: None,
            },
            &Device::Cpu,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedData { .. }));
    }
}
