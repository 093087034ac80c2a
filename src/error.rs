//! Error types for grafo.

use thiserror::Error;

/// Grafo error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Candle tensor error.
    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    /// A named attribute's leading dimension disagrees with the entity count
    /// it must align with.
    #[error("shape mismatch for `{attribute}`: expected leading dimension {expected}, got {got}")]
    ShapeMismatch {
        attribute: String,
        expected: usize,
        got: usize,
    },

    /// Graphs in a batch carry different attribute sets.
    #[error("attribute mismatch across batch: `{attribute}` present on graph 0 but absent on graph {graph}")]
    AttributeMismatch { attribute: String, graph: usize },

    /// Batching requires at least one graph.
    #[error("cannot batch an empty sequence of graphs")]
    EmptyBatch,

    /// Index outside the batch or dataset.
    #[error("index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Invalid configuration.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Dataset acquisition failure.
    #[error("download failed for {url}: {reason}")]
    Download { url: String, reason: String },

    /// I/O error while reading or caching dataset files.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed raw dataset file.
    #[error("malformed dataset file {path}: {reason}")]
    MalformedData { path: String, reason: String },
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
