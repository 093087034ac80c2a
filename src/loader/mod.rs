//! Batched iteration over graph collections.
//!
//! [`Dataloader`] partitions a slice of graphs into [`GraphBatch`]es of
//! `batch_size`, optionally shuffling the partition on every pass.
//!
//! # Example
//!
//! ```rust,ignore
//! let dataset = KarateClubDataset::new(&Device::Cpu)?;
//! let mut loader = Dataloader::from_dataset(&dataset, 8)?.shuffled().with_seed(42);
//!
//! for batch in &mut loader {
//!     let batch = batch?;
//!     // forward pass over `batch`
//! }
//! loader.reset(); // next epoch, reshuffled
//! ```

use crate::{Dataset, Error, GraphBatch, GraphData, Result};
use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Lazy, finite, restartable batch iterator over graphs.
pub struct Dataloader<'a> {
    graphs: &'a [GraphData],
    batch_size: usize,
    shuffle: bool,
    rng: Option<StdRng>,
    order: Vec<usize>,
    cursor: usize,
}

impl<'a> Dataloader<'a> {
    /// Iterate a slice of graphs in `batch_size` groups (the last batch may
    /// be smaller).
    pub fn new(graphs: &'a [GraphData], batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be > 0".to_string()));
        }
        debug!(
            "dataloader over {} graphs, batch_size {batch_size}",
            graphs.len()
        );
        Ok(Self {
            graphs,
            batch_size,
            shuffle: false,
            rng: None,
            order: (0..graphs.len()).collect(),
            cursor: 0,
        })
    }

    /// Iterate a dataset's graphs.
    pub fn from_dataset(dataset: &'a dyn Dataset, batch_size: usize) -> Result<Self> {
        Self::new(dataset.graphs(), batch_size)
    }

    /// Shuffle the graph order on every [`reset`](Self::reset) (including the
    /// initial pass).
    pub fn shuffled(mut self) -> Self {
        self.shuffle = true;
        self.reset();
        self
    }

    /// Use a fixed RNG seed so shuffled iteration is reproducible. Each
    /// `reset` continues the seeded stream, so successive epochs still see
    /// different orders.
    ///
    /// The seed only affects shuffled loaders; without
    /// [`shuffled`](Self::shuffled) iteration stays in dataset order.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Some(StdRng::seed_from_u64(seed));
        if self.shuffle {
            self.reset();
        }
        self
    }

    /// Restart iteration from the beginning, reshuffling if enabled.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.order = (0..self.graphs.len()).collect();
        if self.shuffle {
            match self.rng.as_mut() {
                Some(rng) => self.order.shuffle(rng),
                None => self.order.shuffle(&mut rand::thread_rng()),
            }
        }
    }

    /// Number of batches per full pass.
    pub fn num_batches(&self) -> usize {
        self.graphs.len().div_ceil(self.batch_size)
    }
}

impl Iterator for Dataloader<'_> {
    type Item = Result<GraphBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.order.len() {
            return None;
        }
        let end = usize::min(self.cursor + self.batch_size, self.order.len());
        let members: Vec<&GraphData> = self.order[self.cursor..end]
            .iter()
            .map(|&i| &self.graphs[i])
            .collect();
        self.cursor = end;
        Some(GraphBatch::from_graphs(&members))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{Device, Tensor};

    /// One-edge graph tagged with a recognizable graph feature.
    fn tagged(device: &Device, tag: f32) -> GraphData {
        let ei = Tensor::new(&[[0u32, 1], [1, 0]], device).unwrap();
        let gf = Tensor::new(&[[tag]], device).unwrap();
        GraphData::new(ei).unwrap().with_graph_features(gf).unwrap()
    }

    fn tags_of(batch: &GraphBatch) -> Vec<f32> {
        batch
            .graph_features()
            .unwrap()
            .to_vec2::<f32>()
            .unwrap()
            .into_iter()
            .map(|row| row[0])
            .collect()
    }

    #[test]
    fn test_batch_partitioning() {
        let device = Device::Cpu;
        let graphs: Vec<_> = (0..7).map(|i| tagged(&device, i as f32)).collect();

        let loader = Dataloader::new(&graphs, 3).unwrap();
        assert_eq!(loader.num_batches(), 3);

        let batches: Vec<_> = loader.map(|b| b.unwrap()).collect();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].num_graphs(), 3);
        assert_eq!(batches[1].num_graphs(), 3);
        assert_eq!(batches[2].num_graphs(), 1);

        // Unshuffled iteration preserves order.
        assert_eq!(tags_of(&batches[0]), vec![0., 1., 2.]);
        assert_eq!(tags_of(&batches[2]), vec![6.]);
    }

    #[test]
    fn test_reset_restarts() {
        let device = Device::Cpu;
        let graphs: Vec<_> = (0..4).map(|i| tagged(&device, i as f32)).collect();

        let mut loader = Dataloader::new(&graphs, 2).unwrap();
        assert_eq!(loader.by_ref().count(), 2);
        assert!(loader.next().is_none());

        loader.reset();
        assert_eq!(loader.by_ref().count(), 2);
    }

    #[test]
    fn test_seeded_shuffle_reproducible() {
        let device = Device::Cpu;
        let graphs: Vec<_> = (0..10).map(|i| tagged(&device, i as f32)).collect();

        let order = |seed| -> Vec<f32> {
            Dataloader::new(&graphs, 10)
                .unwrap()
                .shuffled()
                .with_seed(seed)
                .map(|b| tags_of(&b.unwrap()))
                .next()
                .unwrap()
        };

        assert_eq!(order(7), order(7));
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let device = Device::Cpu;
        let graphs: Vec<_> = (0..10).map(|i| tagged(&device, i as f32)).collect();

        let loader = Dataloader::new(&graphs, 4).unwrap().shuffled().with_seed(3);
        let mut seen: Vec<f32> = loader.flat_map(|b| tags_of(&b.unwrap())).collect();
        seen.sort_by(f32::total_cmp);

        let expect: Vec<f32> = (0..10).map(|i| i as f32).collect();
        assert_eq!(seen, expect);
    }

    #[test]
    fn test_seed_without_shuffle_keeps_order() {
        let device = Device::Cpu;
        let graphs: Vec<_> = (0..5).map(|i| tagged(&device, i as f32)).collect();

        let loader = Dataloader::new(&graphs, 5).unwrap().with_seed(11);
        let batch = loader.map(|b| b.unwrap()).next().unwrap();
        assert_eq!(tags_of(&batch), vec![0., 1., 2., 3., 4.]);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let device = Device::Cpu;
        let graphs = vec![tagged(&device, 0.)];
        assert!(matches!(
            Dataloader::new(&graphs, 0),
            Err(Error::InvalidConfig(_))
        ));
    }
}
