use crate::error::ConfigError;
use ndarray::{Array2, ArrayView2, Axis};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// An endless stream of shuffled mini-batches over a training split.
///
/// Every epoch draws a fresh permutation from the stream's own rng and walks
/// it in `batch_size` chunks; the last chunk of an epoch may be shorter.
pub struct BatchStream<'a> {
    features: ArrayView2<'a, f32>,
    labels: ArrayView2<'a, f32>,
    batch_size: usize,
    rng: StdRng,
    order: Vec<usize>,
    cursor: usize,
    epoch: usize,
}

impl<'a> BatchStream<'a> {
    pub fn new(
        features: ArrayView2<'a, f32>,
        labels: ArrayView2<'a, f32>,
        batch_size: usize,
        seed: [u8; 32],
    ) -> Result<Self, ConfigError> {
        if batch_size == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "batch_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if features.nrows() == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "digits",
                reason: "training split is empty".to_string(),
            });
        }
        let num_samples = features.nrows();
        Ok(Self {
            features,
            labels,
            batch_size,
            rng: StdRng::from_seed(seed),
            order: (0..num_samples).collect(),
            cursor: num_samples,
            epoch: 0,
        })
    }

    pub fn batches_per_epoch(&self) -> usize {
        (self.order.len() + self.batch_size - 1) / self.batch_size
    }

    /// Number of epochs started so far.
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    /// Sample indices of the next batch, reshuffling at an epoch boundary.
    pub fn next_indices(&mut self) -> Vec<usize> {
        if self.cursor >= self.order.len() {
            self.order.shuffle(&mut self.rng);
            self.cursor = 0;
            self.epoch += 1;
        }
        let end = (self.cursor + self.batch_size).min(self.order.len());
        let indices = self.order[self.cursor..end].to_vec();
        self.cursor = end;
        indices
    }

    pub fn next_batch(&mut self) -> (Array2<f32>, Array2<f32>) {
        let indices = self.next_indices();
        (
            self.features.select(Axis(0), &indices),
            self.labels.select(Axis(0), &indices),
        )
    }
}

impl<'a> Iterator for BatchStream<'a> {
    type Item = (Array2<f32>, Array2<f32>);

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_batch())
    }
}
