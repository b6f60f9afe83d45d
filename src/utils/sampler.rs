//! Batch selection for stochastic and mini-batch gradient descent
//!
//! A [`BatchSampler`] walks a shuffled permutation of the sample indices and
//! hands out fixed-size chunks. Within an epoch no index is repeated; when the
//! remaining indices cannot fill a whole batch the epoch ends and a new
//! permutation is drawn.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

use crate::error::{Error, Result};

/// How many samples contribute to each gradient evaluation.
///
/// Deserializes from `"full"`, `"single"` or `{ "mini": n }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchSize {
    /// Every sample: batch gradient descent.
    Full,
    /// One sample per step: stochastic gradient descent.
    Single,
    /// `n` samples per step: mini-batch gradient descent.
    Mini(usize),
}

impl BatchSize {
    /// Number of samples per batch for a dataset of `samples` entries.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyDataset`] when `samples == 0`, and
    /// [`Error::InvalidBatchSize`] for `Mini(0)` or `Mini(n)` with `n > samples`.
    pub fn resolve(self, samples: usize) -> Result<usize> {
        if samples == 0 {
            return Err(Error::EmptyDataset);
        }
        match self {
            BatchSize::Full => Ok(samples),
            BatchSize::Single => Ok(1),
            BatchSize::Mini(n) if n == 0 || n > samples => {
                Err(Error::InvalidBatchSize { batch: n, samples })
            }
            BatchSize::Mini(n) => Ok(n),
        }
    }

    /// Short label used in run names and reports.
    pub fn label(self) -> String {
        match self {
            BatchSize::Full => "batch".to_string(),
            BatchSize::Single => "sgd".to_string(),
            BatchSize::Mini(n) => format!("mini-batch({})", n),
        }
    }
}

/// Draws batches of sample indices without replacement within an epoch.
#[derive(Debug, Clone)]
pub struct BatchSampler {
    order: Vec<usize>,
    batch: usize,
    cursor: usize,
    epoch: usize,
    shuffle: bool,
}

impl BatchSampler {
    /// Creates a sampler over `samples` indices.
    ///
    /// Full batches are returned in index order and never reshuffled, since
    /// the order does not affect the averaged gradient.
    pub fn new(samples: usize, batch_size: BatchSize) -> Result<Self> {
        let batch = batch_size.resolve(samples)?;
        let dropped = samples % batch;
        if dropped > 0 {
            log::warn!(
                "{} of {} samples are left out of each epoch by batches of {}",
                dropped,
                samples,
                batch
            );
        }
        Ok(Self {
            order: (0..samples).collect(),
            batch,
            // Forces a shuffle on the first call.
            cursor: samples,
            epoch: 0,
            shuffle: batch < samples,
        })
    }

    /// Number of indices in every batch.
    pub fn batch_len(&self) -> usize {
        self.batch
    }

    /// Number of epochs started so far.
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    /// Returns the next batch of indices.
    pub fn next_batch<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &[usize] {
        if self.cursor + self.batch > self.order.len() {
            if self.shuffle {
                self.order.shuffle(rng);
            }
            self.cursor = 0;
            self.epoch += 1;
        }
        let start = self.cursor;
        self.cursor += self.batch;
        &self.order[start..self.cursor]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_resolve() {
        assert_eq!(BatchSize::Full.resolve(10).unwrap(), 10);
        assert_eq!(BatchSize::Single.resolve(10).unwrap(), 1);
        assert_eq!(BatchSize::Mini(4).resolve(10).unwrap(), 4);
        assert_eq!(BatchSize::Mini(10).resolve(10).unwrap(), 10);
        assert!(matches!(
            BatchSize::Mini(0).resolve(10),
            Err(Error::InvalidBatchSize { batch: 0, samples: 10 })
        ));
        assert!(matches!(
            BatchSize::Mini(11).resolve(10),
            Err(Error::InvalidBatchSize { .. })
        ));
        assert!(matches!(BatchSize::Full.resolve(0), Err(Error::EmptyDataset)));
    }

    #[test]
    fn test_full_batch_is_every_index() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut sampler = BatchSampler::new(5, BatchSize::Full).unwrap();
        for _ in 0..3 {
            assert_eq!(sampler.next_batch(&mut rng), &[0, 1, 2, 3, 4]);
        }
        assert_eq!(sampler.epoch(), 3);
    }

    #[test]
    fn test_epoch_covers_each_index_once() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut sampler = BatchSampler::new(12, BatchSize::Mini(4)).unwrap();

        let mut seen = Vec::new();
        for _ in 0..3 {
            let batch = sampler.next_batch(&mut rng);
            assert_eq!(batch.len(), 4);
            seen.extend_from_slice(batch);
        }
        assert_eq!(sampler.epoch(), 1);

        seen.sort_unstable();
        assert_eq!(seen, (0..12).collect::<Vec<_>>());
    }

    #[test]
    fn test_trailing_partial_batch_is_dropped() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut sampler = BatchSampler::new(5, BatchSize::Mini(2)).unwrap();

        sampler.next_batch(&mut rng);
        sampler.next_batch(&mut rng);
        assert_eq!(sampler.epoch(), 1);
        // Only one index would remain, so a new epoch starts.
        let batch = sampler.next_batch(&mut rng).to_vec();
        assert_eq!(batch.len(), 2);
        assert_eq!(sampler.epoch(), 2);
    }

    #[test]
    fn test_single_sample_batches() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut sampler = BatchSampler::new(4, BatchSize::Single).unwrap();
        let mut seen: Vec<usize> = (0..4).map(|_| sampler.next_batch(&mut rng)[0]).collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);
        assert_eq!(sampler.batch_len(), 1);
    }

    #[test]
    fn test_same_seed_same_batches() {
        let mut a = BatchSampler::new(20, BatchSize::Mini(5)).unwrap();
        let mut b = a.clone();
        let mut rng_a = StdRng::seed_from_u64(42);
        let mut rng_b = StdRng::seed_from_u64(42);
        for _ in 0..10 {
            assert_eq!(a.next_batch(&mut rng_a), b.next_batch(&mut rng_b));
        }
    }
}
