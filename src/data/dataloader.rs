use std::sync::Arc;

use log::{trace, warn};
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::{Batch, Dataset, Sample, IMAGE_SIZE};
use crate::error::{Error, Result};
use crate::tensor::Tensor;

pub trait Batcher<I, O>: Send + Sync {
    fn batch(&self, items: Vec<I>) -> O;
}

/// Stacks [`Sample`]s into a [`Batch`], rejecting images that are not `IMAGE_SIZE` long.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigitBatcher;

impl Batcher<Sample, Result<Batch>> for DigitBatcher {
    fn batch(&self, items: Vec<Sample>) -> Result<Batch> {
        if items.is_empty() {
            return Err(Error::dimension("batch", &[0, IMAGE_SIZE], "no samples"));
        }
        let mut images = Vec::with_capacity(items.len() * IMAGE_SIZE);
        let mut labels = Vec::with_capacity(items.len());
        for item in items {
            if item.image.len() != IMAGE_SIZE {
                return Err(Error::shape_mismatch(
                    "batch",
                    &[IMAGE_SIZE],
                    &[item.image.len()],
                ));
            }
            images.extend(item.image);
            labels.push(item.label);
        }
        let images = Tensor::new(images, vec![labels.len(), IMAGE_SIZE]);
        Ok(Batch { images, labels })
    }
}

/// Cuts a dataset into batches of `batch_size` items, the last one possibly shorter.
///
/// With a shuffle seed every epoch visits each index exactly once, in an order
/// fixed by `(seed, epoch)`.
pub struct DataLoader<I, O> {
    dataset: Arc<dyn Dataset<I>>,
    batcher: Arc<dyn Batcher<I, O>>,
    batch_size: usize,
    shuffle_seed: Option<u64>,
}

impl<I, O> DataLoader<I, O> {
    pub fn new(
        dataset: Arc<dyn Dataset<I>>,
        batcher: Arc<dyn Batcher<I, O>>,
        batch_size: usize,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::dimension(
                "dataloader",
                &[batch_size],
                "batch size must be positive",
            ));
        }
        Ok(DataLoader {
            dataset,
            batcher,
            batch_size,
            shuffle_seed: None,
        })
    }

    pub fn shuffle(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Number of batches in one epoch.
    pub fn len(&self) -> usize {
        self.dataset.len().div_ceil(self.batch_size)
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    pub fn iter(&self) -> BatchIter<'_, I, O> {
        self.iter_epoch(0)
    }

    pub fn iter_epoch(&self, epoch: u64) -> BatchIter<'_, I, O> {
        let mut indices: Vec<usize> = (0..self.dataset.len()).collect();
        if let Some(seed) = self.shuffle_seed {
            let mut rng = rand::rngs::StdRng::seed_from_u64(seed.wrapping_add(epoch));
            indices.shuffle(&mut rng);
        }
        BatchIter {
            loader: self,
            indices,
            position: 0,
        }
    }
}

pub struct BatchIter<'a, I, O> {
    loader: &'a DataLoader<I, O>,
    indices: Vec<usize>,
    position: usize,
}

impl<'a, I, O> Iterator for BatchIter<'a, I, O> {
    type Item = O;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.indices.len() {
            return None;
        }
        let end = self
            .position
            .saturating_add(self.loader.batch_size)
            .min(self.indices.len());
        let items: Vec<I> = self.indices[self.position..end]
            .iter()
            .filter_map(|&idx| {
                let item = self.loader.dataset.get(idx);
                if item.is_none() {
                    warn!("dataset has no item at index {idx}, skipping it");
                }
                item
            })
            .collect();
        trace!("batch of {} items at position {}", items.len(), self.position);
        self.position = end;
        Some(self.loader.batcher.batch(items))
    }
}

#[cfg(test)]
fn samples(n: usize) -> Vec<Sample> {
    (0..n)
        .map(|i| Sample {
            image: vec![i as f32; IMAGE_SIZE],
            label: (i % 10) as u8,
        })
        .collect()
}

#[cfg(test)]
fn loader(n: usize, batch_size: usize) -> DataLoader<Sample, Result<Batch>> {
    DataLoader::<Sample, Result<Batch>>::new(
        Arc::new(super::InMemDataset::new(samples(n))),
        Arc::new(DigitBatcher),
        batch_size,
    )
    .unwrap()
}

#[cfg(test)]
fn first_pixels(batch: &Batch) -> Vec<usize> {
    batch.images.rows().map(|row| row[0] as usize).collect()
}

#[test]
fn test_batches_have_fixed_size() {
    let loader = loader(10, 4);
    let sizes: Vec<_> = loader.iter().map(|b| b.unwrap().len()).collect();
    assert_eq!(sizes, vec![4, 4, 2]);
    assert_eq!(loader.len(), 3);
}

#[test]
fn test_huge_batch_size() {
    let loader = loader(3, usize::MAX);
    assert_eq!(loader.len(), 1);
    assert_eq!(loader.iter().count(), 1);
    let batch = loader.iter().next().unwrap().unwrap();
    assert_eq!(batch.len(), 3);
}

#[test]
fn test_unshuffled_order() {
    let loader = loader(5, 5);
    let batch = loader.iter().next().unwrap().unwrap();
    assert_eq!(first_pixels(&batch), vec![0, 1, 2, 3, 4]);
    assert_eq!(batch.images.shape(), &[5, IMAGE_SIZE]);
    assert_eq!(batch.labels, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_shuffle_visits_every_sample_once() {
    let loader = loader(37, 8).shuffle(42);
    let mut seen: Vec<usize> = loader
        .iter()
        .flat_map(|b| first_pixels(&b.unwrap()))
        .collect();
    let order = seen.clone();
    seen.sort_unstable();
    assert_eq!(seen, (0..37).collect::<Vec<_>>());
    assert_ne!(order, (0..37).collect::<Vec<_>>());
}

#[test]
fn test_shuffle_is_seeded() {
    let order = |seed: u64, epoch: u64| -> Vec<usize> {
        loader(20, 6)
            .shuffle(seed)
            .iter_epoch(epoch)
            .flat_map(|b| first_pixels(&b.unwrap()))
            .collect()
    };
    assert_eq!(order(1, 0), order(1, 0));
    assert_ne!(order(1, 0), order(1, 1));
}

#[test]
fn test_missing_items_are_skipped() {
    // Claims four items but has nothing at index 2.
    struct Sparse(Vec<Sample>);

    impl Dataset<Sample> for Sparse {
        fn get(&self, index: usize) -> Option<Sample> {
            match index {
                2 => None,
                _ => self.0.get(index).cloned(),
            }
        }

        fn len(&self) -> usize {
            self.0.len()
        }
    }

    let loader = DataLoader::<Sample, Result<Batch>>::new(
        Arc::new(Sparse(samples(4))),
        Arc::new(DigitBatcher),
        4,
    )
    .unwrap();
    let batch = loader.iter().next().unwrap().unwrap();
    assert_eq!(first_pixels(&batch), vec![0, 1, 3]);
}

#[test]
fn test_zero_batch_size() {
    let result = DataLoader::<Sample, Result<Batch>>::new(
        Arc::new(super::InMemDataset::new(samples(3))),
        Arc::new(DigitBatcher),
        0,
    );
    assert!(matches!(result, Err(Error::DimensionError { .. })));
}

#[test]
fn test_wrong_image_size() {
    let bad = vec![Sample {
        image: vec![0.0; IMAGE_SIZE - 1],
        label: 3,
    }];
    assert!(matches!(
        DigitBatcher.batch(bad),
        Err(Error::ShapeMismatch { .. })
    ));
    assert!(matches!(
        DigitBatcher.batch(vec![]),
        Err(Error::DimensionError { .. })
    ));
}
