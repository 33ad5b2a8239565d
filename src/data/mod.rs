//! In-memory digit samples and the shuffled batch loader that feeds the classifier.
mod dataloader;
mod dataset;

pub use dataloader::*;
pub use dataset::*;

use serde::{Deserialize, Serialize};

use crate::tensor::Tensor;

pub const WIDTH: usize = 28;
pub const HEIGHT: usize = 28;
pub const IMAGE_SIZE: usize = WIDTH * HEIGHT;
pub const NUM_CLASSES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub image: Vec<f32>,
    pub label: u8,
}

/// Images stacked as an `(n, IMAGE_SIZE)` tensor, with one label per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub images: Tensor<f32>,
    pub labels: Vec<u8>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
