//! The two-layer network written out with explicit weight matrices and free functions.
use digit_mlp::data::{Batch, DataLoader, DigitBatcher, InMemDataset, Sample, IMAGE_SIZE};
use digit_mlp::nn::init;
use digit_mlp::tensor::{functional, Tensor};
use digit_mlp::Result;

use rand::prelude::*;
use std::sync::Arc;

struct Params {
    w1: Tensor<f32>,
    b1: Tensor<f32>,
    w2: Tensor<f32>,
    b2: Tensor<f32>,
}

fn params(seed: u64) -> Params {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    Params {
        w1: init::normal(&[IMAGE_SIZE, 256], 0.05, &mut rng).unwrap(),
        b1: init::normal(&[256], 0.05, &mut rng).unwrap(),
        w2: init::normal(&[256, 10], 0.05, &mut rng).unwrap(),
        b2: init::normal(&[10], 0.05, &mut rng).unwrap(),
    }
}

fn network(x: &Tensor<f32>, p: &Params) -> Result<Tensor<f32>> {
    let h = functional::sigmoid(&functional::linear(x, &p.w1, &p.b1)?);
    let out = functional::linear(&h, &p.w2, &p.b2)?;
    Ok(functional::softmax(&out))
}

fn dataset(n: usize, seed: u64) -> InMemDataset<Sample> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| Sample {
            image: (0..IMAGE_SIZE).map(|_| rng.gen_range(-1.0..1.0)).collect(),
            label: rng.gen_range(0..10),
        })
        .collect()
}

#[test]
fn test_manual_network_over_loader() {
    let p = params(0);
    let loader = DataLoader::<Sample, Result<Batch>>::new(
        Arc::new(dataset(150, 1)),
        Arc::new(DigitBatcher),
        64,
    )
    .unwrap()
    .shuffle(7);
    let mut rows = 0;
    for batch in loader.iter() {
        let batch = batch.unwrap();
        let probs = network(&batch.images, &p).unwrap();
        assert_eq!(probs.shape(), &[batch.len(), 10]);
        for row in probs.rows() {
            let total: f32 = row.iter().sum();
            assert!((total - 1.0).abs() < 1e-6);
        }
        rows += probs.num_rows();
    }
    assert_eq!(rows, 150);
}

#[test]
fn test_manual_network_zero_params_is_uniform() {
    let p = Params {
        w1: init::zeros(&[IMAGE_SIZE, 256]),
        b1: init::zeros(&[256]),
        w2: init::zeros(&[256, 10]),
        b2: init::zeros(&[10]),
    };
    let x = Tensor::new_with_filler(vec![3, IMAGE_SIZE], 0.7);
    let probs = network(&x, &p).unwrap();
    assert!(probs.as_slice().iter().all(|&v| (v - 0.1).abs() < 1e-7));
}

#[test]
fn test_manual_network_rejects_wrong_width() {
    let p = params(3);
    let x = Tensor::<f32>::zeros(vec![1, IMAGE_SIZE - 1]);
    assert!(network(&x, &p).is_err());
}
