use digit_mlp::config::ClassifierConfig;
use digit_mlp::data::{Batch, IMAGE_SIZE, NUM_CLASSES};
use digit_mlp::nn::{Activation, Classifier, Linear, Module, Sequential};
use digit_mlp::tensor::{functional, Tensor};
use digit_mlp::Error;

use rand::prelude::*;
use rand_distr::Normal;

fn random_batch(rows: usize, seed: u64) -> Tensor<f32> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    Tensor::new(
        (0..rows * IMAGE_SIZE).map(|_| rng.gen::<f32>()).collect(),
        vec![rows, IMAGE_SIZE],
    )
}

/// 784 -> 128 -> 64 -> 10 with every parameter drawn from `N(0, std²)`.
fn random_model(std: f32, activation: Activation, seed: u64) -> Classifier {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, std).unwrap();
    let mut sample_vector = |shape: &[usize]| {
        Tensor::new(
            (0..shape.iter().product::<usize>())
                .map(|_| normal.sample(&mut rng))
                .collect(),
            shape.to_vec(),
        )
    };
    let model = Sequential::from_layers([
        (
            "hidden1",
            Linear::new(
                sample_vector(&[784, 128]),
                sample_vector(&[128]),
                Some(activation),
            )
            .unwrap(),
        ),
        (
            "hidden2",
            Linear::new(
                sample_vector(&[128, 64]),
                sample_vector(&[64]),
                Some(activation),
            )
            .unwrap(),
        ),
        (
            "output",
            Linear::new(
                sample_vector(&[64, 10]),
                sample_vector(&[10]),
                Some(Activation::Softmax),
            )
            .unwrap(),
        ),
    ])
    .unwrap();
    Classifier::from_sequential(model).unwrap()
}

fn zero_model(activation: Activation) -> Classifier {
    let layer = |fan_in: usize, fan_out: usize, activation: Activation| {
        Linear::new(
            Tensor::zeros(vec![fan_in, fan_out]),
            Tensor::zeros(vec![fan_out]),
            Some(activation),
        )
        .unwrap()
    };
    let model = Sequential::from_layers([
        ("hidden1", layer(784, 128, activation)),
        ("hidden2", layer(128, 64, activation)),
        ("output", layer(64, 10, Activation::Softmax)),
    ])
    .unwrap();
    Classifier::from_sequential(model).unwrap()
}

#[test]
fn test_output_shape_is_64_by_10() {
    let classifier = random_model(0.1, Activation::Sigmoid, 0);
    let probs = classifier.forward(&random_batch(64, 1)).unwrap();
    assert_eq!(probs.shape(), &[64, NUM_CLASSES]);
}

#[test]
fn test_rows_are_distributions() {
    for (seed, activation) in [
        (0, Activation::Sigmoid),
        (1, Activation::Relu),
        (2, Activation::Tanh),
    ] {
        let classifier = random_model(0.1, activation, seed);
        let probs = classifier.forward(&random_batch(32, seed + 10)).unwrap();
        for row in probs.rows() {
            let total: f32 = row.iter().sum();
            assert!((total - 1.0).abs() < 1e-6, "total={total}, row={row:?}");
            assert!(row.iter().all(|&p| p > 0.0 && p < 1.0), "row={row:?}");
        }
    }
}

#[test]
fn test_large_weights_stay_finite() {
    // Large parameters push the logits far past where a plain exp overflows.
    let classifier = random_model(3.0, Activation::Relu, 5);
    let probs = classifier.forward(&random_batch(8, 6)).unwrap();
    assert!(probs.as_slice().iter().all(|p| p.is_finite()));
    for row in probs.rows() {
        let total: f32 = row.iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
    }
}

#[test]
fn test_zero_parameters_give_uniform_output() {
    let classifier = zero_model(Activation::Sigmoid);
    let probs = classifier.forward(&random_batch(16, 2)).unwrap();
    assert_eq!(probs.shape(), &[16, 10]);
    assert!(probs.as_slice().iter().all(|&p| (p - 0.1).abs() < 1e-7));
}

#[test]
fn test_width_783_is_rejected() {
    let classifier = Classifier::new(&ClassifierConfig::default()).unwrap();
    let batch = Tensor::<f32>::zeros(vec![64, 783]);
    for _ in 0..2 {
        assert!(matches!(
            classifier.forward(&batch),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}

#[test]
fn test_empty_batch_is_rejected() {
    let classifier = Classifier::new(&ClassifierConfig::default()).unwrap();
    let batch = Tensor::<f32>::zeros(vec![0, IMAGE_SIZE]);
    assert!(matches!(
        classifier.forward(&batch),
        Err(Error::DimensionError { .. })
    ));
    let flat = Tensor::<f32>::zeros(vec![IMAGE_SIZE]);
    assert!(matches!(
        classifier.forward(&flat),
        Err(Error::DimensionError { .. })
    ));
}

#[test]
fn test_forward_is_pure() {
    let classifier = Classifier::new(&ClassifierConfig::default()).unwrap();
    let batch = random_batch(4, 3);
    assert_eq!(
        classifier.forward(&batch).unwrap(),
        classifier.forward(&batch).unwrap()
    );
}

#[test]
fn test_predict_and_accuracy() {
    let classifier = Classifier::new(&ClassifierConfig::default()).unwrap();
    let images = random_batch(10, 4);
    let predictions = classifier.predict(&images).unwrap();
    assert_eq!(predictions.len(), 10);
    assert!(predictions.iter().all(|&p| p < NUM_CLASSES));

    let labels: Vec<u8> = predictions.iter().map(|&p| p as u8).collect();
    let batch = Batch {
        images: images.clone(),
        labels,
    };
    assert_eq!(classifier.accuracy(&batch).unwrap(), 1.0);

    let wrong = Batch {
        images,
        labels: predictions.iter().map(|&p| ((p + 1) % 10) as u8).collect(),
    };
    assert_eq!(classifier.accuracy(&wrong).unwrap(), 0.0);
}

#[test]
fn test_update_params_changes_output() {
    let mut classifier = Classifier::new(&ClassifierConfig::default()).unwrap();
    let batch = random_batch(2, 9);
    let before = classifier.forward(&batch).unwrap();

    let zeros: Vec<_> = classifier
        .params()
        .into_iter()
        .map(|p| p.map(|_| 0.0))
        .collect();
    classifier.update_params(zeros).unwrap();
    let after = classifier.forward(&batch).unwrap();
    assert_ne!(before, after);
    assert!(after.as_slice().iter().all(|&p| (p - 0.1).abs() < 1e-7));
}

#[test]
fn test_softmax_layer_matches_functional() {
    let classifier = random_model(0.1, Activation::Relu, 11);
    let batch = random_batch(3, 12);

    // Re-run the same network by hand.
    let mut x = batch.clone();
    for (_, layer) in classifier.model().layers() {
        let h = functional::linear(&x, layer.weights(), layer.bias()).unwrap();
        x = layer.activation().apply(&h);
    }
    assert_eq!(x, classifier.forward(&batch).unwrap());
}
