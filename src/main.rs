use std::sync::Arc;

use digit_mlp::config::ClassifierConfig;
use digit_mlp::data::{
    Batch, DataLoader, DigitBatcher, InMemDataset, Sample, IMAGE_SIZE, NUM_CLASSES,
};
use digit_mlp::nn::Classifier;
use digit_mlp::tensor::functional;
use digit_mlp::Result;

use log::*;
use rand::prelude::*;

const NUM_SAMPLES: usize = 256;
const BATCH_SIZE: usize = 64;

fn main() {
    pretty_env_logger::init();
    if let Err(e) = run() {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => ClassifierConfig::load(path)?,
        None => ClassifierConfig::default(),
    };
    info!("layer sizes: {:?}", config.layer_sizes());
    let classifier = Classifier::new(&config)?;

    // Random pixel intensities in [0, 1) stand in for real digits.
    let mut rng = rand::rngs::StdRng::seed_from_u64(config.init.seed);
    let samples: InMemDataset<Sample> = (0..NUM_SAMPLES)
        .map(|_| Sample {
            image: (0..IMAGE_SIZE).map(|_| rng.gen::<f32>()).collect(),
            label: rng.gen_range(0..NUM_CLASSES as u8),
        })
        .collect();
    let loader = DataLoader::<Sample, Result<Batch>>::new(
        Arc::new(samples),
        Arc::new(DigitBatcher),
        BATCH_SIZE,
    )?
    .shuffle(42);

    for (i, batch) in loader.iter().enumerate() {
        let batch = batch?;
        let probs = classifier.forward(&batch.images)?;
        let correct = functional::argmax(&probs)
            .into_iter()
            .zip(batch.labels.iter())
            .filter(|&(p, &label)| p == label as usize)
            .count();
        info!(
            "batch {}: images={:?} probabilities={:?} accuracy={:.3}",
            i,
            batch.images.shape(),
            probs.shape(),
            correct as f32 / batch.len() as f32
        );
        if i == 0 {
            if let Some(row) = probs.row(0) {
                info!("first sample (label {}): {:?}", batch.labels[0], row);
            }
        }
    }

    println!("\n\nsuccess!!!");
    Ok(())
}
