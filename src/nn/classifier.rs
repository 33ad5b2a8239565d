use log::debug;
use rand::SeedableRng;

use crate::config::ClassifierConfig;
use crate::data::Batch;
use crate::error::{Error, Result};
use crate::nn::{init, Activation, Linear, Module, Sequential};
use crate::tensor::functional;
use crate::tensor::Tensor;

/// The digit classifier: hidden layers with a shared activation, then a softmax output layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Classifier {
    model: Sequential<f32>,
}

impl Classifier {
    /// Draw fresh parameters as described by `config`. The same seed gives the same weights.
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = rand::rngs::StdRng::seed_from_u64(config.init.seed);
        let sizes = config.layer_sizes();
        let last = sizes.len() - 2;

        let mut model: Sequential<f32> = Sequential::new();
        for (i, pair) in sizes.windows(2).enumerate() {
            let (fan_in, fan_out) = (pair[0], pair[1]);
            let weights = config.init.initializer.weights(fan_in, fan_out, &mut rng)?;
            let bias = init::zeros(&[fan_out]);
            let (name, activation) = if i == last {
                ("output".to_string(), Activation::Softmax)
            } else {
                (format!("hidden{}", i + 1), config.hidden_activation)
            };
            model = model.add(name, Linear::new(weights, bias, Some(activation))?)?;
        }
        debug!(
            "classifier: sizes={:?}, {} parameters",
            sizes,
            model.num_params()
        );
        Ok(Classifier { model })
    }

    /// Wrap hand-built layers. The last layer must end in softmax so outputs are distributions.
    pub fn from_sequential(model: Sequential<f32>) -> Result<Self> {
        let output = model
            .layers()
            .last()
            .map(|(name, layer)| (name.to_string(), layer.activation()));
        match output {
            Some((_, Activation::Softmax)) => Ok(Classifier { model }),
            Some((name, _)) => Err(Error::Config(format!(
                "output layer {name:?} must use softmax"
            ))),
            None => Err(Error::Config("classifier has no layers".to_string())),
        }
    }

    pub fn model(&self) -> &Sequential<f32> {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut Sequential<f32> {
        &mut self.model
    }

    pub fn num_classes(&self) -> usize {
        self.model.out_features().unwrap_or(0)
    }

    pub fn forward(&self, images: &Tensor<f32>) -> Result<Tensor<f32>> {
        self.model.forward(images)
    }

    pub fn predict(&self, images: &Tensor<f32>) -> Result<Vec<usize>> {
        self.forward(images).map(|probs| functional::argmax(&probs))
    }

    pub fn accuracy(&self, batch: &Batch) -> Result<f32> {
        let predictions = self.predict(&batch.images)?;
        if predictions.len() != batch.labels.len() {
            return Err(Error::shape_mismatch(
                "accuracy",
                &[predictions.len()],
                &[batch.labels.len()],
            ));
        }
        let correct = predictions
            .iter()
            .zip(batch.labels.iter())
            .filter(|&(&p, &label)| p == label as usize)
            .count();
        Ok(correct as f32 / predictions.len() as f32)
    }
}

impl crate::nn::module::private::Private for Classifier {}

impl Module<f32> for Classifier {
    fn forward(&self, batch: &Tensor<f32>) -> Result<Tensor<f32>> {
        Classifier::forward(self, batch)
    }

    fn params(&self) -> Vec<&Tensor<f32>> {
        self.model.params()
    }

    fn update_params(&mut self, new_params: Vec<Tensor<f32>>) -> Result<()> {
        self.model.update_params(new_params)
    }
}

#[test]
fn test_default_classifier_layout() {
    let classifier = Classifier::new(&ClassifierConfig::default()).unwrap();
    let shapes: Vec<_> = classifier
        .model()
        .layers()
        .map(|(name, layer)| (name.to_string(), layer.weights().shape().to_vec()))
        .collect();
    assert_eq!(
        shapes,
        vec![
            ("hidden1".to_string(), vec![784, 128]),
            ("hidden2".to_string(), vec![128, 64]),
            ("output".to_string(), vec![64, 10]),
        ]
    );
    assert_eq!(classifier.num_classes(), 10);
    assert_eq!(
        classifier.num_params(),
        784 * 128 + 128 + 128 * 64 + 64 + 64 * 10 + 10
    );
}

#[test]
fn test_seed_is_reproducible() {
    let config = ClassifierConfig::default();
    assert_eq!(
        Classifier::new(&config).unwrap(),
        Classifier::new(&config).unwrap()
    );
    let mut other = config.clone();
    other.init.seed += 1;
    assert_ne!(
        Classifier::new(&config).unwrap(),
        Classifier::new(&other).unwrap()
    );
}

#[test]
fn test_no_hidden_layers() {
    let config = ClassifierConfig {
        hidden_sizes: vec![],
        ..Default::default()
    };
    let classifier = Classifier::new(&config).unwrap();
    assert_eq!(classifier.model().len(), 1);
    assert!(classifier.model().get("output").is_some());
}

#[test]
fn test_from_sequential_requires_softmax() {
    let layer = Linear::new(Tensor::zeros(vec![4, 3]), Tensor::zeros(vec![3]), None).unwrap();
    let model = Sequential::from_layers([("fc", layer)]).unwrap();
    assert!(matches!(
        Classifier::from_sequential(model),
        Err(Error::Config(_))
    ));
    assert!(Classifier::from_sequential(Sequential::new()).is_err());
}
