use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::{IMAGE_SIZE, NUM_CLASSES};
use crate::error::{Error, Result};
use crate::nn::init::Initializer;
use crate::nn::Activation;

/// Layer sizes and initialization for a [`Classifier`](crate::nn::Classifier).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub input_size: usize,
    pub hidden_sizes: Vec<usize>,
    pub num_classes: usize,
    pub hidden_activation: Activation,
    pub init: InitConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitConfig {
    pub initializer: Initializer,
    pub seed: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            input_size: IMAGE_SIZE,
            hidden_sizes: vec![128, 64],
            num_classes: NUM_CLASSES,
            hidden_activation: Activation::Relu,
            init: InitConfig::default(),
        }
    }
}

impl Default for InitConfig {
    fn default() -> Self {
        InitConfig {
            initializer: Initializer::default(),
            seed: 42,
        }
    }
}

impl ClassifierConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ClassifierConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn layer_sizes(&self) -> Vec<usize> {
        std::iter::once(self.input_size)
            .chain(self.hidden_sizes.iter().copied())
            .chain(std::iter::once(self.num_classes))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 {
            return Err(Error::Config("input_size must be positive".to_string()));
        }
        if self.num_classes < 2 {
            return Err(Error::Config(format!(
                "need at least two classes, got {}",
                self.num_classes
            )));
        }
        if let Some(pos) = self.hidden_sizes.iter().position(|&size| size == 0) {
            return Err(Error::Config(format!("hidden layer {} has size zero", pos + 1)));
        }
        if self.hidden_activation == Activation::Softmax {
            return Err(Error::Config(
                "softmax is reserved for the output layer".to_string(),
            ));
        }
        self.init.initializer.validate()
    }
}

#[test]
fn test_default_layer_sizes() {
    let config = ClassifierConfig::default();
    assert_eq!(config.layer_sizes(), vec![784, 128, 64, 10]);
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_json_keeps_defaults() {
    let config =
        ClassifierConfig::from_json(r#"{"hidden_sizes": [32], "hidden_activation": "sigmoid"}"#)
            .unwrap();
    assert_eq!(config.layer_sizes(), vec![784, 32, 10]);
    assert_eq!(config.hidden_activation, Activation::Sigmoid);
    assert_eq!(config.init.seed, 42);
}

#[test]
fn test_initializer_json() {
    let config = ClassifierConfig::from_json(
        r#"{"init": {"initializer": {"kind": "fan_in_uniform"}, "seed": 3}}"#,
    )
    .unwrap();
    assert_eq!(config.init.initializer, Initializer::FanInUniform);
    assert_eq!(config.init.seed, 3);
}

#[test]
fn test_invalid_configs() {
    assert!(matches!(
        ClassifierConfig::from_json(r#"{"hidden_sizes": [128, 0]}"#),
        Err(Error::Config(_))
    ));
    assert!(matches!(
        ClassifierConfig::from_json(r#"{"hidden_activation": "softmax"}"#),
        Err(Error::Config(_))
    ));
    assert!(matches!(
        ClassifierConfig::from_json(r#"{"input_size": 0}"#),
        Err(Error::Config(_))
    ));
    assert!(matches!(
        ClassifierConfig::from_json("{not json"),
        Err(Error::Json(_))
    ));
}

#[test]
fn test_json_round_trip() {
    let config = ClassifierConfig::default();
    let json = config.to_json().unwrap();
    assert_eq!(ClassifierConfig::from_json(&json).unwrap(), config);
}
