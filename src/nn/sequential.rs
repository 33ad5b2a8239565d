use log::debug;

use crate::error::{Error, Result};
use crate::nn::{Linear, Module};
use crate::tensor::functional::check_batch;
use crate::tensor::{Float, Numeric, Tensor};

/// An ordered list of named layers, evaluated front to back.
///
/// Adjacent layers must chain: each layer's `in_features` equals the previous
/// layer's `out_features`. Names are unique.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequential<T>
where
    T: Numeric,
{
    layers: Vec<(String, Linear<T>)>,
}

impl<T> Default for Sequential<T>
where
    T: Numeric,
{
    fn default() -> Self {
        Sequential { layers: vec![] }
    }
}

impl<T> Sequential<T>
where
    T: Numeric + Float,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_layers<S, I>(layers: I) -> Result<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, Linear<T>)>,
    {
        layers
            .into_iter()
            .try_fold(Self::new(), |model, (name, layer)| model.add(name, layer))
    }

    pub fn add(mut self, name: impl Into<String>, layer: Linear<T>) -> Result<Self> {
        let name = name.into();
        if self.get(&name).is_some() {
            return Err(Error::Config(format!("duplicate layer name {name:?}")));
        }
        if let Some((_, last)) = self.layers.last() {
            if last.out_features() != layer.in_features() {
                return Err(Error::shape_mismatch(
                    "sequential",
                    last.weights().shape(),
                    layer.weights().shape(),
                ));
            }
        }
        debug!(
            "sequential: adding layer {name:?} ({} -> {}, {:?})",
            layer.in_features(),
            layer.out_features(),
            layer.activation()
        );
        self.layers.push((name, layer));
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Linear<T>> {
        self.layers
            .iter()
            .find(|(layer_name, _)| layer_name == name)
            .map(|(_, layer)| layer)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Linear<T>> {
        self.layers
            .iter_mut()
            .find(|(layer_name, _)| layer_name == name)
            .map(|(_, layer)| layer)
    }

    pub fn layers(&self) -> impl Iterator<Item = (&str, &Linear<T>)> {
        self.layers
            .iter()
            .map(|(name, layer)| (name.as_str(), layer))
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn in_features(&self) -> Option<usize> {
        self.layers.first().map(|(_, layer)| layer.in_features())
    }

    pub fn out_features(&self) -> Option<usize> {
        self.layers.last().map(|(_, layer)| layer.out_features())
    }
}

impl<T: Numeric> crate::nn::module::private::Private for Sequential<T> {}

impl<T> Module<T> for Sequential<T>
where
    T: Numeric + Float,
{
    fn forward(&self, batch: &Tensor<T>) -> Result<Tensor<T>> {
        check_batch(batch, "sequential")?;
        self.layers
            .iter()
            .try_fold(batch.clone(), |prev, (_, layer)| layer.forward(&prev))
    }

    fn params(&self) -> Vec<&Tensor<T>> {
        self.layers
            .iter()
            .flat_map(|(_, layer)| layer.params())
            .collect()
    }

    fn update_params(&mut self, new_params: Vec<Tensor<T>>) -> Result<()> {
        let expected = 2 * self.layers.len();
        if new_params.len() != expected {
            return Err(Error::dimension(
                "update_params",
                &[new_params.len()],
                format!("expected {expected} parameters, two per layer"),
            ));
        }
        // Validate everything before touching any layer.
        for ((_, layer), pair) in self.layers.iter().zip(new_params.chunks(2)) {
            for (current, new) in layer.params().into_iter().zip(pair) {
                if current.shape() != new.shape() {
                    return Err(Error::shape_mismatch(
                        "update_params",
                        current.shape(),
                        new.shape(),
                    ));
                }
            }
        }
        let mut param_iter = new_params.into_iter();
        for (_, layer) in self.layers.iter_mut() {
            let weights = param_iter.next();
            let bias = param_iter.next();
            if let (Some(weights), Some(bias)) = (weights, bias) {
                layer.update_params(vec![weights, bias])?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
fn layer(shape: [usize; 2], filler: f64, activation: crate::nn::Activation) -> Linear<f64> {
    Linear::new(
        Tensor::new_with_filler(shape.to_vec(), filler),
        Tensor::zeros(vec![shape[1]]),
        Some(activation),
    )
    .unwrap()
}

#[test]
fn test_sequential_forward_chains_layers() {
    use crate::nn::Activation;
    let model = Sequential::new()
        .add("fc1", layer([2, 4], 1.0, Activation::Identity))
        .unwrap()
        .add("fc2", layer([4, 3], 0.5, Activation::Identity))
        .unwrap();
    let input = Tensor::from([[1.0, 2.0]]);
    let res = model.forward(&input).unwrap();
    // fc1: [3, 3, 3, 3]; fc2: 4 * 3 * 0.5 = 6
    assert_eq!(res, Tensor::from([[6.0, 6.0, 6.0]]));
    assert_eq!(model.in_features(), Some(2));
    assert_eq!(model.out_features(), Some(3));
}

#[test]
fn test_sequential_rejects_broken_chain() {
    use crate::nn::Activation;
    let result = Sequential::from_layers([
        ("fc1", layer([2, 4], 1.0, Activation::Relu)),
        ("fc2", layer([5, 3], 1.0, Activation::Relu)),
    ]);
    assert!(matches!(result, Err(Error::ShapeMismatch { .. })));
}

#[test]
fn test_sequential_rejects_duplicate_names() {
    use crate::nn::Activation;
    let result = Sequential::from_layers([
        ("fc", layer([2, 2], 1.0, Activation::Relu)),
        ("fc", layer([2, 2], 1.0, Activation::Relu)),
    ]);
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_sequential_named_access() {
    use crate::nn::Activation;
    let mut model = Sequential::from_layers([
        ("hidden", layer([3, 2], 1.0, Activation::Sigmoid)),
        ("output", layer([2, 2], 1.0, Activation::Softmax)),
    ])
    .unwrap();
    assert_eq!(model.len(), 2);
    assert_eq!(
        model.get("output").map(|l| l.activation()),
        Some(Activation::Softmax)
    );
    assert!(model.get("missing").is_none());
    assert!(model.get_mut("hidden").is_some());
    let names: Vec<_> = model.layers().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["hidden", "output"]);
}

#[test]
fn test_sequential_update_params_is_all_or_nothing() {
    use crate::nn::Activation;
    let mut model = Sequential::from_layers([
        ("fc1", layer([2, 2], 1.0, Activation::Relu)),
        ("fc2", layer([2, 1], 1.0, Activation::Identity)),
    ])
    .unwrap();
    let before = model.clone();
    let bad = vec![
        Tensor::zeros(vec![2, 2]),
        Tensor::zeros(vec![2]),
        Tensor::zeros(vec![2, 2]),
        Tensor::zeros(vec![1]),
    ];
    assert!(model.update_params(bad).is_err());
    assert_eq!(model, before);

    let good: Vec<_> = model.params().into_iter().map(|p| p.map(|x| x * 2.0)).collect();
    model.update_params(good).unwrap();
    assert_eq!(model.get("fc2").unwrap().weights()[[0, 0]], 2.0);
}

#[test]
fn test_sequential_empty_batch() {
    use crate::nn::Activation;
    let model = Sequential::from_layers([("fc", layer([2, 2], 1.0, Activation::Relu))]).unwrap();
    let result = model.forward(&Tensor::zeros(vec![0, 2]));
    assert!(matches!(result, Err(Error::DimensionError { .. })));
}

#[test]
fn test_sequential_update_params_errors() {
    use crate::nn::Activation;
    let mut model = Sequential::from_layers([("fc", layer([2, 3], 1.0, Activation::Relu))]).unwrap();
    let wrong_count = model.update_params(vec![Tensor::zeros(vec![2, 3])]);
    assert!(matches!(wrong_count, Err(Error::DimensionError { .. })));

    let wrong_bias = model.update_params(vec![Tensor::zeros(vec![2, 3]), Tensor::zeros(vec![2])]);
    match wrong_bias {
        Err(Error::ShapeMismatch { left, right, .. }) => {
            assert_eq!(left, vec![3]);
            assert_eq!(right, vec![2]);
        }
        other => panic!("expected a bias shape mismatch, got {other:?}"),
    }
}
