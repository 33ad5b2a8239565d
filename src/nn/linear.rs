use log::debug;

use crate::error::{Error, Result};
use crate::nn::{Activation, Module};
use crate::tensor::functional;
use crate::tensor::{Float, Numeric, Tensor};

/// An affine transform followed by an activation: `activation(x·weights + bias)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Linear<T>
where
    T: Numeric,
{
    weights: Tensor<T>,
    bias: Tensor<T>,
    activation: Activation,
}

impl<T> Linear<T>
where
    T: Numeric + Float,
{
    /// `weights` is `(in_features, out_features)`; `bias` is `(out_features,)` or `(1, out_features)`.
    pub fn new(weights: Tensor<T>, bias: Tensor<T>, activation: Option<Activation>) -> Result<Self> {
        check_shapes(&weights, &bias)?;
        debug!(
            "linear layer weights={:?} bias={:?} activation={:?}",
            weights.shape(),
            bias.shape(),
            activation
        );
        Ok(Linear {
            weights,
            bias,
            activation: activation.unwrap_or_default(),
        })
    }

    pub fn weights(&self) -> &Tensor<T> {
        &self.weights
    }

    pub fn bias(&self) -> &Tensor<T> {
        &self.bias
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn in_features(&self) -> usize {
        self.weights.shape()[0]
    }

    pub fn out_features(&self) -> usize {
        self.weights.shape()[1]
    }
}

fn check_shapes<T: Numeric>(weights: &Tensor<T>, bias: &Tensor<T>) -> Result<()> {
    let (_, out_features) = weights.require_matrix("linear")?;
    match bias.shape() {
        [width] | [1, width] if *width == out_features => Ok(()),
        _ => Err(Error::shape_mismatch(
            "linear",
            weights.shape(),
            bias.shape(),
        )),
    }
}

impl<T: Numeric> crate::nn::module::private::Private for Linear<T> {}

impl<T> Module<T> for Linear<T>
where
    T: Numeric + Float,
{
    fn forward(&self, batch: &Tensor<T>) -> Result<Tensor<T>> {
        let y = functional::linear(batch, &self.weights, &self.bias)?;
        Ok(self.activation.apply(&y))
    }

    fn params(&self) -> Vec<&Tensor<T>> {
        vec![&self.weights, &self.bias]
    }

    fn update_params(&mut self, new_params: Vec<Tensor<T>>) -> Result<()> {
        let [weights, bias]: [Tensor<T>; 2] = new_params.try_into().map_err(|p: Vec<_>| {
            Error::dimension(
                "update_params",
                &[p.len()],
                "a linear layer takes exactly two parameters",
            )
        })?;
        if weights.shape() != self.weights.shape() {
            return Err(Error::shape_mismatch(
                "update_params",
                self.weights.shape(),
                weights.shape(),
            ));
        }
        if bias.shape() != self.bias.shape() {
            return Err(Error::shape_mismatch(
                "update_params",
                self.bias.shape(),
                bias.shape(),
            ));
        }
        self.weights = weights;
        self.bias = bias;
        Ok(())
    }
}

#[test]
fn test_layer_no_activation() {
    let layer = Linear::new(
        Tensor::new_with_filler(vec![2, 2], 1.0),
        Tensor::new_with_filler(vec![1, 2], 1.0),
        None,
    )
    .unwrap();
    let input = Tensor::new(vec![1.0, 2.0], vec![1, 2]);
    let res = layer.forward(&input).unwrap();
    let expected = Tensor::new(vec![4.0, 4.0], vec![1, 2]);

    assert_eq!(res, expected);
}

#[test]
fn test_layer_vector_bias() {
    let layer = Linear::new(
        Tensor::from([[1.0, -2.0], [-1.1, 0.7]]),
        Tensor::new_with_filler(vec![2], 1.0),
        Some(Activation::Relu),
    )
    .unwrap();
    let input = Tensor::from([[1.0, 2.0], [0.0, 0.0]]);
    let res = layer.forward(&input).unwrap();
    assert_eq!(res.shape(), &[2, 2]);
    // [1 - 2.2 + 1, -2 + 1.4 + 1] = [-0.2, 0.4] -> relu
    assert_eq!(res[[0, 0]], 0.0);
    assert!((res[[0, 1]] - 0.4).abs() < 1e-12);
    assert_eq!(res.row(1), Some(&[1.0, 1.0][..]));
}

#[test]
fn test_layer_rejects_bad_bias() {
    let result = Linear::new(
        Tensor::<f32>::zeros(vec![3, 2]),
        Tensor::zeros(vec![3]),
        None,
    );
    assert!(matches!(result, Err(Error::ShapeMismatch { .. })));
}

#[test]
fn test_layer_rejects_vector_weights() {
    let result = Linear::new(Tensor::<f32>::zeros(vec![3]), Tensor::zeros(vec![3]), None);
    assert!(matches!(result, Err(Error::DimensionError { .. })));
}

#[test]
fn test_update_params() {
    let mut layer = Linear::new(
        Tensor::<f64>::zeros(vec![2, 3]),
        Tensor::zeros(vec![3]),
        None,
    )
    .unwrap();
    assert_eq!(layer.num_params(), 9);

    let weights = Tensor::new_with_filler(vec![2, 3], 0.5);
    let bias = Tensor::new_with_filler(vec![3], -1.0);
    layer
        .update_params(vec![weights.clone(), bias.clone()])
        .unwrap();
    assert_eq!(layer.params(), vec![&weights, &bias]);

    let wrong = layer.update_params(vec![Tensor::zeros(vec![3, 2]), bias]);
    assert!(matches!(wrong, Err(Error::ShapeMismatch { .. })));
    assert!(layer.update_params(vec![weights]).is_err());
}
