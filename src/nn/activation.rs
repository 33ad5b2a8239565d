use serde::{Deserialize, Serialize};

use crate::tensor::functional;
use crate::tensor::{Float, Numeric, Tensor};

/// The nonlinearity a [`Linear`](crate::nn::Linear) layer applies after its affine transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Identity,
    Sigmoid,
    Relu,
    Tanh,
    /// Row-wise, max-stabilized.
    Softmax,
}

impl Activation {
    pub fn apply<T: Numeric + Float>(&self, tensor: &Tensor<T>) -> Tensor<T> {
        match self {
            Activation::Identity => functional::identity(tensor),
            Activation::Sigmoid => functional::sigmoid(tensor),
            Activation::Relu => functional::relu(tensor),
            Activation::Tanh => functional::tanh(tensor),
            Activation::Softmax => functional::softmax(tensor),
        }
    }

    /// Whether the activation works on each element independently.
    pub fn is_element_wise(&self) -> bool {
        !matches!(self, Activation::Softmax)
    }
}

#[test]
fn test_apply_matches_functional() {
    let input = Tensor::from([[-1.0, 0.5, 2.0]]);
    assert_eq!(Activation::Relu.apply(&input), functional::relu(&input));
    assert_eq!(Activation::Softmax.apply(&input), functional::softmax(&input));
    assert_eq!(Activation::Identity.apply(&input), input);
}

#[test]
fn test_serde_names() {
    let parsed: Activation = serde_json::from_str("\"relu\"").unwrap();
    assert_eq!(parsed, Activation::Relu);
    assert_eq!(
        serde_json::to_string(&Activation::Softmax).unwrap(),
        "\"softmax\""
    );
}
