use crate::tensor::numeric::*;
use crate::tensor::Tensor;

pub fn identity<T: Numeric>(tensor: &Tensor<T>) -> Tensor<T> {
    tensor.clone()
}

/// `1 / (1 + e^-x)`; saturates to 0 or 1 instead of producing NaN for large `|x|`.
pub fn sigmoid<T: Numeric + Float>(tensor: &Tensor<T>) -> Tensor<T> {
    tensor.map(|x| T::one() / (T::one() + (-x).exp()))
}

pub fn relu<T: Numeric>(tensor: &Tensor<T>) -> Tensor<T> {
    tensor.map(|x| if x > T::zero() { x } else { T::zero() })
}

pub fn tanh<T: Numeric + Float>(tensor: &Tensor<T>) -> Tensor<T> {
    tensor.map(|x| x.tanh())
}

/// Row-wise softmax. A 1-D tensor is treated as a single row.
///
/// The row maximum is subtracted before exponentiating, so logits in the thousands
/// still give finite probabilities. The result is unchanged by adding a constant
/// to every entry of a row.
///
/// Entries are strictly between 0 and 1 only while the logits of a row stay close
/// together. In `f32` the largest entry rounds to exactly 1 once every other logit
/// trails the row maximum by about 17, and an entry underflows to exactly 0 once
/// it trails by about 104.
///
/// ```
/// # use digit_mlp::tensor::{functional, Tensor};
/// let logits = Tensor::from([[1000.0, 1000.0], [0.0, 0.0]]);
/// let probs = functional::softmax(&logits);
/// assert_eq!(probs, Tensor::from([[0.5, 0.5], [0.5, 0.5]]));
/// ```
pub fn softmax<T: Numeric + Float>(tensor: &Tensor<T>) -> Tensor<T> {
    tensor.map_rows(|row, out| {
        let max = row.iter().fold(T::neg_infinity(), |acc, &x| acc.max(x));
        let mut total = T::zero();
        for (o, &x) in out.iter_mut().zip(row) {
            *o = (x - max).exp();
            total += *o;
        }
        for o in out.iter_mut() {
            *o = *o / total;
        }
    })
}

#[test]
fn test_sigmoid_at_zero() {
    let result = sigmoid(&Tensor::<f64>::zeros(vec![2, 3]));
    assert_eq!(result, Tensor::new_with_filler(vec![2, 3], 0.5));
}

#[test]
fn test_sigmoid_saturates() {
    let result = sigmoid(&Tensor::from([-1000.0f32, 1000.0]));
    assert_eq!(result.as_slice(), &[0.0, 1.0]);
}

#[test]
fn test_relu() {
    let result = relu(&Tensor::from([[-1.0, 0.0, 2.5]]));
    assert_eq!(result, Tensor::from([[0.0, 0.0, 2.5]]));
}

#[test]
fn test_tanh_is_odd() {
    let input = Tensor::from([0.3, -0.3]);
    let result = tanh(&input);
    assert!((result.as_slice()[0] + result.as_slice()[1]).abs() < 1e-12);
}

#[test]
fn test_softmax_rows_sum_to_one() {
    let logits = Tensor::from([[1.0, 2.0, 3.0], [-5.0, 0.0, 5.0]]);
    let probs = softmax(&logits);
    for row in probs.rows() {
        let total: f64 = row.iter().sum();
        assert!((total - 1.0).abs() < 1e-12, "row={row:?}");
    }
}

#[test]
fn test_softmax_shift_invariance() {
    let logits = Tensor::from([[0.5, -1.5, 2.0, 0.0]]);
    let shifted = &logits + &Tensor::scalar(123.0);
    let left = softmax(&logits);
    let right = softmax(&shifted);
    for (a, b) in left.as_slice().iter().zip(right.as_slice()) {
        assert!((a - b).abs() < 1e-12);
    }
}

#[test]
fn test_softmax_large_logits_are_finite() {
    let logits = Tensor::from([[1000.0f32, -1000.0, 999.0]]);
    let probs = softmax(&logits);
    assert!(probs.as_slice().iter().all(|p| p.is_finite()));
    assert!((probs.sum() - 1.0).abs() < 1e-6);
}

#[test]
fn test_softmax_vector() {
    let probs = softmax(&Tensor::from([0.0, 0.0, 0.0, 0.0]));
    assert_eq!(probs.shape(), &[4]);
    assert_eq!(probs.as_slice(), &[0.25; 4]);
}

#[test]
fn test_softmax_saturates_far_apart_logits() {
    let probs = softmax(&Tensor::from([[0.0f32, 200.0], [0.0, 10.0]]));
    assert_eq!(probs.row(0), Some(&[0.0, 1.0][..]));
    let row = probs.row(1).unwrap();
    assert!(row.iter().all(|&p| p > 0.0 && p < 1.0));
}
