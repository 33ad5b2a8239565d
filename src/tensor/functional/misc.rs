use crate::error::{Error, Result};
use crate::tensor::numeric::*;
use crate::tensor::Tensor;

/// `x·w + b`, with `b` broadcast across the rows of the batch `x`.
///
/// Rejects empty batches and any width disagreement instead of padding or truncating.
pub fn linear<T: Numeric>(x: &Tensor<T>, w: &Tensor<T>, b: &Tensor<T>) -> Result<Tensor<T>> {
    check_batch(x, "linear")?;
    x.matmul(w)?.add_row(b)
}

/// A batch must be an `(n, features)` matrix with at least one row and one column.
pub fn check_batch<T: Numeric>(batch: &Tensor<T>, op: &'static str) -> Result<()> {
    match batch.shape() {
        [0, _] => Err(Error::dimension(op, batch.shape(), "batch has no samples")),
        [_, 0] => Err(Error::dimension(op, batch.shape(), "samples have no features")),
        [_, _] => Ok(()),
        _ => Err(Error::dimension(op, batch.shape(), "expected a 2-D batch")),
    }
}

/// Index of the largest entry of each row; ties go to the lowest index.
pub fn argmax<T: Numeric>(tensor: &Tensor<T>) -> Vec<usize> {
    tensor
        .rows()
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0, None), |(best_idx, best), (idx, &x)| match best {
                    Some(b) if x <= b => (best_idx, best),
                    _ => (idx, Some(x)),
                })
                .0
        })
        .collect()
}

#[test]
fn test_linear() {
    let x = Tensor::from([[1.0, 2.0]]);
    let w = Tensor::new_with_filler(vec![2, 2], 1.0);
    let b = Tensor::new_with_filler(vec![1, 2], 1.0);
    assert_eq!(linear(&x, &w, &b).unwrap(), Tensor::from([[4.0, 4.0]]));
}

#[test]
fn test_linear_empty_batch() {
    let x = Tensor::<f32>::zeros(vec![0, 2]);
    let w = Tensor::zeros(vec![2, 2]);
    let b = Tensor::zeros(vec![2]);
    assert!(matches!(
        linear(&x, &w, &b),
        Err(Error::DimensionError { .. })
    ));
}

#[test]
fn test_linear_width_mismatch() {
    let x = Tensor::<f32>::zeros(vec![4, 783]);
    let w = Tensor::zeros(vec![784, 10]);
    let b = Tensor::zeros(vec![10]);
    assert!(matches!(
        linear(&x, &w, &b),
        Err(Error::ShapeMismatch { .. })
    ));
}

#[test]
fn test_argmax() {
    let scores = Tensor::from([[0.1, 0.7, 0.2], [0.5, 0.5, 0.0], [-3.0, -2.0, -1.0]]);
    assert_eq!(argmax(&scores), vec![1, 0, 2]);
}
