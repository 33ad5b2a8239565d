use itertools::Itertools;
use rayon::prelude::*;

use std::cmp::PartialEq;
use std::convert::From;
use std::fmt;
use std::ops::{Add, Index};

use super::numeric::*;
use crate::error::{Error, Result};

/// The core `struct` in this library: an owned, row-major block of numbers with a shape.
///
/// Everything the classifier does happens on 2-D tensors of shape `(batch, features)`;
/// 1-D tensors show up as bias vectors and 0-D tensors as scalars.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T>
where
    T: Numeric,
{
    array: Vec<T>,
    shape: Vec<usize>,
}

impl<T> Tensor<T>
where
    T: Numeric,
{
    /// Panics when `array` does not hold exactly `shape.iter().product()` elements.
    pub fn new(array: Vec<T>, shape: Vec<usize>) -> Tensor<T> {
        let len: usize = shape.iter().product();
        assert_eq!(
            len,
            array.len(),
            "shape {:?} needs {} elements but got {}",
            shape,
            len,
            array.len()
        );
        Tensor { array, shape }
    }

    pub fn try_new(array: Vec<T>, shape: Vec<usize>) -> Result<Tensor<T>> {
        let len: usize = shape.iter().product();
        if len != array.len() {
            return Err(Error::dimension(
                "new",
                &shape,
                format!("shape needs {} elements but got {}", len, array.len()),
            ));
        }
        Ok(Tensor { array, shape })
    }

    /// Note! An empty `shape` constructs a scalar.
    pub fn new_with_filler(shape: Vec<usize>, filler: T) -> Tensor<T> {
        let total = shape.iter().product();
        Tensor {
            array: vec![filler; total],
            shape,
        }
    }

    pub fn zeros(shape: Vec<usize>) -> Tensor<T> {
        Self::new_with_filler(shape, T::zero())
    }

    pub fn scalar(scalar: T) -> Tensor<T> {
        Tensor {
            array: vec![scalar],
            shape: vec![],
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty()
    }

    pub fn is_scalar(&self) -> bool {
        self.array.len() == 1 && self.shape.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.array
    }

    pub fn into_vec(self) -> Vec<T> {
        self.array
    }

    fn global_index(&self, index: &[usize]) -> Result<usize> {
        if index.len() != self.shape.len() {
            return Err(Error::dimension(
                "get",
                &self.shape,
                format!("index {:?} has the wrong rank", index),
            ));
        }
        let mut global_idx = 0;
        let mut multiplier = 1;
        for (i, (&dim, &idx_dim)) in self.shape.iter().zip(index.iter()).enumerate().rev() {
            if dim <= idx_dim {
                return Err(Error::dimension(
                    "get",
                    &self.shape,
                    format!("index {:?} is out-of-bounds at position {}", index, i),
                ));
            }
            global_idx += idx_dim * multiplier;
            multiplier *= dim;
        }
        Ok(global_idx)
    }

    pub fn get(&self, index: &[usize]) -> Result<&T> {
        self.global_index(index).map(|idx| &self.array[idx])
    }

    pub fn row_len(&self) -> usize {
        self.shape.last().copied().unwrap_or(1)
    }

    pub fn num_rows(&self) -> usize {
        match self.row_len() {
            0 => 0,
            width => self.array.len() / width,
        }
    }

    pub fn rows(&self) -> std::slice::Chunks<'_, T> {
        self.array.chunks(self.row_len().max(1))
    }

    pub fn row(&self, i: usize) -> Option<&[T]> {
        self.rows().nth(i)
    }

    pub fn sum(&self) -> T {
        self.array.iter().fold(T::zero(), |acc, &x| acc + x)
    }

    pub fn map<F>(&self, f: F) -> Tensor<T>
    where
        F: Fn(T) -> T,
    {
        Tensor {
            array: self.array.iter().map(|&x| f(x)).collect(),
            shape: self.shape.clone(),
        }
    }

    pub fn map_rows<F>(&self, f: F) -> Tensor<T>
    where
        F: Fn(&[T], &mut [T]) + Send + Sync,
    {
        let width = self.row_len().max(1);
        let mut array = vec![T::zero(); self.array.len()];
        array
            .par_chunks_mut(width)
            .zip(self.array.par_chunks(width))
            .for_each(|(out, row)| f(row, out));
        Tensor {
            array,
            shape: self.shape.clone(),
        }
    }

    pub(crate) fn require_matrix(&self, op: &'static str) -> Result<(usize, usize)> {
        if self.shape.len() != 2 {
            return Err(Error::dimension(op, &self.shape, "expected a 2-D tensor"));
        }
        if self.shape.iter().any(|&dim| dim == 0) {
            return Err(Error::dimension(op, &self.shape, "dimension of size zero"));
        }
        Ok((self.shape[0], self.shape[1]))
    }

    /// Matrix multiply of an `(n, k)` tensor with a `(k, m)` tensor.
    ///
    /// Output rows are independent, so they are computed on the rayon pool.
    ///
    /// ```
    /// # use digit_mlp::tensor::*;
    /// let matrix = Tensor::new(vec![0, 1, 2, 3], vec![2, 2]);
    /// let diag = Tensor::new(vec![1, 1], vec![2, 1]);
    /// let r = matrix.matmul(&diag).unwrap();
    ///
    /// assert_eq!(r.shape(), &[2, 1]);
    /// assert_eq!(r, Tensor::new(vec![1, 5], vec![2, 1]));
    /// ```
    pub fn matmul(&self, right: &Tensor<T>) -> Result<Tensor<T>> {
        let (n, k) = self.require_matrix("matmul")?;
        let (k_right, m) = right.require_matrix("matmul")?;
        if k != k_right {
            return Err(Error::shape_mismatch("matmul", &self.shape, &right.shape));
        }

        let mut array = vec![T::zero(); n * m];
        array
            .par_chunks_mut(m)
            .zip(self.array.par_chunks(k))
            .for_each(|(out_row, left_row)| {
                for (&a, right_row) in left_row.iter().zip(right.array.chunks(m)) {
                    for (out, &b) in out_row.iter_mut().zip(right_row) {
                        *out += a * b;
                    }
                }
            });
        Ok(Tensor {
            array,
            shape: vec![n, m],
        })
    }

    /// Add a `(m,)` or `(1, m)` bias to every row of an `(n, m)` tensor.
    ///
    /// ```
    /// # use digit_mlp::tensor::*;
    /// let batch = Tensor::from([[1, 2], [3, 4]]);
    /// let bias = Tensor::from([10, 20]);
    /// assert_eq!(batch.add_row(&bias).unwrap(), Tensor::from([[11, 22], [13, 24]]));
    /// ```
    pub fn add_row(&self, bias: &Tensor<T>) -> Result<Tensor<T>> {
        let (_, m) = self.require_matrix("add_row")?;
        let bias_width = match bias.shape() {
            [width] => *width,
            [1, width] => *width,
            _ => return Err(Error::shape_mismatch("add_row", &self.shape, &bias.shape)),
        };
        if bias_width != m {
            return Err(Error::shape_mismatch("add_row", &self.shape, &bias.shape));
        }
        let array = self
            .array
            .chunks(m)
            .flat_map(|row| row.iter().zip_eq(bias.array.iter()).map(|(&x, &b)| x + b))
            .collect();
        Ok(Tensor {
            array,
            shape: self.shape.clone(),
        })
    }
}

impl<T> Index<[usize; 2]> for Tensor<T>
where
    T: Numeric,
{
    type Output = T;

    fn index(&self, [i, j]: [usize; 2]) -> &Self::Output {
        match self.get(&[i, j]) {
            Ok(elem) => elem,
            Err(e) => panic!("{}", e),
        }
    }
}

impl<T> Add<&Tensor<T>> for &Tensor<T>
where
    T: Numeric,
{
    type Output = Tensor<T>;

    /// Element-wise sum of two tensors of equal shape, or of a tensor and a scalar.
    fn add(self, right: &Tensor<T>) -> Self::Output {
        if right.is_scalar() {
            return self.map(|x| x + right.array[0]);
        }
        if self.is_scalar() {
            return right.map(|x| self.array[0] + x);
        }
        assert_eq!(
            self.shape, right.shape,
            "cannot add tensors of different shapes"
        );
        Tensor {
            array: self
                .array
                .iter()
                .zip_eq(right.array.iter())
                .map(|(&x, &y)| x + y)
                .collect(),
            shape: self.shape.clone(),
        }
    }
}

impl<T> fmt::Display for Tensor<T>
where
    T: Numeric,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tensor(shape={:?})", self.shape)?;
        for row in self.rows() {
            writeln!(f, "  [{}]", row.iter().join(", "))?;
        }
        Ok(())
    }
}

impl<T> From<T> for Tensor<T>
where
    T: Numeric,
{
    fn from(value: T) -> Self {
        Tensor::scalar(value)
    }
}

impl<T, U> From<Vec<U>> for Tensor<T>
where
    T: Numeric,
    Tensor<T>: From<U>,
{
    /// Stack equally shaped sub-tensors along a new leading dimension.
    fn from(value: Vec<U>) -> Tensor<T> {
        let tensors: Vec<Tensor<T>> = value.into_iter().map(Tensor::from).collect();
        let inner_shape = tensors
            .first()
            .map(|t| t.shape.clone())
            .unwrap_or_default();
        assert!(
            tensors.iter().all(|t| t.shape == inner_shape),
            "all rows must share a shape"
        );

        let mut shape = vec![tensors.len()];
        shape.extend_from_slice(&inner_shape);
        let array = tensors.into_iter().flat_map(|t| t.array).collect();
        Tensor { array, shape }
    }
}

impl<T, U, const N: usize> From<[U; N]> for Tensor<T>
where
    T: Numeric,
    Tensor<T>: From<U>,
{
    fn from(value: [U; N]) -> Tensor<T> {
        From::from(Vec::from(value))
    }
}

#[test]
fn test_new_with_filler() {
    let vec = Tensor::new_with_filler(vec![4], 4);
    assert_eq!(vec.shape(), &[4]);
    assert_eq!(vec.get(&[2]).unwrap(), &4);
}

#[test]
fn test_try_new_rejects_bad_count() {
    let result = Tensor::try_new(vec![1.0, 2.0, 3.0], vec![2, 2]);
    assert!(matches!(result, Err(Error::DimensionError { .. })));
}

#[test]
fn test_get_3x3x4() {
    let matrix = Tensor::new((0..(3 * 3 * 4)).collect(), vec![3, 3, 4]);
    assert_eq!(*matrix.get(&[0, 0, 0]).unwrap(), 0);
    assert_eq!(*matrix.get(&[2, 2, 3]).unwrap(), 3 * 3 * 4 - 1);
    assert!(matrix.get(&[3, 0, 0]).is_err());
    assert!(matrix.get(&[0, 0]).is_err());
}

#[test]
fn test_index_matrix() {
    let matrix = Tensor::from([[0, 1, 2], [3, 4, 5]]);
    assert_eq!(matrix[[0, 2]], 2);
    assert_eq!(matrix[[1, 0]], 3);
}

#[test]
fn test_rows() {
    let matrix = Tensor::from([[0, 1, 2], [3, 4, 5]]);
    assert_eq!(matrix.num_rows(), 2);
    assert_eq!(matrix.row(1), Some(&[3, 4, 5][..]));
    assert_eq!(matrix.rows().count(), 2);
}

#[test]
fn test_matmul_rectangular() {
    let left = Tensor::from([[1, 2, 3], [4, 5, 6]]);
    let right = Tensor::from([[1, 0], [0, 1], [1, 1]]);
    let result = left.matmul(&right).unwrap();
    assert_eq!(result, Tensor::from([[4, 5], [10, 11]]));
}

#[test]
fn test_matmul_shape_mismatch() {
    let left = Tensor::<f32>::zeros(vec![2, 3]);
    let right = Tensor::<f32>::zeros(vec![2, 2]);
    assert!(matches!(
        left.matmul(&right),
        Err(Error::ShapeMismatch { .. })
    ));
}

#[test]
fn test_matmul_requires_matrices() {
    let left = Tensor::<f32>::zeros(vec![3]);
    let right = Tensor::<f32>::zeros(vec![3, 2]);
    assert!(matches!(
        left.matmul(&right),
        Err(Error::DimensionError { .. })
    ));
    let empty = Tensor::<f32>::zeros(vec![0, 3]);
    assert!(matches!(
        empty.matmul(&Tensor::zeros(vec![3, 3])),
        Err(Error::DimensionError { .. })
    ));
}

#[test]
fn test_add_row_accepts_row_bias() {
    let batch = Tensor::from([[1.0, 2.0], [3.0, 4.0]]);
    let bias = Tensor::new(vec![0.5, -0.5], vec![1, 2]);
    assert_eq!(
        batch.add_row(&bias).unwrap(),
        Tensor::from([[1.5, 1.5], [3.5, 3.5]])
    );
}

#[test]
fn test_add_row_rejects_wrong_width() {
    let batch = Tensor::from([[1.0, 2.0], [3.0, 4.0]]);
    let bias = Tensor::from([1.0, 2.0, 3.0]);
    assert!(matches!(
        batch.add_row(&bias),
        Err(Error::ShapeMismatch { .. })
    ));
}

#[test]
fn test_add_scalar() {
    let tensor1 = Tensor::new((0..32).collect(), vec![2, 4, 4]);
    let tensor2 = Tensor::new((42..(32 + 42)).collect(), vec![2, 4, 4]);
    assert_eq!(&tensor1 + &Tensor::scalar(42), tensor2);
}

#[test]
fn test_map_rows() {
    let matrix = Tensor::from([[1, 2], [3, 4]]);
    let reversed = matrix.map_rows(|row, out| {
        out[0] = row[1];
        out[1] = row[0];
    });
    assert_eq!(reversed, Tensor::from([[2, 1], [4, 3]]));
}

#[test]
fn test_display() {
    let matrix = Tensor::from([[1, 2], [3, 4]]);
    let text = format!("{}", matrix);
    assert!(text.contains("shape=[2, 2]"));
    assert!(text.contains("[3, 4]"));
}
