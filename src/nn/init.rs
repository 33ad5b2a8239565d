//! Parameter initialization for freshly built layers.
use rand::distributions::uniform::SampleUniform;
use rand::distributions::Uniform;
use rand::Rng;
use rand_distr::{Distribution, Normal, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::tensor::{Float, Numeric, Tensor};

/// How weight matrices are drawn. Biases always start at zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Initializer {
    /// `N(0, std²)` for every weight.
    Normal { std: f64 },
    /// `U(-1/sqrt(fan_in), 1/sqrt(fan_in))`, where `fan_in` is the weight matrix row count.
    FanInUniform,
}

impl Default for Initializer {
    fn default() -> Self {
        Initializer::Normal { std: 0.1 }
    }
}

impl Initializer {
    pub fn validate(&self) -> Result<()> {
        match *self {
            Initializer::Normal { std } if !(std.is_finite() && std > 0.0) => Err(Error::Config(
                format!("normal initializer needs a positive finite std, got {std}"),
            )),
            _ => Ok(()),
        }
    }

    /// Draw a `(fan_in, fan_out)` weight matrix.
    pub fn weights<T, R>(&self, fan_in: usize, fan_out: usize, rng: &mut R) -> Result<Tensor<T>>
    where
        T: Numeric + Float + SampleUniform,
        StandardNormal: Distribution<T>,
        R: Rng + ?Sized,
    {
        let shape = [fan_in, fan_out];
        match *self {
            Initializer::Normal { std } => normal(&shape, cast(std)?, rng),
            Initializer::FanInUniform => {
                if fan_in == 0 {
                    return Err(Error::dimension("init", &shape, "fan_in must be positive"));
                }
                let bound = T::one() / cast::<T>(fan_in as f64)?.sqrt();
                uniform(&shape, -bound, bound, rng)
            }
        }
    }
}

fn cast<T: Float>(value: f64) -> Result<T> {
    <T as num::NumCast>::from(value).ok_or_else(|| Error::Config(format!("{value} is not representable")))
}

pub fn zeros<T: Numeric>(shape: &[usize]) -> Tensor<T> {
    Tensor::zeros(shape.to_vec())
}

pub fn normal<T, R>(shape: &[usize], std: T, rng: &mut R) -> Result<Tensor<T>>
where
    T: Numeric + Float,
    StandardNormal: Distribution<T>,
    R: Rng + ?Sized,
{
    let normal = Normal::new(T::zero(), std)
        .map_err(|e| Error::Config(format!("bad normal distribution: {e}")))?;
    let len = shape.iter().product::<usize>();
    let array = (0..len).map(|_| normal.sample(rng)).collect();
    Ok(Tensor::new(array, shape.to_vec()))
}

pub fn uniform<T, R>(shape: &[usize], low: T, high: T, rng: &mut R) -> Result<Tensor<T>>
where
    T: Numeric + SampleUniform,
    R: Rng + ?Sized,
{
    if !(low < high) {
        return Err(Error::Config(format!(
            "uniform range is empty: [{low}, {high})"
        )));
    }
    let uniform = Uniform::new(low, high);
    let len = shape.iter().product::<usize>();
    let array = (0..len).map(|_| uniform.sample(rng)).collect();
    Ok(Tensor::new(array, shape.to_vec()))
}

#[cfg(test)]
fn seeded(seed: u64) -> rand::rngs::StdRng {
    rand::SeedableRng::seed_from_u64(seed)
}

#[test]
fn test_normal_is_seeded() {
    let mut rng1 = seeded(42);
    let mut rng2 = seeded(42);
    let a: Tensor<f32> = normal(&[4, 3], 0.1, &mut rng1).unwrap();
    let b: Tensor<f32> = normal(&[4, 3], 0.1, &mut rng2).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.shape(), &[4, 3]);
}

#[test]
fn test_fan_in_uniform_bounds() {
    let mut rng = seeded(7);
    let w: Tensor<f64> = Initializer::FanInUniform
        .weights(16, 8, &mut rng)
        .unwrap();
    assert_eq!(w.shape(), &[16, 8]);
    assert!(w.as_slice().iter().all(|x| x.abs() < 0.25));
}

#[test]
fn test_validate() {
    assert!(Initializer::default().validate().is_ok());
    assert!(Initializer::Normal { std: 0.0 }.validate().is_err());
    assert!(Initializer::Normal { std: f64::NAN }.validate().is_err());
}

#[test]
fn test_uniform_rejects_empty_range() {
    let mut rng = seeded(0);
    assert!(uniform(&[2], 1.0f32, 1.0, &mut rng).is_err());
}
