//! A feed-forward classifier for 28×28 handwritten digits.
//!
//! The same network can be written three ways, all of which share one forward routine:
//! free functions from [`tensor::functional`], [`nn::Linear`] layers driven through the
//! [`nn::Module`] trait, or a [`nn::Sequential`] container of named layers such as
//! the ready-made [`nn::Classifier`].
pub mod config;
pub mod data;
pub mod error;
pub mod nn;
pub mod tensor;

pub use error::{Error, Result};
