//! Free functions over tensors: the functional way of writing a network.
mod element_wise_ops;
mod misc;

pub use element_wise_ops::*;
pub use misc::*;
