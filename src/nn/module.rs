use crate::error::Result;
use crate::tensor::{Numeric, Tensor};

pub(crate) mod private {
    pub trait Private {}
}

pub trait Module<T: Numeric>: private::Private {
    fn forward(&self, batch: &Tensor<T>) -> Result<Tensor<T>>;

    /// Parameters in evaluation order: `[w1, b1, w2, b2, ...]`.
    fn params(&self) -> Vec<&Tensor<T>>;

    /// Replace every parameter, in the same order `params` returns them.
    /// Shapes must match the current parameters exactly.
    fn update_params(&mut self, new_params: Vec<Tensor<T>>) -> Result<()>;

    fn num_params(&self) -> usize {
        self.params().iter().map(|p| p.len()).sum()
    }
}
