mod dense;
pub mod functional;
mod numeric;

pub use dense::*;
pub use numeric::*;
