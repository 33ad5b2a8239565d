mod activation;
mod classifier;
pub mod init;
mod linear;
mod module;
mod sequential;

pub use activation::Activation;
pub use classifier::Classifier;
pub use linear::Linear;
pub use module::Module;
pub use sequential::Sequential;
