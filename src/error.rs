use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Two operands disagree on a dimension that must match.
    #[error("shape mismatch in {op}: left={left:?}, right={right:?}")]
    ShapeMismatch {
        op: &'static str,
        left: Vec<usize>,
        right: Vec<usize>,
    },

    /// An operand has the wrong rank or an empty dimension.
    #[error("dimension error in {op}: {reason} (shape={shape:?})")]
    DimensionError {
        op: &'static str,
        shape: Vec<usize>,
        reason: String,
    },

    #[error("invalid config: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn shape_mismatch(op: &'static str, left: &[usize], right: &[usize]) -> Self {
        Error::ShapeMismatch {
            op,
            left: left.to_vec(),
            right: right.to_vec(),
        }
    }

    pub(crate) fn dimension(op: &'static str, shape: &[usize], reason: impl Into<String>) -> Self {
        Error::DimensionError {
            op,
            shape: shape.to_vec(),
            reason: reason.into(),
        }
    }
}
