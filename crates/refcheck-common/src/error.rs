//! Error types for dataset construction.

use thiserror::Error;

/// Result type alias using CommonError.
pub type CommonResult<T> = Result<T, CommonError>;

/// Errors raised while assembling a [`Dataset`](crate::Dataset).
#[derive(Debug, Error)]
pub enum CommonError {
    #[error("Unknown dimension '{dimension}' referenced by variable '{variable}'")]
    UnknownDimension { variable: String, dimension: String },

    #[error("Unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("Dimension '{name}' already defined with length {existing}, cannot redefine as {requested}")]
    DimensionConflict {
        name: String,
        existing: usize,
        requested: usize,
    },

    #[error("Variable '{variable}' holds {actual} values but its dimensions imply {expected}")]
    ShapeMismatch {
        variable: String,
        expected: usize,
        actual: usize,
    },
}
