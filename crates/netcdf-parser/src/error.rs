//! Error types for NetCDF reading and writing.

use std::path::PathBuf;

use refcheck_common::CommonError;
use thiserror::Error;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF parsing.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The file exists but is not a readable NetCDF container
    #[error("Failed to open NetCDF file {path}: {message}")]
    OpenFailed { path: PathBuf, message: String },

    /// A variable or attribute could not be read
    #[error("Failed to read '{name}': {message}")]
    ReadFailed { name: String, message: String },

    /// Writing a dataset failed
    #[error("Failed to write '{name}': {message}")]
    WriteFailed { name: String, message: String },

    /// Variable type the model cannot represent (compound, opaque, enum, vlen)
    #[error("Unsupported type for variable '{name}': {kind}")]
    UnsupportedType { name: String, kind: String },

    /// File content violates the dataset model
    #[error("Invalid data format: {0}")]
    InvalidFormat(#[from] CommonError),
}
