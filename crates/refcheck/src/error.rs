//! Error types for the comparison pipeline.

use std::path::PathBuf;

use netcdf_parser::NetCdfError;
use thiserror::Error;

/// Errors that can occur while discovering or comparing reference outputs.
///
/// A dataset that differs is not an error; it is a
/// [`Verdict::Different`](crate::Verdict) result.
#[derive(Error, Debug)]
pub enum CompareError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to load dataset {path}: {source}")]
    Dataset {
        path: PathBuf,
        #[source]
        source: NetCdfError,
    },

    #[error("Failed to walk reference tree {root}: {message}")]
    Discovery { root: PathBuf, message: String },

    #[error("Failed to write report to {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for comparison operations.
pub type Result<T> = std::result::Result<T, CompareError>;
