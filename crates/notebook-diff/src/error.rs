//! Error types for notebook loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading notebooks.
#[derive(Error, Debug)]
pub enum NotebookError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse notebook {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to render outputs: {0}")]
    Render(#[from] serde_json::Error),
}

/// Result type for notebook operations.
pub type Result<T> = std::result::Result<T, NotebookError>;
