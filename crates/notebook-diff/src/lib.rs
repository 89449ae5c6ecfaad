//! Notebook output comparison.
//!
//! Executed example notebooks embed their results as cell outputs. This
//! crate reduces each notebook to the text and image content of its code
//! cells, renders that as pretty-printed JSON and produces a unified diff
//! between two renderings, so output drift between two library versions can
//! be reviewed by eye.

pub mod diff;
pub mod error;
pub mod notebook;
pub mod outputs;

use std::path::{Path, PathBuf};

use tracing::debug;

pub use diff::unified_diff;
pub use error::{NotebookError, Result};
pub use notebook::{Cell, CellType, Notebook};
pub use outputs::{extract_outputs, filter_mime_bundle, filter_output, CellRecord, OutputKey, OutputRecord};

/// Default number of context lines around each hunk.
pub const DEFAULT_CONTEXT: usize = 3;

/// Render extracted records as pretty JSON, one key per line.
pub fn render_outputs(records: &[CellRecord]) -> Result<String> {
    let mut text = serde_json::to_string_pretty(records)?;
    text.push('\n');
    Ok(text)
}

/// The diff between the outputs of two notebooks.
#[derive(Debug, Clone)]
pub struct NotebookDiff {
    pub source: PathBuf,
    pub target: PathBuf,
    /// Unified diff text; empty when the outputs match
    pub diff: String,
}

impl NotebookDiff {
    pub fn is_identical(&self) -> bool {
        self.diff.is_empty()
    }
}

/// Load two notebooks and diff their code-cell outputs.
pub fn diff_notebooks(source: &Path, target: &Path, context: usize) -> Result<NotebookDiff> {
    let source_text = render_outputs(&extract_outputs(&Notebook::from_path(source)?))?;
    let target_text = render_outputs(&extract_outputs(&Notebook::from_path(target)?))?;

    let diff = unified_diff(
        &source_text,
        &target_text,
        &source.display().to_string(),
        &target.display().to_string(),
        context,
    );
    debug!(
        source = %source.display(),
        target = %target.display(),
        identical = diff.is_empty(),
        "Notebook outputs compared"
    );

    Ok(NotebookDiff {
        source: source.to_path_buf(),
        target: target.to_path_buf(),
        diff,
    })
}

/// Notebooks from two directories paired by file name.
#[derive(Debug, Clone, Default)]
pub struct NotebookPairing {
    pub pairs: Vec<(PathBuf, PathBuf)>,
    pub source_only: Vec<String>,
    pub target_only: Vec<String>,
}

/// Pair the `.ipynb` files directly inside two directories by file name,
/// sorted.
pub fn pair_notebooks(source_dir: &Path, target_dir: &Path) -> Result<NotebookPairing> {
    let source = list_notebooks(source_dir)?;
    let target = list_notebooks(target_dir)?;

    let mut pairing = NotebookPairing::default();
    for name in &source {
        if target.contains(name) {
            pairing
                .pairs
                .push((source_dir.join(name), target_dir.join(name)));
        } else {
            pairing.source_only.push(name.clone());
        }
    }
    pairing.target_only = target
        .into_iter()
        .filter(|name| !source.contains(name))
        .collect();

    Ok(pairing)
}

fn list_notebooks(dir: &Path) -> Result<Vec<String>> {
    let io_err = |source| NotebookError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "ipynb") {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}
