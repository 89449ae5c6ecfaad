//! Minimal nbformat-4 document model.
//!
//! Only what output extraction needs is typed; everything else in the
//! document is ignored.

use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{NotebookError, Result};

/// A parsed notebook: its ordered cells.
#[derive(Debug, Clone, Deserialize)]
pub struct Notebook {
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Code,
    Markdown,
    Raw,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cell {
    pub cell_type: CellType,
    /// Raw output objects; only code cells carry them
    #[serde(default)]
    pub outputs: Vec<Map<String, Value>>,
}

impl Notebook {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| NotebookError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| NotebookError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json_str(text: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Code cells in document order.
    pub fn code_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| c.cell_type == CellType::Code)
    }
}
