//! Test data generators.
//!
//! Field generators give predictable values; [`ReferenceTree`] and
//! [`NotebookBuilder`] lay out files the way the reference generator and
//! Jupyter do.

use std::path::{Path, PathBuf};

use netcdf_parser::write_dataset;
use refcheck_common::Dataset;
use serde_json::{json, Value};

/// Creates a brightness-temperature-like field in Kelvin.
///
/// Row-major over `(time, y, x)`. Values fall from ~290 K at the grid edge
/// towards a cold core in the middle that deepens with each time step, so
/// thresholding at 250 K gives a growing cloud.
pub fn brightness_temperature_field(nt: usize, ny: usize, nx: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(nt * ny * nx);
    let cy = (ny.max(1) - 1) as f32 / 2.0;
    let cx = (nx.max(1) - 1) as f32 / 2.0;
    for t in 0..nt {
        for j in 0..ny {
            for i in 0..nx {
                let dist = ((j as f32 - cy).powi(2) + (i as f32 - cx).powi(2)).sqrt();
                let core = 70.0 + 10.0 * t as f32;
                data.push(290.0 - (core - 20.0 * dist).max(0.0));
            }
        }
    }
    data
}

/// A reference output tree rooted at a directory.
///
/// Files land in `<root>/<notebook>/Save/<file>`.
#[derive(Debug, Clone)]
pub struct ReferenceTree {
    root: PathBuf,
}

impl ReferenceTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn save_path(&self, notebook: &str, file: &str) -> PathBuf {
        let dir = self.root.join(notebook).join("Save");
        std::fs::create_dir_all(&dir).expect("create save directory");
        dir.join(file)
    }

    /// Write `dataset` as a NetCDF reference file and return its path.
    pub fn add(&self, notebook: &str, file: &str, dataset: &Dataset) -> PathBuf {
        let path = self.save_path(notebook, file);
        write_dataset(&path, dataset).expect("write reference dataset");
        path
    }

    /// Write arbitrary bytes as a reference file (e.g. a corrupt one).
    pub fn add_raw(&self, notebook: &str, file: &str, bytes: &[u8]) -> PathBuf {
        let path = self.save_path(notebook, file);
        std::fs::write(&path, bytes).expect("write raw reference file");
        path
    }
}

/// Builds minimal nbformat-4 notebooks.
#[derive(Debug, Clone, Default)]
pub struct NotebookBuilder {
    cells: Vec<Value>,
}

impl NotebookBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn markdown(mut self, source: &str) -> Self {
        self.cells.push(json!({
            "cell_type": "markdown",
            "metadata": {},
            "source": [source],
        }));
        self
    }

    /// A code cell with the given outputs.
    pub fn code(mut self, source: &str, outputs: Vec<Value>) -> Self {
        self.cells.push(json!({
            "cell_type": "code",
            "execution_count": 1,
            "metadata": {},
            "outputs": outputs,
            "source": [source],
        }));
        self
    }

    pub fn to_json(&self) -> Value {
        json!({
            "cells": self.cells,
            "metadata": {},
            "nbformat": 4,
            "nbformat_minor": 5,
        })
    }

    pub fn write(&self, path: &Path) -> PathBuf {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create notebook directory");
        }
        let text = serde_json::to_string_pretty(&self.to_json()).expect("serialize notebook");
        std::fs::write(path, text).expect("write notebook");
        path.to_path_buf()
    }
}

/// A `stream` output (stdout) with the given text.
pub fn stream_output(text: &str) -> Value {
    json!({ "name": "stdout", "output_type": "stream", "text": [text] })
}

/// An `execute_result` output with a MIME bundle.
pub fn execute_result(data: Value) -> Value {
    json!({
        "data": data,
        "execution_count": 1,
        "metadata": {},
        "output_type": "execute_result",
    })
}

/// A `display_data` output with a MIME bundle.
pub fn display_data(data: Value) -> Value {
    json!({ "data": data, "metadata": {}, "output_type": "display_data" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_has_cold_core() {
        let field = brightness_temperature_field(1, 5, 5);
        assert_eq!(field.len(), 25);
        let centre = field[12];
        let corner = field[0];
        assert!(centre < 250.0, "core should be below threshold, got {}", centre);
        assert!(corner > centre);
    }

    #[test]
    fn test_core_deepens_over_time() {
        let field = brightness_temperature_field(2, 3, 3);
        assert!(field[9 + 4] < field[4]);
    }

    #[test]
    fn test_reference_tree_layout() {
        let dir = tempfile::tempdir().unwrap();
        let tree = ReferenceTree::new(dir.path());
        let path = tree.add_raw("Example_A", "x.nc", b"data");
        assert_eq!(path, dir.path().join("Example_A/Save/x.nc"));
        assert!(path.exists());
    }

    #[test]
    fn test_notebook_builder_shape() {
        let nb = NotebookBuilder::new()
            .markdown("# Title")
            .code("print(1)", vec![stream_output("1\n")])
            .to_json();
        assert_eq!(nb["nbformat"], 4);
        assert_eq!(nb["cells"].as_array().unwrap().len(), 2);
        assert_eq!(nb["cells"][1]["outputs"][0]["output_type"], "stream");
    }
}
