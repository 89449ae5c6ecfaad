//! Code-cell output extraction.
//!
//! Each output of a code cell is reduced to the textual and image content it
//! carries. Stream outputs contribute their `text`; `execute_result` and
//! `display_data` outputs contribute the allow-listed entries of their MIME
//! bundle. HTML renderings, widget state, javascript and error tracebacks are
//! dropped.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::notebook::Notebook;

/// Output keys kept for comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OutputKey {
    /// `text` of a stream output
    StreamText,
    TextPlain,
    TextMarkdown,
    TextLatex,
    ImagePng,
    ImageJpeg,
    ImageGif,
    ImageSvg,
}

impl OutputKey {
    /// Every kept key, in rendering order.
    pub const ALL: [OutputKey; 8] = [
        OutputKey::StreamText,
        OutputKey::TextPlain,
        OutputKey::TextMarkdown,
        OutputKey::TextLatex,
        OutputKey::ImagePng,
        OutputKey::ImageJpeg,
        OutputKey::ImageGif,
        OutputKey::ImageSvg,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputKey::StreamText => "text",
            OutputKey::TextPlain => "text/plain",
            OutputKey::TextMarkdown => "text/markdown",
            OutputKey::TextLatex => "text/latex",
            OutputKey::ImagePng => "image/png",
            OutputKey::ImageJpeg => "image/jpeg",
            OutputKey::ImageGif => "image/gif",
            OutputKey::ImageSvg => "image/svg+xml",
        }
    }

    /// Look up a MIME-bundle key. `text` alone is the stream key and is not
    /// accepted here.
    pub fn from_mime(mime: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .filter(|key| *key != OutputKey::StreamText)
            .find(|key| key.as_str() == mime)
    }
}

impl Serialize for OutputKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The kept content of one output.
pub type OutputRecord = BTreeMap<OutputKey, String>;

/// Outputs of one code cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellRecord {
    /// Position among the notebook's code cells, from 0
    pub cell: usize,
    pub outputs: Vec<OutputRecord>,
}

/// Reduce a MIME bundle to its allow-listed entries.
pub fn filter_mime_bundle(bundle: &Map<String, Value>) -> OutputRecord {
    bundle
        .iter()
        .filter_map(|(mime, content)| {
            OutputKey::from_mime(mime).map(|key| (key, content_text(content)))
        })
        .collect()
}

/// Reduce one raw output object.
pub fn filter_output(output: &Map<String, Value>) -> OutputRecord {
    let mut record = match output.get("data") {
        Some(Value::Object(bundle)) => filter_mime_bundle(bundle),
        _ => OutputRecord::new(),
    };
    if let Some(text) = output.get("text") {
        record.insert(OutputKey::StreamText, content_text(text));
    }
    record
}

/// Extract the outputs of every code cell, in order.
///
/// Outputs that keep nothing are omitted; a code cell without kept outputs
/// still appears, so cell positions stay aligned between two notebooks.
pub fn extract_outputs(notebook: &Notebook) -> Vec<CellRecord> {
    notebook
        .code_cells()
        .enumerate()
        .map(|(cell, c)| CellRecord {
            cell,
            outputs: c
                .outputs
                .iter()
                .map(filter_output)
                .filter(|record| !record.is_empty())
                .collect(),
        })
        .collect()
}

/// nbformat stores multi-line text either as one string or a list of lines.
fn content_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts
            .iter()
            .map(|part| match part {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        other => other.to_string(),
    }
}
