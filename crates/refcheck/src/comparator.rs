//! The comparison run loop.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::CompareConfig;
use crate::discovery::ReferenceSet;
use crate::equality::{datasets_equal, load_dataset};
use crate::error::Result;
use crate::pairing::pair_references;
use crate::report::{discrepancies, Discrepancy, Side};
use crate::sink::ReportSink;

/// Outcome of comparing one pair of datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Same,
    Different,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Same => write!(f, "Same"),
            Verdict::Different => write!(f, "Different"),
        }
    }
}

/// Verdict and findings for one source/target pair.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResult {
    pub source: PathBuf,
    pub target: PathBuf,
    pub verdict: Verdict,
    /// Empty when the verdict is `Same`
    pub discrepancies: Vec<Discrepancy>,
}

impl ComparisonResult {
    pub fn is_same(&self) -> bool {
        self.verdict == Verdict::Same
    }

    /// The per-comparison verdict line.
    pub fn verdict_line(&self) -> String {
        format!(
            "Comparison result for {} and {}: {}",
            self.source.display(),
            self.target.display(),
            self.verdict
        )
    }
}

/// Totals and results of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub source_root: PathBuf,
    pub target_root: PathBuf,
    pub compared: usize,
    pub same: usize,
    pub different: usize,
    /// References skipped because the target tree lacks them
    pub source_only: Vec<PathBuf>,
    /// References skipped because the source tree lacks them
    pub target_only: Vec<PathBuf>,
    /// Unpaired-reference findings; filled only with strict pairing
    pub unpaired: Vec<Discrepancy>,
    pub results: Vec<ComparisonResult>,
}

impl RunSummary {
    /// Whether anything was found that a regression check should fail on.
    pub fn has_differences(&self) -> bool {
        self.different > 0 || !self.unpaired.is_empty()
    }
}

/// Compares reference trees and single dataset pairs.
#[derive(Debug, Clone, Default)]
pub struct Comparator {
    config: CompareConfig,
}

impl Comparator {
    pub fn new(config: CompareConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    /// Compare two dataset files.
    ///
    /// Writes the verdict line to `sink`, followed on `Different` by one line
    /// per discrepancy. Both files are fully loaded and closed before the
    /// comparison starts.
    pub fn compare_pair(
        &self,
        source: &Path,
        target: &Path,
        sink: &mut dyn ReportSink,
    ) -> Result<ComparisonResult> {
        let source_ds = load_dataset(source)?;
        let target_ds = load_dataset(target)?;

        let (verdict, found) = if datasets_equal(&source_ds, &target_ds) {
            (Verdict::Same, Vec::new())
        } else {
            (Verdict::Different, discrepancies(&source_ds, &target_ds))
        };

        let result = ComparisonResult {
            source: source.to_path_buf(),
            target: target.to_path_buf(),
            verdict,
            discrepancies: found,
        };

        sink.write_line(&result.verdict_line())?;
        for finding in &result.discrepancies {
            sink.write_line(&finding.to_string())?;
        }

        match result.verdict {
            Verdict::Same => debug!(source = %source.display(), "Datasets identical"),
            Verdict::Different => warn!(
                source = %source.display(),
                target = %target.display(),
                findings = result.discrepancies.len(),
                "Datasets differ"
            ),
        }

        Ok(result)
    }

    /// Discover both trees, pair them, and compare every pair in order.
    ///
    /// References present in only one tree are skipped unless strict pairing
    /// is enabled, in which case each becomes an
    /// [`Discrepancy::UnpairedReference`] line after the comparisons.
    pub fn run(
        &self,
        source_root: &Path,
        target_root: &Path,
        sink: &mut dyn ReportSink,
    ) -> Result<RunSummary> {
        let started_at = Utc::now();

        let source = ReferenceSet::discover(source_root, &self.config.discovery)?;
        let target = ReferenceSet::discover(target_root, &self.config.discovery)?;
        let pairing = pair_references(&source, &target);

        info!(
            source = source.len(),
            target = target.len(),
            pairs = pairing.pairs.len(),
            "Starting reference comparison"
        );

        let mut results = Vec::with_capacity(pairing.pairs.len());
        for pair in &pairing.pairs {
            results.push(self.compare_pair(&pair.source, &pair.target, sink)?);
        }

        for skipped in pairing.source_only.iter().chain(&pairing.target_only) {
            debug!(path = %skipped.display(), "Reference present in only one tree");
        }

        let mut unpaired = Vec::new();
        if self.config.strict_pairing {
            let sides = pairing
                .source_only
                .iter()
                .map(|p| (p, Side::Source))
                .chain(pairing.target_only.iter().map(|p| (p, Side::Target)));
            for (relative_path, present_in) in sides {
                let finding = Discrepancy::UnpairedReference {
                    relative_path: relative_path.clone(),
                    present_in,
                };
                sink.write_line(&finding.to_string())?;
                unpaired.push(finding);
            }
        }

        let same = results.iter().filter(|r| r.is_same()).count();
        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            source_root: source_root.to_path_buf(),
            target_root: target_root.to_path_buf(),
            compared: results.len(),
            same,
            different: results.len() - same,
            source_only: pairing.source_only,
            target_only: pairing.target_only,
            unpaired,
            results,
        };

        info!(
            compared = summary.compared,
            same = summary.same,
            different = summary.different,
            skipped = summary.source_only.len() + summary.target_only.len(),
            "Reference comparison finished"
        );

        Ok(summary)
    }
}
