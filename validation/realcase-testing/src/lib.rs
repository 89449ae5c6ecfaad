//! Real-case regression testing for tobac.
//!
//! This crate provides tools to:
//! - Provision a conda environment with a given tobac version
//! - Re-run an example notebook to regenerate its reference outputs
//! - Compare the outputs of two versions with `refcheck`
//! - Summarize a comparison run as a table or JSON

pub mod pipeline;
pub mod report;

pub use pipeline::{
    normalize_version, EnvironmentProvisioner, GitSnapshot, MambaProvisioner, PipelineError,
    ReferenceGenerator, RegressionRun, RunOptions, SaveDir, ScriptReferenceGenerator,
    SnapshotProvider,
};
pub use report::SummaryReport;
