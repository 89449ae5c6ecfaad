//! Reference-output regression checking.
//!
//! Two trees of notebook outputs (a *source* produced by the baseline
//! version and a *target* produced by the candidate) are discovered, paired
//! by relative path, and compared one pair at a time:
//!
//! 1. [`discovery`] finds `<Example*>/Save/*` files under each root
//! 2. [`pairing`] matches source and target by relative path
//! 3. [`equality`] decides Same/Different with exact, bit-level equality
//! 4. [`report`] localizes a difference to attributes, variable presence
//!    and variable data
//! 5. [`comparator`] drives the loop and writes every line to a
//!    [`sink::ReportSink`]
//!
//! No numeric tolerance is applied anywhere: the purpose is to prove a code
//! change produced zero numerical difference.

pub mod comparator;
pub mod config;
pub mod discovery;
pub mod equality;
pub mod error;
pub mod pairing;
pub mod report;
pub mod sink;

pub use comparator::{ComparisonResult, Comparator, RunSummary, Verdict};
pub use config::{CompareConfig, DiscoveryConfig};
pub use discovery::ReferenceSet;
pub use equality::{compare_files, datasets_equal, load_dataset};
pub use error::{CompareError, Result};
pub use pairing::{pair_references, Pairing, ReferencePair};
pub use report::{discrepancies, AttributeDifference, Discrepancy, Side};
pub use sink::{ConsoleSink, LogFileSink, MemorySink, ReportSink, TeeSink};
