//! Shared test utilities for the refcheck workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Dataset fixtures shaped like tracking notebook outputs
//! - Field generators with predictable values
//! - Reference-tree and notebook writers for integration tests
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures, ReferenceTree};
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;
