//! Common types shared across the refcheck workspace.
//!
//! The central type is [`Dataset`], an in-memory rendition of a gridded
//! reference output: named dimensions, typed variables and attribute maps.
//! Every comparison in the workspace operates on this model, independent of
//! the file format it was read from.

pub mod dataset;
pub mod error;
pub mod values;

pub use dataset::{Dataset, Variable};
pub use error::{CommonError, CommonResult};
pub use values::{ArrayData, AttrValue};
