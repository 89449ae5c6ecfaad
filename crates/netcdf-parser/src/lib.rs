//! NetCDF reader and writer for reference datasets.
//!
//! Reference outputs of the tracking example notebooks are NetCDF-4 files
//! written by xarray. This crate loads such a file completely into a
//! [`refcheck_common::Dataset`] so comparisons never hold a file handle:
//! the underlying `netcdf::File` is scoped to [`open_dataset`] and is closed
//! on every exit path, including read errors.
//!
//! # Implementation Notes
//!
//! Reading and writing use the native `netcdf` crate (libnetcdf/HDF5).
//! Call [`silence_hdf5_errors`] early in `main()` to keep HDF5 from printing
//! diagnostics for conditions that are handled here.

pub mod describe;
pub mod error;
pub mod native;
pub mod writer;

pub use describe::describe;
pub use error::{NetCdfError, NetCdfResult};
pub use native::{open_dataset, silence_hdf5_errors};
pub use writer::write_dataset;
