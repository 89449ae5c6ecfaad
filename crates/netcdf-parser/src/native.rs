//! Native NetCDF reading using the netcdf library.
//!
//! A file is read completely into a [`Dataset`] and then closed. The
//! `netcdf::File` never leaves [`open_dataset`], so its handle is released by
//! `Drop` whether reading succeeds or fails part way through.

use std::path::Path;
use std::sync::Once;

use netcdf::types::{FloatType, IntType, NcVariableType};
use netcdf::AttributeValue;
use refcheck_common::{ArrayData, AttrValue, Dataset};
use tracing::debug;

use crate::error::{NetCdfError, NetCdfResult};

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when checking for optional
/// attributes that don't exist). This creates confusing log spam like:
///
/// ```text
/// HDF5-DIAG: Error detected in HDF5 (1.10.8) thread 3:
///   #003: ../../../src/H5Adense.c line 397 in H5A__dense_open(): can't locate attribute in name index
/// ```
///
/// This function disables that output by calling H5Eset_auto2 with null handlers.
/// It only needs to be called once per process, but is safe to call multiple times.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Load a NetCDF file into memory.
///
/// # Errors
///
/// - [`NetCdfError::IoError`] if the path does not exist or is unreadable
/// - [`NetCdfError::OpenFailed`] if the file exists but is not a NetCDF container
/// - [`NetCdfError::ReadFailed`] / [`NetCdfError::UnsupportedType`] for
///   variables that cannot be loaded
pub fn open_dataset<P: AsRef<Path>>(path: P) -> NetCdfResult<Dataset> {
    let path = path.as_ref();
    silence_hdf5_errors();

    // Surface a missing file as a plain I/O error rather than a libnetcdf one
    std::fs::metadata(path)?;

    let file = netcdf::open(path).map_err(|e| NetCdfError::OpenFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut dataset = Dataset::new();

    for dim in file.dimensions() {
        dataset.add_dimension(dim.name(), dim.len())?;
    }

    for attr in file.attributes() {
        let value = read_attribute(&attr)?;
        dataset.set_attribute(attr.name(), value);
    }

    for var in file.variables() {
        let name = var.name();
        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        let dim_refs: Vec<&str> = dims.iter().map(String::as_str).collect();
        let data = read_data(&var, &name)?;

        let target = dataset.add_variable(name.clone(), &dim_refs, data)?;
        for attr in var.attributes() {
            let value = read_attribute(&attr)?;
            target.set_attribute(attr.name(), value);
        }
    }

    debug!(
        path = %path.display(),
        dimensions = dataset.dimensions().len(),
        variables = dataset.variables().len(),
        "Loaded NetCDF dataset"
    );

    Ok(dataset)
}

// =============================================================================
// Internal helpers
// =============================================================================

fn read_attribute(attr: &netcdf::Attribute) -> NetCdfResult<AttrValue> {
    let value = attr.value().map_err(|e| NetCdfError::ReadFailed {
        name: attr.name().to_string(),
        message: e.to_string(),
    })?;

    Ok(match value {
        AttributeValue::Uchar(v) => AttrValue::Int(v as i64),
        AttributeValue::Uchars(v) => AttrValue::Ints(v.into_iter().map(i64::from).collect()),
        AttributeValue::Schar(v) => AttrValue::Int(v as i64),
        AttributeValue::Schars(v) => AttrValue::Ints(v.into_iter().map(i64::from).collect()),
        AttributeValue::Ushort(v) => AttrValue::Int(v as i64),
        AttributeValue::Ushorts(v) => AttrValue::Ints(v.into_iter().map(i64::from).collect()),
        AttributeValue::Short(v) => AttrValue::Int(v as i64),
        AttributeValue::Shorts(v) => AttrValue::Ints(v.into_iter().map(i64::from).collect()),
        AttributeValue::Uint(v) => AttrValue::Int(v as i64),
        AttributeValue::Uints(v) => AttrValue::Ints(v.into_iter().map(i64::from).collect()),
        AttributeValue::Int(v) => AttrValue::Int(v as i64),
        AttributeValue::Ints(v) => AttrValue::Ints(v.into_iter().map(i64::from).collect()),
        AttributeValue::Ulonglong(v) => AttrValue::UInt(v),
        AttributeValue::Ulonglongs(v) => AttrValue::UInts(v),
        AttributeValue::Longlong(v) => AttrValue::Int(v),
        AttributeValue::Longlongs(v) => AttrValue::Ints(v),
        // f32 -> f64 is lossless, so bit-level differences survive the widening
        AttributeValue::Float(v) => AttrValue::Float(v as f64),
        AttributeValue::Floats(v) => AttrValue::Floats(v.into_iter().map(f64::from).collect()),
        AttributeValue::Double(v) => AttrValue::Float(v),
        AttributeValue::Doubles(v) => AttrValue::Floats(v),
        AttributeValue::Str(v) => AttrValue::Str(v),
        AttributeValue::Strs(v) => AttrValue::Strs(v),
    })
}

fn read_data(var: &netcdf::Variable, name: &str) -> NetCdfResult<ArrayData> {
    let read_err = |e: netcdf::Error| NetCdfError::ReadFailed {
        name: name.to_string(),
        message: e.to_string(),
    };

    let data = match var.vartype() {
        NcVariableType::Int(IntType::I8) => ArrayData::I8(var.get_values(..).map_err(read_err)?),
        NcVariableType::Int(IntType::U8) => ArrayData::U8(var.get_values(..).map_err(read_err)?),
        NcVariableType::Int(IntType::I16) => ArrayData::I16(var.get_values(..).map_err(read_err)?),
        NcVariableType::Int(IntType::U16) => ArrayData::U16(var.get_values(..).map_err(read_err)?),
        NcVariableType::Int(IntType::I32) => ArrayData::I32(var.get_values(..).map_err(read_err)?),
        NcVariableType::Int(IntType::U32) => ArrayData::U32(var.get_values(..).map_err(read_err)?),
        NcVariableType::Int(IntType::I64) => ArrayData::I64(var.get_values(..).map_err(read_err)?),
        NcVariableType::Int(IntType::U64) => ArrayData::U64(var.get_values(..).map_err(read_err)?),
        NcVariableType::Float(FloatType::F32) => {
            ArrayData::F32(var.get_values(..).map_err(read_err)?)
        }
        NcVariableType::Float(FloatType::F64) => {
            ArrayData::F64(var.get_values(..).map_err(read_err)?)
        }
        NcVariableType::Char => ArrayData::Char(var.get_raw_values(..).map_err(read_err)?),
        NcVariableType::String => ArrayData::Str(read_strings(var).map_err(read_err)?),
        other => {
            return Err(NetCdfError::UnsupportedType {
                name: name.to_string(),
                kind: format!("{:?}", other),
            })
        }
    };

    Ok(data)
}

/// Read a string variable element by element in row-major order.
fn read_strings(var: &netcdf::Variable) -> Result<Vec<String>, netcdf::Error> {
    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    let total: usize = shape.iter().product();

    let mut values = Vec::with_capacity(total);
    for flat in 0..total {
        let index = unravel_index(flat, &shape);
        values.push(var.get_string(index.as_slice())?);
    }
    Ok(values)
}

/// Convert a flat row-major offset into a multi-dimensional index.
pub(crate) fn unravel_index(mut flat: usize, shape: &[usize]) -> Vec<usize> {
    let mut index = vec![0; shape.len()];
    for (axis, &len) in shape.iter().enumerate().rev() {
        if len == 0 {
            continue;
        }
        index[axis] = flat % len;
        flat /= len;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unravel_index_row_major() {
        let shape = [2, 3];
        assert_eq!(unravel_index(0, &shape), vec![0, 0]);
        assert_eq!(unravel_index(2, &shape), vec![0, 2]);
        assert_eq!(unravel_index(3, &shape), vec![1, 0]);
        assert_eq!(unravel_index(5, &shape), vec![1, 2]);
    }

    #[test]
    fn test_unravel_index_scalar() {
        assert!(unravel_index(0, &[]).is_empty());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_dataset(dir.path().join("absent.nc")).unwrap_err();
        assert!(matches!(err, NetCdfError::IoError(_)));
    }

    #[test]
    fn test_non_netcdf_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.nc");
        std::fs::write(&path, b"this is not a netcdf file").unwrap();

        let err = open_dataset(&path).unwrap_err();
        assert!(matches!(err, NetCdfError::OpenFailed { .. }), "got {:?}", err);
    }
}
