//! Write an in-memory dataset to a NetCDF-4 file.
//!
//! Used to materialize reference trees for tests and to snapshot datasets
//! produced in process. Every numeric element type and variable-length
//! strings are supported; classic `char` arrays are not.

use std::path::Path;

use netcdf::AttributeValue;
use refcheck_common::{ArrayData, AttrValue, Dataset, Variable};
use tracing::debug;

use crate::error::{NetCdfError, NetCdfResult};
use crate::native::{silence_hdf5_errors, unravel_index};

macro_rules! write_numeric {
    ($file:expr, $name:expr, $dims:expr, $ty:ty, $values:expr, $source:expr) => {{
        let mut nc_var = $file
            .add_variable::<$ty>($name, $dims)
            .map_err(|e| write_err($name, e))?;
        if !$values.is_empty() {
            nc_var
                .put_values($values.as_slice(), ..)
                .map_err(|e| write_err($name, e))?;
        }
        put_variable_attributes(&mut nc_var, $name, $source)?;
    }};
}

/// Create (or truncate) `path` and write `dataset` into it.
pub fn write_dataset<P: AsRef<Path>>(path: P, dataset: &Dataset) -> NetCdfResult<()> {
    let path = path.as_ref();
    silence_hdf5_errors();

    let mut file = netcdf::create(path).map_err(|e| NetCdfError::OpenFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    for (name, len) in dataset.dimensions() {
        file.add_dimension(name, *len)
            .map_err(|e| write_err(name, e))?;
    }

    for (name, value) in dataset.attributes() {
        file.add_attribute(name, to_netcdf_value(value))
            .map_err(|e| write_err(name, e))?;
    }

    for (name, var) in dataset.variables() {
        let dims: Vec<&str> = var.dimensions().iter().map(String::as_str).collect();
        let name = name.as_str();

        match var.data() {
            ArrayData::I8(values) => write_numeric!(file, name, &dims, i8, values, var),
            ArrayData::U8(values) => write_numeric!(file, name, &dims, u8, values, var),
            ArrayData::I16(values) => write_numeric!(file, name, &dims, i16, values, var),
            ArrayData::U16(values) => write_numeric!(file, name, &dims, u16, values, var),
            ArrayData::I32(values) => write_numeric!(file, name, &dims, i32, values, var),
            ArrayData::U32(values) => write_numeric!(file, name, &dims, u32, values, var),
            ArrayData::I64(values) => write_numeric!(file, name, &dims, i64, values, var),
            ArrayData::U64(values) => write_numeric!(file, name, &dims, u64, values, var),
            ArrayData::F32(values) => write_numeric!(file, name, &dims, f32, values, var),
            ArrayData::F64(values) => write_numeric!(file, name, &dims, f64, values, var),
            ArrayData::Str(values) => {
                let mut nc_var = file
                    .add_string_variable(name, &dims)
                    .map_err(|e| write_err(name, e))?;
                for (flat, value) in values.iter().enumerate() {
                    let index = unravel_index(flat, var.shape());
                    nc_var
                        .put_string(value, index.as_slice())
                        .map_err(|e| write_err(name, e))?;
                }
                put_variable_attributes(&mut nc_var, name, var)?;
            }
            ArrayData::Char(_) => {
                return Err(NetCdfError::UnsupportedType {
                    name: name.to_string(),
                    kind: "char (write)".to_string(),
                })
            }
        }
    }

    debug!(
        path = %path.display(),
        variables = dataset.variables().len(),
        "Wrote NetCDF dataset"
    );

    Ok(())
}

fn put_variable_attributes(
    nc_var: &mut netcdf::VariableMut,
    name: &str,
    source: &Variable,
) -> NetCdfResult<()> {
    for (attr_name, value) in source.attributes() {
        nc_var
            .put_attribute(attr_name, to_netcdf_value(value))
            .map_err(|e| write_err(&format!("{}:{}", name, attr_name), e))?;
    }
    Ok(())
}

fn to_netcdf_value(value: &AttrValue) -> AttributeValue {
    match value {
        AttrValue::Str(v) => AttributeValue::Str(v.clone()),
        AttrValue::Strs(v) => AttributeValue::Strs(v.clone()),
        AttrValue::Int(v) => AttributeValue::Longlong(*v),
        AttrValue::Ints(v) => AttributeValue::Longlongs(v.clone()),
        AttrValue::UInt(v) => AttributeValue::Ulonglong(*v),
        AttrValue::UInts(v) => AttributeValue::Ulonglongs(v.clone()),
        AttrValue::Float(v) => AttributeValue::Double(*v),
        AttrValue::Floats(v) => AttributeValue::Doubles(v.clone()),
    }
}

fn write_err(name: &str, e: netcdf::Error) -> NetCdfError {
    NetCdfError::WriteFailed {
        name: name.to_string(),
        message: e.to_string(),
    }
}
