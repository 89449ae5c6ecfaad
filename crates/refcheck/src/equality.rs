//! Exact structural equality of datasets.
//!
//! Two datasets are equal when they hold the same set of variables, each
//! with the same dimensions, the same shape, bit-identical data and the same
//! attribute map, and when their global attribute maps are equal. Dimensions
//! are compared through the variables that use them; a dimension no variable
//! references does not affect the verdict.

use std::collections::BTreeMap;
use std::path::Path;

use netcdf_parser::open_dataset;
use refcheck_common::{AttrValue, Dataset};

use crate::error::{CompareError, Result};

/// Load a dataset, attaching the path to any failure.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    open_dataset(path).map_err(|source| CompareError::Dataset {
        path: path.to_path_buf(),
        source,
    })
}

/// Open both files and compare them. Open and read failures are surfaced.
pub fn compare_files(source: &Path, target: &Path) -> Result<bool> {
    let source = load_dataset(source)?;
    let target = load_dataset(target)?;
    Ok(datasets_equal(&source, &target))
}

/// Exact, symmetric structural equality.
pub fn datasets_equal(a: &Dataset, b: &Dataset) -> bool {
    attributes_equal(a.attributes(), b.attributes())
        && a.variables().len() == b.variables().len()
        && a.variables().iter().all(|(name, va)| {
            b.variable(name).map_or(false, |vb| {
                va.data_equals(vb) && attributes_equal(va.attributes(), vb.attributes())
            })
        })
}

pub(crate) fn attributes_equal(
    a: &BTreeMap<String, AttrValue>,
    b: &BTreeMap<String, AttrValue>,
) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .all(|(key, value)| b.get(key).map_or(false, |other| value.exact_eq(other)))
}
