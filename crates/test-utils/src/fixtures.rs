//! Common test fixtures for refcheck tests.
//!
//! Datasets here mimic what the tracking example notebooks save: a
//! segmentation mask on a (time, y, x) grid and a feature table indexed by
//! feature number.

use refcheck_common::{ArrayData, AttrValue, Dataset};

use crate::generators::brightness_temperature_field;

/// Example notebook directory names as produced by the reference generator.
pub mod notebooks {
    pub const OLR_TRACKING: &str = "Example_OLR_Tracking_model";
    pub const PRECIP_TRACKING: &str = "Example_Precip_Tracking";
    pub const UPDRAFT_TRACKING: &str = "Example_Updraft_Tracking";
}

/// A dataset with one variable `v` over dimension `x`.
pub fn single_variable(units: &str, data: Vec<f64>) -> Dataset {
    let mut ds = Dataset::new();
    ds.add_dimension("x", data.len())
        .expect("fresh dataset has no dimensions");
    ds.add_variable("v", &["x"], ArrayData::F64(data))
        .expect("data length matches dimension")
        .with_attribute("units", units);
    ds
}

/// A small segmentation-mask output on a 2 x 3 x 4 grid.
pub fn segmentation_mask() -> Dataset {
    let (nt, ny, nx) = (2, 3, 4);
    let mut ds = Dataset::new();
    ds.add_coordinate("time", ArrayData::F64(vec![0.0, 300.0]))
        .unwrap()
        .with_attribute("units", "seconds since 2013-06-19 20:05:00")
        .with_attribute("standard_name", "time");
    ds.add_coordinate("y", ArrayData::F32((0..ny).map(|j| j as f32 * 4000.0).collect()))
        .unwrap()
        .with_attribute("units", "m");
    ds.add_coordinate("x", ArrayData::F32((0..nx).map(|i| i as f32 * 4000.0).collect()))
        .unwrap()
        .with_attribute("units", "m");

    let mask: Vec<i32> = brightness_temperature_field(nt, ny, nx)
        .iter()
        .map(|&tb| if tb < 250.0 { 1 } else { 0 })
        .collect();
    ds.add_variable("segmentation_mask", &["time", "y", "x"], ArrayData::I32(mask))
        .unwrap()
        .with_attribute("long_name", "segmentation_mask");

    ds.add_variable(
        "OLR",
        &["time", "y", "x"],
        ArrayData::F32(brightness_temperature_field(nt, ny, nx)),
    )
    .unwrap()
    .with_attribute("units", "W m-2")
    .with_attribute("long_name", "TOA Outgoing Longwave Radiation");

    ds.set_attribute("title", "Segmentation mask");
    ds.set_attribute("threshold", AttrValue::Float(250.0));
    ds
}

/// A feature table with three detected features.
pub fn feature_table() -> Dataset {
    let mut ds = Dataset::new();
    ds.add_coordinate("index", ArrayData::I64(vec![0, 1, 2])).unwrap();
    ds.add_variable("frame", &["index"], ArrayData::I64(vec![0, 0, 1]))
        .unwrap();
    ds.add_variable("feature", &["index"], ArrayData::I64(vec![1, 2, 3]))
        .unwrap();
    ds.add_variable("hdim_1", &["index"], ArrayData::F64(vec![1.25, 2.0, 1.5]))
        .unwrap();
    ds.add_variable("hdim_2", &["index"], ArrayData::F64(vec![0.5, 3.0, 0.75]))
        .unwrap();
    ds.add_variable("num", &["index"], ArrayData::I64(vec![4, 9, 6]))
        .unwrap();
    ds.add_variable(
        "threshold_value",
        &["index"],
        ArrayData::F64(vec![250.0, 225.0, 250.0]),
    )
    .unwrap()
    .with_attribute("units", "K");
    ds.set_attribute("tobac_version", "1.5.1");
    ds
}
