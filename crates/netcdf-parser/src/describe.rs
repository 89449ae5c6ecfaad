//! Human-readable dataset header, in the spirit of `ncdump -h`.

use std::fmt::Write;

use refcheck_common::Dataset;

/// Render dimensions, variables (with their attributes) and global
/// attributes of `dataset`, one item per line.
pub fn describe(dataset: &Dataset) -> String {
    let mut out = String::new();

    // Writing into a String cannot fail
    let _ = writeln!(out, "dimensions:");
    for (name, len) in dataset.dimensions() {
        let _ = writeln!(out, "\t{} = {} ;", name, len);
    }

    let _ = writeln!(out, "variables:");
    for (name, var) in dataset.variables() {
        let _ = writeln!(
            out,
            "\t{} {}({}) ;",
            var.data().type_name(),
            name,
            var.dimensions().join(", ")
        );
        for (attr, value) in var.attributes() {
            let _ = writeln!(out, "\t\t{}:{} = {} ;", name, attr, value);
        }
    }

    if !dataset.attributes().is_empty() {
        let _ = writeln!(out, "\n// global attributes:");
        for (attr, value) in dataset.attributes() {
            let _ = writeln!(out, "\t\t:{} = {} ;", attr, value);
        }
    }

    out
}
