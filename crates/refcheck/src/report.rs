//! Detailed discrepancy reporting.
//!
//! Run only after [`datasets_equal`](crate::datasets_equal) reported a
//! difference, to localize it. The findings cover exactly what equality
//! checks, so two datasets are equal if and only if [`discrepancies`]
//! returns nothing.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

use refcheck_common::{AttrValue, Dataset};
use serde::Serialize;

/// Which side of a comparison something belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Source,
    Target,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Source => write!(f, "source"),
            Side::Target => write!(f, "target"),
        }
    }
}

/// How an attribute differs between source and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeDifference {
    MissingFromSource,
    MissingFromTarget,
    ValueDiffers,
}

/// A single localized difference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Discrepancy {
    GlobalAttribute {
        name: String,
        difference: AttributeDifference,
    },
    /// Variable present in only one dataset; its data is not compared
    VariablePresence { name: String, present_in: Side },
    VariableAttribute {
        variable: String,
        name: String,
        difference: AttributeDifference,
    },
    /// Dimensions, shape or values of a shared variable differ
    VariableData { name: String },
    /// Reference file present in only one tree (strict pairing only)
    UnpairedReference {
        relative_path: PathBuf,
        present_in: Side,
    },
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Discrepancy::GlobalAttribute { name, .. } => {
                write!(f, "Global attribute '{}' differs.", name)
            }
            Discrepancy::VariablePresence { name, .. } => {
                write!(f, "Variable '{}' is not present in both files.", name)
            }
            Discrepancy::VariableAttribute { variable, name, .. } => {
                write!(f, "Attribute '{}' of variable '{}' differs.", name, variable)
            }
            Discrepancy::VariableData { name } => {
                write!(f, "Data of variable '{}' differs.", name)
            }
            Discrepancy::UnpairedReference {
                relative_path,
                present_in,
            } => write!(
                f,
                "Reference '{}' is present only in {}.",
                relative_path.display(),
                present_in
            ),
        }
    }
}

/// Localize every difference between `source` and `target`.
///
/// Findings are ordered: global attributes, then variables by name (presence,
/// then that variable's attributes, then its data). Within each group keys are
/// sorted.
pub fn discrepancies(source: &Dataset, target: &Dataset) -> Vec<Discrepancy> {
    let mut findings: Vec<Discrepancy> =
        attribute_differences(source.attributes(), target.attributes())
            .into_iter()
            .map(|(name, difference)| Discrepancy::GlobalAttribute { name, difference })
            .collect();

    let names: BTreeSet<&String> = source
        .variables()
        .keys()
        .chain(target.variables().keys())
        .collect();

    for name in names {
        let (src, tgt) = match (source.variable(name), target.variable(name)) {
            (Some(src), Some(tgt)) => (src, tgt),
            (Some(_), None) => {
                findings.push(Discrepancy::VariablePresence {
                    name: name.clone(),
                    present_in: Side::Source,
                });
                continue;
            }
            (None, Some(_)) => {
                findings.push(Discrepancy::VariablePresence {
                    name: name.clone(),
                    present_in: Side::Target,
                });
                continue;
            }
            (None, None) => continue,
        };

        findings.extend(
            attribute_differences(src.attributes(), tgt.attributes())
                .into_iter()
                .map(|(attr, difference)| Discrepancy::VariableAttribute {
                    variable: name.clone(),
                    name: attr,
                    difference,
                }),
        );

        if !src.data_equals(tgt) {
            findings.push(Discrepancy::VariableData { name: name.clone() });
        }
    }

    findings
}

/// Union of keys; every key not present in both with an equal value.
fn attribute_differences(
    source: &BTreeMap<String, AttrValue>,
    target: &BTreeMap<String, AttrValue>,
) -> Vec<(String, AttributeDifference)> {
    let keys: BTreeSet<&String> = source.keys().chain(target.keys()).collect();

    keys.into_iter()
        .filter_map(|key| {
            let difference = match (source.get(key), target.get(key)) {
                (None, Some(_)) => AttributeDifference::MissingFromSource,
                (Some(_), None) => AttributeDifference::MissingFromTarget,
                (Some(a), Some(b)) if !a.exact_eq(b) => AttributeDifference::ValueDiffers,
                _ => return None,
            };
            Some((key.clone(), difference))
        })
        .collect()
}
