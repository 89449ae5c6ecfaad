//! In-memory labeled dataset model.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::error::{CommonError, CommonResult};
use crate::values::{ArrayData, AttrValue};

/// A gridded dataset: dimensions, variables and global attributes.
///
/// Maps are ordered by name so iteration (and therefore every report derived
/// from it) is deterministic.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    dimensions: BTreeMap<String, usize>,
    variables: BTreeMap<String, Variable>,
    attributes: BTreeMap<String, AttrValue>,
}

/// A named variable: its dimension list, data, and attributes.
#[derive(Debug, Clone)]
pub struct Variable {
    dimensions: Vec<String>,
    shape: Vec<usize>,
    data: ArrayData,
    attributes: BTreeMap<String, AttrValue>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a dimension. Redefining with the same length is a no-op.
    pub fn add_dimension(&mut self, name: impl Into<String>, len: usize) -> CommonResult<()> {
        let name = name.into();
        match self.dimensions.get(&name) {
            Some(&existing) if existing != len => Err(CommonError::DimensionConflict {
                name,
                existing,
                requested: len,
            }),
            Some(_) => Ok(()),
            None => {
                self.dimensions.insert(name, len);
                Ok(())
            }
        }
    }

    /// Add a variable over already-defined dimensions.
    ///
    /// The data length must equal the product of the dimension lengths
    /// (one element for a scalar variable).
    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        dimensions: &[&str],
        data: ArrayData,
    ) -> CommonResult<&mut Variable> {
        let name = name.into();
        let mut shape = Vec::with_capacity(dimensions.len());
        for dim in dimensions {
            let len = self.dimensions.get(*dim).copied().ok_or_else(|| {
                CommonError::UnknownDimension {
                    variable: name.clone(),
                    dimension: dim.to_string(),
                }
            })?;
            shape.push(len);
        }

        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(CommonError::ShapeMismatch {
                variable: name,
                expected,
                actual: data.len(),
            });
        }

        let variable = Variable {
            dimensions: dimensions.iter().map(|d| d.to_string()).collect(),
            shape,
            data,
            attributes: BTreeMap::new(),
        };
        Ok(match self.variables.entry(name) {
            Entry::Occupied(mut slot) => {
                slot.insert(variable);
                slot.into_mut()
            }
            Entry::Vacant(slot) => slot.insert(variable),
        })
    }

    /// Add a coordinate variable: a 1-D variable named after its own dimension.
    pub fn add_coordinate(
        &mut self,
        name: impl Into<String>,
        data: ArrayData,
    ) -> CommonResult<&mut Variable> {
        let name = name.into();
        self.add_dimension(name.clone(), data.len())?;
        let dims = [name.as_str()];
        self.add_variable(name.clone(), &dims, data)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Replace a variable's data, keeping its dimensions and attributes.
    pub fn replace_data(&mut self, name: &str, data: ArrayData) -> CommonResult<()> {
        let variable = self
            .variables
            .get_mut(name)
            .ok_or_else(|| CommonError::UnknownVariable(name.to_string()))?;
        if data.len() != variable.data.len() {
            return Err(CommonError::ShapeMismatch {
                variable: name.to_string(),
                expected: variable.data.len(),
                actual: data.len(),
            });
        }
        variable.data = data;
        Ok(())
    }

    pub fn remove_variable(&mut self, name: &str) -> Option<Variable> {
        self.variables.remove(name)
    }

    pub fn dimensions(&self) -> &BTreeMap<String, usize> {
        &self.dimensions
    }

    pub fn variables(&self) -> &BTreeMap<String, Variable> {
        &self.variables
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttrValue> {
        &self.attributes
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn variable_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.variables.get_mut(name)
    }

    /// Names of coordinate variables (1-D, named after their dimension).
    pub fn coordinate_names(&self) -> impl Iterator<Item = &str> {
        self.variables
            .iter()
            .filter(|(name, var)| var.dimensions.len() == 1 && &var.dimensions[0] == *name)
            .map(|(name, _)| name.as_str())
    }

    /// Names of data variables (everything that is not a coordinate).
    pub fn data_variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables
            .iter()
            .filter(|(name, var)| !(var.dimensions.len() == 1 && &var.dimensions[0] == *name))
            .map(|(name, _)| name.as_str())
    }
}

impl Variable {
    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttrValue> {
        &self.attributes
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Builder form of [`Variable::set_attribute`].
    pub fn with_attribute(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> &mut Self {
        self.set_attribute(name, value);
        self
    }

    /// Same dimensions, same shape and bit-identical data. Attributes are
    /// not considered.
    pub fn data_equals(&self, other: &Variable) -> bool {
        self.dimensions == other.dimensions
            && self.shape == other.shape
            && self.data.exact_eq(&other.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        let mut ds = Dataset::new();
        ds.add_coordinate("time", ArrayData::F64(vec![0.0, 1.0])).unwrap();
        ds.add_coordinate("x", ArrayData::F32(vec![10.0, 20.0, 30.0])).unwrap();
        ds.add_variable("w", &["time", "x"], ArrayData::F32(vec![0.0; 6]))
            .unwrap()
            .with_attribute("units", "m s-1");
        ds.set_attribute("title", "sample");
        ds
    }

    #[test]
    fn test_coordinates_and_data_variables_are_split() {
        let ds = sample();
        let coords: Vec<&str> = ds.coordinate_names().collect();
        let data: Vec<&str> = ds.data_variable_names().collect();
        assert_eq!(coords, vec!["time", "x"]);
        assert_eq!(data, vec!["w"]);
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let mut ds = sample();
        let err = ds
            .add_variable("bad", &["time", "x"], ArrayData::F32(vec![0.0; 5]))
            .unwrap_err();
        assert!(matches!(err, CommonError::ShapeMismatch { expected: 6, actual: 5, .. }));
    }

    #[test]
    fn test_unknown_dimension_is_rejected() {
        let mut ds = Dataset::new();
        let err = ds
            .add_variable("v", &["y"], ArrayData::I32(vec![1]))
            .unwrap_err();
        assert!(matches!(err, CommonError::UnknownDimension { .. }));
    }

    #[test]
    fn test_scalar_variable_holds_one_element() {
        let mut ds = Dataset::new();
        assert!(ds.add_variable("s", &[], ArrayData::F64(vec![1.5])).is_ok());
        assert_eq!(ds.variable("s").unwrap().shape(), &[] as &[usize]);
    }

    #[test]
    fn test_dimension_redefinition_conflict() {
        let mut ds = Dataset::new();
        ds.add_dimension("x", 3).unwrap();
        assert!(ds.add_dimension("x", 3).is_ok());
        assert!(ds.add_dimension("x", 4).is_err());
    }

    #[test]
    fn test_replace_data_keeps_shape() {
        let mut ds = sample();
        assert!(ds.replace_data("x", ArrayData::F32(vec![1.0, 2.0, 3.0])).is_ok());
        assert!(ds.replace_data("x", ArrayData::F32(vec![1.0])).is_err());
        assert!(matches!(
            ds.replace_data("nope", ArrayData::F32(vec![])),
            Err(CommonError::UnknownVariable(_))
        ));
    }

    #[test]
    fn test_data_equals_ignores_attributes() {
        let a = sample();
        let mut b = sample();
        b.variable_mut("w").unwrap().set_attribute("units", "K");
        assert!(a.variable("w").unwrap().data_equals(b.variable("w").unwrap()));
    }
}
