//! In memory datasets of named variables over named dimensions.

use std::collections::BTreeMap;

use crate::errors::FluxCfErr;

mod field;

pub use field::Field;

/// A set of named fields sharing dimensions, with global attributes.
///
/// Every field that uses a dimension agrees on its length, this is checked when a field is added.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabeledDataset {
    vars: BTreeMap<String, Field>,
    attrs: BTreeMap<String, String>,
}

impl LabeledDataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, replacing any field already stored under `name`.
    pub fn with_var(mut self, name: &str, field: Field) -> Result<Self, FluxCfErr> {
        self.insert(name, field)?;
        Ok(self)
    }

    /// Set a global attribute.
    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.attrs.insert(key.to_owned(), value.to_owned());
        self
    }

    /// Replace all the global attributes.
    pub fn with_attrs(mut self, attrs: BTreeMap<String, String>) -> Self {
        self.attrs = attrs;
        self
    }

    /// Get a field, if it exists.
    pub fn var(&self, name: &str) -> Option<&Field> {
        self.vars.get(name)
    }

    /// Get a field, or an error naming the missing variable.
    pub fn get(&self, name: &str) -> Result<&Field, FluxCfErr> {
        self.var(name)
            .ok_or_else(|| FluxCfErr::MissingVariable(name.to_owned()))
    }

    /// Iterate over all the fields, sorted by name.
    pub fn vars(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.vars.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// The names of all the fields.
    pub fn var_names(&self) -> Vec<String> {
        self.vars.keys().cloned().collect()
    }

    /// Global attributes.
    pub fn attrs(&self) -> &BTreeMap<String, String> {
        &self.attrs
    }

    /// Look up a single global attribute.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// All the dimensions used by the fields with their lengths.
    pub fn dims(&self) -> BTreeMap<String, usize> {
        let mut dims = BTreeMap::new();
        for field in self.vars.values() {
            for (dim, len) in field.shape() {
                dims.insert(dim.to_owned(), len);
            }
        }
        dims
    }

    /// Length of a dimension.
    pub fn dim_len(&self, dim: &str) -> Option<usize> {
        self.vars.values().find_map(|field| field.len_of(dim))
    }

    /// The coordinate variable of a dimension: a one dimensional field with the same name.
    pub fn coord(&self, dim: &str) -> Option<&Field> {
        self.vars
            .get(dim)
            .filter(|field| field.dims().len() == 1 && field.dims()[0] == dim)
    }

    /// Check if a variable is the coordinate variable of its dimension.
    pub fn is_coord(&self, name: &str) -> bool {
        self.coord(name).is_some()
    }

    /// Rename a dimension in every field. A coordinate variable for the dimension is renamed
    /// along with it.
    pub fn rename_dim(self, from: &str, to: &str) -> Self {
        let is_coord = self.is_coord(from);
        let LabeledDataset { vars, attrs } = self;

        let vars = vars
            .into_iter()
            .map(|(name, field)| {
                let name = if is_coord && name == from {
                    to.to_owned()
                } else {
                    name
                };
                (name, field.rename_dim(from, to))
            })
            .collect();

        LabeledDataset { vars, attrs }
    }

    /// Rename a variable.
    pub fn rename_var(mut self, from: &str, to: &str) -> Result<Self, FluxCfErr> {
        let field = self
            .vars
            .remove(from)
            .ok_or_else(|| FluxCfErr::MissingVariable(from.to_owned()))?;
        self.insert(to, field)?;
        Ok(self)
    }

    /// Remove a variable, if present.
    pub fn without_var(mut self, name: &str) -> Self {
        self.vars.remove(name);
        self
    }

    /// Append `suffix` to the name of every variable that is not a coordinate.
    pub fn with_suffix(self, suffix: &str) -> Self {
        let coords: Vec<String> = self
            .vars
            .keys()
            .filter(|name| self.is_coord(name))
            .cloned()
            .collect();

        let LabeledDataset { vars, attrs } = self;

        let vars = vars
            .into_iter()
            .map(|(name, field)| {
                if coords.contains(&name) {
                    (name, field)
                } else {
                    (format!("{}{}", name, suffix), field)
                }
            })
            .collect();

        LabeledDataset { vars, attrs }
    }

    /// Combine two datasets.
    ///
    /// Variables present in both must be identical. Global attributes of `self` win over those
    /// of `other`.
    pub fn merge(mut self, other: LabeledDataset) -> Result<Self, FluxCfErr> {
        let LabeledDataset { vars, attrs } = other;

        for (name, field) in vars {
            match self.vars.get(&name) {
                Some(existing) if *existing == field => {}
                Some(_) => return Err(FluxCfErr::MergeConflict(name)),
                None => self.insert(&name, field)?,
            }
        }

        for (key, val) in attrs {
            self.attrs.entry(key).or_insert(val);
        }

        Ok(self)
    }

    fn insert(&mut self, name: &str, field: Field) -> Result<(), FluxCfErr> {
        for (dim, len) in field.shape() {
            let existing = self
                .vars
                .iter()
                .filter(|(other, _)| other.as_str() != name)
                .find_map(|(_, other)| other.len_of(dim));

            if let Some(expected) = existing {
                if expected != len {
                    return Err(FluxCfErr::DimensionMismatch {
                        dim: dim.to_owned(),
                        expected,
                        found: len,
                    });
                }
            }
        }

        self.vars.insert(name.to_owned(), field);
        Ok(())
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;

    fn months() -> Field {
        Field::from_shape_vec(vec!["n_months"], &[3], vec![0.0, 31.0, 59.0])
            .unwrap()
            .with_attr("units", "days since 2015-01-01")
    }

    fn land() -> Field {
        Field::from_shape_vec(
            vec!["n_months", "lat"],
            &[3, 2],
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        )
        .unwrap()
    }

    fn test_dataset() -> LabeledDataset {
        LabeledDataset::new()
            .with_var("n_months", months())
            .unwrap()
            .with_var("land", land())
            .unwrap()
            .with_attr("title", "test")
    }

    #[test]
    fn test_dims() {
        let ds = test_dataset();
        let dims = ds.dims();

        assert_eq!(dims.get("n_months"), Some(&3));
        assert_eq!(dims.get("lat"), Some(&2));
        assert_eq!(ds.dim_len("lat"), Some(2));
        assert_eq!(ds.dim_len("lon"), None);
    }

    #[test]
    fn test_dimension_mismatch() {
        let bad = Field::from_shape_vec(vec!["n_months"], &[4], vec![0.0; 4]).unwrap();
        let res = test_dataset().with_var("ocean", bad);

        match res {
            Err(FluxCfErr::DimensionMismatch {
                dim,
                expected,
                found,
            }) => {
                assert_eq!(dim, "n_months");
                assert_eq!(expected, 3);
                assert_eq!(found, 4);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_replace_var_with_new_shape() {
        let ds = LabeledDataset::new().with_var("land", land()).unwrap();
        let resized = Field::from_shape_vec(vec!["n_months"], &[5], vec![0.0; 5]).unwrap();

        let ds = ds.with_var("land", resized).unwrap();
        assert_eq!(ds.dim_len("n_months"), Some(5));
    }

    #[test]
    fn test_rename_dim_moves_coordinate() {
        let ds = test_dataset().rename_dim("n_months", "time");

        assert!(ds.var("n_months").is_none());
        assert!(ds.is_coord("time"));
        assert_eq!(ds.get("land").unwrap().axis("time"), Some(0));
        assert_eq!(
            ds.coord("time").unwrap().attr("units"),
            Some("days since 2015-01-01")
        );
    }

    #[test]
    fn test_with_suffix_skips_coordinates() {
        let ds = test_dataset().with_suffix("_std");

        assert!(ds.var("land_std").is_some());
        assert!(ds.var("land").is_none());
        assert!(ds.var("n_months").is_some());
    }

    #[test]
    fn test_merge() {
        let mean = test_dataset();
        let std = test_dataset().with_suffix("_std").with_attr("title", "other");

        let merged = mean.merge(std).unwrap();
        assert_eq!(
            merged.var_names(),
            vec!["land".to_owned(), "land_std".to_owned(), "n_months".to_owned()]
        );
        assert_eq!(merged.attr("title"), Some("test"));
    }

    #[test]
    fn test_merge_conflict() {
        let mean = test_dataset();
        let shifted = LabeledDataset::new()
            .with_var(
                "n_months",
                Field::from_shape_vec(vec!["n_months"], &[3], vec![1.0, 2.0, 3.0]).unwrap(),
            )
            .unwrap();

        assert!(mean.merge(shifted).is_err());
    }

    #[test]
    fn test_rename_var() {
        let ds = test_dataset().rename_var("land", "nbp").unwrap();
        assert!(ds.var("nbp").is_some());
        assert!(test_dataset().rename_var("ocean", "fgco2").is_err());
    }
}
