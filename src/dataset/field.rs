use ndarray::{ArrayD, Axis, IxDyn};
use std::collections::BTreeMap;

use crate::errors::FluxCfErr;

/// An array of values laid out along named dimensions, with its own attributes.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    dims: Vec<String>,
    data: ArrayD<f64>,
    attrs: BTreeMap<String, String>,
}

impl Field {
    /// Create a new field. There must be one dimension name per axis of `data`.
    pub fn new<S: Into<String>>(
        dims: impl IntoIterator<Item = S>,
        data: ArrayD<f64>,
    ) -> Result<Self, FluxCfErr> {
        let dims: Vec<String> = dims.into_iter().map(Into::into).collect();

        if dims.len() != data.ndim() {
            return Err(FluxCfErr::LogicError(
                "number of dimension names does not match the array rank",
            ));
        }

        Ok(Field {
            dims,
            data,
            attrs: BTreeMap::new(),
        })
    }

    /// Create a new field from values in row major order.
    pub fn from_shape_vec<S: Into<String>>(
        dims: impl IntoIterator<Item = S>,
        shape: &[usize],
        values: Vec<f64>,
    ) -> Result<Self, FluxCfErr> {
        let data = ArrayD::from_shape_vec(IxDyn(shape), values)?;
        Self::new(dims, data)
    }

    /// Set an attribute.
    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.attrs.insert(key.to_owned(), value.to_owned());
        self
    }

    /// Replace all the attributes.
    pub fn with_attrs(mut self, attrs: BTreeMap<String, String>) -> Self {
        self.attrs = attrs;
        self
    }

    /// Dimension names, in axis order.
    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    /// The values.
    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    /// All the attributes.
    pub fn attrs(&self) -> &BTreeMap<String, String> {
        &self.attrs
    }

    /// Look up a single attribute.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// Axis number of a dimension.
    pub fn axis(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    /// Length along a dimension.
    pub fn len_of(&self, dim: &str) -> Option<usize> {
        self.axis(dim).map(|ax| self.data.len_of(Axis(ax)))
    }

    /// Pairs of dimension name and length.
    pub fn shape(&self) -> impl Iterator<Item = (&str, usize)> {
        self.dims
            .iter()
            .map(String::as_str)
            .zip(self.data.shape().iter().cloned())
    }

    /// The values in row major order.
    pub fn values(&self) -> Vec<f64> {
        self.data.iter().cloned().collect()
    }

    /// Take a slice at `index` along `dim`, dropping that dimension. Attributes are kept.
    pub fn index_axis(&self, dim: &str, index: usize) -> Result<Field, FluxCfErr> {
        let ax = self
            .axis(dim)
            .ok_or_else(|| FluxCfErr::MissingAxis(dim.to_owned()))?;

        if index >= self.data.len_of(Axis(ax)) {
            return Err(FluxCfErr::LogicError("index out of range along axis"));
        }

        let dims = self
            .dims
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != ax)
            .map(|(_, d)| d.clone());

        let data = self.data.index_axis(Axis(ax), index).to_owned();

        Ok(Field::new(dims, data)?.with_attrs(self.attrs.clone()))
    }

    /// Same values and attributes with one dimension renamed.
    pub fn rename_dim(mut self, from: &str, to: &str) -> Self {
        for dim in self.dims.iter_mut().filter(|d| d.as_str() == from) {
            *dim = to.to_owned();
        }
        self
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
