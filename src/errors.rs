//! Module for errors.
use std::{error::Error, fmt::Display};

/// Error from converting a flux product.
#[derive(Debug)]
pub enum FluxCfErr {
    // Inherited errors from std
    /// Error forwarded from std
    IO(::std::io::Error),

    // Other forwarded errors
    /// Error forwarded from serde_yaml
    Yaml(serde_yaml::Error),
    /// Error forwarded from ndarray
    Shape(ndarray::ShapeError),
    /// Error forwarded from the netcdf crate
    NetCdf(netcdf::Error),
    /// General error with any cause information erased and replaced by a string
    GeneralError(String),

    // My own errors from this crate
    /// A required axis, or required values along it, was not found.
    MissingAxis(String),
    /// No units could be determined for a variable.
    MissingUnits(String),
    /// A time step could not be turned into a calendar date.
    CalendarReconstruction(String),
    /// A variable is not in the dataset.
    MissingVariable(String),
    /// A field disagrees with the dataset about the length of a dimension.
    DimensionMismatch {
        /// Name of the dimension.
        dim: String,
        /// Length already recorded in the dataset.
        expected: usize,
        /// Length of the offending field.
        found: usize,
    },
    /// Two datasets hold different values under the same variable name.
    MergeConflict(String),
    /// There was an internal logic error.
    LogicError(&'static str),
}

impl Display for FluxCfErr {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
        use crate::errors::FluxCfErr::*;

        match self {
            IO(err) => write!(f, "std lib io error: {}", err),

            Yaml(err) => write!(f, "yaml error: {}", err),
            Shape(err) => write!(f, "array shape error: {}", err),
            NetCdf(err) => write!(f, "netcdf error: {}", err),
            GeneralError(msg) => write!(f, "general error forwarded: {}", msg),

            MissingAxis(msg) => write!(f, "missing axis: {}", msg),
            MissingUnits(vname) => write!(f, "no units available for variable: {}", vname),
            CalendarReconstruction(msg) => write!(f, "unable to reconstruct calendar: {}", msg),
            MissingVariable(vname) => write!(f, "variable not in dataset: {}", vname),
            DimensionMismatch {
                dim,
                expected,
                found,
            } => write!(
                f,
                "dimension {} has length {} but a field has length {}",
                dim, expected, found
            ),
            MergeConflict(vname) => write!(f, "conflicting values for variable: {}", vname),
            LogicError(msg) => write!(f, "internal logic error: {}", msg),
        }
    }
}

impl Error for FluxCfErr {}

impl From<::std::io::Error> for FluxCfErr {
    fn from(err: ::std::io::Error) -> FluxCfErr {
        FluxCfErr::IO(err)
    }
}

impl From<serde_yaml::Error> for FluxCfErr {
    fn from(err: serde_yaml::Error) -> FluxCfErr {
        FluxCfErr::Yaml(err)
    }
}

impl From<ndarray::ShapeError> for FluxCfErr {
    fn from(err: ndarray::ShapeError) -> FluxCfErr {
        FluxCfErr::Shape(err)
    }
}

impl From<netcdf::Error> for FluxCfErr {
    fn from(err: netcdf::Error) -> FluxCfErr {
        FluxCfErr::NetCdf(err)
    }
}

impl From<Box<dyn Error>> for FluxCfErr {
    fn from(err: Box<dyn Error>) -> FluxCfErr {
        FluxCfErr::GeneralError(err.to_string())
    }
}
