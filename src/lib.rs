#![deny(missing_docs)]
//! Convert carbon flux products into CF-compliant NetCDF files for benchmarking.
//!
//! Raw products, such as CARDAMOM quantile fluxes or JPL OCO-2 ensemble inversions, are read into
//! a `LabeledDataset`, normalized into a median or mean with an explicit uncertainty, stamped with
//! a noleap monthly time axis and written back out as NetCDF.

//
// Public API
//
pub use crate::calendar::{Calendar, NoLeapDate, TimeAxis, TIME_EPOCH, TIME_UNITS};
pub use crate::cmd_line::CommonCmdLineArgs;
pub use crate::config::{Config, ConfigFile, GlobalAttributes, Layout};
pub use crate::dataset::{Field, LabeledDataset};
pub use crate::errors::FluxCfErr;
pub use crate::normalize::{
    merge_ensemble, normalize, normalize_many, FluxPair, NormalizedDataset, QuantileSet,
    BOUNDS_DIM, TIME_BOUNDS, TIME_DIM, UNCERTAINTY_SUFFIX,
};
pub use crate::products::Product;
pub use crate::registry::{ModelEntry, ModelRegistry, Palette};
pub use crate::units::normalize_unit_string;

pub mod cdf;

//
// Implementation only
//
mod calendar;
mod cmd_line;
mod config;
mod dataset;
mod errors;
mod normalize;
mod products;
mod registry;
mod units;
