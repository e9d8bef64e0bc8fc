//! Turn a raw flux dataset into a CF-compliant one.
//!
//! The conversion is a single forward pass over an immutable input:
//!
//! 1. rename the time-like dimension to `time`,
//! 2. pick the central estimate of each variable (median or ensemble mean),
//! 3. normalize its units,
//! 4. derive or copy its uncertainty,
//! 5. link the two with metadata,
//! 6. rebuild the time axis on a noleap calendar with bounds,
//! 7. attach the configured global attributes.

use std::path::Path;

use crate::{
    calendar::TimeAxis,
    cdf,
    config::{Config, Layout},
    dataset::{Field, LabeledDataset},
    errors::FluxCfErr,
    units::normalize_unit_string,
};

mod quantiles;
mod time;

pub use quantiles::QuantileSet;
pub use time::{BOUNDS_DIM, TIME_BOUNDS, TIME_DIM};

/// Suffix of uncertainty variables derived from quantiles.
pub const UNCERTAINTY_SUFFIX: &str = "_uncert";

/// Names of a primary variable and its uncertainty companion in the output.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FluxPair {
    pub primary: String,
    pub uncertainty: String,
}

/// The result of a conversion, ready to be written.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedDataset {
    dataset: LabeledDataset,
    fluxes: Vec<FluxPair>,
    time: TimeAxis,
}

impl NormalizedDataset {
    /// The converted dataset.
    pub fn dataset(&self) -> &LabeledDataset {
        &self.dataset
    }

    /// The converted variables.
    pub fn fluxes(&self) -> &[FluxPair] {
        &self.fluxes
    }

    /// The rebuilt time axis.
    pub fn time_axis(&self) -> &TimeAxis {
        &self.time
    }

    /// Write to a NetCDF-4 file. The flux variables and their uncertainties are DEFLATE
    /// compressed at `deflate_level`, 0 stores them uncompressed.
    pub fn write(&self, path: &dyn AsRef<Path>, deflate_level: u32) -> Result<(), FluxCfErr> {
        let compressed: Vec<&str> = self
            .fluxes
            .iter()
            .flat_map(|pair| vec![pair.primary.as_str(), pair.uncertainty.as_str()])
            .collect();

        cdf::write(path, &self.dataset, &compressed, deflate_level)
    }
}

/// Combine the ensemble means with the standard deviations shipped in a separate dataset.
///
/// Every variable of `std` gets the layout's `std_suffix`, except its date variable which the
/// means already carry.
pub fn merge_ensemble(
    mean: LabeledDataset,
    std: LabeledDataset,
    config: &Config,
) -> Result<LabeledDataset, FluxCfErr> {
    let (std_suffix, date_variable) = match &config.layout {
        Layout::Ensemble {
            std_suffix,
            date_variable,
            ..
        } => (std_suffix, date_variable),
        Layout::Quantiles { .. } => {
            return Err(FluxCfErr::LogicError(
                "standard deviations can only be merged for ensemble products",
            ));
        }
    };

    let std = match date_variable {
        Some(name) => std.without_var(name),
        None => std,
    };

    mean.merge(std.with_suffix(std_suffix))
}

/// Convert a single variable.
pub fn normalize(
    raw: &LabeledDataset,
    variable_name: &str,
    config: &Config,
) -> Result<NormalizedDataset, FluxCfErr> {
    normalize_many(raw, &[variable_name], config)
}

/// Convert several variables into one dataset that shares a single time axis.
pub fn normalize_many(
    raw: &LabeledDataset,
    variable_names: &[&str],
    config: &Config,
) -> Result<NormalizedDataset, FluxCfErr> {
    let time_dim = time::find_time_dim(raw, config.layout.time_dim())?;
    log::debug!("using {} as the time dimension", time_dim);
    let ds = raw.clone().rename_dim(&time_dim, TIME_DIM);

    let date_variable = match &config.layout {
        Layout::Ensemble { date_variable, .. } => date_variable.as_deref(),
        Layout::Quantiles { .. } => None,
    };
    let steps = time::time_steps(&ds, date_variable)?;
    let axis = TimeAxis::from_steps(&steps);

    let mut out = LabeledDataset::new();
    let mut fluxes = Vec::with_capacity(variable_names.len());

    for &name in variable_names {
        let out_name = config.output_name(name);
        log::info!("converting {} to {}", name, out_name);

        let (pair, primary, uncertainty) = match &config.layout {
            Layout::Quantiles { quantile_dim, .. } => {
                quantile_flux(&ds, name, out_name, quantile_dim, config)?
            }
            Layout::Ensemble { std_suffix, .. } => {
                ensemble_flux(&ds, name, out_name, std_suffix, config)?
            }
        };

        out = copy_coords(&ds, &primary, out)?;
        out = out
            .with_var(&pair.primary, primary)?
            .with_var(&pair.uncertainty, uncertainty)?;
        fluxes.push(pair);
    }

    let (time, bounds) = time::time_fields(&axis)?;
    let dataset = out
        .with_var(TIME_DIM, time)?
        .with_var(TIME_BOUNDS, bounds)?
        .with_attrs(config.attributes.to_map());

    Ok(NormalizedDataset {
        dataset,
        fluxes,
        time: axis,
    })
}

fn quantile_flux(
    ds: &LabeledDataset,
    name: &str,
    out_name: &str,
    quantile_dim: &str,
    config: &Config,
) -> Result<(FluxPair, Field, Field), FluxCfErr> {
    let var = ds.get(name)?;
    let quantiles = QuantileSet::select(ds, var, quantile_dim)?;

    let units = match var.attr("units") {
        Some(units) => normalize_unit_string(units),
        None => default_units(name, config)?,
    };

    let pair = FluxPair {
        primary: out_name.to_owned(),
        uncertainty: format!("{}{}", out_name, UNCERTAINTY_SUFFIX),
    };

    let uncertainty = quantiles
        .uncertainty()?
        .with_attr("long_name", &format!("{} standard_error", out_name))
        .with_attr("units", &units);

    let primary = quantiles
        .median
        .with_attr("units", &units)
        .with_attr("ancillary_variables", &pair.uncertainty);

    Ok((pair, primary, uncertainty))
}

fn ensemble_flux(
    ds: &LabeledDataset,
    name: &str,
    out_name: &str,
    std_suffix: &str,
    config: &Config,
) -> Result<(FluxPair, Field, Field), FluxCfErr> {
    let mean = ds.get(name)?;
    let std_name = format!("{}{}", name, std_suffix);
    let std = ds.get(&std_name)?;

    if std.dims() != mean.dims() {
        return Err(FluxCfErr::MissingAxis(format!(
            "{} does not have the dimensions of {}",
            std_name, name
        )));
    }

    // The ensemble files carry no trustworthy units, the configured ones always win.
    let units = default_units(name, config)?;

    let pair = FluxPair {
        primary: out_name.to_owned(),
        uncertainty: format!("{}{}", out_name, std_suffix),
    };

    let primary = mean
        .clone()
        .with_attr("units", &units)
        .with_attr("ancillary_variables", &pair.uncertainty);

    let uncertainty = std
        .clone()
        .with_attr("units", &units)
        .with_attr("standard_name", &format!("{} standard_error", out_name));

    Ok((pair, primary, uncertainty))
}

fn default_units(name: &str, config: &Config) -> Result<String, FluxCfErr> {
    config
        .default_units
        .as_deref()
        .map(normalize_unit_string)
        .ok_or_else(|| FluxCfErr::MissingUnits(name.to_owned()))
}

// Coordinates of the non-time dimensions of `field`, e.g. lat and lon.
fn copy_coords(
    ds: &LabeledDataset,
    field: &Field,
    out: LabeledDataset,
) -> Result<LabeledDataset, FluxCfErr> {
    field
        .dims()
        .iter()
        .filter(|dim| dim.as_str() != TIME_DIM)
        .filter_map(|dim| ds.coord(dim).map(|coord| (dim, coord)))
        .try_fold(out, |out, (dim, coord)| out.with_var(dim, coord.clone()))
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
