use chrono::NaiveDate;
use ndarray::Axis;

use crate::{
    calendar::{date_from_triple, Calendar, CfTimeUnits, TimeAxis, TIME_UNITS},
    dataset::{Field, LabeledDataset},
    errors::FluxCfErr,
};

/// Canonical name of the time dimension.
pub const TIME_DIM: &str = "time";
/// Name of the time bounds variable.
pub const TIME_BOUNDS: &str = "time_bounds";
/// Name of the bounds dimension.
pub const BOUNDS_DIM: &str = "nb";

/// Find the time-like dimension of a dataset.
///
/// A configured name wins if the dataset has it. Otherwise use a dimension already called
/// `time`, then one whose coordinate has CF time units, then one whose name starts with `time`.
/// Both fallbacks take the first match in alphabetical order of the dimension names, not the
/// order of the dimensions in the file.
pub(crate) fn find_time_dim(
    ds: &LabeledDataset,
    configured: Option<&str>,
) -> Result<String, FluxCfErr> {
    let dims = ds.dims();

    if let Some(name) = configured {
        if dims.contains_key(name) {
            return Ok(name.to_owned());
        }
        log::warn!("time dimension {} not in dataset, searching for another", name);
    }

    if dims.contains_key(TIME_DIM) {
        return Ok(TIME_DIM.to_owned());
    }

    let by_units = dims.keys().find(|dim| {
        ds.coord(dim)
            .and_then(|coord| coord.attr("units"))
            .and_then(CfTimeUnits::parse)
            .is_some()
    });

    by_units
        .or_else(|| dims.keys().find(|dim| dim.starts_with(TIME_DIM)))
        .cloned()
        .ok_or_else(|| FluxCfErr::MissingAxis("no time-like dimension found".to_owned()))
}

/// Dates of the input time steps, in order. `ds` must already use `TIME_DIM`.
///
/// With a date variable, each row along time is read as (year, month[, day]). Otherwise the time
/// coordinate is decoded using its CF units and calendar.
pub(crate) fn time_steps(
    ds: &LabeledDataset,
    date_variable: Option<&str>,
) -> Result<Vec<NaiveDate>, FluxCfErr> {
    let steps = match date_variable {
        Some(name) => steps_from_triples(ds.get(name)?)?,
        None => steps_from_coord(ds)?,
    };

    if let Some(expected) = ds.dim_len(TIME_DIM) {
        if steps.len() != expected {
            return Err(FluxCfErr::CalendarReconstruction(format!(
                "found {} dates for {} time steps",
                steps.len(),
                expected
            )));
        }
    }

    Ok(steps)
}

fn steps_from_triples(dates: &Field) -> Result<Vec<NaiveDate>, FluxCfErr> {
    let time_ax = dates.axis(TIME_DIM).ok_or_else(|| {
        FluxCfErr::CalendarReconstruction("date variable is not along time".to_owned())
    })?;

    if dates.dims().len() != 2 {
        return Err(FluxCfErr::CalendarReconstruction(
            "date variable must have two dimensions".to_owned(),
        ));
    }

    dates
        .data()
        .axis_iter(Axis(time_ax))
        .map(|row| {
            let row: Vec<f64> = row.iter().cloned().collect();
            match *row.as_slice() {
                [y, m] => date_from_triple(as_int(y)?, as_int(m)?, None),
                [y, m, d] => date_from_triple(as_int(y)?, as_int(m)?, Some(as_int(d)?)),
                _ => Err(FluxCfErr::CalendarReconstruction(format!(
                    "expected year, month[, day] but found {} values",
                    row.len()
                ))),
            }
        })
        .collect()
}

fn as_int<T: std::convert::TryFrom<i64>>(val: f64) -> Result<T, FluxCfErr> {
    if val.is_finite() && val.fract() == 0.0 {
        if let Ok(int) = T::try_from(val as i64) {
            return Ok(int);
        }
    }

    Err(FluxCfErr::CalendarReconstruction(format!(
        "not a valid date component: {}",
        val
    )))
}

fn steps_from_coord(ds: &LabeledDataset) -> Result<Vec<NaiveDate>, FluxCfErr> {
    let coord = ds
        .coord(TIME_DIM)
        .ok_or_else(|| FluxCfErr::MissingAxis("no coordinate values for time".to_owned()))?;

    let units = coord.attr("units").ok_or_else(|| {
        FluxCfErr::CalendarReconstruction("time coordinate has no units".to_owned())
    })?;
    let units = CfTimeUnits::parse(units).ok_or_else(|| {
        FluxCfErr::CalendarReconstruction(format!("unrecognized time units: {}", units))
    })?;
    let calendar = Calendar::from_attribute(coord.attr("calendar"))?;

    units.decode(&coord.values(), calendar)
}

/// The `time` coordinate and `time_bounds` variables for the output.
pub(crate) fn time_fields(axis: &TimeAxis) -> Result<(Field, Field), FluxCfErr> {
    let n = axis.len();
    let calendar: &'static str = Calendar::NoLeap.into();

    let time = Field::from_shape_vec(vec![TIME_DIM], &[n], axis.encoded_stamps())?
        .with_attr("units", TIME_UNITS)
        .with_attr("calendar", calendar)
        .with_attr("bounds", TIME_BOUNDS)
        .with_attr("axis", "T")
        .with_attr("standard_name", "time")
        .with_attr("long_name", "time");

    let bounds = Field::from_shape_vec(vec![TIME_DIM, BOUNDS_DIM], &[n, 2], axis.encoded_bounds())?
        .with_attr("units", TIME_UNITS)
        .with_attr("calendar", calendar);

    Ok((time, bounds))
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
