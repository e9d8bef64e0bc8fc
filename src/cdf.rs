//! Reading and writing NetCDF files.
//!
//! Every numeric variable is read as doubles, with `_FillValue`/`missing_value` turned into NaN
//! and `scale_factor`/`add_offset` applied. Text attributes are kept, other attributes are only
//! used for unpacking. Output files are NetCDF-4, every variable stored as a double, and the
//! named variables DEFLATE compressed.

use netcdf::{Attribute, AttributeValue, Options};
use std::{collections::BTreeMap, path::Path};

use crate::{
    dataset::{Field, LabeledDataset},
    errors::FluxCfErr,
};

/// Highest DEFLATE level NetCDF accepts.
pub const MAX_DEFLATE_LEVEL: u32 = 9;

/// Read a dataset from a NetCDF file.
pub fn read(path: &dyn AsRef<Path>) -> Result<LabeledDataset, FluxCfErr> {
    let file = netcdf::open(path.as_ref())?;
    let mut ds = LabeledDataset::new();

    for var in file.variables() {
        let name = var.name();

        let values = match var.get_values::<f64, _>(..) {
            Ok(values) => values,
            Err(err) => {
                log::debug!("skipping non-numeric variable {}: {}", name, err);
                continue;
            }
        };

        let attrs = Attrs::collect(var.attributes())?;
        let dims: Vec<String> = var.dimensions().iter().map(|dim| dim.name()).collect();
        let shape: Vec<usize> = var.dimensions().iter().map(|dim| dim.len()).collect();

        let field = Field::from_shape_vec(dims, &shape, unpack(values, &attrs.numeric))?
            .with_attrs(attrs.text);
        ds = ds.with_var(&name, field)?;
    }

    let attrs = Attrs::collect(file.attributes())?;
    for name in attrs.numeric.keys() {
        log::debug!("dropping numeric global attribute {}", name);
    }

    log::info!(
        "read {} variables from {}",
        ds.vars().count(),
        path.as_ref().display()
    );

    Ok(ds.with_attrs(attrs.text))
}

/// Write a dataset to a NetCDF-4 file.
///
/// The variables named in `compressed` are stored with DEFLATE at `deflate_level`, a level of 0
/// turns compression off and levels above `MAX_DEFLATE_LEVEL` are capped. Attributes with empty
/// values are not written.
pub fn write(
    path: &dyn AsRef<Path>,
    ds: &LabeledDataset,
    compressed: &[&str],
    deflate_level: u32,
) -> Result<(), FluxCfErr> {
    let dims = ds.dims();
    // A zero length asks NetCDF for an unlimited dimension.
    if dims.values().any(|&len| len == 0) {
        return Err(FluxCfErr::LogicError(
            "zero length dimensions cannot be written",
        ));
    }

    let mut file = netcdf::create_with(path.as_ref(), Options::NETCDF4)?;

    for (key, val) in ds.attrs().iter().filter(|(_, val)| !val.is_empty()) {
        file.add_attribute(key, val.as_str())?;
    }

    for (name, len) in &dims {
        file.add_dimension(name, *len)?;
    }

    let level = deflate_level.min(MAX_DEFLATE_LEVEL) as i32;

    for (name, field) in ds.vars() {
        let dim_names: Vec<&str> = field.dims().iter().map(String::as_str).collect();
        let mut var = file.add_variable::<f64>(name, &dim_names)?;

        if level > 0 && compressed.contains(&name) {
            var.set_compression(level, true)?;
        }

        for (key, val) in field.attrs().iter().filter(|(_, val)| !val.is_empty()) {
            var.put_attribute(key, val.as_str())?;
        }

        var.put_values(&field.values(), ..)?;
    }

    log::info!(
        "wrote {} variables to {}",
        ds.vars().count(),
        path.as_ref().display()
    );

    Ok(())
}

fn unpack(values: Vec<f64>, numeric: &BTreeMap<String, Vec<f64>>) -> Vec<f64> {
    let first = |key: &str| numeric.get(key).and_then(|vals| vals.first().cloned());

    let fill = first("_FillValue").or_else(|| first("missing_value"));
    let scale = first("scale_factor").unwrap_or(1.0);
    let offset = first("add_offset").unwrap_or(0.0);

    values
        .into_iter()
        .map(|val| match fill {
            Some(fill) if val == fill => std::f64::NAN,
            _ => val * scale + offset,
        })
        .collect()
}

#[derive(Default)]
struct Attrs {
    text: BTreeMap<String, String>,
    numeric: BTreeMap<String, Vec<f64>>,
}

impl Attrs {
    fn collect<'f>(attrs: impl Iterator<Item = Attribute<'f>>) -> Result<Self, FluxCfErr> {
        let mut out = Attrs::default();

        for attr in attrs {
            let name = attr.name().to_owned();
            match attr.value()? {
                AttributeValue::Str(text) => {
                    out.text.insert(name, text);
                }
                value => match as_numbers(value) {
                    Some(numbers) => {
                        out.numeric.insert(name, numbers);
                    }
                    None => log::debug!("ignoring attribute {}", name),
                },
            }
        }

        Ok(out)
    }
}

fn as_numbers(value: AttributeValue) -> Option<Vec<f64>> {
    use netcdf::AttributeValue::*;

    let numbers = match value {
        Schar(val) => vec![f64::from(val)],
        Schars(vals) => vals.into_iter().map(f64::from).collect(),
        Uchar(val) => vec![f64::from(val)],
        Uchars(vals) => vals.into_iter().map(f64::from).collect(),
        Short(val) => vec![f64::from(val)],
        Shorts(vals) => vals.into_iter().map(f64::from).collect(),
        Ushort(val) => vec![f64::from(val)],
        Ushorts(vals) => vals.into_iter().map(f64::from).collect(),
        Int(val) => vec![f64::from(val)],
        Ints(vals) => vals.into_iter().map(f64::from).collect(),
        Uint(val) => vec![f64::from(val)],
        Uints(vals) => vals.into_iter().map(f64::from).collect(),
        Float(val) => vec![f64::from(val)],
        Floats(vals) => vals.into_iter().map(f64::from).collect(),
        Double(val) => vec![val],
        Doubles(vals) => vals,
        _ => return None,
    };

    Some(numbers)
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;
    use std::fs;
    use tempdir::TempDir;

    fn sample() -> LabeledDataset {
        LabeledDataset::new()
            .with_var(
                "lat",
                Field::from_shape_vec(vec!["lat"], &[2], vec![-45.0, 45.0])
                    .unwrap()
                    .with_attr("units", "degrees_north"),
            )
            .unwrap()
            .with_var(
                "nbp",
                Field::from_shape_vec(
                    vec!["time", "lat"],
                    &[3, 2],
                    vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.5],
                )
                .unwrap()
                .with_attr("units", "g m-2 day-1")
                .with_attr("ancillary_variables", "nbp_uncert"),
            )
            .unwrap()
            .with_var(
                "time",
                Field::from_shape_vec(vec!["time"], &[3], vec![14.0, 44.5, 73.0]).unwrap(),
            )
            .unwrap()
            .with_attr("title", "odd length")
    }

    #[test]
    fn test_write_read() {
        let tmp = TempDir::new("fluxcf-test-cdf").unwrap();
        let path = tmp.path().join("sample.nc");
        let ds = sample();

        write(&path, &ds, &["nbp"], 4).unwrap();
        assert_eq!(read(&path).unwrap(), ds);
    }

    #[test]
    fn test_empty_attributes_skipped() {
        let tmp = TempDir::new("fluxcf-test-cdf").unwrap();
        let path = tmp.path().join("sample.nc");
        let ds = sample().with_attr("references", "");

        write(&path, &ds, &[], 0).unwrap();
        let back = read(&path).unwrap();

        assert_eq!(back.attr("references"), None);
        assert_eq!(back.attr("title"), Some("odd length"));
    }

    #[test]
    fn test_deflate_shrinks_file() {
        let tmp = TempDir::new("fluxcf-test-cdf").unwrap();
        let ds = LabeledDataset::new()
            .with_var(
                "gpp",
                Field::from_shape_vec(vec!["time", "cell"], &[100, 200], vec![1.5; 20_000])
                    .unwrap(),
            )
            .unwrap();

        let plain = tmp.path().join("plain.nc");
        let packed = tmp.path().join("packed.nc");
        write(&plain, &ds, &["gpp"], 0).unwrap();
        write(&packed, &ds, &["gpp"], 6).unwrap();

        let plain_len = fs::metadata(&plain).unwrap().len();
        let packed_len = fs::metadata(&packed).unwrap().len();
        assert!(packed_len < plain_len / 2);

        assert_eq!(read(&packed).unwrap(), ds);
    }

    #[test]
    fn test_zero_length_dimension() {
        let tmp = TempDir::new("fluxcf-test-cdf").unwrap();
        let ds = LabeledDataset::new()
            .with_var(
                "empty",
                Field::from_shape_vec(vec!["time"], &[0], vec![]).unwrap(),
            )
            .unwrap();

        match write(&tmp.path().join("empty.nc"), &ds, &[], 0) {
            Err(FluxCfErr::LogicError(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_read_packed_values() {
        let tmp = TempDir::new("fluxcf-test-cdf").unwrap();
        let path = tmp.path().join("packed.nc");

        {
            let mut file = netcdf::create(&path).unwrap();
            file.add_attribute("title", "test").unwrap();
            file.add_attribute("count", 7i32).unwrap();
            file.add_dimension("time", 2).unwrap();
            file.add_dimension("lat", 2).unwrap();

            let mut time = file.add_variable::<f64>("time", &["time"]).unwrap();
            time.put_attribute("units", "days since 2001-01-01")
                .unwrap();
            time.put_values(&[0.0, 31.0], ..).unwrap();

            let mut flux = file.add_variable::<i16>("flux", &["time", "lat"]).unwrap();
            flux.put_attribute("_FillValue", -1i16).unwrap();
            flux.put_attribute("add_offset", 1.0f64).unwrap();
            flux.put_attribute("scale_factor", 0.5f64).unwrap();
            flux.put_values(&[2i16, -1, 4, 6], ..).unwrap();
        }

        let ds = read(&path).unwrap();

        assert_eq!(ds.attr("title"), Some("test"));
        assert_eq!(ds.attr("count"), None);

        let time = ds.get("time").unwrap();
        assert_eq!(time.values(), vec![0.0, 31.0]);
        assert_eq!(time.attr("units"), Some("days since 2001-01-01"));

        let flux = ds.get("flux").unwrap();
        assert_eq!(flux.dims(), &["time".to_owned(), "lat".to_owned()]);
        let vals = flux.values();
        assert_eq!(vals[0], 2.0);
        assert!(vals[1].is_nan());
        assert_eq!(vals[2], 3.0);
        assert_eq!(vals[3], 4.0);

        // Numeric attributes are only used for unpacking.
        assert!(flux.attrs().is_empty());
    }

    #[test]
    fn test_missing_file() {
        let tmp = TempDir::new("fluxcf-test-cdf").unwrap();

        match read(&tmp.path().join("nothing.nc")) {
            Err(FluxCfErr::NetCdf(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
