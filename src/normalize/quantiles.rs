use ndarray::Zip;

use crate::{
    dataset::{Field, LabeledDataset},
    errors::FluxCfErr,
};

const LOWER: f64 = 0.25;
const MEDIAN: f64 = 0.5;
const UPPER: f64 = 0.75;

// Quantile coordinates are often stored as f32
const LEVEL_TOLERANCE: f64 = 1.0e-6;

/// The lower quartile, median and upper quartile of a variable, quantile dimension removed.
#[derive(Clone, Debug, PartialEq)]
pub struct QuantileSet {
    /// The 0.25 quantile.
    pub lower: Field,
    /// The 0.5 quantile.
    pub median: Field,
    /// The 0.75 quantile.
    pub upper: Field,
}

impl QuantileSet {
    /// Pull the quartiles of `var` out of the dataset, using the coordinate of `quantile_dim` to
    /// find them.
    pub fn select(
        ds: &LabeledDataset,
        var: &Field,
        quantile_dim: &str,
    ) -> Result<Self, FluxCfErr> {
        if var.axis(quantile_dim).is_none() {
            return Err(FluxCfErr::MissingAxis(format!(
                "variable has no {} dimension",
                quantile_dim
            )));
        }

        let levels = ds.coord(quantile_dim).ok_or_else(|| {
            FluxCfErr::MissingAxis(format!("no coordinate values for {}", quantile_dim))
        })?;
        let levels = levels.values();

        let find = |target: f64| -> Result<usize, FluxCfErr> {
            levels
                .iter()
                .position(|level| (level - target).abs() < LEVEL_TOLERANCE)
                .ok_or_else(|| {
                    FluxCfErr::MissingAxis(format!(
                        "quantile level {} not found along {}",
                        target, quantile_dim
                    ))
                })
        };

        Ok(QuantileSet {
            lower: var.index_axis(quantile_dim, find(LOWER)?)?,
            median: var.index_axis(quantile_dim, find(MEDIAN)?)?,
            upper: var.index_axis(quantile_dim, find(UPPER)?)?,
        })
    }

    /// Combine the distances of the quartiles from the median into a single spread,
    /// `sqrt((q75 - q50)^2 + (q25 - q50)^2)`.
    ///
    /// The result has the dimensions of the median and no attributes.
    pub fn uncertainty(&self) -> Result<Field, FluxCfErr> {
        let spread = Zip::from(self.lower.data())
            .and(self.median.data())
            .and(self.upper.data())
            .map_collect(|&lo, &mid, &hi| ((hi - mid).powi(2) + (lo - mid).powi(2)).sqrt());

        Field::new(self.median.dims().iter().cloned(), spread)
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;

    fn dataset(levels: Vec<f64>, values: Vec<f64>) -> LabeledDataset {
        let n = levels.len();
        LabeledDataset::new()
            .with_var(
                "quantile",
                Field::from_shape_vec(vec!["quantile"], &[n], levels).unwrap(),
            )
            .unwrap()
            .with_var(
                "gpp",
                Field::from_shape_vec(vec!["quantile", "lat"], &[n, 2], values).unwrap(),
            )
            .unwrap()
    }

    #[test]
    fn test_select_and_spread() {
        // Levels out of order, with an extra one.
        let ds = dataset(
            vec![0.75, 0.25, 0.5, 0.975],
            vec![5.0, 1.0, 2.0, 1.0, 3.0, 1.0, 9.0, 9.0],
        );
        let set = QuantileSet::select(&ds, ds.get("gpp").unwrap(), "quantile").unwrap();

        assert_eq!(set.median.values(), vec![3.0, 1.0]);
        assert_eq!(set.lower.values(), vec![2.0, 1.0]);
        assert_eq!(set.upper.values(), vec![5.0, 1.0]);

        let uncert = set.uncertainty().unwrap();
        assert_eq!(uncert.dims(), &["lat".to_owned()]);

        let vals = uncert.values();
        assert!((vals[0] - 5.0f64.sqrt()).abs() < 1.0e-12);
        assert_eq!(vals[1], 0.0);
    }

    #[test]
    fn test_missing_level() {
        let ds = dataset(vec![0.05, 0.5, 0.95], vec![0.0; 6]);
        let res = QuantileSet::select(&ds, ds.get("gpp").unwrap(), "quantile");

        match res {
            Err(FluxCfErr::MissingAxis(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_missing_quantile_dim() {
        let ds = dataset(vec![0.25, 0.5, 0.75], vec![0.0; 6]);
        let res = QuantileSet::select(&ds, ds.get("gpp").unwrap(), "ensemble");

        assert!(res.is_err());
    }
}
