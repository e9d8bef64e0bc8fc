//! Flux products this crate knows how to convert.

use std::{collections::BTreeMap, fmt};
use strum_macros::{EnumIter, EnumString, IntoStaticStr};

use crate::config::{Config, Layout};

/// Flux products with a preset configuration.
#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumString, IntoStaticStr, EnumIter, Hash)]
pub enum Product {
    /// CARDAMOM data assimilation fluxes, stored as quantiles.
    #[strum(to_string = "cardamom", serialize = "CARDAMOM")]
    Cardamom,
    /// JPL OCO-2 flux inversion, stored as ensemble mean and standard deviation files.
    #[strum(
        to_string = "oco2",
        serialize = "OCO2",
        serialize = "oco",
        serialize = "OCO"
    )]
    Oco2,
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name: &'static str = (*self).into();
        write!(f, "{}", name)
    }
}

impl Product {
    /// Prefix for output file names.
    pub fn file_prefix(self) -> &'static str {
        match self {
            Product::Cardamom => "CARDAMOM",
            Product::Oco2 => "OCO",
        }
    }

    /// Variables converted when none are requested.
    pub fn default_variables(self) -> &'static [&'static str] {
        match self {
            Product::Cardamom => &["gpp"],
            Product::Oco2 => &["land", "ocean", "net"],
        }
    }

    /// The preset configuration for this product.
    pub fn config(self) -> Config {
        match self {
            Product::Cardamom => Config {
                layout: Layout::Quantiles {
                    time_dim: Some("time_fluxes".to_owned()),
                    quantile_dim: "quantile".to_owned(),
                },
                ..Config::default()
            },
            Product::Oco2 => {
                let mut rename = BTreeMap::new();
                rename.insert("land".to_owned(), "nbp".to_owned());
                rename.insert("ocean".to_owned(), "fgco2".to_owned());

                Config {
                    // Agreed with the data providers, the files carry no units.
                    default_units: Some("g m-2 year-1".to_owned()),
                    layout: Layout::Ensemble {
                        time_dim: Some("n_months".to_owned()),
                        std_suffix: "_std".to_owned(),
                        date_variable: Some("start_date".to_owned()),
                    },
                    rename,
                    ..Config::default()
                }
            }
        }
    }

    /// Output file name for a list of converted variables.
    pub fn output_file_name(self, variables: &[String]) -> String {
        match variables {
            [single] => format!("{}_{}.nc", self.file_prefix(), single),
            _ => format!("{}_carbon_fluxes.nc", self.file_prefix()),
        }
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;

    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn round_trip_strings_for_product() {
        for product in Product::iter() {
            assert_eq!(Product::from_str(&product.to_string()).unwrap(), product);
        }
        assert_eq!(Product::from_str("OCO").unwrap(), Product::Oco2);
        assert!(Product::from_str("trendy").is_err());
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(
            Product::Cardamom.output_file_name(&["gpp".to_owned()]),
            "CARDAMOM_gpp.nc"
        );
        assert_eq!(
            Product::Oco2.output_file_name(&["nbp".to_owned(), "fgco2".to_owned()]),
            "OCO_carbon_fluxes.nc"
        );
    }

    #[test]
    fn test_presets() {
        let config = Product::Oco2.config();
        assert_eq!(config.output_name("ocean"), "fgco2");
        assert_eq!(config.layout.time_dim(), Some("n_months"));

        let config = Product::Cardamom.config();
        assert!(config.default_units.is_none());
        assert_eq!(config.layout.time_dim(), Some("time_fluxes"));
    }
}
