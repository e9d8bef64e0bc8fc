//! Configuration for a conversion run.
//!
//! Nothing in here is inferred from the data. A `Config` usually starts from the preset for a
//! `Product` and is then overlaid with the values from a YAML file.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path};

use crate::errors::FluxCfErr;

/// Descriptive global attributes attached to every output file.
#[allow(missing_docs)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalAttributes {
    pub title: String,
    pub version: String,
    pub institution: String,
    pub source: String,
    pub references: String,
}

impl GlobalAttributes {
    /// The attributes keyed by their names in the output file.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("title".to_owned(), self.title.clone());
        map.insert("version".to_owned(), self.version.clone());
        map.insert("institution".to_owned(), self.institution.clone());
        map.insert("source".to_owned(), self.source.clone());
        map.insert("references".to_owned(), self.references.clone());
        map
    }
}

/// How the central estimate and its spread are stored in the input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Layout {
    /// Each variable has a quantile dimension holding at least the 0.25, 0.5 and 0.75 levels.
    Quantiles {
        /// Name of the time-like dimension, detected if not given.
        #[serde(default)]
        time_dim: Option<String>,
        /// Name of the quantile dimension.
        #[serde(default = "default_quantile_dim")]
        quantile_dim: String,
    },
    /// Each variable is an ensemble mean with the ensemble standard deviation stored next to it.
    Ensemble {
        /// Name of the time-like dimension, detected if not given.
        #[serde(default)]
        time_dim: Option<String>,
        /// Suffix of the standard deviation variables.
        #[serde(default = "default_std_suffix")]
        std_suffix: String,
        /// Variable holding (year, month, day) rows for each time step.
        #[serde(default)]
        date_variable: Option<String>,
    },
}

fn default_quantile_dim() -> String {
    "quantile".to_owned()
}

fn default_std_suffix() -> String {
    "_std".to_owned()
}

impl Default for Layout {
    fn default() -> Self {
        Layout::Quantiles {
            time_dim: None,
            quantile_dim: default_quantile_dim(),
        }
    }
}

impl Layout {
    /// The configured time-like dimension, if any.
    pub fn time_dim(&self) -> Option<&str> {
        match self {
            Layout::Quantiles { time_dim, .. } | Layout::Ensemble { time_dim, .. } => {
                time_dim.as_deref()
            }
        }
    }
}

/// Immutable configuration passed into the normalizer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    /// Global attributes for the output.
    pub attributes: GlobalAttributes,
    /// Units assigned to variables that do not have any.
    pub default_units: Option<String>,
    /// Layout of the input.
    pub layout: Layout,
    /// Output names for input variables, e.g. `land` to `nbp`.
    pub rename: BTreeMap<String, String>,
}

impl Config {
    /// Name a variable will have in the output.
    pub fn output_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.rename.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Replace the values that are set in `file`, keep the rest.
    pub fn overlay(mut self, file: ConfigFile) -> Self {
        let ConfigFile {
            title,
            version,
            institution,
            source,
            references,
            default_units,
            layout,
            rename,
        } = file;

        let attrs = &mut self.attributes;
        for (slot, val) in vec![
            (&mut attrs.title, title),
            (&mut attrs.version, version),
            (&mut attrs.institution, institution),
            (&mut attrs.source, source),
            (&mut attrs.references, references),
        ] {
            if let Some(val) = val {
                *slot = val;
            }
        }

        if default_units.is_some() {
            self.default_units = default_units;
        }

        if let Some(layout) = layout {
            self.layout = layout;
        }

        if let Some(rename) = rename {
            self.rename = rename;
        }

        self
    }
}

/// The contents of a configuration file, every entry optional.
#[allow(missing_docs)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub title: Option<String>,
    pub version: Option<String>,
    pub institution: Option<String>,
    pub source: Option<String>,
    pub references: Option<String>,
    pub default_units: Option<String>,
    pub layout: Option<Layout>,
    pub rename: Option<BTreeMap<String, String>>,
}

impl ConfigFile {
    /// Parse the YAML text of a configuration file.
    pub fn from_yaml(text: &str) -> Result<Self, FluxCfErr> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load a configuration file from disk.
    pub fn load(path: &dyn AsRef<Path>) -> Result<Self, FluxCfErr> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&text)
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
