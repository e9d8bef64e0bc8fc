//! Build the model setup file of the benchmarking tool from a directory of model outputs.

use serde::Serialize;
use std::{
    collections::{BTreeMap, BTreeSet},
    fs,
    path::{Path, MAIN_SEPARATOR},
};
use strum_macros::{EnumIter, EnumString, IntoStaticStr};

use crate::errors::FluxCfErr;

/// Qualitative color palettes, as defined by matplotlib.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, IntoStaticStr, EnumIter)]
pub enum Palette {
    /// Ten colors.
    #[strum(to_string = "tab10")]
    Tab10,
    /// Twenty colors, pairs of dark and light shades.
    #[strum(to_string = "tab20")]
    Tab20,
}

const TAB10: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

const TAB20: [&str; 20] = [
    "#1f77b4", "#aec7e8", "#ff7f0e", "#ffbb78", "#2ca02c", "#98df8a", "#d62728", "#ff9896",
    "#9467bd", "#c5b0d5", "#8c564b", "#c49c94", "#e377c2", "#f7b6d2", "#7f7f7f", "#c7c7c7",
    "#bcbd22", "#dbdb8d", "#17becf", "#9edae5",
];

impl Palette {
    /// All the colors in order.
    pub fn colors(self) -> &'static [&'static str] {
        match self {
            Palette::Tab10 => &TAB10,
            Palette::Tab20 => &TAB20,
        }
    }

    /// The color for the `index`th model, starting over when the palette runs out.
    pub fn color(self, index: usize) -> &'static str {
        let colors = self.colors();
        colors[index % colors.len()]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Palette::Tab20
    }
}

/// One model in the setup file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModelEntry {
    /// Name shown in the benchmark output.
    pub modelname: String,
    /// Only files whose names contain this are part of the model.
    pub filter: String,
    /// Hex color used in plots.
    pub color: String,
    /// Directory holding the model files.
    pub path: String,
}

/// Models keyed by name, serialized in name order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ModelRegistry {
    models: BTreeMap<String, ModelEntry>,
}

impl ModelRegistry {
    /// Find the models with output in `dir`.
    ///
    /// Every `*.nc` file belongs to the model named by its file stem up to the first `_`, so
    /// `CLASSIC_nbp.nc` and `CLASSIC_gpp.nc` are both outputs of `CLASSIC`.
    pub fn scan(dir: &dyn AsRef<Path>, palette: Palette) -> Result<Self, FluxCfErr> {
        let dir = dir.as_ref();

        let mut names = BTreeSet::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("nc") {
                continue;
            }

            let model = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.split('_').next())
                .filter(|name| !name.is_empty());

            match model {
                Some(name) => {
                    names.insert(name.to_owned());
                }
                None => log::warn!("no model name in {}", path.display()),
            }
        }

        let mut path = dir.display().to_string();
        if !path.ends_with(MAIN_SEPARATOR) {
            path.push(MAIN_SEPARATOR);
        }

        let models = names
            .into_iter()
            .enumerate()
            .map(|(idx, name)| {
                let entry = ModelEntry {
                    modelname: name.clone(),
                    filter: name.clone(),
                    color: palette.color(idx).to_owned(),
                    path: path.clone(),
                };
                (name, entry)
            })
            .collect::<BTreeMap<_, _>>();

        log::info!("found {} models in {}", models.len(), dir.display());

        Ok(ModelRegistry { models })
    }

    /// Number of models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// True if no models were found.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Look up a model by name.
    pub fn get(&self, name: &str) -> Option<&ModelEntry> {
        self.models.get(name)
    }

    /// The models in name order.
    pub fn entries(&self) -> impl Iterator<Item = &ModelEntry> {
        self.models.values()
    }

    /// The setup file contents.
    pub fn to_yaml(&self) -> Result<String, FluxCfErr> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write the setup file.
    pub fn write(&self, path: &dyn AsRef<Path>) -> Result<(), FluxCfErr> {
        fs::write(path.as_ref(), self.to_yaml()?)?;
        Ok(())
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
