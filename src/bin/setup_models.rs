//! Write the model setup file of the benchmarking tool for a directory of model outputs.

use anyhow::{anyhow, Context, Error};
use clap::Arg;
use fluxcf::{CommonCmdLineArgs, ModelRegistry, Palette};
use std::{path::Path, str::FromStr};

fn main() {
    if let Err(ref e) = run() {
        println!("error: {}", e);

        for cause in e.chain().skip(1) {
            println!("caused by: {}", cause);
        }

        ::std::process::exit(1);
    }
}

fn run() -> Result<(), Error> {
    let app = CommonCmdLineArgs::new_app(
        "setup_models",
        "Build a model setup file from a directory of model outputs.",
    )
    .arg(
        Arg::with_name("root")
            .short("r")
            .long("root")
            .takes_value(true)
            .required(true)
            .help("Directory with the model output files."),
    )
    .arg(
        Arg::with_name("palette")
            .long("palette")
            .takes_value(true)
            .possible_values(&["tab10", "tab20"])
            .default_value("tab20")
            .help("Color palette for the models."),
    )
    .after_help(concat!(
        "Each *.nc file in the root directory belongs to the model named by the start of its ",
        "file name, up to the first underscore. The setup file is written to --output, ",
        "models.yaml by default."
    ));

    let (common_args, matches) = CommonCmdLineArgs::matches(app)?;
    common_args.init_logger();

    let root = matches
        .value_of("root")
        .ok_or_else(|| anyhow!("no root directory given"))?;
    let palette = matches
        .value_of("palette")
        .map(Palette::from_str)
        .unwrap_or_else(|| Ok(Palette::default()))?;

    let registry = ModelRegistry::scan(&root, palette)
        .with_context(|| format!("scanning {} for models", root))?;
    if registry.is_empty() {
        log::warn!("no model files found in {}", root);
    }

    let out_path = common_args.output_or(Path::new("models.yaml"));
    registry
        .write(&out_path)
        .with_context(|| format!("writing {}", out_path.display()))?;

    println!("{}", out_path.display());

    Ok(())
}
