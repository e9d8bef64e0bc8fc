//! Convert carbon flux products to CF-compliant NetCDF files.

use anyhow::{anyhow, Context, Error};
use clap::Arg;
use fluxcf::{cdf, merge_ensemble, normalize_many, CommonCmdLineArgs, ConfigFile, Product};
use std::{fs, path::Path, str::FromStr};
use strum::IntoEnumIterator;

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
        "fluxcf",
        "Convert a carbon flux product to a CF-compliant NetCDF file.",
    )
    .arg(
        Arg::with_name("product")
            .short("p")
            .long("product")
            .takes_value(true)
            .required(true)
            .help("The product to convert, e.g. cardamom or oco2.")
            .long_help("The product to convert. Case insensitive."),
    )
    .arg(
        Arg::with_name("input")
            .short("i")
            .long("input")
            .takes_value(true)
            .required(true)
            .help("The NetCDF file to convert."),
    )
    .arg(
        Arg::with_name("std-input")
            .long("std-input")
            .takes_value(true)
            .help("File with the ensemble standard deviations, for ensemble products."),
    )
    .arg(
        Arg::with_name("config")
            .short("c")
            .long("config")
            .takes_value(true)
            .help("YAML file with settings that replace the product presets."),
    )
    .arg(
        Arg::with_name("variables")
            .multiple(true)
            .short("v")
            .long("variables")
            .takes_value(true)
            .help("Variables to convert, defaults to the product's flux variables."),
    )
    .arg(
        Arg::with_name("deflate-level")
            .short("z")
            .long("deflate-level")
            .takes_value(true)
            .default_value("4")
            .help("DEFLATE level of the flux variables, 0 to 9.")
            .long_help("DEFLATE level of the flux variables, 0 to 9. Zero turns compression off."),
    )
    .after_help(concat!(
        "The output is written to the directory given by --output, the current directory by ",
        "default. With one variable the file is named after it, otherwise it holds all the ",
        "carbon fluxes of the product."
    ));

    let (common_args, matches) = CommonCmdLineArgs::matches(app)?;
    common_args.init_logger();

    let product_name = matches
        .value_of("product")
        .ok_or_else(|| anyhow!("no product given"))?;
    let product = Product::from_str(product_name).with_context(|| {
        let known: Vec<String> = Product::iter().map(|p| p.to_string()).collect();
        format!(
            "unknown product {}, expected one of {}",
            product_name,
            known.join(", ")
        )
    })?;

    let mut config = product.config();
    if let Some(path) = matches.value_of("config") {
        let file =
            ConfigFile::load(&path).with_context(|| format!("loading config file {}", path))?;
        config = config.overlay(file);
    }

    let input = matches
        .value_of("input")
        .ok_or_else(|| anyhow!("no input file given"))?;
    let mut raw = cdf::read(&input).with_context(|| format!("reading {}", input))?;

    if let Some(std_input) = matches.value_of("std-input") {
        let std_ds = cdf::read(&std_input).with_context(|| format!("reading {}", std_input))?;
        raw = merge_ensemble(raw, std_ds, &config)
            .with_context(|| format!("merging {} into {}", std_input, input))?;
    }

    let variables: Vec<&str> = match matches.values_of("variables") {
        Some(vals) => vals.collect(),
        None => product.default_variables().to_vec(),
    };

    let normalized = normalize_many(&raw, &variables, &config)?;

    let out_names: Vec<String> = normalized
        .fluxes()
        .iter()
        .map(|pair| pair.primary.clone())
        .collect();
    let file_name = product.output_file_name(&out_names);

    let deflate_level: u32 = matches
        .value_of("deflate-level")
        .unwrap_or("4")
        .parse()
        .context("parsing --deflate-level")?;
    if deflate_level > cdf::MAX_DEFLATE_LEVEL {
        return Err(anyhow!(
            "deflate level {} is above the maximum of {}",
            deflate_level,
            cdf::MAX_DEFLATE_LEVEL
        ));
    }

    let out_dir = common_args.output_or(Path::new("."));
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let out_path = out_dir.join(file_name);
    normalized
        .write(&out_path, deflate_level)
        .with_context(|| format!("writing {}", out_path.display()))?;

    println!("{}", out_path.display());

    Ok(())
}
