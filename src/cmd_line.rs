//! Command line options that are used across applications.

use std::path::{Path, PathBuf};

use clap::{crate_version, App, Arg, ArgMatches};
use log::LevelFilter;

use crate::errors::FluxCfErr;

/// Struct to package up command line arguments.
#[derive(Clone, Debug)]
pub struct CommonCmdLineArgs {
    // Where to put the results, interpreted by each application
    output: Option<PathBuf>,
    // Number of times the verbose flag was given
    verbosity: u64,
}

impl<'a, 'b> CommonCmdLineArgs {
    /// Create a new set of args.
    pub fn new_app(app_name: &'static str, about: &'static str) -> App<'a, 'b> {
        App::new(app_name)
            .author("Ryan Leach <clumsycodemonkey@gmail.com>")
            .about(about)
            .version(crate_version!())
            .arg(
                Arg::with_name("output")
                    .short("o")
                    .long("output")
                    .takes_value(true)
                    .help("Where to write the results."),
            )
            .arg(
                Arg::with_name("verbose")
                    .long("verbose")
                    .multiple(true)
                    .help("Log more, may be repeated.")
                    .long_help(concat!(
                        "Log more, may be repeated. Once for debug messages, twice for trace ",
                        "messages. Ignored if RUST_LOG is set."
                    )),
            )
            .after_help("Logging is controlled by the RUST_LOG environment variable.")
    }

    /// Process an `App` to get the parsed values out of it and the matches object so an application
    /// can continue with further argument parsing.
    pub fn matches(app: App<'a, 'b>) -> Result<(Self, ArgMatches<'a>), FluxCfErr> {
        let matches = app.get_matches();

        let output = matches.value_of("output").map(PathBuf::from);
        if let Some(ref path) = output {
            if path.as_os_str().is_empty() {
                return Err(FluxCfErr::GeneralError(
                    "output path must not be empty".to_owned(),
                ));
            }
        }

        let cmd_line_opts = CommonCmdLineArgs {
            output,
            verbosity: matches.occurrences_of("verbose"),
        };

        Ok((cmd_line_opts, matches))
    }

    /// Start logging at the requested level, unless `RUST_LOG` says otherwise.
    pub fn init_logger(&self) {
        let level = match self.verbosity {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        let mut builder = env_logger::Builder::new();
        builder.filter_level(level);
        if let Ok(filters) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filters);
        }
        builder.init();
    }

    /// Get the output path, or `default` if none was given.
    pub fn output_or<'c>(&'c self, default: &'c Path) -> &'c Path {
        self.output.as_deref().unwrap_or(default)
    }
}
