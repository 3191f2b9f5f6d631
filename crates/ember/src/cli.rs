use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;

/// User-specified command line parameters
#[derive(Debug, Parser)]
#[clap(name = "Ember", version, about)]
pub struct Args {
    #[clap(long, short = 'c')]
    /// Path to a TOML configuration file. Built-in defaults are used if not specified.
    pub config: Option<PathBuf>,

    #[clap(long, short = 'f')]
    /// Overrides the amount of frames to simulate.
    pub frames: Option<u32>,

    #[clap(long, short = 'p')]
    /// Overrides the amount of wandering entities kept alive at once.
    pub population: Option<u32>,

    #[clap(long, default_value_t = LevelFilter::Info)]
    /// Maximum log level. `RUST_LOG` filters are applied on top of it.
    pub log_level: LevelFilter,
}
