use crate::{config::EngineConfig, engine::Engine};
use clap::Parser;
use ember_utils::{ok, AnyResult};
use log::*;
use std::process::ExitCode;

pub mod ai;
pub mod cli;
pub mod config;
pub mod engine;
pub mod navmesh;
pub mod scene;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn main() -> ExitCode {
    let args = cli::Args::parse();

    let mut logger = pretty_env_logger::formatted_builder();
    logger
        .format_indent(None)
        .format_timestamp(None)
        .filter_level(args.log_level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        logger.parse_filters(&filters);
    }
    logger.init();

    info!("Welcome to Ember {VERSION}");

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!("{error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &cli::Args) -> AnyResult {
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    config.apply_args(args);
    debug!("Using configuration {config:?}");

    let mut engine = Engine::new(config)?;
    let summary = engine.run();

    info!(
        "Simulated {} frames: {} spawned, {} expired, peak of {} entities, {} draws",
        summary.frames, summary.spawned, summary.expired, summary.peak_entities, summary.draws
    );
    info!(
        "{} paths planned, {} released on destruction",
        engine.navigation().store().planned(),
        engine.navigation().store().released()
    );

    ok()
}
