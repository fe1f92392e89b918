//! rebundle - incremental bundling of front-end components with hot reload.

#![allow(dead_code)]

mod actor;
mod change;
mod cli;
mod config;
mod core;
mod logger;
mod output;
mod pack;
mod reload;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::RebundleConfig;

fn main() -> Result<()> {
    // Before any blocking work, so Ctrl+C during the initial build exits.
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {}
    }
    logger::set_verbose(cli.verbose);

    let config = RebundleConfig::load(&cli)?;

    match &cli.command {
        Commands::Build { .. } => cli::build::run_build(&config),
        Commands::Dev { .. } => cli::dev::run_dev(config),
    }
}
