//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::core::BundlerMode;

/// Incremental front-end component bundler
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Source tree root (relative to project root)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub web_dir: Option<PathBuf>,

    /// Config file path (default: rebundle.toml)
    #[arg(short = 'C', long, global = true, default_value = "rebundle.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Print per-component timings and skipped events
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Pack every component once
    #[command(visible_alias = "b")]
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Build, then watch for changes and push reloads to clients
    #[command(visible_alias = "d")]
    Dev {
        #[command(flatten)]
        build_args: BuildArgs,

        /// Watch tick in milliseconds
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Window in milliseconds during which repeats of one file are dropped
        #[arg(long)]
        same_file_timeout: Option<u64>,

        /// Hot reload WebSocket port
        #[arg(short, long)]
        port: Option<u16>,
    },
}

/// Shared arguments for Build and Dev commands
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Clean output directory completely before building
    #[arg(short, long)]
    pub clean: bool,

    /// Bundler mode
    #[arg(short, long, value_enum)]
    pub mode: Option<BundlerMode>,

    /// Write the dependency map to this file
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub dep_out: Option<PathBuf>,

    /// Maximum number of components packed at once (0 = all cores)
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

impl Cli {
    pub fn build_args(&self) -> &BuildArgs {
        match &self.command {
            Commands::Build { build_args } | Commands::Dev { build_args, .. } => build_args,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self.command, Commands::Dev { .. })
    }
}
