//! devqueue CLI - Inspect discovered devices and exercise the queue stack.
//!
//! # Commands
//!
//! - `devqueue platforms` - Print every platform and its devices
//! - `devqueue devices [--class <class>]` - List devices
//! - `devqueue counts` - Print platform and per-class device counts
//! - `devqueue check --class <class> --index <n>` - Push/pop self-test
//!
//! # Examples
//!
//! ```bash
//! # List simulated GPUs declared in a config file
//! devqueue --config devqueue.toml devices --class gpu
//!
//! # Same, from the environment
//! DEVQUEUE__HOST__SIMULATED_GPUS=2 devqueue devices --class gpu
//!
//! # Verify push/pop on the first GPU
//! devqueue check --class gpu --index 0
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use devqueue::{DevQueueConfig, DevQueueError, DeviceClass, LoggingConfig};

mod commands;
mod error;

use commands::{check, counts, devices, platforms};
use error::CliResult;

/// devqueue - per-thread device queue inspection
#[derive(Parser)]
#[command(name = "devqueue")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (TOML); `DEVQUEUE__*` variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every platform and its devices
    Platforms,

    /// List discovered devices
    Devices {
        /// Only devices of this class (cpu, gpu, accelerator, host)
        #[arg(short, long)]
        class: Option<DeviceClass>,

        /// Print the full report of each device
        #[arg(long)]
        detailed: bool,
    },

    /// Print platform and per-class device counts
    Counts,

    /// Push, inspect and pop a queue on one device
    Check {
        /// Device class (cpu, gpu, accelerator, host)
        #[arg(short, long, default_value = "cpu")]
        class: DeviceClass,

        /// Device ordinal within the class
        #[arg(short, long, default_value = "0")]
        index: usize,
    },
}

fn load_config(path: Option<&PathBuf>) -> CliResult<DevQueueConfig> {
    let config = match path {
        Some(path) => devqueue::load_config(path)?,
        None => DevQueueConfig::from_env()
            .map_err(|e| DevQueueError::InvalidConfig(e.to_string()))?,
    };
    config.validate()?;
    Ok(config)
}

fn setup_logging(verbose: bool, quiet: bool, logging: &LoggingConfig) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        logging
            .env_filter()
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

fn run(cli: Cli) -> CliResult<()> {
    let config = load_config(cli.config.as_ref())?;
    setup_logging(cli.verbose, cli.quiet, &config.logging);

    let manager = config.build_manager()?;
    tracing::debug!(
        runtime = manager.catalog().runtime_name(),
        platforms = manager.count_platforms(),
        "Queue manager ready"
    );

    match cli.command {
        Commands::Platforms => platforms::execute(&manager),
        Commands::Devices { class, detailed } => devices::execute(&manager, class, detailed),
        Commands::Counts => counts::execute(&manager),
        Commands::Check { class, index } => check::execute(&manager, class, index),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
