//! simreel CLI - Inspect, play and produce simulation recordings
//!
//! # Commands
//!
//! - `simreel list` - List recordings in the recordings directory
//! - `simreel inspect` - Summarize a recording's contents
//! - `simreel play` - Play a recording headlessly, printing entity positions
//! - `simreel demo` - Run the built-in simulation and record it
//!
//! # Usage
//!
//! ```bash
//! # Record ten seconds of the demo simulation
//! simreel demo --seconds 10 --name first
//!
//! # See what was written
//! simreel list
//! simreel inspect first
//!
//! # Watch it back at double speed
//! simreel play first --speed 2
//! ```
//!
//! Recordings live in `[storage] recordings_dir` from `config.toml`, or the
//! platform data directory. Every command accepts `--dir` to override it.
//! Set `RUST_LOG=debug` to see skipped lines and writer activity.

mod demo;
mod inspect;
mod list;
mod play;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use simreel_core::{Config, FileStorage, config};
use tracing_subscriber::EnvFilter;

/// simreel CLI - Inspect, play and produce simulation recordings
#[derive(Parser)]
#[command(name = "simreel")]
#[command(about = "Record simulations and play them back")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available recordings
    List(list::ListArgs),

    /// Summarize a recording
    Inspect(inspect::InspectArgs),

    /// Play a recording without rendering
    Play(play::PlayArgs),

    /// Run the built-in simulation and record it
    Demo(demo::DemoArgs),
}

/// Where to find recordings (shared by all commands)
#[derive(Args, Debug, Clone, Default)]
pub struct StorageArgs {
    /// Recordings directory (defaults to the configured one)
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

impl StorageArgs {
    /// Storage rooted at `--dir`, or the configured recordings directory
    pub fn open(&self, config: &Config) -> FileStorage {
        let dir = self
            .dir
            .clone()
            .unwrap_or_else(|| config::recordings_dir(config));
        FileStorage::new(dir)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::load();

    match cli.command {
        Commands::List(args) => list::execute(args, &config),
        Commands::Inspect(args) => inspect::execute(args, &config),
        Commands::Play(args) => play::execute(args, &config),
        Commands::Demo(args) => demo::execute(args, &config),
    }
}
