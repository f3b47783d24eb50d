//! Command-line driver for behavior tree files.
//!
//! ```bash
//! btree --base-dir trees check patrol guard
//! btree run patrol --steps 20 --delta 0.5 --seed 7
//! ```
//!
//! Settings come from an optional TOML file, then `BTREE_*` environment
//! variables (a `.env` file is honored), then command-line flags.

mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use behavior_tree::DebugLevel;
use clap::Parser;
use commands::{Check, Run};
use config::CliConfig;

/// Load, validate and step behavior tree files
#[derive(Parser)]
#[command(name = "btree")]
#[command(about = "Load, validate and step behavior tree files", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Directory tree references are resolved against
    #[arg(short, long, value_name = "DIR", global = true)]
    base_dir: Option<PathBuf>,

    /// Parser debug output: none, low or high
    #[arg(long, value_name = "LEVEL", global = true)]
    debug_level: Option<DebugLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Parse trees and print their structure
    Check(Check),

    /// Step a tree and print its status after every step
    Run(Run),
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = CliConfig::load(cli.config.as_deref())?;
    if let Some(base_dir) = cli.base_dir {
        config.library.base_dir = base_dir;
    }
    if let Some(debug_level) = cli.debug_level {
        config.library.debug_level = debug_level;
    }

    match cli.command {
        Command::Check(cmd) => cmd.execute(&config),
        Command::Run(cmd) => cmd.execute(&config),
    }
}
