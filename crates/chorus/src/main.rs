// SPDX-FileCopyrightText: 2026 Chorus Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chorus - an always-on conversational agent core for Matrix and Farcaster.
//!
//! This is the binary entry point for the Chorus agent.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod dry_run;
mod serve;
mod status;

use std::path::{Path, PathBuf};

use chorus_config::model::ChorusConfig;
use clap::{Parser, Subcommand};

/// Chorus - an always-on conversational agent core.
#[derive(Parser, Debug)]
#[command(name = "chorus", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the processing loop and outbound schedulers.
    Serve,
    /// Show coordinator, rate limit and world-state status.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration as TOML.
    Config,
}

fn load_config(path: Option<&Path>) -> ChorusConfig {
    let loaded = match path {
        Some(path) => chorus_config::load_and_validate_path(path),
        None => chorus_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            chorus_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Status { json }) => status::run_status(&config, json).await,
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => {
                print!("{rendered}");
                Ok(())
            }
            Err(e) => Err(chorus_core::ChorusError::Config(format!(
                "failed to render configuration: {e}"
            ))),
        },
        None => {
            println!("chorus: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("chorus: {e}");
        std::process::exit(1);
    }
}
