//! CutToTheChase trimmer
//!
//! Removes time ranges from a local video with ffmpeg.
//!
//! # Usage
//!
//! ```bash
//! cttc inspect -i talk.mp4
//! cttc plan -i talk.mp4 -r 0:10-0:20 -r 1:05-1:30 --mode frame-accurate
//! cttc trim -i talk.mp4 -o short.mp4 -r 0:10-0:20 --json
//! cttc session < commands.jsonl
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use cttc::cli::{commands, Cli, Commands};
use cttc::config::AppConfig;
use cttc::utils::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // CLI > Env > File > Defaults
    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_overrides(&mut config);
    init_logging(&config.logging);

    info!("Starting cttc {}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Trim(args) => commands::trim(args, config).await,
        Commands::Plan(args) => commands::plan(args, config).await,
        Commands::Inspect(args) => commands::inspect(args, config).await,
        Commands::Session(args) => commands::session(args, config).await,
    }
}
