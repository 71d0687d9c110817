//! CLI module for cttc
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::utils::logging::LogFormat;

pub mod args;
pub mod commands;

/// CutToTheChase trimmer
///
/// Removes time ranges from a video. Lossless mode stream-copies and widens
/// cuts to keyframes; frame-accurate mode keeps cuts exact and re-encodes only
/// the GOPs around them.
#[derive(Parser, Debug)]
#[command(name = "cttc")]
#[command(about = "Remove time ranges from videos, losslessly or frame-accurately")]
#[command(version)]
pub struct Cli {
    /// Log filter, e.g. `info` or `cttc=debug`
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, global = true)]
    pub log_format: Option<LogFormat>,

    /// Config file (TOML or YAML); defaults to ./cttc.toml or ./cttc.yaml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Apply global flags on top of file and environment settings
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Remove ranges from a video and write the result
    Trim(args::TrimArgs),
    /// Show the segment plan for a trim without running it
    Plan(args::PlanArgs),
    /// Inspect video file information
    Inspect(args::InspectArgs),
    /// Serve JSON-lines trim and cancel commands on stdin
    Session(args::SessionArgs),
}
