//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

use crate::config::AppConfig;
use crate::domain::model::{CuttingMode, TimeRange};

fn parse_range(value: &str) -> Result<TimeRange, String> {
    TimeRange::parse(value).map_err(|e| e.to_string())
}

fn parse_mode(value: &str) -> Result<CuttingMode, String> {
    CuttingMode::parse(value).map_err(|e| e.to_string())
}

fn parse_crf(value: &str) -> Result<u8, String> {
    clap_num::number_range(value, 0, 51)
}

/// Arguments for the trim command
#[derive(Args, Debug)]
pub struct TrimArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file path (default: <input>_trimmed.<ext>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Range to remove as START-END (HH:MM:SS.ms, MM:SS.ms, or seconds); repeatable
    #[arg(short, long = "range", value_name = "START-END", required = true, value_parser = parse_range)]
    pub ranges: Vec<TimeRange>,

    /// Cutting mode: lossless or frame-accurate
    #[arg(long, default_value = "lossless", value_parser = parse_mode)]
    pub mode: CuttingMode,

    /// Replace the output if it already exists
    #[arg(long)]
    pub overwrite: bool,

    /// Emit progress as JSON lines on stdout
    #[arg(long)]
    pub json: bool,

    /// Constant Rate Factor for re-encoded segments (0-51)
    #[arg(long, value_parser = parse_crf)]
    pub crf: Option<u8>,

    /// Encoder preset for re-encoded segments
    #[arg(long)]
    pub preset: Option<String>,

    /// Use NVENC for re-encoded segments when available
    #[arg(long)]
    pub hw_accel: bool,

    /// Encoder threads (0 = all cores)
    #[arg(long)]
    pub threads: Option<usize>,
}

impl TrimArgs {
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| crate::utils::path::default_output_path(&self.input))
    }

    /// Layer encoder flags over the loaded configuration
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        let settings = &mut config.encoder.settings;
        if let Some(crf) = self.crf {
            settings.crf = crf;
        }
        if let Some(preset) = &self.preset {
            settings.preset = preset.clone();
        }
        if let Some(threads) = self.threads {
            settings.threads = threads;
        }
        if self.hw_accel {
            settings.hardware_acceleration = true;
        }
    }
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Range to remove as START-END; repeatable
    #[arg(short, long = "range", value_name = "START-END", required = true, value_parser = parse_range)]
    pub ranges: Vec<TimeRange>,

    /// Cutting mode: lossless or frame-accurate
    #[arg(long, default_value = "lossless", value_parser = parse_mode)]
    pub mode: CuttingMode,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Input video file path
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the session command
#[derive(Args, Debug)]
pub struct SessionArgs {
    /// Session name; one job may run per session at a time
    #[arg(long, default_value = "stdio")]
    pub session_id: String,
}
