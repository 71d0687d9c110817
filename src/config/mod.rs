//! Application configuration
//!
//! Precedence, lowest first: built-in defaults, config file, environment,
//! command-line flags. The file is `--config`, otherwise `cttc.toml` or
//! `cttc.yaml` in the working directory when present.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::ranges::{RangeModelOptions, DEFAULT_MAX_HISTORY, DEFAULT_MIN_RANGE_WIDTH};
use crate::engine::{EncoderSettings, ExecutorConfig};
use crate::error::{TrimError, TrimResult};
use crate::planner::PlannerOptions;
use crate::utils::logging::{LogFormat, LoggingConfig};

/// Config files looked up in the working directory, in order
pub const DEFAULT_CONFIG_FILES: &[&str] = &["cttc.toml", "cttc.yaml", "cttc.yml"];

/// Range editing limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub min_range_width: f64,
    pub max_history: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_range_width: DEFAULT_MIN_RANGE_WIDTH,
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}

/// External tools and re-encode settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    #[serde(flatten)]
    pub settings: EncoderSettings,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            settings: EncoderSettings::default(),
        }
    }
}

/// Output and workspace handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub temp_prefix: String,
    pub stale_after_hours: u64,
    pub faststart: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            temp_prefix: ".cttc_trim_".to_string(),
            stale_after_hours: 24,
            faststart: true,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub editor: EditorConfig,
    pub planner: PlannerOptions,
    pub encoder: EncoderConfig,
    pub output: OutputConfig,
}

impl AppConfig {
    /// Defaults, then the config file, then the process environment
    pub fn load(explicit: Option<&Path>) -> TrimResult<Self> {
        let mut config = match explicit.map(Path::to_path_buf).or_else(Self::discover) {
            Some(path) => Self::from_file(&path)?,
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// First default config file present in the working directory
    pub fn discover() -> Option<PathBuf> {
        DEFAULT_CONFIG_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.is_file())
    }

    pub fn from_file(path: &Path) -> TrimResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TrimError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let is_yaml = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| ext == "yaml" || ext == "yml");

        let config = if is_yaml {
            Self::from_yaml_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
        .map_err(|e| match e {
            TrimError::Config { message } => {
                TrimError::config(format!("{}: {}", path.display(), message))
            }
            other => other,
        })?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> TrimResult<Self> {
        toml::from_str(content).map_err(|e| TrimError::config(e.to_string()))
    }

    pub fn from_yaml_str(content: &str) -> TrimResult<Self> {
        serde_yaml::from_str(content).map_err(|e| TrimError::config(e.to_string()))
    }

    /// Apply `CTTC_*` overrides read through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> TrimResult<()> {
        if let Some(level) = lookup("CTTC_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("CTTC_LOG_FORMAT") {
            self.logging.format = LogFormat::parse(&format).ok_or_else(|| {
                TrimError::config(format!("CTTC_LOG_FORMAT: unknown format '{}'", format))
            })?;
        }
        if let Some(ffmpeg) = lookup("CTTC_FFMPEG") {
            self.encoder.ffmpeg = PathBuf::from(ffmpeg);
        }
        if let Some(ffprobe) = lookup("CTTC_FFPROBE") {
            self.encoder.ffprobe = PathBuf::from(ffprobe);
        }
        if let Some(value) = lookup("CTTC_HW_ACCEL") {
            self.encoder.settings.hardware_acceleration = parse_bool(&value).ok_or_else(|| {
                TrimError::config(format!("CTTC_HW_ACCEL: expected a boolean, got '{}'", value))
            })?;
        }
        if let Some(value) = lookup("CTTC_CRF") {
            self.encoder.settings.crf = value.trim().parse().map_err(|_| {
                TrimError::config(format!("CTTC_CRF: expected 0-51, got '{}'", value))
            })?;
        }
        if let Some(preset) = lookup("CTTC_PRESET") {
            self.encoder.settings.preset = preset;
        }
        Ok(())
    }

    /// Reject values that would break editing or encoding
    pub fn validate(&self) -> TrimResult<()> {
        if self.encoder.settings.crf > 51 {
            return Err(TrimError::config("encoder.crf cannot exceed 51"));
        }
        if !self.editor.min_range_width.is_finite() || self.editor.min_range_width <= 0.0 {
            return Err(TrimError::config("editor.min_range_width must be positive"));
        }
        if self.editor.max_history == 0 {
            return Err(TrimError::config("editor.max_history must be at least 1"));
        }
        let tolerance = self.planner.keyframe_tolerance;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(TrimError::config("planner.keyframe_tolerance must be >= 0"));
        }
        if self.output.temp_prefix.is_empty() {
            return Err(TrimError::config("output.temp_prefix cannot be empty"));
        }
        Ok(())
    }

    pub fn range_model_options(&self) -> RangeModelOptions {
        RangeModelOptions {
            min_range_width: self.editor.min_range_width,
            max_history: self.editor.max_history,
        }
    }

    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            encoder: self.encoder.settings.clone(),
            temp_prefix: self.output.temp_prefix.clone(),
            stale_after: Duration::from_secs(self.output.stale_after_hours.saturating_mul(3600)),
            faststart: self.output.faststart,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
