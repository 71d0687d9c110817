//! Trim execution engine

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{TrimError, TrimResult};
use crate::ports::VideoEncoder;

pub mod cancel;
pub mod executor;
pub mod progress;
pub mod workspace;

pub use cancel::CancelFlag;
pub use executor::{JobExecutor, PreparedJob};
pub use progress::ProgressTracker;

/// NVENC encoder probed when hardware acceleration is enabled
pub const NVENC_H264: &str = "h264_nvenc";

/// Re-encode settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    /// `auto` or an explicit ffmpeg encoder name
    pub video_encoder: String,
    pub preset: String,
    pub crf: u8,
    /// 0 means one thread per CPU
    pub threads: usize,
    pub hardware_acceleration: bool,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            video_encoder: "auto".to_string(),
            preset: "fast".to_string(),
            crf: 18,
            threads: 0,
            hardware_acceleration: false,
        }
    }
}

impl EncoderSettings {
    /// Whether an NVENC probe is worth doing for this source codec
    pub fn wants_nvenc(&self, source_codec: Option<&str>) -> bool {
        self.hardware_acceleration && self.video_encoder == "auto" && source_codec == Some("h264")
    }

    /// Fail with `UnsupportedCodec` when re-encoded pieces could not match the source codec
    pub fn ensure_reencodable(&self, source_codec: Option<&str>) -> TrimResult<()> {
        if self.video_encoder != "auto" || software_encoder_for(source_codec).is_some() {
            Ok(())
        } else {
            Err(unsupported(source_codec))
        }
    }

    /// Pick the encoder for re-encoded segments of a source with `source_codec`
    pub fn resolve(&self, source_codec: Option<&str>, nvenc_available: bool) -> TrimResult<VideoEncoder> {
        let threads = if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        };

        let name = if self.video_encoder != "auto" {
            self.video_encoder.clone()
        } else if nvenc_available && self.wants_nvenc(source_codec) {
            NVENC_H264.to_string()
        } else {
            software_encoder_for(source_codec)
                .ok_or_else(|| unsupported(source_codec))?
                .to_string()
        };

        // NVENC only understands p1..p7
        let preset = if name.ends_with("_nvenc") && !is_nvenc_preset(&self.preset) {
            "p4".to_string()
        } else {
            self.preset.clone()
        };

        Ok(VideoEncoder {
            name,
            preset,
            quality: self.crf,
            threads,
        })
    }
}

/// Software encoder producing the same codec as the source (ffprobe codec names)
pub fn software_encoder_for(source_codec: Option<&str>) -> Option<&'static str> {
    let encoder = match source_codec? {
        "h264" => "libx264",
        "hevc" | "h265" => "libx265",
        "vp9" => "libvpx-vp9",
        "av1" => "libsvtav1",
        "mpeg2video" => "mpeg2video",
        "mpeg4" => "mpeg4",
        "prores" => "prores_ks",
        _ => return None,
    };
    Some(encoder)
}

fn unsupported(source_codec: Option<&str>) -> TrimError {
    TrimError::UnsupportedCodec {
        codec: source_codec.unwrap_or("unknown").to_string(),
    }
}

fn is_nvenc_preset(preset: &str) -> bool {
    matches!(preset, "p1" | "p2" | "p3" | "p4" | "p5" | "p6" | "p7")
}

/// Executor configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorConfig {
    pub encoder: EncoderSettings,
    /// Name prefix of hidden workspaces
    pub temp_prefix: String,
    /// Workspaces older than this are treated as leftovers of a crash
    pub stale_after: Duration,
    /// Move the index to the front of mp4/mov outputs
    pub faststart: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            encoder: EncoderSettings::default(),
            temp_prefix: ".cttc_trim_".to_string(),
            stale_after: Duration::from_secs(24 * 3600),
            faststart: true,
        }
    }
}
