//! FFprobe adapter for media file probing
//!
//! Stream layout and duration come from `-show_format -show_streams` as JSON.
//! Keyframes come from a packet scan of the first video stream, keeping the
//! packets whose flags contain `K`.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info};

use crate::domain::errors::DomainError;
use crate::domain::model::{KeyframeSet, VideoInfo};
use crate::ports::ProbePort;

/// FFprobe-based probe adapter
pub struct FfprobeAdapter {
    ffprobe: PathBuf,
}

impl FfprobeAdapter {
    /// Create new FFprobe adapter
    pub fn new(ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe: ffprobe.into(),
        }
    }

    async fn run(&self, args: &[&str], path: &Path) -> Result<String, DomainError> {
        let output = Command::new(&self.ffprobe)
            .args(args)
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                DomainError::ProbeUnavailable(format!(
                    "failed to run {}: {}",
                    self.ffprobe.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(DomainError::ProbeUnavailable(format!(
                "ffprobe failed on {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn probe_format(&self, path: &Path) -> Result<FfprobeOutput, DomainError> {
        let json = self
            .run(
                &["-v", "error", "-print_format", "json", "-show_format", "-show_streams"],
                path,
            )
            .await?;
        serde_json::from_str(&json)
            .map_err(|e| DomainError::ProbeUnavailable(format!("unreadable ffprobe output: {}", e)))
    }

    async fn probe_keyframes(&self, path: &Path) -> Result<KeyframeSet, DomainError> {
        let csv = self
            .run(
                &[
                    "-v",
                    "error",
                    "-select_streams",
                    "v:0",
                    "-show_entries",
                    "packet=pts_time,flags",
                    "-of",
                    "csv=print_section=0",
                ],
                path,
            )
            .await?;
        Ok(parse_keyframe_csv(&csv))
    }
}

#[async_trait]
impl ProbePort for FfprobeAdapter {
    async fn probe(&self, path: &Path) -> Result<VideoInfo, DomainError> {
        let output = self.probe_format(path).await?;
        let mut info = output.video_info()?;
        info.keyframes = self.probe_keyframes(path).await?;
        info!(
            "Probed {}: {:.3}s at {:.3} fps, {} keyframe(s), codec {}",
            path.display(),
            info.duration,
            info.fps,
            info.keyframes.len(),
            info.video_codec.as_deref().unwrap_or("unknown")
        );
        Ok(info)
    }

    async fn probe_duration(&self, path: &Path) -> Result<f64, DomainError> {
        let info = self.probe_format(path).await?.video_info()?;
        Ok(info.duration)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    #[serde(default)]
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    duration: Option<String>,
}

impl FfprobeOutput {
    fn video_info(&self) -> Result<VideoInfo, DomainError> {
        let video = self
            .streams
            .iter()
            .find(|s| s.codec_type.as_deref() == Some("video"))
            .ok_or_else(|| DomainError::ProbeUnavailable("no video stream".to_string()))?;

        let duration = self
            .format
            .as_ref()
            .and_then(|f| parse_number(f.duration.as_deref()))
            .or_else(|| parse_number(video.duration.as_deref()))
            .ok_or_else(|| DomainError::ProbeUnavailable("duration not reported".to_string()))?;

        let fps = parse_frame_rate(video.r_frame_rate.as_deref())
            .or_else(|| parse_frame_rate(video.avg_frame_rate.as_deref()))
            .unwrap_or(0.0);

        let count = |kind: &str| {
            self.streams
                .iter()
                .filter(|s| s.codec_type.as_deref() == Some(kind))
                .count()
        };

        let mut info = VideoInfo::new(duration, fps, KeyframeSet::default());
        info.video_codec = video.codec_name.clone();
        info.container = self.format.as_ref().and_then(|f| f.format_name.clone());
        info.audio_tracks = count("audio");
        info.subtitle_tracks = count("subtitle");
        info.validate()?;
        Ok(info)
    }
}

fn parse_number(value: Option<&str>) -> Option<f64> {
    value?.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse `num/den` or a plain number; `0/0` yields None
pub fn parse_frame_rate(rate: Option<&str>) -> Option<f64> {
    let rate = rate?.trim();
    let fps = match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().ok()?;
            let den: f64 = den.trim().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => rate.parse().ok()?,
    };
    (fps.is_finite() && fps > 0.0).then_some(fps)
}

/// Keyframe timestamps from `pts_time,flags` CSV lines
pub fn parse_keyframe_csv(csv: &str) -> KeyframeSet {
    let times: Vec<f64> = csv
        .lines()
        .filter_map(|line| {
            let mut fields = line.trim().split(',');
            let time = fields.next()?.trim().parse::<f64>().ok()?;
            let flags = fields.next()?;
            flags.contains('K').then_some(time)
        })
        .collect();
    debug!("Parsed {} keyframe packet(s)", times.len());
    KeyframeSet::new(times)
}
