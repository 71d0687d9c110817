// Domain models - Core types and data structures

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;

mod job;
mod keyframes;

pub use job::{JobId, JobState, JobStatus, ProgressEvent, TrimJob, TrimRequest};
pub use keyframes::KeyframeSet;

/// Time specification with precision - represents time in seconds with fractional precision
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TimeSpec {
    pub seconds: f64,
}

impl TimeSpec {
    /// Create a new TimeSpec from seconds
    pub fn from_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    pub fn as_seconds(&self) -> f64 {
        self.seconds
    }

    /// Parse time string in various formats
    ///
    /// Accepts plain seconds (`123.45`), `MM:SS.ms` and `HH:MM:SS.ms`.
    pub fn parse(time_str: &str) -> Result<Self, DomainError> {
        let trimmed = time_str.trim();

        if let Ok(seconds) = trimmed.parse::<f64>() {
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(DomainError::InvalidRange(format!(
                    "time must be a non-negative number: {}",
                    trimmed
                )));
            }
            return Ok(Self::from_seconds(seconds));
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        let bad = |what: &str| DomainError::InvalidRange(format!("invalid {} in '{}'", what, trimmed));

        match parts.as_slice() {
            [minutes, seconds] => {
                let minutes = minutes.parse::<u32>().map_err(|_| bad("minutes"))?;
                let seconds = seconds.parse::<f64>().map_err(|_| bad("seconds"))?;
                if !(0.0..60.0).contains(&seconds) {
                    return Err(bad("seconds"));
                }
                Ok(Self::from_seconds(minutes as f64 * 60.0 + seconds))
            }
            [hours, minutes, seconds] => {
                let hours = hours.parse::<u32>().map_err(|_| bad("hours"))?;
                let minutes = minutes.parse::<u32>().map_err(|_| bad("minutes"))?;
                let seconds = seconds.parse::<f64>().map_err(|_| bad("seconds"))?;
                if minutes >= 60 {
                    return Err(bad("minutes"));
                }
                if !(0.0..60.0).contains(&seconds) {
                    return Err(bad("seconds"));
                }
                Ok(Self::from_seconds(
                    hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds,
                ))
            }
            _ => Err(DomainError::InvalidRange(format!(
                "invalid time '{}'. Supported formats: seconds (e.g., 123.45), MM:SS.ms (e.g., 2:30.5), HH:MM:SS.ms (e.g., 1:02:30.5)",
                trimmed
            ))),
        }
    }

    /// Format as HH:MM:SS.ms, dropping the hours when zero
    pub fn format_hms(&self) -> String {
        let total_millis = (self.seconds.max(0.0) * 1000.0).round() as u64;
        let hours = total_millis / 3_600_000;
        let minutes = (total_millis % 3_600_000) / 60_000;
        let seconds = (total_millis % 60_000) / 1000;
        let milliseconds = total_millis % 1000;

        if hours > 0 {
            format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, milliseconds)
        } else {
            format!("{:02}:{:02}.{:03}", minutes, seconds, milliseconds)
        }
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_hms())
    }
}

/// Opaque identity of a removal range, stable across updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RangeId(pub u64);

impl fmt::Display for RangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Plain time interval in seconds, as it crosses the wire
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Parse `START-END` where both sides are [`TimeSpec`] strings
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let (start, end) = value.split_once('-').ok_or_else(|| {
            DomainError::InvalidRange(format!("expected START-END, got '{}'", value))
        })?;
        Ok(Self::new(
            TimeSpec::parse(start)?.as_seconds(),
            TimeSpec::parse(end)?.as_seconds(),
        ))
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            TimeSpec::from_seconds(self.start),
            TimeSpec::from_seconds(self.end)
        )
    }
}

/// A span of the source marked for removal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RemovalRange {
    pub id: RangeId,
    pub start: f64,
    pub end: f64,
}

impl RemovalRange {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Strict interval intersection; touching ranges do not overlap
    pub fn overlaps(&self, start: f64, end: f64) -> bool {
        self.start < end && self.end > start
    }

    pub fn as_time_range(&self) -> TimeRange {
        TimeRange::new(self.start, self.end)
    }
}

/// How cut boundaries are honored when trimming
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CuttingMode {
    /// Stream copy only; cuts snap outward to keyframes
    #[default]
    Lossless,
    /// Exact cuts; video around unaligned cuts is re-encoded
    FrameAccurate,
}

impl CuttingMode {
    /// Parse cutting mode from string
    pub fn parse(mode_str: &str) -> Result<Self, DomainError> {
        match mode_str.trim().to_lowercase().as_str() {
            "lossless" | "copy" => Ok(CuttingMode::Lossless),
            "frame_accurate" | "frame-accurate" | "accurate" => Ok(CuttingMode::FrameAccurate),
            other => Err(DomainError::InvalidRange(format!(
                "unknown cutting mode '{}'. Valid modes: lossless, frame_accurate",
                other
            ))),
        }
    }
}

impl fmt::Display for CuttingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CuttingMode::Lossless => write!(f, "lossless"),
            CuttingMode::FrameAccurate => write!(f, "frame_accurate"),
        }
    }
}

/// Extraction strategy for one keep-segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentMode {
    /// Remux without decoding
    Copy,
    /// Decode and re-encode the video stream; other streams are remuxed
    Reencode,
}

impl fmt::Display for SegmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentMode::Copy => write!(f, "copy"),
            SegmentMode::Reencode => write!(f, "reencode"),
        }
    }
}

/// Contiguous source interval kept in the output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeepSegment {
    pub source_start: f64,
    pub source_end: f64,
    pub mode: SegmentMode,
}

impl KeepSegment {
    pub fn new(source_start: f64, source_end: f64, mode: SegmentMode) -> Self {
        Self {
            source_start,
            source_end,
            mode,
        }
    }

    pub fn copy(source_start: f64, source_end: f64) -> Self {
        Self::new(source_start, source_end, SegmentMode::Copy)
    }

    pub fn reencode(source_start: f64, source_end: f64) -> Self {
        Self::new(source_start, source_end, SegmentMode::Reencode)
    }

    pub fn duration(&self) -> f64 {
        self.source_end - self.source_start
    }
}

/// Facts about the source that the trim pipeline needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Container duration in seconds
    pub duration: f64,
    /// Frames per second of the primary video stream
    pub fps: f64,
    /// Keyframe timestamps of the primary video stream
    pub keyframes: KeyframeSet,
    /// Codec name of the primary video stream (ffprobe naming)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<String>,
    /// Container short name as reported by the prober
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(default)]
    pub audio_tracks: usize,
    #[serde(default)]
    pub subtitle_tracks: usize,
}

impl VideoInfo {
    pub fn new(duration: f64, fps: f64, keyframes: KeyframeSet) -> Self {
        Self {
            duration,
            fps,
            keyframes,
            video_codec: None,
            container: None,
            audio_tracks: 0,
            subtitle_tracks: 0,
        }
    }

    /// Check the facts planning depends on
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return Err(DomainError::ProbeUnavailable(format!(
                "unusable duration {}",
                self.duration
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
