// Ports - Interface definitions (contracts)

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::errors::DomainError;
use crate::domain::model::{KeepSegment, ProgressEvent, VideoInfo};
use crate::engine::cancel::CancelFlag;

/// Port for media file probing
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Probe duration, frame rate, stream layout and keyframe positions
    async fn probe(&self, path: &Path) -> Result<VideoInfo, DomainError>;

    /// Container duration only, for validating written files
    async fn probe_duration(&self, path: &Path) -> Result<f64, DomainError> {
        Ok(self.probe(path).await?.duration)
    }
}

/// Video encoder chosen for re-encoded segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoEncoder {
    /// ffmpeg encoder name, e.g. `libx264` or `h264_nvenc`
    pub name: String,
    pub preset: String,
    /// CRF for software encoders, CQ for NVENC
    pub quality: u8,
    /// 0 lets ffmpeg decide
    pub threads: usize,
}

impl VideoEncoder {
    pub fn is_hardware(&self) -> bool {
        self.name.ends_with("_nvenc")
    }
}

/// One kept segment to cut out of the source
#[derive(Debug, Clone)]
pub struct SegmentTask {
    /// Position in the plan, used in error messages
    pub index: usize,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub segment: KeepSegment,
    /// Set for re-encoded segments only
    pub encoder: Option<VideoEncoder>,
}

/// Failures reported by an execution backend
#[derive(Error, Debug)]
pub enum ExecError {
    /// The cancel flag was raised and the process was stopped
    #[error("cancelled")]
    Cancelled,

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Callback receiving seconds of media processed so far within one step
pub type StepProgress<'a> = &'a (dyn Fn(f64) + Send + Sync);

/// Port for the media operations a trim job is made of
#[async_trait]
pub trait ExecutePort: Send + Sync {
    /// Write one kept segment to `task.destination`, copying or re-encoding video
    async fn extract_segment(
        &self,
        task: &SegmentTask,
        cancel: &CancelFlag,
        progress: StepProgress<'_>,
    ) -> Result<(), ExecError>;

    /// Join `parts` in order into `destination`
    async fn concat(
        &self,
        parts: &[PathBuf],
        destination: &Path,
        faststart: bool,
        cancel: &CancelFlag,
    ) -> Result<(), ExecError>;

    /// Remux `media` into `destination` with container metadata and chapters from `source`
    async fn copy_metadata(
        &self,
        source: &Path,
        media: &Path,
        destination: &Path,
        cancel: &CancelFlag,
    ) -> Result<(), ExecError>;

    /// Check whether the backend can encode with `name`
    async fn supports_encoder(&self, name: &str) -> bool;
}

/// Boundary delivering job events to exactly one consumer
pub trait ProgressChannel: Send + Sync {
    fn emit(&self, event: &ProgressEvent);
}
