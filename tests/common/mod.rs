//! Test doubles shared by the integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::Notify;

use cttc::app::{AppContainer, DefaultAppContainer, TrimOrchestrator};
use cttc::config::AppConfig;
use cttc::engine::CancelFlag;
use cttc::ports::{
    ExecError, ExecutePort, ProbePort, ProgressChannel, SegmentTask, StepProgress,
};
use cttc::{DomainError, JobStatus, KeyframeSet, ProgressEvent, TimeRange, TrimRequest, VideoInfo};

/// Probe returning fixed facts for every path
pub struct FakeProbe {
    pub info: VideoInfo,
    /// Duration reported for written outputs
    pub output_duration: f64,
    /// Number of output validations seen
    pub validations: AtomicUsize,
}

impl FakeProbe {
    /// 120s at 30fps with a keyframe every `gop` seconds from 0
    pub fn with_gop(gop: f64) -> Self {
        let mut info = VideoInfo::new(120.0, 30.0, KeyframeSet::every(gop, 0.0, 120.0));
        info.video_codec = Some("h264".to_string());
        Self {
            info,
            output_duration: 60.0,
            validations: AtomicUsize::new(0),
        }
    }

    pub fn with_codec(gop: f64, codec: &str) -> Self {
        let mut probe = Self::with_gop(gop);
        probe.info.video_codec = Some(codec.to_string());
        probe
    }

    pub fn validations(&self) -> usize {
        self.validations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProbePort for FakeProbe {
    async fn probe(&self, _path: &Path) -> Result<VideoInfo, DomainError> {
        Ok(self.info.clone())
    }

    async fn probe_duration(&self, _path: &Path) -> Result<f64, DomainError> {
        self.validations.fetch_add(1, Ordering::SeqCst);
        Ok(self.output_duration)
    }
}

/// Execution backend that writes small text files instead of media
#[derive(Default)]
pub struct FakeExec {
    /// Extraction of this segment index fails
    pub fail_at: Option<usize>,
    /// Extraction of this segment index waits for cancellation
    pub block_at: Option<usize>,
    /// The metadata step waits for cancellation
    pub block_in_metadata: bool,
    /// The metadata step raises the cancel flag and then succeeds
    pub cancel_in_metadata: bool,
    /// Notified once the blocking step has started
    pub blocked: Notify,
    pub calls: Mutex<Vec<String>>,
    /// Encoder handed to each extraction, by segment index
    pub encoders: Mutex<Vec<(usize, Option<String>)>>,
}

impl FakeExec {
    pub fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::default()
        }
    }

    pub fn blocking_at(index: usize) -> Self {
        Self {
            block_at: Some(index),
            ..Self::default()
        }
    }

    pub fn blocking_in_metadata() -> Self {
        Self {
            block_in_metadata: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn encoders(&self) -> Vec<(usize, Option<String>)> {
        self.encoders.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ExecutePort for FakeExec {
    async fn extract_segment(
        &self,
        task: &SegmentTask,
        cancel: &CancelFlag,
        progress: StepProgress<'_>,
    ) -> Result<(), ExecError> {
        let segment = task.segment;
        self.record(format!(
            "extract {} {}-{} {}",
            task.index, segment.source_start, segment.source_end, segment.mode
        ));
        self.encoders
            .lock()
            .unwrap()
            .push((task.index, task.encoder.as_ref().map(|e| e.name.clone())));
        progress(segment.duration() / 2.0);

        if self.block_at == Some(task.index) {
            self.blocked.notify_one();
            cancel.cancelled().await;
            return Err(ExecError::Cancelled);
        }
        if self.fail_at == Some(task.index) {
            return Err(ExecError::Failed {
                program: "ffmpeg".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "Invalid data found when processing input".to_string(),
            });
        }

        fs::write(
            &task.destination,
            format!("[{}-{}]", segment.source_start, segment.source_end),
        )?;
        progress(segment.duration());
        Ok(())
    }

    async fn concat(
        &self,
        parts: &[PathBuf],
        destination: &Path,
        _faststart: bool,
        cancel: &CancelFlag,
    ) -> Result<(), ExecError> {
        self.record(format!("concat {}", parts.len()));
        if cancel.is_cancelled() {
            return Err(ExecError::Cancelled);
        }
        let mut joined = Vec::new();
        for part in parts {
            joined.extend(fs::read(part)?);
        }
        fs::write(destination, joined)?;
        Ok(())
    }

    async fn copy_metadata(
        &self,
        _source: &Path,
        media: &Path,
        destination: &Path,
        cancel: &CancelFlag,
    ) -> Result<(), ExecError> {
        self.record("metadata".to_string());
        if self.block_in_metadata {
            self.blocked.notify_one();
            cancel.cancelled().await;
            return Err(ExecError::Cancelled);
        }
        if self.cancel_in_metadata {
            cancel.cancel();
        }
        fs::copy(media, destination)?;
        Ok(())
    }

    async fn supports_encoder(&self, _name: &str) -> bool {
        false
    }
}

/// Channel keeping every event in order
#[derive(Default)]
pub struct Recorder {
    events: Mutex<Vec<ProgressEvent>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn terminal(&self) -> Vec<ProgressEvent> {
        self.events().into_iter().filter(|e| e.is_terminal()).collect()
    }

    pub fn processing_progress(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter(|e| e.status == JobStatus::Processing)
            .map(|e| e.progress)
            .collect()
    }
}

impl ProgressChannel for Recorder {
    fn emit(&self, event: &ProgressEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Temporary directory holding a stand-in source file
pub struct Fixture {
    pub dir: TempDir,
    pub source: PathBuf,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.mp4");
        fs::write(&source, b"not really a video").unwrap();
        Self { dir, source }
    }

    pub fn output(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn request(&self, output: &str, ranges: &[(f64, f64)]) -> TrimRequest {
        TrimRequest {
            source_path: self.source.clone(),
            output_path: self.output(output),
            removal_ranges: ranges.iter().map(|&(s, e)| TimeRange::new(s, e)).collect(),
            cutting_mode: Default::default(),
            overwrite: false,
        }
    }

    /// Names of leftover job workspaces
    pub fn workspaces(&self) -> Vec<String> {
        fs::read_dir(self.dir.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with(".cttc_trim_"))
            .collect()
    }
}

pub fn orchestrator(probe: Arc<FakeProbe>, exec: Arc<FakeExec>) -> Arc<TrimOrchestrator> {
    DefaultAppContainer::with_ports(&AppConfig::default(), probe, exec).trim_orchestrator()
}
