//! Job executor: runs a segment plan into a validated, atomically committed output

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::domain::model::{JobState, SegmentMode, TrimJob, TrimRequest, VideoInfo};
use crate::engine::cancel::CancelFlag;
use crate::engine::progress::{
    ProgressTracker, COMMIT_MARK, CONCAT_MARK, METADATA_MARK, VALIDATE_MARK,
};
use crate::engine::workspace::{parent_dir, sweep_stale, Workspace};
use crate::engine::{ExecutorConfig, NVENC_H264};
use crate::error::{TrimError, TrimResult};
use crate::planner::SegmentPlan;
use crate::ports::{ExecError, ExecutePort, ProbePort, SegmentTask, VideoEncoder};

/// Everything a job needs, validated before it is admitted
#[derive(Debug, Clone)]
pub struct PreparedJob {
    pub request: TrimRequest,
    pub info: VideoInfo,
    pub plan: SegmentPlan,
}

/// Executes one prepared job at a time against the execution port
pub struct JobExecutor {
    probe: Arc<dyn ProbePort>,
    exec: Arc<dyn ExecutePort>,
    config: ExecutorConfig,
}

impl JobExecutor {
    /// Create a new job executor
    pub fn new(probe: Arc<dyn ProbePort>, exec: Arc<dyn ExecutePort>, config: ExecutorConfig) -> Self {
        Self {
            probe,
            exec,
            config,
        }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run `job` to a terminal state. Exactly one terminal event goes out through `tracker`.
    pub async fn run(&self, job: &PreparedJob, tracker: &ProgressTracker, cancel: &CancelFlag) -> TrimJob {
        let job_id = tracker.job_id();
        info!(
            "Job {}: {} -> {} ({} segment(s), {})",
            job_id,
            job.request.source_path.display(),
            job.request.output_path.display(),
            job.plan.segments.len(),
            job.plan.mode
        );
        tracker.start("Preparing workspace");

        match self.execute(job, tracker, cancel).await {
            Ok(()) => {
                info!("Job {} completed", job_id);
                tracker.finish(
                    JobState::Completed,
                    &format!("Trimmed video written to {}", job.request.output_path.display()),
                );
            }
            Err(e) if e.is_cancellation() => {
                tracker.mark_cancel_requested();
                info!("Job {} cancelled", job_id);
                tracker.finish(JobState::Cancelled, "Cancelled; output left untouched");
            }
            Err(e) => {
                error!("Job {} failed: {}", job_id, e);
                tracker.finish(JobState::Failed, &e.to_string());
            }
        }
        tracker.snapshot()
    }

    async fn execute(&self, job: &PreparedJob, tracker: &ProgressTracker, cancel: &CancelFlag) -> TrimResult<()> {
        let request = &job.request;
        job.plan.ensure_executable()?;
        check_cancel(cancel)?;

        let swept = sweep_stale(
            &parent_dir(&request.output_path),
            &self.config.temp_prefix,
            self.config.stale_after,
        );
        if swept > 0 {
            info!("Swept {} stale workspace(s)", swept);
        }
        let workspace = Workspace::create(&request.output_path, &self.config.temp_prefix)?;

        let result = self.execute_in(job, &workspace, tracker, cancel).await;
        if let Err(e) = workspace.close() {
            warn!("Could not remove workspace: {}", e);
        }
        result
    }

    async fn execute_in(
        &self,
        job: &PreparedJob,
        workspace: &Workspace,
        tracker: &ProgressTracker,
        cancel: &CancelFlag,
    ) -> TrimResult<()> {
        let request = &job.request;
        let segments = &job.plan.segments;
        let encoder = if job.plan.reencode_count() > 0 {
            let encoder = self.select_encoder(&job.info).await?;
            info!(
                "Re-encoding {} segment(s) ({:.3}s) with {}",
                job.plan.reencode_count(),
                job.plan.reencode_duration(),
                encoder.name
            );
            Some(encoder)
        } else {
            None
        };

        let durations: Vec<f64> = segments.iter().map(|s| s.duration()).collect();
        tracker.set_weights(&durations);

        let mut parts = Vec::with_capacity(segments.len());
        for (index, segment) in segments.iter().enumerate() {
            check_cancel(cancel)?;

            let task = SegmentTask {
                index,
                source: request.source_path.clone(),
                destination: workspace.segment_path(index),
                segment: *segment,
                encoder: match segment.mode {
                    SegmentMode::Reencode => encoder.clone(),
                    SegmentMode::Copy => None,
                },
            };
            let label = format!(
                "Extracting segment {}/{} ({})",
                index + 1,
                segments.len(),
                segment.mode
            );
            debug!(
                "{}: {:.3}s-{:.3}s",
                label, segment.source_start, segment.source_end
            );
            tracker.segment_progress(index, 0.0, &label);

            let on_progress = |done: f64| tracker.segment_progress(index, done, &label);
            self.exec
                .extract_segment(&task, cancel, &on_progress)
                .await
                .map_err(|e| match e {
                    ExecError::Cancelled => TrimError::CancellationRequested,
                    other => TrimError::SegmentExtractionFailure {
                        index,
                        message: other.to_string(),
                    },
                })?;
            tracker.segment_progress(index, segment.duration(), &label);
            parts.push(task.destination);
        }

        check_cancel(cancel)?;
        tracker.report(CONCAT_MARK, "Joining segments");
        let joined = workspace.joined_path();
        let faststart = self.config.faststart && supports_faststart(&request.output_path);
        self.exec
            .concat(&parts, &joined, faststart, cancel)
            .await
            .map_err(|e| match e {
                ExecError::Cancelled => TrimError::CancellationRequested,
                other => TrimError::ConcatFailure {
                    message: other.to_string(),
                },
            })?;

        check_cancel(cancel)?;
        tracker.report(METADATA_MARK, "Copying metadata");
        let with_metadata = workspace.output_path();
        let candidate = match self
            .exec
            .copy_metadata(&request.source_path, &joined, &with_metadata, cancel)
            .await
        {
            Ok(()) => with_metadata,
            Err(ExecError::Cancelled) => return Err(TrimError::CancellationRequested),
            Err(e) => {
                warn!("Metadata copy failed, keeping output without it: {}", e);
                joined
            }
        };

        check_cancel(cancel)?;
        tracker.report(VALIDATE_MARK, "Validating output");
        self.validate(&candidate).await?;

        check_cancel(cancel)?;
        tracker.report(COMMIT_MARK, "Finalizing output");
        commit(&candidate, &request.output_path, request.overwrite)
    }

    async fn select_encoder(&self, info: &VideoInfo) -> TrimResult<VideoEncoder> {
        let codec = info.video_codec.as_deref();
        let settings = &self.config.encoder;
        let nvenc = settings.wants_nvenc(codec) && self.exec.supports_encoder(NVENC_H264).await;
        settings.resolve(codec, nvenc)
    }

    /// The candidate must be non-empty and probe to a positive duration
    async fn validate(&self, candidate: &Path) -> TrimResult<()> {
        let size = fs::metadata(candidate)
            .map_err(|e| TrimError::OutputValidation {
                message: format!("{} is missing: {}", candidate.display(), e),
            })?
            .len();
        if size == 0 {
            return Err(TrimError::OutputValidation {
                message: "output file is empty".to_string(),
            });
        }

        let duration = self
            .probe
            .probe_duration(candidate)
            .await
            .map_err(|e| TrimError::OutputValidation {
                message: e.to_string(),
            })?;
        if !duration.is_finite() || duration <= 0.0 {
            return Err(TrimError::OutputValidation {
                message: format!("output has unusable duration {}", duration),
            });
        }
        debug!("Validated output: {} bytes, {:.3}s", size, duration);
        Ok(())
    }
}

fn check_cancel(cancel: &CancelFlag) -> TrimResult<()> {
    if cancel.is_cancelled() {
        Err(TrimError::CancellationRequested)
    } else {
        Ok(())
    }
}

/// Containers where `+faststart` applies
pub fn supports_faststart(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| matches!(ext.as_str(), "mp4" | "mov" | "m4v"))
}

/// Move `candidate` onto `destination` in one step.
///
/// Without `overwrite` a hard link is used so an existing destination is
/// detected atomically; the candidate itself goes away with the workspace.
pub fn commit(candidate: &Path, destination: &Path, overwrite: bool) -> TrimResult<()> {
    if overwrite {
        fs::rename(candidate, destination)?;
        return Ok(());
    }

    let conflict = || TrimError::OverwriteConflict {
        path: PathBuf::from(destination),
    };
    match fs::hard_link(candidate, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Err(conflict()),
        Err(e) => {
            debug!("Hard link unavailable ({}), falling back to rename", e);
            if destination.exists() {
                return Err(conflict());
            }
            fs::rename(candidate, destination)?;
            Ok(())
        }
    }
}
