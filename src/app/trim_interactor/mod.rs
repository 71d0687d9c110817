// Trim interactor - Admits trim requests and runs them as background jobs

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::inspect_interactor::InspectInteractor;
use crate::app::registry::JobRegistry;
use crate::domain::model::{JobId, JobState, TrimJob, TrimRequest};
use crate::engine::{CancelFlag, JobExecutor, PreparedJob, ProgressTracker};
use crate::error::{TrimError, TrimResult};
use crate::planner::SegmentPlan;
use crate::ports::ProgressChannel;
use crate::utils::path::same_file;

/// Running job as seen by the caller that started it
pub struct JobHandle {
    pub job_id: JobId,
    pub plan: SegmentPlan,
    cancel: CancelFlag,
    tracker: ProgressTracker,
    task: JoinHandle<TrimJob>,
}

impl JobHandle {
    /// Request cooperative cancellation
    pub fn cancel(&self) -> bool {
        self.cancel.cancel()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the terminal state
    pub async fn wait(self) -> TrimJob {
        match self.task.await {
            Ok(job) => job,
            Err(e) => {
                error!("Job {} supervisor failed: {}", self.job_id, e);
                self.tracker
                    .finish(JobState::Failed, &format!("Internal error: {}", e));
                self.tracker.snapshot()
            }
        }
    }
}

/// Interactor for the trim use case
pub struct TrimOrchestrator {
    inspector: Arc<InspectInteractor>,
    executor: Arc<JobExecutor>,
    registry: JobRegistry,
}

impl TrimOrchestrator {
    /// Create new trim orchestrator
    pub fn new(inspector: Arc<InspectInteractor>, executor: Arc<JobExecutor>, registry: JobRegistry) -> Self {
        Self {
            inspector,
            executor,
            registry,
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Validate `request`, plan it and start it on its own task.
    ///
    /// Every rejection happens here, before a job id is handed out; once this
    /// returns `Ok` the outcome arrives only through `channel`.
    pub async fn start(
        &self,
        session: &str,
        request: TrimRequest,
        channel: Arc<dyn ProgressChannel>,
    ) -> TrimResult<JobHandle> {
        let job_id = JobId::generate();
        let cancel = CancelFlag::new();
        let guard = self.registry.admit(session, job_id.clone(), cancel.clone())?;

        let prepared = self.prepare(request).await?;
        let plan = prepared.plan.clone();
        info!(
            "Starting job {} for session '{}': {} segment(s), {:.3}s kept",
            job_id,
            session,
            plan.segments.len(),
            plan.kept_duration()
        );

        let tracker = ProgressTracker::new(job_id.clone(), prepared.request.output_path.clone(), channel);
        // The session slot frees up the moment the terminal event is sent
        tracker.hold_until_finished(guard);
        let task = {
            let executor = Arc::clone(&self.executor);
            let tracker = tracker.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                let worker = {
                    let tracker = tracker.clone();
                    tokio::spawn(async move { executor.run(&prepared, &tracker, &cancel).await })
                };
                match worker.await {
                    Ok(job) => job,
                    Err(e) => {
                        // Panics end up here; the workspace was dropped during unwinding
                        error!("Job {} task failed: {}", tracker.job_id(), e);
                        tracker.finish(JobState::Failed, "Internal error while trimming; output left untouched");
                        tracker.snapshot()
                    }
                }
            })
        };

        Ok(JobHandle {
            job_id,
            plan,
            cancel,
            tracker,
            task,
        })
    }

    /// Cancel a job by id; false when no such job is active
    pub fn cancel(&self, job_id: &JobId) -> bool {
        let found = self.registry.cancel(job_id);
        if found {
            info!("Cancel requested for job {}", job_id);
        }
        found
    }

    async fn prepare(&self, request: TrimRequest) -> TrimResult<PreparedJob> {
        if !request.source_path.is_file() {
            return Err(TrimError::InputNotFound {
                path: request.source_path.clone(),
            });
        }
        // Trimming in place would destroy the source before it is read
        if same_file(&request.source_path, &request.output_path) {
            return Err(TrimError::OverwriteConflict {
                path: request.output_path.clone(),
            });
        }
        if request.output_path.exists() && !request.overwrite {
            return Err(TrimError::OverwriteConflict {
                path: request.output_path.clone(),
            });
        }

        let (info, plan) = self
            .inspector
            .plan(&request.source_path, &request.removal_ranges, request.cutting_mode)
            .await?;
        plan.ensure_executable()?;
        if plan.reencode_count() > 0 {
            self.executor
                .config()
                .encoder
                .ensure_reencodable(info.video_codec.as_deref())?;
        }
        Ok(PreparedJob {
            request,
            info,
            plan,
        })
    }
}
