// Trim job lifecycle and the wire shapes that describe it

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CuttingMode, TimeRange};

/// Opaque job identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle state of a trim job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Cancelled
        )
    }

    /// Allowed edges: Queued -> Running -> {Completed, Failed, Cancelled}.
    /// A queued job may also fail or be cancelled before it runs.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        match (self, next) {
            (JobState::Queued, JobState::Running) => true,
            (JobState::Queued, JobState::Failed | JobState::Cancelled) => true,
            (JobState::Running, next) => next.is_terminal(),
            _ => false,
        }
    }

    /// Wire status for this state
    pub fn status(&self) -> JobStatus {
        match self {
            JobState::Queued | JobState::Running => JobStatus::Processing,
            JobState::Completed => JobStatus::Completed,
            JobState::Failed => JobStatus::Error,
            JobState::Cancelled => JobStatus::Cancelled,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Queued => "queued",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Status field of a progress event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Completed,
    Error,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Processing)
    }
}

/// Progress event delivered to the consumer of a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub job_id: JobId,
    pub status: JobStatus,
    /// 0-100, non-decreasing until the terminal event
    pub progress: u8,
    pub message: String,
    /// Present on `completed` only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
}

impl ProgressEvent {
    pub fn processing(job_id: JobId, progress: u8, message: impl Into<String>) -> Self {
        Self {
            job_id,
            status: JobStatus::Processing,
            progress: progress.min(100),
            message: message.into(),
            output_path: None,
        }
    }

    /// Error event for a request that never became a job
    pub fn rejected(job_id: Option<JobId>, message: impl Into<String>) -> Self {
        Self {
            job_id: job_id.unwrap_or_else(|| JobId(String::new())),
            status: JobStatus::Error,
            progress: 0,
            message: message.into(),
            output_path: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Request to remove ranges from a source and write the result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrimRequest {
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    pub removal_ranges: Vec<TimeRange>,
    #[serde(default)]
    pub cutting_mode: CuttingMode,
    #[serde(default)]
    pub overwrite: bool,
}

/// A single trim job and its observable state
#[derive(Debug, Clone, Serialize)]
pub struct TrimJob {
    pub id: JobId,
    pub state: JobState,
    pub progress: u8,
    pub message: String,
    pub output_path: PathBuf,
    pub cancel_requested: bool,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl TrimJob {
    pub fn new(id: JobId, output_path: PathBuf) -> Self {
        Self {
            id,
            state: JobState::Queued,
            progress: 0,
            message: "Queued".to_string(),
            output_path,
            cancel_requested: false,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Move to `next`, refusing edges the lifecycle does not allow
    pub fn transition(&mut self, next: JobState, message: impl Into<String>) -> Result<(), JobState> {
        if !self.state.can_transition_to(next) {
            return Err(self.state);
        }
        self.state = next;
        self.message = message.into();
        if next.is_terminal() {
            self.finished_at = Some(Utc::now());
            if next == JobState::Completed {
                self.progress = 100;
            }
        }
        Ok(())
    }

    /// Record progress; values below the current one are ignored
    pub fn advance(&mut self, progress: u8) -> bool {
        let progress = progress.min(100);
        if progress > self.progress {
            self.progress = progress;
            true
        } else {
            false
        }
    }

    /// Event describing the current state
    pub fn event(&self) -> ProgressEvent {
        ProgressEvent {
            job_id: self.id.clone(),
            status: self.state.status(),
            progress: self.progress,
            message: self.message.clone(),
            output_path: (self.state == JobState::Completed).then(|| self.output_path.clone()),
        }
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at.unwrap_or_else(Utc::now) - self.created_at
    }
}
