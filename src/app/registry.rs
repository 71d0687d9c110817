// Job registry - One active job per consumer session

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::domain::model::JobId;
use crate::engine::cancel::CancelFlag;
use crate::error::{TrimError, TrimResult};

/// Identifies one consumer of progress events
pub type SessionId = String;

#[derive(Debug, Clone)]
struct ActiveJob {
    job_id: JobId,
    cancel: CancelFlag,
}

/// Active jobs keyed by session
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    active: Arc<Mutex<HashMap<SessionId, ActiveJob>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the session's single slot, or fail with `JobAlreadyRunning`
    pub fn admit(&self, session: &str, job_id: JobId, cancel: CancelFlag) -> TrimResult<AdmissionGuard> {
        let mut active = self.lock();
        if let Some(existing) = active.get(session) {
            return Err(TrimError::JobAlreadyRunning {
                job_id: existing.job_id.to_string(),
            });
        }
        active.insert(
            session.to_string(),
            ActiveJob {
                job_id: job_id.clone(),
                cancel,
            },
        );
        debug!("Admitted job {} for session '{}'", job_id, session);
        Ok(AdmissionGuard {
            registry: self.clone(),
            session: session.to_string(),
            job_id,
        })
    }

    /// Job currently holding the session's slot
    pub fn active_job(&self, session: &str) -> Option<JobId> {
        self.lock().get(session).map(|job| job.job_id.clone())
    }

    /// Raise the cancel flag of `job_id`. Returns false for unknown or finished jobs.
    pub fn cancel(&self, job_id: &JobId) -> bool {
        let cancel = self
            .lock()
            .values()
            .find(|job| &job.job_id == job_id)
            .map(|job| job.cancel.clone());
        match cancel {
            Some(flag) => {
                flag.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel whatever the session is running
    pub fn cancel_session(&self, session: &str) -> Option<JobId> {
        let job = self.lock().get(session).cloned()?;
        job.cancel.cancel();
        Some(job.job_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, session: &str, job_id: &JobId) {
        let mut active = self.lock();
        if active.get(session).is_some_and(|job| &job.job_id == job_id) {
            active.remove(session);
            debug!("Released session '{}' from job {}", session, job_id);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SessionId, ActiveJob>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Holds a session slot; dropping it frees the slot on every exit path
#[derive(Debug)]
pub struct AdmissionGuard {
    registry: JobRegistry,
    session: SessionId,
    job_id: JobId,
}

impl AdmissionGuard {
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }
}

impl Drop for AdmissionGuard {
    fn drop(&mut self) {
        self.registry.release(&self.session, &self.job_id);
    }
}
