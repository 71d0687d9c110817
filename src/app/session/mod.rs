// Session - JSON-lines command loop for one remote consumer

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};

use crate::app::trim_interactor::{JobHandle, TrimOrchestrator};
use crate::domain::model::{JobId, ProgressEvent, TrimRequest};
use crate::error::TrimResult;
use crate::ports::ProgressChannel;

/// One line of input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SessionCommand {
    Trim(TrimRequest),
    Cancel { job_id: JobId },
}

/// Read commands from `input` until it closes, then cancel and await whatever is still running
pub async fn run_session<R>(
    orchestrator: Arc<TrimOrchestrator>,
    session: &str,
    input: R,
    channel: Arc<dyn ProgressChannel>,
) -> TrimResult<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut running: Vec<JobHandle> = Vec::new();
    info!("Session '{}' started", session);

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        running.retain(|handle| !handle.is_finished());

        match serde_json::from_str::<SessionCommand>(line) {
            Err(e) => {
                warn!("Malformed command: {}", e);
                channel.emit(&ProgressEvent::rejected(None, format!("Malformed command: {}", e)));
            }
            Ok(SessionCommand::Trim(request)) => {
                match orchestrator.start(session, request, Arc::clone(&channel)).await {
                    Ok(handle) => running.push(handle),
                    Err(e) => {
                        warn!("Trim request rejected: {}", e);
                        channel.emit(&ProgressEvent::rejected(None, e.to_string()));
                    }
                }
            }
            Ok(SessionCommand::Cancel { job_id }) => {
                if !orchestrator.cancel(&job_id) {
                    warn!("Cancel for unknown or finished job {}", job_id);
                }
            }
        }
    }

    if let Some(job_id) = orchestrator.registry().cancel_session(session) {
        info!("Input closed; cancelled running job {}", job_id);
    }
    for handle in running {
        let job = handle.wait().await;
        info!("Job {} ended as {}", job.id, job.state);
    }
    info!("Session '{}' closed", session);
    Ok(())
}
