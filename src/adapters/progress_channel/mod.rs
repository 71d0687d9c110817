//! Progress channel adapters: JSON lines, console rendering and in-process mpsc

use std::io::Write;
use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::warn;

use crate::domain::model::{JobStatus, ProgressEvent};
use crate::ports::ProgressChannel;

/// One JSON object per line on any writer, stdout by default
pub struct JsonLinesChannel {
    out: Mutex<Box<dyn Write + Send>>,
}

impl JsonLinesChannel {
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }
}

impl ProgressChannel for JsonLinesChannel {
    fn emit(&self, event: &ProgressEvent) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                warn!("Could not serialize progress event: {}", e);
                return;
            }
        };
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writeln!(out, "{}", line).and_then(|_| out.flush()) {
            warn!("Could not write progress event: {}", e);
        }
    }
}

/// Human-readable progress for interactive use
pub struct ConsoleChannel {
    verbose: bool,
}

impl ConsoleChannel {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn render(&self, event: &ProgressEvent) -> Option<String> {
        match event.status {
            JobStatus::Processing => {
                let bar_length = 20;
                let filled = (event.progress as usize * bar_length / 100).min(bar_length);
                let bar = "#".repeat(filled) + &"-".repeat(bar_length - filled);
                Some(format!("[{}] {:>3}% {}", bar, event.progress, event.message))
            }
            JobStatus::Completed => Some(match &event.output_path {
                Some(path) if self.verbose => {
                    format!("Completed: {} ({})", event.message, path.display())
                }
                _ => format!("Completed: {}", event.message),
            }),
            JobStatus::Error => Some(format!("Error: {}", event.message)),
            JobStatus::Cancelled => Some(format!("Cancelled: {}", event.message)),
        }
    }
}

impl ProgressChannel for ConsoleChannel {
    fn emit(&self, event: &ProgressEvent) {
        if let Some(line) = self.render(event) {
            if event.is_terminal() {
                eprintln!("{}", line);
            } else {
                eprint!("\r{}", line);
                if event.progress >= 99 {
                    eprintln!();
                }
            }
        }
    }
}

/// Forwards events into a tokio channel; a closed receiver drops them
pub struct MpscChannel {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl MpscChannel {
    pub fn new(tx: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self { tx }
    }

    /// Channel plus the receiving end
    pub fn pair() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl ProgressChannel for MpscChannel {
    fn emit(&self, event: &ProgressEvent) {
        if self.tx.send(event.clone()).is_err() {
            tracing::debug!("Progress receiver gone; dropping event for {}", event.job_id);
        }
    }
}
