//! Progress tracking for a running trim job
//!
//! The tracker owns the job record and is the only thing that emits events
//! for it, which is what keeps progress monotonic and the terminal event
//! unique. Extraction fills 0-95 weighted by segment duration; concatenation
//! and finalization use the fixed marks below.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::domain::model::{JobId, JobState, TrimJob};
use crate::ports::ProgressChannel;

/// Upper bound of the extraction phase
pub const EXTRACT_CEILING: u8 = 95;
/// Concatenation started
pub const CONCAT_MARK: u8 = 96;
/// Metadata copy started
pub const METADATA_MARK: u8 = 97;
/// Validation started
pub const VALIDATE_MARK: u8 = 98;
/// Atomic rename started
pub const COMMIT_MARK: u8 = 99;

/// Thread-safe progress tracker for one job
#[derive(Clone)]
pub struct ProgressTracker {
    inner: Arc<Mutex<TrackerInner>>,
    channel: Arc<dyn ProgressChannel>,
}

struct TrackerInner {
    job: TrimJob,
    /// Segment durations and the kept time before each one
    weights: Vec<f64>,
    offsets: Vec<f64>,
    total: f64,
    /// Released when the job reaches a terminal state, before its event is sent
    hold: Option<Box<dyn Send>>,
}

impl ProgressTracker {
    /// Create a new tracker for a queued job
    pub fn new(id: JobId, output_path: PathBuf, channel: Arc<dyn ProgressChannel>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TrackerInner {
                job: TrimJob::new(id, output_path),
                weights: Vec::new(),
                offsets: Vec::new(),
                total: 0.0,
                hold: None,
            })),
            channel,
        }
    }

    pub fn job_id(&self) -> JobId {
        self.with_inner(|inner| inner.job.id.clone())
    }

    /// Copy of the current job record
    pub fn snapshot(&self) -> TrimJob {
        self.with_inner(|inner| inner.job.clone())
    }

    /// Move Queued -> Running and emit the first event
    pub fn start(&self, message: &str) {
        let event = self.with_inner(|inner| {
            inner
                .job
                .transition(JobState::Running, message)
                .ok()
                .map(|_| inner.job.event())
        });
        if let Some(event) = event {
            self.channel.emit(&event);
        }
    }

    /// Keep `value` alive until the job finishes.
    ///
    /// It is dropped before the terminal event goes out, so whoever receives
    /// that event already sees the release.
    pub fn hold_until_finished(&self, value: impl Send + 'static) {
        self.with_inner(|inner| inner.hold = Some(Box::new(value)));
    }

    /// Set the segment durations used to weight extraction progress
    pub fn set_weights(&self, durations: &[f64]) {
        self.with_inner(|inner| {
            let mut offset = 0.0;
            inner.offsets = durations
                .iter()
                .map(|d| {
                    let start = offset;
                    offset += d.max(0.0);
                    start
                })
                .collect();
            inner.weights = durations.iter().map(|d| d.max(0.0)).collect();
            inner.total = offset;
        });
    }

    /// Report `done` seconds processed within segment `index`
    pub fn segment_progress(&self, index: usize, done: f64, message: &str) {
        let percent = self.with_inner(|inner| {
            if inner.total <= 0.0 {
                return 0;
            }
            let weight = inner.weights.get(index).copied().unwrap_or(0.0);
            let offset = inner.offsets.get(index).copied().unwrap_or(inner.total);
            let fraction = ((offset + done.clamp(0.0, weight)) / inner.total).clamp(0.0, 1.0);
            (fraction * EXTRACT_CEILING as f64).floor() as u8
        });
        self.report(percent, message);
    }

    /// Report an absolute percentage; lower or repeated values are dropped
    pub fn report(&self, percent: u8, message: &str) {
        let event = self.with_inner(|inner| {
            if inner.job.state != JobState::Running {
                return None;
            }
            if !inner.job.advance(percent.min(COMMIT_MARK)) {
                return None;
            }
            inner.job.message = message.to_string();
            Some(inner.job.event())
        });
        if let Some(event) = event {
            debug!("Job {} at {}%: {}", event.job_id, event.progress, event.message);
            self.channel.emit(&event);
        }
    }

    /// Enter a terminal state and emit its event. Only the first call has any effect.
    pub fn finish(&self, state: JobState, message: &str) -> bool {
        let event = self.with_inner(|inner| match inner.job.transition(state, message) {
            Ok(()) => {
                inner.hold.take();
                Some(inner.job.event())
            }
            Err(current) => {
                if current.is_terminal() {
                    warn!(
                        "Job {} already {}; ignoring {}",
                        inner.job.id, current, state
                    );
                }
                None
            }
        });
        match event {
            Some(event) => {
                self.channel.emit(&event);
                true
            }
            None => false,
        }
    }

    pub fn mark_cancel_requested(&self) {
        self.with_inner(|inner| inner.job.cancel_requested = true);
    }

    fn with_inner<T>(&self, f: impl FnOnce(&mut TrackerInner) -> T) -> T {
        // A poisoned lock only means a panic elsewhere; the record is still usable
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{JobStatus, ProgressEvent};

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<ProgressEvent>>,
    }

    impl ProgressChannel for Recorder {
        fn emit(&self, event: &ProgressEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    fn tracker() -> (ProgressTracker, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let tracker = ProgressTracker::new(
            JobId::from("job-1"),
            PathBuf::from("/tmp/out.mp4"),
            recorder.clone(),
        );
        (tracker, recorder)
    }

    fn progress_values(recorder: &Recorder) -> Vec<u8> {
        recorder.events.lock().unwrap().iter().map(|e| e.progress).collect()
    }

    #[test]
    fn test_segment_progress_is_duration_weighted() {
        let (tracker, recorder) = tracker();
        tracker.start("Starting");
        tracker.set_weights(&[10.0, 30.0]);

        tracker.segment_progress(0, 10.0, "segment 1");
        tracker.segment_progress(1, 15.0, "segment 2");
        tracker.segment_progress(1, 30.0, "segment 2");

        // 10/40 -> 23, 25/40 -> 59, 40/40 -> 95
        assert_eq!(progress_values(&recorder), vec![0, 23, 59, 95]);
    }

    #[test]
    fn test_progress_never_decreases_and_repeats_are_suppressed() {
        let (tracker, recorder) = tracker();
        tracker.start("Starting");
        tracker.report(10, "a");
        tracker.report(10, "b");
        tracker.report(5, "c");
        tracker.report(40, "d");

        assert_eq!(progress_values(&recorder), vec![0, 10, 40]);
    }

    #[test]
    fn test_processing_events_stay_below_100() {
        let (tracker, recorder) = tracker();
        tracker.start("Starting");
        tracker.report(100, "almost");
        assert_eq!(progress_values(&recorder), vec![0, COMMIT_MARK]);
    }

    #[test]
    fn test_only_first_terminal_event_is_emitted() {
        let (tracker, recorder) = tracker();
        tracker.start("Starting");
        assert!(tracker.finish(JobState::Completed, "done"));
        assert!(!tracker.finish(JobState::Failed, "late failure"));
        tracker.report(50, "late progress");

        let events = recorder.events.lock().unwrap();
        assert_eq!(events.len(), 2);
        let last = events.last().unwrap();
        assert_eq!(last.status, JobStatus::Completed);
        assert_eq!(last.progress, 100);
        assert_eq!(last.output_path, Some(PathBuf::from("/tmp/out.mp4")));
    }

    #[test]
    fn test_held_value_is_released_before_terminal_event() {
        struct Flag(Arc<Mutex<bool>>);
        impl Drop for Flag {
            fn drop(&mut self) {
                *self.0.lock().unwrap() = true;
            }
        }

        struct Checker {
            released: Arc<Mutex<bool>>,
            seen: Mutex<Vec<(JobStatus, bool)>>,
        }
        impl ProgressChannel for Checker {
            fn emit(&self, event: &ProgressEvent) {
                let released = *self.released.lock().unwrap();
                self.seen.lock().unwrap().push((event.status, released));
            }
        }

        let released = Arc::new(Mutex::new(false));
        let checker = Arc::new(Checker {
            released: released.clone(),
            seen: Mutex::new(Vec::new()),
        });
        let tracker = ProgressTracker::new(JobId::from("job-2"), PathBuf::from("/tmp/o.mp4"), checker.clone());
        tracker.hold_until_finished(Flag(released.clone()));

        tracker.start("Starting");
        tracker.report(50, "half");
        tracker.finish(JobState::Failed, "boom");

        assert_eq!(
            *checker.seen.lock().unwrap(),
            vec![
                (JobStatus::Processing, false),
                (JobStatus::Processing, false),
                (JobStatus::Error, true),
            ]
        );
    }

    #[test]
    fn test_queued_job_can_be_cancelled_before_start() {
        let (tracker, recorder) = tracker();
        tracker.mark_cancel_requested();
        assert!(tracker.finish(JobState::Cancelled, "Cancelled"));

        let events = recorder.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status, JobStatus::Cancelled);
        assert!(events[0].output_path.is_none());
        assert!(tracker.snapshot().cancel_requested);
    }
}
