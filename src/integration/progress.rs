//! Progress reporting, job status and cooperative cancellation.
//!
//! The worker pushes [`Progress`] updates into a [`ProgressSink`]. [`JobStatus`]
//! is a sink whose latest state can be polled from another thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::integration::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// Frame-by-frame detection and tracking.
    Detection,
    /// Projecting detections and accumulating the density field.
    Heatmap,
}

impl Stage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Detection => "Person detection",
            Self::Heatmap => "Heatmap generation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub stage: Stage,
    pub done: u64,
    pub total: u64,
}

impl Progress {
    /// Completed fraction in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.done as f64 / self.total as f64).min(1.0)
    }
}

/// Receiver of progress updates from a running job.
///
/// Implementations must tolerate being called from a worker thread while
/// other threads read their state.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, progress: Progress);

    /// Whether partial heatmap renders should be produced for this sink.
    /// Previews are skipped entirely unless a sink opts in.
    fn wants_preview(&self) -> bool {
        false
    }

    /// A non-authoritative render of the partially accumulated heatmap.
    fn on_preview(&self, _stage: Stage, _preview: &RgbImage) {}
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&self, _progress: Progress) {}
}

/// Shared cancellation request, checked by the worker between frames.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Pending,
    Processing,
    Completed,
    Cancelled,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub state: JobState,
    pub message: String,
    pub stage: Option<Stage>,
    pub fraction: f64,
}

#[derive(Debug)]
struct StatusInner {
    snapshot: JobSnapshot,
    preview: Option<RgbImage>,
}

/// Pollable status of one job. Clones share the same state.
#[derive(Debug, Clone)]
pub struct JobStatus {
    inner: Arc<Mutex<StatusInner>>,
}

impl Default for JobStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl JobStatus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StatusInner {
                snapshot: JobSnapshot {
                    state: JobState::Pending,
                    message: "Job submitted for processing.".to_string(),
                    stage: None,
                    fraction: 0.0,
                },
                preview: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StatusInner> {
        // a panicked writer leaves a snapshot that is still readable
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> JobSnapshot {
        self.lock().snapshot.clone()
    }

    /// Most recent preview render, if any.
    pub fn latest_preview(&self) -> Option<RgbImage> {
        self.lock().preview.clone()
    }

    pub fn mark_processing(&self) {
        self.set(JobState::Processing, "Starting video processing...".to_string());
    }

    /// Record how a job run ended.
    pub fn finish(&self, result: &Result<Outcome>) {
        match result {
            Ok(Outcome::Completed(_)) => {
                let mut inner = self.lock();
                inner.snapshot.state = JobState::Completed;
                inner.snapshot.message = "Processing completed successfully".to_string();
                inner.snapshot.fraction = 1.0;
            }
            Ok(Outcome::Cancelled(_)) => {
                self.set(JobState::Cancelled, "Job was cancelled by user.".to_string())
            }
            Err(err) => self.fail(err),
        }
    }

    pub fn fail(&self, err: &Error) {
        self.set(JobState::Failed, format!("Error during processing: {err}"));
    }

    fn set(&self, state: JobState, message: String) {
        let mut inner = self.lock();
        inner.snapshot.state = state;
        inner.snapshot.message = message;
    }
}

impl ProgressSink for JobStatus {
    fn on_progress(&self, progress: Progress) {
        let fraction = progress.fraction();
        let mut inner = self.lock();
        inner.snapshot.state = JobState::Processing;
        inner.snapshot.stage = Some(progress.stage);
        inner.snapshot.fraction = fraction;
        inner.snapshot.message = format!("{} ({}%)", progress.stage.label(), (fraction * 100.0) as u32);
    }

    fn wants_preview(&self) -> bool {
        true
    }

    fn on_preview(&self, _stage: Stage, preview: &RgbImage) {
        self.lock().preview = Some(preview.clone());
    }
}
