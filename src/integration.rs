//! Job orchestration around the external collaborators.
//!
//! The video decoder and the person tracker are abstracted behind
//! [`VideoSource`] and [`TrackSource`]; [`AnalyticsPipeline`] drives them frame
//! by frame and feeds the geometry, density and analytics stages.

mod builder;
mod detector;
mod overlay;
mod pipeline;
mod progress;

pub use builder::TrackedBoxBuilder;
pub use detector::{Detection, TrackSource, TrackedBox, VideoSource};
pub use overlay::{FrameSink, OverlayRenderer, render_overlay};
pub use pipeline::{AnalyticsPipeline, JobSpec, Outcome, PartialOutput, PipelineOutput};
pub use progress::{
    CancelFlag, JobSnapshot, JobState, JobStatus, NoProgress, Progress, ProgressSink, Stage,
};
