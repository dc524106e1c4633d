//! # footfall-rs
//!
//! Retail footfall analytics from tracked people in a fixed-camera video.
//!
//! Per frame, confirmed track boxes from an external detector/tracker are
//! folded into visitor counts, occupancy and dwell times. The centers of
//! those boxes are mapped through a four-point homography onto a floorplan,
//! accumulated into a density field and rendered as a heatmap, which in turn is
//! ranked into popular zones.
//!
//! ```ignore
//! use footfall_rs::{AnalyticsPipeline, CancelFlag, JobSpec, JobStatus, Outcome};
//!
//! let pipeline = AnalyticsPipeline::with_default_config();
//! let status = JobStatus::new();
//! status.mark_processing();
//! let result = pipeline.run(&mut video, &mut tracker, job, &status, &CancelFlag::new());
//! status.finish(&result);
//! if let Outcome::Completed(output) = result? {
//!     println!("{}", output.record.to_json_pretty()?);
//! }
//! ```

pub mod analytics;
pub mod config;
pub mod density;
pub mod error;
pub mod geometry;
pub mod integration;

pub use analytics::{
    AnalyticsRecord, DashboardSummary, TrackAggregator, TrackStats, ZoneAnalyzer, ZoneReport,
};
pub use config::PipelineConfig;
pub use density::{DensityAccumulator, RenderedHeatmap};
pub use error::{Error, Result};
pub use geometry::{Calibration, CoordinateMapper, FloorPoint, Rect};
pub use integration::{
    AnalyticsPipeline, CancelFlag, Detection, JobSpec, JobState, JobStatus, Outcome, ProgressSink,
    TrackSource, TrackedBox, VideoSource,
};
