//! AnalyticsPipeline: one video from frames to an analytics record.

use chrono::NaiveDateTime;
use image::RgbImage;
use tracing::{debug, info, warn};

use crate::analytics::{
    AnalyticsRecord, TrackAggregator, TrackStats, VideoClock, ZoneAnalyzer,
};
use crate::config::PipelineConfig;
use crate::density::{DensityAccumulator, RenderedHeatmap};
use crate::error::{Error, Result};
use crate::geometry::{Calibration, CoordinateMapper};
use crate::integration::{
    CancelFlag, Detection, Progress, ProgressSink, Stage, TrackSource, VideoSource,
};

/// Per-job inputs supplied by the orchestrator.
#[derive(Debug, Clone)]
pub struct JobSpec {
    /// Floorplan image the heatmap is drawn over; fixes the field resolution.
    pub floorplan: RgbImage,
    pub calibration: Calibration,
    /// Wall-clock time of the first frame; anchors every time bucket.
    pub video_start: NaiveDateTime,
}

/// Artifacts of a completed job.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub record: AnalyticsRecord,
    pub heatmap: RenderedHeatmap,
    /// Confirmed observations in frame order, kept for the overlay pass.
    pub detections: Vec<Detection>,
}

/// What a cancelled job had produced when it stopped.
#[derive(Debug, Clone)]
pub struct PartialOutput {
    pub frames_processed: u64,
    /// Statistics over the frames processed before cancellation only.
    pub stats: TrackStats,
    pub detections: Vec<Detection>,
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Completed(PipelineOutput),
    Cancelled(PartialOutput),
}

impl Outcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn completed(self) -> Option<PipelineOutput> {
        match self {
            Self::Completed(output) => Some(output),
            Self::Cancelled(_) => None,
        }
    }
}

/// Drives the external tracker over a video and aggregates the results.
///
/// Holds only configuration, so one pipeline can serve many jobs; each
/// [`run`](Self::run) owns its own aggregation state.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsPipeline {
    config: PipelineConfig,
}

impl AnalyticsPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn with_default_config() -> Self {
        Self::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process one video end to end.
    ///
    /// Frames are tracked strictly in order; a failure on any frame aborts the
    /// job. `cancel` is checked before every frame and every deposit, and a
    /// cancelled job returns [`Outcome::Cancelled`] rather than an error.
    pub fn run<V, T>(
        &self,
        video: &mut V,
        tracker: &mut T,
        job: JobSpec,
        progress: &dyn ProgressSink,
        cancel: &CancelFlag,
    ) -> Result<Outcome>
    where
        V: VideoSource,
        T: TrackSource<V::Frame>,
    {
        let total_frames = video.frame_count();
        if total_frames == 0 {
            return Err(Error::InvalidVideo {
                reason: "source reports zero frames".to_string(),
            });
        }
        let (width, height) = job.floorplan.dimensions();
        let mapper = CoordinateMapper::new(&job.calibration, width, height)?;
        let clock = VideoClock::new(job.video_start, video.fps());

        info!(
            frames = total_frames,
            fps = clock.fps(),
            floorplan_width = width,
            floorplan_height = height,
            "starting analytics job"
        );

        let mut aggregator = TrackAggregator::new(clock);
        let mut detections = Vec::new();
        let mut frame_index = 0u64;

        loop {
            if cancel.is_cancelled() {
                info!(frame_index, "job cancelled during detection");
                return Ok(Outcome::Cancelled(PartialOutput {
                    frames_processed: frame_index,
                    stats: aggregator.finalize(clock.fps()),
                    detections,
                }));
            }

            let frame = video.next_frame().map_err(|e| Error::Video {
                frame_index,
                source: Box::new(e),
            })?;
            let Some(frame) = frame else {
                break;
            };

            let tracks = tracker.track(&frame).map_err(|e| Error::Tracker {
                frame_index,
                source: Box::new(e),
            })?;

            let mut ids = Vec::with_capacity(tracks.len());
            for t in tracks.into_iter().filter(|t| t.confirmed) {
                if !t.bbox.is_valid() {
                    debug!(
                        frame_index,
                        track_id = t.track_id,
                        bbox = ?t.bbox,
                        "dropping malformed box"
                    );
                    continue;
                }
                ids.push(t.track_id);
                detections.push(Detection {
                    frame_index,
                    bbox: t.bbox,
                    track_id: t.track_id,
                    confidence: t.confidence,
                });
            }
            aggregator.observe(frame_index, ids)?;

            frame_index += 1;
            if frame_index % self.config.frame_report_interval == 0 {
                let update = Progress {
                    stage: Stage::Detection,
                    done: frame_index,
                    total: total_frames,
                };
                debug!(frame_index, total_frames, "detection progress");
                progress.on_progress(update);
            }
        }

        if frame_index == 0 {
            return Err(Error::InvalidVideo {
                reason: "no frames could be read".to_string(),
            });
        }
        if frame_index != total_frames {
            warn!(
                decoded = frame_index,
                reported = total_frames,
                "decoded frame count differs from container"
            );
        }

        let mut density = DensityAccumulator::new(job.floorplan, self.config.disc_radius);
        let total_detections = detections.len();
        let mut rejected = 0usize;
        let preview_every = self
            .config
            .preview_interval
            .filter(|_| progress.wants_preview());

        for (i, det) in detections.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(deposited = i, total_detections, "job cancelled during heatmap generation");
                return Ok(Outcome::Cancelled(PartialOutput {
                    frames_processed: frame_index,
                    stats: aggregator.finalize(clock.fps()),
                    detections,
                }));
            }

            let (cx, cy) = det.bbox.center();
            let painted = mapper
                .project((cx as f64, cy as f64))
                .is_some_and(|p| density.deposit(p));
            if !painted {
                rejected += 1;
                debug!(
                    frame_index = det.frame_index,
                    track_id = det.track_id,
                    "detection maps outside the floorplan"
                );
            }

            if let Some(every) = preview_every {
                if i > 0 && i % every == 0 {
                    progress.on_preview(Stage::Heatmap, &density.render().overlay);
                }
            }
            if (i + 1) % self.config.detection_report_interval == 0 {
                progress.on_progress(Progress {
                    stage: Stage::Heatmap,
                    done: (i + 1) as u64,
                    total: total_detections as u64,
                });
            }
        }

        let heatmap = density.render();
        let zones = ZoneAnalyzer::new(self.config.zone_grid, self.config.top_zones)
            .analyze(&heatmap.grayscale);
        let stats = aggregator.finalize(clock.fps());

        info!(
            frames = frame_index,
            visitors = stats.total_visitors,
            density_estimate = zones.total_visitors_from_density,
            average_dwell = stats.average_dwell_time,
            deposited = density.deposits(),
            rejected,
            "analytics job finished"
        );

        let record = AnalyticsRecord {
            video_start: job.video_start,
            fps: clock.fps(),
            frames_processed: frame_index,
            tracks: stats,
            zones,
        };

        Ok(Outcome::Completed(PipelineOutput {
            record,
            heatmap,
            detections,
        }))
    }
}
