use std::sync::Mutex;

use chrono::{NaiveDate, NaiveDateTime};
use footfall_rs::analytics::DashboardSummary;
use footfall_rs::integration::{NoProgress, Progress, Stage, TrackedBoxBuilder};
use footfall_rs::{
    AnalyticsPipeline, Calibration, CancelFlag, Error, JobSpec, JobState, JobStatus, Outcome,
    ProgressSink, TrackSource, TrackedBox, VideoSource,
};
use image::{Rgb, RgbImage};

/// Stand-in decoder: frames are just their own index.
struct MockVideo {
    frames: u64,
    next: u64,
    fps: f64,
}

impl MockVideo {
    fn new(frames: u64, fps: f64) -> Self {
        Self {
            frames,
            next: 0,
            fps,
        }
    }
}

impl VideoSource for MockVideo {
    type Frame = u64;
    type Error = std::io::Error;

    fn frame_count(&self) -> u64 {
        self.frames
    }

    fn fps(&self) -> f64 {
        self.fps
    }

    fn next_frame(&mut self) -> Result<Option<u64>, Self::Error> {
        if self.next >= self.frames {
            return Ok(None);
        }
        self.next += 1;
        Ok(Some(self.next - 1))
    }
}

/// Returns a scripted set of boxes per frame.
struct MockTracker<F: FnMut(u64) -> Vec<TrackedBox>> {
    script: F,
}

impl<F: FnMut(u64) -> Vec<TrackedBox>> MockTracker<F> {
    fn new(script: F) -> Self {
        Self { script }
    }
}

impl<F: FnMut(u64) -> Vec<TrackedBox>> TrackSource<u64> for MockTracker<F> {
    type Error = std::io::Error;

    fn track(&mut self, frame: &u64) -> Result<Vec<TrackedBox>, Self::Error> {
        Ok((self.script)(*frame))
    }
}

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

/// 640x480 camera mapped straight onto a 500x500 floorplan.
fn job() -> JobSpec {
    JobSpec {
        floorplan: RgbImage::from_pixel(500, 500, Rgb([240, 240, 240])),
        calibration: Calibration::from_points([
            (0.0, 479.0),
            (639.0, 479.0),
            (639.0, 0.0),
            (0.0, 0.0),
        ]),
        video_start: start(),
    }
}

fn person_at_center(id: u64) -> TrackedBox {
    TrackedBoxBuilder::new(id)
        .xywh(320.0, 240.0, 60.0, 160.0)
        .confidence(0.9)
        .build()
}

#[test]
fn test_single_stationary_visitor() {
    let mut tracker = MockTracker::new(|_| vec![person_at_center(1)]);
    let outcome = AnalyticsPipeline::with_default_config()
        .run(
            &mut MockVideo::new(90, 30.0),
            &mut tracker,
            job(),
            &NoProgress,
            &CancelFlag::new(),
        )
        .unwrap();

    let output = outcome.completed().expect("job should complete");
    let record = &output.record;
    assert_eq!(record.frames_processed, 90);
    assert_eq!(record.total_visitors(), 1);
    assert!((record.average_dwell_time() - 3.0).abs() < 1e-9);
    assert_eq!(record.tracks.occupancy.len(), 90);
    assert!(record.tracks.occupancy.iter().all(|s| s.count == 1));

    let zones = &record.zones.popular_zones;
    assert_eq!(zones.len(), 5);
    assert_eq!((zones[0].row, zones[0].col), (2, 2));
    assert!(zones[0].intensity > 10 * zones[1].intensity);
    assert!(record.zones.total_visitors_from_density > 0);

    assert_eq!(output.heatmap.overlay.dimensions(), (500, 500));
    assert_eq!(output.heatmap.grayscale.dimensions(), (500, 500));
    assert_eq!(output.detections.len(), 90);
}

#[test]
fn test_empty_video_is_a_valid_result() {
    let mut tracker = MockTracker::new(|_| vec![]);
    let outcome = AnalyticsPipeline::with_default_config()
        .run(
            &mut MockVideo::new(60, 30.0),
            &mut tracker,
            job(),
            &NoProgress,
            &CancelFlag::new(),
        )
        .unwrap();

    let record = outcome.completed().unwrap().record;
    assert_eq!(record.total_visitors(), 0);
    assert!(record.tracks.visitor_counts.is_empty());
    assert_eq!(record.average_dwell_time(), 0.0);
    assert_eq!(record.zones.total_visitors_from_density, 0);
    assert!(record.zones.popular_zones.iter().all(|z| z.intensity == 0));
    assert!(
        record
            .tracks
            .peak_hour_per_weekday
            .iter()
            .all(|p| p.peak_hour.is_none())
    );
}

#[test]
fn test_cancellation_keeps_processed_frames_only() {
    let cancel = CancelFlag::new();
    let trigger = cancel.clone();
    let mut tracker = MockTracker::new(move |frame| {
        if frame == 50 {
            trigger.cancel();
        }
        vec![person_at_center(1)]
    });

    let outcome = AnalyticsPipeline::with_default_config()
        .run(
            &mut MockVideo::new(90, 30.0),
            &mut tracker,
            job(),
            &NoProgress,
            &cancel,
        )
        .unwrap();

    assert!(!outcome.is_completed());
    let Outcome::Cancelled(partial) = outcome else {
        unreachable!();
    };
    assert_eq!(partial.frames_processed, 51);
    assert_eq!(partial.stats.frames_observed, 51);
    assert_eq!(partial.stats.occupancy.last().unwrap().frame_index, 50);
    assert_eq!(partial.detections.len(), 51);
    assert!((partial.stats.average_dwell_time - 51.0 / 30.0).abs() < 1e-9);
}

#[test]
fn test_visitors_bound_occupancy() {
    // Ids 1..=3 overlap, 4 arrives after 1 has left.
    let mut tracker = MockTracker::new(|frame| {
        let mut boxes = Vec::new();
        if frame < 40 {
            boxes.push(person_at_center(1));
        }
        if (10..70).contains(&frame) {
            boxes.push(TrackedBoxBuilder::new(2).tlbr(50.0, 50.0, 120.0, 200.0).build());
        }
        if (20..30).contains(&frame) {
            boxes.push(TrackedBoxBuilder::new(3).tlbr(400.0, 100.0, 460.0, 300.0).build());
        }
        if frame >= 50 {
            boxes.push(TrackedBoxBuilder::new(4).tlbr(500.0, 300.0, 560.0, 470.0).build());
        }
        boxes.push(
            TrackedBoxBuilder::new(99)
                .tlbr(0.0, 0.0, 10.0, 10.0)
                .tentative()
                .build(),
        );
        boxes
    });
    let record = AnalyticsPipeline::with_default_config()
        .run(
            &mut MockVideo::new(90, 30.0),
            &mut tracker,
            job(),
            &NoProgress,
            &CancelFlag::new(),
        )
        .unwrap()
        .completed()
        .unwrap()
        .record;

    assert_eq!(record.total_visitors(), 4);
    assert_eq!(record.tracks.max_occupancy(), 3);
    assert!(record.total_visitors() >= record.tracks.max_occupancy());
    assert_eq!(record.tracks.unique_track_ids, vec![1, 2, 3, 4]);
    // id 3 lives 10 frames (0.33 s) and is filtered out of dwell statistics
    let dwell_ids: Vec<u64> = record.tracks.dwell_times.iter().map(|d| d.track_id).collect();
    assert_eq!(dwell_ids, vec![1, 2, 4]);
    assert_eq!(record.tracks.visitor_counts.daily[0].period, "2024-03-15");
    assert_eq!(record.tracks.visitor_counts.daily[0].count, 4);
}

#[test]
fn test_failures_are_typed() {
    let err = AnalyticsPipeline::with_default_config()
        .run(
            &mut MockVideo::new(0, 30.0),
            &mut MockTracker::new(|_| vec![]),
            job(),
            &NoProgress,
            &CancelFlag::new(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::InvalidVideo { .. }));

    let mut bad = job();
    bad.calibration =
        Calibration::from_points([(10.0, 10.0), (20.0, 20.0), (30.0, 30.0), (40.0, 40.0)]);
    let err = AnalyticsPipeline::with_default_config()
        .run(
            &mut MockVideo::new(30, 30.0),
            &mut MockTracker::new(|_| vec![]),
            bad,
            &NoProgress,
            &CancelFlag::new(),
        )
        .unwrap_err();
    assert!(matches!(err, Error::DegenerateGeometry { .. }));
    assert!(err.to_string().contains("recalibrate"));
}

#[derive(Default)]
struct CountingSink {
    updates: Mutex<Vec<Progress>>,
}

impl ProgressSink for CountingSink {
    fn on_progress(&self, progress: Progress) {
        self.updates.lock().unwrap().push(progress);
    }
}

#[test]
fn test_progress_is_rate_limited_and_monotonic() {
    let sink = CountingSink::default();
    let mut tracker = MockTracker::new(|_| vec![person_at_center(1), person_at_center(2)]);
    AnalyticsPipeline::with_default_config()
        .run(
            &mut MockVideo::new(200, 25.0),
            &mut tracker,
            job(),
            &sink,
            &CancelFlag::new(),
        )
        .unwrap();

    let updates = sink.updates.lock().unwrap();
    let detection: Vec<_> = updates.iter().filter(|p| p.stage == Stage::Detection).collect();
    let heatmap: Vec<_> = updates.iter().filter(|p| p.stage == Stage::Heatmap).collect();
    assert_eq!(detection.len(), 20);
    assert_eq!(heatmap.len(), 20);
    assert!(detection.windows(2).all(|w| w[0].done < w[1].done));
    assert_eq!(detection.last().unwrap().fraction(), 1.0);
    assert_eq!(heatmap.last().unwrap().fraction(), 1.0);
}

#[test]
fn test_job_status_reflects_outcome() {
    let status = JobStatus::new();
    assert_eq!(status.snapshot().state, JobState::Pending);
    status.mark_processing();

    let result = AnalyticsPipeline::with_default_config().run(
        &mut MockVideo::new(45, 30.0),
        &mut MockTracker::new(|_| vec![person_at_center(7)]),
        job(),
        &status,
        &CancelFlag::new(),
    );
    status.finish(&result);

    let snap = status.snapshot();
    assert_eq!(snap.state, JobState::Completed);
    assert_eq!(snap.fraction, 1.0);
    assert!(status.latest_preview().is_some());
}

#[test]
fn test_dashboard_over_two_videos() {
    let run = |frames: u64, start: NaiveDateTime| {
        let mut spec = job();
        spec.video_start = start;
        AnalyticsPipeline::with_default_config()
            .run(
                &mut MockVideo::new(frames, 30.0),
                &mut MockTracker::new(|_| vec![person_at_center(1)]),
                spec,
                &NoProgress,
                &CancelFlag::new(),
            )
            .unwrap()
            .completed()
            .unwrap()
            .record
    };
    let first = run(60, start());
    let second = run(120, start() + chrono::Duration::days(1));

    let summary = DashboardSummary::from_records([&first, &second]);
    assert_eq!(summary.processed_videos, 2);
    assert_eq!(summary.total_visitors, 2);
    assert_eq!(summary.visitor_counts.daily.len(), 2);
    assert!((summary.average_dwell_time - 3.0).abs() < 1e-9);
}
