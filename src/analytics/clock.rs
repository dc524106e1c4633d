use chrono::{Datelike, Duration, NaiveDateTime, Weekday};

/// Maps frame indices to wall-clock time for one video.
///
/// Every bucket key of a session derives from the same `start`, supplied by
/// the caller. A non-positive or non-finite frame rate pins every frame to
/// `start`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoClock {
    start: NaiveDateTime,
    fps: f64,
}

/// Time bucket keys for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketKeys {
    /// Whole hours elapsed since the start of the video.
    pub hour: u64,
    /// Calendar day, `YYYY-MM-DD`.
    pub day: String,
    /// ISO week, `YYYY-Www`.
    pub week: String,
    /// Calendar month, `YYYY-MM`.
    pub month: String,
    pub weekday: Weekday,
}

impl VideoClock {
    pub fn new(start: NaiveDateTime, fps: f64) -> Self {
        let fps = if fps.is_finite() && fps > 0.0 { fps } else { 0.0 };
        Self { start, fps }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Frame rate, or `0.0` when unavailable.
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Seconds from the start of the video to `frame_index`.
    pub fn seconds(&self, frame_index: u64) -> f64 {
        if self.fps > 0.0 {
            frame_index as f64 / self.fps
        } else {
            0.0
        }
    }

    pub fn timestamp(&self, frame_index: u64) -> NaiveDateTime {
        let micros = (self.seconds(frame_index) * 1e6) as i64;
        self.start
            .checked_add_signed(Duration::microseconds(micros))
            .unwrap_or(self.start)
    }

    pub fn hour_of_video(&self, frame_index: u64) -> u64 {
        (self.seconds(frame_index) / 3600.0) as u64
    }

    pub fn bucket_keys(&self, frame_index: u64) -> BucketKeys {
        let ts = self.timestamp(frame_index);
        let iso = ts.iso_week();
        BucketKeys {
            hour: self.hour_of_video(frame_index),
            day: ts.format("%Y-%m-%d").to_string(),
            week: format!("{}-W{:02}", iso.year(), iso.week()),
            month: ts.format("%Y-%m").to_string(),
            weekday: ts.weekday(),
        }
    }
}
