use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::analytics::{TrackStats, ZoneReport};
use crate::error::Result;

/// Final analytics for one fully processed video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsRecord {
    /// Wall-clock time of frame 0, as supplied by the caller.
    pub video_start: NaiveDateTime,
    pub fps: f64,
    pub frames_processed: u64,
    pub tracks: TrackStats,
    pub zones: ZoneReport,
}

impl AnalyticsRecord {
    pub fn video_date(&self) -> NaiveDate {
        self.video_start.date()
    }

    /// Unique track ids seen in the video.
    pub fn total_visitors(&self) -> usize {
        self.tracks.total_visitors
    }

    pub fn average_dwell_time(&self) -> f64 {
        self.tracks.average_dwell_time
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
