//! Temporal and spatial visitor statistics.
//!
//! [`TrackAggregator`] folds the per-frame stream of confirmed track ids into
//! time-bucketed visitor counts, occupancy and dwell times. [`ZoneAnalyzer`]
//! ranks coarse floorplan cells by rendered density. Both feed the final
//! [`AnalyticsRecord`]; [`DashboardSummary`] merges records across videos.

mod aggregator;
mod clock;
mod dashboard;
mod record;
mod zones;

pub use aggregator::{
    HourCount, MIN_DWELL_SECS, OccupancySample, PeriodCount, TrackAggregator, TrackDwell,
    TrackStats, VisitorCounts, WeekdayPeak,
};
pub use clock::{BucketKeys, VideoClock};
pub use dashboard::{DashboardSummary, DwellTrendPoint};
pub use record::AnalyticsRecord;
pub use zones::{Zone, ZoneAnalyzer, ZoneReport};
