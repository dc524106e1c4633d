//! Per-video track aggregation.

use std::collections::{BTreeMap, HashSet};

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::analytics::clock::VideoClock;
use crate::error::{Error, Result};

/// Tracks that stay this many seconds or less are treated as fragments and
/// left out of dwell statistics.
pub const MIN_DWELL_SECS: f64 = 1.0;

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TrackSpan {
    first_frame: u64,
    last_frame: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancySample {
    pub frame_index: u64,
    /// Distinct confirmed tracks visible in this frame.
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourCount {
    pub hour: u64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodCount {
    pub period: String,
    pub count: u64,
}

/// Unique visitors per time bucket, keys ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisitorCounts {
    pub hourly: Vec<HourCount>,
    pub daily: Vec<PeriodCount>,
    pub weekly: Vec<PeriodCount>,
    pub monthly: Vec<PeriodCount>,
}

impl VisitorCounts {
    pub fn is_empty(&self) -> bool {
        self.hourly.is_empty()
            && self.daily.is_empty()
            && self.weekly.is_empty()
            && self.monthly.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayPeak {
    pub weekday: Weekday,
    /// Hour of video with the most unique visitors on this weekday.
    pub peak_hour: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackDwell {
    pub track_id: u64,
    pub first_frame: u64,
    pub last_frame: u64,
    pub seconds: f64,
}

/// Statistics derived from one video's track stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackStats {
    /// Number of distinct frames observed.
    pub frames_observed: u64,
    /// Distinct track ids over the whole video.
    pub total_visitors: usize,
    pub unique_track_ids: Vec<u64>,
    pub occupancy: Vec<OccupancySample>,
    pub visitor_counts: VisitorCounts,
    /// Always seven entries, Monday first.
    pub peak_hour_per_weekday: Vec<WeekdayPeak>,
    /// Sum of per-frame occupancy within each hour.
    pub hourly_traffic: Vec<HourCount>,
    /// Hour with the most traffic; earliest hour wins ties.
    pub peak_hour: Option<u64>,
    /// Dwell of every track longer than [`MIN_DWELL_SECS`].
    pub dwell_times: Vec<TrackDwell>,
    pub average_dwell_time: f64,
}

impl TrackStats {
    pub fn max_occupancy(&self) -> usize {
        self.occupancy.iter().map(|s| s.count).max().unwrap_or(0)
    }
}

/// Accumulates visitor statistics from frame-ordered observations.
#[derive(Debug, Clone)]
pub struct TrackAggregator {
    clock: VideoClock,
    spans: BTreeMap<u64, TrackSpan>,
    hourly: BTreeMap<u64, HashSet<u64>>,
    daily: BTreeMap<String, HashSet<u64>>,
    weekly: BTreeMap<String, HashSet<u64>>,
    monthly: BTreeMap<String, HashSet<u64>>,
    weekday_hours: [BTreeMap<u64, HashSet<u64>>; 7],
    hourly_traffic: BTreeMap<u64, u64>,
    occupancy: Vec<OccupancySample>,
    current_frame: Option<(u64, HashSet<u64>)>,
}

impl TrackAggregator {
    pub fn new(clock: VideoClock) -> Self {
        Self {
            clock,
            spans: BTreeMap::new(),
            hourly: BTreeMap::new(),
            daily: BTreeMap::new(),
            weekly: BTreeMap::new(),
            monthly: BTreeMap::new(),
            weekday_hours: Default::default(),
            hourly_traffic: BTreeMap::new(),
            occupancy: Vec::new(),
            current_frame: None,
        }
    }

    pub fn clock(&self) -> &VideoClock {
        &self.clock
    }

    /// Index of the last frame observed.
    pub fn last_frame(&self) -> Option<u64> {
        self.current_frame.as_ref().map(|(frame, _)| *frame)
    }

    /// Record the confirmed tracks visible in `frame_index`.
    ///
    /// Frames must arrive in non-decreasing order. Observing the same frame
    /// again merges the ids into that frame.
    pub fn observe(
        &mut self,
        frame_index: u64,
        active_track_ids: impl IntoIterator<Item = u64>,
    ) -> Result<()> {
        match self.last_frame() {
            Some(previous) if frame_index < previous => {
                return Err(Error::FrameOrder {
                    previous,
                    got: frame_index,
                });
            }
            Some(previous) if frame_index == previous => {}
            _ => {
                self.current_frame = Some((frame_index, HashSet::new()));
                self.occupancy.push(OccupancySample {
                    frame_index,
                    count: 0,
                });
            }
        }

        let keys = self.clock.bucket_keys(frame_index);
        let weekday = keys.weekday.num_days_from_monday() as usize;
        let mut added = 0u64;

        for track_id in active_track_ids {
            if let Some((_, seen)) = self.current_frame.as_mut() {
                if !seen.insert(track_id) {
                    continue;
                }
            }
            added += 1;

            self.spans
                .entry(track_id)
                .and_modify(|span| span.last_frame = span.last_frame.max(frame_index))
                .or_insert(TrackSpan {
                    first_frame: frame_index,
                    last_frame: frame_index,
                });

            self.hourly.entry(keys.hour).or_default().insert(track_id);
            self.daily.entry(keys.day.clone()).or_default().insert(track_id);
            self.weekly.entry(keys.week.clone()).or_default().insert(track_id);
            self.monthly.entry(keys.month.clone()).or_default().insert(track_id);
            self.weekday_hours[weekday]
                .entry(keys.hour)
                .or_default()
                .insert(track_id);
        }

        if added > 0 {
            if let Some(sample) = self.occupancy.last_mut() {
                sample.count += added as usize;
            }
            *self.hourly_traffic.entry(keys.hour).or_insert(0) += added;
        }
        Ok(())
    }

    /// Compute the statistics for everything observed so far.
    ///
    /// With `fps` zero or not finite, dwell times are unavailable: none are
    /// reported and the average is `0.0`.
    pub fn finalize(&self, fps: f64) -> TrackStats {
        let dwell_times: Vec<TrackDwell> = if fps.is_finite() && fps > 0.0 {
            self.spans
                .iter()
                .map(|(&track_id, span)| TrackDwell {
                    track_id,
                    first_frame: span.first_frame,
                    last_frame: span.last_frame,
                    seconds: (span.last_frame - span.first_frame + 1) as f64 / fps,
                })
                .filter(|dwell| dwell.seconds > MIN_DWELL_SECS)
                .collect()
        } else {
            Vec::new()
        };
        let average_dwell_time = if dwell_times.is_empty() {
            0.0
        } else {
            dwell_times.iter().map(|d| d.seconds).sum::<f64>() / dwell_times.len() as f64
        };

        let peak_hour_per_weekday = WEEKDAYS
            .iter()
            .zip(self.weekday_hours.iter())
            .map(|(&weekday, hours)| WeekdayPeak {
                weekday,
                peak_hour: first_max(hours.iter().map(|(&h, ids)| (h, ids.len() as u64))),
            })
            .collect();

        let hourly_traffic: Vec<HourCount> = self
            .hourly_traffic
            .iter()
            .map(|(&hour, &count)| HourCount { hour, count })
            .collect();
        let peak_hour = first_max(hourly_traffic.iter().map(|h| (h.hour, h.count)));

        TrackStats {
            frames_observed: self.occupancy.len() as u64,
            total_visitors: self.spans.len(),
            unique_track_ids: self.spans.keys().copied().collect(),
            occupancy: self.occupancy.clone(),
            visitor_counts: VisitorCounts {
                hourly: self
                    .hourly
                    .iter()
                    .map(|(&hour, ids)| HourCount {
                        hour,
                        count: ids.len() as u64,
                    })
                    .collect(),
                daily: period_counts(&self.daily),
                weekly: period_counts(&self.weekly),
                monthly: period_counts(&self.monthly),
            },
            peak_hour_per_weekday,
            hourly_traffic,
            peak_hour,
            dwell_times,
            average_dwell_time,
        }
    }
}

fn period_counts(buckets: &BTreeMap<String, HashSet<u64>>) -> Vec<PeriodCount> {
    buckets
        .iter()
        .map(|(period, ids)| PeriodCount {
            period: period.clone(),
            count: ids.len() as u64,
        })
        .collect()
}

/// Key of the largest count; the first key in iteration order wins ties.
fn first_max(counts: impl Iterator<Item = (u64, u64)>) -> Option<u64> {
    let mut best: Option<(u64, u64)> = None;
    for (key, count) in counts {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((key, count));
        }
    }
    best.map(|(key, _)| key)
}
