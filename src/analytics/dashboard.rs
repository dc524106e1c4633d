//! Roll-up of several videos' records into one dashboard view.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::analytics::{AnalyticsRecord, HourCount, PeriodCount, VisitorCounts, WeekdayPeak};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DwellTrendPoint {
    pub period: String,
    /// Mean of the per-video average dwell times in this period.
    pub dwell_time: f64,
}

/// Cross-video summary.
///
/// Track ids are only meaningful within one video, so visitor totals are
/// summed per video rather than deduplicated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub processed_videos: usize,
    pub total_visitors: u64,
    pub visitor_counts: VisitorCounts,
    pub peak_hour_per_weekday: Vec<WeekdayPeak>,
    pub dwell_trend_daily: Vec<DwellTrendPoint>,
    pub dwell_trend_weekly: Vec<DwellTrendPoint>,
    pub dwell_trend_monthly: Vec<DwellTrendPoint>,
    pub average_dwell_time: f64,
}

impl DashboardSummary {
    /// Merge records in the given order. For each weekday the first record
    /// with a known peak hour wins.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a AnalyticsRecord>) -> Self {
        let mut processed_videos = 0;
        let mut total_visitors = 0u64;
        let mut hourly: BTreeMap<u64, u64> = BTreeMap::new();
        let mut daily: BTreeMap<String, u64> = BTreeMap::new();
        let mut weekly: BTreeMap<String, u64> = BTreeMap::new();
        let mut monthly: BTreeMap<String, u64> = BTreeMap::new();
        let mut peaks: Vec<WeekdayPeak> = Vec::new();
        let mut dwell_daily: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        let mut dwell_weekly: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        let mut dwell_monthly: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        let mut all_dwell = Vec::new();

        for record in records {
            processed_videos += 1;
            total_visitors += record.total_visitors() as u64;

            let counts = &record.tracks.visitor_counts;
            for h in &counts.hourly {
                *hourly.entry(h.hour).or_default() += h.count;
            }
            add_periods(&mut daily, &counts.daily);
            add_periods(&mut weekly, &counts.weekly);
            add_periods(&mut monthly, &counts.monthly);

            if peaks.is_empty() {
                peaks = record.tracks.peak_hour_per_weekday.clone();
            } else {
                for (known, candidate) in peaks.iter_mut().zip(&record.tracks.peak_hour_per_weekday) {
                    if known.peak_hour.is_none() {
                        known.peak_hour = candidate.peak_hour;
                    }
                }
            }

            let date = record.video_date();
            let iso = date.iso_week();
            let dwell = record.average_dwell_time();
            dwell_daily.entry(date.format("%Y-%m-%d").to_string()).or_default().push(dwell);
            dwell_weekly
                .entry(format!("{}-W{:02}", iso.year(), iso.week()))
                .or_default()
                .push(dwell);
            dwell_monthly.entry(date.format("%Y-%m").to_string()).or_default().push(dwell);
            all_dwell.push(dwell);
        }

        Self {
            processed_videos,
            total_visitors,
            visitor_counts: VisitorCounts {
                hourly: hourly
                    .into_iter()
                    .map(|(hour, count)| HourCount { hour, count })
                    .collect(),
                daily: into_periods(daily),
                weekly: into_periods(weekly),
                monthly: into_periods(monthly),
            },
            peak_hour_per_weekday: peaks,
            dwell_trend_daily: into_trend(dwell_daily),
            dwell_trend_weekly: into_trend(dwell_weekly),
            dwell_trend_monthly: into_trend(dwell_monthly),
            average_dwell_time: mean(&all_dwell),
        }
    }
}

fn add_periods(into: &mut BTreeMap<String, u64>, periods: &[PeriodCount]) {
    for p in periods {
        *into.entry(p.period.clone()).or_default() += p.count;
    }
}

fn into_periods(map: BTreeMap<String, u64>) -> Vec<PeriodCount> {
    map.into_iter()
        .map(|(period, count)| PeriodCount { period, count })
        .collect()
}

fn into_trend(map: BTreeMap<String, Vec<f64>>) -> Vec<DwellTrendPoint> {
    map.into_iter()
        .map(|(period, values)| DwellTrendPoint {
            dwell_time: mean(&values),
            period,
        })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
