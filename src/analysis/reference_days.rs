//! Characteristic days of a simulated month.
//!
//! Days are UTC calendar dates of the aggregated table. When several days
//! share the extreme value the earliest one is reported.

use std::fmt;
use chrono::NaiveDate;
use serde::Serialize;
use crate::core::aggregator::AggregatedResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReferenceDayKind {
    /// Highest fleet peak.
    MaxDay,
    /// Lowest fleet minimum.
    MinDay,
    /// Largest peak-to-peak range.
    VolatileDay,
    /// Largest step between consecutive rows.
    SharpChangeDay,
}

impl ReferenceDayKind {
    pub const ALL: [ReferenceDayKind; 4] = [
        ReferenceDayKind::MaxDay,
        ReferenceDayKind::MinDay,
        ReferenceDayKind::VolatileDay,
        ReferenceDayKind::SharpChangeDay,
    ];

    pub fn suffix(&self) -> &'static str {
        match self {
            ReferenceDayKind::MaxDay => "max_day",
            ReferenceDayKind::MinDay => "min_day",
            ReferenceDayKind::VolatileDay => "volatile_day",
            ReferenceDayKind::SharpChangeDay => "sharp_change_day",
        }
    }
}

impl fmt::Display for ReferenceDayKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReferenceDay {
    pub kind: ReferenceDayKind,
    pub day: NaiveDate,
    /// The metric that selected the day (MW).
    pub value: f64,
}

#[derive(Debug, Clone, Copy)]
struct DayStats {
    day: NaiveDate,
    max: f64,
    min: f64,
    max_step: f64,
}

fn day_stats(table: &AggregatedResult) -> Vec<DayStats> {
    let mut stats: Vec<DayStats> = Vec::new();
    let mut previous: Option<(NaiveDate, f64)> = None;

    for (timestamp, sum) in table.timestamps().iter().zip(table.power_sum()) {
        let day = timestamp.date_naive();
        let step = match previous {
            Some((prev_day, prev_sum)) if prev_day == day => (sum - prev_sum).abs(),
            _ => 0.0,
        };
        match stats.last_mut() {
            Some(s) if s.day == day => {
                s.max = s.max.max(*sum);
                s.min = s.min.min(*sum);
                s.max_step = s.max_step.max(step);
            }
            _ => stats.push(DayStats { day, max: *sum, min: *sum, max_step: 0.0 }),
        }
        previous = Some((day, *sum));
    }
    stats
}

fn pick(stats: &[DayStats], kind: ReferenceDayKind) -> Option<ReferenceDay> {
    let metric = |s: &DayStats| match kind {
        ReferenceDayKind::MaxDay => s.max,
        ReferenceDayKind::MinDay => -s.min,
        ReferenceDayKind::VolatileDay => s.max - s.min,
        ReferenceDayKind::SharpChangeDay => s.max_step,
    };

    let mut best: Option<&DayStats> = None;
    for s in stats {
        if best.map_or(true, |b| metric(s) > metric(b)) {
            best = Some(s);
        }
    }
    best.map(|s| ReferenceDay {
        kind,
        day: s.day,
        value: match kind {
            ReferenceDayKind::MinDay => s.min,
            _ => metric(s),
        },
    })
}

/// All reference days of the table; empty for an empty table.
pub fn find_reference_days(table: &AggregatedResult) -> Vec<ReferenceDay> {
    let stats = day_stats(table);
    ReferenceDayKind::ALL.iter().filter_map(|&kind| pick(&stats, kind)).collect()
}

pub fn reference_day(table: &AggregatedResult, kind: ReferenceDayKind) -> Option<ReferenceDay> {
    pick(&day_stats(table), kind)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergySummary {
    pub per_asset_mwh: Vec<(String, f64)>,
    pub fleet_mwh: f64,
}

/// Trapezoidal energy over the whole table.
pub fn energy_mwh(table: &AggregatedResult) -> EnergySummary {
    let timestamps = table.timestamps();
    let integrate = |values: &[f64]| -> f64 {
        timestamps.windows(2)
            .zip(values.windows(2))
            .map(|(t, p)| {
                let hours = (t[1] - t[0]).num_seconds() as f64 / 3600.0;
                hours * (p[0] + p[1]) / 2.0
            })
            .sum()
    };

    let per_asset_mwh = table.columns().iter()
        .map(|name| {
            let column = table.column(name).unwrap_or_default();
            (name.clone(), integrate(&column))
        })
        .collect();

    EnergySummary { per_asset_mwh, fleet_mwh: integrate(table.power_sum()) }
}
