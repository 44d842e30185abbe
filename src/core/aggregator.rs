use std::collections::{BTreeMap, BTreeSet};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use crate::utils::logging::{self, OperationCategory};

/// All power points of one asset, in MW.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetSeries {
    pub name: String,
    pub points: Vec<(DateTime<Utc>, f64)>,
}

impl AssetSeries {
    pub fn new(name: impl Into<String>, points: Vec<(DateTime<Utc>, f64)>) -> Self {
        Self { name: name.into(), points }
    }
}

/// Fleet time series on a common timestamp axis.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AggregatedResult {
    timestamps: Vec<DateTime<Utc>>,
    columns: Vec<String>,
    values: Vec<Vec<f64>>,
    power_sum: Vec<f64>,
}

/// Outer-joins the series on their timestamps. Column order follows the
/// input; a cell without a sample is 0 MW. Within one asset, the last sample
/// for a repeated timestamp wins.
pub fn aggregate(series: &[AssetSeries]) -> AggregatedResult {
    let _timing = logging::start_timing("aggregate", OperationCategory::Aggregation);

    let per_asset: Vec<BTreeMap<DateTime<Utc>, f64>> = series.iter()
        .map(|s| s.points.iter().copied().collect())
        .collect();

    let timestamps: Vec<DateTime<Utc>> = per_asset.iter()
        .flat_map(|m| m.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let values: Vec<Vec<f64>> = timestamps.iter()
        .map(|t| per_asset.iter().map(|m| m.get(t).copied().unwrap_or(0.0)).collect())
        .collect();

    let power_sum = values.iter().map(|row: &Vec<f64>| row.iter().sum()).collect();

    AggregatedResult {
        timestamps,
        columns: series.iter().map(|s| s.name.clone()).collect(),
        values,
        power_sum,
    }
}

impl AggregatedResult {
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn power_sum(&self) -> &[f64] {
        &self.power_sum
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Per-asset values of one row, in column order.
    pub fn row(&self, index: usize) -> Option<&[f64]> {
        self.values.get(index).map(Vec::as_slice)
    }

    pub fn rows(&self) -> impl Iterator<Item = (DateTime<Utc>, &[f64], f64)> + '_ {
        self.timestamps.iter()
            .zip(&self.values)
            .zip(&self.power_sum)
            .map(|((t, row), sum)| (*t, row.as_slice(), *sum))
    }

    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.values.iter().map(|row| row[idx]).collect())
    }

    /// Distinct UTC dates, ascending.
    pub fn days(&self) -> Vec<NaiveDate> {
        let mut days: Vec<NaiveDate> = self.timestamps.iter().map(|t| t.date_naive()).collect();
        days.dedup();
        days
    }

    /// Rows falling on one UTC date.
    pub fn slice_day(&self, day: NaiveDate) -> AggregatedResult {
        let keep: Vec<usize> = self.timestamps.iter()
            .enumerate()
            .filter(|(_, t)| t.date_naive() == day)
            .map(|(i, _)| i)
            .collect();

        AggregatedResult {
            timestamps: keep.iter().map(|&i| self.timestamps[i]).collect(),
            columns: self.columns.clone(),
            values: keep.iter().map(|&i| self.values[i].clone()).collect(),
            power_sum: keep.iter().map(|&i| self.power_sum[i]).collect(),
        }
    }
}
