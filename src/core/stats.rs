//! Aggregation of measurement records
//!
//! Records are grouped by `(operation, engine)`; every group gets the mean
//! and sample standard deviation of its durations along with the mean
//! result count.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::record::MeasurementRecord;

/// Summary statistics for one `(operation, engine)` group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub operation: String,
    pub engine: String,
    /// Number of records in the group
    pub samples: usize,
    /// Mean of `mean_duration`, in seconds
    pub avg_time: f64,
    /// Sample standard deviation of `mean_duration` (`None` below two samples)
    pub time_std: Option<f64>,
    /// Mean of `result_count`
    pub avg_results: f64,
}

/// Mean time of one engine across every operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineShare {
    pub engine: String,
    pub avg_time: f64,
    /// Share of the summed engine averages, in percent (lower is faster)
    pub percent: f64,
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator), `None` below two values
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }

    let avg = mean(values)?;
    let variance = values.iter()
        .map(|v| (v - avg).powi(2))
        .sum::<f64>() / (values.len() - 1) as f64;

    Some(variance.sqrt())
}

/// Group records by `(operation, engine)` and summarize every group.
///
/// Rows come back sorted by operation, then engine.
pub fn summarize(records: &[MeasurementRecord]) -> Vec<SummaryRow> {
    let mut groups: BTreeMap<(&str, &str), Vec<&MeasurementRecord>> = BTreeMap::new();
    for record in records {
        groups.entry((record.operation.as_str(), record.engine.as_str()))
            .or_default()
            .push(record);
    }

    groups.into_iter()
        .map(|((operation, engine), group)| {
            let times: Vec<f64> = group.iter().map(|r| r.mean_duration).collect();
            let counts: Vec<f64> = group.iter().map(|r| r.result_count as f64).collect();

            SummaryRow {
                operation: operation.to_string(),
                engine: engine.to_string(),
                samples: group.len(),
                avg_time: mean(&times).unwrap_or(0.0),
                time_std: sample_std(&times),
                avg_results: mean(&counts).unwrap_or(0.0),
            }
        })
        .collect()
}

/// Mean duration per engine, with each engine's share of the total
pub fn engine_shares(records: &[MeasurementRecord]) -> Vec<EngineShare> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for record in records {
        groups.entry(record.engine.as_str()).or_default().push(record.mean_duration);
    }

    let averages: Vec<(&str, f64)> = groups.iter()
        .map(|(engine, times)| (*engine, mean(times).unwrap_or(0.0)))
        .collect();
    let total: f64 = averages.iter().map(|(_, avg)| avg).sum();

    averages.into_iter()
        .map(|(engine, avg_time)| EngineShare {
            engine: engine.to_string(),
            avg_time,
            percent: if total > 0.0 { avg_time / total * 100.0 } else { 0.0 },
        })
        .collect()
}

/// Round to a fixed number of decimals, as done for exported tables
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
