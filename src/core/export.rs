//! Export of measurements and their aggregates
//!
//! Summaries and comparisons are written as CSV, raw records as a JSON
//! document that can be loaded back for offline analysis.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::comparison::Comparison;
use crate::core::errors::{BenchError, Result};
use crate::core::record::MeasurementRecord;
use crate::core::stats::{round_to, SummaryRow};

pub const SUMMARY_FILE: &str = "performance_summary.csv";
pub const COMPARISON_FILE: &str = "direct_comparison.csv";
pub const RECORDS_FILE: &str = "measurements.json";

/// Decimals kept in exported tables
const EXPORT_DECIMALS: i32 = 4;

/// A measurement session as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLog {
    pub run_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub trial_count: u32,
    pub records: Vec<MeasurementRecord>,
}

impl RunLog {
    pub fn new(trial_count: u32, records: Vec<MeasurementRecord>) -> Self {
        RunLog {
            run_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            trial_count,
            records,
        }
    }
}

/// Paths of the files written by [`export_all`]
#[derive(Debug, Clone)]
pub struct ExportedFiles {
    pub summary: PathBuf,
    pub comparison: Option<PathBuf>,
    pub records: Option<PathBuf>,
}

fn format_decimal(value: f64) -> String {
    round_to(value, EXPORT_DECIMALS).to_string()
}

/// Write the per-group summary as CSV
pub fn write_summary_csv(summary: &[SummaryRow], path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["operation", "database", "samples", "avg_time", "time_std", "avg_results"])?;

    for row in summary {
        wtr.write_record([
            row.operation.as_str(),
            row.engine.as_str(),
            row.samples.to_string().as_str(),
            format_decimal(row.avg_time).as_str(),
            row.time_std.map(format_decimal).unwrap_or_default().as_str(),
            format_decimal(row.avg_results).as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write the head-to-head comparison as CSV
pub fn write_comparison_csv(comparison: &Comparison, path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    let baseline_col = format!("{}_time", comparison.baseline.to_lowercase());
    let contender_col = format!("{}_time", comparison.contender.to_lowercase());
    wtr.write_record(["operation", baseline_col.as_str(), contender_col.as_str(), "winner", "speedup_factor"])?;

    for row in &comparison.rows {
        wtr.write_record([
            row.operation.as_str(),
            format_decimal(row.baseline_time).as_str(),
            format_decimal(row.contender_time).as_str(),
            row.winner.as_str(),
            row.speedup.to_string().as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Save a run as pretty-printed JSON
pub fn save_run(run: &RunLog, path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, run)
        .map_err(|e| BenchError::Serialization(e.to_string()))?;

    writer.flush()?;
    Ok(())
}

/// Load a run saved with [`save_run`]
pub fn load_run(path: &Path) -> Result<RunLog> {
    if !path.exists() {
        return Err(BenchError::NotFound(path.display().to_string()));
    }

    let reader = BufReader::new(File::open(path)?);
    serde_json::from_reader(reader)
        .map_err(|e| BenchError::Serialization(format!("{}: {}", path.display(), e)))
}

/// Load only the records of a saved run
pub fn load_records(path: &Path) -> Result<Vec<MeasurementRecord>> {
    Ok(load_run(path)?.records)
}

/// Write every available output into `dir`, creating it if needed
pub fn export_all(
    dir: &Path,
    summary: &[SummaryRow],
    comparison: Option<&Comparison>,
    run: Option<&RunLog>,
) -> Result<ExportedFiles> {
    fs::create_dir_all(dir)?;

    let summary_path = dir.join(SUMMARY_FILE);
    write_summary_csv(summary, &summary_path)?;
    info!("Summary written to {}", summary_path.display());

    let comparison_path = match comparison {
        Some(comparison) => {
            let path = dir.join(COMPARISON_FILE);
            write_comparison_csv(comparison, &path)?;
            info!("Comparison written to {}", path.display());
            Some(path)
        },
        None => None,
    };

    let records_path = match run {
        Some(run) => {
            let path = dir.join(RECORDS_FILE);
            save_run(run, &path)?;
            info!("{} records written to {}", run.records.len(), path.display());
            Some(path)
        },
        None => None,
    };

    Ok(ExportedFiles {
        summary: summary_path,
        comparison: comparison_path,
        records: records_path,
    })
}
