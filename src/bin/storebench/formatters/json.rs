use anyhow::Result;
use serde::Serialize;
use serde_json::json;
use storebench::connectivity::ConnectivityReport;
use storebench::{Comparison, EngineShare, MeasurementRecord, SummaryRow};

use crate::formatters::Formatter;

/// Formateur au format JSON
pub struct JsonFormatter {
    /// Indique si l'indentation est activée
    pretty: bool,
}

impl JsonFormatter {
    /// Crée un nouveau formateur JSON
    pub fn new() -> Self {
        JsonFormatter {
            pretty: true,
        }
    }

    fn render<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(serde_json::to_string(value)?)
        }
    }

    fn message(&self, key: &str, text: &str) -> String {
        let mut object = serde_json::Map::new();
        object.insert(key.to_string(), json!(text));

        self.render(&object)
            .unwrap_or_else(|_| format!("{{\"{}\":\"{}\"}}", key, text))
    }
}

impl Formatter for JsonFormatter {
    fn format_records(&self, records: &[MeasurementRecord]) -> Result<String> {
        self.render(records)
    }

    fn format_summary(&self, summary: &[SummaryRow]) -> Result<String> {
        self.render(summary)
    }

    fn format_comparison(&self, comparison: &Comparison) -> Result<String> {
        // La vitesse relative est rendue comme dans le CSV ("2.50x")
        let rows: Vec<_> = comparison.rows.iter()
            .map(|row| json!({
                "operation": row.operation,
                "baseline_time": row.baseline_time,
                "contender_time": row.contender_time,
                "winner": row.winner,
                "speedup": row.speedup.to_string(),
            }))
            .collect();

        self.render(&json!({
            "baseline": comparison.baseline,
            "contender": comparison.contender,
            "rows": rows,
        }))
    }

    fn format_shares(&self, shares: &[EngineShare]) -> Result<String> {
        self.render(shares)
    }

    fn format_connectivity(&self, reports: &[ConnectivityReport]) -> Result<String> {
        let reports: Vec<_> = reports.iter()
            .map(|report| match &report.outcome {
                Ok(count) => json!({ "engine": report.engine, "connected": true, "products": count }),
                Err(e) => json!({ "engine": report.engine, "connected": false, "error": e.to_string() }),
            })
            .collect();

        self.render(&reports)
    }

    fn format_error(&self, error: &str) -> String {
        self.message("error", error)
    }

    fn format_info(&self, info: &str) -> String {
        self.message("info", info)
    }

    fn format_success(&self, success: &str) -> String {
        self.message("success", success)
    }
}
