use anyhow::Result;
use colored::*;
use storebench::connectivity::ConnectivityReport;
use storebench::{Comparison, EngineShare, MeasurementRecord, SummaryRow};

use crate::formatters::{seconds, Formatter};

/// Formateur au format texte
pub struct TextFormatter {
    /// Indique si les couleurs sont activées
    colored: bool,
}

impl TextFormatter {
    /// Crée un nouveau formateur texte
    pub fn new() -> Self {
        TextFormatter {
            colored: true,
        }
    }

    /// Désactive les couleurs
    #[cfg(test)]
    pub fn without_colors() -> Self {
        TextFormatter {
            colored: false,
        }
    }

    fn heading(&self, title: &str) -> String {
        if self.colored {
            format!("{}", title.bold().underline())
        } else {
            title.to_string()
        }
    }
}

impl Formatter for TextFormatter {
    fn format_records(&self, records: &[MeasurementRecord]) -> Result<String> {
        Ok(records.iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn format_summary(&self, summary: &[SummaryRow]) -> Result<String> {
        let mut lines = vec![self.heading("Résumé")];
        for row in summary {
            lines.push(format!("{:10} | {:34} | n={:3} | avg {}s | std {} | {:.1} results",
                row.engine, row.operation, row.samples,
                seconds(Some(row.avg_time)), seconds(row.time_std), row.avg_results));
        }
        Ok(lines.join("\n"))
    }

    fn format_comparison(&self, comparison: &Comparison) -> Result<String> {
        let mut lines = vec![self.heading(&format!("{} vs {}", comparison.baseline, comparison.contender))];
        for row in &comparison.rows {
            lines.push(format!("{:34} | {}s | {}s | {} ({})",
                row.operation, seconds(Some(row.baseline_time)), seconds(Some(row.contender_time)),
                row.winner, row.speedup));
        }
        lines.push(format!("{}: {} | {}: {}",
            comparison.baseline, comparison.wins(&comparison.baseline),
            comparison.contender, comparison.wins(&comparison.contender)));
        Ok(lines.join("\n"))
    }

    fn format_shares(&self, shares: &[EngineShare]) -> Result<String> {
        let mut lines = vec![self.heading("Performance globale")];
        for share in shares {
            lines.push(format!("{:10} | {}s | {:.1}%", share.engine, seconds(Some(share.avg_time)), share.percent));
        }
        Ok(lines.join("\n"))
    }

    fn format_connectivity(&self, reports: &[ConnectivityReport]) -> Result<String> {
        Ok(reports.iter()
            .map(|report| match &report.outcome {
                Ok(_) => format!("✅ {}", report),
                Err(_) if self.colored => format!("❌ {}", report.to_string().as_str().red()),
                Err(_) => format!("❌ {}", report),
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn format_error(&self, error: &str) -> String {
        if self.colored {
            format!("{}", error.red().bold())
        } else {
            format!("Erreur: {}", error)
        }
    }

    fn format_info(&self, info: &str) -> String {
        if self.colored {
            format!("{}", info.blue())
        } else {
            format!("Info: {}", info)
        }
    }

    fn format_success(&self, success: &str) -> String {
        if self.colored {
            format!("{}", success.green().bold())
        } else {
            format!("Succès: {}", success)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storebench::core::comparison::compare;
    use storebench::core::stats::summarize;

    fn record(operation: &str, engine: &str, mean_duration: f64) -> MeasurementRecord {
        MeasurementRecord {
            operation: operation.to_string(),
            engine: engine.to_string(),
            mean_duration,
            result_count: 3,
            complexity_score: 1,
        }
    }

    #[test]
    fn test_comparison_lists_winner_and_speedup() {
        let records = vec![record("lookup", "Sled", 0.001), record("lookup", "SQLite", 0.004)];
        let comparison = compare(&summarize(&records), "Sled", "SQLite");

        let output = TextFormatter::without_colors().format_comparison(&comparison).unwrap();
        assert!(output.contains("Sled (4.00x)"));
        assert!(output.ends_with("Sled: 1 | SQLite: 0"));
    }

    #[test]
    fn test_single_sample_has_no_std() {
        let summary = summarize(&[record("lookup", "Sled", 0.5)]);
        let output = TextFormatter::without_colors().format_summary(&summary).unwrap();
        assert!(output.contains("avg 0.5000s | std -"));
    }

    #[test]
    fn test_plain_messages() {
        let formatter = TextFormatter::without_colors();
        assert_eq!(formatter.format_error("boom"), "Erreur: boom");
        assert_eq!(formatter.format_success("ok"), "Succès: ok");
    }
}
