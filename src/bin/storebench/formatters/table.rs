use anyhow::Result;
use colored::*;
use prettytable::{Table, Row, Cell};
use storebench::connectivity::ConnectivityReport;
use storebench::{Comparison, EngineShare, MeasurementRecord, SummaryRow};

use crate::formatters::{seconds, Formatter};

/// Formateur au format tableau
pub struct TableFormatter {
    /// Indique si les couleurs sont activées
    colored: bool,
}

impl TableFormatter {
    /// Crée un nouveau formateur tableau
    pub fn new() -> Self {
        TableFormatter {
            colored: true,
        }
    }

    /// Désactive les couleurs
    #[cfg(test)]
    pub fn without_colors() -> Self {
        TableFormatter {
            colored: false,
        }
    }

    /// Crée un tableau avec une ligne d'en-têtes
    fn table(&self, headers: &[&str]) -> Table {
        let mut table = Table::new();
        table.set_titles(Row::new(headers.iter().map(|h| Cell::new(h).style_spec("b")).collect()));
        table
    }

    fn winner_cell(&self, winner: &str) -> Cell {
        if self.colored {
            Cell::new(&winner.green().to_string())
        } else {
            Cell::new(winner)
        }
    }
}

impl Formatter for TableFormatter {
    fn format_records(&self, records: &[MeasurementRecord]) -> Result<String> {
        let mut table = self.table(&["#", "Moteur", "Opération", "Temps moyen (s)", "Résultats", "Complexité"]);

        for (i, record) in records.iter().enumerate() {
            table.add_row(Row::new(vec![
                Cell::new(&(i + 1).to_string()),
                Cell::new(&record.engine),
                Cell::new(&record.operation),
                Cell::new(&seconds(Some(record.mean_duration))).style_spec("r"),
                Cell::new(&record.result_count.to_string()).style_spec("r"),
                Cell::new(&record.complexity_score.to_string()).style_spec("r"),
            ]));
        }

        Ok(table.to_string())
    }

    fn format_summary(&self, summary: &[SummaryRow]) -> Result<String> {
        let mut table = self.table(&["Opération", "Moteur", "Mesures", "Moyenne (s)", "Écart type", "Résultats moyens"]);

        for row in summary {
            table.add_row(Row::new(vec![
                Cell::new(&row.operation),
                Cell::new(&row.engine),
                Cell::new(&row.samples.to_string()).style_spec("r"),
                Cell::new(&seconds(Some(row.avg_time))).style_spec("r"),
                Cell::new(&seconds(row.time_std)).style_spec("r"),
                Cell::new(&format!("{:.1}", row.avg_results)).style_spec("r"),
            ]));
        }

        Ok(table.to_string())
    }

    fn format_comparison(&self, comparison: &Comparison) -> Result<String> {
        let baseline = format!("{} (s)", comparison.baseline);
        let contender = format!("{} (s)", comparison.contender);
        let mut table = self.table(&["Opération", &baseline, &contender, "Gagnant", "Accélération"]);

        for row in &comparison.rows {
            table.add_row(Row::new(vec![
                Cell::new(&row.operation),
                Cell::new(&seconds(Some(row.baseline_time))).style_spec("r"),
                Cell::new(&seconds(Some(row.contender_time))).style_spec("r"),
                self.winner_cell(&row.winner),
                Cell::new(&row.speedup.to_string()).style_spec("r"),
            ]));
        }

        Ok(table.to_string())
    }

    fn format_shares(&self, shares: &[EngineShare]) -> Result<String> {
        let mut table = self.table(&["Moteur", "Temps moyen (s)", "Part"]);

        for share in shares {
            table.add_row(Row::new(vec![
                Cell::new(&share.engine),
                Cell::new(&seconds(Some(share.avg_time))).style_spec("r"),
                Cell::new(&format!("{:.1}%", share.percent)).style_spec("r"),
            ]));
        }

        Ok(table.to_string())
    }

    fn format_connectivity(&self, reports: &[ConnectivityReport]) -> Result<String> {
        let mut table = self.table(&["", "Moteur", "Détail"]);

        for report in reports {
            let (mark, detail) = match &report.outcome {
                Ok(count) => ("✅", format!("{} produits", count)),
                Err(e) => ("❌", e.to_string()),
            };
            table.add_row(Row::new(vec![
                Cell::new(mark),
                Cell::new(&report.engine),
                Cell::new(&detail),
            ]));
        }

        Ok(table.to_string())
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
