use anyhow::Result;
use storebench::connectivity::ConnectivityReport;
use storebench::{Comparison, EngineShare, MeasurementRecord, SummaryRow};

/// Trait définissant un formateur de sortie
pub trait Formatter {
    /// Formate les mesures brutes, dans l'ordre d'exécution
    fn format_records(&self, records: &[MeasurementRecord]) -> Result<String>;

    /// Formate le résumé par (opération, moteur)
    fn format_summary(&self, summary: &[SummaryRow]) -> Result<String>;

    /// Formate la comparaison directe entre deux moteurs
    fn format_comparison(&self, comparison: &Comparison) -> Result<String>;

    /// Formate la part de temps moyen de chaque moteur
    fn format_shares(&self, shares: &[EngineShare]) -> Result<String>;

    /// Formate le résultat de la vérification des connexions
    fn format_connectivity(&self, reports: &[ConnectivityReport]) -> Result<String>;

    /// Formate un message d'erreur
    fn format_error(&self, error: &str) -> String;

    /// Formate un message d'information
    fn format_info(&self, info: &str) -> String;

    /// Formate un message de succès
    fn format_success(&self, success: &str) -> String;
}
