pub mod formatter;
pub mod text;
pub mod json;
pub mod table;

pub use formatter::Formatter;
use clap::ValueEnum;

/// Formats de sortie disponibles
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Format texte
    Text,

    /// Format JSON
    Json,

    /// Format tableau
    Table,
}

/// Temps en secondes avec quatre décimales, ou "-" si absent
pub fn seconds(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.4}", v),
        None => "-".to_string(),
    }
}
