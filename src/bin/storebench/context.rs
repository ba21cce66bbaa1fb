use anyhow::Result;
use storebench::Config;

use crate::formatters::{OutputFormat, Formatter};
use crate::formatters::text::TextFormatter;
use crate::formatters::json::JsonFormatter;
use crate::formatters::table::TableFormatter;

/// Contexte d'exécution du CLI
pub struct Context {
    /// Configuration lue depuis l'environnement
    config: Config,

    /// Niveau de verbosité
    verbosity: u8,

    /// Formateur actuel
    formatter: Box<dyn Formatter>,
}

impl Context {
    /// Crée un nouveau contexte à partir de l'environnement
    pub fn new(verbosity: u8, format: OutputFormat) -> Result<Self> {
        let config = Config::from_env()?;
        Ok(Self::with_config(config, verbosity, format))
    }

    pub fn with_config(config: Config, verbosity: u8, format: OutputFormat) -> Self {
        let formatter: Box<dyn Formatter> = match format {
            OutputFormat::Text => Box::new(TextFormatter::new()),
            OutputFormat::Json => Box::new(JsonFormatter::new()),
            OutputFormat::Table => Box::new(TableFormatter::new()),
        };

        Context {
            config,
            verbosity,
            formatter,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Les options de la ligne de commande remplacent les variables d'environnement
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Obtient le formateur actuel
    pub fn formatter(&self) -> &dyn Formatter {
        self.formatter.as_ref()
    }

    /// Obtient le niveau de verbosité
    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }
}
