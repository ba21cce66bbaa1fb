use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use log::{info, LevelFilter};
use storebench::ResultCapture;

use crate::commands;
use crate::context::Context;
use crate::formatters::OutputFormat;

#[derive(Parser)]
#[command(name = "storebench")]
#[command(about = "Compare query latency between a relational and a document store", long_about = None)]
struct Cli {
    /// Niveau de verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Format de sortie (text, json, table)
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Commande à exécuter
    #[command(subcommand)]
    command: Commands,
}

/// Source of the value returned by a measured query
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum CaptureMode {
    /// One extra untimed run after the trials
    ExtraRun,
    /// Keep the result of the first timed trial
    FirstTrial,
}

impl From<CaptureMode> for ResultCapture {
    fn from(mode: CaptureMode) -> Self {
        match mode {
            CaptureMode::ExtraRun => ResultCapture::ExtraRun,
            CaptureMode::FirstTrial => ResultCapture::FirstTrial,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Vérifier que les deux bases sont joignables
    Check,

    /// Générer le jeu de données et le charger dans les deux bases
    Generate {
        /// Nombre de produits
        #[arg(long, default_value_t = 10_000)]
        products: usize,

        /// Nombre maximal d'avis par produit
        #[arg(long, default_value_t = 55)]
        reviews_per_product: usize,

        /// Graine du générateur (STOREBENCH_SEED par défaut)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Mesurer toutes les requêtes et exporter les résultats
    Run {
        /// Nombre d'essais chronométrés par requête
        #[arg(long)]
        trials: Option<u32>,

        /// Provenance du résultat renvoyé
        #[arg(long, value_enum, default_value_t = CaptureMode::ExtraRun)]
        capture: CaptureMode,

        /// Répertoire des résultats
        #[arg(long)]
        results_dir: Option<PathBuf>,
    },

    /// Recalculer les statistiques d'une exécution enregistrée
    Analyze {
        /// Fichier measurements.json à relire
        #[arg(long)]
        input: Option<PathBuf>,

        /// Répertoire des résultats
        #[arg(long)]
        results_dir: Option<PathBuf>,
    },
}

fn init_logger(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    // RUST_LOG garde la priorité sur -v
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// Exécute l'application CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logger(cli.verbose);
    info!("Démarrage de storebench");

    let mut context = Context::new(cli.verbose, cli.format)?;

    // Les erreurs passent par le formateur choisi avant de quitter
    if let Err(e) = execute(&mut context, cli.command) {
        eprintln!("{}", context.formatter().format_error(&format!("{:#}", e)));
        std::process::exit(1);
    }

    Ok(())
}

fn execute(context: &mut Context, command: Commands) -> Result<()> {
    match command {
        Commands::Check => {
            commands::check::execute(context)?;
        },
        Commands::Generate { products, reviews_per_product, seed } => {
            if let Some(seed) = seed {
                context.config_mut().seed = seed;
            }
            commands::generate::execute(context, products, reviews_per_product)?;
        },
        Commands::Run { trials, capture, results_dir } => {
            if let Some(trials) = trials {
                context.config_mut().trials = trials;
            }
            if let Some(dir) = results_dir {
                context.config_mut().results_dir = dir;
            }
            context.config().validate()?;
            commands::run::execute(context, capture.into())?;
        },
        Commands::Analyze { input, results_dir } => {
            if let Some(dir) = results_dir {
                context.config_mut().results_dir = dir;
            }
            commands::analyze::execute(context, input.as_deref())?;
        },
    }

    Ok(())
}
