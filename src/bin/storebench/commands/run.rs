use anyhow::{bail, Result};
use log::{info, warn};
use storebench::core::comparison::compare;
use storebench::core::export::{export_all, RunLog};
use storebench::core::stats::{engine_shares, summarize};
use storebench::storage::{document, relational};
use storebench::{run_suite, Backend, MeasurementHarness, ResultCapture};

use crate::commands::open_backends;
use crate::context::Context;

/// Exécute la suite de mesures puis exporte et affiche les résultats
pub fn execute(context: &Context, capture: ResultCapture) -> Result<()> {
    let config = context.config();
    let formatter = context.formatter();

    let (sqlite, sled) = open_backends(config)?;
    let backends: [&dyn Backend; 2] = [&sqlite, &sled];

    for backend in backends.iter() {
        if backend.count_products()? == 0 {
            bail!("{} ne contient aucun produit, lancez d'abord `storebench generate`", backend.name());
        }
    }

    let harness = MeasurementHarness::with_trials(config.trials)?.with_capture(capture);
    println!("{}", formatter.format_info("Mesures en cours..."));
    run_suite(&harness, &backends)?;

    let records = harness.into_records();
    println!("{}", formatter.format_success(&format!("{} mesures terminées", records.len())));
    println!("{}", formatter.format_records(&records)?);

    let summary = summarize(&records);
    let comparison = compare(&summary, document::ENGINE_NAME, relational::ENGINE_NAME);
    let shares = engine_shares(&records);

    let run = RunLog::new(config.trials, records);
    info!("Run {} ({})", run.run_id, run.timestamp);

    let files = export_all(&config.results_dir, &summary, Some(&comparison), Some(&run))?;
    if comparison.rows.is_empty() {
        warn!("Aucune opération commune aux deux moteurs");
    }

    println!("{}", formatter.format_summary(&summary)?);
    println!("{}", formatter.format_comparison(&comparison)?);
    println!("{}", formatter.format_shares(&shares)?);
    println!("{}", formatter.format_info(&format!("Résultats écrits dans {}", files.summary.display())));

    Ok(())
}
