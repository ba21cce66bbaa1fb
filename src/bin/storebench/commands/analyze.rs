use std::path::Path;

use anyhow::Result;
use storebench::core::comparison::compare;
use storebench::core::export::{export_all, load_run, RECORDS_FILE};
use storebench::core::stats::{engine_shares, summarize};
use storebench::storage::{document, relational};

use crate::context::Context;

/// Recalcule le résumé d'une exécution enregistrée et réécrit les CSV
pub fn execute(context: &Context, input: Option<&Path>) -> Result<()> {
    let config = context.config();
    let formatter = context.formatter();

    let default_input = config.results_dir.join(RECORDS_FILE);
    let input = input.unwrap_or(default_input.as_path());

    let run = load_run(input)?;
    println!("{}", formatter.format_info(&format!(
        "Run {} du {}: {} mesures", run.run_id, run.timestamp.format("%Y-%m-%d %H:%M:%S"), run.records.len())));

    let summary = summarize(&run.records);
    let comparison = compare(&summary, document::ENGINE_NAME, relational::ENGINE_NAME);
    let shares = engine_shares(&run.records);

    let files = export_all(&config.results_dir, &summary, Some(&comparison), None)?;

    println!("{}", formatter.format_summary(&summary)?);
    println!("{}", formatter.format_comparison(&comparison)?);
    println!("{}", formatter.format_shares(&shares)?);
    println!("{}", formatter.format_success(&format!("Résumé réécrit dans {}", files.summary.display())));

    Ok(())
}
