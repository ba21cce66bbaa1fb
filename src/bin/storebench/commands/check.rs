use anyhow::Result;
use storebench::connectivity;

use crate::context::Context;

/// Vérifie la connexion aux deux bases.
///
/// Une base injoignable est signalée mais ne fait pas échouer la commande.
pub fn execute(context: &Context) -> Result<()> {
    let config = context.config();

    if context.verbosity() > 0 {
        println!("{}", context.formatter().format_info(&format!(
            "SQLite: {} | Sled: {}", config.sqlite_path.display(), config.sled_path.display())));
    }

    let reports = connectivity::check_all(config);
    println!("{}", context.formatter().format_connectivity(&reports)?);

    let reachable = connectivity::reachable_count(&reports);
    let summary = format!("{}/{} bases joignables", reachable, reports.len());
    if reachable == reports.len() {
        println!("{}", context.formatter().format_success(&summary));
    } else {
        println!("{}", context.formatter().format_info(&summary));
    }

    Ok(())
}
