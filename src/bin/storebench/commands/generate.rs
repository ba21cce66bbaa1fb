use std::path::Path;

use anyhow::Result;
use log::info;
use storebench::{Backend, Dataset, DatasetGenerator};

use crate::commands::open_backends;
use crate::context::Context;

/// Génère le jeu de données et le charge dans les deux bases
pub fn execute(context: &Context, products: usize, reviews_per_product: usize) -> Result<()> {
    let config = context.config();

    info!("Génération de {} produits (graine {})", products, config.seed);
    let dataset = DatasetGenerator::new(config.seed).generate(products, reviews_per_product);

    let (mut sqlite, mut sled) = open_backends(config)?;

    sqlite.load(&dataset)?;
    println!("{}", context.formatter().format_success(&loaded(&sqlite, sqlite.path(), &dataset)));

    sled.load(&dataset)?;
    println!("{}", context.formatter().format_success(&loaded(&sled, sled.path(), &dataset)));

    Ok(())
}

fn loaded(backend: &dyn Backend, path: Option<&Path>, dataset: &Dataset) -> String {
    let location = path.map(|p| p.display().to_string()).unwrap_or_else(|| "mémoire".to_string());
    format!("{} ({}): {} produits, {} avis chargés",
        backend.name(), location, dataset.products.len(), dataset.reviews.len())
}
