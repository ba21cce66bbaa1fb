mod app;
mod context;
mod commands;
mod formatters;

use anyhow::Result;
use log::info;

fn main() -> Result<()> {
    // Le logger est initialisé par app::run une fois la verbosité connue
    let result = app::run();

    info!("Fin de storebench");

    result
}
