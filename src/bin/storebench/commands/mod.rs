pub mod check;
pub mod generate;
pub mod run;
pub mod analyze;

use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};
use storebench::{Config, SledDocumentBackend, SqliteBackend};

/// Ouvre les deux bases configurées, en créant leurs répertoires si besoin
pub fn open_backends(config: &Config) -> Result<(SqliteBackend, SledDocumentBackend)> {
    ensure_parent(&config.sqlite_path)?;
    ensure_parent(&config.sled_path)?;

    let sqlite = SqliteBackend::open(&config.sqlite_path)?;
    let sled = SledDocumentBackend::open(&config.sled_path)?;
    Ok((sqlite, sled))
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer {}", parent.display()))?;
    }
    Ok(())
}
