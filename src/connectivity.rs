//! Reachability check of the configured stores
//!
//! The check never creates a store: a configured path that does not exist
//! yet is reported as unreachable.

use std::fmt;

use log::{info, warn};

use crate::config::Config;
use crate::core::errors::Result;
use crate::storage::{relational, document, Backend, SledDocumentBackend, SqliteBackend};

/// Outcome of pinging one store
#[derive(Debug)]
pub struct ConnectivityReport {
    pub engine: String,
    /// Products found in the store, or why it could not be reached
    pub outcome: Result<usize>,
}

impl ConnectivityReport {
    pub fn is_reachable(&self) -> bool {
        self.outcome.is_ok()
    }
}

impl fmt::Display for ConnectivityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            Ok(count) => write!(f, "{} connected ({} products)", self.engine, count),
            Err(e) => write!(f, "{} error: {}", self.engine, e),
        }
    }
}

/// Ping an opened backend and count what it holds
pub fn check_backend(backend: &dyn Backend) -> ConnectivityReport {
    ConnectivityReport {
        engine: backend.name().to_string(),
        outcome: backend.ping().and_then(|_| backend.count_products()),
    }
}

fn report<B, F>(engine: &str, open: F) -> ConnectivityReport
where
    B: Backend,
    F: FnOnce() -> Result<B>,
{
    let report = match open() {
        Ok(backend) => check_backend(&backend),
        Err(e) => ConnectivityReport {
            engine: engine.to_string(),
            outcome: Err(e),
        },
    };

    match &report.outcome {
        Ok(_) => info!("{}", report),
        Err(_) => warn!("{}", report),
    }

    report
}

/// Check every configured store; individual failures end up in the reports
pub fn check_all(config: &Config) -> Vec<ConnectivityReport> {
    vec![
        report(relational::ENGINE_NAME, || SqliteBackend::open_existing(&config.sqlite_path)),
        report(document::ENGINE_NAME, || SledDocumentBackend::open_existing(&config.sled_path)),
    ]
}

/// Number of reachable stores among `reports`
pub fn reachable_count(reports: &[ConnectivityReport]) -> usize {
    reports.iter().filter(|r| r.is_reachable()).count()
}
