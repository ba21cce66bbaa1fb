//! Configuration for storebench
//!
//! Settings are read once from environment variables into a [`Config`]
//! which is then passed around by reference.

use std::path::PathBuf;
use std::str::FromStr;

use crate::core::errors::{BenchError, Result};

pub const SQLITE_PATH_VAR: &str = "STOREBENCH_SQLITE_PATH";
pub const SLED_PATH_VAR: &str = "STOREBENCH_SLED_PATH";
pub const RESULTS_DIR_VAR: &str = "STOREBENCH_RESULTS_DIR";
pub const TRIALS_VAR: &str = "STOREBENCH_TRIALS";
pub const SEED_VAR: &str = "STOREBENCH_SEED";

/// Runtime configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// File holding the relational store
    pub sqlite_path: PathBuf,
    /// Directory holding the document store
    pub sled_path: PathBuf,
    /// Where CSV and JSON outputs are written
    pub results_dir: PathBuf,
    /// Timed trials per measured operation
    pub trials: u32,
    /// Seed of the dataset generator
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            sqlite_path: PathBuf::from("data/relational.sqlite3"),
            sled_path: PathBuf::from("data/documents.sled"),
            results_dir: PathBuf::from("results"),
            trials: 10,
            seed: 42,
        }
    }
}

impl Config {
    /// Build the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let config = Config {
            sqlite_path: lookup(SQLITE_PATH_VAR).map(PathBuf::from).unwrap_or(defaults.sqlite_path),
            sled_path: lookup(SLED_PATH_VAR).map(PathBuf::from).unwrap_or(defaults.sled_path),
            results_dir: lookup(RESULTS_DIR_VAR).map(PathBuf::from).unwrap_or(defaults.results_dir),
            trials: parse_var(&lookup, TRIALS_VAR)?.unwrap_or(defaults.trials),
            seed: parse_var(&lookup, SEED_VAR)?.unwrap_or(defaults.seed),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check values that cannot be expressed in the types
    pub fn validate(&self) -> Result<()> {
        if self.trials == 0 {
            return Err(BenchError::Config(format!("{} must be at least 1", TRIALS_VAR)));
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw.trim()
            .parse()
            .map(Some)
            .map_err(|e| BenchError::Config(format!("invalid {}={:?}: {}", key, raw, e))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            (SQLITE_PATH_VAR, "/tmp/bench.db"),
            (SLED_PATH_VAR, "/tmp/docs"),
            (TRIALS_VAR, " 25 "),
            (SEED_VAR, "7"),
        ])).unwrap();

        assert_eq!(config.sqlite_path, PathBuf::from("/tmp/bench.db"));
        assert_eq!(config.sled_path, PathBuf::from("/tmp/docs"));
        assert_eq!(config.results_dir, PathBuf::from("results"));
        assert_eq!(config.trials, 25);
        assert_eq!(config.seed, 7);
    }

    #[test]
    fn test_invalid_numbers() {
        let result = Config::from_lookup(lookup_from(&[(TRIALS_VAR, "ten")]));
        assert!(matches!(result, Err(BenchError::Config(_))));

        let result = Config::from_lookup(lookup_from(&[(TRIALS_VAR, "0")]));
        assert!(matches!(result, Err(BenchError::Config(_))));
    }
}
