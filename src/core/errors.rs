//! Error types for storebench
//!
//! This module defines the errors that can occur while measuring
//! operations, talking to a backing store or exporting results.

use thiserror::Error;

/// Errors that can occur during a measurement session
#[derive(Error, Debug)]
pub enum BenchError {
    /// A measured operation failed (query error, malformed input...)
    #[error("Operation failed: {0}")]
    Operation(String),

    /// A backing store could not be reached
    #[error("Cannot connect to {engine}: {reason}")]
    Connectivity { engine: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl BenchError {
    /// Build a connectivity error for the given engine
    pub fn connectivity<E: ToString, R: ToString>(engine: E, reason: R) -> Self {
        BenchError::Connectivity {
            engine: engine.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error means the store could not be reached at all
    pub fn is_connectivity(&self) -> bool {
        matches!(self, BenchError::Connectivity { .. })
    }
}

/// Result type for measurement operations
pub type Result<T> = std::result::Result<T, BenchError>;
