//! storebench: query latency benchmarks between a relational and a document store
//!
//! This crate provides a measurement harness that times arbitrary
//! operations and accumulates tagged records, the stores it is pointed at,
//! and the statistics computed from the records afterwards.

pub mod core;
pub mod storage;
pub mod workload;
pub mod config;
pub mod connectivity;

pub use crate::core::{
    BenchError, Result,
    MeasurementHarness, Instrument, ResultCapture,
    MeasurementRecord, OperationTag, ResultCount,
    SummaryRow, EngineShare, Comparison, ComparisonRow, Speedup,
};
pub use crate::config::Config;
pub use crate::storage::{Backend, Query, Row, SledDocumentBackend, SqliteBackend};
pub use crate::workload::{run_suite, Dataset, DatasetGenerator};
