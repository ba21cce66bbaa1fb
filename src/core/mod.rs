pub mod errors;
pub mod record;
pub mod harness;
pub mod stats;
pub mod comparison;
pub mod export;


pub use errors::{Result, BenchError};
pub use record::{MeasurementRecord, OperationTag, ResultCount};
pub use harness::{MeasurementHarness, Instrument, ResultCapture};
pub use stats::{SummaryRow, EngineShare};
pub use comparison::{Comparison, ComparisonRow, Speedup};
