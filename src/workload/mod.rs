//! What gets measured: the synthetic dataset and the query suite

pub mod dataset;
pub mod suite;

pub use dataset::{Dataset, DatasetGenerator, Product, Review};
pub use suite::{run_suite, TestCase, TEST_CASES};
