//! The fixed list of queries instrumented against every backend

use log::{debug, info};

use crate::core::errors::Result;
use crate::core::harness::MeasurementHarness;
use crate::storage::{Backend, Query, Row};

/// Average rating from which a product counts as highly rated
pub const HIGH_RATING: f64 = 4.0;

/// Keyword searched in review texts
pub const KEYWORD: &str = "great";

/// Parameters of one pass over the per-product queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestCase {
    pub product_id: i64,
    pub category: &'static str,
    pub min_price: f64,
    pub max_price: f64,
}

pub const TEST_CASES: [TestCase; 3] = [
    TestCase { product_id: 1, category: "Electronics", min_price: 50.0, max_price: 200.0 },
    TestCase { product_id: 500, category: "Books", min_price: 10.0, max_price: 100.0 },
    TestCase { product_id: 750, category: "Clothing", min_price: 20.0, max_price: 150.0 },
];

impl TestCase {
    /// Queries of this case, in measurement order
    pub fn queries(&self) -> Vec<Query> {
        vec![
            Query::ProductWithReviews { product_id: self.product_id },
            Query::ProductsByCategory { category: self.category.to_string() },
            Query::ProductsPriceRange { min_price: self.min_price, max_price: self.max_price },
            Query::ProductsWithHighRatings { min_rating: HIGH_RATING },
            Query::ProductsWithKeywordReviews { keyword: KEYWORD.to_string() },
        ]
    }
}

/// Measure one query on one backend
pub fn measure_query(harness: &MeasurementHarness, backend: &dyn Backend, query: &Query) -> Result<Vec<Row>> {
    let instrument = harness.instrument(query.name(), backend.name(), backend.complexity(query));
    debug!("Measuring {} on {} (complexity {})",
        query, instrument.tag().engine, instrument.tag().complexity_score);

    instrument.call(|| backend.execute(query))
}

/// Run every test case against every backend, then the global aggregate.
///
/// Each query is measured on all backends before moving to the next one,
/// so records for the same operation sit next to each other in the log.
pub fn run_suite(harness: &MeasurementHarness, backends: &[&dyn Backend]) -> Result<()> {
    info!("Running suite on {} backend(s), {} trials per query",
        backends.len(), harness.trial_count());

    for case in TEST_CASES.iter() {
        info!("Test case: product {}, {} in [{}, {}]",
            case.product_id, case.category, case.min_price, case.max_price);

        for query in case.queries() {
            for backend in backends {
                measure_query(harness, *backend, &query)?;
            }
        }
    }

    for backend in backends {
        measure_query(harness, *backend, &Query::AverageRatings)?;
    }

    info!("Suite finished with {} records", harness.len());
    Ok(())
}
