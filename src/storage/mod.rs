//! Storage backends
//!
//! Every engine under test implements [`Backend`]: it can be seeded with a
//! [`Dataset`] and answers the same catalogue queries, each returning a list
//! of JSON rows.

pub mod document;
pub mod relational;

use std::fmt;

use crate::core::errors::Result;
use crate::workload::dataset::Dataset;

pub use document::SledDocumentBackend;
pub use relational::SqliteBackend;

/// A row returned by a backend query
pub type Row = serde_json::Value;

/// The catalogue queries measured on every backend
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// A product along with all of its reviews
    ProductWithReviews { product_id: i64 },
    /// Every product of a category
    ProductsByCategory { category: String },
    /// Products priced within `[min_price, max_price]`, with their average rating
    ProductsPriceRange { min_price: f64, max_price: f64 },
    /// Products whose average rating is at least `min_rating`
    ProductsWithHighRatings { min_rating: f64 },
    /// Products with at least one review mentioning `keyword` (case-insensitive)
    ProductsWithKeywordReviews { keyword: String },
    /// Average rating and review count of every product, best rated first
    AverageRatings,
}

impl Query {
    /// Stable operation name, shared by all engines
    pub fn name(&self) -> &'static str {
        match self {
            Query::ProductWithReviews { .. } => "get_product_with_reviews",
            Query::ProductsByCategory { .. } => "get_products_by_category",
            Query::ProductsPriceRange { .. } => "get_products_price_range",
            Query::ProductsWithHighRatings { .. } => "get_products_with_high_ratings",
            Query::ProductsWithKeywordReviews { .. } => "get_products_with_keyword_reviews",
            Query::AverageRatings => "get_average_ratings",
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::ProductWithReviews { product_id } => write!(f, "{}({})", self.name(), product_id),
            Query::ProductsByCategory { category } => write!(f, "{}({})", self.name(), category),
            Query::ProductsPriceRange { min_price, max_price } => {
                write!(f, "{}({}, {})", self.name(), min_price, max_price)
            },
            Query::ProductsWithHighRatings { min_rating } => write!(f, "{}({})", self.name(), min_rating),
            Query::ProductsWithKeywordReviews { keyword } => write!(f, "{}({})", self.name(), keyword),
            Query::AverageRatings => write!(f, "{}()", self.name()),
        }
    }
}

/// Trait defining the operations every benchmarked store provides
pub trait Backend {
    /// Engine label used in measurement records
    fn name(&self) -> &str;

    /// Check that the store can be reached
    fn ping(&self) -> Result<()>;

    /// Drop any existing data and load the dataset
    fn load(&mut self, dataset: &Dataset) -> Result<()>;

    /// Number of products currently stored
    fn count_products(&self) -> Result<usize>;

    /// Relative complexity of a query on this engine
    fn complexity(&self, query: &Query) -> u32;

    fn product_with_reviews(&self, product_id: i64) -> Result<Vec<Row>>;

    fn products_by_category(&self, category: &str) -> Result<Vec<Row>>;

    fn products_price_range(&self, min_price: f64, max_price: f64) -> Result<Vec<Row>>;

    fn products_with_high_ratings(&self, min_rating: f64) -> Result<Vec<Row>>;

    fn products_with_keyword_reviews(&self, keyword: &str) -> Result<Vec<Row>>;

    fn average_ratings(&self) -> Result<Vec<Row>>;

    /// Run any query
    fn execute(&self, query: &Query) -> Result<Vec<Row>> {
        match query {
            Query::ProductWithReviews { product_id } => self.product_with_reviews(*product_id),
            Query::ProductsByCategory { category } => self.products_by_category(category),
            Query::ProductsPriceRange { min_price, max_price } => {
                self.products_price_range(*min_price, *max_price)
            },
            Query::ProductsWithHighRatings { min_rating } => self.products_with_high_ratings(*min_rating),
            Query::ProductsWithKeywordReviews { keyword } => self.products_with_keyword_reviews(keyword),
            Query::AverageRatings => self.average_ratings(),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{TimeZone, Utc};

    use crate::workload::dataset::{Dataset, Product, Review};

    fn product(id: i64, category: &str, price: f64) -> Product {
        Product {
            id,
            name: format!("Product {}", id),
            category: category.to_string(),
            price,
            description: format!("Description of product {}", id),
        }
    }

    fn review(id: i64, product_id: i64, rating: i64, text: &str) -> Review {
        Review {
            id,
            product_id,
            user_name: format!("user_{}", id),
            rating,
            review_text: text.to_string(),
            date: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    /// Small catalogue with known answers for every query:
    ///
    /// | id | category    | price | ratings | avg |
    /// |----|-------------|-------|---------|-----|
    /// | 1  | Electronics | 120   | 5, 4    | 4.5 |
    /// | 2  | Books       | 15    | 2       | 2   |
    /// | 3  | Electronics | 480   | 3, 5, 4 | 4   |
    /// | 4  | Home        | 60    | -       | -   |
    pub fn catalogue() -> Dataset {
        Dataset {
            products: vec![
                product(1, "Electronics", 120.0),
                product(2, "Books", 15.0),
                product(3, "Electronics", 480.0),
                product(4, "Home", 60.0),
            ],
            reviews: vec![
                review(1, 1, 5, "Great sound, would buy again"),
                review(2, 1, 4, "Works as expected"),
                review(3, 2, 2, "Pages arrived torn"),
                review(4, 3, 3, "Okay value"),
                review(5, 3, 5, "Simply GREAT"),
                review(6, 3, 4, "Sturdy design"),
            ],
        }
    }
}
