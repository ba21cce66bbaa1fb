//! Synthetic product catalogue
//!
//! Generates the products and reviews loaded into every backend. The
//! generator is seeded so two runs with the same seed produce the same
//! dataset, whatever the store.

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

pub const CATEGORIES: [&str; 5] = ["Electronics", "Books", "Clothing", "Home", "Sports"];

const MIN_PRICE: f64 = 10.0;
const MAX_PRICE: f64 = 500.0;
const DESCRIPTION_CHARS: usize = 200;
const REVIEW_CHARS: usize = 300;
const REVIEW_WINDOW_DAYS: i64 = 365;

const ADJECTIVES: &[&str] = &[
    "Adaptive", "Balanced", "Cloned", "Compatible", "Configurable", "Customizable",
    "Decentralized", "Ergonomic", "Expanded", "Focused", "Horizontal", "Innovative",
    "Integrated", "Managed", "Optional", "Proactive", "Robust", "Seamless",
    "Synergized", "Universal", "Upgradable", "Vertical", "Virtual", "Visionary",
];

const NOUNS: &[&str] = &[
    "ability", "adapter", "algorithm", "approach", "benchmark", "capability",
    "circuit", "database", "firmware", "framework", "hardware", "interface",
    "matrix", "middleware", "model", "paradigm", "portal", "protocol",
    "solution", "strategy", "system", "toolset", "workforce", "emulation",
];

const WORDS: &[&str] = &[
    "great", "quality", "price", "shipping", "works", "expected", "would", "again",
    "product", "recommend", "arrived", "quickly", "value", "poor", "broke", "after",
    "week", "love", "color", "size", "fits", "perfectly", "cheap", "sturdy",
    "design", "battery", "lasts", "long", "easy", "setup", "manual", "missing",
    "return", "refund", "happy", "purchase", "daily", "use", "kids", "gift",
];

const USER_PREFIXES: &[&str] = &[
    "alex", "blue", "casey", "dana", "echo", "frost", "gray", "harper",
    "indigo", "jules", "kai", "lee", "morgan", "nova", "orion", "pat",
];

/// A catalogue entry, as stored in the relational `products` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub description: String,
}

/// A customer review of a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub product_id: i64,
    pub user_name: String,
    pub rating: i64,
    pub review_text: String,
    pub date: DateTime<Utc>,
}

/// Products and their reviews
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub products: Vec<Product>,
    pub reviews: Vec<Review>,
}

/// Deterministic generator for [`Dataset`]s
pub struct DatasetGenerator {
    rng: ChaCha8Rng,
    now: DateTime<Utc>,
}

impl DatasetGenerator {
    pub fn new(seed: u64) -> Self {
        DatasetGenerator {
            rng: ChaCha8Rng::seed_from_u64(seed),
            now: Utc::now(),
        }
    }

    /// Pin the reference time used for review dates
    pub fn with_reference_time(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Generate a full dataset with up to `max_reviews` reviews per product
    pub fn generate(&mut self, product_count: usize, max_reviews: usize) -> Dataset {
        let products = self.products(product_count);
        let reviews = self.reviews(&products, max_reviews);
        Dataset { products, reviews }
    }

    /// Generate `count` products with ids starting at 1
    pub fn products(&mut self, count: usize) -> Vec<Product> {
        (1..=count as i64)
            .map(|id| {
                let price = self.rng.gen_range(MIN_PRICE..=MAX_PRICE);
                Product {
                    id,
                    name: self.catch_phrase(),
                    category: self.pick(&CATEGORIES).to_string(),
                    price: (price * 100.0).round() / 100.0,
                    description: self.text(DESCRIPTION_CHARS),
                }
            })
            .collect()
    }

    /// Generate between 1 and `max_per_product` reviews for every product
    pub fn reviews(&mut self, products: &[Product], max_per_product: usize) -> Vec<Review> {
        let max_per_product = max_per_product.max(1);
        let mut reviews = Vec::new();
        let mut review_id = 1;

        for product in products {
            let count = self.rng.gen_range(1..=max_per_product);
            for _ in 0..count {
                let age = self.rng.gen_range(0..REVIEW_WINDOW_DAYS * 24 * 3600);
                reviews.push(Review {
                    id: review_id,
                    product_id: product.id,
                    user_name: self.user_name(),
                    rating: self.rng.gen_range(1..=5),
                    review_text: self.text(REVIEW_CHARS),
                    date: self.now - Duration::seconds(age),
                });
                review_id += 1;
            }
        }

        reviews
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items.choose(&mut self.rng).copied().unwrap_or_default()
    }

    fn catch_phrase(&mut self) -> String {
        let first = self.pick(ADJECTIVES);
        let second = self.pick(ADJECTIVES).to_lowercase();
        let noun = self.pick(NOUNS);
        format!("{} {} {}", first, second, noun)
    }

    fn user_name(&mut self) -> String {
        let suffix: u16 = self.rng.gen_range(1..1000);
        format!("{}_{}", self.pick(USER_PREFIXES), suffix)
    }

    /// Sentences of random words, at most `max_chars` long
    fn text(&mut self, max_chars: usize) -> String {
        let target = self.rng.gen_range(max_chars / 4..=max_chars);
        let mut text = String::new();

        loop {
            let words = self.rng.gen_range(4..10);
            let mut sentence = String::new();
            for i in 0..words {
                let word = self.pick(WORDS);
                if i == 0 {
                    let mut chars = word.chars();
                    if let Some(first) = chars.next() {
                        sentence.extend(first.to_uppercase());
                        sentence.push_str(chars.as_str());
                    }
                } else {
                    sentence.push(' ');
                    sentence.push_str(word);
                }
            }
            sentence.push('.');

            let separator = if text.is_empty() { 0 } else { 1 };
            if text.len() + separator + sentence.len() > target {
                break;
            }
            if separator == 1 {
                text.push(' ');
            }
            text.push_str(&sentence);
        }

        if text.is_empty() {
            // Target shorter than any sentence: fall back to a single word
            text.push_str("Ok.");
        }

        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_products_are_well_formed() {
        let mut generator = DatasetGenerator::new(42);
        let products = generator.products(50);

        assert_eq!(products.len(), 50);
        for (i, product) in products.iter().enumerate() {
            assert_eq!(product.id, i as i64 + 1);
            assert!(CATEGORIES.contains(&product.category.as_str()));
            assert!(product.price >= MIN_PRICE && product.price <= MAX_PRICE);
            assert_eq!((product.price * 100.0).round() / 100.0, product.price);
            assert!(!product.description.is_empty());
            assert!(product.description.len() <= DESCRIPTION_CHARS);
        }
    }

    #[test]
    fn test_reviews_per_product() {
        let now = Utc::now();
        let mut generator = DatasetGenerator::new(7).with_reference_time(now);
        let dataset = generator.generate(20, 5);

        for product in &dataset.products {
            let count = dataset.reviews.iter().filter(|r| r.product_id == product.id).count();
            assert!((1..=5).contains(&count));
        }

        for (i, review) in dataset.reviews.iter().enumerate() {
            assert_eq!(review.id, i as i64 + 1);
            assert!((1..=5).contains(&review.rating));
            assert!(review.review_text.len() <= REVIEW_CHARS);
            assert!(review.date <= now);
            assert!(review.date > now - Duration::days(REVIEW_WINDOW_DAYS));
        }
    }

    #[test]
    fn test_same_seed_same_dataset() {
        let now = Utc::now();
        let a = DatasetGenerator::new(3).with_reference_time(now).generate(10, 3);
        let b = DatasetGenerator::new(3).with_reference_time(now).generate(10, 3);

        assert_eq!(a.products, b.products);
        assert_eq!(a.reviews, b.reviews);
    }
}
