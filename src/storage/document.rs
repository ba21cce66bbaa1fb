// src/storage/document.rs

//! Document backend over sled
//!
//! Each product is stored as one denormalised document embedding its
//! reviews along with a precomputed average rating. A secondary tree maps
//! categories to product ids.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use bincode::{deserialize, serialize};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sled::{Batch, Db, Tree};

use crate::core::errors::{BenchError, Result};
use crate::storage::{Backend, Query, Row};
use crate::workload::dataset::{Dataset, Review};

pub const ENGINE_NAME: &str = "Sled";

const PRODUCTS_TREE: &str = "products";
const CATEGORY_INDEX_TREE: &str = "idx_category";

/// Attempts made while another handle still holds the file lock
const LOCK_ATTEMPTS: u32 = 20;
const LOCK_BACKOFF: Duration = Duration::from_millis(50);

/// A product with its reviews embedded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDocument {
    #[serde(rename = "_id")]
    pub id: i64,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub description: String,
    pub reviews: Vec<Review>,
    /// Mean rating of the embedded reviews, 0 without reviews
    pub avg_rating: f64,
    pub review_count: u64,
}

impl ProductDocument {
    /// Whether any review mentions `needle` (already ASCII-lowercased).
    ///
    /// Only ASCII letters are case-folded, the way SQLite's `LIKE` does.
    fn mentions(&self, needle: &str) -> bool {
        self.reviews.iter().any(|r| r.review_text.to_ascii_lowercase().contains(needle))
    }
}

/// Build the documents of a dataset, reviews grouped under their product
pub fn build_documents(dataset: &Dataset) -> Vec<ProductDocument> {
    let mut by_product: HashMap<i64, Vec<Review>> = HashMap::new();
    for review in &dataset.reviews {
        by_product.entry(review.product_id).or_default().push(review.clone());
    }

    dataset.products.iter()
        .map(|product| {
            let reviews = by_product.remove(&product.id).unwrap_or_default();
            let avg_rating = if reviews.is_empty() {
                0.0
            } else {
                reviews.iter().map(|r| r.rating as f64).sum::<f64>() / reviews.len() as f64
            };

            ProductDocument {
                id: product.id,
                name: product.name.clone(),
                category: product.category.clone(),
                price: product.price,
                description: product.description.clone(),
                review_count: reviews.len() as u64,
                reviews,
                avg_rating,
            }
        })
        .collect()
}

fn product_key(id: i64) -> [u8; 8] {
    id.to_be_bytes()
}

/// Index key: category bytes, a 0 separator, then the product id
fn category_key(category: &str, id: i64) -> Vec<u8> {
    let mut key = category_prefix(category);
    key.extend_from_slice(&product_key(id));
    key
}

fn category_prefix(category: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(category.len() + 9);
    prefix.extend_from_slice(category.as_bytes());
    prefix.push(0);
    prefix
}

/// Whether sled failed because another handle holds the file lock
fn is_lock_contention(error: &sled::Error) -> bool {
    matches!(error, sled::Error::Io(e) if e.to_string().contains("could not acquire lock"))
}

/// Open the sled database, waiting briefly for a lock released by a dropped handle.
///
/// No background flusher is started: `load` flushes explicitly, so the lock
/// is released as soon as the last handle is dropped.
fn open_db(path: &Path) -> Result<Db> {
    let config = sled::Config::new()
        .path(path)
        .flush_every_ms(None);

    let mut attempt = 1;
    loop {
        match config.open() {
            Ok(db) => return Ok(db),
            Err(e) if is_lock_contention(&e) && attempt < LOCK_ATTEMPTS => {
                debug!("{} is locked, retrying ({}/{})", path.display(), attempt, LOCK_ATTEMPTS);
                attempt += 1;
                thread::sleep(LOCK_BACKOFF);
            },
            Err(e) => {
                return Err(BenchError::connectivity(ENGINE_NAME, format!("{}: {}", path.display(), e)));
            },
        }
    }
}

/// A persistent document store using sled
pub struct SledDocumentBackend {
    /// The underlying sled database
    db: Db,
    /// Product documents keyed by id
    products: Tree,
    /// Category index
    by_category: Tree,
    path: Option<PathBuf>,
}

impl SledDocumentBackend {
    /// Open the store at the given path, creating it if needed
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let db = open_db(path)?;

        let mut backend = Self::from_db(db)?;
        backend.path = Some(path.to_path_buf());
        Ok(backend)
    }

    /// Open a store that must already exist, never creating anything
    pub fn open_existing<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(BenchError::connectivity(ENGINE_NAME, format!("no store at {}", path.display())));
        }

        Self::open(path)
    }

    /// Open a throwaway store that is removed when dropped
    pub fn open_temporary() -> Result<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| BenchError::connectivity(ENGINE_NAME, e))?;

        Self::from_db(db)
    }

    fn from_db(db: Db) -> Result<Self> {
        let products = db.open_tree(PRODUCTS_TREE)
            .map_err(|e| BenchError::connectivity(ENGINE_NAME, format!("Failed to open products tree: {}", e)))?;
        let by_category = db.open_tree(CATEGORY_INDEX_TREE)
            .map_err(|e| BenchError::connectivity(ENGINE_NAME, format!("Failed to open category index: {}", e)))?;

        Ok(SledDocumentBackend {
            db,
            products,
            by_category,
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn decode(bytes: &[u8]) -> Result<ProductDocument> {
        deserialize(bytes)
            .map_err(|e| BenchError::Serialization(format!("Failed to deserialize document: {}", e)))
    }

    fn to_row(document: &ProductDocument) -> Result<Row> {
        serde_json::to_value(document)
            .map_err(|e| BenchError::Serialization(e.to_string()))
    }

    /// Fetch a document by id
    pub fn get_document(&self, id: i64) -> Result<Option<ProductDocument>> {
        let bytes = self.products.get(product_key(id))
            .map_err(|e| BenchError::Operation(format!("Failed to retrieve product {}: {}", id, e)))?;

        bytes.map(|b| Self::decode(&b)).transpose()
    }

    /// Full collection scan, keeping the documents accepted by `keep`
    fn scan<F>(&self, query: &str, mut keep: F) -> Result<Vec<ProductDocument>>
    where
        F: FnMut(&ProductDocument) -> bool,
    {
        let mut documents = Vec::new();

        for item in self.products.iter() {
            let (_, bytes) = item
                .map_err(|e| BenchError::Operation(format!("{}: failed to iterate products: {}", query, e)))?;
            let document = Self::decode(&bytes)?;
            if keep(&document) {
                documents.push(document);
            }
        }

        Ok(documents)
    }

    fn clear(&self) -> Result<()> {
        self.products.clear()
            .map_err(|e| BenchError::Storage(format!("Failed to clear products: {}", e)))?;
        self.by_category.clear()
            .map_err(|e| BenchError::Storage(format!("Failed to clear category index: {}", e)))
    }
}

impl Backend for SledDocumentBackend {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    fn ping(&self) -> Result<()> {
        self.db.size_on_disk()
            .map(|_| ())
            .map_err(|e| BenchError::connectivity(ENGINE_NAME, e))
    }

    fn load(&mut self, dataset: &Dataset) -> Result<()> {
        info!("Loading {} products and {} reviews into {}",
            dataset.products.len(), dataset.reviews.len(), ENGINE_NAME);

        self.clear()?;

        let mut documents = Batch::default();
        let mut index = Batch::default();
        for document in build_documents(dataset) {
            let bytes = serialize(&document)
                .map_err(|e| BenchError::Serialization(e.to_string()))?;
            documents.insert(&product_key(document.id)[..], bytes);
            index.insert(category_key(&document.category, document.id), &product_key(document.id)[..]);
        }

        self.products.apply_batch(documents)
            .map_err(|e| BenchError::Storage(format!("Failed to insert documents: {}", e)))?;
        self.by_category.apply_batch(index)
            .map_err(|e| BenchError::Storage(format!("Failed to insert index entries: {}", e)))?;

        self.db.flush()
            .map_err(|e| BenchError::Storage(format!("Failed to flush database: {}", e)))?;

        debug!("{} load flushed", ENGINE_NAME);
        Ok(())
    }

    fn count_products(&self) -> Result<usize> {
        Ok(self.products.len())
    }

    fn complexity(&self, _query: &Query) -> u32 {
        // Every query is a single-collection lookup or scan
        1
    }

    fn product_with_reviews(&self, product_id: i64) -> Result<Vec<Row>> {
        match self.get_document(product_id)? {
            Some(document) => Ok(vec![Self::to_row(&document)?]),
            None => Ok(Vec::new()),
        }
    }

    fn products_by_category(&self, category: &str) -> Result<Vec<Row>> {
        let mut rows = Vec::new();

        for item in self.by_category.scan_prefix(category_prefix(category)) {
            let (_, id_bytes) = item
                .map_err(|e| BenchError::Operation(format!("get_products_by_category: {}", e)))?;
            let bytes = self.products.get(&id_bytes)
                .map_err(|e| BenchError::Operation(format!("get_products_by_category: {}", e)))?
                .ok_or_else(|| BenchError::Storage(format!("Dangling category index entry for {}", category)))?;

            rows.push(Self::to_row(&Self::decode(&bytes)?)?);
        }

        Ok(rows)
    }

    fn products_price_range(&self, min_price: f64, max_price: f64) -> Result<Vec<Row>> {
        let documents = self.scan("get_products_price_range", |d| d.price >= min_price && d.price <= max_price)?;

        Ok(documents.iter()
            .map(|d| json!({
                "_id": d.id,
                "name": d.name,
                "price": d.price,
                "avg_rating": d.avg_rating,
            }))
            .collect())
    }

    fn products_with_high_ratings(&self, min_rating: f64) -> Result<Vec<Row>> {
        self.scan("get_products_with_high_ratings", |d| d.avg_rating >= min_rating)?
            .iter()
            .map(Self::to_row)
            .collect()
    }

    fn products_with_keyword_reviews(&self, keyword: &str) -> Result<Vec<Row>> {
        let needle = keyword.to_ascii_lowercase();

        self.scan("get_products_with_keyword_reviews", |d| d.mentions(&needle))?
            .iter()
            .map(Self::to_row)
            .collect()
    }

    fn average_ratings(&self) -> Result<Vec<Row>> {
        let mut documents = self.scan("get_average_ratings", |_| true)?;
        documents.sort_by(|a, b| {
            b.avg_rating.partial_cmp(&a.avg_rating)
                .unwrap_or(Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });

        Ok(documents.iter()
            .map(|d| json!({
                "_id": d.id,
                "name": d.name,
                "avg_rating": d.avg_rating,
                "review_count": d.review_count,
            }))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::fixtures::catalogue;
    use tempfile::tempdir;

    fn loaded() -> SledDocumentBackend {
        let mut backend = SledDocumentBackend::open_temporary().unwrap();
        backend.load(&catalogue()).unwrap();
        backend
    }

    fn ids(rows: &[Row]) -> Vec<i64> {
        rows.iter().map(|row| row["_id"].as_i64().unwrap()).collect()
    }

    #[test]
    fn test_build_documents() {
        let documents = build_documents(&catalogue());
        assert_eq!(documents.len(), 4);

        assert_eq!(documents[0].review_count, 2);
        assert_eq!(documents[0].avg_rating, 4.5);
        assert_eq!(documents[2].avg_rating, 4.0);
        assert_eq!(documents[3].review_count, 0);
        assert_eq!(documents[3].avg_rating, 0.0);
    }

    #[test]
    fn test_product_with_reviews_embeds_reviews() {
        let backend = loaded();

        let rows = backend.product_with_reviews(3).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["reviews"].as_array().unwrap().len(), 3);
        assert_eq!(rows[0]["review_count"], json!(3));

        assert!(backend.product_with_reviews(99).unwrap().is_empty());
    }

    #[test]
    fn test_category_index() {
        let backend = loaded();

        assert_eq!(ids(&backend.products_by_category("Electronics").unwrap()), vec![1, 3]);
        assert_eq!(ids(&backend.products_by_category("Books").unwrap()), vec![2]);
        assert!(backend.products_by_category("Elec").unwrap().is_empty());
    }

    #[test]
    fn test_price_range_projection() {
        let backend = loaded();

        let rows = backend.products_price_range(50.0, 200.0).unwrap();
        assert_eq!(ids(&rows), vec![1, 4]);
        assert_eq!(rows[0]["avg_rating"], json!(4.5));
        assert!(rows[0].get("description").is_none());
    }

    #[test]
    fn test_high_ratings_and_keywords() {
        let backend = loaded();

        assert_eq!(ids(&backend.products_with_high_ratings(4.0).unwrap()), vec![1, 3]);
        assert_eq!(ids(&backend.products_with_keyword_reviews("great").unwrap()), vec![1, 3]);
        assert_eq!(ids(&backend.products_with_keyword_reviews("TORN").unwrap()), vec![2]);
    }

    #[test]
    fn test_average_ratings_sorted() {
        let backend = loaded();

        let rows = backend.average_ratings().unwrap();
        assert_eq!(ids(&rows), vec![1, 3, 2, 4]);
        assert_eq!(rows[3]["review_count"], json!(0));
    }

    #[test]
    fn test_reload_replaces_data() {
        let mut backend = loaded();
        let mut smaller = catalogue();
        smaller.products.truncate(2);
        smaller.reviews.retain(|r| r.product_id <= 2);

        backend.load(&smaller).unwrap();
        assert_eq!(backend.count_products().unwrap(), 2);
        assert_eq!(ids(&backend.products_by_category("Electronics").unwrap()), vec![1]);
    }

    #[test]
    fn test_persistent_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("documents.sled");

        let mut backend = SledDocumentBackend::open(&path).unwrap();
        backend.load(&catalogue()).unwrap();

        backend.ping().unwrap();
        assert!(path.join("db").exists());
        assert_eq!(backend.path(), Some(path.as_path()));
        assert_eq!(backend.count_products().unwrap(), 4);
        assert_eq!(backend.get_document(1).unwrap().unwrap().reviews.len(), 2);
    }

    #[test]
    fn test_open_existing_does_not_create() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("documents.sled");

        let result = SledDocumentBackend::open_existing(&path);
        assert!(matches!(result, Err(ref e) if e.is_connectivity()));
        assert!(!dir.path().join("data").exists());
    }

    #[test]
    fn test_keyword_folds_ascii_only() {
        let mut dataset = catalogue();
        dataset.reviews[5].review_text = "ÉLÉGANT design".to_string();

        let mut backend = SledDocumentBackend::open_temporary().unwrap();
        backend.load(&dataset).unwrap();

        assert_eq!(ids(&backend.products_with_keyword_reviews("ÉlÉgant").unwrap()), vec![3]);
        assert!(backend.products_with_keyword_reviews("élégant").unwrap().is_empty());
    }
}
