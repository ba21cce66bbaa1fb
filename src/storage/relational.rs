//! Relational backend over SQLite
//!
//! Products and reviews live in two normalised tables joined on
//! `reviews.product_id`. Queries are plain SQL run through cached
//! prepared statements.

use std::path::{Path, PathBuf};

use log::{debug, info};
use rusqlite::{params, Connection, OpenFlags, Params};
use serde_json::{json, Map};

use crate::core::errors::{BenchError, Result};
use crate::storage::{Backend, Query, Row};
use crate::workload::dataset::Dataset;

pub const ENGINE_NAME: &str = "SQLite";

const SCHEMA: &str = "
    DROP TABLE IF EXISTS reviews;
    DROP TABLE IF EXISTS products;

    CREATE TABLE products (
        id          INTEGER PRIMARY KEY,
        name        TEXT    NOT NULL,
        category    TEXT    NOT NULL,
        price       REAL    NOT NULL,
        description TEXT
    );

    CREATE TABLE reviews (
        id          INTEGER PRIMARY KEY,
        product_id  INTEGER NOT NULL REFERENCES products(id),
        user_name   TEXT    NOT NULL,
        rating      INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
        review_text TEXT,
        date        TEXT    NOT NULL
    );

    CREATE INDEX idx_reviews_product ON reviews(product_id);
    CREATE INDEX idx_products_category ON products(category);
";

const PRODUCT_COLUMNS: &str = "p.id, p.name, p.category, p.price, p.description";

/// SQLite store for the catalogue
pub struct SqliteBackend {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteBackend {
    /// Open (or create) the database file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .map_err(|e| BenchError::connectivity(ENGINE_NAME, format!("{}: {}", path.display(), e)))?;

        let backend = SqliteBackend {
            conn,
            path: Some(path.to_path_buf()),
        };
        backend.configure()?;
        Ok(backend)
    }

    /// Open a database file that must already exist, never creating it
    pub fn open_existing<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)
            .map_err(|e| BenchError::connectivity(ENGINE_NAME, format!("{}: {}", path.display(), e)))?;

        let backend = SqliteBackend {
            conn,
            path: Some(path.to_path_buf()),
        };
        backend.configure()?;
        Ok(backend)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| BenchError::connectivity(ENGINE_NAME, e))?;

        let backend = SqliteBackend { conn, path: None };
        backend.configure()?;
        Ok(backend)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn configure(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "PRAGMA foreign_keys = ON;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA temp_store = MEMORY;",
            )
            .map_err(|e| BenchError::connectivity(ENGINE_NAME, format!("pragma: {}", e)))
    }

    fn has_table(&self, table: &str) -> Result<bool> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![table],
                |row| row.get::<_, i64>(0),
            )
            .map(|count| count > 0)
            .map_err(|e| BenchError::Storage(format!("schema lookup: {}", e)))
    }

    /// Run a read query and convert every row to JSON
    fn query_rows<P, F>(&self, query: &str, sql: &str, params: P, mut to_json: F) -> Result<Vec<Row>>
    where
        P: Params,
        F: FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<Row>,
    {
        let mut stmt = self.conn
            .prepare_cached(sql)
            .map_err(|e| BenchError::Operation(format!("prepare {}: {}", query, e)))?;

        let rows = stmt
            .query_map(params, |row| to_json(row))
            .map_err(|e| BenchError::Operation(format!("{}: {}", query, e)))?
            .collect::<rusqlite::Result<Vec<Row>>>()
            .map_err(|e| BenchError::Operation(format!("{}: {}", query, e)))?;

        Ok(rows)
    }
}

/// Read the five leading product columns into a JSON object
fn product_fields(row: &rusqlite::Row<'_>) -> rusqlite::Result<Map<String, Row>> {
    let mut fields = Map::new();
    fields.insert("id".to_string(), json!(row.get::<_, i64>(0)?));
    fields.insert("name".to_string(), json!(row.get::<_, String>(1)?));
    fields.insert("category".to_string(), json!(row.get::<_, String>(2)?));
    fields.insert("price".to_string(), json!(row.get::<_, f64>(3)?));
    fields.insert("description".to_string(), json!(row.get::<_, Option<String>>(4)?));
    Ok(fields)
}

fn product_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Row> {
    Ok(Row::Object(product_fields(row)?))
}

/// Escape `%`, `_` and `\` so the keyword matches literally in a LIKE pattern
fn like_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl Backend for SqliteBackend {
    fn name(&self) -> &str {
        ENGINE_NAME
    }

    fn ping(&self) -> Result<()> {
        self.conn
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map(|_| ())
            .map_err(|e| BenchError::connectivity(ENGINE_NAME, e))
    }

    fn load(&mut self, dataset: &Dataset) -> Result<()> {
        info!("Loading {} products and {} reviews into {}",
            dataset.products.len(), dataset.reviews.len(), ENGINE_NAME);

        self.conn
            .execute_batch(SCHEMA)
            .map_err(|e| BenchError::Storage(format!("schema: {}", e)))?;

        let tx = self.conn
            .transaction()
            .map_err(|e| BenchError::Storage(format!("begin: {}", e)))?;
        {
            let mut insert_product = tx
                .prepare_cached(
                    "INSERT INTO products (id, name, category, price, description)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .map_err(|e| BenchError::Storage(format!("prepare products: {}", e)))?;
            for product in &dataset.products {
                insert_product
                    .execute(params![product.id, product.name, product.category, product.price, product.description])
                    .map_err(|e| BenchError::Storage(format!("insert product {}: {}", product.id, e)))?;
            }

            let mut insert_review = tx
                .prepare_cached(
                    "INSERT INTO reviews (id, product_id, user_name, rating, review_text, date)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                )
                .map_err(|e| BenchError::Storage(format!("prepare reviews: {}", e)))?;
            for review in &dataset.reviews {
                insert_review
                    .execute(params![
                        review.id,
                        review.product_id,
                        review.user_name,
                        review.rating,
                        review.review_text,
                        review.date.to_rfc3339()
                    ])
                    .map_err(|e| BenchError::Storage(format!("insert review {}: {}", review.id, e)))?;
            }
        }
        tx.commit()
            .map_err(|e| BenchError::Storage(format!("commit: {}", e)))?;

        debug!("{} load committed", ENGINE_NAME);
        Ok(())
    }

    fn count_products(&self) -> Result<usize> {
        // A database that was never loaded holds no products
        if !self.has_table("products")? {
            return Ok(0);
        }

        self.conn
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get::<_, i64>(0))
            .map(|count| count as usize)
            .map_err(|e| BenchError::Storage(format!("count products: {}", e)))
    }

    fn complexity(&self, query: &Query) -> u32 {
        match query {
            Query::ProductsByCategory { .. } => 1,
            Query::ProductWithReviews { .. }
            | Query::ProductsPriceRange { .. }
            | Query::ProductsWithHighRatings { .. } => 2,
            Query::ProductsWithKeywordReviews { .. } | Query::AverageRatings => 3,
        }
    }

    fn product_with_reviews(&self, product_id: i64) -> Result<Vec<Row>> {
        let sql = format!(
            "SELECT {}, r.user_name, r.rating, r.review_text, r.date
             FROM products p
             LEFT JOIN reviews r ON p.id = r.product_id
             WHERE p.id = ?1
             ORDER BY r.id",
            PRODUCT_COLUMNS
        );

        self.query_rows("get_product_with_reviews", &sql, params![product_id], |row| {
            let mut fields = product_fields(row)?;
            fields.insert("user_name".to_string(), json!(row.get::<_, Option<String>>(5)?));
            fields.insert("rating".to_string(), json!(row.get::<_, Option<i64>>(6)?));
            fields.insert("review_text".to_string(), json!(row.get::<_, Option<String>>(7)?));
            fields.insert("date".to_string(), json!(row.get::<_, Option<String>>(8)?));
            Ok(Row::Object(fields))
        })
    }

    fn products_by_category(&self, category: &str) -> Result<Vec<Row>> {
        let sql = format!(
            "SELECT {} FROM products p WHERE p.category = ?1 ORDER BY p.id",
            PRODUCT_COLUMNS
        );

        self.query_rows("get_products_by_category", &sql, params![category], product_row)
    }

    fn products_price_range(&self, min_price: f64, max_price: f64) -> Result<Vec<Row>> {
        let sql = format!(
            "SELECT {}, AVG(r.rating) AS avg_rating
             FROM products p
             LEFT JOIN reviews r ON p.id = r.product_id
             WHERE p.price BETWEEN ?1 AND ?2
             GROUP BY p.id
             ORDER BY p.id",
            PRODUCT_COLUMNS
        );

        self.query_rows("get_products_price_range", &sql, params![min_price, max_price], |row| {
            let mut fields = product_fields(row)?;
            fields.insert("avg_rating".to_string(), json!(row.get::<_, Option<f64>>(5)?));
            Ok(Row::Object(fields))
        })
    }

    fn products_with_high_ratings(&self, min_rating: f64) -> Result<Vec<Row>> {
        let sql = format!(
            "SELECT {}
             FROM products p
             JOIN reviews r ON p.id = r.product_id
             GROUP BY p.id
             HAVING AVG(r.rating) >= ?1
             ORDER BY p.id",
            PRODUCT_COLUMNS
        );

        self.query_rows("get_products_with_high_ratings", &sql, params![min_rating], product_row)
    }

    fn products_with_keyword_reviews(&self, keyword: &str) -> Result<Vec<Row>> {
        let sql = format!(
            "SELECT {}
             FROM products p
             WHERE EXISTS (
                 SELECT 1
                 FROM reviews r
                 WHERE r.product_id = p.id
                 AND r.review_text LIKE ?1 ESCAPE '\\'
             )
             ORDER BY p.id",
            PRODUCT_COLUMNS
        );

        self.query_rows("get_products_with_keyword_reviews", &sql, params![like_pattern(keyword)], product_row)
    }

    fn average_ratings(&self) -> Result<Vec<Row>> {
        let sql = "SELECT p.id, p.name, AVG(r.rating) AS avg_rating, COUNT(r.id) AS review_count
                   FROM products p
                   LEFT JOIN reviews r ON p.id = r.product_id
                   GROUP BY p.id, p.name
                   ORDER BY avg_rating DESC, p.id";

        self.query_rows("get_average_ratings", sql, params![], |row| {
            Ok(json!({
                "id": row.get::<_, i64>(0)?,
                "name": row.get::<_, String>(1)?,
                "avg_rating": row.get::<_, Option<f64>>(2)?,
                "review_count": row.get::<_, i64>(3)?,
            }))
        })
    }
}
