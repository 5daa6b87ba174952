//! Database seeding
//!
//! Destructively recreates the product database: any existing file at the
//! target path is removed before the schema and the fixed sample rows are
//! written. Not safe to run while another process has the file open.

use crate::error::Result;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use tracing::info;

/// DDL for the single table the assistant knows about. Also the default
/// schema text embedded in prompts.
pub const PRODUCTS_DDL: &str = "CREATE TABLE products (
    product_id INTEGER PRIMARY KEY,
    product_name TEXT NOT NULL,
    category TEXT,
    price REAL,
    stock_quantity INTEGER
);";

/// A row of sample data (product_id is assigned by SQLite)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleProduct {
    pub name: &'static str,
    pub category: &'static str,
    pub price: f64,
    pub stock_quantity: i64,
}

pub const SAMPLE_PRODUCTS: [SampleProduct; 7] = [
    SampleProduct { name: "Laptop Pro", category: "Electronics", price: 1200.00, stock_quantity: 50 },
    SampleProduct { name: "Mechanical Keyboard", category: "Electronics", price: 150.00, stock_quantity: 120 },
    SampleProduct { name: "Wireless Mouse", category: "Accessories", price: 35.50, stock_quantity: 300 },
    SampleProduct { name: "USB-C Hub", category: "Accessories", price: 50.00, stock_quantity: 80 },
    SampleProduct { name: "Monitor 27-inch", category: "Electronics", price: 300.00, stock_quantity: 70 },
    SampleProduct { name: "Ergonomic Chair", category: "Furniture", price: 350.00, stock_quantity: 30 },
    SampleProduct { name: "Webcam Full HD", category: "Accessories", price: 75.00, stock_quantity: 90 },
];

/// Outcome of a seeding run
#[derive(Debug, Clone)]
pub struct SeedReport {
    pub path: PathBuf,
    pub replaced_existing: bool,
    pub rows_inserted: usize,
}

/// Remove the database at `path` (if any), recreate the schema and insert
/// the sample products.
pub fn seed_database(path: impl AsRef<Path>) -> Result<SeedReport> {
    let path = path.as_ref();

    let replaced_existing = path.exists();
    if replaced_existing {
        std::fs::remove_file(path)?;
        info!("Existing database '{}' removed", path.display());
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut conn = Connection::open(path)?;
    conn.execute(PRODUCTS_DDL, [])?;
    info!("Table 'products' created");

    let tx = conn.transaction()?;
    let mut rows_inserted = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO products (product_name, category, price, stock_quantity) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for product in &SAMPLE_PRODUCTS {
            rows_inserted += stmt.execute(params![
                product.name,
                product.category,
                product.price,
                product.stock_quantity,
            ])?;
        }
    }
    tx.commit()?;
    info!("Inserted {} sample products into '{}'", rows_inserted, path.display());

    Ok(SeedReport {
        path: path.to_path_buf(),
        replaced_existing,
        rows_inserted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_rows(path: &Path) -> i64 {
        let conn = Connection::open(path).unwrap();
        conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_seed_creates_seven_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.db");

        let report = seed_database(&path).unwrap();
        assert!(!report.replaced_existing);
        assert_eq!(report.rows_inserted, 7);
        assert_eq!(count_rows(&path), 7);
    }

    #[test]
    fn test_reseed_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.db");

        seed_database(&path).unwrap();
        let report = seed_database(&path).unwrap();
        assert!(report.replaced_existing);
        assert_eq!(count_rows(&path), 7);
    }

    #[test]
    fn test_seed_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("products.db");

        seed_database(&path).unwrap();
        assert_eq!(count_rows(&path), 7);
    }

    #[test]
    fn test_sample_stock_total() {
        let total: i64 = SAMPLE_PRODUCTS.iter().map(|p| p.stock_quantity).sum();
        assert_eq!(total, 740);
    }
}
