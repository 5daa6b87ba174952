//! Query Execution - runs a statement against the product database
//!
//! Each call opens its own connection and drops it before returning, on
//! success and on failure alike. Nothing is pooled or retried.

use crate::error::{Nl2SqlError, Result};
use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags};
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// A single SQLite value as returned by a query
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<Value> for CellValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => CellValue::Null,
            Value::Integer(i) => CellValue::Integer(i),
            Value::Real(f) => CellValue::Real(f),
            Value::Text(s) => CellValue::Text(s),
            Value::Blob(b) => CellValue::Blob(b),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "NULL"),
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Real(r) => write!(f, "{}", r),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Blob(b) => write!(f, "[BLOB {} bytes]", b.len()),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            CellValue::Null => serializer.serialize_none(),
            CellValue::Integer(i) => serializer.serialize_i64(*i),
            CellValue::Real(r) => serializer.serialize_f64(*r),
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Blob(b) => serializer.serialize_bytes(b),
        }
    }
}

/// Rows and column names produced by one statement
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    /// Column names as reported by SQLite, in select-list order
    pub columns: Vec<String>,

    /// Rows in the order SQLite returned them
    pub rows: Vec<Vec<CellValue>>,

    /// Rows changed by a data-modifying statement (0 for queries)
    pub rows_affected: usize,

    pub execution_time_ms: u64,
}

impl QueryResult {
    /// True when the statement produced no rows. Not an error.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Runs statements against a single SQLite file
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    db_path: PathBuf,
}

impl QueryExecutor {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Fail with `DatabaseMissing` unless the file exists
    pub fn ensure_exists(&self) -> Result<()> {
        if self.db_path.is_file() {
            Ok(())
        } else {
            Err(Nl2SqlError::DatabaseMissing(self.db_path.clone()))
        }
    }

    /// Execute `sql` and collect every row.
    ///
    /// The database is opened read-write but never created; a missing file is
    /// reported instead of silently producing an empty database.
    pub fn execute(&self, sql: &str) -> Result<QueryResult> {
        self.ensure_exists()?;

        let started = Instant::now();
        let conn = Connection::open_with_flags(
            &self.db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        debug!("Opened connection to {}", self.db_path.display());

        let result = run_statement(&conn, sql);

        // Close explicitly so a close failure is not swallowed by Drop
        if let Err((_, e)) = conn.close() {
            return Err(Nl2SqlError::Database(format!("Failed to close connection: {}", e)));
        }
        debug!("Closed connection to {}", self.db_path.display());

        let (columns, rows, rows_affected) = result?;
        let execution_time_ms = started.elapsed().as_millis() as u64;
        info!(
            "Statement returned {} row(s), {} affected, in {} ms",
            rows.len(),
            rows_affected,
            execution_time_ms
        );

        Ok(QueryResult {
            columns,
            rows,
            rows_affected,
            execution_time_ms,
        })
    }
}

type StatementOutput = (Vec<String>, Vec<Vec<CellValue>>, usize);

fn run_statement(conn: &Connection, sql: &str) -> Result<StatementOutput> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
    let column_count = columns.len();

    let mut rows = Vec::new();
    let mut cursor = stmt.query([])?;
    while let Some(row) = cursor.next()? {
        let mut values = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            values.push(CellValue::from(row.get::<_, Value>(idx)?));
        }
        rows.push(values);
    }

    let rows_affected = if column_count == 0 { conn.changes() as usize } else { 0 };

    Ok((columns, rows, rows_affected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_database;

    fn seeded() -> (tempfile::TempDir, QueryExecutor) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.db");
        seed_database(&path).unwrap();
        (dir, QueryExecutor::new(path))
    }

    #[test]
    fn test_sum_stock_quantity() {
        let (_dir, executor) = seeded();
        let result = executor.execute("SELECT SUM(stock_quantity) FROM products;").unwrap();
        assert_eq!(result.columns, vec!["SUM(stock_quantity)".to_string()]);
        assert_eq!(result.rows, vec![vec![CellValue::Integer(740)]]);
    }

    #[test]
    fn test_rows_keep_order_and_types() {
        let (_dir, executor) = seeded();
        let result = executor
            .execute("SELECT product_name, price, category FROM products WHERE category = 'Furniture' OR price < 40 ORDER BY product_id;")
            .unwrap();
        assert_eq!(result.row_count(), 2);
        assert_eq!(
            result.rows[0],
            vec![
                CellValue::Text("Wireless Mouse".to_string()),
                CellValue::Real(35.5),
                CellValue::Text("Accessories".to_string()),
            ]
        );
        assert_eq!(result.rows[1][0], CellValue::Text("Ergonomic Chair".to_string()));
    }

    #[test]
    fn test_empty_result_is_not_an_error() {
        let (_dir, executor) = seeded();
        let result = executor
            .execute("SELECT * FROM products WHERE price > 100000;")
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(result.columns.len(), 5);
    }

    #[test]
    fn test_unknown_column_is_database_error() {
        let (_dir, executor) = seeded();
        let err = executor.execute("SELECT colour FROM products;").unwrap_err();
        match err {
            Nl2SqlError::Database(msg) => assert!(msg.contains("colour"), "{}", msg),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_update_reports_rows_affected() {
        let (_dir, executor) = seeded();
        let result = executor
            .execute("UPDATE products SET stock_quantity = 0 WHERE category = 'Accessories';")
            .unwrap();
        assert!(result.columns.is_empty());
        assert_eq!(result.rows_affected, 3);

        let total = executor.execute("SELECT SUM(stock_quantity) FROM products;").unwrap();
        assert_eq!(total.rows[0][0], CellValue::Integer(740 - 300 - 80 - 90));
    }

    #[test]
    fn test_missing_database_not_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");
        let executor = QueryExecutor::new(&path);

        let err = executor.execute("SELECT 1;").unwrap_err();
        assert!(matches!(err, Nl2SqlError::DatabaseMissing(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_cell_display_and_json() {
        assert_eq!(CellValue::Null.to_string(), "NULL");
        assert_eq!(CellValue::Real(35.5).to_string(), "35.5");
        assert_eq!(CellValue::Blob(vec![1, 2, 3]).to_string(), "[BLOB 3 bytes]");
        assert_eq!(
            serde_json::to_value(vec![CellValue::Integer(7), CellValue::Null]).unwrap(),
            serde_json::json!([7, null])
        );
    }
}
