//! The query backend contract.
//!
//! The engine talks to the database only through [`QueryBackend`] and
//! [`Cursor`]. A cursor is consumed either by streaming (`step`/`text`) or,
//! after [`Cursor::materialize`], by random access on a [`ResultTable`].
//! Materializing consumes the cursor, so the two access styles cannot be
//! mixed on one result.

use tracing::info;

use crate::errors::{Result, SpError};

pub mod sqlite;

pub use sqlite::SqliteBackend;

// ============================================================================
// CONTRACT
// ============================================================================

/// A database connection able to run statements and queries.
pub trait QueryBackend {
    /// Short backend name for log output.
    fn name(&self) -> &'static str;

    /// Execute statements without a result.
    fn execute(&mut self, sql: &str) -> Result<()>;

    /// Run a query with positional parameters.
    fn query(&mut self, sql: &str, params: &[String]) -> Result<Box<dyn Cursor>>;

    /// Test whether a table exists.
    fn exists_table(&mut self, name: &str) -> Result<bool>;

    /// Quote a table or column name.
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Placeholder text for the `i`-th parameter, zero-based.
    fn placeholder(&self, i: usize) -> String;

    fn begin(&mut self) -> Result<()> {
        self.execute("BEGIN TRANSACTION")
    }

    fn commit(&mut self) -> Result<()> {
        self.execute("COMMIT TRANSACTION")
    }

    fn rollback(&mut self) -> Result<()> {
        self.execute("ROLLBACK TRANSACTION")
    }
}

/// A streaming query result.
pub trait Cursor {
    /// The query text this cursor was created for.
    fn query(&self) -> &str;

    fn num_cols(&self) -> usize;

    fn col_name(&self, col: usize) -> &str;

    /// Advance to the next row; false once the result is exhausted.
    fn step(&mut self) -> Result<bool>;

    /// Zero-based index of the current row, `None` before the first `step`.
    fn current_row(&self) -> Option<usize>;

    fn is_null(&self, col: usize) -> bool;

    /// Text of column `col` in the current row; empty for NULL.
    fn text(&self, col: usize) -> &str;

    /// Read the remaining rows into memory for random access.
    fn materialize(mut self: Box<Self>) -> Result<ResultTable> {
        let columns = (0..self.num_cols())
            .map(|j| self.col_name(j).to_string())
            .collect();
        let mut rows = Vec::new();
        while self.step()? {
            let row = (0..self.num_cols())
                .map(|j| (!self.is_null(j)).then(|| self.text(j).to_string()))
                .collect();
            rows.push(row);
        }
        Ok(ResultTable::new(self.query(), columns, rows))
    }
}

/// Index of the column called `name` in a streaming result.
pub fn find_col(cursor: &dyn Cursor, name: &str) -> Option<usize> {
    (0..cursor.num_cols()).find(|&j| cursor.col_name(j) == name)
}

// ============================================================================
// MATERIALIZED RESULT
// ============================================================================

/// A fully cached query result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultTable {
    query: String,
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl ResultTable {
    pub fn new(
        query: impl Into<String>,
        columns: Vec<String>,
        rows: Vec<Vec<Option<String>>>,
    ) -> Self {
        Self {
            query: query.into(),
            columns,
            rows,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn col_name(&self, col: usize) -> &str {
        &self.columns[col]
    }

    pub fn is_null(&self, row: usize, col: usize) -> bool {
        self.rows[row][col].is_none()
    }

    pub fn text(&self, row: usize, col: usize) -> &str {
        self.rows[row][col].as_deref().unwrap_or("")
    }
}

// ============================================================================
// CONNECTION FACTORY
// ============================================================================

/// Open a backend for a connection string.
///
/// Empty strings, `:memory:` and `sqlite::memory:` open an in-memory SQLite
/// database; `sqlite:<path>` or a path ending in `.db`, `.sqlite` or
/// `.sqlite3` opens a SQLite file.
pub fn connect(conninfo: &str) -> Result<Box<dyn QueryBackend>> {
    let conninfo = conninfo.trim();

    let backend = match conninfo {
        "" | ":memory:" | "sqlite::memory:" | "sqlite:" => SqliteBackend::open_in_memory()?,
        _ if conninfo.starts_with("sqlite:") => {
            SqliteBackend::open(&conninfo["sqlite:".len()..])?
        }
        _ if [".db", ".sqlite", ".sqlite3"]
            .iter()
            .any(|ext| conninfo.ends_with(ext)) =>
        {
            SqliteBackend::open(conninfo)?
        }
        _ => {
            let scheme = conninfo.split(':').next().unwrap_or(conninfo);
            let message = match scheme {
                "postgres" | "postgresql" | "pgsql" | "mysql" => {
                    format!("the {} backend is not available in this build", scheme)
                }
                _ => "unrecognized connection string".to_string(),
            };
            return Err(SpError::connect(conninfo, message));
        }
    };

    info!("Connected to {} database {:?}", backend.name(), conninfo);
    Ok(Box::new(backend))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_memory() {
        let mut db = connect("").unwrap();
        db.execute("CREATE TABLE t (a INTEGER)").unwrap();
        assert!(db.exists_table("t").unwrap());
    }

    #[test]
    fn test_connect_rejects_unknown_backends() {
        let err = connect("postgresql://localhost/test").err().unwrap();
        assert!(matches!(err, SpError::Connect { .. }));
        assert!(err.to_string().contains("not available"));
    }

    #[test]
    fn test_materialize_after_query() {
        let mut db = connect(":memory:").unwrap();
        let cursor = db
            .query("SELECT 1 AS a, NULL AS b UNION ALL SELECT 2, 'x'", &[])
            .unwrap();
        let table = cursor.materialize().unwrap();
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.col_name(1), "b");
        assert!(table.is_null(0, 1));
        assert_eq!(table.text(0, 1), "");
        assert_eq!(table.text(1, 1), "x");
    }
}
