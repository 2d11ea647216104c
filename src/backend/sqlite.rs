//! SQLite backend on top of `rusqlite`.
//!
//! SQLite results are local, so a query is stepped to completion when it is
//! issued and the cursor streams over the buffered rows.

use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection};

use super::{Cursor, QueryBackend, ResultTable};
use crate::errors::{Result, SpError};

pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    pub fn open_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| SpError::connect(":memory:", e))?;
        Ok(Self { conn })
    }

    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| SpError::connect(path, e))?;
        Ok(Self { conn })
    }
}

/// Text representation of a SQLite value, following SQLite's own casts.
fn value_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(real_text(f)),
        ValueRef::Text(t) | ValueRef::Blob(t) => Some(String::from_utf8_lossy(t).into_owned()),
    }
}

/// Integral reals keep a trailing `.0`, as `CAST(x AS TEXT)` does.
fn real_text(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{:.1}", f)
    } else {
        format!("{}", f)
    }
}

impl QueryBackend for SqliteBackend {
    fn name(&self) -> &'static str {
        "SQLite"
    }

    fn execute(&mut self, sql: &str) -> Result<()> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| SpError::query(sql, e))
    }

    fn query(&mut self, sql: &str, params: &[String]) -> Result<Box<dyn Cursor>> {
        let mut stmt = self.conn.prepare(sql).map_err(|e| SpError::query(sql, e))?;

        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        let mut result = stmt
            .query(params_from_iter(params.iter()))
            .map_err(|e| SpError::query(sql, e))?;

        while let Some(row) = result.next().map_err(|e| SpError::query(sql, e))? {
            let mut cells = Vec::with_capacity(columns.len());
            for j in 0..columns.len() {
                let value = row.get_ref(j).map_err(|e| SpError::query(sql, e))?;
                cells.push(value_text(value));
            }
            rows.push(cells);
        }

        Ok(Box::new(SqliteCursor {
            query: sql.to_string(),
            columns,
            rows,
            pos: None,
        }))
    }

    fn exists_table(&mut self, name: &str) -> Result<bool> {
        const SQL: &str = "SELECT COUNT(*) FROM \
             (SELECT name FROM sqlite_master WHERE type = 'table' \
              UNION ALL SELECT name FROM sqlite_temp_master WHERE type = 'table') \
             WHERE name = ?1";
        let count: i64 = self
            .conn
            .query_row(SQL, [name], |row| row.get(0))
            .map_err(|e| SpError::query(SQL, e))?;
        Ok(count > 0)
    }

    fn placeholder(&self, i: usize) -> String {
        format!("?{}", i + 1)
    }
}

struct SqliteCursor {
    query: String,
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
    pos: Option<usize>,
}

impl SqliteCursor {
    fn cell(&self, col: usize) -> Option<&str> {
        let row = self.pos?;
        self.rows.get(row)?.get(col)?.as_deref()
    }
}

impl Cursor for SqliteCursor {
    fn query(&self) -> &str {
        &self.query
    }

    fn num_cols(&self) -> usize {
        self.columns.len()
    }

    fn col_name(&self, col: usize) -> &str {
        &self.columns[col]
    }

    fn step(&mut self) -> Result<bool> {
        let next = self.pos.map_or(0, |p| p + 1);
        self.pos = Some(next.min(self.rows.len()));
        Ok(next < self.rows.len())
    }

    fn current_row(&self) -> Option<usize> {
        self.pos.filter(|&p| p < self.rows.len())
    }

    fn is_null(&self, col: usize) -> bool {
        self.cell(col).is_none()
    }

    fn text(&self, col: usize) -> &str {
        self.cell(col).unwrap_or("")
    }

    fn materialize(self: Box<Self>) -> Result<ResultTable> {
        let start = self.pos.map_or(0, |p| p + 1).min(self.rows.len());
        let SqliteCursor {
            query,
            columns,
            mut rows,
            ..
        } = *self;
        rows.drain(..start);
        Ok(ResultTable::new(query, columns, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_streaming_cursor() {
        let mut db = SqliteBackend::open_in_memory().unwrap();
        db.execute("CREATE TABLE t (x INTEGER, y REAL, s TEXT); \
                    INSERT INTO t VALUES (1, 2.5, 'a'), (2, 4.0, NULL);")
            .unwrap();

        let mut cursor = db.query("SELECT x, y, s FROM t ORDER BY x", &[]).unwrap();
        assert_eq!(cursor.num_cols(), 3);
        assert_eq!(cursor.current_row(), None);

        assert!(cursor.step().unwrap());
        assert_eq!(cursor.current_row(), Some(0));
        assert_eq!(cursor.text(0), "1");
        assert_eq!(cursor.text(1), "2.5");
        assert_eq!(cursor.text(2), "a");

        assert!(cursor.step().unwrap());
        assert_eq!(cursor.text(1), "4.0");
        assert!(cursor.is_null(2));

        assert!(!cursor.step().unwrap());
        assert!(!cursor.step().unwrap());
    }

    #[test]
    fn test_query_with_placeholders() {
        let mut db = SqliteBackend::open_in_memory().unwrap();
        db.execute("CREATE TABLE t (k TEXT, v INTEGER); INSERT INTO t VALUES ('a', 1), ('b', 2);")
            .unwrap();
        let sql = format!("SELECT v FROM t WHERE k = {}", db.placeholder(0));
        let table = db.query(&sql, &["b".to_string()]).unwrap().materialize().unwrap();
        assert_eq!(table.num_rows(), 1);
        assert_eq!(table.text(0, 0), "2");
    }

    #[test]
    fn test_query_error_carries_query() {
        let mut db = SqliteBackend::open_in_memory().unwrap();
        let err = db.query("SELECT * FROM missing", &[]).err().unwrap();
        match err {
            SpError::Query { query, message } => {
                assert_eq!(query, "SELECT * FROM missing");
                assert!(message.contains("missing"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_exists_table_sees_temporary_tables() {
        let mut db = SqliteBackend::open_in_memory().unwrap();
        assert!(!db.exists_table("tmp").unwrap());
        db.execute("CREATE TEMPORARY TABLE tmp (a INTEGER)").unwrap();
        assert!(db.exists_table("tmp").unwrap());
    }
}
