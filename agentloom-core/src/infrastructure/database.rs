//! SQL database boundary used by the natural-language query tool.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("failed to open database at {path}: {reason}")]
    Open { path: String, reason: String },
    #[error("query failed: {0}")]
    Query(String),
    #[error("database worker stopped: {0}")]
    Worker(String),
}

/// A single result cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(usize),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "None"),
            CellValue::Integer(value) => write!(f, "{value}"),
            CellValue::Real(value) => write!(f, "{value}"),
            CellValue::Text(value) => write!(f, "'{}'", value.replace('\'', "\\'")),
            CellValue::Blob(len) => write!(f, "<blob {len} bytes>"),
        }
    }
}

pub type Row = Vec<CellValue>;

/// Render rows as `[(a, b), (c, d)]`.
pub fn render_rows(rows: &[Row]) -> String {
    let rendered: Vec<String> = rows
        .iter()
        .map(|row| {
            let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
            if cells.len() == 1 {
                format!("({},)", cells[0])
            } else {
                format!("({})", cells.join(", "))
            }
        })
        .collect();
    format!("[{}]", rendered.join(", "))
}

#[async_trait]
pub trait Database: Send + Sync {
    /// Table definitions handed to the SQL-writing model.
    async fn schema(&self) -> Result<String, DatabaseError>;

    /// Execute a query and return all rows.
    async fn execute(&self, sql: &str) -> Result<Vec<Row>, DatabaseError>;
}

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

#[cfg(feature = "sqlite")]
mod sqlite {
    use super::{CellValue, Database, DatabaseError, Row};
    use async_trait::async_trait;
    use rusqlite::types::ValueRef;
    use rusqlite::{Connection, OpenFlags};
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use tracing::debug;

    /// SQLite database opened read-only; queries run on the blocking pool.
    #[derive(Clone)]
    pub struct SqliteDatabase {
        conn: Arc<Mutex<Connection>>,
    }

    impl SqliteDatabase {
        pub fn open(path: &Path) -> Result<Self, DatabaseError> {
            let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
                .map_err(|e| DatabaseError::Open {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                })?;
            Ok(Self::from_connection(conn))
        }

        pub fn from_connection(conn: Connection) -> Self {
            Self {
                conn: Arc::new(Mutex::new(conn)),
            }
        }

        async fn with_conn<T, F>(&self, f: F) -> Result<T, DatabaseError>
        where
            T: Send + 'static,
            F: FnOnce(&Connection) -> Result<T, DatabaseError> + Send + 'static,
        {
            let conn = Arc::clone(&self.conn);
            tokio::task::spawn_blocking(move || {
                let guard = conn
                    .lock()
                    .map_err(|e| DatabaseError::Worker(e.to_string()))?;
                f(&guard)
            })
            .await
            .map_err(|e| DatabaseError::Worker(e.to_string()))?
        }
    }

    #[async_trait]
    impl Database for SqliteDatabase {
        async fn schema(&self) -> Result<String, DatabaseError> {
            self.with_conn(|conn| {
                let mut stmt = conn
                    .prepare(
                        "SELECT sql FROM sqlite_master \
                         WHERE type = 'table' AND sql IS NOT NULL AND name NOT LIKE 'sqlite_%' \
                         ORDER BY name",
                    )
                    .map_err(|e| DatabaseError::Query(e.to_string()))?;
                let tables = stmt
                    .query_map([], |row| row.get::<_, String>(0))
                    .map_err(|e| DatabaseError::Query(e.to_string()))?
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| DatabaseError::Query(e.to_string()))?;
                Ok(tables.join("\n\n"))
            })
            .await
        }

        async fn execute(&self, sql: &str) -> Result<Vec<Row>, DatabaseError> {
            debug!(sql, "Executing generated SQL");
            let sql = sql.to_string();
            self.with_conn(move |conn| {
                let mut stmt = conn
                    .prepare(&sql)
                    .map_err(|e| DatabaseError::Query(e.to_string()))?;
                let columns = stmt.column_count();
                let mut rows = stmt
                    .query([])
                    .map_err(|e| DatabaseError::Query(e.to_string()))?;
                let mut out = Vec::new();
                while let Some(row) = rows.next().map_err(|e| DatabaseError::Query(e.to_string()))? {
                    let mut cells = Vec::with_capacity(columns);
                    for idx in 0..columns {
                        let value = row
                            .get_ref(idx)
                            .map_err(|e| DatabaseError::Query(e.to_string()))?;
                        cells.push(match value {
                            ValueRef::Null => CellValue::Null,
                            ValueRef::Integer(v) => CellValue::Integer(v),
                            ValueRef::Real(v) => CellValue::Real(v),
                            ValueRef::Text(bytes) => {
                                CellValue::Text(String::from_utf8_lossy(bytes).into_owned())
                            }
                            ValueRef::Blob(bytes) => CellValue::Blob(bytes.len()),
                        });
                    }
                    out.push(cells);
                }
                Ok(out)
            })
            .await
        }
    }

}
