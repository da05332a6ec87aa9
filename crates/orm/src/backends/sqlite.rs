//! SQLite backend over sqlx.

use async_trait::async_trait;
use serde_json::{Number, Value};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as SqlxRow, TypeInfo, ValueRef};
use tracing::debug;

use crate::backends::{Database, ExecResult, Row};
use crate::error::{OrmError, OrmResult};

/// Connection-pooled SQLite database.
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Connect to a SQLite database URL, e.g. `sqlite://app.db`.
    pub async fn connect(url: &str) -> OrmResult<Self> {
        let pool = SqlitePoolOptions::new().connect(url).await?;
        Ok(Self { pool })
    }

    /// An in-memory database on a single pooled connection, so every
    /// statement sees the same data. Intended for tests and examples.
    pub async fn in_memory() -> OrmResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn fetch_all(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        debug!(%sql, params = params.len(), "executing query");
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_value(query, param);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(row_to_record).collect()
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<ExecResult> {
        debug!(%sql, params = params.len(), "executing statement");
        let mut query = sqlx::query(sql);
        for param in params {
            query = bind_value(query, param);
        }
        let result = query.execute(&self.pool).await?;
        Ok(ExecResult {
            rows_affected: result.rows_affected(),
            last_insert_id: Some(Value::from(result.last_insert_rowid())),
        })
    }
}

type SqliteQuery<'q> = sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>;

/// Bind a JSON value to the next `?` placeholder.
fn bind_value<'q>(query: SqliteQuery<'q>, value: &Value) -> SqliteQuery<'q> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Bool(b) => query.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                query.bind(i)
            } else if let Some(f) = n.as_f64() {
                query.bind(f)
            } else {
                query.bind(n.to_string())
            }
        }
        Value::String(s) => query.bind(s.clone()),
        // Structured values are stored as their JSON text
        Value::Array(_) | Value::Object(_) => query.bind(value.to_string()),
    }
}

/// Convert one sqlx row into a field -> value record.
fn row_to_record(row: &SqliteRow) -> OrmResult<Row> {
    let mut record = Row::new();
    for (index, column) in row.columns().iter().enumerate() {
        record.insert(column.name().to_string(), column_value(row, index)?);
    }
    Ok(record)
}

fn column_value(row: &SqliteRow, index: usize) -> OrmResult<Value> {
    let raw = row
        .try_get_raw(index)
        .map_err(|e| OrmError::Database(format!("failed to read column {}: {}", index, e)))?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_uppercase();

    match type_name.as_str() {
        "INTEGER" | "INT" | "INT4" | "INT8" | "BIGINT" => {
            let value: i64 = row
                .try_get(index)
                .map_err(|e| OrmError::Database(format!("failed to decode integer: {}", e)))?;
            Ok(Value::from(value))
        }
        "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => {
            let value: f64 = row
                .try_get(index)
                .map_err(|e| OrmError::Database(format!("failed to decode real: {}", e)))?;
            Ok(Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null))
        }
        "BOOLEAN" | "BOOL" => {
            let value: bool = row
                .try_get(index)
                .map_err(|e| OrmError::Database(format!("failed to decode boolean: {}", e)))?;
            Ok(Value::Bool(value))
        }
        "BLOB" => {
            let value: Vec<u8> = row
                .try_get(index)
                .map_err(|e| OrmError::Database(format!("failed to decode blob: {}", e)))?;
            Ok(Value::Array(value.into_iter().map(Value::from).collect()))
        }
        _ => {
            let value: String = row
                .try_get(index)
                .map_err(|e| OrmError::Database(format!("failed to decode text: {}", e)))?;
            Ok(Value::String(value))
        }
    }
}
