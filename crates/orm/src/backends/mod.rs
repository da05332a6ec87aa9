//! Database backend abstraction.
//!
//! The engine talks to storage through the [`Database`] trait: execute a
//! SQL-like statement with positional `?` placeholders, get back tabular
//! rows (field -> value records) and, for inserts, the last generated key.
//! Each logical operation borrows one pooled connection for its duration;
//! any failure from the backend propagates to the caller unchanged.

pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::OrmResult;

pub use sqlite::SqliteDatabase;

/// One result row: physical column name -> value.
pub type Row = Map<String, Value>;

/// Outcome of a statement executed for effect.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// Generated key of the last insert, when the backend produces one.
    pub last_insert_id: Option<Value>,
}

/// A pooled data-access resource.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run a statement expected to return rows.
    async fn fetch_all(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>>;

    /// Run a statement for effect.
    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<ExecResult>;
}

/// Shared handle to the backend, cheap to clone and to thread through
/// components or bind as a container data source.
pub type DatabaseHandle = Arc<dyn Database>;
