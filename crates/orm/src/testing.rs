//! Test doubles for the database backend.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::backends::{Database, ExecResult, Row};
use crate::error::OrmResult;

/// Scripted in-memory backend: records every statement it receives and
/// replays queued results in FIFO order. A query with no queued result
/// yields an empty row set; a statement with no queued result yields a
/// default [`ExecResult`].
#[derive(Default)]
pub struct MockDatabase {
    statements: Mutex<Vec<(String, Vec<Value>)>>,
    fetch_results: Mutex<VecDeque<Vec<Row>>>,
    exec_results: Mutex<VecDeque<ExecResult>>,
}

impl MockDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the row set returned by the next `fetch_all`.
    pub fn push_rows(&self, rows: Vec<Row>) {
        self.fetch_results.lock().unwrap().push_back(rows);
    }

    /// Queue the result of the next `execute`.
    pub fn push_exec(&self, result: ExecResult) {
        self.exec_results.lock().unwrap().push_back(result);
    }

    /// Every statement issued so far, with its bound parameters.
    pub fn statements(&self) -> Vec<(String, Vec<Value>)> {
        self.statements.lock().unwrap().clone()
    }

    pub fn statement_count(&self) -> usize {
        self.statements.lock().unwrap().len()
    }
}

#[async_trait]
impl Database for MockDatabase {
    async fn fetch_all(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        self.statements
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        Ok(self.fetch_results.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<ExecResult> {
        self.statements
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        Ok(self.exec_results.lock().unwrap().pop_front().unwrap_or_default())
    }
}

/// Build a row from column/value pairs.
pub fn row(pairs: &[(&str, Value)]) -> Row {
    let mut row = Row::new();
    for (column, value) in pairs {
        row.insert(column.to_string(), value.clone());
    }
    row
}
