//! Scripted `TableStore` for tests: records every statement and replays
//! queued results in order.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::store::{Row, Statement, StoreError, TableStore};

#[derive(Default)]
struct Script {
    statements: Vec<Statement>,
    fetches: VecDeque<Result<Vec<Row>, String>>,
    executes: VecDeque<Result<u64, String>>,
    ping_failure: Option<String>,
}

/// Unscripted fetches return no rows; unscripted executes report one affected row.
#[derive(Clone, Default)]
pub struct RecordingStore {
    script: Arc<Mutex<Script>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue the result of the next `fetch_all`; non-object values are skipped
    pub fn push_rows(&self, rows: Vec<Value>) {
        let rows = rows
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        self.script().fetches.push_back(Ok(rows));
    }

    pub fn push_affected(&self, count: u64) {
        self.script().executes.push_back(Ok(count));
    }

    pub fn fail_next_fetch(&self, message: impl Into<String>) {
        self.script().fetches.push_back(Err(message.into()));
    }

    pub fn fail_next_execute(&self, message: impl Into<String>) {
        self.script().executes.push_back(Err(message.into()));
    }

    pub fn fail_ping(&self, message: impl Into<String>) {
        self.script().ping_failure = Some(message.into());
    }

    /// Every statement received so far, fetches and executes interleaved
    pub fn statements(&self) -> Vec<Statement> {
        self.script().statements.clone()
    }
}

#[async_trait]
impl TableStore for RecordingStore {
    async fn fetch_all(&self, statement: &Statement) -> Result<Vec<Row>, StoreError> {
        let mut script = self.script();
        script.statements.push(statement.clone());
        match script.fetches.pop_front() {
            Some(result) => result.map_err(StoreError::QueryError),
            None => Ok(Vec::new()),
        }
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, StoreError> {
        let mut script = self.script();
        script.statements.push(statement.clone());
        match script.executes.pop_front() {
            Some(result) => result.map_err(StoreError::QueryError),
            None => Ok(1),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        match &self.script().ping_failure {
            Some(message) => Err(StoreError::QueryError(message.clone())),
            None => Ok(()),
        }
    }
}
