//! Table Store seam: the only way the engine reaches the database.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

pub mod postgres;

pub use postgres::PgTableStore;

/// A fetched row, column name to JSON scalar
pub type Row = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Parameterized SQL text plus its positional `$n` values
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub query: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(query: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            query: query.into(),
            params,
        }
    }
}

/// Transactional relational store reachable through fetch/execute.
///
/// `execute` commits before it returns and reports the affected-row count.
#[async_trait]
pub trait TableStore: Send + Sync {
    async fn fetch_all(&self, statement: &Statement) -> Result<Vec<Row>, StoreError>;

    async fn execute(&self, statement: &Statement) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Value by column name: exact key first, then ASCII case-insensitive.
///
/// Used for both fetched rows (Postgres folds unquoted identifiers) and
/// request payloads (clients send `country_name` for `Country_Name`).
pub fn column<'r>(row: &'r Row, name: &str) -> Option<&'r Value> {
    row.get(name).or_else(|| {
        row.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

/// Quote SQL identifier to prevent injection
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
