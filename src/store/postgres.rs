use async_trait::async_trait;
use serde_json::Value;
use sqlx::{
    postgres::{PgArguments, PgPoolOptions},
    PgPool, Postgres, Row as _,
};
use std::time::Duration;
use tracing::{debug, info};

use super::{Row, Statement, StoreError, TableStore};
use crate::config::DatabaseConfig;

/// `TableStore` over a sqlx Postgres pool
#[derive(Clone)]
pub struct PgTableStore {
    pool: PgPool,
    log_queries: bool,
}

impl PgTableStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let url = config
            .url
            .as_deref()
            .ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Created database pool (max {} connections)", config.max_connections);
        Ok(Self {
            pool,
            log_queries: config.enable_query_logging,
        })
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }

    fn log(&self, statement: &Statement) {
        if self.log_queries {
            debug!(query = %statement.query, params = statement.params.len(), "executing statement");
        }
    }
}

#[async_trait]
impl TableStore for PgTableStore {
    async fn fetch_all(&self, statement: &Statement) -> Result<Vec<Row>, StoreError> {
        self.log(statement);

        // row_to_json keeps column names and renders dates/numerics without per-type decoding
        let sql = format!("SELECT row_to_json(t) AS row FROM ({}) t", statement.query);
        let mut q = sqlx::query(&sql);
        for p in statement.params.iter() {
            q = bind_param(q, p);
        }

        let rows = q.fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|row| match row.try_get::<Value, _>("row")? {
                Value::Object(map) => Ok(map),
                other => Err(StoreError::QueryError(format!("unexpected row format: {}", other))),
            })
            .collect()
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, StoreError> {
        self.log(statement);

        let mut q = sqlx::query(&statement.query);
        for p in statement.params.iter() {
            q = bind_param(q, p);
        }

        // Dropping the transaction on an early return rolls it back
        let mut tx = self.pool.begin().await?;
        let result = q.execute(&mut *tx).await?;
        tx.commit().await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn bind_param<'q>(
    q: sqlx::query::Query<'q, Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}
