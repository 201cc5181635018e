pub mod data;
pub mod seed;

use anyhow::Context;

use crate::config;
use crate::store::PgTableStore;

/// Connect using `DATABASE_URL` and the configured pool settings
pub async fn connect() -> anyhow::Result<PgTableStore> {
    PgTableStore::connect(&config::config().database)
        .await
        .context("failed to connect to database (is DATABASE_URL set?)")
}
