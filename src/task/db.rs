//! Database point-lookup target backed by a pooled SQLite connection

use super::{Task, TaskOutcome};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;

/// Runs one single-parameter lookup per invocation
pub struct DbLookupTask {
    pool: SqlitePool,
    query: String,
    key: String,
    name: String,
}

impl DbLookupTask {
    /// Open a pool of `pool_size` connections to `database_url`.
    ///
    /// `acquire_timeout` bounds how long an invocation waits for a free
    /// connection when every pooled one is busy.
    pub async fn connect(
        database_url: &str,
        query: &str,
        key: &str,
        pool_size: u32,
        acquire_timeout: Duration,
    ) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size.max(1))
            .acquire_timeout(acquire_timeout)
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to {}: {}", database_url, e)))?;

        Ok(Self::with_pool(pool, query, key))
    }

    pub fn with_pool(pool: SqlitePool, query: &str, key: &str) -> Self {
        Self {
            pool,
            query: query.to_string(),
            key: key.to_string(),
            name: format!("lookup {}", key),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the default `test` table and the configured key row if absent
    pub async fn ensure_fixture(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS test (
                id TEXT PRIMARY KEY,
                test TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("INSERT OR IGNORE INTO test (id, test) VALUES (?, ?)")
            .bind(&self.key)
            .bind(format!("value-{}", self.key))
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl Task for DbLookupTask {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self) -> Result<TaskOutcome> {
        let row = sqlx::query(&self.query)
            .bind(&self.key)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found(format!("no record for key '{}'", self.key)))?;

        let detail = row
            .try_get::<String, _>(0)
            .unwrap_or_else(|_| format!("{} column(s)", row.len()));

        Ok(TaskOutcome::with_detail(detail))
    }
}
