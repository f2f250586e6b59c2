//! PostgreSQL record store with connection pooling

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use tracing::info;

use crate::domain::{DomainError, LookupKey, Record, RecordStore, StoreError};

/// PostgreSQL store configuration
#[derive(Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Table holding `(key TEXT PRIMARY KEY, data JSONB)` rows
    pub table: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Bound on acquiring a connection and on a single query
    pub timeout: Duration,
}

impl fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("url", &"[REDACTED]")
            .field("table", &self.table)
            .field("max_connections", &self.max_connections)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            table: table.into(),
            max_connections: 10,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Table names are interpolated into SQL, so only plain identifiers pass
fn validate_table_name(table: &str) -> Result<(), DomainError> {
    let valid = !table.is_empty()
        && !table.starts_with(|c: char| c.is_ascii_digit())
        && table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(DomainError::configuration(format!(
            "Invalid table name: {}",
            table
        )))
    }
}

/// Reads records stored as JSON documents keyed by a text column
pub struct PostgresRecordStore {
    pool: PgPool,
    select_sql: String,
    timeout: Duration,
}

impl fmt::Debug for PostgresRecordStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresRecordStore")
            .field("select_sql", &self.select_sql)
            .finish()
    }
}

impl PostgresRecordStore {
    /// Wraps an existing pool
    pub fn new(pool: PgPool, table: &str, timeout: Duration) -> Result<Self, DomainError> {
        validate_table_name(table)?;

        Ok(Self {
            pool,
            select_sql: format!("SELECT data FROM {} WHERE key = $1", table),
            timeout,
        })
    }

    /// Creates the pool lazily; no connection is opened until the first read
    pub fn connect_lazy(config: &PostgresConfig) -> Result<Self, DomainError> {
        validate_table_name(&config.table)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.timeout)
            .connect_lazy(&config.url)
            .map_err(|e| {
                DomainError::configuration(format!("Invalid PostgreSQL connection URL: {}", e))
            })?;

        info!(
            table = %config.table,
            max_connections = config.max_connections,
            "PostgreSQL record store configured"
        );

        Self::new(pool, &config.table, config.timeout)
    }

    async fn bounded<T, F>(&self, operation: F) -> Result<T, StoreError>
    where
        F: std::future::Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, operation).await {
            Ok(result) => result.map_err(map_sqlx_error),
            Err(_) => Err(StoreError::timeout(self.timeout)),
        }
    }
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut => {
            StoreError::unavailable("timed out waiting for a database connection")
        }
        other => StoreError::unavailable(format!("PostgreSQL query failed: {}", other)),
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn read_by_key(&self, key: &LookupKey) -> Result<Record, StoreError> {
        let row = self
            .bounded(
                sqlx::query(&self.select_sql)
                    .bind(key.as_str())
                    .fetch_optional(&self.pool),
            )
            .await?;

        match row {
            Some(row) => row
                .try_get::<serde_json::Value, _>("data")
                .map_err(map_sqlx_error),
            None => Err(StoreError::not_found(key.as_str())),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.bounded(sqlx::query("SELECT 1").execute(&self.pool))
            .await
            .map(|_| ())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("PostgreSQL pool closed");
    }
}
