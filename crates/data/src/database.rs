use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use pinaka_core::{DatabaseConfig, StoreError};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

/// Explicit handle to the PostgreSQL store.
///
/// Connect once, hand clones of the pool to repositories, and `close` when
/// done; reads after `close` fail with [`StoreError::Closed`].
#[derive(Debug, Clone)]
pub struct DatabaseClient {
    pool: PgPool,
    read_timeout: Duration,
}

impl DatabaseClient {
    /// Opens a connection pool to the configured database.
    ///
    /// # Errors
    /// Returns an error if the database connection cannot be established.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let read_timeout = Duration::from_secs(config.read_timeout_secs);
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(read_timeout)
            .connect(&config.url)
            .await
            .with_context(|| format!("failed to connect to {}", redact(&config.url)))?;

        info!(
            max_connections = config.max_connections,
            read_timeout_secs = config.read_timeout_secs,
            "Connected to store"
        );
        Ok(Self { pool, read_timeout })
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Closes every pooled connection. Waits for in-flight reads to finish.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Store connection closed");
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}

/// Runs one store read under `timeout`, mapping driver failures to [`StoreError`].
pub(crate) async fn bounded<T, F>(
    operation: &'static str,
    timeout: Duration,
    read: F,
) -> std::result::Result<T, StoreError>
where
    F: Future<Output = std::result::Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(timeout, read).await {
        Ok(result) => result.map_err(store_error),
        Err(_) => Err(StoreError::timeout(operation, timeout.as_secs())),
    }
}

pub(crate) fn store_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolClosed => StoreError::Closed,
        sqlx::Error::PoolTimedOut => StoreError::unavailable("connection pool exhausted"),
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) | sqlx::Error::ColumnNotFound(_) => {
            StoreError::decode(err.to_string())
        }
        other => StoreError::unavailable(other.to_string()),
    }
}

/// Strips credentials from a connection URL before it is logged.
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}
