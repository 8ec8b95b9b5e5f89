//! Persistence gateway
//!
//! One pooled SQLite handle for the process and a single `content` table.
//! Every gateway call is one parameterized statement that checks a
//! connection out of the pool and returns it; nothing is retried.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

mod content;
pub use content::ContentStore;

/// Persistence gateway errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored row is malformed: {0}")]
    CorruptRow(String),
}

/// Open the connection pool for a `sqlite:` URL
///
/// The database file is created when missing. In-memory URLs get a single
/// long-lived connection so every query sees the same database.
pub async fn connect(database_url: &str) -> Result<SqlitePool, StorageError> {
    let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

    let mut options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5));
    if !in_memory {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    let pool = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?
    };

    info!(in_memory, "Opened content database");
    Ok(pool)
}

/// Connect and make sure the `content` table exists
pub async fn open_store(database_url: &str) -> Result<ContentStore, StorageError> {
    let pool = connect(database_url).await?;
    let store = ContentStore::new(pool);
    store.ensure_schema().await?;
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_in_memory() {
        let pool = connect("sqlite::memory:").await.unwrap();
        let one: i64 = sqlx::query_scalar("SELECT 1").fetch_one(&pool).await.unwrap();
        assert_eq!(one, 1);
    }

    #[tokio::test]
    async fn test_connect_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.db");
        let url = format!("sqlite://{}", path.display());

        let store = open_store(&url).await.unwrap();
        assert!(path.exists());
        assert_eq!(store.count(&Default::default()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_url() {
        assert!(connect("postgres://localhost/db").await.is_err());
    }
}
