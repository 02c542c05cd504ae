//! Database connection and the key-value table

use crate::store::KeyValueStore;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;
use wallnance_core::{Error, Result};

/// Key-value store persisted in a SQLite file
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to database at the given path, creating if necessary
    pub async fn connect(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::StorageError(e.to_string()))?;
        }

        let path_str = path.to_string_lossy();
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path_str))
            .map_err(|e| Error::StorageError(e.to_string()))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| Error::StorageError(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;
        debug!("Opened key-value store at {}", path_str);
        Ok(store)
    }

    /// Connect to in-memory database (for testing)
    pub async fn connect_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| Error::StorageError(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::StorageError(e.to_string()))?;

        Ok(())
    }

    /// Number of stored keys
    pub async fn count(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM kv_store")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::StorageError(e.to_string()))
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        sqlx::query_scalar::<sqlx::Sqlite, String>("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::StorageError(e.to_string()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO kv_store (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::StorageError(e.to_string()))?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::StorageError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_roundtrip_and_overwrite() {
        let store = SqliteStore::connect_in_memory().await.unwrap();

        assert_eq!(store.get("player_balance").await.unwrap(), None);
        store.set("player_balance", "100").await.unwrap();
        store.set("player_balance", "250.5").await.unwrap();
        assert_eq!(
            store.get("player_balance").await.unwrap().as_deref(),
            Some("250.5")
        );
        assert_eq!(store.count().await.unwrap(), 1);

        store.remove("player_balance").await.unwrap();
        assert_eq!(store.get("player_balance").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_backed_store_survives_reconnect() {
        let dir = std::env::temp_dir().join(format!("wallnance-test-{}", std::process::id()));
        let path = dir.join("store.db");

        {
            let store = SqliteStore::connect(&path).await.unwrap();
            store.set("settings", "{}").await.unwrap();
            store.pool().close().await;
        }

        let store = SqliteStore::connect(&path).await.unwrap();
        assert_eq!(store.get("settings").await.unwrap().as_deref(), Some("{}"));
        store.pool().close().await;

        let _ = std::fs::remove_dir_all(&dir);
    }
}
