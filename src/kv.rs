//! Key-value storage abstraction for the client store.
//!
//! The [`KeyValueStore`] trait is the only persistence seam the client store
//! knows about. Values are opaque strings (the store writes JSON).
//!
//! | Implementation | Backing |
//! |----------------|---------|
//! | [`MemoryKv`] | `HashMap` behind a `RwLock`; tests and ephemeral sessions |
//! | [`SqliteKv`] | single `kv` table in a SQLite file |

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::{db, migrate};

/// Abstract string-keyed storage.
///
/// Implementations must be `Send + Sync` so a store can be shared with async
/// tasks. `set` overwrites; `delete` of a missing key is not an error.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}

/// In-memory store.
#[derive(Default)]
pub struct MemoryKv {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently present.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow!("kv lock poisoned")
}

#[async_trait]
impl KeyValueStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// SQLite-backed store. The file and table are created on open.
pub struct SqliteKv {
    pool: SqlitePool,
}

impl SqliteKv {
    pub async fn open(path: &Path) -> Result<Self> {
        let pool = db::connect(path).await?;
        migrate::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl KeyValueStore for SqliteKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM kv WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("value")))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(chrono::Utc::now().timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn exercise(kv: &dyn KeyValueStore) {
        assert_eq!(kv.get("documents").await.unwrap(), None);
        kv.set("documents", "[]").await.unwrap();
        assert_eq!(kv.get("documents").await.unwrap().as_deref(), Some("[]"));
        kv.set("documents", "[1]").await.unwrap();
        assert_eq!(kv.get("documents").await.unwrap().as_deref(), Some("[1]"));
        kv.delete("documents").await.unwrap();
        assert_eq!(kv.get("documents").await.unwrap(), None);
        // deleting again is fine
        kv.delete("documents").await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_kv() {
        let kv = MemoryKv::new();
        exercise(&kv).await;
        assert!(kv.is_empty());
    }

    #[tokio::test]
    async fn test_sqlite_kv() {
        let tmp = TempDir::new().unwrap();
        let kv = SqliteKv::open(&tmp.path().join("nested/plens.sqlite"))
            .await
            .unwrap();
        exercise(&kv).await;
        kv.close().await;
    }

    #[tokio::test]
    async fn test_sqlite_kv_persists_across_opens() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("plens.sqlite");

        let kv = SqliteKv::open(&path).await.unwrap();
        kv.set("query_history", "[\"a\"]").await.unwrap();
        kv.close().await;

        let kv = SqliteKv::open(&path).await.unwrap();
        assert_eq!(
            kv.get("query_history").await.unwrap().as_deref(),
            Some("[\"a\"]")
        );
        kv.close().await;
    }
}
