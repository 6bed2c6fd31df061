/*!
 * SQLite-backed key-value store for the result cache.
 */

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};
use serde_json::Value;

use super::connection::DatabaseConnection;
use crate::errors::CacheError;
use crate::translation::cache::KeyValueStore;

/// `KeyValueStore` over the `kv_store` table
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db: DatabaseConnection,
}

impl SqliteStore {
    /// Wrap an open database
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Underlying connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn storage_error(error: anyhow::Error) -> CacheError {
    CacheError::Storage(format!("{:#}", error))
}

/// Escape LIKE wildcards so a prefix matches literally
fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let key = key.to_string();
        let raw: Option<String> = self
            .db
            .execute_async(move |conn| {
                Ok(conn
                    .query_row("SELECT value FROM kv_store WHERE key = ?1", [&key], |row| row.get(0))
                    .optional()?)
            })
            .await
            .map_err(storage_error)?;

        match raw {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), CacheError> {
        let key = key.to_string();
        let text = serde_json::to_string(&value)?;
        self.db
            .execute_async(move |conn| {
                conn.execute(
                    "INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                    params![key, text],
                )?;
                Ok(())
            })
            .await
            .map_err(storage_error)
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        let key = key.to_string();
        self.db
            .execute_async(move |conn| {
                conn.execute("DELETE FROM kv_store WHERE key = ?1", [&key])?;
                Ok(())
            })
            .await
            .map_err(storage_error)
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        let pattern = like_prefix(prefix);
        self.db
            .execute_async(move |conn| {
                let mut stmt =
                    conn.prepare("SELECT key FROM kv_store WHERE key LIKE ?1 ESCAPE '\\' ORDER BY key")?;
                let keys = stmt
                    .query_map([&pattern], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(storage_error)
    }
}
