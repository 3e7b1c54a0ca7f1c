//! # Session Data Operations
//!
//! Flat key/value area for miscellaneous session state (logged-in user,
//! last-viewed conversation, push subscription bookkeeping). Values are
//! arbitrary JSON.

use crate::client::store::{LocalStore, Result};
use crate::shared::error::SyncError;
use sqlx::Row;

impl LocalStore {
    /// Store a session value under a key, overwriting any previous value
    pub async fn set_session_value(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let encoded = serde_json::to_string(value)
            .map_err(|e| SyncError::storage(format!("unencodable session value: {}", e)))?;
        sqlx::query(
            "INSERT OR REPLACE INTO session_data (key, value, updated_at) VALUES (?, ?, ?)",
        )
        .bind(key)
        .bind(encoded)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Fetch a session value by key
    pub async fn get_session_value(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let row = sqlx::query("SELECT value FROM session_data WHERE key = ?")
            .bind(key)
            .fetch_optional(self.pool())
            .await?;

        match row {
            Some(row) => {
                let raw: String = row.try_get("value")?;
                let value = serde_json::from_str(&raw)
                    .map_err(|e| SyncError::storage(format!("corrupt session value: {}", e)))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Remove a session value; absent key is a no-op.
    pub async fn remove_session_value(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM session_data WHERE key = ?")
            .bind(key)
            .execute(self.pool())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn temp_store() -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().join("offline.db")).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_round_trip() {
        let (_dir, store) = temp_store().await;
        let value = json!({"user_id": "abc", "role": "patient"});
        store.set_session_value("current_user", &value).await.unwrap();
        let loaded = store.get_session_value("current_user").await.unwrap();
        assert_eq!(loaded, Some(value));
    }

    #[tokio::test]
    async fn test_overwrite() {
        let (_dir, store) = temp_store().await;
        store.set_session_value("k", &json!(1)).await.unwrap();
        store.set_session_value("k", &json!(2)).await.unwrap();
        assert_eq!(store.get_session_value("k").await.unwrap(), Some(json!(2)));
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let (_dir, store) = temp_store().await;
        assert_eq!(store.get_session_value("missing").await.unwrap(), None);
        store.remove_session_value("missing").await.unwrap();
    }
}
