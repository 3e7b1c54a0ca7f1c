//! # Durable Local Store
//!
//! Crash-durable, indexed SQLite storage backing the offline experience:
//! cached messages, cached conversation metadata, the pending-outbound
//! queue, and a flat key/value area for session data.
//!
//! ## Architecture
//!
//! The store mirrors the shapes the server hands us while adding the
//! columns the sync engine needs (delivery status, retry bookkeeping):
//! - `messages.rs`: message cache, indexed by conversation
//! - `conversations.rs`: conversation snapshots, indexed by participant
//! - `queue.rs`: pending-outbound entries, indexed by conversation and
//!   creation time
//! - `session.rs`: flat key/value session data
//!
//! ## Failure Semantics
//!
//! Every operation returns `SyncError::StorageUnavailable` when the
//! underlying medium fails. Callers degrade to online-only operation
//! rather than surfacing storage problems to the user.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use safespace::client::store::LocalStore;
//!
//! # async fn example() -> Result<(), safespace::shared::error::SyncError> {
//! let store = LocalStore::open_default().await?;
//! let messages = store.conversation_messages(&uuid::Uuid::new_v4()).await?;
//! # Ok(())
//! # }
//! ```

pub mod conversations;
pub mod messages;
pub mod queue;
pub mod session;

pub use queue::PendingMessage;

use crate::shared::error::SyncError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteSynchronous};
use std::path::{Path, PathBuf};

/// Result type for local store operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Schema version expected by this build; migrations are additive only.
const SCHEMA_VERSION: i64 = 1;

/// Local store connection manager
///
/// Manages the SQLite connection pool and provides the indexed collection
/// operations used by the sync engine.
#[derive(Debug)]
pub struct LocalStore {
    pool: SqlitePool,
}

impl LocalStore {
    /// Open or create the store at an explicit path.
    ///
    /// Creates the database file if it doesn't exist and initializes the
    /// schema. Uses WAL mode for better concurrency.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| SyncError::storage(e.to_string()))?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .pragma("cache_size", "1000")
            .pragma("temp_store", "MEMORY");

        let pool = SqlitePool::connect_with(options).await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Open the store at the platform default location
    pub async fn open_default() -> Result<Self> {
        Self::open(Self::default_path()).await
    }

    /// Platform-specific default path for the cache database
    pub fn default_path() -> PathBuf {
        let mut path = dirs::data_dir().unwrap_or_else(std::env::temp_dir);
        path.push("safespace");
        path.push("offline.db");
        path
    }

    /// Initialize database schema
    ///
    /// Creates all tables and indexes, then records the schema version.
    /// Everything in `schema.sql` is `IF NOT EXISTS`, so re-opening an
    /// existing database only adds what is missing.
    async fn init_schema(&self) -> Result<()> {
        for statement in include_str!("schema.sql").split(';') {
            let statement = statement.trim();
            if statement.is_empty() {
                continue;
            }
            sqlx::query(statement).execute(&self.pool).await?;
        }
        self.run_migrations().await?;
        Ok(())
    }

    /// Run database migrations
    ///
    /// Checks the recorded schema version and applies anything newer. New
    /// migrations may only add tables and indexes - destructive changes
    /// would throw away queued un-synced user data.
    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        let current: (i64,) =
            sqlx::query_as("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
                .fetch_one(&self.pool)
                .await?;

        if current.0 < SCHEMA_VERSION {
            sqlx::query("INSERT INTO schema_migrations (version, applied_at) VALUES (?, ?)")
                .bind(SCHEMA_VERSION)
                .bind(chrono::Utc::now().to_rfc3339())
                .execute(&self.pool)
                .await?;
        }

        Ok(())
    }

    /// Get connection pool reference
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Get store statistics (badge counts, debugging)
    pub async fn stats(&self) -> Result<StoreStats> {
        let messages: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
            .fetch_one(&self.pool)
            .await?;
        let conversations: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM conversations")
            .fetch_one(&self.pool)
            .await?;
        let pending: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pending_messages")
            .fetch_one(&self.pool)
            .await?;

        Ok(StoreStats {
            message_count: messages.0 as u64,
            conversation_count: conversations.0 as u64,
            pending_count: pending.0 as u64,
        })
    }

    /// Wipe every collection (logout / account switch)
    pub async fn clear_all(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM messages").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM conversations")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM pending_messages")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM session_data")
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

/// Store statistics
#[derive(Debug, Clone)]
pub struct StoreStats {
    /// Cached messages
    pub message_count: u64,
    /// Cached conversation snapshots
    pub conversation_count: u64,
    /// Queued outbound messages
    pub pending_count: u64,
}
