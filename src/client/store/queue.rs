//! # Pending Outbound Queue Storage
//!
//! Durable records for messages not yet confirmed by the server. Each entry
//! mirrors a locally visible message by its temporary id and carries
//! everything needed to retry the send plus the retry bookkeeping the sync
//! coordinator maintains.
//!
//! The queue table is only ever mutated through the coordinator's drain
//! path and the pipeline's enqueue path; the UI reads counts for badges.

use crate::client::store::{LocalStore, Result};
use crate::shared::error::SyncError;
use crate::shared::messaging::{Message, MessageKind, MessageStatus};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use uuid::Uuid;

/// A durable queue record mirroring a message awaiting delivery
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingMessage {
    /// Matches the message's temporary id
    pub local_id: String,
    /// Conversation the message belongs to
    pub conversation_id: Uuid,
    /// Sender of the message
    pub sender_id: Uuid,
    /// Message kind
    pub kind: MessageKind,
    /// Text body or voice asset URL
    pub content: String,
    /// Voice duration in seconds
    pub duration: Option<u32>,
    /// Reply reference
    pub reply_to_id: Option<String>,
    /// When the message was composed (RFC3339)
    pub created_at: String,
    /// Failed delivery attempts so far
    pub retry_count: u32,
    /// Timestamp of the last attempt (RFC3339)
    pub last_attempt: Option<String>,
    /// Error message from the last failure
    pub last_error: Option<String>,
}

impl PendingMessage {
    /// Build a queue entry from a locally visible message
    pub fn from_message(message: &Message) -> Self {
        Self {
            local_id: message.id.clone(),
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            kind: message.kind,
            content: message.content.clone(),
            duration: message.duration,
            reply_to_id: message.reply_to_id.clone(),
            created_at: message.created_at.clone(),
            retry_count: 0,
            last_attempt: None,
            last_error: None,
        }
    }

    /// Reconstruct the message view of this entry (status `pending`)
    pub fn to_message(&self) -> Message {
        Message {
            id: self.local_id.clone(),
            conversation_id: self.conversation_id,
            sender_id: self.sender_id,
            kind: self.kind,
            content: self.content.clone(),
            duration: self.duration,
            reply_to_id: self.reply_to_id.clone(),
            created_at: self.created_at.clone(),
            read_at: None,
            status: MessageStatus::Pending,
        }
    }
}

impl LocalStore {
    /// Persist a queue entry; idempotent by local id.
    pub async fn put_pending(&self, entry: &PendingMessage) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO pending_messages (
                id, conversation_id, sender_id, kind, content,
                duration, reply_to_id, created_at, retry_count, last_attempt, last_error
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.local_id)
        .bind(entry.conversation_id.to_string())
        .bind(entry.sender_id.to_string())
        .bind(entry.kind.as_str())
        .bind(&entry.content)
        .bind(entry.duration.map(|d| d as i64))
        .bind(&entry.reply_to_id)
        .bind(&entry.created_at)
        .bind(entry.retry_count as i64)
        .bind(&entry.last_attempt)
        .bind(&entry.last_error)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// All queue entries in creation-time order
    pub async fn pending_messages(&self) -> Result<Vec<PendingMessage>> {
        let rows = sqlx::query(
            "SELECT id, conversation_id, sender_id, kind, content,
                    duration, reply_to_id, created_at, retry_count, last_attempt, last_error
             FROM pending_messages
             ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(self.pool())
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(row_to_pending(&row)?);
        }
        Ok(entries)
    }

    /// Queue entries for one conversation in creation-time order
    pub async fn pending_for_conversation(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Vec<PendingMessage>> {
        let rows = sqlx::query(
            "SELECT id, conversation_id, sender_id, kind, content,
                    duration, reply_to_id, created_at, retry_count, last_attempt, last_error
             FROM pending_messages
             WHERE conversation_id = ?
             ORDER BY created_at ASC, id ASC",
        )
        .bind(conversation_id.to_string())
        .fetch_all(self.pool())
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(row_to_pending(&row)?);
        }
        Ok(entries)
    }

    /// Remove a queue entry; absent id is a no-op.
    pub async fn remove_pending(&self, local_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM pending_messages WHERE id = ?")
            .bind(local_id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Record a failed attempt and return the new retry count
    pub async fn record_pending_failure(&self, local_id: &str, error: &str) -> Result<u32> {
        sqlx::query(
            "UPDATE pending_messages SET
                retry_count = retry_count + 1,
                last_attempt = ?,
                last_error = ?
             WHERE id = ?",
        )
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(error)
        .bind(local_id)
        .execute(self.pool())
        .await?;

        let row = sqlx::query("SELECT retry_count FROM pending_messages WHERE id = ?")
            .bind(local_id)
            .fetch_optional(self.pool())
            .await?;

        match row {
            Some(row) => {
                let count: i64 = row.try_get("retry_count")?;
                Ok(count as u32)
            }
            None => Ok(0),
        }
    }

    /// Number of queued messages (badges)
    pub async fn pending_count(&self) -> Result<u64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM pending_messages")
            .fetch_one(self.pool())
            .await?;
        Ok(row.0 as u64)
    }
}

/// Convert a database row to a PendingMessage
fn row_to_pending(row: &sqlx::sqlite::SqliteRow) -> Result<PendingMessage> {
    let conversation_id: String = row.try_get("conversation_id")?;
    let sender_id: String = row.try_get("sender_id")?;
    let kind: String = row.try_get("kind")?;
    let duration: Option<i64> = row.try_get("duration")?;
    let retry_count: i64 = row.try_get("retry_count")?;

    Ok(PendingMessage {
        local_id: row.try_get("id")?,
        conversation_id: Uuid::parse_str(&conversation_id)
            .map_err(|e| SyncError::storage(format!("corrupt conversation_id: {}", e)))?,
        sender_id: Uuid::parse_str(&sender_id)
            .map_err(|e| SyncError::storage(format!("corrupt sender_id: {}", e)))?,
        kind: MessageKind::from_str(&kind),
        content: row.try_get("content")?,
        duration: duration.map(|d| d as u32),
        reply_to_id: row.try_get("reply_to_id")?,
        created_at: row.try_get("created_at")?,
        retry_count: retry_count as u32,
        last_attempt: row.try_get("last_attempt")?,
        last_error: row.try_get("last_error")?,
    })
}
