//! # Local Message Operations
//!
//! CRUD for the message cache. Handles storage, indexed retrieval in
//! display order, the atomic temporary-to-durable swap performed by
//! reconciliation, and the interrupted-send scan used at startup.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use safespace::client::store::LocalStore;
//!
//! # async fn example(store: LocalStore, message: safespace::shared::messaging::Message) {
//! store.put_message(&message).await.unwrap();
//! let history = store.conversation_messages(&message.conversation_id).await.unwrap();
//! # }
//! ```

use crate::client::store::{LocalStore, Result};
use crate::shared::error::SyncError;
use crate::shared::messaging::{Message, MessageKind, MessageStatus};
use sqlx::Row;
use uuid::Uuid;

impl LocalStore {
    /// Insert or overwrite a message by primary key; idempotent.
    pub async fn put_message(&self, message: &Message) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO messages (
                id, conversation_id, sender_id, kind, content,
                duration, reply_to_id, created_at, read_at, status
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&message.id)
        .bind(message.conversation_id.to_string())
        .bind(message.sender_id.to_string())
        .bind(message.kind.as_str())
        .bind(&message.content)
        .bind(message.duration.map(|d| d as i64))
        .bind(&message.reply_to_id)
        .bind(&message.created_at)
        .bind(&message.read_at)
        .bind(message.status.as_str())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Cache a batch of messages in one transaction (history refresh)
    pub async fn put_messages(&self, messages: &[Message]) -> Result<()> {
        let mut tx = self.pool().begin().await?;
        for message in messages {
            sqlx::query(
                "INSERT OR REPLACE INTO messages (
                    id, conversation_id, sender_id, kind, content,
                    duration, reply_to_id, created_at, read_at, status
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&message.id)
            .bind(message.conversation_id.to_string())
            .bind(message.sender_id.to_string())
            .bind(message.kind.as_str())
            .bind(&message.content)
            .bind(message.duration.map(|d| d as i64))
            .bind(&message.reply_to_id)
            .bind(&message.created_at)
            .bind(&message.read_at)
            .bind(message.status.as_str())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Messages of a conversation in creation-time order
    pub async fn conversation_messages(&self, conversation_id: &Uuid) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            "SELECT id, conversation_id, sender_id, kind, content,
                    duration, reply_to_id, created_at, read_at, status
             FROM messages
             WHERE conversation_id = ?
             ORDER BY created_at ASC, id ASC",
        )
        .bind(conversation_id.to_string())
        .fetch_all(self.pool())
        .await?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in rows {
            messages.push(row_to_message(&row)?);
        }
        // created_at is RFC3339 with varying fractional precision, so the
        // SQL ordering is advisory; the parsed-time sort is authoritative.
        Message::sort_for_display(&mut messages);
        Ok(messages)
    }

    /// Fetch a single message by id
    pub async fn get_message(&self, message_id: &str) -> Result<Option<Message>> {
        let row = sqlx::query(
            "SELECT id, conversation_id, sender_id, kind, content,
                    duration, reply_to_id, created_at, read_at, status
             FROM messages
             WHERE id = ?",
        )
        .bind(message_id)
        .fetch_optional(self.pool())
        .await?;

        match row {
            Some(row) => Ok(Some(row_to_message(&row)?)),
            None => Ok(None),
        }
    }

    /// Delete a message; deleting an absent id is a no-op.
    pub async fn delete_message(&self, message_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(message_id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Drop the cached history of a conversation
    pub async fn delete_conversation_messages(&self, conversation_id: &Uuid) -> Result<()> {
        sqlx::query("DELETE FROM messages WHERE conversation_id = ?")
            .bind(conversation_id.to_string())
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Replace a temporary record with its server-confirmed counterpart in
    /// one transaction, so no reader ever sees both or neither.
    pub async fn replace_message(&self, old_id: &str, confirmed: &Message) -> Result<()> {
        let mut tx = self.pool().begin().await?;
        sqlx::query("DELETE FROM messages WHERE id = ?")
            .bind(old_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "INSERT OR REPLACE INTO messages (
                id, conversation_id, sender_id, kind, content,
                duration, reply_to_id, created_at, read_at, status
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&confirmed.id)
        .bind(confirmed.conversation_id.to_string())
        .bind(confirmed.sender_id.to_string())
        .bind(confirmed.kind.as_str())
        .bind(&confirmed.content)
        .bind(confirmed.duration.map(|d| d as i64))
        .bind(&confirmed.reply_to_id)
        .bind(&confirmed.created_at)
        .bind(&confirmed.read_at)
        .bind(confirmed.status.as_str())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    /// Update only the delivery status of a message
    pub async fn set_message_status(&self, message_id: &str, status: MessageStatus) -> Result<()> {
        sqlx::query("UPDATE messages SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(message_id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Local records left in a non-terminal state by a previous session.
    ///
    /// A tab closed mid-request strands messages in `sending`; recovery
    /// demotes them to the queue on the next load.
    pub async fn interrupted_messages(&self) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            "SELECT id, conversation_id, sender_id, kind, content,
                    duration, reply_to_id, created_at, read_at, status
             FROM messages
             WHERE status IN ('sending', 'pending')
             ORDER BY created_at ASC",
        )
        .fetch_all(self.pool())
        .await?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in rows {
            messages.push(row_to_message(&row)?);
        }
        Ok(messages)
    }
}

/// Convert a database row to a Message
fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> Result<Message> {
    let conversation_id: String = row.try_get("conversation_id")?;
    let sender_id: String = row.try_get("sender_id")?;
    let kind: String = row.try_get("kind")?;
    let status: String = row.try_get("status")?;
    let duration: Option<i64> = row.try_get("duration")?;

    Ok(Message {
        id: row.try_get("id")?,
        conversation_id: Uuid::parse_str(&conversation_id)
            .map_err(|e| SyncError::storage(format!("corrupt conversation_id: {}", e)))?,
        sender_id: Uuid::parse_str(&sender_id)
            .map_err(|e| SyncError::storage(format!("corrupt sender_id: {}", e)))?,
        kind: MessageKind::from_str(&kind),
        content: row.try_get("content")?,
        duration: duration.map(|d| d as u32),
        reply_to_id: row.try_get("reply_to_id")?,
        created_at: row.try_get("created_at")?,
        read_at: row.try_get("read_at")?,
        status: MessageStatus::from_str(&status),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_store() -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().join("offline.db")).await.unwrap();
        (dir, store)
    }

    fn message(conversation: Uuid, content: &str, created_at: &str) -> Message {
        let mut m = Message::local_text(
            conversation,
            Uuid::new_v4(),
            content.to_string(),
            None,
            MessageStatus::Sent,
        );
        m.created_at = created_at.to_string();
        m
    }

    #[tokio::test]
    async fn test_put_and_get_round_trip() {
        let (_dir, store) = temp_store().await;
        let m = message(Uuid::new_v4(), "hello", "2026-01-01T10:00:00+00:00");

        store.put_message(&m).await.unwrap();
        let loaded = store.get_message(&m.id).await.unwrap().unwrap();
        assert_eq!(loaded, m);
    }

    #[tokio::test]
    async fn test_put_is_idempotent() {
        let (_dir, store) = temp_store().await;
        let m = message(Uuid::new_v4(), "hello", "2026-01-01T10:00:00+00:00");

        store.put_message(&m).await.unwrap();
        store.put_message(&m).await.unwrap();
        let history = store.conversation_messages(&m.conversation_id).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_redisplay_order_ignores_write_order() {
        let (_dir, store) = temp_store().await;
        let conversation = Uuid::new_v4();
        let first = message(conversation, "one", "2026-01-01T10:00:00+00:00");
        let second = message(conversation, "two", "2026-01-01T10:00:01+00:00");
        let third = message(conversation, "three", "2026-01-01T10:00:02+00:00");

        // Written out of order on purpose
        store.put_message(&third).await.unwrap();
        store.put_message(&first).await.unwrap();
        store.put_message(&second).await.unwrap();

        let history = store.conversation_messages(&conversation).await.unwrap();
        let contents: Vec<&str> = history.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_delete_absent_is_noop() {
        let (_dir, store) = temp_store().await;
        store.delete_message("temp-123-deadbeef").await.unwrap();
    }

    #[tokio::test]
    async fn test_replace_swaps_atomically() {
        let (_dir, store) = temp_store().await;
        let conversation = Uuid::new_v4();
        let mut temp = message(conversation, "hello", "2026-01-01T10:00:00+00:00");
        temp.status = MessageStatus::Sending;
        store.put_message(&temp).await.unwrap();

        let mut confirmed = temp.clone();
        confirmed.id = Uuid::new_v4().to_string();
        confirmed.status = MessageStatus::Sent;
        store.replace_message(&temp.id, &confirmed).await.unwrap();

        let history = store.conversation_messages(&conversation).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, confirmed.id);
        assert_eq!(history[0].status, MessageStatus::Sent);
    }

    #[tokio::test]
    async fn test_interrupted_scan_finds_non_terminal() {
        let (_dir, store) = temp_store().await;
        let conversation = Uuid::new_v4();
        let mut stuck = message(conversation, "stuck", "2026-01-01T10:00:00+00:00");
        stuck.status = MessageStatus::Sending;
        let sent = message(conversation, "done", "2026-01-01T10:00:01+00:00");

        store.put_message(&stuck).await.unwrap();
        store.put_message(&sent).await.unwrap();

        let interrupted = store.interrupted_messages().await.unwrap();
        assert_eq!(interrupted.len(), 1);
        assert_eq!(interrupted[0].content, "stuck");
    }
}
