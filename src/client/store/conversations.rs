//! # Local Conversation Operations
//!
//! CRUD for cached conversation snapshots. These are display fallbacks for
//! offline use - refreshed opportunistically whenever the API hands the
//! client a fresh list, never written back to the server.

use crate::client::store::{LocalStore, Result};
use crate::shared::error::SyncError;
use crate::shared::messaging::{
    Conversation, ConversationStatus, ConversationUrgency, ParticipantRole,
};
use sqlx::Row;
use uuid::Uuid;

impl LocalStore {
    /// Insert or overwrite a conversation snapshot; idempotent.
    pub async fn put_conversation(&self, conversation: &Conversation) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO conversations (
                id, patient_id, counselor_id, topic, urgency, status, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(conversation.id.to_string())
        .bind(conversation.patient_id.to_string())
        .bind(conversation.counselor_id.map(|id| id.to_string()))
        .bind(&conversation.topic)
        .bind(conversation.urgency.as_str())
        .bind(conversation.status.as_str())
        .bind(&conversation.created_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Cache a batch of snapshots in one transaction (list refresh)
    pub async fn put_conversations(&self, conversations: &[Conversation]) -> Result<()> {
        let mut tx = self.pool().begin().await?;
        for conversation in conversations {
            sqlx::query(
                "INSERT OR REPLACE INTO conversations (
                    id, patient_id, counselor_id, topic, urgency, status, created_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(conversation.id.to_string())
            .bind(conversation.patient_id.to_string())
            .bind(conversation.counselor_id.map(|id| id.to_string()))
            .bind(&conversation.topic)
            .bind(conversation.urgency.as_str())
            .bind(conversation.status.as_str())
            .bind(&conversation.created_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Fetch a single conversation snapshot
    pub async fn get_conversation(&self, conversation_id: &Uuid) -> Result<Option<Conversation>> {
        let row = sqlx::query(
            "SELECT id, patient_id, counselor_id, topic, urgency, status, created_at
             FROM conversations
             WHERE id = ?",
        )
        .bind(conversation_id.to_string())
        .fetch_optional(self.pool())
        .await?;

        match row {
            Some(row) => Ok(Some(row_to_conversation(&row)?)),
            None => Ok(None),
        }
    }

    /// Conversations a user participates in, looked up by role index
    pub async fn conversations_for_user(
        &self,
        user_id: &Uuid,
        role: ParticipantRole,
    ) -> Result<Vec<Conversation>> {
        let column = match role {
            ParticipantRole::Patient => "patient_id",
            ParticipantRole::Counselor => "counselor_id",
        };
        let query = format!(
            "SELECT id, patient_id, counselor_id, topic, urgency, status, created_at
             FROM conversations
             WHERE {} = ?
             ORDER BY created_at DESC",
            column
        );

        let rows = sqlx::query(&query)
            .bind(user_id.to_string())
            .fetch_all(self.pool())
            .await?;

        let mut conversations = Vec::with_capacity(rows.len());
        for row in rows {
            conversations.push(row_to_conversation(&row)?);
        }
        Ok(conversations)
    }

    /// Delete a conversation snapshot; absent id is a no-op.
    pub async fn delete_conversation(&self, conversation_id: &Uuid) -> Result<()> {
        sqlx::query("DELETE FROM conversations WHERE id = ?")
            .bind(conversation_id.to_string())
            .execute(self.pool())
            .await?;
        Ok(())
    }
}

/// Convert a database row to a Conversation
fn row_to_conversation(row: &sqlx::sqlite::SqliteRow) -> Result<Conversation> {
    let id: String = row.try_get("id")?;
    let patient_id: String = row.try_get("patient_id")?;
    let counselor_id: Option<String> = row.try_get("counselor_id")?;
    let urgency: String = row.try_get("urgency")?;
    let status: String = row.try_get("status")?;

    let counselor_id = match counselor_id {
        Some(raw) => Some(
            Uuid::parse_str(&raw)
                .map_err(|e| SyncError::storage(format!("corrupt counselor_id: {}", e)))?,
        ),
        None => None,
    };

    Ok(Conversation {
        id: Uuid::parse_str(&id).map_err(|e| SyncError::storage(format!("corrupt id: {}", e)))?,
        patient_id: Uuid::parse_str(&patient_id)
            .map_err(|e| SyncError::storage(format!("corrupt patient_id: {}", e)))?,
        counselor_id,
        topic: row.try_get("topic")?,
        urgency: ConversationUrgency::from_str(&urgency),
        status: ConversationStatus::from_str(&status),
        created_at: row.try_get("created_at")?,
    })
}
