//! Chat Message Data Structure
//!
//! Represents a message in a conversation, together with the client-side
//! delivery status that drives the optimistic send pipeline.
//!
//! A message carries one of two kinds of id: a temporary local id minted
//! when the user hits send (before the server has accepted anything), or
//! the durable UUID assigned by the server on acceptance. Reconciliation
//! collapses a temporary record and its confirmed counterpart into one
//! entry; [`Message::content_matches`] is the fallback used when the
//! realtime push wins the race and the ids cannot line up.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix distinguishing client-minted ids from server UUIDs
pub const TEMP_ID_PREFIX: &str = "temp-";

/// Type of message content
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Plain text message
    Text,
    /// Voice message (content holds the audio asset URL)
    Voice,
}

impl MessageKind {
    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Voice => "voice",
        }
    }

    /// Parse from string (database)
    pub fn from_str(s: &str) -> Self {
        match s {
            "voice" => MessageKind::Voice,
            _ => MessageKind::Text,
        }
    }
}

/// Client-side delivery status of a message
///
/// Transitions: `sending -> {sent, error, pending}`,
/// `pending -> {sending, sent, error}`, `sent` and `error` are terminal
/// (a failed message is user-retriable, which re-enters at the start).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// A direct network send is in flight
    Sending,
    /// Queued for delivery when connectivity returns
    Pending,
    /// Accepted by the server
    Sent,
    /// Permanently failed (rejected, or the retry ceiling was hit)
    Error,
}

impl MessageStatus {
    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Sending => "sending",
            MessageStatus::Pending => "pending",
            MessageStatus::Sent => "sent",
            MessageStatus::Error => "error",
        }
    }

    /// Parse from string (database)
    pub fn from_str(s: &str) -> Self {
        match s {
            "sending" => MessageStatus::Sending,
            "pending" => MessageStatus::Pending,
            "error" => MessageStatus::Error,
            _ => MessageStatus::Sent,
        }
    }

    /// Whether this status will never change on its own
    pub fn is_terminal(&self) -> bool {
        matches!(self, MessageStatus::Sent | MessageStatus::Error)
    }
}

fn default_status() -> MessageStatus {
    // Server payloads carry no status field; anything the server hands us
    // is by definition an accepted record.
    MessageStatus::Sent
}

/// Represents a chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Temporary local id or server-assigned UUID string
    pub id: String,
    /// Conversation this message belongs to
    pub conversation_id: Uuid,
    /// User who sent the message
    pub sender_id: Uuid,
    /// Type of message
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Text body, or the voice asset URL for voice messages
    pub content: String,
    /// Voice duration in seconds
    #[serde(default)]
    pub duration: Option<u32>,
    /// Id of the message this one replies to
    #[serde(default)]
    pub reply_to_id: Option<String>,
    /// When the message was created (RFC3339)
    pub created_at: String,
    /// When the counterpart read the message (RFC3339)
    #[serde(default)]
    pub read_at: Option<String>,
    /// Client-side delivery status (absent on the wire)
    #[serde(default = "default_status")]
    pub status: MessageStatus,
}

impl Message {
    /// Mint a temporary local id
    pub fn temp_id() -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!(
            "{}{}-{}",
            TEMP_ID_PREFIX,
            Utc::now().timestamp_millis(),
            &suffix[..8]
        )
    }

    /// Whether an id is a client-minted temporary id
    pub fn is_temp_id(id: &str) -> bool {
        id.starts_with(TEMP_ID_PREFIX)
    }

    /// Whether this record still carries a temporary id
    pub fn is_temp(&self) -> bool {
        Self::is_temp_id(&self.id)
    }

    /// Create a local text message with a fresh temporary id
    pub fn local_text(
        conversation_id: Uuid,
        sender_id: Uuid,
        content: String,
        reply_to_id: Option<String>,
        status: MessageStatus,
    ) -> Self {
        Self {
            id: Self::temp_id(),
            conversation_id,
            sender_id,
            kind: MessageKind::Text,
            content,
            duration: None,
            reply_to_id,
            created_at: Utc::now().to_rfc3339(),
            read_at: None,
            status,
        }
    }

    /// Create a local voice message with a fresh temporary id
    pub fn local_voice(
        conversation_id: Uuid,
        sender_id: Uuid,
        audio_url: String,
        duration: u32,
        reply_to_id: Option<String>,
        status: MessageStatus,
    ) -> Self {
        Self {
            id: Self::temp_id(),
            conversation_id,
            sender_id,
            kind: MessageKind::Voice,
            content: audio_url,
            duration: Some(duration),
            reply_to_id,
            created_at: Utc::now().to_rfc3339(),
            read_at: None,
            status,
        }
    }

    /// Content-based identity used only when a realtime push arrives before
    /// the direct response and the ids cannot match.
    pub fn content_matches(&self, other: &Message) -> bool {
        self.sender_id == other.sender_id
            && self.conversation_id == other.conversation_id
            && self.kind == other.kind
            && self.content == other.content
    }

    /// Parsed creation timestamp, pinned to the epoch when unparseable so a
    /// corrupt row sorts first instead of panicking.
    pub fn created_at_time(&self) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_default()
    }

    /// Sort messages into display order (creation time, id as tiebreak)
    pub fn sort_for_display(messages: &mut [Message]) {
        messages.sort_by(|a, b| {
            a.created_at_time()
                .cmp(&b.created_at_time())
                .then_with(|| a.id.cmp(&b.id))
        });
    }
}
