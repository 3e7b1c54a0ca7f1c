//! Conversation Metadata Snapshot
//!
//! A denormalized copy of conversation metadata, cached opportunistically
//! and used only as an offline display fallback. Not authoritative: the
//! server owns conversation state, and nothing here carries write-path
//! invariants.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How urgently a patient wants to talk
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversationUrgency {
    Low,
    Normal,
    High,
}

impl ConversationUrgency {
    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationUrgency::Low => "low",
            ConversationUrgency::Normal => "normal",
            ConversationUrgency::High => "high",
        }
    }

    /// Parse from string (database)
    pub fn from_str(s: &str) -> Self {
        match s {
            "low" => ConversationUrgency::Low,
            "high" => ConversationUrgency::High,
            _ => ConversationUrgency::Normal,
        }
    }
}

/// Whether a conversation is still open
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    Active,
    Closed,
}

impl ConversationStatus {
    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStatus::Active => "active",
            ConversationStatus::Closed => "closed",
        }
    }

    /// Parse from string (database)
    pub fn from_str(s: &str) -> Self {
        match s {
            "closed" => ConversationStatus::Closed,
            _ => ConversationStatus::Active,
        }
    }
}

/// Which side of a conversation a user is on, selecting the cache index
/// used for lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantRole {
    Patient,
    Counselor,
}

/// Represents a conversation between a patient and a counselor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Conversation {
    /// Unique conversation ID
    pub id: Uuid,
    /// Patient who opened the conversation
    pub patient_id: Uuid,
    /// Counselor assigned to it, once routing has matched one
    pub counselor_id: Option<Uuid>,
    /// Topic the patient picked
    pub topic: String,
    /// Urgency chosen at creation
    pub urgency: ConversationUrgency,
    /// Open/closed state
    pub status: ConversationStatus,
    /// When the conversation was created (RFC3339)
    pub created_at: String,
}
