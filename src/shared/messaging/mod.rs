//! Messaging types
//!
//! Data structures for the patient/counselor chat: messages with their
//! client-side delivery status, and conversation metadata snapshots used as
//! an offline display fallback.

/// Message data structure and status state machine
pub mod message;

/// Conversation metadata snapshot
pub mod conversation;

pub use conversation::{Conversation, ConversationStatus, ConversationUrgency, ParticipantRole};
pub use message::{Message, MessageKind, MessageStatus};
