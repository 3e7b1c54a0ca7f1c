//! Real-time Event System
//!
//! Events delivered by the realtime channel service as messages are
//! committed server-side. The server broadcasts every insert and update in
//! a conversation - including ones this client just created - so consumers
//! must treat each event as idempotent-safe to apply: a duplicate push of
//! an already-reconciled message is a no-op.
//!
//! # Broadcasting
//!
//! Events travel over `tokio::sync::broadcast`, a multi-producer,
//! multi-consumer channel. All subscribers receive a copy of each event.
//! The transport adapter that speaks to the realtime service feeds the
//! sender; the sync engine consumes a receiver per open conversation view.

use crate::shared::messaging::Message;
use tokio::sync::broadcast;
use uuid::Uuid;

/// A change event pushed by the realtime channel
#[derive(Debug, Clone)]
pub enum RealtimeEvent {
    /// A message was inserted server-side
    MessageInserted(Message),
    /// An existing message changed (read receipts)
    MessageUpdated(Message),
}

impl RealtimeEvent {
    /// The conversation this event belongs to
    pub fn conversation_id(&self) -> Uuid {
        match self {
            RealtimeEvent::MessageInserted(m) | RealtimeEvent::MessageUpdated(m) => {
                m.conversation_id
            }
        }
    }

    /// The message record carried by the event
    pub fn message(&self) -> &Message {
        match self {
            RealtimeEvent::MessageInserted(m) | RealtimeEvent::MessageUpdated(m) => m,
        }
    }
}

/// Realtime event broadcast
///
/// Can be cloned and shared across the transport adapter and any test
/// harness to publish events from anywhere.
pub type RealtimeBroadcast = broadcast::Sender<RealtimeEvent>;

/// Create a realtime event channel with the given buffer capacity
pub fn realtime_channel(capacity: usize) -> (RealtimeBroadcast, broadcast::Receiver<RealtimeEvent>) {
    broadcast::channel(capacity)
}
