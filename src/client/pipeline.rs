//! # Optimistic Message Pipeline
//!
//! The send path for outbound messages, and the merge point for everything
//! the server pushes back. A send materializes a locally visible record
//! immediately - whatever the network state - then reconciles that
//! placeholder with the authoritative server record, arriving either as the
//! direct response or as a realtime push.
//!
//! ## Reconciliation
//!
//! The server broadcasts every insert, including ones this client just
//! created, so the push can beat the HTTP response. Placeholders are
//! matched by identity (temporary id) when the direct response lands, and
//! by content - (sender, conversation, kind, payload) - when a push
//! arrives carrying a durable id the placeholder can't know. Either way
//! exactly one record survives, in the in-memory view and in the store
//! atomically. A pushed record matching nothing is appended, never
//! dropped.
//!
//! ## Failure handling
//!
//! Sends never return an error: a transient failure demotes the message to
//! the outbound queue (`pending`), a rejection surfaces as `error`. Storage
//! trouble is logged and the pipeline keeps going online-only.

use crate::client::api::{MessageEndpoint, NewMessage};
use crate::client::connectivity::ConnectivityMonitor;
use crate::client::store::{LocalStore, PendingMessage};
use crate::client::sync::queue::OutboundQueue;
use crate::shared::error::SyncError;
use crate::shared::event::RealtimeEvent;
use crate::shared::messaging::{Message, MessageStatus};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

/// Notification that a conversation's messages changed and the UI should
/// re-render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewUpdate {
    /// Message list of a conversation changed (new message, status
    /// transition, deletion)
    MessagesChanged {
        /// The affected conversation
        conversation_id: Uuid,
    },
}

/// Optimistic send pipeline and push reconciler
pub struct MessagePipeline {
    store: Option<Arc<LocalStore>>,
    monitor: Arc<ConnectivityMonitor>,
    endpoint: Arc<dyn MessageEndpoint>,
    queue: Arc<OutboundQueue>,
    conversations: RwLock<HashMap<Uuid, Vec<Message>>>,
    updates: broadcast::Sender<ViewUpdate>,
}

impl MessagePipeline {
    /// Create a pipeline over the given collaborators
    pub fn new(
        store: Option<Arc<LocalStore>>,
        monitor: Arc<ConnectivityMonitor>,
        endpoint: Arc<dyn MessageEndpoint>,
        queue: Arc<OutboundQueue>,
    ) -> Self {
        let (updates, _) = broadcast::channel(64);
        Self {
            store,
            monitor,
            endpoint,
            queue,
            conversations: RwLock::new(HashMap::new()),
            updates,
        }
    }

    /// Subscribe to view-update notifications
    pub fn subscribe_updates(&self) -> broadcast::Receiver<ViewUpdate> {
        self.updates.subscribe()
    }

    /// Send a text message. Returns the locally visible record after the
    /// attempt; its status tells the UI what happened.
    pub async fn send_text(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: String,
        reply_to_id: Option<String>,
    ) -> Message {
        let message = Message::local_text(
            conversation_id,
            sender_id,
            content,
            reply_to_id,
            MessageStatus::Sending,
        );
        self.dispatch(message).await
    }

    /// Send a voice message (content is the uploaded asset URL)
    pub async fn send_voice(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        audio_url: String,
        duration: u32,
        reply_to_id: Option<String>,
    ) -> Message {
        let message = Message::local_voice(
            conversation_id,
            sender_id,
            audio_url,
            duration,
            reply_to_id,
            MessageStatus::Sending,
        );
        self.dispatch(message).await
    }

    /// The single send path: optimistic insert, then network attempt or
    /// queue handoff.
    async fn dispatch(&self, mut message: Message) -> Message {
        let conversation_id = message.conversation_id;
        let online = self.monitor.is_online();
        message.status = if online {
            MessageStatus::Sending
        } else {
            MessageStatus::Pending
        };

        self.insert_view(message.clone()).await;
        self.persist(&message).await;
        self.notify(conversation_id);

        if !online {
            self.queue
                .enqueue(PendingMessage::from_message(&message))
                .await;
            return message;
        }

        let draft = draft_of(&message);
        match self.endpoint.create_message(&draft).await {
            Ok(server) => self.resolve_delivery(&message.id, server).await,
            Err(e) if e.is_transient() => {
                tracing::info!(
                    "[Pipeline] send of {} hit a transient failure, queueing: {}",
                    message.id,
                    e
                );
                message.status = MessageStatus::Pending;
                self.set_status(&message.id, conversation_id, MessageStatus::Pending)
                    .await;
                self.queue
                    .enqueue(PendingMessage::from_message(&message))
                    .await;
                message
            }
            Err(e) => {
                tracing::warn!("[Pipeline] message {} rejected: {}", message.id, e);
                message.status = MessageStatus::Error;
                self.set_status(&message.id, conversation_id, MessageStatus::Error)
                    .await;
                message
            }
        }
    }

    /// Replace a placeholder with the authoritative server record.
    ///
    /// Identity match on the temporary id; falls back to updating by
    /// durable id when a realtime push already collapsed the placeholder.
    /// Idempotent either way.
    pub async fn resolve_delivery(&self, local_id: &str, server: Message) -> Message {
        let mut confirmed = server;
        confirmed.status = MessageStatus::Sent;
        let conversation_id = confirmed.conversation_id;

        {
            let mut conversations = self.conversations.write().await;
            let list = conversations.entry(conversation_id).or_default();
            if let Some(slot) = list.iter_mut().find(|m| m.id == local_id) {
                *slot = confirmed.clone();
            } else if let Some(slot) = list.iter_mut().find(|m| m.id == confirmed.id) {
                *slot = confirmed.clone();
            } else {
                list.push(confirmed.clone());
            }
        }

        self.persist_replace(local_id, &confirmed).await;
        self.queue.remove(local_id).await;
        self.notify(conversation_id);
        confirmed
    }

    /// Mark a message permanently failed (rejection, retry ceiling)
    pub async fn mark_send_failed(&self, local_id: &str, conversation_id: Uuid) {
        tracing::warn!("[Pipeline] message {} permanently failed", local_id);
        self.set_status(local_id, conversation_id, MessageStatus::Error)
            .await;
    }

    /// Merge a realtime push into local state. Safe to call with duplicate
    /// events - an already-reconciled message is a no-op.
    pub async fn apply_push(&self, event: RealtimeEvent) {
        match event {
            RealtimeEvent::MessageInserted(server) => self.apply_insert(server).await,
            RealtimeEvent::MessageUpdated(server) => self.apply_update(server).await,
        }
    }

    async fn apply_insert(&self, server: Message) {
        let mut confirmed = server;
        confirmed.status = MessageStatus::Sent;
        let conversation_id = confirmed.conversation_id;

        let (collapsed, unmatched_own) = {
            let mut conversations = self.conversations.write().await;
            let list = conversations.entry(conversation_id).or_default();

            if list.iter().any(|m| m.id == confirmed.id) {
                return;
            }

            // The push may be our own send coming back before the direct
            // response: collapse the oldest still-pending placeholder with
            // matching content instead of rendering a second bubble.
            if let Some(slot) = list.iter_mut().find(|m| {
                m.is_temp() && !m.status.is_terminal() && m.content_matches(&confirmed)
            }) {
                let local_id = slot.id.clone();
                *slot = confirmed.clone();
                (Some(local_id), false)
            } else {
                // Placeholders from the same sender that did not match
                // mean the content heuristic came up empty; the record is
                // appended anyway so nothing is lost.
                let unmatched_own = list.iter().any(|m| {
                    m.is_temp() && !m.status.is_terminal() && m.sender_id == confirmed.sender_id
                });
                list.push(confirmed.clone());
                (None, unmatched_own)
            }
        };

        match &collapsed {
            Some(local_id) => {
                self.persist_replace(local_id, &confirmed).await;
                self.queue.remove(local_id).await;
            }
            None => {
                if unmatched_own {
                    tracing::debug!(
                        "[Pipeline] {}",
                        SyncError::ReconciliationConflict {
                            message_id: confirmed.id.clone()
                        }
                    );
                }
                self.persist(&confirmed).await;
            }
        }
        self.notify(conversation_id);
    }

    async fn apply_update(&self, server: Message) {
        let mut merged = server;
        merged.status = MessageStatus::Sent;
        let conversation_id = merged.conversation_id;

        let in_view = {
            let mut conversations = self.conversations.write().await;
            let list = conversations.entry(conversation_id).or_default();
            match list.iter_mut().find(|m| m.id == merged.id) {
                Some(slot) => {
                    *slot = merged.clone();
                    true
                }
                None => false,
            }
        };

        self.persist(&merged).await;
        if in_view {
            self.notify(conversation_id);
        }
    }

    /// Re-send a permanently failed message (user-initiated retry).
    ///
    /// The failed bubble is removed and its content re-enters the send path
    /// under a fresh temporary id. Returns `None` when the id does not name
    /// a failed message.
    pub async fn retry(&self, message_id: &str) -> Option<Message> {
        let failed = {
            let conversations = self.conversations.read().await;
            conversations
                .values()
                .flatten()
                .find(|m| m.id == message_id && m.status == MessageStatus::Error)
                .cloned()
        }?;

        self.remove_view(message_id).await;
        self.persist_delete(message_id).await;

        let mut replacement = failed.clone();
        replacement.id = Message::temp_id();
        replacement.created_at = chrono::Utc::now().to_rfc3339();
        replacement.read_at = None;
        Some(self.dispatch(replacement).await)
    }

    /// Drop a permanently failed message without resending
    pub async fn remove_failed(&self, message_id: &str) {
        let removed = {
            let conversations = self.conversations.read().await;
            conversations
                .values()
                .flatten()
                .any(|m| m.id == message_id && m.status == MessageStatus::Error)
        };
        if !removed {
            return;
        }
        self.remove_view(message_id).await;
        self.persist_delete(message_id).await;
    }

    /// Delete a message: optimistic local removal, then the server call for
    /// durable ids. No reconciliation needed - deletion has no competing
    /// creation.
    pub async fn delete_message(&self, message_id: &str) {
        self.remove_view(message_id).await;
        self.persist_delete(message_id).await;

        if Message::is_temp_id(message_id) {
            self.queue.remove(message_id).await;
            return;
        }
        if let Err(e) = self.endpoint.delete_message(message_id).await {
            tracing::warn!("[Pipeline] server delete of {} failed: {}", message_id, e);
        }
    }

    /// Seed a conversation view from a fresh server fetch, refreshing the
    /// offline cache opportunistically.
    pub async fn seed_conversation(&self, conversation_id: Uuid, messages: Vec<Message>) {
        {
            let mut conversations = self.conversations.write().await;
            let list = conversations.entry(conversation_id).or_default();
            // keep local placeholders the server cannot know about yet
            let placeholders: Vec<Message> = list
                .iter()
                .filter(|m| m.is_temp() && !messages.iter().any(|s| s.content_matches(m)))
                .cloned()
                .collect();
            *list = messages.clone();
            list.extend(placeholders);
        }
        if let Some(store) = &self.store {
            if let Err(e) = store.put_messages(&messages).await {
                tracing::warn!("[Pipeline] could not cache history: {}", e);
            }
        }
        self.notify(conversation_id);
    }

    /// Hydrate a conversation view from the offline cache (display
    /// fallback while offline or before the first fetch completes)
    pub async fn load_conversation(&self, conversation_id: Uuid) {
        let Some(store) = &self.store else { return };
        match store.conversation_messages(&conversation_id).await {
            Ok(cached) => {
                {
                    let mut conversations = self.conversations.write().await;
                    let list = conversations.entry(conversation_id).or_default();
                    for message in cached {
                        if !list.iter().any(|m| m.id == message.id) {
                            list.push(message);
                        }
                    }
                }
                self.notify(conversation_id);
            }
            Err(e) => {
                tracing::warn!("[Pipeline] could not hydrate conversation: {}", e);
            }
        }
    }

    /// Requeue work left behind by an interrupted session.
    ///
    /// Any non-terminal leftover in the store becomes a queue entry again;
    /// `sending` demotes to `pending` since whatever request was in flight
    /// died with the old session.
    pub async fn recover_interrupted(&self) {
        let Some(store) = &self.store else { return };
        let leftovers = match store.interrupted_messages().await {
            Ok(leftovers) => leftovers,
            Err(e) => {
                tracing::warn!("[Pipeline] recovery scan failed: {}", e);
                return;
            }
        };

        for mut message in leftovers {
            if !message.is_temp() {
                continue;
            }
            if message.status == MessageStatus::Sending {
                message.status = MessageStatus::Pending;
                self.set_status(&message.id, message.conversation_id, MessageStatus::Pending)
                    .await;
            }
            if !self.queue.contains(&message.id).await {
                tracing::info!("[Pipeline] requeueing interrupted message {}", message.id);
                self.queue
                    .enqueue(PendingMessage::from_message(&message))
                    .await;
            }
        }
    }

    /// Messages of a conversation in display order
    pub async fn conversation_messages(&self, conversation_id: &Uuid) -> Vec<Message> {
        let conversations = self.conversations.read().await;
        let mut messages = conversations
            .get(conversation_id)
            .cloned()
            .unwrap_or_default();
        Message::sort_for_display(&mut messages);
        messages
    }

    /// Number of messages awaiting delivery (badges)
    pub async fn pending_count(&self) -> usize {
        self.queue.count().await
    }

    // ---- internal helpers ----

    async fn insert_view(&self, message: Message) {
        let mut conversations = self.conversations.write().await;
        conversations
            .entry(message.conversation_id)
            .or_default()
            .push(message);
    }

    async fn remove_view(&self, message_id: &str) {
        let mut affected = None;
        {
            let mut conversations = self.conversations.write().await;
            for (conversation_id, list) in conversations.iter_mut() {
                let before = list.len();
                list.retain(|m| m.id != message_id);
                if list.len() != before {
                    affected = Some(*conversation_id);
                    break;
                }
            }
        }
        if let Some(conversation_id) = affected {
            self.notify(conversation_id);
        }
    }

    async fn set_status(&self, message_id: &str, conversation_id: Uuid, status: MessageStatus) {
        {
            let mut conversations = self.conversations.write().await;
            if let Some(list) = conversations.get_mut(&conversation_id) {
                if let Some(slot) = list.iter_mut().find(|m| m.id == message_id) {
                    slot.status = status;
                }
            }
        }
        if let Some(store) = &self.store {
            if let Err(e) = store.set_message_status(message_id, status).await {
                tracing::warn!("[Pipeline] could not persist status of {}: {}", message_id, e);
            }
        }
        self.notify(conversation_id);
    }

    async fn persist(&self, message: &Message) {
        if let Some(store) = &self.store {
            if let Err(e) = store.put_message(message).await {
                tracing::warn!("[Pipeline] could not persist {}: {}", message.id, e);
            }
        }
    }

    async fn persist_replace(&self, old_id: &str, confirmed: &Message) {
        if let Some(store) = &self.store {
            if let Err(e) = store.replace_message(old_id, confirmed).await {
                tracing::warn!("[Pipeline] could not swap {} for {}: {}", old_id, confirmed.id, e);
            }
        }
    }

    async fn persist_delete(&self, message_id: &str) {
        if let Some(store) = &self.store {
            if let Err(e) = store.delete_message(message_id).await {
                tracing::warn!("[Pipeline] could not delete {}: {}", message_id, e);
            }
        }
    }

    fn notify(&self, conversation_id: Uuid) {
        let _ = self.updates.send(ViewUpdate::MessagesChanged { conversation_id });
    }
}

/// Build the network draft for a locally visible message
pub(crate) fn draft_of(message: &Message) -> NewMessage {
    NewMessage {
        conversation_id: message.conversation_id,
        sender_id: message.sender_id,
        kind: message.kind,
        content: message.content.clone(),
        duration: message.duration,
        reply_to_id: message.reply_to_id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testutil::StubEndpoint;
    use crate::shared::error::SyncError;

    fn pipeline_with(
        endpoint: Arc<StubEndpoint>,
        online: bool,
    ) -> (MessagePipeline, Arc<OutboundQueue>) {
        let monitor = Arc::new(ConnectivityMonitor::new(online));
        let queue = Arc::new(OutboundQueue::new(None));
        let pipeline = MessagePipeline::new(None, monitor, endpoint, queue.clone());
        (pipeline, queue)
    }

    #[tokio::test]
    async fn test_online_send_reaches_sent() {
        let endpoint = Arc::new(StubEndpoint::always_ok());
        let (pipeline, queue) = pipeline_with(endpoint.clone(), true);
        let conversation = Uuid::new_v4();

        let message = pipeline
            .send_text(conversation, Uuid::new_v4(), "hello".to_string(), None)
            .await;

        assert_eq!(message.status, MessageStatus::Sent);
        assert!(!message.is_temp());
        assert_eq!(endpoint.call_count(), 1);
        assert_eq!(queue.count().await, 0);

        let view = pipeline.conversation_messages(&conversation).await;
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].id, message.id);
    }

    #[tokio::test]
    async fn test_offline_send_queues_without_network_io() {
        let endpoint = Arc::new(StubEndpoint::always_ok());
        let (pipeline, queue) = pipeline_with(endpoint.clone(), false);
        let conversation = Uuid::new_v4();

        let message = pipeline
            .send_text(conversation, Uuid::new_v4(), "hello".to_string(), None)
            .await;

        assert_eq!(message.status, MessageStatus::Pending);
        assert!(message.is_temp());
        assert_eq!(endpoint.call_count(), 0);
        assert!(queue.contains(&message.id).await);

        let view = pipeline.conversation_messages(&conversation).await;
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].status, MessageStatus::Pending);
    }

    #[tokio::test]
    async fn test_transient_failure_demotes_to_queue() {
        let endpoint = Arc::new(StubEndpoint::scripted(vec![Err(SyncError::connectivity(
            "connection reset",
        ))]));
        let (pipeline, queue) = pipeline_with(endpoint, true);
        let conversation = Uuid::new_v4();

        let message = pipeline
            .send_text(conversation, Uuid::new_v4(), "hello".to_string(), None)
            .await;

        assert_eq!(message.status, MessageStatus::Pending);
        assert!(queue.contains(&message.id).await);
    }

    #[tokio::test]
    async fn test_rejection_is_terminal_and_unqueued() {
        let endpoint = Arc::new(StubEndpoint::scripted(vec![Err(SyncError::rejected(
            400,
            "Content is required for text messages",
        ))]));
        let (pipeline, queue) = pipeline_with(endpoint.clone(), true);
        let conversation = Uuid::new_v4();

        let message = pipeline
            .send_text(conversation, Uuid::new_v4(), "".to_string(), None)
            .await;

        assert_eq!(message.status, MessageStatus::Error);
        assert_eq!(queue.count().await, 0);
        assert_eq!(endpoint.call_count(), 1);

        // and no automatic retry happens later
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(endpoint.call_count(), 1);
    }

    #[tokio::test]
    async fn test_push_collapses_placeholder() {
        let endpoint = Arc::new(StubEndpoint::always_ok());
        let (pipeline, queue) = pipeline_with(endpoint, false);
        let conversation = Uuid::new_v4();
        let sender = Uuid::new_v4();

        let placeholder = pipeline
            .send_text(conversation, sender, "hello".to_string(), None)
            .await;

        let server = Message {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation,
            sender_id: sender,
            kind: placeholder.kind,
            content: "hello".to_string(),
            duration: None,
            reply_to_id: None,
            created_at: chrono::Utc::now().to_rfc3339(),
            read_at: None,
            status: MessageStatus::Sent,
        };
        pipeline
            .apply_push(RealtimeEvent::MessageInserted(server.clone()))
            .await;

        let view = pipeline.conversation_messages(&conversation).await;
        assert_eq!(view.len(), 1, "placeholder and push must collapse");
        assert_eq!(view[0].id, server.id);
        assert_eq!(view[0].status, MessageStatus::Sent);
        assert!(!queue.contains(&placeholder.id).await);

        // duplicate push is a no-op
        pipeline
            .apply_push(RealtimeEvent::MessageInserted(server))
            .await;
        assert_eq!(pipeline.conversation_messages(&conversation).await.len(), 1);
    }

    #[tokio::test]
    async fn test_foreign_push_appends_once() {
        let endpoint = Arc::new(StubEndpoint::always_ok());
        let (pipeline, _queue) = pipeline_with(endpoint, true);
        let conversation = Uuid::new_v4();

        let foreign = Message {
            id: Uuid::new_v4().to_string(),
            conversation_id: conversation,
            sender_id: Uuid::new_v4(),
            kind: crate::shared::messaging::MessageKind::Text,
            content: "from the counselor".to_string(),
            duration: None,
            reply_to_id: None,
            created_at: chrono::Utc::now().to_rfc3339(),
            read_at: None,
            status: MessageStatus::Sent,
        };

        pipeline
            .apply_push(RealtimeEvent::MessageInserted(foreign.clone()))
            .await;
        pipeline
            .apply_push(RealtimeEvent::MessageInserted(foreign.clone()))
            .await;

        let view = pipeline.conversation_messages(&conversation).await;
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].id, foreign.id);
    }

    #[tokio::test]
    async fn test_update_push_merges_read_receipt() {
        let endpoint = Arc::new(StubEndpoint::always_ok());
        let (pipeline, _queue) = pipeline_with(endpoint, true);
        let conversation = Uuid::new_v4();

        let sent = pipeline
            .send_text(conversation, Uuid::new_v4(), "hello".to_string(), None)
            .await;

        let mut updated = sent.clone();
        updated.read_at = Some("2026-01-01T10:00:10+00:00".to_string());
        pipeline
            .apply_push(RealtimeEvent::MessageUpdated(updated))
            .await;

        let view = pipeline.conversation_messages(&conversation).await;
        assert_eq!(view[0].read_at.as_deref(), Some("2026-01-01T10:00:10+00:00"));
        assert_eq!(view[0].status, MessageStatus::Sent);
    }

    #[tokio::test]
    async fn test_retry_reenters_send_path() {
        let endpoint = Arc::new(StubEndpoint::scripted(vec![Err(SyncError::rejected(
            400,
            "bad payload",
        ))]));
        let (pipeline, _queue) = pipeline_with(endpoint.clone(), true);
        let conversation = Uuid::new_v4();

        let failed = pipeline
            .send_text(conversation, Uuid::new_v4(), "hello".to_string(), None)
            .await;
        assert_eq!(failed.status, MessageStatus::Error);

        let retried = pipeline.retry(&failed.id).await.unwrap();
        assert_eq!(retried.status, MessageStatus::Sent);
        assert_ne!(retried.id, failed.id);

        let view = pipeline.conversation_messages(&conversation).await;
        assert_eq!(view.len(), 1, "failed bubble must be replaced, not kept");
    }

    #[tokio::test]
    async fn test_retry_of_non_failed_is_none() {
        let endpoint = Arc::new(StubEndpoint::always_ok());
        let (pipeline, _queue) = pipeline_with(endpoint, true);
        let sent = pipeline
            .send_text(Uuid::new_v4(), Uuid::new_v4(), "hi".to_string(), None)
            .await;
        assert!(pipeline.retry(&sent.id).await.is_none());
    }

    #[tokio::test]
    async fn test_delete_temp_message_only_touches_queue() {
        let endpoint = Arc::new(StubEndpoint::always_ok());
        let (pipeline, queue) = pipeline_with(endpoint, false);
        let conversation = Uuid::new_v4();

        let queued = pipeline
            .send_text(conversation, Uuid::new_v4(), "oops".to_string(), None)
            .await;
        assert_eq!(queue.count().await, 1);

        pipeline.delete_message(&queued.id).await;
        assert_eq!(queue.count().await, 0);
        assert!(pipeline.conversation_messages(&conversation).await.is_empty());
    }

    #[tokio::test]
    async fn test_view_updates_fire_on_transitions() {
        let endpoint = Arc::new(StubEndpoint::always_ok());
        let (pipeline, _queue) = pipeline_with(endpoint, true);
        let conversation = Uuid::new_v4();
        let mut updates = pipeline.subscribe_updates();

        pipeline
            .send_text(conversation, Uuid::new_v4(), "hello".to_string(), None)
            .await;

        // at least the optimistic insert and the sent transition
        let first = updates.recv().await.unwrap();
        assert_eq!(first, ViewUpdate::MessagesChanged { conversation_id: conversation });
        let second = updates.recv().await.unwrap();
        assert_eq!(second, ViewUpdate::MessagesChanged { conversation_id: conversation });
    }
}
