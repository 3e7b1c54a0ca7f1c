//! # Offline Sync Engine
//!
//! The client-side machinery behind SafeSpace's offline-capable chat:
//!
//! - **`store`**: durable local cache (messages, conversations, outbound
//!   queue, session data)
//! - **`connectivity`**: edge-triggered online/offline monitor
//! - **`api`**: the network send endpoint seam
//! - **`pipeline`**: optimistic sends and push reconciliation
//! - **`sync`**: queue draining with bounded retry, plus the
//!   service-worker bridge
//! - **`presence`**: TTL cache for presence snapshots
//!
//! [`MessagingClient`] wires the pieces together for hosts that want the
//! whole engine; every component also works standalone for finer-grained
//! embedding and for tests.

pub mod api;
pub mod connectivity;
pub mod pipeline;
pub mod presence;
pub mod store;
pub mod sync;

#[cfg(test)]
pub(crate) mod testutil;

pub use pipeline::{MessagePipeline, ViewUpdate};
pub use sync::{SyncCoordinator, SyncReport};

use crate::client::api::{HttpMessageEndpoint, MessageEndpoint};
use crate::client::connectivity::ConnectivityMonitor;
use crate::client::pipeline::MessagePipeline as Pipeline;
use crate::client::presence::PresenceCache;
use crate::client::store::LocalStore;
use crate::client::sync::{OutboundQueue, SyncHandle, WorkerBridge};
use crate::shared::config::SyncConfig;
use crate::shared::error::SyncError;
use crate::shared::event::RealtimeEvent;
use crate::shared::messaging::{Conversation, Message, ParticipantRole};
use std::sync::Arc;
use std::sync::Mutex;
use tokio::sync::broadcast;
use uuid::Uuid;

/// The assembled offline messaging engine
pub struct MessagingClient {
    store: Option<Arc<LocalStore>>,
    monitor: Arc<ConnectivityMonitor>,
    queue: Arc<OutboundQueue>,
    pipeline: Arc<Pipeline>,
    coordinator: Arc<SyncCoordinator>,
    bridge: WorkerBridge,
    presence: PresenceCache,
    sync_handle: Mutex<Option<SyncHandle>>,
    realtime_tasks: Mutex<Vec<tokio::task::JoinHandle<()>>>,
}

impl MessagingClient {
    /// Build an engine talking HTTP to the configured server
    pub async fn new(config: SyncConfig) -> Result<Self, SyncError> {
        let endpoint: Arc<dyn MessageEndpoint> = Arc::new(HttpMessageEndpoint::new(&config)?);
        Ok(Self::with_endpoint(config, endpoint).await)
    }

    /// Build an engine over a custom endpoint (tests, alternative
    /// transports)
    pub async fn with_endpoint(config: SyncConfig, endpoint: Arc<dyn MessageEndpoint>) -> Self {
        let store = match &config.database_path {
            Some(path) => LocalStore::open(path).await,
            None => LocalStore::open_default().await,
        };
        let store = match store {
            Ok(store) => Some(Arc::new(store)),
            Err(e) => {
                // Online-only from here on: no cache, no durable queue.
                tracing::warn!("[Client] offline cache unavailable: {}", e);
                None
            }
        };

        let monitor = Arc::new(ConnectivityMonitor::default());
        let queue = Arc::new(OutboundQueue::new(store.clone()));
        let pipeline = Arc::new(Pipeline::new(
            store.clone(),
            monitor.clone(),
            endpoint.clone(),
            queue.clone(),
        ));
        let coordinator = Arc::new(SyncCoordinator::new(
            queue.clone(),
            endpoint,
            pipeline.clone(),
            monitor.clone(),
            config.retry_ceiling,
        ));

        Self {
            store,
            monitor,
            queue,
            pipeline,
            coordinator,
            bridge: WorkerBridge::new(),
            presence: PresenceCache::new(config.presence_ttl),
            sync_handle: Mutex::new(None),
            realtime_tasks: Mutex::new(Vec::new()),
        }
    }

    /// Bring the engine up: hydrate the queue, requeue interrupted work,
    /// start listening for sync triggers, and drain if already online.
    pub async fn start(&self) {
        self.queue.hydrate().await;
        self.pipeline.recover_interrupted().await;

        let handle = self.coordinator.start(&self.bridge);
        if let Ok(mut slot) = self.sync_handle.lock() {
            *slot = Some(handle);
        }

        if self.monitor.is_online() {
            let coordinator = self.coordinator.clone();
            tokio::spawn(async move {
                coordinator.drain().await;
            });
        }
    }

    /// Stop background listeners. Queued messages stay queued.
    pub fn stop(&self) {
        if let Ok(mut slot) = self.sync_handle.lock() {
            if let Some(handle) = slot.take() {
                handle.stop();
            }
        }
        if let Ok(mut tasks) = self.realtime_tasks.lock() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
    }

    /// Pump a realtime subscription into the reconciler. The pump stops
    /// when the channel closes or the engine stops.
    pub fn attach_realtime(&self, mut events: broadcast::Receiver<RealtimeEvent>) {
        let pipeline = self.pipeline.clone();
        let task = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => pipeline.apply_push(event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("[Client] realtime stream lagged, {} events lost", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        if let Ok(mut tasks) = self.realtime_tasks.lock() {
            tasks.push(task);
        }
    }

    /// Feed a platform connectivity signal
    pub fn set_online(&self, online: bool) {
        self.monitor.set_online(online);
    }

    /// Current observed connectivity
    pub fn is_online(&self) -> bool {
        self.monitor.is_online()
    }

    /// Relay a message posted by the service worker
    pub fn relay_worker_message(&self, tag: &str) -> bool {
        self.bridge.relay_sync_request(tag)
    }

    /// Send a text message (optimistic; never fails, see the status)
    pub async fn send_text(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: String,
        reply_to_id: Option<String>,
    ) -> Message {
        self.pipeline
            .send_text(conversation_id, sender_id, content, reply_to_id)
            .await
    }

    /// Send a voice message
    pub async fn send_voice(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        audio_url: String,
        duration: u32,
        reply_to_id: Option<String>,
    ) -> Message {
        self.pipeline
            .send_voice(conversation_id, sender_id, audio_url, duration, reply_to_id)
            .await
    }

    /// Re-send a permanently failed message
    pub async fn retry_message(&self, message_id: &str) -> Option<Message> {
        self.pipeline.retry(message_id).await
    }

    /// Drop a permanently failed message
    pub async fn remove_failed_message(&self, message_id: &str) {
        self.pipeline.remove_failed(message_id).await
    }

    /// Delete a message locally and server-side
    pub async fn delete_message(&self, message_id: &str) {
        self.pipeline.delete_message(message_id).await
    }

    /// Messages of a conversation in display order
    pub async fn messages(&self, conversation_id: &Uuid) -> Vec<Message> {
        self.pipeline.conversation_messages(conversation_id).await
    }

    /// Seed a conversation from a fresh server fetch
    pub async fn seed_conversation(&self, conversation_id: Uuid, messages: Vec<Message>) {
        self.pipeline.seed_conversation(conversation_id, messages).await
    }

    /// Hydrate a conversation from the offline cache
    pub async fn load_conversation(&self, conversation_id: Uuid) {
        self.pipeline.load_conversation(conversation_id).await
    }

    /// Queued outbound messages (badges)
    pub async fn pending_count(&self) -> usize {
        self.queue.count().await
    }

    /// Trigger a drain right now (user-initiated retry)
    pub async fn sync_now(&self) -> SyncReport {
        self.coordinator.drain().await
    }

    /// Subscribe to view-update notifications
    pub fn subscribe_updates(&self) -> broadcast::Receiver<ViewUpdate> {
        self.pipeline.subscribe_updates()
    }

    /// Refresh the conversation cache opportunistically
    pub async fn cache_conversations(&self, conversations: &[Conversation]) {
        if let Some(store) = &self.store {
            if let Err(e) = store.put_conversations(conversations).await {
                tracing::warn!("[Client] could not cache conversations: {}", e);
            }
        }
    }

    /// Cached conversations for a user (offline fallback; empty without a
    /// working store)
    pub async fn cached_conversations(
        &self,
        user_id: &Uuid,
        role: ParticipantRole,
    ) -> Vec<Conversation> {
        let Some(store) = &self.store else {
            return Vec::new();
        };
        match store.conversations_for_user(user_id, role).await {
            Ok(conversations) => conversations,
            Err(e) => {
                tracing::warn!("[Client] could not read cached conversations: {}", e);
                Vec::new()
            }
        }
    }

    /// The presence cache
    pub fn presence(&self) -> &PresenceCache {
        &self.presence
    }

    /// The underlying store, when one could be opened
    pub fn store(&self) -> Option<&Arc<LocalStore>> {
        self.store.as_ref()
    }

    /// Wipe all offline data (logout)
    pub async fn clear_offline_data(&self) {
        self.queue.clear().await;
        if let Some(store) = &self.store {
            if let Err(e) = store.clear_all().await {
                tracing::warn!("[Client] could not clear offline data: {}", e);
            }
        }
    }
}

impl Drop for MessagingClient {
    fn drop(&mut self) {
        self.stop();
    }
}
